/*!
# Veririp: Readers
*/

use crate::{
	BYTES_PER_SAMPLE,
	KillSwitch,
	ReadOffset,
	SAMPLES_PER_SECTOR,
	SECTORS_PER_SECOND,
	Table,
	VeriRipError,
};
use std::{
	ffi::OsString,
	io::{
		BufRead,
		BufReader,
		Read,
		Write,
	},
	ops::Range,
	path::PathBuf,
	process::{
		Command,
		ExitStatus,
		Stdio,
	},
	time::{
		Duration,
		Instant,
	},
};



/// # Poll Interval.
const POLL: Duration = Duration::from_millis(50);

/// # Words Per Sector.
///
/// Cdparanoia reports positions in 16-bit words.
const WORDS_PER_SECTOR: u64 = SAMPLES_PER_SECTOR as u64 * (BYTES_PER_SAMPLE as u64 / 2);



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Read Stats.
///
/// What a reader has to say about a single pass, beyond the data itself.
pub struct ReadStats {
	/// # Sector Reads.
	///
	/// The number of individual sector reads the drive needed. Readers that
	/// can't tell leave this empty.
	reads: Option<u64>,
}

impl ReadStats {
	#[must_use]
	/// # New.
	pub const fn new(reads: Option<u64>) -> Self { Self { reads } }

	#[must_use]
	/// # Reads.
	pub const fn reads(&self) -> Option<u64> { self.reads }

	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	/// # Quality.
	///
	/// Return the read quality for a pass covering `sectors`, as a value
	/// between `0.0` and `1.0`.
	///
	/// Cdparanoia reports each sector (roughly) twice when things go well,
	/// so the ideal ratio is `2 * sectors` reads.
	pub fn quality(&self, sectors: u32) -> Option<f64> {
		let reads = self.reads.filter(|r| 0 < *r)?;
		Some(f64::min(1.0, (u64::from(sectors) * 2) as f64 / reads as f64))
	}
}



/// # Sample Reader.
///
/// A reader pulls raw PCM for a span of sectors off the disc, writing it to
/// `dst` as 16-bit little-endian stereo samples.
///
/// The data is expected to already be adjusted for the drive's read offset.
pub trait SampleReader {
	/// # Read.
	///
	/// Read the absolute sector range `sectors` (belonging to `track`) into
	/// `dst`.
	///
	/// Implementations should return as soon as possible after `killed`
	/// trips, with [`VeriRipError::Killed`].
	///
	/// ## Errors
	///
	/// Any failure to produce the data should be returned as
	/// [`VeriRipError::ReadFailure`].
	fn read(
		&mut self,
		track: u8,
		sectors: Range<u32>,
		offset: ReadOffset,
		dst: &mut (dyn Write + Send),
		killed: &KillSwitch,
	) -> Result<ReadStats, VeriRipError>;

	/// # Version.
	///
	/// The name and version of the underlying tool, if known.
	fn version(&self) -> Option<String> { None }

	/// # Drive.
	///
	/// The drive vendor and model, if known.
	fn drive(&self) -> Option<String> { None }
}



#[derive(Debug, Clone)]
/// # Cdparanoia Reader.
///
/// This runs `cdparanoia` as a child process, streaming the PCM from its
/// STDOUT and counting the reads it reports on STDERR.
pub struct CdparanoiaReader {
	/// # Program.
	program: PathBuf,

	/// # Device.
	device: Option<PathBuf>,

	/// # Pass Timeout.
	timeout: Option<Duration>,

	/// # Drive Vendor/Model.
	drive: Option<String>,
}

impl Default for CdparanoiaReader {
	fn default() -> Self {
		Self {
			program: PathBuf::from("cdparanoia"),
			device: None,
			timeout: None,
			drive: None,
		}
	}
}

impl CdparanoiaReader {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	#[must_use]
	/// # With Program.
	///
	/// Use a specific `cdparanoia` binary rather than whatever is in the
	/// `PATH`.
	pub fn with_program<P>(mut self, program: P) -> Self
	where P: Into<PathBuf> {
		self.program = program.into();
		self
	}

	#[must_use]
	/// # With Device.
	pub fn with_device<P>(mut self, device: P) -> Self
	where P: Into<PathBuf> {
		self.device.replace(device.into());
		self
	}

	#[must_use]
	/// # With Timeout.
	///
	/// Kill any single pass taking longer than this. Zero disables the
	/// timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout).filter(|t| ! t.is_zero());
		self
	}

	/// # Query Table.
	///
	/// Ask the drive for the table of contents, noting the drive model along
	/// the way.
	///
	/// ## Errors
	///
	/// This will return an error if `cdparanoia` fails or its output can't be
	/// parsed.
	pub fn query_table(&mut self) -> Result<Table, VeriRipError> {
		let mut cmd = Command::new(&self.program);
		cmd.arg("-Q");
		if let Some(dev) = &self.device { cmd.arg("--force-cdrom-device").arg(dev); }

		// The table goes to STDERR.
		let out = cmd.stdin(Stdio::null()).output()
			.map_err(|e| VeriRipError::ReadFailure(0, e.to_string()))?;
		let raw = String::from_utf8_lossy(&out.stderr);
		if ! out.status.success() {
			return Err(VeriRipError::ReadFailure(0, exit_reason(out.status)));
		}

		if let Some(drive) = parse_drive(&raw) { self.drive.replace(drive); }
		Table::from_cdparanoia_query(&raw)
	}

	/// # Arguments.
	fn args(&self, sectors: &Range<u32>, offset: ReadOffset) -> Vec<OsString> {
		let mut out: Vec<OsString> = vec![
			"--stderr-progress".into(),
			"--output-raw-little-endian".into(),
			"--sample-offset".into(),
			offset.samples().to_string().into(),
		];
		if let Some(dev) = &self.device {
			out.push("--force-cdrom-device".into());
			out.push(dev.into());
		}
		out.push(span(sectors).into());
		out.push("-".into());
		out
	}
}

impl SampleReader for CdparanoiaReader {
	fn read(
		&mut self,
		track: u8,
		sectors: Range<u32>,
		offset: ReadOffset,
		dst: &mut (dyn Write + Send),
		killed: &KillSwitch,
	) -> Result<ReadStats, VeriRipError> {
		if sectors.is_empty() {
			return Err(VeriRipError::ReadFailure(track, "empty range".to_owned()));
		}

		let mut child = Command::new(&self.program)
			.args(self.args(&sectors, offset))
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| VeriRipError::ReadFailure(track, e.to_string()))?;

		let mut stdout = child.stdout.take()
			.ok_or_else(|| VeriRipError::ReadFailure(track, "no stdout".to_owned()))?;
		let stderr = child.stderr.take()
			.ok_or_else(|| VeriRipError::ReadFailure(track, "no stderr".to_owned()))?;

		// Drain both pipes in the background while we babysit the process.
		let now = Instant::now();
		let timeout = self.timeout;
		let (exit, copied, reads) = std::thread::scope(|s| {
			let copied = s.spawn(move || std::io::copy(&mut stdout, dst));
			let reads = s.spawn(move || count_reads(BufReader::new(stderr)));

			let exit = loop {
				match child.try_wait() {
					Ok(Some(status)) => break Exit::Done(status),
					Ok(None) => {},
					Err(e) => {
						let _res = child.kill();
						let _res = child.wait();
						break Exit::Failed(e.to_string());
					},
				}

				if killed.killed() {
					let _res = child.kill();
					let _res = child.wait();
					break Exit::Killed;
				}

				if timeout.map_or(false, |t| t < now.elapsed()) {
					let _res = child.kill();
					let _res = child.wait();
					break Exit::Timeout;
				}

				std::thread::sleep(POLL);
			};

			(exit, copied.join(), reads.join())
		});

		match exit {
			Exit::Done(status) if status.success() => {},
			Exit::Done(status) => return Err(VeriRipError::ReadFailure(track, exit_reason(status))),
			Exit::Failed(e) => return Err(VeriRipError::ReadFailure(track, e)),
			Exit::Killed => return Err(VeriRipError::Killed),
			Exit::Timeout => return Err(VeriRipError::ReadFailure(track, "timed out".to_owned())),
		}

		match copied {
			Ok(Ok(_)) => {},
			Ok(Err(e)) => return Err(VeriRipError::ReadFailure(track, e.to_string())),
			Err(_) => return Err(VeriRipError::Bug("the PCM pipe thread panicked")),
		}

		Ok(ReadStats::new(reads.ok()))
	}

	fn version(&self) -> Option<String> {
		let out = Command::new(&self.program)
			.arg("-V")
			.stdin(Stdio::null())
			.output()
			.ok()?;

		// It prints to STDERR, naturally.
		let raw = String::from_utf8_lossy(&out.stderr);
		raw.lines()
			.map(str::trim)
			.find(|l| l.starts_with("cdparanoia"))
			.map(String::from)
	}

	fn drive(&self) -> Option<String> {
		self.drive.clone()
			.or_else(|| self.device.as_ref().map(|d| d.to_string_lossy().into_owned()))
	}
}



/// # Child Exit.
enum Exit {
	/// # Finished (Maybe Badly).
	Done(ExitStatus),

	/// # Couldn't Wait.
	Failed(String),

	/// # User Abort.
	Killed,

	/// # Took Too Long.
	Timeout,
}



/// # Count Reads.
///
/// Tally up the sector-aligned `[read]` progress lines `cdparanoia` emits with
/// `--stderr-progress`.
fn count_reads<R: Read>(src: BufReader<R>) -> u64 {
	let mut reads = 0;
	for line in src.lines().map_while(Result::ok) {
		if let Some(("[read]", offset)) = parse_progress(&line) {
			if offset % WORDS_PER_SECTOR == 0 { reads += 1; }
		}
	}
	reads
}

/// # Exit Reason.
fn exit_reason(status: ExitStatus) -> String {
	status.code().map_or_else(
		|| "terminated by signal".to_owned(),
		|c| format!("exit code {c}"),
	)
}

/// # Parse Drive.
///
/// Pull the vendor/model out of the `-Q` preamble.
fn parse_drive(src: &str) -> Option<String> {
	src.lines()
		.find_map(|l| l.trim().strip_prefix("CDROM model sensed sensed:"))
		.map(str::trim)
		.filter(|l| ! l.is_empty())
		.map(String::from)
}

/// # Parse Progress Line.
///
/// Lines look like `##: 0 [read] @ 1176`; this returns the bracketed
/// function name and the word offset.
fn parse_progress(line: &str) -> Option<(&str, u64)> {
	let mut parts = line.strip_prefix("##: ")?.split_whitespace();
	let _code = parts.next()?.parse::<i32>().ok()?;
	let kind = parts.next().filter(|k| k.starts_with('[') && k.ends_with(']'))?;
	if parts.next()? != "@" { return None; }
	let offset = parts.next()?.parse::<u64>().ok()?;
	Some((kind, offset))
}

/// # Span.
///
/// Format an absolute range for `cdparanoia`. Its ranges are inclusive.
fn span(sectors: &Range<u32>) -> String {
	format!(
		"{}-{}",
		hmsf(sectors.start),
		hmsf(sectors.end.saturating_sub(1).max(sectors.start)),
	)
}

#[allow(clippy::integer_division)]
/// # Sectors to `[H:MM:SS.FF]`.
fn hmsf(sectors: u32) -> String {
	let f = sectors % SECTORS_PER_SECOND;
	let secs = sectors / SECTORS_PER_SECOND;
	let s = secs % 60;
	let m = (secs / 60) % 60;
	let h = secs / 3600;
	format!("[{h}:{m:02}:{s:02}.{f:02}]")
}
