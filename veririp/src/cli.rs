/*!
# Veririp: CLI
*/

use argyle::{
	Argue,
	FLAG_HELP,
	FLAG_VERSION,
};
use dactyl::traits::BytesToUnsigned;
use std::{
	ffi::OsStr,
	os::unix::ffi::OsStrExt,
	path::Path,
	time::Duration,
};
use trimothy::TrimSlice;
use veririp_core::{
	CdparanoiaReader,
	OutputDir,
	ReadOffset,
	RipOptions,
	Table,
	VeriRipError,
};



/// # Parsed Settings.
pub(super) struct Settings {
	/// # Rip Options.
	pub(super) opts: RipOptions,

	/// # Disc Table.
	pub(super) table: Table,

	/// # Reader.
	pub(super) reader: CdparanoiaReader,

	/// # Output Directory.
	pub(super) out: OutputDir,

	/// # Stop After the Summary.
	pub(super) no_rip: bool,

	/// # Skip the Summary.
	pub(super) no_summary: bool,
}



/// # Parse Options.
pub(super) fn parse() -> Result<Settings, VeriRipError> {
	let args = Argue::new(FLAG_HELP | FLAG_VERSION)?;

	let mut opts = RipOptions::default()
		.with_resume(! args.switch(b"--no-resume"))
		.with_unknown(args.switch(b"--unknown"))
		.with_verbose(args.switch2(b"-v", b"--verbose"));

	if let Some(v) = args.option2(b"-o", b"--offset") {
		let v = std::str::from_utf8(v.trim()).ok()
			.and_then(|v| v.parse::<ReadOffset>().ok())
			.ok_or(VeriRipError::CliParse("-o/--offset"))?;
		opts = opts.with_offset(v);
	}

	// The reader.
	let mut reader = CdparanoiaReader::new();
	if let Some(v) = args.option2(b"-d", b"--dev") {
		reader = reader.with_device(OsStr::from_bytes(v.trim()));
	}
	if let Some(v) = args.option(b"--timeout") {
		let v = u16::btou(v.trim()).ok_or(VeriRipError::CliParse("--timeout"))?;
		reader = reader.with_timeout(Duration::from_secs(u64::from(v)));
	}

	// The table comes from the user or the drive.
	let table = match args.option(b"--toc") {
		Some(v) => {
			let v = std::str::from_utf8(v.trim())
				.map_err(|_| VeriRipError::CliParse("--toc"))?;
			Table::from_cdtoc(v)?
		},
		None => reader.query_table()?,
	};

	// Tracks.
	if let Some(v) = args.option2(b"-t", b"--tracks") {
		opts = parse_rip_option_tracks(opts, v)?;
	}
	if args.switch(b"--htoa") && table.htoa().is_some() {
		// The HTOA alone would otherwise replace the default.
		if ! opts.has_tracks() {
			for t in table.audio_track_numbers() { opts = opts.with_track(t); }
		}
		opts = opts.with_track(0);
	}

	let out = match args.option(b"--out") {
		Some(v) => OutputDir::new(Path::new(OsStr::from_bytes(v.trim())))?,
		None => OutputDir::new(".")?,
	};

	Ok(Settings {
		opts,
		table,
		reader,
		out,
		no_rip: args.switch(b"--no-rip"),
		no_summary: args.switch(b"--no-summary"),
	})
}



/// # Parse Rip Tracks.
///
/// Validation against the disc happens later, when the options are pruned.
fn parse_rip_option_tracks(mut opts: RipOptions, tracks: &[u8])
-> Result<RipOptions, VeriRipError> {
	for v in tracks.split(|b| b','.eq(b)) {
		let v = v.trim();
		if v.is_empty() { continue; }

		// It might be a range.
		if let Some(pos) = v.iter().position(|b| b'-'.eq(b)) {
			let a = v[..pos].trim();
			let b = v[pos + 1..].trim();
			if a.is_empty() || b.is_empty() {
				return Err(VeriRipError::CliParse("-t/--tracks"));
			}

			let a = u8::btou(a).ok_or(VeriRipError::CliParse("-t/--tracks"))?;
			let b = u8::btou(b).ok_or(VeriRipError::CliParse("-t/--tracks"))?;

			if a <= b {
				for idx in a..=b { opts = opts.with_track(idx); }
			}
			else { return Err(VeriRipError::CliParse("-t/--tracks")); }
		}
		// Otherwise it should be a single number.
		else {
			let v = u8::btou(v).ok_or(VeriRipError::CliParse("-t/--tracks"))?;
			opts = opts.with_track(v);
		}
	}

	Ok(opts)
}
