/*!
# Veririp: Track Rip
*/

use crate::{
	ArChecksums,
	BYTES_PER_SECTOR,
	ChecksumWriter,
	Encoder,
	KillSwitch,
	MAX_TRIES,
	ReadOffset,
	SAMPLES_PER_SECTOR,
	SampleReader,
	TrackPosition,
	TrackResult,
	VeriRipError,
};
use fyi_msg::{
	Msg,
	Progless,
};
use std::{
	io::{
		BufReader,
		BufWriter,
		Write,
	},
	ops::Range,
	path::{
		Path,
		PathBuf,
	},
	time::{
		Duration,
		Instant,
	},
};
use super::log::RipLog;
use tempfile::NamedTempFile;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Rip Stage.
pub(super) enum Stage {
	/// # First Read.
	TestRead,

	/// # Second Read.
	CopyRead,

	/// # Compare Reads.
	Compare,

	/// # Encode and Check.
	Finalize,

	/// # All Done!
	Done,

	/// # Gave Up.
	Failed,
}



/// # Rip Share.
///
/// The shared bits each track rip needs.
pub(super) struct RipShare<'a> {
	/// # Reader.
	pub(super) reader: &'a mut dyn SampleReader,

	/// # Encoder.
	pub(super) encoder: &'a dyn Encoder,

	/// # Read Offset.
	pub(super) offset: ReadOffset,

	/// # Scratch Directory.
	pub(super) tmp: &'a Path,

	/// # Kill Switch.
	pub(super) killed: &'a KillSwitch,

	/// # Progress.
	pub(super) progress: Option<&'a Progless>,

	/// # Log.
	pub(super) log: Option<&'a mut RipLog>,
}



/// # One Read Pass.
struct Pass {
	/// # CRC32.
	crc: u32,

	/// # AccurateRip.
	ar: ArChecksums,

	/// # Peak.
	peak: u16,

	/// # Quality.
	quality: Option<f64>,

	/// # Read Time.
	duration: Duration,
}



/// # Track Rip.
///
/// This walks a single track through the read-twice-and-compare process,
/// retrying the pair up to [`MAX_TRIES`] times, then encodes the verified
/// audio and makes sure it decodes back to the same thing.
pub(super) struct TrackRip {
	/// # Track Number.
	number: u8,

	/// # Absolute Sector Range.
	sectors: Range<u32>,

	/// # AccurateRip Position.
	position: TrackPosition,

	/// # Destination.
	dst: PathBuf,

	/// # Stage.
	stage: Stage,

	/// # Attempts.
	tries: u8,

	/// # Test CRC.
	test: Option<u32>,

	/// # Copy Pass and Data.
	copy: Option<(Pass, NamedTempFile)>,

	/// # Result.
	result: TrackResult,

	/// # Failure.
	error: Option<VeriRipError>,
}

impl TrackRip {
	/// # New.
	pub(super) fn new(
		number: u8,
		sectors: Range<u32>,
		position: TrackPosition,
		pregap: u32,
		dst: PathBuf,
	) -> Self {
		let len = sectors.end.saturating_sub(sectors.start);
		Self {
			number,
			sectors,
			position,
			dst,
			stage: Stage::TestRead,
			tries: 0,
			test: None,
			copy: None,
			result: TrackResult::new(number, len, pregap),
			error: None,
		}
	}

	/// # Length (Sectors).
	const fn len(&self) -> u32 { self.sectors.end.saturating_sub(self.sectors.start) }

	#[cfg(test)]
	/// # Stage.
	pub(super) const fn stage(&self) -> Stage { self.stage }

	#[cfg(test)]
	/// # Attempts.
	pub(super) const fn tries(&self) -> u8 { self.tries }

	/// # Into Result.
	pub(super) fn into_result(self) -> TrackResult { self.result }

	/// # Run!
	///
	/// Step through the stages until finished.
	///
	/// ## Errors
	///
	/// Returns the error that ended the rip, if it didn't go well.
	pub(super) fn run(&mut self, share: &mut RipShare) -> Result<(), VeriRipError> {
		if let Some(log) = share.log.as_deref_mut() { log.track(self.number); }

		loop {
			match self.step(share) {
				Stage::Done => break,
				Stage::Failed => {
					if let Some(p) = share.progress { p.increment_n(self.len() * 2); }
					return Err(self.error.clone().unwrap_or(VeriRipError::Bug("missing error")));
				},
				_ => {},
			}
		}

		if let Some(p) = share.progress { p.increment_n(self.len() * 2); }
		Ok(())
	}

	/// # Step.
	///
	/// Run the current stage, returning the next.
	fn step(&mut self, share: &mut RipShare) -> Stage {
		self.stage = match self.stage {
			Stage::TestRead => {
				self.tries += 1;
				self.result.set_tries(self.tries);
				self.title(share, "Test read");
				match self.read_pass(share) {
					Ok((pass, _)) => {
						if let Some(log) = share.log.as_deref_mut() {
							log.add_test(self.tries, pass.crc, pass.quality, pass.duration);
						}
						self.result.set_test(pass.crc, pass.duration, pass.quality);
						self.test.replace(pass.crc);
						Stage::CopyRead
					},
					Err(e) => self.retry_or_fail(e, share),
				}
			},
			Stage::CopyRead => {
				self.title(share, "Copy read");
				match self.read_pass(share) {
					Ok((pass, tmp)) => {
						if let Some(log) = share.log.as_deref_mut() {
							log.add_copy(self.tries, pass.crc, pass.quality, pass.duration);
						}
						self.result.set_copy(pass.crc, pass.duration, pass.quality);
						self.copy.replace((pass, tmp));
						Stage::Compare
					},
					Err(e) => self.retry_or_fail(e, share),
				}
			},
			Stage::Compare => {
				let test = self.test.unwrap_or_default();
				let copy = self.copy.as_ref().map_or(! test, |(p, _)| p.crc);
				if self.test.is_some() && test == copy { Stage::Finalize }
				else {
					let err = VeriRipError::ChecksumMismatch {
						track: self.number,
						tries: self.tries,
						test,
						copy,
					};
					self.retry_or_fail(err, share)
				}
			},
			Stage::Finalize => match self.finalize(share) {
				Ok(()) => Stage::Done,
				Err(e) => self.fail(e, share),
			},
			Stage::Done => Stage::Done,
			Stage::Failed => Stage::Failed,
		};

		self.stage
	}

	/// # Retry or Fail.
	///
	/// Retryable errors start the next attempt if there are any left.
	fn retry_or_fail(&mut self, err: VeriRipError, share: &mut RipShare) -> Stage {
		if err.is_retryable() && self.tries < MAX_TRIES && ! share.killed.killed() {
			if let Some(log) = share.log.as_deref_mut() { log.add_error(self.tries, err); }
			self.test = None;
			self.copy = None;
			self.result.reset_passes();
			Stage::TestRead
		}
		else { self.fail(err, share) }
	}

	/// # Fail.
	fn fail(&mut self, err: VeriRipError, share: &mut RipShare) -> Stage {
		if let Some(log) = share.log.as_deref_mut() { log.add_error(self.tries, err.clone()); }
		self.copy = None;
		self.result.set_error(&err);
		self.error.replace(err);
		Stage::Failed
	}

	/// # Read Pass.
	///
	/// Read the track into a temporary file, tallying its checksums as we go.
	fn read_pass(&self, share: &mut RipShare) -> Result<(Pass, NamedTempFile), VeriRipError> {
		let len = self.len();
		let mut tmp = NamedTempFile::new_in(share.tmp)
			.map_err(|_| VeriRipError::Write(share.tmp.to_string_lossy().into_owned()))?;

		let now = Instant::now();
		let (stats, crc, ar, peak, bytes) = {
			let mut writer = ChecksumWriter::new(
				BufWriter::new(tmp.as_file_mut()),
				self.position,
				len,
			);
			let stats = share.reader.read(
				self.number,
				self.sectors.clone(),
				share.offset,
				&mut writer,
				share.killed,
			)?;
			writer.flush().map_err(|e| VeriRipError::ReadFailure(self.number, e.to_string()))?;
			(stats, writer.crc(), writer.accuraterip(), writer.peak(), writer.bytes())
		};

		if share.killed.killed() { return Err(VeriRipError::Killed); }

		let expected = u64::from(len) * u64::from(BYTES_PER_SECTOR);
		if bytes != expected {
			return Err(VeriRipError::ReadFailure(
				self.number,
				format!("expected {expected} bytes, got {bytes}"),
			));
		}

		Ok((
			Pass {
				crc,
				ar,
				peak,
				quality: stats.quality(len),
				duration: now.elapsed(),
			},
			tmp,
		))
	}

	/// # Finalize.
	///
	/// Encode the copy read, then decode it again to make sure nothing was
	/// lost along the way.
	fn finalize(&mut self, share: &mut RipShare) -> Result<(), VeriRipError> {
		let (pass, tmp) = self.copy.take().ok_or(VeriRipError::Bug("missing copy read"))?;

		self.title(share, "Encoding");
		let now = Instant::now();
		let mut src = tmp.reopen()
			.map(BufReader::new)
			.map_err(|e| VeriRipError::Encode(e.to_string()))?;
		share.encoder.encode(&mut src, &self.dst)?;
		drop(tmp);

		self.title(share, "Verifying the encode");
		let mut chk = ChecksumWriter::new(std::io::sink(), self.position, self.len());
		let res = share.encoder.decode(&self.dst, &mut chk).and_then(|samples| {
			let expected = u64::from(self.len()) * u64::from(SAMPLES_PER_SECTOR);
			if samples < expected {
				return Err(VeriRipError::MissingFrames {
					track: self.number,
					expected,
					actual: samples,
				});
			}

			let actual = chk.crc();
			if actual != pass.crc {
				return Err(VeriRipError::EncodeChecksumMismatch {
					track: self.number,
					expected: pass.crc,
					actual,
				});
			}

			Ok(actual)
		});

		match res {
			Ok(crc) => {
				if let Some(log) = share.log.as_deref_mut() {
					log.add_encode(self.tries, crc, now.elapsed());
				}
				self.result.set_output(self.dst.clone(), pass.ar, pass.peak);
				Ok(())
			},
			Err(e) => {
				let _res = std::fs::remove_file(&self.dst);
				Err(e)
			},
		}
	}

	/// # Progress Title.
	fn title(&self, share: &RipShare, msg: &str) {
		if let Some(p) = share.progress {
			let msg =
				if self.tries <= 1 { format!("{msg}…") }
				else { format!("{msg} (attempt {}/{MAX_TRIES})…", self.tries) };
			p.set_title(Some(Msg::custom(
				format!("Track {:02}", self.number).as_str(),
				199,
				&msg,
			)));
		}
	}
}
