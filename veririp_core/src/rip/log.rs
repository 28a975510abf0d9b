/*!
# Veririp: Log
*/

use crate::VeriRipError;
use dactyl::{
	NiceElapsed,
	NicePercent,
};
use std::{
	io::Write,
	time::{
		Duration,
		Instant,
	},
};
use utc2k::FmtUtc2k;



/// # Super Basic Log.
///
/// This holds the log-worthy details for an individual track, printing them
/// out en masse once the track is finished.
///
/// Doing it this way, versus printing each line in realtime, ensures
/// consistent ordering, otherwise it's a crapshoot.
pub(super) struct RipLog {
	track: Option<(u8, Instant)>,
	err: Vec<(u8, VeriRipError, FmtUtc2k)>,
	state: Vec<(u8, RipLogKind, u32, Option<f64>, Duration)>,
}

impl Drop for RipLog {
	/// # Final Print Maybe.
	fn drop(&mut self) { self.flush(); }
}

impl RipLog {
	/// # New Instance.
	pub(super) const fn new() -> Self {
		Self {
			track: None,
			err: Vec::new(),
			state: Vec::new(),
		}
	}

	/// # New Track!
	pub(super) fn track(&mut self, track: u8) {
		self.flush();
		self.err.truncate(0);
		self.state.truncate(0);
		self.track.replace((track, Instant::now()));
	}

	/// # Add Error.
	pub(super) fn add_error(&mut self, attempt: u8, err: VeriRipError) {
		self.err.push((attempt, err, FmtUtc2k::now()));
	}

	/// # Add Test Read.
	pub(super) fn add_test(&mut self, attempt: u8, crc: u32, quality: Option<f64>, time: Duration) {
		self.state.push((attempt, RipLogKind::Test, crc, quality, time));
	}

	/// # Add Copy Read.
	pub(super) fn add_copy(&mut self, attempt: u8, crc: u32, quality: Option<f64>, time: Duration) {
		self.state.push((attempt, RipLogKind::Copy, crc, quality, time));
	}

	/// # Add Encode Check.
	pub(super) fn add_encode(&mut self, attempt: u8, crc: u32, time: Duration) {
		self.state.push((attempt, RipLogKind::Encode, crc, None, time));
	}

	/// # Flush.
	pub(super) fn flush(&mut self) {
		// Header.
		let Some((track, start)) = self.track.take() else { return; };
		let writer = std::io::stdout();
		let mut handle = writer.lock();
		let _res = writeln!(
			&mut handle,
			r"##
## Track {track:02}: {}
## Attempts: {}
##",
			NiceElapsed::from(start),
			self.state.iter().map(|(a, _, _, _, _)| *a).max().unwrap_or(0),
		);

		// Errors.
		if ! self.err.is_empty() {
			for (attempt, err, time) in self.err.drain(..) {
				let _res = writeln!(&mut handle, r"## [{time}] {attempt} {err}");
			}
			let _res = writeln!(&mut handle, "##");
		}

		// Passes.
		for (attempt, kind, crc, quality, time) in self.state.drain(..) {
			let _res = writeln!(
				&mut handle,
				r"{track:02}  {attempt}  {:<6}  {crc:08X}  {:>7}  {}",
				kind.as_str(),
				quality.map_or_else(|| "--".to_owned(), |q| NicePercent::from(q).to_string()),
				NiceElapsed::from(time),
			);
		}

		// Write it!
		let _res = handle.flush();
	}
}



#[derive(Debug, Clone, Copy)]
/// # Log Entry Kind.
enum RipLogKind {
	Test,
	Copy,
	Encode,
}

impl RipLogKind {
	/// # As Str.
	const fn as_str(self) -> &'static str {
		match self {
			Self::Test => "TEST",
			Self::Copy => "COPY",
			Self::Encode => "ENCODE",
		}
	}
}
