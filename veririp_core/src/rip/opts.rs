/*!
# Veririp: Ripping Options
*/

use crate::{
	ReadOffset,
	Table,
	VeriRipError,
};
use fyi_msg::Msg;



/// # FLAG: Accept Unknown Discs.
const FLAG_UNKNOWN: u8 = 0b0000_0001;

/// # FLAG: Resume previous rip (when applicable).
const FLAG_RESUME: u8 =  0b0000_0010;

/// # FLAG: Verbose.
const FLAG_VERBOSE: u8 = 0b0000_0100;

/// # FLAG: Default.
const FLAG_DEFAULT: u8 = FLAG_RESUME;



#[derive(Debug, Clone, Copy)]
/// # Rip Options.
///
/// This struct holds the rip-related options like read offset, track numbers,
/// etc.
///
/// Options are set using builder-style methods, like:
///
/// ```
/// use veririp_core::RipOptions;
///
/// let opts = RipOptions::default()
///     .with_unknown(true)
///     .with_track(3) // Order doesn't matter.
///     .with_track(2)
///     .with_track(15);
///
/// assert!(opts.unknown());
/// assert_eq!(opts.tracks().collect::<Vec<u8>>(), &[2, 3, 15]);
/// ```
///
/// Track zero is the HTOA, if any.
pub struct RipOptions {
	offset: ReadOffset,
	flags: u8,
	tracks: u128,
}

impl Default for RipOptions {
	fn default() -> Self {
		Self {
			offset: ReadOffset::default(),
			flags: FLAG_DEFAULT,
			tracks: 0,
		}
	}
}

macro_rules! with_flag {
	($fn:ident, $flag:ident, $($doc:literal),+ $(,)?) => (
		#[must_use]
		$(
			#[doc = $doc]
		)+
		pub const fn $fn(self, v: bool) -> Self {
			let flags =
				if v { self.flags | $flag }
				else { self.flags & ! $flag };

			Self {
				flags,
				..self
			}
		}
	)
}

/// ## Setters.
impl RipOptions {
	#[must_use]
	/// # Read Offset.
	///
	/// Optical drives have weirdly arbitrary precision problems, causing them
	/// to read data a little earlier or later than another drive might.
	///
	/// To normalize the data obtained across different drives, it is critical
	/// to set the appropriate count-offset. See [here](http://www.accuraterip.com/driveoffsets.htm) if you're not sure
	/// what your drive's offset is.
	pub const fn with_offset(self, offset: ReadOffset) -> Self {
		Self {
			offset,
			..self
		}
	}

	with_flag!(
		with_resume,
		FLAG_RESUME,
		"# Resume Previous Rip.",
		"",
		"When `true`, tracks finished by a previous run will be checked and",
		"kept rather than ripped again. When `false`, the rip starts over from",
		"scratch.",
		"",
		"The default is `true`.",
	);

	#[must_use]
	/// # Include Track.
	///
	/// Add a given track number to the to-rip list.
	pub const fn with_track(self, track: u8) -> Self {
		let tracks = self.tracks | track_idx_to_bits(track);
		Self {
			tracks,
			..self
		}
	}

	with_flag!(
		with_unknown,
		FLAG_UNKNOWN,
		"# Accept Unknown Discs.",
		"",
		"When `true`, a disc missing from the AccurateRip database can still",
		"be accepted so long as every track read consistently.",
		"",
		"The default is `false`.",
	);

	with_flag!(
		with_verbose,
		FLAG_VERBOSE,
		"# Verbose.",
		"",
		"When `true`, every read attempt is logged to STDOUT.",
		"",
		"The default is `false`.",
	);

	#[must_use]
	/// # Exclude Track.
	pub const fn without_track(self, track: u8) -> Self {
		let tracks = self.tracks & ! track_idx_to_bits(track);
		Self {
			tracks,
			..self
		}
	}
}



macro_rules! get_flag {
	($fn:ident, $flag:ident, $title:literal) => (
		#[must_use]
		#[doc = concat!("# ", $title, "?")]
		pub const fn $fn(&self) -> bool { $flag == self.flags & $flag }
	);
}

/// # Getters.
impl RipOptions {
	get_flag!(resume, FLAG_RESUME, "Resume Previous Rip");
	get_flag!(unknown, FLAG_UNKNOWN, "Accept Unknown Discs");
	get_flag!(verbose, FLAG_VERBOSE, "Verbose");

	#[must_use]
	/// # Has Any Tracks?
	pub const fn has_tracks(&self) -> bool { self.tracks != 0 }

	#[must_use]
	/// # Has Track?
	pub const fn has_track(&self, track: u8) -> bool {
		let flag = track_idx_to_bits(track);
		flag != 0 && flag == self.tracks & flag
	}

	#[must_use]
	/// # Read Offset.
	pub const fn offset(&self) -> ReadOffset { self.offset }

	#[must_use]
	/// # Tracks.
	///
	/// Return an iterator over the included track indices.
	pub const fn tracks(&self) -> RipOptionsTracks {
		RipOptionsTracks {
			set: self.tracks,
			pos: 0,
		}
	}
}

impl RipOptions {
	/// # Prune Tracks.
	///
	/// Make sure all tracks in the options are actually rippable parts of the
	/// disc, printing warnings for any that aren't. If no tracks were chosen,
	/// all of the audio tracks are.
	///
	/// ## Errors
	///
	/// If for some reason every track is invalid, an error will be returned.
	pub(crate) fn prune(self, table: &Table) -> Result<Self, VeriRipError> {
		let mut new = self;
		if ! new.has_tracks() {
			for t in table.audio_track_numbers() { new = new.with_track(t); }
		}

		for t in self.tracks() {
			if t == 0 {
				if table.htoa().is_none() {
					new = new.without_track(0);
					Msg::warning("This disc does not have an HTOA.").eprint();
				}
			}
			else if ! table.track(t).map_or(false, crate::Track::is_audio) {
				new = new.without_track(t);
				Msg::warning(format!("This disc does not have an audio track #{t}.")).eprint();
			}
		}

		if new.has_tracks() { Ok(new) }
		else { Err(VeriRipError::Noop) }
	}
}



#[derive(Debug, Clone)]
/// # Rip Option Tracks.
///
/// This iterator converts the `u128` monster flag back into individual `u8`
/// track indexes.
pub struct RipOptionsTracks {
	set: u128,
	pos: u8,
}

impl Iterator for RipOptionsTracks {
	type Item = u8;

	fn next(&mut self) -> Option<Self::Item> {
		while self.pos < 100 {
			let idx = self.pos;
			self.pos += 1;
			if 0 != self.set & track_idx_to_bits(idx) {
				return Some(idx);
			}
		}
		None
	}

	/// # Size Hint.
	///
	/// There will never be more than 99 tracks.
	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, Some(100_usize.saturating_sub(usize::from(self.pos))))
	}
}



/// # Track Number to Bitflag.
///
/// Redbook audio CDs can only have a maximum of 99 tracks (or 100 if we count
/// the HTOA as #0) so we can represent all possible combinations using a
/// single `u128` bitflag.
///
/// Out of range values are silently treated as zero.
const fn track_idx_to_bits(idx: u8) -> u128 {
	if 99 < idx { 0 }
	else { 2_u128.pow(idx as u32) }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_rip_flags() {
		// Make sure our flags are unique.
		let mut all = vec![
			FLAG_UNKNOWN,
			FLAG_RESUME,
			FLAG_VERBOSE,
		];
		all.sort_unstable();
		all.dedup();
		assert_eq!(all.len(), 3);
	}

	#[test]
	fn t_rip_options_flags() {
		macro_rules! t_flags {
			($name:literal, $set:ident, $get:ident) => (
				let mut opts = RipOptions::default();
				for v in [false, true, false, true] {
					opts = opts.$set(v);
					assert_eq!(
						opts.$get(),
						v,
						concat!("Setting ", $name, " to {} failed."),
						v
					);
				}
			);
		}

		t_flags!("resume", with_resume, resume);
		t_flags!("unknown", with_unknown, unknown);
		t_flags!("verbose", with_verbose, verbose);

		let opts = RipOptions::default();
		assert!(opts.resume(), "Resume should be on by default.");
		assert!(! opts.unknown(), "Unknown should be off by default.");
	}

	#[test]
	fn t_rip_options_offset() {
		let offset5: ReadOffset = "5".parse().expect("Read offset 5 failed.");
		let offset667: ReadOffset = "-667".parse().expect("Read offset -667 failed.");
		for v in [offset5, offset667] {
			let opts = RipOptions::default().with_offset(v);
			assert_eq!(opts.offset(), v);
		}
	}

	#[test]
	fn t_rip_options_tracks() {
		let mut opts = RipOptions::default();
		assert!(! opts.has_tracks(), "The track list should be empty!");

		// Make sure zero counts.
		opts = opts.with_track(0);
		assert!(opts.has_tracks(), "Zero should count!");
		assert!(opts.has_track(0));
		assert!(! opts.has_track(1));

		// Make sure 100 isn't allowed.
		assert_eq!(track_idx_to_bits(100), 0, "100 shouldn't have a track flag.");
		assert!(! opts.with_track(100).has_track(100));

		// Add all possible tracks.
		for idx in 0..=u8::MAX { opts = opts.with_track(idx); }
		let tracks = opts.tracks().collect::<Vec<u8>>();
		assert_eq!(tracks.len(), 100, "Expected 100 tracks.");
		for (real, expected) in tracks.into_iter().zip(0..=99_u8) {
			assert_eq!(real, expected, "Options track mismatch: {real} instead of {expected}.");
		}

		// And take one away.
		opts = opts.without_track(50);
		assert_eq!(opts.tracks().count(), 99);
		assert!(! opts.has_track(50));
	}

	#[test]
	fn t_prune() {
		let mut table = Table::from_cdtoc("3+96+2D2B+6256+B327").expect("CDTOC failed.");
		assert!(table.htoa().is_none());

		// Nothing means everything.
		let opts = RipOptions::default().prune(&table).expect("Prune failed.");
		assert_eq!(opts.tracks().collect::<Vec<u8>>(), [1, 2, 3]);

		// Invalid tracks are dropped.
		let opts = RipOptions::default()
			.with_track(0)
			.with_track(2)
			.with_track(9)
			.prune(&table)
			.expect("Prune failed.");
		assert_eq!(opts.tracks().collect::<Vec<u8>>(), [2]);

		// All invalid is an error.
		let res = RipOptions::default().with_track(9).prune(&table);
		assert!(matches!(res, Err(VeriRipError::Noop)), "Expected a noop.");

		// HTOA is fine if there is one.
		table = Table::from_cdtoc("2+2D2B+6256+B327").expect("CDTOC failed.");
		assert!(table.htoa().is_some(), "Expected an HTOA.");
		let opts = RipOptions::default().with_track(0).prune(&table).expect("Prune failed.");
		assert_eq!(opts.tracks().collect::<Vec<u8>>(), [0]);
	}
}
