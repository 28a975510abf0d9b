/*!
# Veririp: Errors
*/

use cdtoc::TocError;
use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r"
Veririp v", env!("CARGO_PKG_VERSION"), r#"
Secure, verifiable audio CD ripping.

Each track is read twice and the two passes compared; mismatches are retried
up to five times. The finished rip is then checked against the AccurateRip
database.

USAGE:
    veririp [OPTIONS]

BASIC SETTINGS:
    -t, --tracks <NUM(s),RNG>
                      Rip one or more specific tracks (rather than the whole
                      disc). Multiple tracks can be separated by commas (2,3)
                      and/or specified as an inclusive range (2-5).
                      [default: the whole disc]
        --htoa        Rip the hidden track one audio (as track 0), if any.
        --out <DIR>   Write the tracks, cue sheet, and state data to this
                      directory. [default: the current working directory]

DRIVE SETTINGS:
    -d, --dev <PATH>  The device path for the optical drive containing the CD
                      of interest, like /dev/cdrom. [default: auto]
    -o, --offset <SAMPLES>
                      The AccurateRip sample read offset to apply to data
                      retrieved from the drive. [default: 0; range: ±5880]
        --timeout <SECS>
                      Kill and retry any single read pass taking longer than
                      this. [default: none; max: 65,535]
        --toc <CDTOC> Use this CDTOC rather than querying the drive for the
                      table of contents.

VERIFICATION:
        --unknown     Accept the rip even if the disc is not in the AccurateRip
                      database, provided every track read consistently.

MISCELLANEOUS:
    -h, --help        Print help information to STDOUT and exit.
    -v, --verbose     Print a detailed log of every read attempt to STDOUT, so
                      it can e.g. be piped to a file for review, like:
                      veririp -v > rip.log
    -V, --version     Print version information to STDOUT and exit.
        --no-resume   Ignore any previous rip state, starting over from
                      scratch.
        --no-rip      Print the basic disc information to STDERR and exit
                      (without ripping anything).
        --no-summary  Skip the disc summary and jump straight to ripping.

EARLY EXIT:
    Press CTRL+C to stop early. The track being read will be abandoned, but
    finished tracks are saved and will be picked up again next time.
"#);



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum VeriRipError {
	/// # Invalid AccurateRip Response.
	ArParse,

	/// # Bug!
	Bug(&'static str),

	/// # Cache directory.
	Cache,

	/// # CDTOC passthrough.
	Cdtoc(TocError),

	/// # Test/Copy Mismatch.
	///
	/// The test and copy reads disagreed.
	ChecksumMismatch {
		/// # Track Number.
		track: u8,

		/// # Attempts.
		tries: u8,

		/// # Test CRC.
		test: u32,

		/// # Copy CRC.
		copy: u32,
	},

	/// # Database Unavailable.
	DatabaseUnavailable(String),

	/// # Encode/Decode.
	Encode(String),

	/// # Encoded Audio Mismatch.
	EncodeChecksumMismatch {
		/// # Track Number.
		track: u8,

		/// # Expected CRC.
		expected: u32,

		/// # Actual CRC.
		actual: u32,
	},

	/// # Results Are Final.
	Finalized,

	/// # Conflicting Index Offsets.
	IndexConflict(u8, u8),

	/// # Out-of-Order Index.
	IndexOrder(u8, u8),

	/// # User Abort.
	Killed,

	/// # Short Decode.
	MissingFrames {
		/// # Track Number.
		track: u8,

		/// # Expected Samples.
		expected: u64,

		/// # Actual Samples.
		actual: u64,
	},

	/// # Noop.
	Noop,

	/// # No Cue.
	NoCue,

	/// # No Track.
	NoTrack(u8),

	/// # Incomplete Table of Contents.
	NoToc,

	/// # Read Failure.
	ReadFailure(u8, String),

	/// # Read Offset.
	ReadOffset,

	/// # Numbers can't be converted to the necessary types.
	RipOverflow,

	/// # State Corruption.
	StateCorrupt,

	/// # State Save.
	StateSave,

	/// # Unsupported State Version.
	StateVersion(u16),

	/// # Table Parse.
	TocParse(&'static str),

	/// # Invalid track number.
	TrackNumber(u8),

	/// # Missing Track Offset.
	TrackOffset(u8),

	/// # Writing to disk.
	Write(String),

	#[cfg(feature = "bin")]
	/// # Invalid CLI arg.
	CliArg(String),

	#[cfg(feature = "bin")]
	/// # CLI Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for VeriRipError {}

impl From<TocError> for VeriRipError {
	#[inline]
	fn from(err: TocError) -> Self { Self::Cdtoc(err) }
}

impl From<VeriRipError> for Msg {
	#[inline]
	fn from(src: VeriRipError) -> Self { Self::error(src.to_string()) }
}

#[cfg(feature = "bin")]
impl From<argyle::ArgyleError> for VeriRipError {
	fn from(err: argyle::ArgyleError) -> Self {
		match err {
			argyle::ArgyleError::WantsHelp => Self::PrintHelp,
			argyle::ArgyleError::WantsVersion => Self::PrintVersion,
			e => Self::CliArg(e.to_string()),
		}
	}
}

impl fmt::Display for VeriRipError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ArParse => f.write_str("The AccurateRip response is truncated or invalid."),
			Self::Bug(s) => write!(f, "Bug: {s}."),
			Self::Cache => f.write_str("Unable to establish a cache directory."),
			Self::Cdtoc(s) => write!(f, "{s}"),
			Self::ChecksumMismatch { track, tries, test, copy } => write!(
				f,
				"Track #{track:02} test and copy reads disagreed on attempt #{tries} ({test:08X} vs {copy:08X}).",
			),
			Self::DatabaseUnavailable(s) => write!(f, "The AccurateRip database could not be reached: {s}."),
			Self::Encode(s) => write!(f, "Encoding failed: {s}."),
			Self::EncodeChecksumMismatch { track, expected, actual } => write!(
				f,
				"Track #{track:02} does not decode to what was read ({actual:08X} instead of {expected:08X}).",
			),
			Self::Finalized => f.write_str("The rip has already been accepted and cannot be changed."),
			Self::IndexConflict(t, i) => write!(f, "Track #{t:02} index #{i:02} has conflicting offsets."),
			Self::IndexOrder(t, i) => write!(f, "Track #{t:02} index #{i:02} is out of order."),
			Self::Killed => f.write_str("User abort."),
			Self::MissingFrames { track, expected, actual } => write!(
				f,
				"Track #{track:02} decoded to {actual} samples; {expected} were expected.",
			),
			Self::Noop => f.write_str("There's nothing to do!"),
			Self::NoCue => f.write_str("The table is missing the information needed for a cue sheet."),
			Self::NoTrack(n) =>
				if *n == 0 { f.write_str("There is no HTOA on this disc.") }
				else { write!(f, "There is no track #{n} on this disc.") },
			Self::NoToc => f.write_str("The table of contents is incomplete."),
			Self::ReadFailure(n, s) => write!(f, "Track #{n:02} read failed: {s}."),
			Self::ReadOffset => f.write_str("Invalid read offset."),
			Self::RipOverflow => f.write_str("The numbers are too big for this system architecture."),
			Self::StateCorrupt => f.write_str("The saved rip state is corrupt; rerip with --no-resume to start over."),
			Self::StateSave => f.write_str("Unable to save the rip state."),
			Self::StateVersion(v) => write!(f, "The saved rip state uses an unsupported format (v{v}); rerip with --no-resume to start over."),
			Self::TocParse(s) => write!(f, "Unable to parse the table of contents: {s}."),
			Self::TrackNumber(n) => write!(f, "Invalid track number ({n})."),
			Self::TrackOffset(n) => write!(f, "Track #{n:02} is missing its offsets."),
			Self::Write(s) => write!(f, "Unable to write to {s}."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Veririp v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

impl VeriRipError {
	#[must_use]
	/// # Retryable?
	///
	/// Returns `true` for the kinds of failures that may go away if the track
	/// is simply read again.
	pub const fn is_retryable(&self) -> bool {
		matches!(self, Self::ReadFailure(_, _) | Self::ChecksumMismatch { .. })
	}
}
