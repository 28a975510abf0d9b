/*!
# Veririp: Library

This crate holds the disc model, checksum engines, read/verify pipeline, and
AccurateRip matching logic behind the `veririp` binary.

The basic flow looks something like:

1. Build a [`Table`] for the disc (from a CDTOC string, or a drive query).
2. Hand it to a [`Ripper`] along with a [`SampleReader`] and [`Encoder`].
3. Rip, then [`fetch_accuraterip`] and verify the results.
4. Finish, collecting the [`RipResult`].
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod abort;
mod accuraterip;
mod cache;
mod cdtext;
mod checksum;
mod encode;
mod error;
mod offset;
mod reader;
mod result;
mod rip;
mod table;
mod utility;

pub use abort::KillSwitch;
pub use accuraterip::{
	ArIds,
	ArLookup,
	ArResponse,
	ArResponseTrack,
	ArStatus,
	ArTrackMatch,
	fetch as fetch_accuraterip,
	match_responses,
	match_track,
	parse_responses,
};
pub use cache::OutputDir;
pub(crate) use cache::CacheWriter;
pub use cdtext::CdTextKind;
pub use checksum::{
	ArChecksum,
	ArChecksums,
	ChecksumWriter,
	Crc32,
	TrackPosition,
};
pub use encode::{
	Encoder,
	WavEncoder,
};
pub use error::VeriRipError;
pub use offset::ReadOffset;
pub use reader::{
	CdparanoiaReader,
	ReadStats,
	SampleReader,
};
pub use result::{
	DatabaseStatus,
	RipResult,
	TrackResult,
	STATE_VERSION,
};
pub use rip::{
	opts::RipOptions,
	Ripper,
};
pub use table::{
	Index,
	Table,
	Track,
};



/// # Bytes Per Sample.
///
/// One sample is a left/right pair of 16-bit values.
pub const BYTES_PER_SAMPLE: u16 = 4;

/// # Samples Per Sector.
pub const SAMPLES_PER_SECTOR: u16 = 588;

/// # Bytes Per Sector.
///
/// This is the number of bytes per sector of _audio_ data.
pub const BYTES_PER_SECTOR: u16 = SAMPLES_PER_SECTOR * BYTES_PER_SAMPLE;

/// # Sectors Per Second.
pub const SECTORS_PER_SECOND: u32 = 75;

/// # Number of lead-in sectors.
///
/// All discs have a 2-second region at the start before any data. Different
/// contexts include or exclude this amount, so it's good to keep it handy.
pub const CD_LEADIN: u32 = 150;

/// # Lead-out Label.
///
/// This is used solely for the table of contents printout; e.g. 01 02 03 AA.
pub const CD_LEADOUT_LABEL: &str = "AA";

/// # Session Gap (First).
///
/// The lead-out/lead-in overhead (11,250) plus the pregap of the first track
/// (150) separating the first session from the second.
pub const SESSION_GAP: u32 = 11_400;

/// # Session Gap (Subsequent).
///
/// Sessions after the second have a smaller overhead (6,750 + 150).
pub const SESSION_GAP_NEXT: u32 = 6_900;

/// # Maximum Read Attempts.
///
/// Each attempt is a full test-read and copy-read pair.
pub const MAX_TRIES: u8 = 5;

/// # Cache Base.
///
/// The cache root is thus `OUTPUT/CACHE_BASE`.
pub const CACHE_BASE: &str = "_veririp";

/// # Wave Spec.
pub(crate) const WAVE_SPEC: hound::WavSpec = hound::WavSpec {
	channels: 2,
	sample_rate: 44100,
	bits_per_sample: 16,
	sample_format: hound::SampleFormat::Int,
};
