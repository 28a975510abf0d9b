/*!
# Veririp: Rip Results

The [`RipResult`] is the record of a disc rip: the table, the drive and tools
used, and what happened to each track. It is saved after every track so an
interrupted rip can be picked up again later.
*/

use crate::{
	ArChecksums,
	ArIds,
	ArTrackMatch,
	CacheWriter,
	OutputDir,
	ReadOffset,
	SECTORS_PER_SECOND,
	Table,
	VeriRipError,
	accuraterip::disc_accurate,
	utility::{
		zstd_decode,
		zstd_encode,
	},
};
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	collections::BTreeMap,
	io::Write,
	path::{
		Path,
		PathBuf,
	},
	time::Duration,
};



/// # State Format Version.
///
/// Bump this whenever the serialized layout changes, and add a migration for
/// the old one.
pub const STATE_VERSION: u16 = 2;

/// # State Magic.
const MAGIC: [u8; 4] = *b"VRIP";



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
/// # AccurateRip Database Status.
pub enum DatabaseStatus {
	#[default]
	/// # Not Checked Yet.
	Unchecked,

	/// # The Disc Isn't In the Database.
	NotFound,

	/// # The Database Couldn't Be Reached.
	Unavailable,

	/// # Found (Number of Pressings).
	Found(u8),
}

impl DatabaseStatus {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unchecked => "unchecked",
			Self::NotFound => "not found",
			Self::Unavailable => "unavailable",
			Self::Found(_) => "found",
		}
	}
}



#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// # Track Result.
pub struct TrackResult {
	/// # Track Number (Zero for HTOA).
	number: u8,

	/// # Output File.
	path: Option<PathBuf>,

	/// # Pregap (Sectors).
	pregap: u32,

	/// # Length (Sectors).
	sectors: u32,

	/// # Peak (Absolute) Sample Value.
	peak: u16,

	/// # Read Quality.
	quality: Option<f64>,

	/// # Test CRC.
	test_crc: Option<u32>,

	/// # Copy CRC.
	copy_crc: Option<u32>,

	/// # Test Read Time.
	test_duration: Duration,

	/// # Copy Read Time.
	copy_duration: Duration,

	/// # Local AccurateRip Checksums.
	accuraterip: Option<ArChecksums>,

	/// # Database Match.
	ar_match: Option<ArTrackMatch>,

	/// # Attempts.
	tries: u8,

	/// # Failure.
	error: Option<String>,
}

impl TrackResult {
	/// # New.
	pub(crate) const fn new(number: u8, sectors: u32, pregap: u32) -> Self {
		Self {
			number,
			path: None,
			pregap,
			sectors,
			peak: 0,
			quality: None,
			test_crc: None,
			copy_crc: None,
			test_duration: Duration::ZERO,
			copy_duration: Duration::ZERO,
			accuraterip: None,
			ar_match: None,
			tries: 0,
			error: None,
		}
	}

	/// # Set Test Pass.
	pub(crate) fn set_test(&mut self, crc: u32, duration: Duration, quality: Option<f64>) {
		self.test_crc.replace(crc);
		self.test_duration = duration;
		self.quality = quality;
	}

	/// # Set Copy Pass.
	///
	/// The overall quality is the worse of the two passes.
	pub(crate) fn set_copy(&mut self, crc: u32, duration: Duration, quality: Option<f64>) {
		self.copy_crc.replace(crc);
		self.copy_duration = duration;
		self.quality = match (self.quality, quality) {
			(Some(a), Some(b)) => Some(a.min(b)),
			(a, b) => a.or(b),
		};
	}

	/// # Reset Passes.
	///
	/// Clear the per-attempt details before a retry.
	pub(crate) fn reset_passes(&mut self) {
		self.test_crc = None;
		self.copy_crc = None;
		self.test_duration = Duration::ZERO;
		self.copy_duration = Duration::ZERO;
		self.quality = None;
	}

	/// # Set Tries.
	pub(crate) fn set_tries(&mut self, tries: u8) { self.tries = tries; }

	/// # Set Output.
	pub(crate) fn set_output(&mut self, path: PathBuf, ar: ArChecksums, peak: u16) {
		self.path.replace(path);
		self.accuraterip.replace(ar);
		self.peak = peak;
		self.error = None;
	}

	/// # Set Error.
	pub(crate) fn set_error(&mut self, err: &VeriRipError) {
		self.path = None;
		self.error.replace(err.to_string());
	}

	/// # Set Match.
	pub(crate) fn set_match(&mut self, ar: Option<ArTrackMatch>) { self.ar_match = ar; }
}

impl TrackResult {
	#[must_use]
	/// # Number.
	pub const fn number(&self) -> u8 { self.number }

	#[must_use]
	/// # Is HTOA?
	pub const fn is_htoa(&self) -> bool { self.number == 0 }

	#[must_use]
	/// # Output File.
	pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

	#[must_use]
	/// # Pregap (Sectors).
	pub const fn pregap(&self) -> u32 { self.pregap }

	#[must_use]
	/// # Length (Sectors).
	pub const fn sectors(&self) -> u32 { self.sectors }

	#[must_use]
	/// # Peak.
	pub const fn peak(&self) -> u16 { self.peak }

	#[must_use]
	/// # Peak (Relative).
	///
	/// The peak as a fraction of full scale.
	pub fn peak_ratio(&self) -> f64 { f64::from(self.peak) / 32_768.0 }

	#[must_use]
	/// # Read Quality.
	pub const fn quality(&self) -> Option<f64> { self.quality }

	#[must_use]
	/// # Test CRC.
	pub const fn test_crc(&self) -> Option<u32> { self.test_crc }

	#[must_use]
	/// # Copy CRC.
	pub const fn copy_crc(&self) -> Option<u32> { self.copy_crc }

	#[must_use]
	/// # Test Read Time.
	pub const fn test_duration(&self) -> Duration { self.test_duration }

	#[must_use]
	/// # Copy Read Time.
	pub const fn copy_duration(&self) -> Duration { self.copy_duration }

	#[must_use]
	/// # Test Read Speed.
	///
	/// As a multiple of realtime.
	pub fn test_speed(&self) -> Option<f64> { speed(self.sectors, self.test_duration) }

	#[must_use]
	/// # Copy Read Speed.
	pub fn copy_speed(&self) -> Option<f64> { speed(self.sectors, self.copy_duration) }

	#[must_use]
	/// # Local AccurateRip Checksums.
	pub const fn accuraterip(&self) -> Option<ArChecksums> { self.accuraterip }

	#[must_use]
	/// # Database Match.
	pub const fn ar_match(&self) -> Option<ArTrackMatch> { self.ar_match }

	#[must_use]
	/// # Accurate?
	pub fn is_accurate(&self) -> bool {
		self.ar_match.map_or(false, |m| m.is_accurate())
	}

	#[must_use]
	/// # Attempts.
	pub const fn tries(&self) -> u8 { self.tries }

	#[must_use]
	/// # Failure Message.
	pub fn error(&self) -> Option<&str> { self.error.as_deref() }

	#[must_use]
	/// # Ripped Okay?
	///
	/// Returns `true` if the track was read consistently and saved.
	pub fn is_ok(&self) -> bool {
		self.error.is_none() &&
		self.path.is_some() &&
		self.test_crc.is_some() &&
		self.test_crc == self.copy_crc
	}
}



#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// # Rip Result.
///
/// Once [accepted](RipResult::is_accepted), a result can no longer be
/// changed.
pub struct RipResult {
	/// # Creation Time (Unix).
	created: u32,

	/// # Program Version.
	program: String,

	/// # Disc Table.
	table: Table,

	/// # Read Offset.
	offset: ReadOffset,

	/// # Drive.
	drive: Option<String>,

	/// # Reader Version.
	reader: Option<String>,

	/// # Encoder Version.
	encoder: Option<String>,

	/// # Tracks.
	tracks: BTreeMap<u8, TrackResult>,

	/// # Database Status.
	database: DatabaseStatus,

	/// # Cue Sheet.
	cue: Option<PathBuf>,

	/// # Accepted?
	accepted: bool,
}

impl RipResult {
	#[must_use]
	/// # New.
	pub fn new(table: Table, offset: ReadOffset) -> Self {
		Self {
			created: utc2k::unixtime(),
			program: concat!("Veririp v", env!("CARGO_PKG_VERSION")).to_owned(),
			table,
			offset,
			drive: None,
			reader: None,
			encoder: None,
			tracks: BTreeMap::new(),
			database: DatabaseStatus::Unchecked,
			cue: None,
			accepted: false,
		}
	}

	/// # Not Finalized.
	const fn writable(&self) -> Result<(), VeriRipError> {
		if self.accepted { Err(VeriRipError::Finalized) }
		else { Ok(()) }
	}

	/// # Table (Mutable).
	pub(crate) fn table_mut(&mut self) -> Result<&mut Table, VeriRipError> {
		self.writable()?;
		Ok(&mut self.table)
	}

	/// # Set Tools.
	pub(crate) fn set_tools(
		&mut self,
		drive: Option<String>,
		reader: Option<String>,
		encoder: Option<String>,
	) -> Result<(), VeriRipError> {
		self.writable()?;
		self.drive = drive;
		self.reader = reader;
		self.encoder = encoder;
		Ok(())
	}

	/// # Set Track.
	pub(crate) fn set_track(&mut self, track: TrackResult) -> Result<(), VeriRipError> {
		self.writable()?;
		self.tracks.insert(track.number, track);
		Ok(())
	}

	/// # Set Matches.
	///
	/// Record the database status along with the per-track matches, if any.
	/// Tracks missing from `matches` have their previous match cleared.
	pub(crate) fn set_matches(&mut self, status: DatabaseStatus, matches: &BTreeMap<u8, ArTrackMatch>)
	-> Result<(), VeriRipError> {
		self.writable()?;
		self.database = status;
		for (k, v) in &mut self.tracks {
			v.set_match(matches.get(k).copied());
		}
		Ok(())
	}

	/// # Set Cue.
	pub(crate) fn set_cue(&mut self, path: PathBuf) -> Result<(), VeriRipError> {
		self.writable()?;
		self.cue.replace(path);
		Ok(())
	}

	/// # Accept.
	///
	/// Accept the rip, if possible, returning `true` if it was (or already
	/// had been).
	///
	/// Every audio track must have been ripped consistently. Beyond that,
	/// each must match AccurateRip, or, if `allow_unknown`, the disc can
	/// simply be absent from the database.
	pub(crate) fn accept(&mut self, allow_unknown: bool) -> bool {
		if self.accepted { return true; }

		let bypass = allow_unknown && matches!(self.database, DatabaseStatus::NotFound);
		if self.is_complete() && (bypass || self.is_accurate()) {
			self.accepted = true;
		}

		self.accepted
	}
}

impl RipResult {
	#[must_use]
	/// # Creation Time (Unix).
	pub const fn created(&self) -> u32 { self.created }

	#[must_use]
	/// # Program Version.
	pub fn program(&self) -> &str { &self.program }

	#[must_use]
	/// # Table.
	pub const fn table(&self) -> &Table { &self.table }

	#[must_use]
	/// # Read Offset.
	pub const fn offset(&self) -> ReadOffset { self.offset }

	#[must_use]
	/// # Drive.
	pub fn drive(&self) -> Option<&str> { self.drive.as_deref() }

	#[must_use]
	/// # Reader Version.
	pub fn reader(&self) -> Option<&str> { self.reader.as_deref() }

	#[must_use]
	/// # Encoder Version.
	pub fn encoder(&self) -> Option<&str> { self.encoder.as_deref() }

	#[must_use]
	/// # Track.
	pub fn track(&self, number: u8) -> Option<&TrackResult> { self.tracks.get(&number) }

	/// # Tracks.
	pub fn tracks(&self) -> impl Iterator<Item=&TrackResult> { self.tracks.values() }

	#[must_use]
	/// # Database Status.
	pub const fn database(&self) -> DatabaseStatus { self.database }

	#[must_use]
	/// # Cue Sheet.
	pub fn cue(&self) -> Option<&Path> { self.cue.as_deref() }

	#[must_use]
	/// # Accepted?
	pub const fn is_accepted(&self) -> bool { self.accepted }

	#[must_use]
	/// # Complete?
	///
	/// Returns `true` if every audio track was ripped okay.
	pub fn is_complete(&self) -> bool {
		self.table.audio_tracks() != 0 &&
		self.table.audio_track_numbers()
			.all(|n| self.tracks.get(&n).map_or(false, TrackResult::is_ok))
	}

	#[must_use]
	/// # Accurate?
	///
	/// Returns `true` if every audio track matched AccurateRip.
	pub fn is_accurate(&self) -> bool {
		let mut matches = Vec::with_capacity(usize::from(self.table.audio_tracks()));
		for n in self.table.audio_track_numbers() {
			let Some(m) = self.tracks.get(&n).and_then(TrackResult::ar_match)
			else { return false; };
			matches.push(m);
		}
		disc_accurate(&matches)
	}
}

/// # Persistence.
impl RipResult {
	#[must_use]
	/// # State File Name.
	pub fn state_name(ids: &ArIds) -> String { format!("state-{ids}.bin") }

	/// # To Bytes.
	///
	/// Serialize the result: a magic header, the format version, then the
	/// zstd-compressed bincode body.
	///
	/// ## Errors
	///
	/// This will return an error if serialization fails.
	pub fn to_bytes(&self) -> Result<Vec<u8>, VeriRipError> {
		let body = bincode::serialize(self).ok()
			.and_then(|raw| zstd_encode(&raw))
			.ok_or(VeriRipError::StateSave)?;

		let mut out = Vec::with_capacity(MAGIC.len() + 2 + body.len());
		out.extend_from_slice(&MAGIC);
		out.extend_from_slice(&STATE_VERSION.to_le_bytes());
		out.extend_from_slice(&body);
		Ok(out)
	}

	/// # From Bytes.
	///
	/// Older formats are migrated on the fly.
	///
	/// ## Errors
	///
	/// This will return an error if the data is corrupt or from an unknown
	/// version.
	pub fn from_bytes(src: &[u8]) -> Result<Self, VeriRipError> {
		let rest = src.strip_prefix(MAGIC.as_slice()).ok_or(VeriRipError::StateCorrupt)?;
		let [a, b, body @ ..] = rest else { return Err(VeriRipError::StateCorrupt); };
		let version = u16::from_le_bytes([*a, *b]);
		let raw = match version {
			1 | STATE_VERSION => zstd_decode(body).ok_or(VeriRipError::StateCorrupt)?,
			v => return Err(VeriRipError::StateVersion(v)),
		};

		if version == 1 {
			bincode::deserialize::<RipResultV1>(&raw)
				.map(Self::from)
				.map_err(|_| VeriRipError::StateCorrupt)
		}
		else {
			bincode::deserialize::<Self>(&raw).map_err(|_| VeriRipError::StateCorrupt)
		}
	}

	/// # Save.
	///
	/// Atomically write the state to the cache.
	///
	/// ## Errors
	///
	/// This will return an error if the state cannot be serialized or
	/// written.
	pub fn save(&self, dir: &OutputDir) -> Result<(), VeriRipError> {
		let ids = self.table.accuraterip_ids()?;
		let raw = self.to_bytes()?;
		let mut writer = CacheWriter::new(&dir.cache_path(&Self::state_name(&ids)))?;
		writer.writer().write_all(&raw).map_err(|_| VeriRipError::StateSave)?;
		writer.finish()
	}

	/// # Load.
	///
	/// Load the saved state for the disc, if there is any.
	///
	/// ## Errors
	///
	/// This will return an error if the state exists but can't be read.
	pub fn load(dir: &OutputDir, ids: &ArIds) -> Result<Option<Self>, VeriRipError> {
		match dir.cache_read(&Self::state_name(ids)) {
			Some(raw) => Self::from_bytes(&raw).map(Some),
			None => Ok(None),
		}
	}
}



#[derive(Deserialize)]
/// # Track Result (Version 1).
///
/// The first format had no timing, peak, or attempt details, and stored the
/// match confidence directly.
struct TrackResultV1 {
	/// # Number.
	number: u8,

	/// # Output File.
	path: Option<PathBuf>,

	/// # Pregap.
	pregap: u32,

	/// # Length.
	sectors: u32,

	/// # Quality.
	quality: Option<f64>,

	/// # Test CRC.
	test_crc: Option<u32>,

	/// # Copy CRC.
	copy_crc: Option<u32>,

	/// # Local Checksums.
	accuraterip: Option<ArChecksums>,
}

impl From<TrackResultV1> for TrackResult {
	fn from(src: TrackResultV1) -> Self {
		let mut out = Self::new(src.number, src.sectors, src.pregap);
		out.path = src.path;
		out.quality = src.quality;
		out.test_crc = src.test_crc;
		out.copy_crc = src.copy_crc;
		out.accuraterip = src.accuraterip;
		out.tries = u8::from(out.test_crc.is_some());
		out
	}
}

#[derive(Deserialize)]
/// # Rip Result (Version 1).
struct RipResultV1 {
	/// # Disc Table.
	table: Table,

	/// # Read Offset.
	offset: ReadOffset,

	/// # Drive.
	drive: Option<String>,

	/// # Tracks.
	tracks: BTreeMap<u8, TrackResultV1>,

	/// # Accepted?
	accepted: bool,
}

impl From<RipResultV1> for RipResult {
	/// # Migrate.
	///
	/// Matches were not kept, so the database status starts over.
	fn from(src: RipResultV1) -> Self {
		let mut out = Self::new(src.table, src.offset);
		out.drive = src.drive;
		out.tracks = src.tracks.into_iter().map(|(k, v)| (k, TrackResult::from(v))).collect();
		out.accepted = src.accepted;
		out
	}
}



#[allow(clippy::cast_precision_loss)]
/// # Speed (× Realtime).
fn speed(sectors: u32, time: Duration) -> Option<f64> {
	let secs = time.as_secs_f64();
	if secs <= 0.0 || sectors == 0 { None }
	else { Some(f64::from(sectors) / f64::from(SECTORS_PER_SECOND) / secs) }
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		ArStatus,
		ArResponse,
		ArResponseTrack,
		match_track,
	};

	/// # Two-Track Table.
	fn table() -> Table {
		Table::from_cdtoc("2+96+4000+9C40").expect("CDTOC failed.")
	}

	/// # Finished Track.
	fn track(n: u8, crc: u32) -> TrackResult {
		let mut out = TrackResult::new(n, 1000, 0);
		out.set_test(crc, Duration::from_secs(2), Some(1.0));
		out.set_copy(crc, Duration::from_secs(4), Some(0.5));
		out.set_tries(1);
		out.set_output(PathBuf::from(format!("{n:02}.wav")), ArChecksums { v1: crc, v2: crc + 1 }, 16_384);
		out
	}

	#[test]
	fn t_track() {
		let t = track(1, 5);
		assert!(t.is_ok(), "The track should be okay.");
		assert_eq!(t.quality(), Some(0.5), "Quality should be the lower of the two.");
		assert_eq!(t.peak_ratio(), 0.5);

		// 1000 sectors is 13.33 seconds.
		let speed = t.test_speed().expect("Missing speed.");
		assert!((speed - 1000.0 / 75.0 / 2.0).abs() < 0.0001, "Wrong speed: {speed}");

		let mut t = track(2, 5);
		t.set_error(&VeriRipError::Killed);
		assert!(! t.is_ok(), "Errors are not okay.");
		assert_eq!(t.error(), Some("User abort."));

		let mut t = TrackResult::new(3, 1000, 0);
		t.set_test(1, Duration::from_secs(1), None);
		t.set_copy(2, Duration::from_secs(1), None);
		assert!(! t.is_ok(), "Mismatched reads are not okay.");
		t.reset_passes();
		assert_eq!(t.test_crc(), None);
		assert_eq!(t.copy_duration(), Duration::ZERO);
	}

	#[test]
	fn t_accept() {
		let mut res = RipResult::new(table(), ReadOffset::default());
		assert!(! res.accept(true), "Nothing has been ripped.");

		res.set_track(track(1, 1)).expect("Set failed.");
		res.set_track(track(2, 2)).expect("Set failed.");
		assert!(res.is_complete());
		assert!(! res.accept(false), "Nothing has been verified.");

		// The disc isn't in the database.
		res.set_matches(DatabaseStatus::NotFound, &BTreeMap::new()).expect("Set failed.");
		assert!(! res.accept(false), "Unknown discs need the bypass.");
		assert!(res.accept(true), "The bypass should work.");
		assert_eq!(
			res.set_track(track(1, 1)),
			Err(VeriRipError::Finalized),
			"Accepted results should be final.",
		);
		assert!(res.accept(false), "Acceptance should stick.");
	}

	#[test]
	fn t_accept_accurate() {
		let mut res = RipResult::new(table(), ReadOffset::default());
		res.set_track(track(1, 1)).expect("Set failed.");
		res.set_track(track(2, 2)).expect("Set failed.");

		let ids = res.table().accuraterip_ids().expect("Missing IDs.");
		let responses = [ArResponse::new(ids, vec![
			ArResponseTrack { confidence: 3, checksum: 1 },
			ArResponseTrack { confidence: 3, checksum: 9 },
		])];

		let mut matches = BTreeMap::new();
		for (k, n) in [1_u8, 2].into_iter().enumerate() {
			let local = res.track(n).and_then(TrackResult::accuraterip).expect("Missing checksums.");
			matches.insert(n, match_track(&ids, k, local, &responses));
		}
		assert_eq!(matches[&2].status(), ArStatus::Inaccurate);

		res.set_matches(DatabaseStatus::Found(1), &matches).expect("Set failed.");
		assert!(! res.is_accurate(), "Track two didn't match.");
		assert!(! res.accept(true), "The bypass only applies to unknown discs.");

		// Fix the second track.
		matches.insert(2, match_track(&ids, 1, ArChecksums { v1: 9, v2: 0 }, &responses));
		res.set_matches(DatabaseStatus::Found(1), &matches).expect("Set failed.");
		assert!(res.is_accurate(), "Both tracks should match now.");
		assert!(res.accept(false));
	}

	#[test]
	fn t_persist() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let out = OutputDir::new(dir.path()).expect("Output dir failed.");

		let mut res = RipResult::new(table(), ReadOffset::try_from(6_i16).expect("Offset."));
		res.set_tools(Some("Drive".to_owned()), Some("cdparanoia".to_owned()), None)
			.expect("Set failed.");
		res.set_track(track(1, 1)).expect("Set failed.");
		res.save(&out).expect("Save failed.");

		let ids = res.table().accuraterip_ids().expect("Missing IDs.");
		let loaded = RipResult::load(&out, &ids).expect("Load failed.").expect("Missing state.");
		assert_eq!(loaded, res, "The state changed.");

		// Other discs have nothing.
		let other = ArIds::new(1, 1, 2, 3);
		assert_eq!(RipResult::load(&out, &other), Ok(None));
	}

	#[test]
	fn t_versions() {
		let res = RipResult::new(table(), ReadOffset::default());
		let mut raw = res.to_bytes().expect("Serialize failed.");
		assert_eq!(&raw[..4], b"VRIP");
		assert_eq!(raw[4..6], STATE_VERSION.to_le_bytes());

		// Unknown versions.
		raw[4] = 99;
		assert_eq!(RipResult::from_bytes(&raw), Err(VeriRipError::StateVersion(99)));

		// Garbage.
		assert_eq!(RipResult::from_bytes(b"VRIP\x02\x00nope"), Err(VeriRipError::StateCorrupt));
		assert_eq!(RipResult::from_bytes(b"nope"), Err(VeriRipError::StateCorrupt));
		assert_eq!(RipResult::from_bytes(b"VRIP"), Err(VeriRipError::StateCorrupt));
	}

	#[test]
	fn t_migrate() {
		#[derive(Serialize)]
		struct OldTrack {
			number: u8,
			path: Option<PathBuf>,
			pregap: u32,
			sectors: u32,
			quality: Option<f64>,
			test_crc: Option<u32>,
			copy_crc: Option<u32>,
			accuraterip: Option<ArChecksums>,
		}

		#[derive(Serialize)]
		struct Old {
			table: Table,
			offset: ReadOffset,
			drive: Option<String>,
			tracks: BTreeMap<u8, OldTrack>,
			accepted: bool,
		}

		let mut tracks = BTreeMap::new();
		tracks.insert(1, OldTrack {
			number: 1,
			path: Some(PathBuf::from("01.wav")),
			pregap: 0,
			sectors: 1000,
			quality: Some(1.0),
			test_crc: Some(7),
			copy_crc: Some(7),
			accuraterip: Some(ArChecksums { v1: 1, v2: 2 }),
		});
		let old = Old {
			table: table(),
			offset: ReadOffset::default(),
			drive: Some("Old Drive".to_owned()),
			tracks,
			accepted: false,
		};

		let body = bincode::serialize(&old).expect("Serialize failed.");
		let mut raw = b"VRIP\x01\x00".to_vec();
		raw.extend_from_slice(&zstd_encode(&body).expect("Compress failed."));

		let res = RipResult::from_bytes(&raw).expect("Migration failed.");
		assert_eq!(res.drive(), Some("Old Drive"));
		assert_eq!(res.database(), DatabaseStatus::Unchecked);
		let t = res.track(1).expect("Missing track.");
		assert!(t.is_ok(), "The migrated track should still be okay.");
		assert_eq!(t.tries(), 1);
		assert_eq!(t.peak(), 0);
	}
}
