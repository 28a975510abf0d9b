/*!
# Veririp: AccurateRip

This module handles the AccurateRip side of things: disc IDs, the lookup URL,
downloading and parsing the database's binary responses, and matching them
against local checksums (see [`match_track`]).

AccurateRip only publishes checksums after they have been confirmed by
multiple submitters, so even a confidence of one provides reasonable
statistical certainty. The database is pressing-specific, though, so plenty of
perfectly good rips will simply have nothing to match against.
*/

mod matcher;

pub use matcher::{
	ArStatus,
	ArTrackMatch,
	match_responses,
	match_track,
};
pub(crate) use matcher::disc_accurate;

use crate::{
	OutputDir,
	VeriRipError,
};
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	fmt,
	io::Read,
	sync::OnceLock,
	time::Duration,
};
use ureq::{
	Agent,
	AgentBuilder,
};



/// # Connection Agent.
static AGENT: OnceLock<Agent> = OnceLock::new();

/// # Response Header Length.
const HEADER_LEN: usize = 13;

/// # Response Track Length.
const TRACK_LEN: usize = 5;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
/// # AccurateRip IDs.
///
/// The audio track count, the two offset sums, and the CDDB ID. Together
/// these locate a disc in the database.
pub struct ArIds {
	/// # Audio Tracks.
	tracks: u8,

	/// # ID One.
	id1: u32,

	/// # ID Two.
	id2: u32,

	/// # CDDB.
	cddb: u32,
}

impl fmt::Display for ArIds {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{:03}-{:08x}-{:08x}-{:08x}",
			self.tracks,
			self.id1,
			self.id2,
			self.cddb,
		)
	}
}

impl ArIds {
	#[must_use]
	/// # New.
	pub const fn new(tracks: u8, id1: u32, id2: u32, cddb: u32) -> Self {
		Self { tracks, id1, id2, cddb }
	}

	#[must_use]
	/// # Audio Tracks.
	pub const fn tracks(&self) -> u8 { self.tracks }

	#[must_use]
	/// # ID One.
	pub const fn id1(&self) -> u32 { self.id1 }

	#[must_use]
	/// # ID Two.
	pub const fn id2(&self) -> u32 { self.id2 }

	#[must_use]
	/// # CDDB ID.
	pub const fn cddb(&self) -> u32 { self.cddb }

	#[must_use]
	/// # Lookup URL.
	///
	/// The response lives three directories deep, named for the last three
	/// hex digits of the first ID (in reverse order).
	pub fn url(&self) -> String {
		let hex = format!("{:08x}", self.id1);
		let b = hex.as_bytes();
		format!(
			"http://www.accuraterip.com/accuraterip/{}/{}/{}/{}",
			char::from(b[7]),
			char::from(b[6]),
			char::from(b[5]),
			self.file_name(),
		)
	}

	#[must_use]
	/// # File Name.
	///
	/// The response's file name, also used for the local cache.
	pub fn file_name(&self) -> String { format!("dBAR-{self}.bin") }
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
/// # AccurateRip Response Entry.
///
/// One track's worth of a database response.
pub struct ArResponseTrack {
	/// # Confidence.
	pub confidence: u8,

	/// # Checksum.
	pub checksum: u32,
}



#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
/// # AccurateRip Response.
///
/// A single pressing's worth of checksums. A disc lookup can return any
/// number of these.
pub struct ArResponse {
	/// # IDs.
	ids: ArIds,

	/// # Track Entries.
	entries: Vec<ArResponseTrack>,
}

impl ArResponse {
	#[must_use]
	/// # New.
	///
	/// The track count is taken from `ids`.
	pub const fn new(ids: ArIds, entries: Vec<ArResponseTrack>) -> Self {
		Self { ids, entries }
	}

	#[must_use]
	/// # IDs.
	pub const fn ids(&self) -> ArIds { self.ids }

	#[must_use]
	/// # Declared Track Count.
	pub const fn tracks(&self) -> u8 { self.ids.tracks }

	#[must_use]
	/// # Entries.
	pub fn entries(&self) -> &[ArResponseTrack] { &self.entries }

	#[must_use]
	/// # Entry.
	///
	/// Return the entry for the audio track at (zero-based) position `idx`.
	pub fn entry(&self, idx: usize) -> Option<ArResponseTrack> {
		self.entries.get(idx).copied()
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # AccurateRip Lookup.
///
/// The outcome of a database lookup. A disc the database has never heard of
/// is an ordinary result, distinct from a failure to ask.
pub enum ArLookup {
	/// # Not in the Database.
	NotFound,

	/// # Network or Parse Failure.
	NetworkError(String),

	/// # Responses.
	Responses(Vec<ArResponse>),
}

impl ArLookup {
	#[must_use]
	/// # Responses.
	///
	/// Return the responses, if any.
	pub fn responses(&self) -> &[ArResponse] {
		if let Self::Responses(r) = self { r.as_slice() }
		else { &[] }
	}

	#[must_use]
	/// # Not Found?
	pub const fn is_not_found(&self) -> bool { matches!(self, Self::NotFound) }

	#[must_use]
	/// # As Error.
	///
	/// Network failures are the only kind of lookup worth complaining about.
	pub fn as_error(&self) -> Option<VeriRipError> {
		if let Self::NetworkError(e) = self {
			Some(VeriRipError::DatabaseUnavailable(e.clone()))
		}
		else { None }
	}
}



/// # Parse Responses.
///
/// A response body is any number of back-to-back records, each a one-byte
/// track count, the three little-endian IDs, then a confidence byte and
/// little-endian checksum for each track.
///
/// ## Errors
///
/// This will return an error if a record is truncated.
pub fn parse_responses(mut raw: &[u8]) -> Result<Vec<ArResponse>, VeriRipError> {
	let mut out = Vec::new();

	while ! raw.is_empty() {
		if raw.len() < HEADER_LEN { return Err(VeriRipError::ArParse); }

		let tracks = raw[0];
		let len = HEADER_LEN + usize::from(tracks) * TRACK_LEN;
		if raw.len() < len { return Err(VeriRipError::ArParse); }

		let ids = ArIds::new(tracks, u32_le(&raw[1..5]), u32_le(&raw[5..9]), u32_le(&raw[9..13]));
		let entries = raw[HEADER_LEN..len].chunks_exact(TRACK_LEN)
			.map(|c| ArResponseTrack {
				confidence: c[0],
				checksum: u32_le(&c[1..]),
			})
			.collect();

		out.push(ArResponse::new(ids, entries));
		raw = &raw[len..];
	}

	Ok(out)
}

/// # Fetch Responses.
///
/// Look up the disc in the AccurateRip database, using (and populating) the
/// local cache if one is provided.
pub fn fetch(ids: &ArIds, cache: Option<&OutputDir>) -> ArLookup {
	let name = ids.file_name();

	// Check the cache first.
	if let Some(res) = cache.and_then(|c| c.cache_read(&name))
		.and_then(|raw| parse_responses(&raw).ok())
		.filter(|res| ! res.is_empty())
	{
		return ArLookup::Responses(res);
	}

	let raw = match download(&ids.url()) {
		Ok(Some(raw)) => raw,
		Ok(None) => return ArLookup::NotFound,
		Err(e) => return ArLookup::NetworkError(e),
	};

	match parse_responses(&raw) {
		Ok(res) if res.is_empty() => ArLookup::NotFound,
		Ok(res) => {
			if let Some(c) = cache { let _res = c.cache_write(&name, &raw); }
			ArLookup::Responses(res)
		},
		Err(e) => ArLookup::NetworkError(e.to_string()),
	}
}



/// # Connection Agent.
///
/// Storing the agent statically saves a little bit of overhead on reuse. Since
/// responses are cached locally, this may not get called at all.
fn agent() -> &'static Agent {
	AGENT.get_or_init(||
		AgentBuilder::new()
			.timeout(Duration::from_secs(15))
			.user_agent(concat!(
				"Mozilla/5.0 (X11; Linux x86_64; rv:",
				env!("CARGO_PKG_VERSION"),
				") Veririp/",
				env!("CARGO_PKG_VERSION"),
			))
			.build()
	)
}

/// # Download.
///
/// Return the body, or `None` if the server says it doesn't exist.
fn download(url: &str) -> Result<Option<Vec<u8>>, String> {
	match agent().get(url).call() {
		Ok(res) => {
			let mut out = Vec::new();
			res.into_reader().read_to_end(&mut out).map_err(|e| e.to_string())?;
			if out.is_empty() { Ok(None) }
			else { Ok(Some(out)) }
		},
		Err(ureq::Error::Status(404, _)) => Ok(None),
		Err(e) => Err(e.to_string()),
	}
}

/// # Little-Endian u32.
fn u32_le(src: &[u8]) -> u32 {
	let mut buf = [0_u8; 4];
	buf.copy_from_slice(&src[..4]);
	u32::from_le_bytes(buf)
}



#[cfg(test)]
mod test {
	use super::*;

	/// # Build a Raw Response Record.
	pub(super) fn record(ids: ArIds, entries: &[(u8, u32)]) -> Vec<u8> {
		let mut out = vec![ids.tracks()];
		out.extend_from_slice(&ids.id1().to_le_bytes());
		out.extend_from_slice(&ids.id2().to_le_bytes());
		out.extend_from_slice(&ids.cddb().to_le_bytes());
		for (c, v) in entries {
			out.push(*c);
			out.extend_from_slice(&v.to_le_bytes());
		}
		out
	}

	const IDS: ArIds = ArIds::new(2, 0x0000_e1d3, 0x0002_5fe7, 0x1002_1502);

	#[test]
	fn t_url() {
		let ids = ArIds::new(12, 0x0013_bd5a, 0x00b8_d489, 0xc60a_f50d);
		assert_eq!(ids.to_string(), "012-0013bd5a-00b8d489-c60af50d");
		assert_eq!(
			ids.url(),
			"http://www.accuraterip.com/accuraterip/a/5/d/dBAR-012-0013bd5a-00b8d489-c60af50d.bin",
		);
	}

	#[test]
	fn t_parse() {
		let mut raw = record(IDS, &[(5, 0xDEAD_BEEF), (3, 0x0102_0304)]);
		raw.extend(record(IDS, &[(1, 1), (0, 2)]));
		assert_eq!(raw.len(), (HEADER_LEN + 2 * TRACK_LEN) * 2);

		let res = parse_responses(&raw).expect("Parse failed.");
		assert_eq!(res.len(), 2, "Expected two responses.");
		assert_eq!(res[0].ids(), IDS);
		assert_eq!(
			res[0].entry(0),
			Some(ArResponseTrack { confidence: 5, checksum: 0xDEAD_BEEF }),
		);
		assert_eq!(
			res[1].entry(1),
			Some(ArResponseTrack { confidence: 0, checksum: 2 }),
		);
		assert_eq!(res[1].entry(2), None);

		// Empty is fine, if useless.
		assert_eq!(parse_responses(&[]), Ok(Vec::new()));

		// Truncated data is not.
		assert_eq!(parse_responses(&raw[..raw.len() - 1]), Err(VeriRipError::ArParse));
		assert_eq!(parse_responses(&raw[..5]), Err(VeriRipError::ArParse));
	}

	#[test]
	fn t_lookup() {
		let lookup = ArLookup::NotFound;
		assert!(lookup.is_not_found());
		assert!(lookup.responses().is_empty());
		assert!(lookup.as_error().is_none(), "Not found isn't an error.");

		let lookup = ArLookup::NetworkError("timeout".to_owned());
		assert_eq!(
			lookup.as_error(),
			Some(VeriRipError::DatabaseUnavailable("timeout".to_owned())),
		);
	}

	#[test]
	fn t_fetch_cached() {
		let tmp = tempfile::tempdir().expect("Tempdir failed.");
		let dir = OutputDir::new(tmp.path()).expect("OutputDir failed.");

		let raw = record(IDS, &[(7, 10), (7, 20)]);
		dir.cache_write(&IDS.file_name(), &raw).expect("Cache write failed.");

		// This should never touch the network.
		let lookup = fetch(&IDS, Some(&dir));
		assert_eq!(lookup.responses().len(), 1, "Cached response was not used.");
		assert_eq!(lookup.responses()[0].entry(1).map(|e| e.checksum), Some(20));
	}
}
