/*!
# Veririp: AccurateRip Matching
*/

use crate::{
	ArChecksums,
	ArIds,
	ArResponse,
	ArResponseTrack,
};
use serde::{
	Deserialize,
	Serialize,
};
use std::fmt;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
/// # Match Status.
pub enum ArStatus {
	/// # Matched a Database Checksum.
	Accurate,

	/// # Responses Exist, but None Matched.
	Inaccurate,

	/// # Nothing to Compare Against.
	Unverifiable,
}

impl fmt::Display for ArStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Accurate => "accurate",
			Self::Inaccurate => "inaccurate",
			Self::Unverifiable => "unverifiable",
		})
	}
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
/// # Track Match.
///
/// The result of comparing one track's local checksums against the database
/// responses.
pub struct ArTrackMatch {
	/// # Status.
	status: ArStatus,

	/// # Local Checksums.
	local: ArChecksums,

	/// # Database Checksum.
	///
	/// For accurate tracks this is the matching checksum; otherwise it is
	/// the checksum from the most confident response.
	database: Option<u32>,

	/// # Confidence of the Match.
	confidence: Option<u8>,

	/// # Highest Confidence Among All Responses.
	max_confidence: Option<u8>,
}

impl ArTrackMatch {
	#[must_use]
	/// # Status.
	pub const fn status(&self) -> ArStatus { self.status }

	#[must_use]
	/// # Accurate?
	pub const fn is_accurate(&self) -> bool { matches!(self.status, ArStatus::Accurate) }

	#[must_use]
	/// # Local Checksums.
	pub const fn local(&self) -> ArChecksums { self.local }

	#[must_use]
	/// # Database Checksum.
	pub const fn database(&self) -> Option<u32> { self.database }

	#[must_use]
	/// # Confidence.
	pub const fn confidence(&self) -> Option<u8> { self.confidence }

	#[must_use]
	/// # Max Confidence.
	pub const fn max_confidence(&self) -> Option<u8> { self.max_confidence }
}



/// # Match Track.
///
/// Compare the local checksums for the audio track at (zero-based) position
/// `idx` against each applicable response. Responses for a different track
/// count or ID pair cannot match, and if none are applicable the track is
/// unverifiable.
///
/// If several responses match, the most confident one wins. The max
/// confidence, on the other hand, covers every response with an entry at
/// `idx`, and when nothing matches, its checksum is reported as the database
/// checksum even if its confidence is zero.
pub fn match_track(ids: &ArIds, idx: usize, local: ArChecksums, responses: &[ArResponse])
-> ArTrackMatch {
	let mut out = ArTrackMatch {
		status: ArStatus::Unverifiable,
		local,
		database: None,
		confidence: None,
		max_confidence: None,
	};

	let mut max: Option<ArResponseTrack> = None;
	for entry in responses.iter().filter_map(|r| r.entry(idx)) {
		if max.map_or(true, |m| m.confidence < entry.confidence) { max.replace(entry); }
	}
	let Some(max) = max else { return out; };
	out.max_confidence.replace(max.confidence);

	let mut best: Option<ArResponseTrack> = None;
	let mut any = false;
	for entry in responses.iter()
		.filter(|r| applicable(ids, r))
		.filter_map(|r| r.entry(idx))
	{
		any = true;
		if local.matches(entry.checksum) && best.map_or(true, |b| b.confidence < entry.confidence) {
			best.replace(entry);
		}
	}

	// No applicable responses.
	if ! any { return out; }

	if let Some(best) = best {
		out.status = ArStatus::Accurate;
		out.database.replace(best.checksum);
		out.confidence.replace(best.confidence);
	}
	else {
		out.status = ArStatus::Inaccurate;
		out.database.replace(max.checksum);
	}

	out
}

/// # Match Responses.
///
/// Run [`match_track`] for each set of local checksums, in audio track order.
pub fn match_responses(ids: &ArIds, local: &[ArChecksums], responses: &[ArResponse])
-> Vec<ArTrackMatch> {
	local.iter()
		.enumerate()
		.map(|(idx, sums)| match_track(ids, idx, *sums, responses))
		.collect()
}

/// # Disc Accurate?
///
/// Returns `true` if there is at least one match and they are all accurate.
pub(crate) fn disc_accurate(matches: &[ArTrackMatch]) -> bool {
	! matches.is_empty() && matches.iter().all(ArTrackMatch::is_accurate)
}

/// # Applicable Response?
fn applicable(ids: &ArIds, res: &ArResponse) -> bool {
	let other = res.ids();
	other.tracks() == ids.tracks() &&
	other.id1() == ids.id1() &&
	other.id2() == ids.id2()
}



#[cfg(test)]
mod test {
	use super::*;

	const IDS: ArIds = ArIds::new(2, 0x0000_e1d3, 0x0002_5fe7, 0x1002_1502);

	fn response(ids: ArIds, entries: &[(u8, u32)]) -> ArResponse {
		ArResponse::new(
			ids,
			entries.iter()
				.map(|(confidence, checksum)| ArResponseTrack {
					confidence: *confidence,
					checksum: *checksum,
				})
				.collect(),
		)
	}

	#[test]
	fn t_match() {
		let local = [
			ArChecksums { v1: 0xAAAA, v2: 0xBBBB },
			ArChecksums { v1: 0xCCCC, v2: 0xDDDD },
		];
		let responses = [
			response(IDS, &[(12, 0xAAAA), (12, 0x1234)]),
			response(IDS, &[(30, 0x9999), (3, 0xDDDD)]),
		];

		let res = match_responses(&IDS, &local, &responses);
		assert_eq!(res.len(), 2);

		// Track one matched v1 in the first response.
		assert_eq!(res[0].status(), ArStatus::Accurate);
		assert_eq!(res[0].database(), Some(0xAAAA));
		assert_eq!(res[0].confidence(), Some(12));
		assert_eq!(res[0].max_confidence(), Some(30), "Max confidence is independent.");

		// Track two matched v2 in the second.
		assert_eq!(res[1].status(), ArStatus::Accurate);
		assert_eq!(res[1].database(), Some(0xDDDD));
		assert_eq!(res[1].confidence(), Some(3));
		assert_eq!(res[1].max_confidence(), Some(12));

		assert!(disc_accurate(&res), "Both tracks matched.");
	}

	#[test]
	fn t_inaccurate() {
		let local = ArChecksums { v1: 1, v2: 2 };
		let responses = [
			response(IDS, &[(4, 0x1111), (1, 0)]),
			response(IDS, &[(9, 0x2222), (1, 0)]),
		];

		let res = match_track(&IDS, 0, local, &responses);
		assert_eq!(res.status(), ArStatus::Inaccurate);
		assert_eq!(res.database(), Some(0x2222), "Should report the most confident CRC.");
		assert_eq!(res.confidence(), None);
		assert_eq!(res.max_confidence(), Some(9));
		assert!(! disc_accurate(&[res]));

		// Zero confidence still reports the CRC.
		let responses = [response(IDS, &[(0, 0x1111), (0, 0)])];
		let res = match_track(&IDS, 0, local, &responses);
		assert_eq!(res.status(), ArStatus::Inaccurate);
		assert_eq!(res.database(), Some(0x1111), "Zero-confidence CRCs should be reported.");
		assert_eq!(res.max_confidence(), Some(0));

		let responses = [response(IDS, &[(0, 0xABCD), (0, 0)])];
		let res = match_track(&IDS, 0, local, &responses);
		assert_eq!(res.database(), Some(0xABCD));

		// The max covers other layouts too.
		let other = ArIds::new(2, IDS.id1() + 1, IDS.id2(), IDS.cddb());
		let responses = [
			response(IDS, &[(2, 0x1111), (0, 0)]),
			response(other, &[(40, 0x4444), (0, 0)]),
		];
		let res = match_track(&IDS, 0, local, &responses);
		assert_eq!(res.status(), ArStatus::Inaccurate);
		assert_eq!(res.max_confidence(), Some(40), "Max confidence should span all responses.");
		assert_eq!(res.database(), Some(0x4444));
	}

	#[test]
	fn t_match_third() {
		let ids = ArIds::new(3, 0x0001_2345, 0x0006_789a, 0x2003_0103);
		let local = [
			ArChecksums { v1: 0x0101, v2: 0x0202 },
			ArChecksums { v1: 0x0303, v2: 0x0404 },
			ArChecksums { v1: 0x0505, v2: 0x0606 },
		];
		let responses = [
			response(ids, &[(7, 0xF001), (7, 0xF002), (7, 0x0606)]),
			response(ids, &[(2, 0xE001), (2, 0xE002), (2, 0xE003)]),
		];

		let res = match_responses(&ids, &local, &responses);
		assert_eq!(res.len(), 3);
		for (k, r) in res.iter().take(2).enumerate() {
			assert_eq!(r.status(), ArStatus::Inaccurate, "Track #{} should not match.", k + 1);
			assert_eq!(r.confidence(), None);
			assert_eq!(r.max_confidence(), Some(7));
		}
		assert_eq!(res[0].database(), Some(0xF001));
		assert_eq!(res[1].database(), Some(0xF002));

		// Only the third track lines up, against its own entry.
		assert_eq!(res[2].status(), ArStatus::Accurate);
		assert_eq!(res[2].database(), Some(0x0606));
		assert_eq!(res[2].confidence(), Some(7));
		assert!(! disc_accurate(&res), "Two tracks failed.");
	}

	#[test]
	fn t_unverifiable() {
		let local = ArChecksums { v1: 1, v2: 2 };
		let res = match_track(&IDS, 0, local, &[]);
		assert_eq!(res.status(), ArStatus::Unverifiable, "No responses is not a mismatch.");
		assert_eq!(res.max_confidence(), None);

		// Responses for a different disc layout are ignored.
		let other = ArIds::new(3, IDS.id1(), IDS.id2(), IDS.cddb());
		let responses = [response(other, &[(5, 1), (5, 1), (5, 1)])];
		let res = match_track(&IDS, 0, local, &responses);
		assert_eq!(res.status(), ArStatus::Unverifiable);
		assert_eq!(res.database(), None, "Unverifiable tracks have no database CRC.");

		// As are out-of-range tracks.
		let responses = [response(IDS, &[(5, 1), (5, 1)])];
		let res = match_track(&IDS, 5, local, &responses);
		assert_eq!(res.status(), ArStatus::Unverifiable);

		assert!(! disc_accurate(&[]), "Nothing is not accurate.");
	}
}
