/*!
# Veririp: Table Parsing
*/

use cdtoc::{
	Toc,
	TocKind,
};
use crate::{
	CD_LEADIN,
	Index,
	Table,
	Track,
	VeriRipError,
};



impl Table {
	/// # From CDTOC.
	///
	/// Build a table from a CDTOC string, the format used by e.g. the
	/// CUETools database and Windows Media Player.
	///
	/// Audio discs whose first track starts late get an index 0 at the very
	/// beginning so the hidden audio can be ripped. A trailing (CD-Extra) data
	/// track is placed in the second session.
	///
	/// ## Errors
	///
	/// This will return an error if the string cannot be parsed.
	pub fn from_cdtoc(src: &str) -> Result<Self, VeriRipError> {
		let toc = Toc::from_cdtoc(src)?;
		let mut out = Self::new();

		// Leading data.
		if matches!(toc.kind(), TocKind::DataFirst) {
			let start = toc.data_sector_normalized().ok_or(VeriRipError::NoToc)?;
			out.push_offset(false, 1, start, None)?;
		}

		// Audio.
		for (k, t) in toc.audio_tracks().enumerate() {
			let start = t.sector_range_normalized().start;
			let pregap =
				if k == 0 && out.tracks.is_empty() && 0 < start { Some(0) }
				else { None };
			out.push_offset(true, 1, start, pregap)?;
		}

		// Trailing data.
		if matches!(toc.kind(), TocKind::CDExtra) {
			let start = toc.data_sector_normalized().ok_or(VeriRipError::NoToc)?;
			out.push_offset(false, 2, start, None)?;
		}

		out.set_leadout(toc.leadout_normalized());
		Ok(out)
	}

	/// # To CDTOC.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or has a layout
	/// the CDTOC format cannot represent.
	pub fn to_cdtoc(&self) -> Result<String, VeriRipError> {
		if ! self.has_toc() { return Err(VeriRipError::NoToc); }

		let mut audio = Vec::with_capacity(self.tracks.len());
		let mut data = None;
		for t in &self.tracks {
			let start = self.track_start(t.number())? + CD_LEADIN;
			if t.is_audio() { audio.push(start); }
			else if data.replace(start).is_some() {
				return Err(VeriRipError::TocParse("multiple data tracks"));
			}
		}

		let leadout = self.leadout.ok_or(VeriRipError::NoToc)? + CD_LEADIN;
		let toc = Toc::from_parts(audio, data, leadout)?;
		Ok(toc.to_string())
	}

	/// # From `cdparanoia -Q`.
	///
	/// Build a table from the track listing printed by `cdparanoia -Q`, which
	/// looks something like:
	///
	/// ```text
	/// track        length               begin        copy pre ch
	/// ===========================================================
	///   1.    13209 [02:56.09]        0 [00:00.00]    no   no  2
	///   2.    16267 [03:36.67]    13209 [02:56.09]    no   no  2
	/// TOTAL   29476 [06:33.01]    (audio only)
	/// ```
	///
	/// Only audio tracks are listed, so they must be numbered consecutively
	/// from one.
	///
	/// ## Errors
	///
	/// This will return an error if no tracks are found or the numbering is
	/// off.
	pub fn from_cdparanoia_query(src: &str) -> Result<Self, VeriRipError> {
		let mut out = Self::new();
		let mut leadout = 0;

		for line in src.lines() {
			let mut parts = line.split_whitespace();
			let Some(num) = parts.next()
				.and_then(|p| p.strip_suffix('.'))
				.and_then(|p| p.parse::<u8>().ok())
			else { continue; };

			let length = parts.next()
				.and_then(|p| p.parse::<u32>().ok())
				.ok_or(VeriRipError::TocParse("track length"))?;
			let start = parts.nth(1)
				.and_then(|p| p.parse::<u32>().ok())
				.ok_or(VeriRipError::TocParse("track start"))?;

			if usize::from(num) != out.tracks.len() + 1 {
				return Err(VeriRipError::TocParse("track numbering"));
			}

			let pregap =
				if num == 1 && 0 < start { Some(0) }
				else { None };
			out.push_offset(true, 1, start, pregap)?;
			leadout = start.checked_add(length).ok_or(VeriRipError::RipOverflow)?;
		}

		if out.tracks.is_empty() { return Err(VeriRipError::TocParse("no tracks")); }
		out.set_leadout(leadout);
		Ok(out)
	}

	/// # Push Offset.
	///
	/// Append a track with an index 1 (and optional index 0).
	fn push_offset(&mut self, audio: bool, session: u8, start: u32, pregap: Option<u32>)
	-> Result<(), VeriRipError> {
		let number = u8::try_from(self.tracks.len() + 1)
			.map_err(|_| VeriRipError::RipOverflow)?;
		let mut track = Track::new(number, audio).with_session(session);
		if let Some(pregap) = pregap {
			track.set_index(Index::new(0, Some(pregap)))?;
		}
		track.set_index(Index::new(1, Some(start)))?;
		self.push_track(track)
	}
}



#[cfg(test)]
mod test {
	use super::*;

	/// # Query Output.
	const QUERY: &str = "cdparanoia III release 10.2 (September 11, 2008)

Table of contents (audio tracks only):
track        length               begin        copy pre ch
===========================================================
  1.    11413 [02:32.13]        0 [00:00.00]    no   no  2
  2.    13611 [03:01.36]    11413 [02:32.13]    no   no  2
  3.    20689 [04:35.64]    25024 [05:33.49]    no   no  2
  4.     9507 [02:06.57]    45713 [10:09.38]    no   no  2
TOTAL   55220 [12:16.20]    (audio only)
";

	#[test]
	fn t_cdtoc() {
		let table = Table::from_cdtoc("4+96+2D2B+6256+B327+D84A").expect("CDTOC failed.");
		assert_eq!(table.tracks().len(), 4);
		assert_eq!(table.audio_tracks(), 4);
		assert_eq!(table.track_start(1), Ok(0));
		assert_eq!(table.track_start(4), Ok(45713));
		assert_eq!(table.leadout(), Some(55220));
		assert!(table.htoa().is_none(), "There should be no HTOA.");

		assert_eq!(table.cddb_id(), Ok(0x1f02_e004));
		assert_eq!(
			table.to_cdtoc().as_deref(),
			Ok("4+96+2D2B+6256+B327+D84A"),
			"CDTOC round trip failed.",
		);

		assert!(Table::from_cdtoc("nope").is_err());
	}

	#[test]
	fn t_cdtoc_extra() {
		// Ladyhawke has a trailing data track.
		let table = Table::from_cdtoc(
			"C+96+3D47+7C61+C748+10438+13DC8+184E7+1C566+2087B+249ED+277AE+2B6A8+32998+33667"
		).expect("CDTOC failed.");
		assert_eq!(table.tracks().len(), 13);
		assert_eq!(table.audio_tracks(), 12);
		assert_eq!(table.track(13).map(Track::is_audio), Some(false), "Track 13 should be data.");
		assert_eq!(table.track(13).map(Track::session), Some(2));
		assert_eq!(table.track_start(13), Ok(207_106), "Data track start mismatch.");
		assert_eq!(table.leadout(), Some(210_385), "Leadout mismatch.");
		assert_eq!(
			table.to_cdtoc().as_deref(),
			Ok("C+96+3D47+7C61+C748+10438+13DC8+184E7+1C566+2087B+249ED+277AE+2B6A8+32998+33667"),
			"CD-Extra CDTOC round trip failed.",
		);
		assert_eq!(table.cddb_id(), Ok(0xc60a_f50d));
		assert_eq!(
			table.musicbrainz_id().as_deref(),
			Ok("KnpGsLhvH.lPrNc1PBL21lb9Bg4-"),
		);
	}

	#[test]
	fn t_cdparanoia() {
		let table = Table::from_cdparanoia_query(QUERY).expect("Query parse failed.");
		assert_eq!(table.tracks().len(), 4);
		assert_eq!(table.track_start(3), Ok(25024));
		assert_eq!(table.leadout(), Some(55220));
		assert_eq!(table.cddb_id(), Ok(0x1f02_e004), "Should match the CDTOC version.");

		assert!(Table::from_cdparanoia_query("").is_err(), "Empty output should fail.");
		assert_eq!(
			Table::from_cdparanoia_query("  2.    11413 [02:32.13]        0 [00:00.00]    no   no  2\n"),
			Err(VeriRipError::TocParse("track numbering")),
		);
	}

	#[test]
	fn t_cdparanoia_htoa() {
		let raw = "  1.    1000 [00:13.25]      300 [00:04.00]    no   no  2\n";
		let table = Table::from_cdparanoia_query(raw).expect("Query parse failed.");
		assert_eq!(table.htoa(), Some((0, 300)));
		assert_eq!(table.leadout(), Some(1300));
	}
}
