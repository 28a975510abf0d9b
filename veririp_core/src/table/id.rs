/*!
# Veririp: Disc IDs
*/

use base64::{
	Engine,
	engine::general_purpose::STANDARD,
};
use crate::{
	ArIds,
	CD_LEADIN,
	SECTORS_PER_SECOND,
	SESSION_GAP,
	Table,
	VeriRipError,
};
use sha1::{
	Digest,
	Sha1,
};
use std::fmt::Write;



impl Table {
	#[allow(clippy::integer_division)]
	/// # CDDB (FreeDB) ID.
	///
	/// This is the old-school 32-bit disc ID, built from the digit sums of
	/// each track's start (in seconds), the disc length, and the track count.
	/// Data tracks count too.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete.
	pub fn cddb_id(&self) -> Result<u32, VeriRipError> {
		if ! self.has_toc() { return Err(VeriRipError::NoToc); }

		let mut n = 0_u32;
		for t in &self.tracks {
			let seconds = (self.track_start(t.number())? + CD_LEADIN) / SECTORS_PER_SECOND;
			n += digit_sum(seconds);
		}

		let leadout = self.leadout.ok_or(VeriRipError::NoToc)?;
		let t = (leadout / SECTORS_PER_SECOND)
			.saturating_sub(self.track_start(1)? / SECTORS_PER_SECOND);
		let len = u32::try_from(self.tracks.len()).map_err(|_| VeriRipError::RipOverflow)?;

		Ok(((n % 255) << 24) | (t << 8) | len)
	}

	/// # MusicBrainz ID.
	///
	/// This is a base64-encoded SHA-1 hash of the first and last audio track
	/// numbers, the audio leadout, and the audio track offsets (padded to 99),
	/// all in uppercase hex. The base64 uses `._-` in place of `+/=`.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or has no audio.
	pub fn musicbrainz_id(&self) -> Result<String, VeriRipError> {
		let values = self.musicbrainz_values()?;

		let mut src = String::with_capacity(804);
		let _res = write!(src, "{:02X}{:02X}", values[0], values[1]);
		for v in values.iter().skip(2).copied().chain(std::iter::repeat(0)).take(100) {
			let _res = write!(src, "{v:08X}");
		}

		let mut hasher = Sha1::new();
		hasher.update(src.as_bytes());
		let hash = hasher.finalize();

		Ok(
			STANDARD.encode(hash)
				.chars()
				.map(|c| match c {
					'+' => '.',
					'/' => '_',
					'=' => '-',
					c => c,
				})
				.collect()
		)
	}

	/// # MusicBrainz Submission URL.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or has no audio.
	pub fn musicbrainz_submit_url(&self) -> Result<String, VeriRipError> {
		let id = self.musicbrainz_id()?;
		let values = self.musicbrainz_values()?;
		let toc = values.iter()
			.map(u32::to_string)
			.collect::<Vec<_>>()
			.join("+");

		Ok(format!(
			"http://mm.musicbrainz.org/cdtoc/attach?id={id}&toc={toc}&tracks={}",
			self.audio_tracks(),
		))
	}

	/// # AccurateRip IDs.
	///
	/// AccurateRip identifies discs by two sums of the audio track offsets
	/// (the second weighted by track position), plus the CDDB ID and audio
	/// track count.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or has no audio.
	pub fn accuraterip_ids(&self) -> Result<ArIds, VeriRipError> {
		let cddb = self.cddb_id()?;
		let leadout = u64::from(self.leadout.ok_or(VeriRipError::NoToc)?);

		let mut id1 = 0_u64;
		let mut id2 = 0_u64;
		let mut count = 0_u64;
		for n in self.audio_track_numbers() {
			count += 1;
			let start = u64::from(self.track_start(n)?);
			id1 += start;
			id2 += start.max(1) * count;
		}
		if count == 0 { return Err(VeriRipError::NoTrack(1)); }

		id1 += leadout;
		id2 += leadout * (count + 1);

		#[allow(clippy::cast_possible_truncation)]
		Ok(ArIds::new(self.audio_tracks(), id1 as u32, id2 as u32, cddb))
	}

	/// # AccurateRip URL.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or has no audio.
	pub fn accuraterip_url(&self) -> Result<String, VeriRipError> {
		self.accuraterip_ids().map(|ids| ids.url())
	}

	/// # MusicBrainz Values.
	///
	/// The first and last audio track numbers, the audio leadout, and each
	/// audio track's start. Everything except the track numbers includes the
	/// lead-in.
	fn musicbrainz_values(&self) -> Result<Vec<u32>, VeriRipError> {
		if ! self.has_toc() { return Err(VeriRipError::NoToc); }

		let first = self.audio_track_numbers().next().ok_or(VeriRipError::NoTrack(1))?;
		let last = self.audio_track_numbers().last().ok_or(VeriRipError::NoTrack(1))?;

		// A closing data track takes its session gap with it.
		let leadout = match self.tracks.last() {
			Some(t) if ! t.is_audio() => self.track_start(t.number())?
				.checked_sub(SESSION_GAP)
				.ok_or(VeriRipError::TrackOffset(t.number()))?,
			_ => self.leadout.ok_or(VeriRipError::NoToc)?,
		};

		let mut out = Vec::with_capacity(usize::from(self.audio_tracks()) + 3);
		out.push(u32::from(first));
		out.push(u32::from(last));
		out.push(leadout + CD_LEADIN);
		for n in self.audio_track_numbers() {
			out.push(self.track_start(n)? + CD_LEADIN);
		}

		Ok(out)
	}
}



#[allow(clippy::integer_division)]
/// # Digit Sum.
const fn digit_sum(mut n: u32) -> u32 {
	let mut out = 0;
	while 0 < n {
		out += n % 10;
		n /= 10;
	}
	out
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::table::test::{
		ladyhawke,
		simple,
	};

	#[test]
	fn t_digit_sum() {
		assert_eq!(digit_sum(0), 0);
		assert_eq!(digit_sum(2), 2);
		assert_eq!(digit_sum(209), 11);
		assert_eq!(digit_sum(2807), 17);
	}

	#[test]
	fn t_ladyhawke() {
		let table = ladyhawke();
		assert_eq!(table.cddb_id(), Ok(0xc60a_f50d), "CDDB mismatch.");
		assert_eq!(
			table.musicbrainz_id().as_deref(),
			Ok("KnpGsLhvH.lPrNc1PBL21lb9Bg4-"),
			"MusicBrainz mismatch.",
		);

		let ar = table.accuraterip_ids().expect("AccurateRip IDs failed.");
		assert_eq!(ar.id1(), 0x0013_bd5a, "AccurateRip ID1 mismatch.");
		assert_eq!(ar.id2(), 0x00b8_d489, "AccurateRip ID2 mismatch.");
		assert_eq!(ar.tracks(), 12);
		assert_eq!(
			table.accuraterip_url().as_deref(),
			Ok("http://www.accuraterip.com/accuraterip/a/5/d/dBAR-012-0013bd5a-00b8d489-c60af50d.bin"),
		);
	}

	#[test]
	fn t_audio_only() {
		let table = simple(&[0, 11413, 25024, 45713], 55220);
		assert_eq!(table.cddb_id(), Ok(0x1f02_e004));
		assert_eq!(table.musicbrainz_id().as_deref(), Ok("nljDXdC8B_pDwbdY1vZJvdrAZI4-"));
		let ar = table.accuraterip_ids().expect("AccurateRip IDs failed.");
		assert_eq!((ar.id1(), ar.id2()), (0x0002_189a, 0x0008_7f33));

		let table = simple(&[0, 17811], 40000);
		assert_eq!(table.cddb_id(), Ok(0x1002_1502));
		assert_eq!(table.musicbrainz_id().as_deref(), Ok("xSOyolV3R8QE3dG9OyW0qUA6nq8-"));
		let ar = table.accuraterip_ids().expect("AccurateRip IDs failed.");
		assert_eq!((ar.id1(), ar.id2()), (0x0000_e1d3, 0x0002_5fe7));
	}

	#[test]
	fn t_musicbrainz_shape() {
		let id = simple(&[0], 3000).musicbrainz_id().expect("MusicBrainz ID failed.");
		assert_eq!(id.len(), 28, "MusicBrainz IDs are 28 characters.");
		assert!(id.ends_with('-'), "The padding should be swapped.");
		assert!(! id.contains(['+', '/', '=']), "Unsafe characters remain.");
	}

	#[test]
	fn t_musicbrainz_submit() {
		let table = simple(&[0, 17811], 40000);
		assert_eq!(
			table.musicbrainz_submit_url().as_deref(),
			Ok("http://mm.musicbrainz.org/cdtoc/attach?id=xSOyolV3R8QE3dG9OyW0qUA6nq8-&toc=1+2+40150+150+17961&tracks=2"),
		);
	}

	#[test]
	fn t_incomplete() {
		let table = Table::new();
		assert_eq!(table.cddb_id(), Err(VeriRipError::NoToc));
		assert_eq!(table.musicbrainz_id(), Err(VeriRipError::NoToc));
		assert!(table.accuraterip_ids().is_err());
	}
}
