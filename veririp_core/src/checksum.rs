/*!
# Veririp: Checksums

This module contains the streaming CRC32 and AccurateRip checksum engines,
along with a [`ChecksumWriter`] that feeds them both as data is written.
*/

use crate::SAMPLES_PER_SECTOR;
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	fmt,
	io::Write,
};



/// # AccurateRip Edge Samples.
///
/// The first and last tracks ignore (most of) their first/last five sectors.
const AR_EDGE: u32 = SAMPLES_PER_SECTOR as u32 * 5;



#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
/// # Track Position.
///
/// Where a track sits among the disc's audio tracks. This matters to
/// AccurateRip, which excludes the edges of the disc from its checksums.
pub enum TrackPosition {
	/// # The Only Track.
	Only,

	/// # The First Track.
	First,

	/// # Somewhere in the Middle.
	Middle,

	/// # The Last Track.
	Last,
}

impl TrackPosition {
	#[must_use]
	/// # From Position.
	///
	/// Derive the position from a zero-based index and the total number of
	/// audio tracks.
	pub const fn new(idx: usize, total: usize) -> Self {
		if total <= 1 { Self::Only }
		else if idx == 0 { Self::First }
		else if idx + 1 >= total { Self::Last }
		else { Self::Middle }
	}

	#[must_use]
	/// # Is First?
	pub const fn is_first(self) -> bool { matches!(self, Self::Only | Self::First) }

	#[must_use]
	/// # Is Last?
	pub const fn is_last(self) -> bool { matches!(self, Self::Only | Self::Last) }
}



#[derive(Debug, Clone, Default)]
/// # CRC32.
///
/// A standard CRC-32 over raw bytes, fed in arbitrary chunks.
pub struct Crc32(crc32fast::Hasher);

impl Crc32 {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	/// # Update.
	pub fn update(&mut self, buf: &[u8]) { self.0.update(buf); }

	#[must_use]
	/// # Finalize.
	///
	/// Return the checksum for everything written so far.
	pub fn finalize(&self) -> u32 { self.0.clone().finalize() }
}



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
/// # AccurateRip Checksums.
///
/// The v1 and v2 checksums for a track. The database may hold either.
pub struct ArChecksums {
	/// # Version 1.
	pub v1: u32,

	/// # Version 2.
	pub v2: u32,
}

impl fmt::Display for ArChecksums {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:08x}/{:08x}", self.v1, self.v2)
	}
}

impl ArChecksums {
	#[must_use]
	/// # Matches?
	///
	/// Returns `true` if either version equals `crc`.
	pub const fn matches(self, crc: u32) -> bool { self.v1 == crc || self.v2 == crc }
}



#[derive(Debug, Clone)]
/// # AccurateRip Checksum.
///
/// This computes the weighted AccurateRip v1 and v2 checksums for a single
/// track, streamed in arbitrary chunk sizes.
///
/// Each 32-bit little-endian sample is multiplied by its one-based position
/// within the track. The first audio track only counts from the last sample
/// of its fifth sector onward, and the last audio track drops its final five
/// sectors.
pub struct ArChecksum {
	/// # First Included Sample Index.
	start: u32,

	/// # Last Included Sample Index (Exclusive).
	end: u32,

	/// # Current Sample Index.
	idx: u32,

	/// # Leftover Bytes.
	partial: [u8; 4],

	/// # Number of Leftover Bytes.
	partial_len: usize,

	/// # Version 1.
	v1: u32,

	/// # Version 2.
	v2: u32,
}

impl ArChecksum {
	#[must_use]
	/// # New.
	///
	/// The total track length, in sectors, is needed up front to know where
	/// the last track's window ends.
	pub const fn new(position: TrackPosition, sectors: u32) -> Self {
		let total = sectors.saturating_mul(SAMPLES_PER_SECTOR as u32);
		let start =
			if position.is_first() { AR_EDGE - 1 }
			else { 0 };
		let end =
			if position.is_last() { total.saturating_sub(AR_EDGE) }
			else { total };

		Self {
			start,
			end,
			idx: 0,
			partial: [0; 4],
			partial_len: 0,
			v1: 0,
			v2: 0,
		}
	}

	/// # Update.
	pub fn update(&mut self, mut buf: &[u8]) {
		// Finish a sample left over from the last chunk.
		if self.partial_len != 0 {
			let take = (4 - self.partial_len).min(buf.len());
			self.partial[self.partial_len..self.partial_len + take].copy_from_slice(&buf[..take]);
			self.partial_len += take;
			buf = &buf[take..];

			if self.partial_len == 4 {
				self.push(u32::from_le_bytes(self.partial));
				self.partial_len = 0;
			}
			else { return; }
		}

		let chunks = buf.chunks_exact(4);
		let rem = chunks.remainder();
		for chunk in chunks {
			self.push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
		}

		if ! rem.is_empty() {
			self.partial[..rem.len()].copy_from_slice(rem);
			self.partial_len = rem.len();
		}
	}

	#[allow(clippy::cast_possible_truncation)]
	/// # Push Sample.
	fn push(&mut self, sample: u32) {
		if self.start <= self.idx && self.idx < self.end {
			let weight = self.idx + 1;
			self.v1 = self.v1.wrapping_add(weight.wrapping_mul(sample));

			let product = u64::from(weight) * u64::from(sample);
			self.v2 = self.v2
				.wrapping_add((product >> 32) as u32)
				.wrapping_add(product as u32);
		}
		self.idx = self.idx.wrapping_add(1);
	}

	#[must_use]
	/// # Finalize.
	pub const fn finalize(&self) -> ArChecksums {
		ArChecksums { v1: self.v1, v2: self.v2 }
	}
}



#[derive(Debug)]
/// # Checksum Writer.
///
/// This passes data through to an inner writer while tallying its CRC32,
/// AccurateRip checksums, length, and peak sample magnitude.
pub struct ChecksumWriter<W: Write> {
	/// # Inner Writer.
	inner: W,

	/// # CRC32.
	crc: Crc32,

	/// # AccurateRip.
	ar: ArChecksum,

	/// # Bytes Written.
	bytes: u64,

	/// # Peak (Absolute) 16-bit Value.
	peak: u16,

	/// # Odd Byte.
	odd: Option<u8>,
}

impl<W: Write> Write for ChecksumWriter<W> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		let len = self.inner.write(buf)?;
		let buf = &buf[..len];

		self.crc.update(buf);
		self.ar.update(buf);
		self.bytes += len as u64;
		self.update_peak(buf);

		Ok(len)
	}

	fn flush(&mut self) -> std::io::Result<()> { self.inner.flush() }
}

impl<W: Write> ChecksumWriter<W> {
	/// # New.
	pub fn new(inner: W, position: TrackPosition, sectors: u32) -> Self {
		Self {
			inner,
			crc: Crc32::new(),
			ar: ArChecksum::new(position, sectors),
			bytes: 0,
			peak: 0,
			odd: None,
		}
	}

	#[must_use]
	/// # CRC32.
	pub fn crc(&self) -> u32 { self.crc.finalize() }

	#[must_use]
	/// # AccurateRip.
	pub const fn accuraterip(&self) -> ArChecksums { self.ar.finalize() }

	#[must_use]
	/// # Bytes Written.
	pub const fn bytes(&self) -> u64 { self.bytes }

	#[must_use]
	/// # Peak.
	///
	/// Return the largest absolute 16-bit value seen, `0..=32768`.
	pub const fn peak(&self) -> u16 { self.peak }

	/// # Into Inner.
	pub fn into_inner(self) -> W { self.inner }

	/// # Update Peak.
	fn update_peak(&mut self, mut buf: &[u8]) {
		if let Some(lo) = self.odd.take() {
			if let Some((hi, rest)) = buf.split_first() {
				self.peak = self.peak.max(i16::from_le_bytes([lo, *hi]).unsigned_abs());
				buf = rest;
			}
			else {
				self.odd = Some(lo);
				return;
			}
		}

		let chunks = buf.chunks_exact(2);
		if let [lo] = chunks.remainder() { self.odd = Some(*lo); }
		for chunk in chunks {
			self.peak = self.peak.max(i16::from_le_bytes([chunk[0], chunk[1]]).unsigned_abs());
		}
	}
}



#[cfg(test)]
mod test {
	use super::*;

	/// # Sample Data.
	///
	/// Generate some deterministic-but-lumpy PCM.
	fn pcm(sectors: u32) -> Vec<u8> {
		let len = sectors as usize * usize::from(SAMPLES_PER_SECTOR) * 4;
		let mut state = 0x1234_5678_u32;
		(0..len).map(|_| {
			state ^= state << 13;
			state ^= state >> 17;
			state ^= state << 5;
			state.to_le_bytes()[0]
		}).collect()
	}

	/// # Reference Checksum.
	///
	/// This works sector by sector, the way the algorithm is usually
	/// described: skip four sectors, add the fifth sector's last sample once,
	/// then weight everything else.
	fn reference(raw: &[u8], first: bool, last: bool) -> u32 {
		let samples: Vec<u32> = raw.chunks_exact(4)
			.map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
			.collect();
		let per = usize::from(SAMPLES_PER_SECTOR);
		let sectors = samples.len() / per;

		let mut sum = 0_u32;
		for (s, sector) in samples.chunks_exact(per).enumerate() {
			if first && s < 4 { continue; }
			if last && sectors - 5 <= s { continue; }
			if first && s == 4 {
				sum = sum.wrapping_add((per as u32 * 5).wrapping_mul(sector[per - 1]));
				continue;
			}
			for (i, v) in sector.iter().enumerate() {
				let k = (s * per + i + 1) as u32;
				sum = sum.wrapping_add(k.wrapping_mul(*v));
			}
		}
		sum
	}

	#[test]
	fn t_position() {
		assert_eq!(TrackPosition::new(0, 1), TrackPosition::Only);
		assert_eq!(TrackPosition::new(0, 3), TrackPosition::First);
		assert_eq!(TrackPosition::new(1, 3), TrackPosition::Middle);
		assert_eq!(TrackPosition::new(2, 3), TrackPosition::Last);
		assert!(TrackPosition::Only.is_first() && TrackPosition::Only.is_last());
	}

	#[test]
	fn t_crc32() {
		let mut crc = Crc32::new();
		crc.update(b"123456789");
		assert_eq!(crc.finalize(), 0xCBF4_3926, "Standard CRC-32 check value.");

		// Chunking should not matter.
		let mut crc = Crc32::new();
		for c in b"123456789".chunks(2) { crc.update(c); }
		assert_eq!(crc.finalize(), 0xCBF4_3926);
	}

	#[test]
	fn t_accuraterip_edges() {
		let raw = pcm(20);
		for (position, first, last) in [
			(TrackPosition::Middle, false, false),
			(TrackPosition::First, true, false),
			(TrackPosition::Last, false, true),
			(TrackPosition::Only, true, true),
		] {
			let expected = reference(&raw, first, last);

			let mut ar = ArChecksum::new(position, 20);
			ar.update(&raw);
			assert_eq!(ar.finalize().v1, expected, "Wrong v1 for {position:?}.");

			// Awkward chunk sizes should produce the same result.
			let mut ar = ArChecksum::new(position, 20);
			for c in raw.chunks(1_001) { ar.update(c); }
			assert_eq!(ar.finalize().v1, expected, "Chunked v1 differs for {position:?}.");
		}
	}

	#[test]
	fn t_accuraterip_v2() {
		// A single max sample at weight 3: the 64-bit product is split.
		let mut raw = vec![0_u8; usize::from(SAMPLES_PER_SECTOR) * 4];
		raw[8..12].copy_from_slice(&u32::MAX.to_le_bytes());

		let mut ar = ArChecksum::new(TrackPosition::Middle, 1);
		ar.update(&raw);
		let sums = ar.finalize();

		let product = 3_u64 * u64::from(u32::MAX);
		assert_eq!(sums.v1, 3_u32.wrapping_mul(u32::MAX));
		assert_eq!(
			sums.v2,
			((product >> 32) as u32).wrapping_add(product as u32),
			"V2 should add both halves.",
		);
		assert!(sums.matches(sums.v1) && sums.matches(sums.v2));
	}

	#[test]
	fn t_accuraterip_sensitivity() {
		let mut raw = pcm(10);
		let mut ar = ArChecksum::new(TrackPosition::Middle, 10);
		ar.update(&raw);
		let before = ar.finalize();

		// Flip a single sample somewhere in the middle.
		raw[4 * 2000] ^= 1;
		let mut ar = ArChecksum::new(TrackPosition::Middle, 10);
		ar.update(&raw);
		assert_ne!(before, ar.finalize(), "A changed sample should change the checksum.");
	}

	#[test]
	fn t_writer() {
		let raw = pcm(8);
		let mut writer = ChecksumWriter::new(Vec::new(), TrackPosition::Middle, 8);
		for c in raw.chunks(333) { writer.write_all(c).expect("Write failed."); }

		let mut crc = Crc32::new();
		crc.update(&raw);
		let mut ar = ArChecksum::new(TrackPosition::Middle, 8);
		ar.update(&raw);

		assert_eq!(writer.crc(), crc.finalize(), "CRC mismatch.");
		assert_eq!(writer.accuraterip(), ar.finalize(), "AccurateRip mismatch.");
		assert_eq!(writer.bytes(), raw.len() as u64);

		let peak = raw.chunks_exact(2)
			.map(|c| i16::from_le_bytes([c[0], c[1]]).unsigned_abs())
			.max()
			.unwrap_or(0);
		assert_eq!(writer.peak(), peak, "Peak mismatch.");
		assert_eq!(writer.into_inner(), raw, "The data should pass through unchanged.");
	}
}
