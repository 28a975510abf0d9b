/*!
# Veririp: Read Offset
*/

use crate::{
	VeriRipError,
	SAMPLES_PER_SECTOR,
};
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	fmt,
	str::FromStr,
};



/// # Min Offset.
const MIN_OFFSET: i16 = -5880;

/// # Max Offset.
const MAX_OFFSET: i16 = 5880;



#[derive(Debug, Clone, Copy, Default, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
/// # Read Offset.
///
/// This holds the drive's AccurateRip read offset in samples. It is passed
/// through to the reader, which shifts its reads accordingly.
///
/// Values are restricted to `-5880..=5880`, i.e. ten sectors either way.
pub struct ReadOffset(i16);

impl fmt::Display for ReadOffset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if 0 < self.0 { write!(f, "+{}", self.0) }
		else { write!(f, "{}", self.0) }
	}
}

impl From<ReadOffset> for i16 {
	#[inline]
	fn from(src: ReadOffset) -> Self { src.0 }
}

impl FromStr for ReadOffset {
	type Err = VeriRipError;
	fn from_str(src: &str) -> Result<Self, Self::Err> {
		let src = src.trim();
		if src.is_empty() { Ok(Self(0)) }
		else {
			src.strip_prefix('+').unwrap_or(src)
				.parse::<i16>()
				.map_err(|_| VeriRipError::ReadOffset)
				.and_then(Self::try_from)
		}
	}
}

impl TryFrom<i16> for ReadOffset {
	type Error = VeriRipError;
	fn try_from(src: i16) -> Result<Self, Self::Error> {
		if (MIN_OFFSET..=MAX_OFFSET).contains(&src) { Ok(Self(src)) }
		else { Err(VeriRipError::ReadOffset) }
	}
}

impl ReadOffset {
	#[must_use]
	/// # Is Negative?
	pub const fn is_negative(self) -> bool { self.0 < 0 }

	#[must_use]
	/// # Samples.
	pub const fn samples(self) -> i16 { self.0 }

	#[must_use]
	/// # Samples (Absolute).
	pub const fn samples_abs(self) -> u16 { self.0.unsigned_abs() }

	#[must_use]
	/// # Sectors (Absolute).
	///
	/// Return the number of whole sectors needed to contain the offset. This
	/// is how far past either end of the disc a drive would have to read.
	pub const fn sectors_abs(self) -> u16 {
		self.samples_abs().div_ceil(SAMPLES_PER_SECTOR)
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_parse() {
		for (raw, expected) in [
			("", 0_i16),
			("0", 0),
			("6", 6),
			("+6", 6),
			("-1164", -1164),
			(" 667 ", 667),
			("5880", 5880),
			("-5880", -5880),
		] {
			let offset = ReadOffset::from_str(raw).expect("Offset failed.");
			assert_eq!(offset.samples(), expected, "Parsed {raw:?} wrong.");
		}

		for raw in ["5881", "-5881", "six", "1.5"] {
			assert!(ReadOffset::from_str(raw).is_err(), "Offset {raw:?} should fail.");
		}
	}

	#[test]
	fn t_sectors() {
		for (samples, sectors) in [
			(0_i16, 0_u16),
			(1, 1),
			(588, 1),
			(589, 2),
			(-588, 1),
			(-1164, 2),
			(5880, 10),
		] {
			let offset = ReadOffset::try_from(samples).expect("Offset failed.");
			assert_eq!(offset.sectors_abs(), sectors, "Sectors wrong for {samples}.");
		}
	}

	#[test]
	fn t_display() {
		assert_eq!(ReadOffset::try_from(6).unwrap().to_string(), "+6");
		assert_eq!(ReadOffset::try_from(-12).unwrap().to_string(), "-12");
		assert_eq!(ReadOffset::default().to_string(), "0");
	}
}
