/*!
# Veririp: Encode/Decode
*/

use std::io::{
	Read,
	Write,
};



/// # Zstd Decode.
///
/// Return a decompressed copy of `raw`, or `None` if the operation fails.
pub(crate) fn zstd_decode(raw: &[u8]) -> Option<Vec<u8>> {
	let mut out = Vec::with_capacity(raw.len() * 4);
	let mut decoder = zstd::stream::Decoder::new(raw).ok()?;
	decoder.read_to_end(&mut out).ok()?;

	if out.is_empty() { None }
	else { Some(out) }
}

/// # Zstd Encode.
///
/// Return a copy of `raw` compressed with default-level zstd, or `None` if
/// there is any sort of problem.
///
/// The rip state is small, but it is rewritten after every track, and track
/// results for long discs add up.
pub(crate) fn zstd_encode(raw: &[u8]) -> Option<Vec<u8>> {
	let mut encoder = zstd::stream::Encoder::new(
		Vec::with_capacity(raw.len().wrapping_div(2)),
		zstd::DEFAULT_COMPRESSION_LEVEL,
	).ok()?;
	encoder.write_all(raw).ok()?;
	let out = encoder.finish().ok()?;

	if out.is_empty() { None }
	else { Some(out) }
}
