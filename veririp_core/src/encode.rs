/*!
# Veririp: Encoders
*/

use crate::{
	CacheWriter,
	VeriRipError,
	WAVE_SPEC,
};
use hound::{
	WavReader,
	WavWriter,
};
use std::{
	io::{
		BufWriter,
		ErrorKind,
		Read,
		Write,
	},
	path::Path,
};



/// # Encoder.
///
/// Encoders turn the verified raw PCM into something more useful, and must
/// be able to turn it back again so the result can be checked.
pub trait Encoder {
	/// # Name.
	///
	/// A short description of the encoder, including its version.
	fn name(&self) -> String;

	/// # File Extension (Without the Dot).
	fn extension(&self) -> &'static str;

	/// # Encode.
	///
	/// Encode the raw 16-bit little-endian stereo PCM in `src`, saving it to
	/// `dst`. The destination should not be touched unless the encoding
	/// succeeds.
	///
	/// ## Errors
	///
	/// Return [`VeriRipError::Encode`] or [`VeriRipError::Write`] on failure.
	fn encode(&self, src: &mut dyn Read, dst: &Path) -> Result<(), VeriRipError>;

	/// # Decode.
	///
	/// Decode `src` back to raw PCM, writing it to `dst`. Returns the number
	/// of (stereo) samples written.
	///
	/// ## Errors
	///
	/// Return [`VeriRipError::Encode`] on failure.
	fn decode(&self, src: &Path, dst: &mut dyn Write) -> Result<u64, VeriRipError>;
}



#[derive(Debug, Clone, Copy, Default)]
/// # WAV Encoder.
///
/// Plain old 16-bit, 44.1kHz stereo WAV.
pub struct WavEncoder;

impl Encoder for WavEncoder {
	fn name(&self) -> String { "hound (WAV)".to_owned() }

	fn extension(&self) -> &'static str { "wav" }

	fn encode(&self, src: &mut dyn Read, dst: &Path) -> Result<(), VeriRipError> {
		let mut out = CacheWriter::new(dst)?;
		let mut wav = WavWriter::new(BufWriter::new(out.writer()), WAVE_SPEC)
			.map_err(|e| VeriRipError::Encode(e.to_string()))?;

		let mut buf = [0_u8; 8192];
		let mut odd: Option<u8> = None;
		loop {
			let len = match src.read(&mut buf) {
				Ok(0) => break,
				Ok(len) => len,
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => return Err(VeriRipError::Encode(e.to_string())),
			};

			// Pick up where the last chunk left off, if it split a value.
			let mut chunk = &buf[..len];
			if let Some(lo) = odd.take() {
				if let Some((hi, rest)) = chunk.split_first() {
					wav.write_sample(i16::from_le_bytes([lo, *hi]))
						.map_err(|e| VeriRipError::Encode(e.to_string()))?;
					chunk = rest;
				}
				else { odd = Some(lo); }
			}

			let pairs = chunk.chunks_exact(2);
			if let [lo] = pairs.remainder() { odd = Some(*lo); }
			for pair in pairs {
				wav.write_sample(i16::from_le_bytes([pair[0], pair[1]]))
					.map_err(|e| VeriRipError::Encode(e.to_string()))?;
			}
		}

		// Hound counts left and right separately.
		if odd.is_some() || wav.len() % 2 != 0 {
			return Err(VeriRipError::Encode("partial sample".to_owned()));
		}

		wav.finalize().map_err(|e| VeriRipError::Encode(e.to_string()))?;
		out.finish()
	}

	fn decode(&self, src: &Path, dst: &mut dyn Write) -> Result<u64, VeriRipError> {
		let reader = WavReader::open(src)
			.map_err(|e| VeriRipError::Encode(e.to_string()))?;

		let spec = reader.spec();
		if
			spec.channels != WAVE_SPEC.channels ||
			spec.sample_rate != WAVE_SPEC.sample_rate ||
			spec.bits_per_sample != WAVE_SPEC.bits_per_sample
		{
			return Err(VeriRipError::Encode("unsupported WAV format".to_owned()));
		}

		let mut dst = BufWriter::new(dst);
		let mut total: u64 = 0;
		for sample in reader.into_samples::<i16>() {
			let sample = sample.map_err(|e| VeriRipError::Encode(e.to_string()))?;
			dst.write_all(&sample.to_le_bytes())
				.map_err(|e| VeriRipError::Encode(e.to_string()))?;
			total += 1;
		}
		dst.flush().map_err(|e| VeriRipError::Encode(e.to_string()))?;

		Ok(total / u64::from(WAVE_SPEC.channels))
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		BYTES_PER_SECTOR,
		Crc32,
	};

	/// # A Chunky Reader.
	///
	/// This hands out data three bytes at a time to make sure the encoder can
	/// reassemble split values.
	struct Chunky<'a>(&'a [u8]);

	impl Read for Chunky<'_> {
		fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
			let len = self.0.len().min(buf.len()).min(3);
			buf[..len].copy_from_slice(&self.0[..len]);
			self.0 = &self.0[len..];
			Ok(len)
		}
	}

	#[test]
	fn t_wav() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let dst = dir.path().join("01.wav");

		let raw: Vec<u8> = (0..usize::from(BYTES_PER_SECTOR) * 3)
			.map(|i| (i * 7 % 251) as u8)
			.collect();
		let mut crc = Crc32::new();
		crc.update(&raw);

		let enc = WavEncoder;
		assert_eq!(enc.extension(), "wav");
		enc.encode(&mut Chunky(&raw), &dst).expect("Encode failed.");
		assert!(dst.is_file(), "The WAV was not written.");

		let mut out = Vec::new();
		let samples = enc.decode(&dst, &mut out).expect("Decode failed.");
		assert_eq!(samples, 588 * 3, "Wrong sample count.");

		let mut crc2 = Crc32::new();
		crc2.update(&out);
		assert_eq!(crc.finalize(), crc2.finalize(), "The decoded data changed.");
	}

	#[test]
	fn t_wav_partial() {
		let dir = tempfile::tempdir().expect("Tempdir failed.");
		let dst = dir.path().join("02.wav");

		// Six bytes is a sample and a half.
		let raw = [1_u8, 2, 3, 4, 5, 6];
		assert!(
			WavEncoder.encode(&mut raw.as_slice(), &dst).is_err(),
			"Partial samples should fail.",
		);
		assert!(! dst.exists(), "Failed encodes should not leave files behind.");
	}
}
