/*!
# Veririp: Output and Cache
*/

use crate::{
	CACHE_BASE,
	VeriRipError,
};
use std::{
	fs::File,
	path::{
		Path,
		PathBuf,
	},
};
use tempfile::NamedTempFile;



/// # Maximum File Name Length (Bytes).
const MAX_FILE_NAME: usize = 255;



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Output Directory.
///
/// This holds the canonical root for ripped tracks and cue sheets, and the
/// `CACHE_BASE` subdirectory beneath it for state data and database
/// responses.
///
/// It is created once, up front, and passed around explicitly.
pub struct OutputDir {
	/// # Root.
	root: PathBuf,

	/// # Cache Root.
	cache: PathBuf,
}

impl OutputDir {
	/// # New.
	///
	/// Canonicalize `root` and make sure both it and the cache subdirectory
	/// exist, creating them if necessary.
	///
	/// ## Errors
	///
	/// This will return an error if either directory cannot be created.
	pub fn new<P>(root: P) -> Result<Self, VeriRipError>
	where P: AsRef<Path> {
		let root = root.as_ref();
		if ! root.is_dir() {
			std::fs::create_dir_all(root).map_err(|_| VeriRipError::Cache)?;
		}
		let root = std::fs::canonicalize(root).map_err(|_| VeriRipError::Cache)?;

		let cache = root.join(CACHE_BASE);
		if ! cache.is_dir() {
			std::fs::create_dir_all(&cache).map_err(|_| VeriRipError::Cache)?;
		}

		Ok(Self { root, cache })
	}

	#[must_use]
	/// # Root.
	pub fn root(&self) -> &Path { &self.root }

	#[must_use]
	/// # Cache Root.
	pub fn cache(&self) -> &Path { &self.cache }

	#[must_use]
	/// # Cache Path.
	///
	/// Glue `name` onto the cache root and return it.
	pub fn cache_path(&self, name: &str) -> PathBuf { self.cache.join(name) }

	#[must_use]
	/// # Output Path.
	///
	/// Glue `name` onto the output root, shortening it if it is too long for
	/// the filesystem.
	pub fn output_path(&self, name: &str) -> PathBuf {
		self.root.join(shorten_file_name(&sanitize_file_name(name)))
	}

	/// # Read From Cache.
	///
	/// Return the contents of a cached file, if it exists and is non-empty.
	pub(crate) fn cache_read(&self, name: &str) -> Option<Vec<u8>> {
		std::fs::read(self.cache_path(name)).ok().filter(|v| ! v.is_empty())
	}

	/// # Write to Cache.
	///
	/// Atomically write a file to the cache, replacing any previous copy.
	///
	/// ## Errors
	///
	/// This will bubble up any write errors encountered.
	pub(crate) fn cache_write(&self, name: &str, data: &[u8]) -> Result<(), VeriRipError> {
		use std::io::Write;

		let dst = self.cache_path(name);
		let mut writer = CacheWriter::new(&dst)?;
		writer.writer().write_all(data)
			.map_err(|_| VeriRipError::Write(dst.to_string_lossy().into_owned()))?;
		writer.finish()
	}
}



#[derive(Debug)]
/// # Atomic Writer.
///
/// This writes to a temporary file in the destination's directory, moving it
/// into place only once `finish` is called. If dropped before then, the
/// destination is left untouched.
pub(crate) struct CacheWriter {
	/// # Destination.
	dst: PathBuf,

	/// # Temporary File.
	tmp: NamedTempFile,
}

impl CacheWriter {
	/// # New.
	///
	/// ## Errors
	///
	/// This will return an error if the temporary file cannot be created.
	pub(crate) fn new(dst: &Path) -> Result<Self, VeriRipError> {
		let dir = dst.parent()
			.filter(|p| p.is_dir())
			.ok_or_else(|| VeriRipError::Write(dst.to_string_lossy().into_owned()))?;
		let tmp = NamedTempFile::new_in(dir)
			.map_err(|_| VeriRipError::Write(dst.to_string_lossy().into_owned()))?;

		Ok(Self { dst: dst.to_path_buf(), tmp })
	}

	/// # Writer.
	pub(crate) fn writer(&mut self) -> &mut File { self.tmp.as_file_mut() }

	/// # Finish.
	///
	/// Flush and move the file into place.
	///
	/// ## Errors
	///
	/// This will return an error if the file cannot be persisted.
	pub(crate) fn finish(mut self) -> Result<(), VeriRipError> {
		use std::io::Write;

		let err = VeriRipError::Write(self.dst.to_string_lossy().into_owned());
		self.tmp.as_file_mut().flush().map_err(|_| err.clone())?;
		self.tmp.persist(&self.dst).map_err(|_| err)?;
		Ok(())
	}
}



/// # Sanitize File Name.
///
/// Replace path separators and control characters.
fn sanitize_file_name(src: &str) -> String {
	src.trim()
		.chars()
		.map(|c| match c {
			'/' | '\\' | '\0' => '-',
			c if c.is_control() => ' ',
			c => c,
		})
		.collect()
}

/// # Shorten File Name.
///
/// File names longer than 255 bytes are cut down (on a character boundary),
/// keeping the extension intact.
pub(crate) fn shorten_file_name(src: &str) -> String {
	if src.len() <= MAX_FILE_NAME { return src.to_owned(); }

	let (stem, ext) = match src.rsplit_once('.') {
		Some((stem, ext)) if ! stem.is_empty() && ext.len() < 16 => (stem, ext),
		_ => (src, ""),
	};

	let max = if ext.is_empty() { MAX_FILE_NAME } else { MAX_FILE_NAME - ext.len() - 1 };
	let mut end = max.min(stem.len());
	while ! stem.is_char_boundary(end) { end -= 1; }

	let stem = stem[..end].trim_end();
	if ext.is_empty() { stem.to_owned() }
	else { format!("{stem}.{ext}") }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_shorten() {
		// Short names are unchanged.
		assert_eq!(shorten_file_name("01. Magic.wav"), "01. Magic.wav");

		// Long ASCII.
		let long = format!("01. {}.wav", "a".repeat(300));
		let short = shorten_file_name(&long);
		assert_eq!(short.len(), MAX_FILE_NAME, "Name was not cut to the limit.");
		assert!(short.starts_with("01. aaa"), "Stem should be kept.");
		assert!(short.ends_with(".wav"), "Extension should be kept.");

		// Multi-byte characters should not be split.
		let long = format!("{}.wav", "é".repeat(200));
		let short = shorten_file_name(&long);
		assert!(short.len() <= MAX_FILE_NAME);
		assert!(short.ends_with("é.wav"), "Cut mid-character: {short}");
	}

	#[test]
	fn t_sanitize() {
		assert_eq!(sanitize_file_name(" AC/DC: Back\\In\tBlack "), "AC-DC: Back-In Black");
	}

	#[test]
	fn t_output_dir() {
		let tmp = tempfile::tempdir().expect("Tempdir failed.");
		let dir = OutputDir::new(tmp.path().join("rip")).expect("OutputDir failed.");
		assert!(dir.root().is_dir(), "Root was not created.");
		assert!(dir.cache().is_dir(), "Cache was not created.");
		assert!(dir.cache().ends_with(CACHE_BASE));

		// Nothing yet.
		assert!(dir.cache_read("test.bin").is_none());

		// Write and read back.
		dir.cache_write("test.bin", b"hello").expect("Cache write failed.");
		assert_eq!(dir.cache_read("test.bin").as_deref(), Some(&b"hello"[..]));

		// Overwrite.
		dir.cache_write("test.bin", b"goodbye").expect("Cache write failed.");
		assert_eq!(dir.cache_read("test.bin").as_deref(), Some(&b"goodbye"[..]));
	}

	#[test]
	fn t_cache_writer_abandon() {
		use std::io::Write;

		let tmp = tempfile::tempdir().expect("Tempdir failed.");
		let dst = tmp.path().join("abandoned.txt");
		{
			let mut writer = CacheWriter::new(&dst).expect("CacheWriter failed.");
			writer.writer().write_all(b"partial").expect("Write failed.");
		}
		assert!(! dst.exists(), "Unfinished writes should not land.");
	}
}
