/*!
# Veririp: Table

The [`Table`] is the disc structure: tracks, their indexes, the absolute and
relative sector positions of each, and which ripped file (if any) backs them.

All absolute offsets are sector numbers counted from the start of the first
track's program area, i.e. _without_ the 150-sector lead-in.
*/

mod cue;
mod id;
mod parse;

use crate::{
	CD_LEADOUT_LABEL,
	CdTextKind,
	SECTORS_PER_SECOND,
	SESSION_GAP,
	SESSION_GAP_NEXT,
	VeriRipError,
};
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	collections::BTreeMap,
	fmt,
	ops::Bound::{
		Excluded,
		Unbounded,
	},
	path::{
		Path,
		PathBuf,
	},
	time::Duration,
};



#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
/// # Index.
///
/// A position within a track. Index 0 is the pregap, index 1 the start of
/// the track proper, and anything higher a sub-index.
pub struct Index {
	/// # Index Number.
	number: u8,

	/// # Absolute Offset.
	absolute: Option<u32>,

	/// # Backing File.
	path: Option<PathBuf>,

	/// # Offset Relative to the Backing File.
	relative: Option<u32>,

	/// # Source Counter.
	///
	/// Consecutive indexes sharing a counter come from the same file.
	counter: u16,
}

impl Index {
	#[must_use]
	/// # New.
	pub const fn new(number: u8, absolute: Option<u32>) -> Self {
		Self {
			number,
			absolute,
			path: None,
			relative: None,
			counter: 0,
		}
	}

	#[must_use]
	/// # With Source.
	///
	/// Attribute the index to a backing file.
	pub fn with_source<P>(mut self, path: P, relative: u32, counter: u16) -> Self
	where P: Into<PathBuf> {
		self.set_source(path.into(), relative, counter);
		self
	}

	/// # Set Source.
	fn set_source(&mut self, path: PathBuf, relative: u32, counter: u16) {
		self.path = Some(path);
		self.relative = Some(relative);
		self.counter = counter;
	}

	/// # Clear Source.
	fn clear_source(&mut self) {
		self.path = None;
		self.relative = None;
		self.counter = 0;
	}
}

impl Index {
	#[must_use]
	/// # Number.
	pub const fn number(&self) -> u8 { self.number }

	#[must_use]
	/// # Absolute Offset.
	pub const fn absolute(&self) -> Option<u32> { self.absolute }

	#[must_use]
	/// # Backing File.
	pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

	#[must_use]
	/// # Relative Offset.
	pub const fn relative(&self) -> Option<u32> { self.relative }

	#[must_use]
	/// # Source Counter.
	pub const fn counter(&self) -> u16 { self.counter }
}



#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
/// # Track.
pub struct Track {
	/// # Track Number.
	number: u8,

	/// # Audio?
	audio: bool,

	/// # Session Number.
	session: u8,

	/// # ISRC.
	isrc: Option<String>,

	/// # Indexes.
	indexes: BTreeMap<u8, Index>,

	/// # CD-Text.
	cdtext: BTreeMap<CdTextKind, String>,
}

impl Track {
	#[must_use]
	/// # New.
	///
	/// Tracks start out in the first session with no indexes.
	pub const fn new(number: u8, audio: bool) -> Self {
		Self {
			number,
			audio,
			session: 1,
			isrc: None,
			indexes: BTreeMap::new(),
			cdtext: BTreeMap::new(),
		}
	}

	#[must_use]
	/// # With Session.
	pub fn with_session(mut self, session: u8) -> Self {
		self.session = session.max(1);
		self
	}

	/// # Set Index.
	///
	/// Add or replace an index.
	///
	/// ## Errors
	///
	/// Indexes must be non-decreasing in absolute offset; an error is
	/// returned if this one would fall out of order with its neighbors.
	pub fn set_index(&mut self, index: Index) -> Result<(), VeriRipError> {
		if let Some(abs) = index.absolute {
			let before = self.indexes.range(..index.number)
				.rev()
				.find_map(|(_, i)| i.absolute);
			let after = self.indexes.range((Excluded(index.number), Unbounded))
				.find_map(|(_, i)| i.absolute);

			if before.is_some_and(|b| abs < b) || after.is_some_and(|a| a < abs) {
				return Err(VeriRipError::IndexOrder(self.number, index.number));
			}
		}

		self.indexes.insert(index.number, index);
		Ok(())
	}

	/// # Set ISRC.
	pub fn set_isrc<S>(&mut self, isrc: S)
	where S: AsRef<str> {
		let isrc = isrc.as_ref().trim();
		self.isrc =
			if isrc.is_empty() { None }
			else { Some(isrc.to_owned()) };
	}

	/// # Set CD-Text.
	///
	/// Empty values remove the field. ISRCs are stored in their own slot.
	pub fn set_cdtext<S>(&mut self, kind: CdTextKind, value: S)
	where S: AsRef<str> {
		if matches!(kind, CdTextKind::Isrc) { return self.set_isrc(value); }

		let value = value.as_ref().trim();
		if value.is_empty() { self.cdtext.remove(&kind); }
		else { self.cdtext.insert(kind, value.to_owned()); }
	}
}

impl Track {
	#[must_use]
	/// # Number.
	pub const fn number(&self) -> u8 { self.number }

	#[must_use]
	/// # Audio?
	pub const fn is_audio(&self) -> bool { self.audio }

	#[must_use]
	/// # Session.
	pub const fn session(&self) -> u8 { self.session }

	#[must_use]
	/// # ISRC.
	pub fn isrc(&self) -> Option<&str> { self.isrc.as_deref() }

	#[must_use]
	/// # CD-Text Value.
	pub fn cdtext(&self, kind: CdTextKind) -> Option<&str> {
		if matches!(kind, CdTextKind::Isrc) { self.isrc() }
		else { self.cdtext.get(&kind).map(String::as_str) }
	}

	#[must_use]
	/// # Index.
	pub fn index(&self, number: u8) -> Option<&Index> { self.indexes.get(&number) }

	/// # Indexes.
	pub fn indexes(&self) -> impl Iterator<Item=&Index> { self.indexes.values() }

	#[must_use]
	/// # First Index.
	pub fn first_index(&self) -> Option<&Index> { self.indexes.values().next() }

	#[must_use]
	/// # Last Index.
	pub fn last_index(&self) -> Option<&Index> { self.indexes.values().next_back() }

	#[must_use]
	/// # Start.
	///
	/// The absolute offset of index 1, if known.
	pub fn start(&self) -> Option<u32> { self.index(1).and_then(Index::absolute) }
}



#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
/// # Table.
///
/// The full disc structure. Tables are usually built up in stages: the track
/// count and offsets first, then CD-Text and ISRCs, and finally the ripped
/// file attribution via [`Table::set_file`].
pub struct Table {
	/// # Tracks.
	tracks: Vec<Track>,

	/// # Leadout.
	///
	/// The first sector past the last track.
	leadout: Option<u32>,

	/// # Catalog Number.
	catalog: Option<String>,

	/// # Disc CD-Text.
	cdtext: BTreeMap<CdTextKind, String>,
}

impl fmt::Display for Table {
	/// # Summarize the Table.
	///
	/// This prints the disc identifiers and a table of contents-type listing.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		/// # Divider.
		const DIVIDER: &str = "----------------------------------------\n";

		if ! self.has_toc() {
			return f.write_str("The table of contents is incomplete.\n");
		}

		// A few key/value pairs.
		let mut kv: Vec<(&str, String)> = Vec::with_capacity(5);
		if let Ok(v) = self.to_cdtoc() { kv.push(("CDTOC:", v)); }
		if let Ok(v) = self.accuraterip_ids() { kv.push(("AccurateRip:", v.to_string())); }
		if let Ok(v) = self.cddb_id() { kv.push(("CDDB:", format!("{v:08x}"))); }
		if let Ok(v) = self.musicbrainz_id() { kv.push(("MusicBrainz:", v)); }
		if let Some(v) = self.catalog() { kv.push(("Catalog:", v.to_owned())); }

		let col_max: usize = kv.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
		for (k, v) in kv {
			writeln!(f, "{k:col_max$} {v}")?;
		}

		// Start the table of contents.
		write!(
			f,
			"\n##   FIRST    LAST  LENGTH          {}\n",
			if self.tracks.iter().any(|t| t.isrc.is_some()) { "ISRC" } else { "" },
		)?;
		f.write_str(DIVIDER)?;

		// HTOA.
		if let Some((start, len)) = self.htoa() {
			writeln!(f, "00  {start:>6}  {:>6}  {len:>6}          HTOA", start + len - 1)?;
		}

		for t in &self.tracks {
			let num = t.number;
			let start = self.track_start(num).map_err(|_| fmt::Error)?;
			if t.audio {
				let end = self.track_end(num).map_err(|_| fmt::Error)?;
				writeln!(
					f,
					"{num:02}  {start:>6}  {end:>6}  {:>6}  {:>12}",
					end + 1 - start,
					t.isrc().unwrap_or_default(),
				)?;
			}
			else {
				writeln!(f, "{num:02}  {start:>6}                    DATA TRACK")?;
			}
		}

		// The leadout.
		writeln!(
			f,
			"{}  {:>6}                      LEAD-OUT",
			CD_LEADOUT_LABEL,
			self.leadout.unwrap_or_default(),
		)?;

		// Close it off!
		f.write_str(DIVIDER)?;
		writeln!(f)
	}
}

impl Table {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	/// # Push Track.
	///
	/// Tracks must be added in order, starting with number one.
	///
	/// ## Errors
	///
	/// An error is returned if the track number is not the next in line.
	pub fn push_track(&mut self, track: Track) -> Result<(), VeriRipError> {
		if usize::from(track.number) == self.tracks.len() + 1 {
			self.tracks.push(track);
			Ok(())
		}
		else { Err(VeriRipError::TrackNumber(track.number)) }
	}

	/// # Set Leadout.
	pub fn set_leadout(&mut self, leadout: u32) { self.leadout.replace(leadout); }

	/// # Set Catalog Number.
	pub fn set_catalog<S>(&mut self, catalog: S)
	where S: AsRef<str> {
		let catalog = catalog.as_ref().trim();
		self.catalog =
			if catalog.is_empty() { None }
			else { Some(catalog.to_owned()) };
	}

	/// # Set Disc CD-Text.
	pub fn set_cdtext<S>(&mut self, kind: CdTextKind, value: S)
	where S: AsRef<str> {
		if matches!(kind, CdTextKind::Barcode) { return self.set_catalog(value); }

		let value = value.as_ref().trim();
		if value.is_empty() { self.cdtext.remove(&kind); }
		else { self.cdtext.insert(kind, value.to_owned()); }
	}

	/// # Track (Mutable).
	pub fn track_mut(&mut self, number: u8) -> Option<&mut Track> {
		let idx = usize::from(number).checked_sub(1)?;
		self.tracks.get_mut(idx)
	}
}

impl Table {
	#[must_use]
	/// # Tracks.
	pub fn tracks(&self) -> &[Track] { &self.tracks }

	#[must_use]
	/// # Track.
	pub fn track(&self, number: u8) -> Option<&Track> {
		let idx = usize::from(number).checked_sub(1)?;
		self.tracks.get(idx)
	}

	#[must_use]
	/// # Leadout.
	pub const fn leadout(&self) -> Option<u32> { self.leadout }

	#[must_use]
	/// # Catalog Number.
	pub fn catalog(&self) -> Option<&str> { self.catalog.as_deref() }

	#[must_use]
	/// # Disc CD-Text Value.
	pub fn cdtext(&self, kind: CdTextKind) -> Option<&str> {
		if matches!(kind, CdTextKind::Barcode) { self.catalog() }
		else { self.cdtext.get(&kind).map(String::as_str) }
	}

	#[must_use]
	/// # Has Table of Contents?
	///
	/// Returns `true` if the leadout and every track's index 1 offset are
	/// known.
	pub fn has_toc(&self) -> bool {
		self.leadout.is_some() &&
		! self.tracks.is_empty() &&
		self.tracks.iter().all(|t| t.start().is_some())
	}

	#[must_use]
	/// # Can Cue?
	///
	/// Returns `true` if the table has a TOC and every audio index is backed
	/// by a file. The first track's pregap is the one exception; if it wasn't
	/// ripped, the cue sheet describes it as silence instead.
	pub fn can_cue(&self) -> bool {
		self.has_toc() &&
		self.tracks.iter()
			.filter(|t| t.audio)
			.flat_map(|t| t.indexes.values().map(move |i| (t.number, i)))
			.all(|(n, i)|
				(i.path.is_some() && i.relative.is_some()) ||
				(n == 1 && i.number == 0 && i.path.is_none())
			)
	}

	#[must_use]
	/// # Number of Audio Tracks.
	pub fn audio_tracks(&self) -> u8 {
		let len = self.tracks.iter().filter(|t| t.audio).count();
		u8::try_from(len).unwrap_or(u8::MAX)
	}

	/// # Audio Track Numbers.
	pub fn audio_track_numbers(&self) -> impl Iterator<Item=u8> + '_ {
		self.tracks.iter().filter_map(|t| if t.audio { Some(t.number) } else { None })
	}

	#[must_use]
	/// # Has Data Tracks?
	pub fn has_data_tracks(&self) -> bool { self.tracks.iter().any(|t| ! t.audio) }

	#[must_use]
	/// # HTOA.
	///
	/// If the first track is audio and has a pregap containing more than the
	/// standard lead-in silence, return its start and length.
	pub fn htoa(&self) -> Option<(u32, u32)> {
		let track = self.tracks.first().filter(|t| t.audio)?;
		let start = track.index(0).and_then(Index::absolute)?;
		let len = track.start()?.checked_sub(start).filter(|l| 0 < *l)?;
		Some((start, len))
	}
}

impl Table {
	/// # Track Start.
	///
	/// Return the absolute offset of the track's index 1.
	///
	/// ## Errors
	///
	/// This will return an error if the track or its offset is missing.
	pub fn track_start(&self, number: u8) -> Result<u32, VeriRipError> {
		self.track(number)
			.ok_or(VeriRipError::NoTrack(number))?
			.start()
			.ok_or(VeriRipError::TrackOffset(number))
	}

	/// # Track End.
	///
	/// Return the absolute offset of the last sector of the track. This
	/// includes the next track's pregap (if any), but excludes the gap
	/// between sessions.
	///
	/// ## Errors
	///
	/// This will return an error if the track or any needed offset is
	/// missing.
	pub fn track_end(&self, number: u8) -> Result<u32, VeriRipError> {
		let track = self.track(number).ok_or(VeriRipError::NoTrack(number))?;

		// The last track ends at the leadout.
		if usize::from(number) == self.tracks.len() {
			return self.leadout
				.ok_or(VeriRipError::NoToc)?
				.checked_sub(1)
				.ok_or(VeriRipError::TrackOffset(number));
		}

		let next = &self.tracks[usize::from(number)];
		let mut end = next.start()
			.ok_or(VeriRipError::TrackOffset(next.number))?
			.checked_sub(1)
			.ok_or(VeriRipError::TrackOffset(number))?;

		if track.session < next.session {
			end = end.checked_sub(session_gap(next.session))
				.ok_or(VeriRipError::TrackOffset(number))?;
		}

		Ok(end)
	}

	/// # Track Length.
	///
	/// ## Errors
	///
	/// This will return an error if the track or any needed offset is
	/// missing.
	pub fn track_length(&self, number: u8) -> Result<u32, VeriRipError> {
		let start = self.track_start(number)?;
		let end = self.track_end(number)?;
		(end + 1).checked_sub(start).ok_or(VeriRipError::TrackOffset(number))
	}

	/// # Track Pregap.
	///
	/// Return the length of the track's pregap (index 0), or zero if it has
	/// none.
	///
	/// ## Errors
	///
	/// This will return an error if the track or its offset is missing.
	pub fn track_pregap(&self, number: u8) -> Result<u32, VeriRipError> {
		let start = self.track_start(number)?;
		let Some(pre) = self.track(number).and_then(|t| t.index(0)).and_then(Index::absolute)
		else { return Ok(0); };
		Ok(start.saturating_sub(pre))
	}

	/// # Sectors.
	///
	/// Return the length of the disc in sectors, from the start of the first
	/// track. If `data` is false, this stops at the end of the last audio
	/// track.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete.
	pub fn sectors(&self, data: bool) -> Result<u32, VeriRipError> {
		if ! self.has_toc() { return Err(VeriRipError::NoToc); }

		if data {
			let leadout = self.leadout.ok_or(VeriRipError::NoToc)?;
			leadout.checked_sub(self.track_start(1)?).ok_or(VeriRipError::NoToc)
		}
		else {
			let first = self.audio_track_numbers().next().ok_or(VeriRipError::NoTrack(1))?;
			let last = self.audio_track_numbers().last().ok_or(VeriRipError::NoTrack(1))?;
			(self.track_end(last)? + 1).checked_sub(self.track_start(first)?)
				.ok_or(VeriRipError::NoToc)
		}
	}

	#[allow(clippy::integer_division)]
	/// # Duration.
	///
	/// Return the (audio) running time of the disc.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete.
	pub fn duration(&self) -> Result<Duration, VeriRipError> {
		let sectors = u64::from(self.sectors(false)?);
		Ok(Duration::from_millis(sectors * 1000 / u64::from(SECTORS_PER_SECOND)))
	}

	#[must_use]
	/// # Next Track Index.
	///
	/// Return the track and index numbers following the given pair, moving
	/// on to the next track's first index if necessary.
	pub fn next_track_index(&self, track: u8, index: u8) -> Option<(u8, u8)> {
		let t = self.track(track)?;
		if let Some((&n, _)) = t.indexes.range((Excluded(index), Unbounded)).next() {
			return Some((track, n));
		}

		let next = track.checked_add(1)?;
		self.track(next)?.indexes.keys().next().map(|&n| (next, n))
	}
}

impl Table {
	/// # Set File.
	///
	/// Attribute `length` sectors, starting at the given track/index, to the
	/// file at `path`. Every index in that span (including the pregaps of any
	/// following tracks) gets the path, its offset relative to the start of
	/// the file, and `counter`.
	///
	/// ## Errors
	///
	/// This will return an error if the starting index does not exist or any
	/// index in the span is missing its absolute offset.
	pub fn set_file<P>(&mut self, track: u8, index: u8, path: P, length: u32, counter: u16)
	-> Result<(), VeriRipError>
	where P: Into<PathBuf> {
		let anchor = self.track(track)
			.ok_or(VeriRipError::NoTrack(track))?
			.index(index)
			.and_then(Index::absolute)
			.ok_or(VeriRipError::TrackOffset(track))?;
		let end = anchor.checked_add(length).ok_or(VeriRipError::RipOverflow)?;
		let path: PathBuf = path.into();

		let mut pos = Some((track, index));
		while let Some((t, i)) = pos {
			let Some(idx) = self.track_mut(t).and_then(|tr| tr.indexes.get_mut(&i))
			else { break; };
			let abs = idx.absolute.ok_or(VeriRipError::TrackOffset(t))?;
			if end <= abs { break; }

			idx.set_source(path.clone(), abs - anchor, counter);
			pos = self.next_track_index(t, i);
		}

		Ok(())
	}

	/// # Absolutize.
	///
	/// Copy the relative offsets over to the absolute ones, starting with the
	/// very first index and continuing for as long as the source counter
	/// stays the same. This is for tables built from a single-file image,
	/// where the two are one and the same.
	///
	/// ## Errors
	///
	/// This will return an error if an index already has a different absolute
	/// offset.
	pub fn absolutize(&mut self) -> Result<(), VeriRipError> {
		let Some((mut t, mut i, counter)) = self.tracks.first()
			.and_then(|tr| tr.first_index().map(|idx| (tr.number, idx.number, idx.counter)))
		else { return Ok(()); };

		loop {
			let Some(idx) = self.track_mut(t).and_then(|tr| tr.indexes.get_mut(&i))
			else { break; };
			if idx.counter != counter { break; }
			let Some(rel) = idx.relative else { break; };

			if idx.absolute.is_some_and(|abs| abs != rel) {
				return Err(VeriRipError::IndexConflict(t, i));
			}
			idx.absolute.replace(rel);

			match self.next_track_index(t, i) {
				Some((t2, i2)) => { t = t2; i = i2; },
				None => break,
			}
		}

		Ok(())
	}

	/// # Clear File.
	///
	/// Remove the attribution starting at the given track/index, along with
	/// that of any following indexes backed by the same file. This undoes a
	/// [`Table::set_file`] for a rip that didn't pan out.
	pub fn clear_file(&mut self, track: u8, index: u8) {
		let Some(path) = self.track(track)
			.and_then(|t| t.index(index))
			.and_then(|i| i.path.clone())
		else { return; };

		let mut pos = Some((track, index));
		while let Some((t, i)) = pos {
			let Some(idx) = self.track_mut(t).and_then(|tr| tr.indexes.get_mut(&i))
			else { break; };
			if idx.path.as_ref() != Some(&path) { break; }

			idx.clear_source();
			pos = self.next_track_index(t, i);
		}
	}

	/// # Clear Files.
	///
	/// Remove all file attribution from the table.
	pub fn clear_files(&mut self) {
		for idx in self.tracks.iter_mut().flat_map(|t| t.indexes.values_mut()) {
			idx.clear_source();
		}
	}

	/// # Merge.
	///
	/// Append the tracks from another session's table onto this one. Track
	/// numbers and source counters continue on from ours, and absolute
	/// offsets are shifted by our leadout plus the gap between the sessions.
	///
	/// ## Errors
	///
	/// Both tables need leadouts, and the combined numbers must fit.
	pub fn merge(&mut self, other: &Self) -> Result<(), VeriRipError> {
		let leadout = self.leadout.ok_or(VeriRipError::NoToc)?;
		let other_leadout = other.leadout.ok_or(VeriRipError::NoToc)?;

		let session = self.tracks.last()
			.map_or(1, |t| t.session)
			.checked_add(1)
			.ok_or(VeriRipError::RipOverflow)?;
		let gap = session_gap(session);
		let shift = leadout.checked_add(gap).ok_or(VeriRipError::RipOverflow)?;
		let numbers = u8::try_from(self.tracks.len()).map_err(|_| VeriRipError::RipOverflow)?;
		let counter = self.tracks.last()
			.and_then(Track::last_index)
			.map_or(0, |i| i.counter);
		let other_session = other.tracks.first().map_or(1, |t| t.session);

		let mut tracks = Vec::with_capacity(other.tracks.len());
		for t in &other.tracks {
			let mut t = t.clone();
			t.number = t.number.checked_add(numbers)
				.ok_or(VeriRipError::TrackNumber(t.number))?;
			t.session = session.saturating_add(t.session.saturating_sub(other_session));
			for idx in t.indexes.values_mut() {
				if let Some(abs) = idx.absolute.as_mut() {
					*abs = abs.checked_add(shift).ok_or(VeriRipError::RipOverflow)?;
				}
				idx.counter = idx.counter.saturating_add(counter);
			}
			tracks.push(t);
		}

		self.tracks.append(&mut tracks);
		self.leadout = Some(
			shift.checked_add(other_leadout).ok_or(VeriRipError::RipOverflow)?
		);

		Ok(())
	}
}



/// # Session Gap.
///
/// Return the gap preceding the given session.
const fn session_gap(session: u8) -> u32 {
	if session <= 2 { SESSION_GAP }
	else { SESSION_GAP_NEXT }
}
