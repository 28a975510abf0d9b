/*!
# Veririp: Ripping
*/

mod log;
pub(super) mod opts;
mod track;

use crate::{
	ArIds,
	ArLookup,
	ArStatus,
	CacheWriter,
	CdTextKind,
	ChecksumWriter,
	DatabaseStatus,
	Encoder,
	KillSwitch,
	OutputDir,
	RipOptions,
	RipResult,
	SAMPLES_PER_SECTOR,
	SampleReader,
	Table,
	TrackPosition,
	TrackResult,
	VeriRipError,
	match_track,
};
use dactyl::{
	NiceElapsed,
	NicePercent,
	traits::NiceInflection,
};
use fyi_msg::{
	Msg,
	Progless,
};
use log::RipLog;
use std::{
	collections::BTreeMap,
	io::Write,
	ops::Range,
	path::PathBuf,
	time::Instant,
};
use track::{
	RipShare,
	TrackRip,
};



/// # Rip Manager.
///
/// This holds the disc table, options, and running result, coordinating the
/// track-by-track rip, the AccurateRip verification, and the final cue sheet
/// and state.
///
/// Failed tracks are recorded and skipped over; the rip only stops early if
/// the user aborts.
pub struct Ripper {
	now: Instant,
	opts: RipOptions,
	out: OutputDir,
	result: RipResult,
	log: Option<RipLog>,
}

impl std::fmt::Debug for Ripper {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Ripper")
			.field("opts", &self.opts)
			.field("out", &self.out)
			.field("result", &self.result)
			.finish_non_exhaustive()
	}
}

impl Ripper {
	/// # New!
	///
	/// Initialize from a table and options, picking up the saved state from
	/// a previous run, if any and resuming.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete, none of the
	/// chosen tracks can be ripped, or the saved state is unreadable.
	pub fn new(table: Table, opts: &RipOptions, out: OutputDir) -> Result<Self, VeriRipError> {
		if ! table.has_toc() { return Err(VeriRipError::NoToc); }

		// Weed out invalid tracks.
		let opts = opts.prune(&table)?;
		let ids = table.accuraterip_ids()?;

		let mut result = None;
		if opts.resume() {
			if let Some(old) = RipResult::load(&out, &ids)? {
				if old.offset() == opts.offset() { result.replace(old); }
				else {
					Msg::warning(format!(
						"The saved rip used a different read offset ({}); starting over.",
						old.offset().samples(),
					)).eprint();
				}
			}
		}

		let result = result.unwrap_or_else(|| RipResult::new(table, opts.offset()));
		let log = if opts.verbose() { Some(RipLog::new()) } else { None };

		Ok(Self {
			now: Instant::now(),
			opts,
			out,
			result,
			log,
		})
	}

	#[must_use]
	/// # Options.
	pub const fn options(&self) -> &RipOptions { &self.opts }

	#[must_use]
	/// # Output Directory.
	pub const fn output(&self) -> &OutputDir { &self.out }

	#[must_use]
	/// # Result (So Far).
	pub const fn result(&self) -> &RipResult { &self.result }

	/// # AccurateRip IDs.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete.
	pub fn ids(&self) -> Result<ArIds, VeriRipError> { self.result.table().accuraterip_ids() }
}

impl Ripper {
	/// # Rip!
	///
	/// Rip and encode each of the chosen tracks, one after the other, saving
	/// the state after each. Tracks finished by a previous run are re-checked
	/// and kept if they still match.
	///
	/// ## Errors
	///
	/// Individual track failures are recorded rather than returned; this
	/// only errors out if the user aborts or the table turns out to be
	/// unusable.
	pub fn rip(
		&mut self,
		reader: &mut dyn SampleReader,
		encoder: &dyn Encoder,
		progress: Option<&Progless>,
		killed: &KillSwitch,
	) -> Result<(), VeriRipError> {
		if self.result.is_accepted() {
			Msg::success("This rip has already been accepted.").eprint();
			return Ok(());
		}

		self.result.set_tools(reader.drive(), reader.version(), Some(encoder.name()))?;
		let plan = self.plan(encoder)?;

		if let Some(p) = progress {
			let total = plan.iter()
				.try_fold(0_u32, |acc, e| acc.checked_add(e.len()?.checked_mul(2)?))
				.ok_or(VeriRipError::RipOverflow)?;
			let _res = p.reset(total);
		}

		for entry in plan {
			if killed.killed() { break; }

			// Keep what we've already got, if it's still good.
			if self.opts.resume() && self.revalidate(&entry, encoder) {
				if let Some(p) = progress { p.increment_n(entry.len().unwrap_or(0) * 2); }
				continue;
			}

			let len = entry.len().ok_or(VeriRipError::RipOverflow)?;
			let mut rip = TrackRip::new(
				entry.number,
				entry.sectors.clone(),
				entry.position,
				entry.pregap,
				entry.dst.clone(),
			);
			let res = {
				let mut share = RipShare {
					reader: &mut *reader,
					encoder,
					offset: self.opts.offset(),
					tmp: self.out.cache(),
					killed,
					progress,
					log: self.log.as_mut(),
				};
				rip.run(&mut share)
			};

			// Attribute the file and record the result. A failure replaces
			// whatever a previous run had.
			let track = rip.into_result();
			let table = self.result.table_mut()?;
			let (t, i) = if entry.number == 0 { (1, 0) } else { (entry.number, 1) };
			if track.is_ok() {
				table.set_file(t, i, &entry.dst, len, u16::from(entry.number))?;
			}
			else { table.clear_file(t, i); }
			self.result.set_track(track)?;

			if let Err(e) = self.result.save(&self.out) {
				Msg::warning(e.to_string()).eprint();
			}

			match res {
				Ok(()) => {},
				Err(VeriRipError::Killed) => break,
				Err(e) => if self.log.is_none() {
					Msg::warning(e.to_string()).eprint();
				},
			}
		}

		if let Some(p) = progress { p.finish(); }
		if let Some(log) = self.log.as_mut() { log.flush(); }

		if killed.killed() { Err(VeriRipError::Killed) }
		else { Ok(()) }
	}

	/// # Rip Plan.
	///
	/// Work out the sectors, position, and destination for each track.
	fn plan(&self, encoder: &dyn Encoder) -> Result<Vec<RipPlan>, VeriRipError> {
		let table = self.result.table();
		let audio: Vec<u8> = table.audio_track_numbers().collect();
		let ext = encoder.extension();

		let mut out = Vec::new();
		for number in self.opts.tracks() {
			if number == 0 {
				let Some((start, len)) = table.htoa() else { continue; };
				out.push(RipPlan {
					number,
					sectors: start..start + len,
					position: TrackPosition::Middle,
					pregap: 0,
					dst: self.out.output_path(&format!("00.{ext}")),
				});
				continue;
			}

			let Some(idx) = audio.iter().position(|n| *n == number) else { continue; };
			let start = table.track_start(number)?;
			let end = table.track_end(number)?
				.checked_add(1)
				.ok_or(VeriRipError::RipOverflow)?;

			let name = match table.track(number).and_then(|t| t.cdtext(CdTextKind::Title)) {
				Some(title) => format!("{number:02} - {title}.{ext}"),
				None => format!("{number:02}.{ext}"),
			};

			out.push(RipPlan {
				number,
				sectors: start..end,
				position: TrackPosition::new(idx, audio.len()),
				pregap: table.track_pregap(number)?,
				dst: self.out.output_path(&name),
			});
		}

		if out.is_empty() { Err(VeriRipError::Noop) }
		else { Ok(out) }
	}

	/// # Revalidate.
	///
	/// Decode a track saved by a previous run and make sure it still matches
	/// its recorded checksum.
	fn revalidate(&self, entry: &RipPlan, encoder: &dyn Encoder) -> bool {
		let Some(old) = self.result.track(entry.number).filter(|t| t.is_ok())
		else { return false; };
		let (Some(path), Some(crc)) = (old.path(), old.copy_crc()) else { return false; };
		if old.sectors() != entry.len().unwrap_or(0) { return false; }

		let mut chk = ChecksumWriter::new(std::io::sink(), entry.position, old.sectors());
		let expected = u64::from(old.sectors()) * u64::from(SAMPLES_PER_SECTOR);
		match encoder.decode(path, &mut chk) {
			Ok(samples) if expected <= samples && chk.crc() == crc => true,
			_ => {
				Msg::warning(format!(
					"Track #{:02} no longer matches the saved rip; ripping it again.",
					entry.number,
				)).eprint();
				false
			},
		}
	}
}

impl Ripper {
	/// # Verify.
	///
	/// Match the ripped tracks against the AccurateRip database responses,
	/// recording the results.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or the rip has
	/// already been accepted.
	pub fn verify(&mut self, lookup: &ArLookup) -> Result<(), VeriRipError> {
		if self.result.is_accepted() { return Ok(()); }

		let status = match lookup {
			ArLookup::NotFound => DatabaseStatus::NotFound,
			ArLookup::NetworkError(_) => DatabaseStatus::Unavailable,
			ArLookup::Responses(r) => DatabaseStatus::Found(u8::try_from(r.len()).unwrap_or(u8::MAX)),
		};
		if let Some(e) = lookup.as_error() { Msg::warning(e.to_string()).eprint(); }

		let ids = self.ids()?;
		let mut matches = BTreeMap::new();
		for (idx, number) in self.result.table().audio_track_numbers().enumerate() {
			let Some(local) = self.result.track(number)
				.filter(|t| t.is_ok())
				.and_then(TrackResult::accuraterip)
			else { continue; };
			matches.insert(number, match_track(&ids, idx, local, lookup.responses()));
		}

		self.result.set_matches(status, &matches)
	}

	/// # Summarize.
	///
	/// Print the per-track results and the status of the disc as a whole.
	pub fn summarize(&self) {
		let ripped = self.result.tracks().filter(|t| t.is_ok()).count();
		let elapsed = NiceElapsed::from(self.now.elapsed());
		Msg::custom("Ripped", 199, &format!(
			"{} in {elapsed}.",
			ripped.nice_inflect("track", "tracks"),
		))
			.with_newline(true)
			.eprint();

		for track in self.result.tracks() {
			eprintln!("        {}", track_line(track));
		}

		Msg::custom("AccurateRip", 199, self.result.database().as_str())
			.with_newline(true)
			.eprint();

		eprintln!();
	}

	/// # Finish.
	///
	/// Write the cue sheet (if every audio track ripped successfully), accept
	/// the rip if it qualifies, save the final state, and return the result.
	///
	/// ## Errors
	///
	/// This will return an error if the cue sheet cannot be written.
	pub fn finish(mut self) -> Result<RipResult, VeriRipError> {
		if let Some(log) = self.log.as_mut() { log.flush(); }
		if self.result.is_accepted() { return Ok(self.result); }

		if self.result.is_complete() && self.result.table().can_cue() {
			let table = self.result.table();
			let cue = table.cue(self.result.program())?;
			let name = match table.cdtext(CdTextKind::Title) {
				Some(title) => format!("{title}.cue"),
				None => format!("{:08x}.cue", table.cddb_id()?),
			};
			let dst = self.out.output_path(&name);

			let mut writer = CacheWriter::new(&dst)?;
			writer.writer().write_all(cue.as_bytes())
				.map_err(|_| VeriRipError::Write(dst.to_string_lossy().into_owned()))?;
			writer.finish()?;
			self.result.set_cue(dst)?;
		}

		self.result.accept(self.opts.unknown());
		if let Err(e) = self.result.save(&self.out) {
			Msg::warning(e.to_string()).eprint();
		}

		Ok(self.result)
	}
}



/// # Planned Track.
struct RipPlan {
	number: u8,
	sectors: Range<u32>,
	position: TrackPosition,
	pregap: u32,
	dst: PathBuf,
}

impl RipPlan {
	/// # Length (Sectors).
	fn len(&self) -> Option<u32> { self.sectors.end.checked_sub(self.sectors.start) }
}



/// # Track Summary Line.
fn track_line(track: &TrackResult) -> String {
	let number = track.number();
	if let Some(err) = track.error() {
		return format!("{number:02}  failed      {err}");
	}

	let crc = track.copy_crc().map_or_else(|| "--------".to_owned(), |c| format!("{c:08X}"));
	let quality = track.quality()
		.map_or_else(|| "--".to_owned(), |q| NicePercent::from(q).to_string());
	let ar = match track.ar_match() {
		Some(m) => match m.status() {
			ArStatus::Accurate => format!(
				"accurate ({}/{})",
				m.confidence().unwrap_or(0),
				m.max_confidence().unwrap_or(0),
			),
			ArStatus::Inaccurate => format!(
				"inaccurate (max {})",
				m.max_confidence().unwrap_or(0),
			),
			ArStatus::Unverifiable => "unverifiable".to_owned(),
		},
		None if track.is_htoa() => "n/a".to_owned(),
		None => "unchecked".to_owned(),
	};

	format!("{number:02}  ok  {crc}  {quality:>7}  {ar}")
}
