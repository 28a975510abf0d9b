/*!
# Veririp: Cue Sheets
*/

use crate::{
	CdTextKind,
	SECTORS_PER_SECOND,
	Table,
	VeriRipError,
};
use std::{
	fmt::Write,
	path::Path,
};



impl Table {
	/// # Cue Sheet.
	///
	/// Render a cue sheet for the ripped files. Each audio track gets its
	/// CD-Text, ISRC, and indexes; a `FILE` line is added whenever the source
	/// counter moves forward.
	///
	/// A first-track pregap with no backing file (i.e. an un-ripped HTOA) is
	/// written as `PREGAP` silence.
	///
	/// ## Errors
	///
	/// This will return an error if the table is incomplete or any index is
	/// missing its file attribution.
	pub fn cue(&self, program: &str) -> Result<String, VeriRipError> {
		if ! self.has_toc() { return Err(VeriRipError::NoToc); }

		let mut out = String::new();
		let _res = writeln!(out, "REM DISCID {:08X}", self.cddb_id()?);
		let _res = writeln!(out, "REM COMMENT \"{}\"", program.replace('"', "'"));
		for (k, v) in &self.cdtext {
			if ! k.is_cue_command() { let _res = writeln!(out, "{}", k.cue_line(v)); }
		}
		if let Some(catalog) = self.catalog() {
			let _res = writeln!(out, "CATALOG {catalog}");
		}
		for k in [CdTextKind::Performer, CdTextKind::Title] {
			if let Some(v) = self.cdtext.get(&k) {
				let _res = writeln!(out, "{}", k.cue_line(v));
			}
		}

		// The first FILE goes before the first TRACK, even if the first index
		// is silence.
		let mut pos = self.tracks.first()
			.and_then(|t| t.first_index().map(|i| (t.number(), i.number())));
		let mut counter = loop {
			let (t, i) = pos.ok_or(VeriRipError::NoCue)?;
			let idx = self.track(t).and_then(|tr| tr.index(i)).ok_or(VeriRipError::NoCue)?;
			if let Some(path) = idx.path() {
				write_file(&mut out, path);
				break idx.counter();
			}
			pos = self.next_track_index(t, i);
		};

		for track in self.tracks.iter().filter(|t| t.is_audio()) {
			let mut wrote_track = false;
			for index in track.indexes() {
				if counter < index.counter() {
					if let Some(path) = index.path() { write_file(&mut out, path); }
					counter = index.counter();
				}

				if ! wrote_track {
					wrote_track = true;
					let _res = writeln!(out, "  TRACK {:02} AUDIO", track.number());
					for (k, v) in &track.cdtext {
						let _res = writeln!(out, "    {}", k.cue_line(v));
					}
					if let Some(isrc) = track.isrc() {
						let _res = writeln!(out, "    ISRC {isrc}");
					}

					if let Some(idx0) = track.index(0) {
						// Silence.
						if track.number() == 1 && idx0.path().is_none() {
							let _res = writeln!(out, "    PREGAP {}", msf(self.track_pregap(1)?));
							continue;
						}

						let rel = idx0.relative().ok_or(VeriRipError::NoCue)?;
						let _res = writeln!(out, "    INDEX 00 {}", msf(rel));
					}
				}

				if 0 < index.number() {
					let rel = index.relative().ok_or(VeriRipError::NoCue)?;
					let _res = writeln!(out, "    INDEX {:02} {}", index.number(), msf(rel));
				}
			}
		}

		Ok(out)
	}
}



/// # Write File Line.
///
/// Cue sheets live alongside the tracks, so only the file name is used.
fn write_file(out: &mut String, path: &Path) {
	let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
	let _res = writeln!(out, "FILE \"{name}\" WAVE");
}

#[allow(clippy::integer_division)]
/// # Sectors to MM:SS:FF.
fn msf(sectors: u32) -> String {
	let f = sectors % SECTORS_PER_SECOND;
	let s = (sectors / SECTORS_PER_SECOND) % 60;
	let m = sectors / SECTORS_PER_SECOND / 60;
	format!("{m:02}:{s:02}:{f:02}")
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		Index,
		Track,
	};

	#[test]
	fn t_msf() {
		assert_eq!(msf(0), "00:00:00");
		assert_eq!(msf(150), "00:02:00");
		assert_eq!(msf(74), "00:00:74");
		assert_eq!(msf(75 * 61 + 3), "01:01:03");
		assert_eq!(msf(75 * 60 * 100), "100:00:00");
	}

	#[test]
	fn t_cue() {
		let mut table = Table::new();
		for (n, pre, start) in [(1_u8, Some(0), 150), (2, Some(900), 1000), (3, None, 2000)] {
			let mut track = Track::new(n, true);
			if let Some(pre) = pre {
				track.set_index(Index::new(0, Some(pre))).expect("Index failed.");
			}
			track.set_index(Index::new(1, Some(start))).expect("Index failed.");
			table.push_track(track).expect("Push failed.");
		}
		table.set_leadout(3000);
		table.set_catalog("5021732201296");
		table.set_cdtext(CdTextKind::Performer, "Ladyhawke");
		table.set_cdtext(CdTextKind::Title, "Ladyhawke");
		table.set_cdtext(CdTextKind::Message, "Demo");
		if let Some(t) = table.track_mut(1) {
			t.set_cdtext(CdTextKind::Title, "Magic");
			t.set_isrc("GBUM70805331");
		}

		// Nothing has been ripped yet.
		assert_eq!(table.cue("Veririp"), Err(VeriRipError::NoCue));

		for n in 1..=3 {
			let len = table.track_length(n).expect("Missing length.");
			table.set_file(n, 1, format!("/tmp/rip/{n:02}.wav"), len, u16::from(n))
				.expect("Set file failed.");
		}

		let cue = table.cue("Veririp").expect("Cue failed.");
		assert_eq!(
			cue,
			r#"REM DISCID 14002603
REM COMMENT "Veririp"
REM MESSAGE "Demo"
CATALOG 5021732201296
PERFORMER "Ladyhawke"
TITLE "Ladyhawke"
FILE "01.wav" WAVE
  TRACK 01 AUDIO
    TITLE "Magic"
    ISRC GBUM70805331
    PREGAP 00:02:00
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    INDEX 00 00:10:00
FILE "02.wav" WAVE
    INDEX 01 00:00:00
FILE "03.wav" WAVE
  TRACK 03 AUDIO
    INDEX 01 00:00:00
"#,
		);
	}

	#[test]
	fn t_cue_htoa() {
		let mut table = Table::new();
		let mut track = Track::new(1, true);
		track.set_index(Index::new(0, Some(0))).expect("Index failed.");
		track.set_index(Index::new(1, Some(300))).expect("Index failed.");
		table.push_track(track).expect("Push failed.");
		table.set_leadout(1000);

		// Rip the hidden track into its own file.
		table.set_file(1, 0, "00.wav", 300, 0).expect("Set file failed.");
		table.set_file(1, 1, "01.wav", 700, 1).expect("Set file failed.");

		let cue = table.cue("Veririp").expect("Cue failed.");
		assert!(
			cue.ends_with("FILE \"00.wav\" WAVE\n  TRACK 01 AUDIO\n    INDEX 00 00:00:00\nFILE \"01.wav\" WAVE\n    INDEX 01 00:00:00\n"),
			"Unexpected HTOA layout:\n{cue}",
		);
	}
}
