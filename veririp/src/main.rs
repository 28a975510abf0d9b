/*!
# Veririp
*/

#![forbid(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]



mod cli;

use cli::Settings;
use fyi_msg::{
	Msg,
	Progless,
};
use oxford_join::OxfordJoin;
use std::process::ExitCode;
use utc2k::FmtUtc2k;
use veririp_core::{
	CdparanoiaReader,
	KillSwitch,
	OutputDir,
	RipOptions,
	Ripper,
	SampleReader,
	Table,
	VeriRipError,
	WavEncoder,
	fetch_accuraterip,
};



/// # A Divider Line.
///
/// This is used to encase the drive vendor/model during summary. We'll slice
/// it to match the length rather than `"-".repeat()` or whatever.
const DIVIDER: &str = "------------------------------------------------";



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() -> ExitCode {
	match main__() {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(e @ (VeriRipError::PrintHelp | VeriRipError::PrintVersion)) => {
			println!("{e}");
			ExitCode::SUCCESS
		},
		Err(e) => {
			Msg::from(e).eprint();
			ExitCode::FAILURE
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff, returning `true` if the rip was accepted.
fn main__() -> Result<bool, VeriRipError> {
	let Settings { opts, table, mut reader, out, no_rip, no_summary } = cli::parse()?;

	// Quiet?
	if ! no_summary {
		if let Some(drive) = reader.drive().filter(|d| ! d.is_empty()) {
			let len = drive.len().min(DIVIDER.len());
			eprintln!(
				"\x1b[2;36m{}\x1b[0m\n\x1b[1;36m{drive}\x1b[0m\n\x1b[2;36m{}\x1b[0m\n",
				&DIVIDER[..len],
				&DIVIDER[..len],
			);
		}

		eprintln!("{table}");
	}

	// Go ahead and leave if there's no ripping to do.
	if no_rip { return Ok(true); }

	// Let CTRL+C stop the rip gracefully.
	let killed = KillSwitch::new();
	let k2 = killed.clone();
	ctrlc::set_handler(move || { k2.kill(); })
		.map_err(|_| VeriRipError::Bug("unable to set up the CTRL+C handler"))?;

	rip_summary(&table, &opts, &out);
	if opts.verbose() { log_header(&table, &opts, &reader); }

	// Rip and rip and rip!
	let mut ripper = Ripper::new(table, &opts, out)?;
	let progress = Progless::default();
	ripper.rip(&mut reader, &WavEncoder, Some(&progress), &killed)?;

	// Check the database.
	let ids = ripper.ids()?;
	let lookup = fetch_accuraterip(&ids, Some(ripper.output()));
	ripper.verify(&lookup)?;
	ripper.summarize();

	let result = ripper.finish()?;
	if result.is_accepted() {
		Msg::success(match result.cue() {
			Some(cue) => format!("The rip has been verified and accepted: {}", cue.display()),
			None => "The rip has been verified and accepted.".to_owned(),
		}).eprint();
		Ok(true)
	}
	else {
		Msg::warning(
			if result.is_complete() {
				"The rip could not be verified; see above for details."
			}
			else { "The rip is incomplete; run it again to retry the failed tracks." }
		).eprint();
		Ok(false)
	}
}

/// # Log Header.
///
/// Print a few basic setup details for the log. Only applies when -v/--verbose
/// is set, and we're ripping something.
fn log_header(table: &Table, opts: &RipOptions, reader: &CdparanoiaReader) {
	use std::io::Write;

	let writer = std::io::stdout();
	let mut handle = writer.lock();

	// Program version.
	let _res = writeln!(
		&mut handle,
		concat!("#####
## Veririp v", env!("CARGO_PKG_VERSION"), "
##"),
	);

	// Tools.
	if let Some(v) = reader.drive() {
		let _res = writeln!(&mut handle, "## Drive:  {v}");
	}
	if let Some(v) = reader.version() {
		let _res = writeln!(&mut handle, "## Reader: {v}");
	}

	// Everything else!
	let _res = writeln!(
		&mut handle,
		"## Disc:   {disc}
## Offset: {offset}
## Date:   {date}
##
## Each read is logged on its own line, with the following fields
## separated by two spaces:
##   * Track Number    [2 digits]
##   * Attempt Number
##   * Kind            [TEST, COPY, or ENCODE]
##   * CRC32           [8 hex digits]
##   * Read Quality
##   * Elapsed Time
#####",
		disc=table.to_cdtoc().unwrap_or_default(),
		offset=opts.offset(),
		date=FmtUtc2k::now(),
	);

	let _res = handle.flush();
}

/// # Rip Summary.
///
/// Summarize the chosen settings before proceeding.
fn rip_summary(table: &Table, opts: &RipOptions, out: &OutputDir) {
	let tracks: Vec<String> = opts.tracks()
		.filter(|&t| t == 0 || table.track(t).is_some_and(veririp_core::Track::is_audio))
		.map(|t| if t == 0 { "HTOA".to_owned() } else { t.to_string() })
		.collect();

	let set = [
		("Tracks:", if tracks.is_empty() { "All".to_owned() } else { tracks.oxford_and().into_owned() }),
		("Read Offset:", opts.offset().to_string()),
		("Resume:", if opts.resume() { "Yes" } else { "No" }.to_owned()),
		("Unknown Discs:", if opts.unknown() { "Accept" } else { "Reject" }.to_owned()),
		("Destination:", out.root().display().to_string()),
	];
	let max_label = set.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

	eprintln!("\x1b[1;38;5;199mVeririp…\x1b[0m");
	for (k, v) in set {
		eprintln!("  {k:max_label$} \x1b[1m{v}\x1b[0m");
	}
	eprintln!();
}
