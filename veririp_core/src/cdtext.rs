/*!
# Veririp: CD-Text.
*/

use serde::{
	Deserialize,
	Serialize,
};
use std::fmt;



/// # Helper: CD-Text Fields.
macro_rules! fields {
	( $( $k:ident $vstr:literal $cue:literal ),+ $(,)? ) => (
		#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
		/// # CD-Text Field.
		///
		/// The closed set of disc/track metadata fields the table carries.
		pub enum CdTextKind {
			$(
				#[doc = concat!("# ", stringify!($k), ".")]
				$k,
			)+
		}

		impl CdTextKind {
			/// # All Fields.
			pub const ALL: &'static [Self] = &[ $( Self::$k, )+ ];

			#[must_use]
			/// # As Str.
			///
			/// Return the field as an uppercase string, similar to how it would
			/// appear in track metadata.
			pub const fn as_str(self) -> &'static str {
				match self {
					$( Self::$k => $vstr, )+
				}
			}

			#[must_use]
			/// # Cue Command?
			///
			/// Returns `true` if the field has a first-class cue sheet command.
			/// The rest have to be written as `REM` lines.
			pub const fn is_cue_command(self) -> bool {
				match self {
					$( Self::$k => $cue, )+
				}
			}
		}
	);
}

fields! {
	Arranger   "ARRANGER"   false,
	Barcode    "UPC_EAN"    false,
	Composer   "COMPOSER"   false,
	Isrc       "ISRC"       false,
	Message    "MESSAGE"    false,
	Performer  "PERFORMER"  true,
	Songwriter "SONGWRITER" true,
	Title      "TITLE"      true,
}

impl AsRef<str> for CdTextKind {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl fmt::Display for CdTextKind {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		<str as fmt::Display>::fmt(self.as_str(), f)
	}
}

impl CdTextKind {
	/// # Cue Line.
	///
	/// Format a `KEY "value"` line for a cue sheet, quoting the value and
	/// prefixing non-command fields with `REM`.
	pub(crate) fn cue_line(self, value: &str) -> String {
		let value = value.replace('"', "'");
		if self.is_cue_command() { format!("{} \"{value}\"", self.as_str()) }
		else { format!("REM {} \"{value}\"", self.as_str()) }
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_cue_line() {
		assert_eq!(
			CdTextKind::Title.cue_line("Magic"),
			r#"TITLE "Magic""#,
		);
		assert_eq!(
			CdTextKind::Composer.cue_line("Pip \"Ladyhawke\" Brown"),
			r#"REM COMPOSER "Pip 'Ladyhawke' Brown""#,
		);
	}

	#[test]
	fn t_all() {
		let mut all = CdTextKind::ALL.to_vec();
		all.dedup();
		assert_eq!(all.len(), 8, "Fields were duplicated or lost.");
		assert!(all.windows(2).all(|w| w[0] < w[1]), "Fields should be sorted.");
	}
}
