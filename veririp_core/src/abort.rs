/*!
# Veririp: Kill Switch
*/

use std::sync::{
	Arc,
	atomic::{
		AtomicBool,
		Ordering::{
			Acquire,
			Release,
		},
	},
};



#[derive(Debug, Clone, Default)]
/// # Kill Switch.
///
/// This is a short-circuit for long-running operations. Clones share the same
/// underlying flag, so the binary can hand one to its CTRL-C handler and
/// another to the [`Ripper`](crate::Ripper).
///
/// Readers check it while waiting on their child process, terminating it
/// early if it has been flipped.
pub struct KillSwitch(Arc<AtomicBool>);

impl KillSwitch {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	/// # Kill!
	pub fn kill(&self) { self.0.store(true, Release); }

	#[must_use]
	/// # Dead?
	pub fn killed(&self) -> bool { self.0.load(Acquire) }
}
