use std::io::Write;

use crate::errors::PickleError;
use crate::ser::{Job, PickleState};

/// The trailer scheduler: deferred bodies run LIFO as soon as the
/// outermost scope exits, then the static-field closures in registration
/// order. Body closures may push further work of either kind.
impl<'p, W: Write> PickleState<'p, W> {
	/// Deferred body emission, run after the current object tree.
	pub fn push_trailer(&mut self, job: Job<'p, W>) {
		debug_assert!(self.depth > 0, "trailer pushed outside any scope");
		self.trailers.push(job);
	}

	/// Deferred static-field emission, run after the entire graph.
	pub fn push_static(&mut self, job: Job<'p, W>) {
		debug_assert!(self.depth > 0, "static job pushed outside any scope");
		self.statics.push_back(job);
	}

	/// Wraps work that may emit cyclic definitions. On depth-zero exit the
	/// deferred stacks are drained to exhaustion.
	pub fn with_scope(&mut self, f: impl FnOnce(&mut Self) -> Result<(), PickleError>) -> Result<(), PickleError> {
		self.depth += 1;
		let result = f(self);
		self.depth -= 1;
		result?;
		match self.depth {
			0 => self.drain(),
			_ => Ok(()),
		}
	}

	fn drain(&mut self) -> Result<(), PickleError> {
		loop {
			let job = match self.trailers.pop() {
				Some(job) => job,
				None => match self.statics.pop_front() {
					Some(job) => job,
					None => return Ok(()),
				},
			};
			// Jobs may push further deferred work; keep the depth non-zero
			// so those pushes land back on the stacks being drained.
			self.depth += 1;
			let result = job(self);
			self.depth -= 1;
			result?;
		}
	}
}
