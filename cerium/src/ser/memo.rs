use std::collections::HashMap;

use nohash_hasher::BuildNoHashHasher;

/// Offset value never produced by a real emission; reserved for readers
/// that pre-size their memo arrays.
pub const EMPTY_OFFSET: u64 = u64::MAX;

/// Identity-keyed map from heap object to the stream position of its first
/// emission. Keys are allocation addresses, already uniformly distributed,
/// so the integer pass-through hasher applies.
#[derive(Debug, Default)]
pub struct MemoTable {
	positions: HashMap<usize, u64, BuildNoHashHasher<usize>>,
}

impl MemoTable {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn get(&self, identity: usize) -> Option<u64> {
		self.positions.get(&identity).copied()
	}

	/// Records the position of a first emission. Double-recording the same
	/// identity within one run is a protocol violation.
	#[inline]
	pub fn record(&mut self, identity: usize, position: u64) {
		debug_assert_ne!(position, EMPTY_OFFSET);
		let previous = self.positions.insert(identity, position);
		debug_assert!(previous.is_none(), "identity {identity:#X} memoized twice");
	}

	pub fn len(&self) -> usize {
		self.positions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_and_finds_identities() {
		let mut memo = MemoTable::new();
		assert_eq!(memo.get(0x1000), None);
		memo.record(0x1000, 42);
		memo.record(0x2000, 77);
		assert_eq!(memo.get(0x1000), Some(42));
		assert_eq!(memo.get(0x2000), Some(77));
		assert_eq!(memo.len(), 2);
	}

	#[test]
	#[should_panic]
	fn double_record_is_rejected_in_debug() {
		let mut memo = MemoTable::new();
		memo.record(0x1000, 1);
		memo.record(0x1000, 2);
	}
}
