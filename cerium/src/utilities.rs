use std::fmt::Formatter;
use std::sync::Arc;

/// Address-based identity of a reference-counted node. Two `Arc`s compare
/// equal here exactly when they point at the same allocation.
#[inline]
pub(crate) fn arc_id<T: ?Sized>(arc: &Arc<T>) -> usize {
	Arc::as_ptr(arc).cast::<()>() as usize
}

pub(crate) fn fmt_blob_len(bytes: &[u8], f: &mut Formatter) -> std::fmt::Result {
	write!(f, "[{} bytes]", bytes.len())
}

pub(crate) fn fmt_opt_blob_len(bytes: &Option<Vec<u8>>, f: &mut Formatter) -> std::fmt::Result {
	match bytes {
		None => write!(f, "None"),
		Some(bytes) => fmt_blob_len(bytes, f),
	}
}
