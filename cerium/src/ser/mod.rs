use std::io::Write;
use std::sync::Arc;

use crate::errors::PickleError;
use crate::reflection::{Assembly, MethodDef, Ty, TypeDef};
use crate::values::Value;
use crate::wire::{PickleWriter, FORMAT_MAJOR, FORMAT_MINOR, MAGIC, MODEL_MAJOR, MODEL_MINOR};

pub(crate) mod attributes;
pub(crate) mod body;
pub(crate) mod dispatch;
pub(crate) mod info;
mod memo;
mod reducers;
mod trailer;
pub(crate) mod walker;

pub use memo::{MemoTable, EMPTY_OFFSET};
pub use reducers::{Factory, Reducer, ReducerRegistry, Reduction};

/// How an assembly is pickled: as a full redefinition or as a name
/// reference resolvable at the consumer.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum AssemblyPickleMode {
	ByValue,
	ByReference,
	/// By value exactly when the assembly is dynamic or location-less.
	#[default]
	Default,
}

/// The serializer. One instance may run many graphs, one at a time; each
/// run gets fresh per-run state.
pub struct Pickler {
	assembly_mode: Box<dyn Fn(&Assembly) -> AssemblyPickleMode>,
	reducers: ReducerRegistry,
}

impl Pickler {
	pub fn new() -> Self {
		Self {
			assembly_mode: Box::new(|_| AssemblyPickleMode::Default),
			reducers: ReducerRegistry::default(),
		}
	}

	/// Installs the per-assembly ref-vs-def policy.
	pub fn set_assembly_mode(&mut self, mode: impl Fn(&Assembly) -> AssemblyPickleMode + 'static) {
		self.assembly_mode = Box::new(mode);
	}

	pub fn reducers(&self) -> &ReducerRegistry {
		&self.reducers
	}

	pub fn reducers_mut(&mut self) -> &mut ReducerRegistry {
		&mut self.reducers
	}

	/// Resolves the policy for one assembly. The standard library is always
	/// by reference regardless of the installed policy.
	pub(crate) fn assembly_by_value(&self, assembly: &Assembly) -> bool {
		if assembly.is_corlib() {
			return false;
		}
		match (self.assembly_mode)(assembly) {
			AssemblyPickleMode::ByValue => true,
			AssemblyPickleMode::ByReference => false,
			AssemblyPickleMode::Default => assembly.is_dynamic() || assembly.location().is_none(),
		}
	}

	/// Writes the preamble, then `value` and everything reachable from it.
	#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
	pub fn serialize<W: Write>(&self, out: W, value: &Value, static_ty: &Ty) -> Result<W, PickleError> {
		let mut state = PickleState::new(self, out);
		state.out.write_raw(&MAGIC)?;
		state.out.write_v7(FORMAT_MAJOR as u64)?;
		state.out.write_v7(FORMAT_MINOR as u64)?;
		state.out.write_v7(MODEL_MAJOR as u64)?;
		state.out.write_v7(MODEL_MINOR as u64)?;
		state.with_scope(|state| dispatch::serialize_value(state, value, static_ty))?;
		state.finish()
	}

	pub fn serialize_to_vec(&self, value: &Value, static_ty: &Ty) -> Result<Vec<u8>, PickleError> {
		self.serialize(Vec::new(), value, static_ty)
	}
}

impl Default for Pickler {
	fn default() -> Self {
		Self::new()
	}
}

/// Generic-parameter binding in scope while a definition is being written.
/// Occurrences of the owners' parameters collapse to `TVar`/`MVar`.
#[derive(Default, Clone)]
pub(crate) struct GenericContext {
	pub ty: Option<Arc<TypeDef>>,
	pub method: Option<Arc<MethodDef>>,
}

pub(crate) type Job<'p, W> = Box<dyn FnOnce(&mut PickleState<'p, W>) -> Result<(), PickleError> + 'p>;

/// All mutable state of one serialization run.
pub(crate) struct PickleState<'p, W: Write> {
	pub pickler: &'p Pickler,
	pub out: PickleWriter<W>,
	pub memo: MemoTable,
	pub infos: info::InfoCache,
	pub(crate) trailers: Vec<Job<'p, W>>,
	pub(crate) statics: std::collections::VecDeque<Job<'p, W>>,
	pub(crate) depth: u32,
	pub(crate) context: GenericContext,
}

impl<'p, W: Write> PickleState<'p, W> {
	fn new(pickler: &'p Pickler, out: W) -> Self {
		Self {
			pickler,
			out: PickleWriter::new(out),
			memo: MemoTable::new(),
			infos: info::InfoCache::default(),
			trailers: Vec::new(),
			statics: std::collections::VecDeque::new(),
			depth: 0,
			context: GenericContext::default(),
		}
	}

	/// Runs `f` with the generic context bound to `context`, restoring the
	/// previous binding afterwards.
	pub fn with_context<T>(
		&mut self,
		context: GenericContext,
		f: impl FnOnce(&mut Self) -> Result<T, PickleError>,
	) -> Result<T, PickleError> {
		let saved = std::mem::replace(&mut self.context, context);
		let result = f(self);
		self.context = saved;
		result
	}

	fn finish(self) -> Result<W, PickleError> {
		match self.trailers.is_empty() && self.statics.is_empty() {
			true => Ok(self.out.into_inner()),
			false => Err(PickleError::UnterminatedTrailer),
		}
	}
}
