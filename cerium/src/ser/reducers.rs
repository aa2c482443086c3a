use std::fmt::Debug;
use std::io::Write;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::errors::PickleError;
use crate::reflection::{MethodDef, Ty};
use crate::ser::{dispatch, walker, PickleState};
use crate::values::Value;

/// How the reader reassembles a reduced object.
#[derive(Debug, Clone)]
pub enum Factory {
	Constructor(Arc<MethodDef>),
	Method(Arc<MethodDef>),
}

/// The `(factory, receiver, arguments)` triple a reducer extracts from an
/// opaque object.
#[derive(Debug, Clone)]
pub struct Reduction {
	pub factory: Factory,
	pub receiver: Option<Value>,
	pub args: Vec<Value>,
}

/// User-registered disassembler for container-like types.
pub trait Reducer {
	fn reduce(&self, value: &Value) -> Result<Reduction, PickleError>;
}

/// Registry mapping a type, or its generic definition, to a reducer.
/// Lookup tries the concrete type first, then the open definition.
#[derive(Default)]
pub struct ReducerRegistry {
	by_type: FxHashMap<Ty, Arc<dyn Reducer>>,
}

impl ReducerRegistry {
	pub fn register(&mut self, ty: Ty, reducer: Arc<dyn Reducer>) {
		self.by_type.insert(ty, reducer);
	}

	pub fn find(&self, ty: &Ty) -> Option<Arc<dyn Reducer>> {
		if let Some(reducer) = self.by_type.get(ty) {
			return Some(reducer.clone());
		}
		match ty {
			Ty::Generic { def, .. } => self.by_type.get(&Ty::Def(def.clone())).cloned(),
			_ => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.by_type.is_empty()
	}
}

impl Debug for ReducerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "ReducerRegistry({} entries)", self.by_type.len())
	}
}

fn validate(reduction: &Reduction, target: &Ty) -> Result<(), PickleError> {
	match &reduction.factory {
		Factory::Constructor(ctor) => {
			if !ctor.is_ctor() {
				return Err(PickleError::InvalidReduction(format!(
					"`{ctor}` was presented as a constructor factory but is a plain method",
				)));
			}
			if reduction.receiver.is_some() {
				return Err(PickleError::InvalidReduction(format!(
					"constructor factory `{ctor}` cannot take a receiver",
				)));
			}
			let declares_target = match (ctor.declaring_type(), target) {
				(Some(declaring), Ty::Def(def)) => Arc::ptr_eq(&declaring, def),
				(Some(declaring), Ty::Generic { def, .. }) => Arc::ptr_eq(&declaring, def),
				_ => false,
			};
			match declares_target {
				true => Ok(()),
				false => Err(PickleError::InvalidReduction(format!(
					"constructor `{ctor}` does not declare `{target}`",
				))),
			}
		}
		Factory::Method(method) => {
			if method.is_ctor() {
				return Err(PickleError::InvalidReduction(format!(
					"`{method}` was presented as a method factory but is a constructor",
				)));
			}
			if method.is_static() == reduction.receiver.is_some() {
				return Err(PickleError::InvalidReduction(format!(
					"receiver presence does not match the staticness of `{method}`",
				)));
			}
			match method.return_ty() == target {
				true => Ok(()),
				false => Err(PickleError::InvalidReduction(format!(
					"`{method}` returns `{}`, not the reduced type `{target}`",
					method.return_ty(),
				))),
			}
		}
	}
}

/// Writes a reduced object as `(factory, receiver-if-instance, args)`.
pub(crate) fn write_reduction<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	reducer: &Arc<dyn Reducer>,
	value: &Value,
	target: &Ty,
) -> Result<(), PickleError> {
	let reduction = reducer.reduce(value)?;
	validate(&reduction, target)?;

	let object = Ty::WellKnown(crate::reflection::WellKnownType::Object);
	let method = match &reduction.factory {
		Factory::Constructor(ctor) => {
			state.out.write_u8(0)?;
			ctor
		}
		Factory::Method(method) => {
			state.out.write_u8(1)?;
			method
		}
	};
	walker::write_method(state, method)?;

	match &reduction.receiver {
		None => state.out.write_u8(0)?,
		Some(receiver) => {
			state.out.write_u8(1)?;
			dispatch::serialize_value(state, receiver, &object)?;
		}
	}

	state.out.write_len(reduction.args.len())?;
	for arg in &reduction.args {
		dispatch::serialize_value(state, arg, &object)?;
	}
	Ok(())
}
