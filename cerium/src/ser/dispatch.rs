use std::io::{Error, ErrorKind, Write};
use std::sync::Arc;

use crate::errors::PickleError;
use crate::reflection::{Ty, WellKnownType};
use crate::ser::info::{self, InfoKind, TypeInfo};
use crate::ser::{reducers, walker, PickleState};
use crate::values::{ArrayValue, Value};
use crate::wire::ops::ObjectOp;

const OBJECT: Ty = Ty::WellKnown(WellKnownType::Object);

/// Bulk-copied primitive arrays are flushed in chunks of this size.
const BULK_CHUNK: usize = 4096;

/// Top-level type-driven routing for one value against its static type.
///
/// The order is fixed: classification, static-type sanitization, nullable
/// unwrap, inline path for value-type statics, null, memo, tag, memo
/// registration, optional runtime-type prefix, body.
pub(crate) fn serialize_value<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	value: &Value,
	static_ty: &Ty,
) -> Result<(), PickleError> {
	let static_info = state.infos.ensure(state.pickler, static_ty);
	static_info.check(static_ty)?;

	// A concrete type standing in for a reflection root is not a stable
	// static context: readers rebuild entities against the roots only.
	if let Ty::Def(def) | Ty::Generic { def, .. } = static_ty.root_element() {
		if def.inherits_reflection_root() {
			return Err(PickleError::UnstableStaticType(static_ty.to_string()));
		}
	}

	if let Ty::Nullable(inner) = static_ty {
		return match value {
			Value::Null => Ok(state.out.write_u8(0)?),
			_ => {
				state.out.write_u8(1)?;
				serialize_value(state, value, inner)
			}
		};
	}

	// A value-type static context pins the runtime type: no operation tag,
	// no memo, no runtime-type prefix.
	if static_info.is_value_type() {
		return write_value_body(state, value, static_ty, &static_info);
	}

	if let Value::Null = value {
		return Ok(ObjectOp::Null.write(&mut state.out)?);
	}

	// Reflection entities run their own memo protocol inside the walker.
	if value.is_reflection_entity() {
		ObjectOp::Object.write(&mut state.out)?;
		if !elides_runtime_type(static_ty) {
			info::write_type_with_info(state, &value.runtime_type())?;
		}
		return write_reflection_body(state, value);
	}

	let runtime_ty = value.runtime_type();
	let runtime_info = state.infos.ensure(state.pickler, &runtime_ty);
	runtime_info.check(&runtime_ty)?;

	let identity = match runtime_info.is_value_type() {
		true => None,
		false => value.identity(),
	};
	if let Some(id) = identity {
		if let Some(position) = state.memo.get(id) {
			ObjectOp::Memo.write(&mut state.out)?;
			return Ok(state.out.write_v15(position)?);
		}
	}

	let position = state.out.position();
	ObjectOp::Object.write(&mut state.out)?;
	if let Some(id) = identity {
		// Registered before the contents so children referring back to
		// this object resolve to a back reference.
		state.memo.record(id, position);
	}

	if !elides_runtime_type(static_ty) {
		info::write_type_with_info(state, &runtime_ty)?;
	}
	write_value_body(state, value, &runtime_ty, &runtime_info)
}

/// The runtime-type prefix is skipped when the static type cannot be
/// extended: its root element is sealed or a value type.
fn elides_runtime_type(static_ty: &Ty) -> bool {
	let root = static_ty.root_element();
	root.is_sealed() || root.is_value_type()
}

fn type_mismatch(value: &Value, ty: &Ty) -> PickleError {
	PickleError::IoError(Error::new(
		ErrorKind::InvalidData,
		format!("value {value:?} does not inhabit `{ty}`"),
	))
}

fn write_value_body<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	value: &Value,
	runtime_ty: &Ty,
	info: &TypeInfo,
) -> Result<(), PickleError> {
	match value {
		Value::Bool(v) => Ok(state.out.write_bool(*v)?),
		Value::Char(v) => Ok(state.out.write_u32(*v as u32)?),
		Value::I8(v) => Ok(state.out.write_i8(*v)?),
		Value::U8(v) => Ok(state.out.write_u8(*v)?),
		Value::I16(v) => Ok(state.out.write_i16(*v)?),
		Value::U16(v) => Ok(state.out.write_u16(*v)?),
		Value::I32(v) => Ok(state.out.write_i32(*v)?),
		Value::U32(v) => Ok(state.out.write_u32(*v)?),
		Value::I64(v) => Ok(state.out.write_i64(*v)?),
		Value::U64(v) => Ok(state.out.write_u64(*v)?),
		Value::F32(v) => Ok(state.out.write_f32(*v)?),
		Value::F64(v) => Ok(state.out.write_f64(*v)?),
		Value::Decimal(v) => Ok(state.out.write_i128(*v)?),
		Value::DateTime(v) => Ok(state.out.write_i64(*v)?),
		Value::Str(v) => Ok(state.out.write_str(v)?),

		Value::Enum { value: raw, .. } => match &info.kind {
			InfoKind::Enum(code) => Ok(code.write_raw(&mut state.out, *raw)?),
			_ => Err(type_mismatch(value, runtime_ty)),
		},

		Value::Array(array) => write_array(state, array),

		Value::Tuple(tuple) => {
			let item_types = match runtime_ty {
				Ty::Tuple { items, .. } => items.clone(),
				_ => return Err(type_mismatch(value, runtime_ty)),
			};
			// Slots are dispatched one by one; a slot referring back to
			// the tuple itself resolves through the memo registered before
			// this body started.
			for (item, item_ty) in tuple.items().iter().zip(item_types.iter()) {
				serialize_value(state, item, item_ty)?;
			}
			Ok(())
		}

		Value::Delegate(delegate) => {
			let invocations = delegate.invocations();
			state.out.write_len(invocations.len())?;
			for entry in invocations {
				walker::write_method(state, &entry.method)?;
				serialize_value(state, &entry.target, &OBJECT)?;
			}
			Ok(())
		}

		Value::Object(object) => match &info.kind {
			InfoKind::Reduced(reducer) => {
				let reducer = reducer.clone();
				reducers::write_reduction(state, &reducer, value, runtime_ty)
			}
			InfoKind::Custom => {
				let entries = object.entries();
				state.out.write_len(entries.len())?;
				for (name, entry) in &entries {
					state.out.write_str(name)?;
					serialize_value(state, entry, &OBJECT)?;
				}
				Ok(())
			}
			InfoKind::Object(fields) => {
				for field in fields.iter().filter(|f| !f.is_static()) {
					let slot = object.get(field.name()).ok_or_else(|| {
						PickleError::MissingField(format!("{}::{}", runtime_ty, field.name()))
					})?;
					serialize_value(state, &slot, field.ty())?;
				}
				Ok(())
			}
			// A bare `object` instance carries nothing beyond its tag.
			InfoKind::Builtin => Ok(()),
			_ => Err(type_mismatch(value, runtime_ty)),
		},

		Value::Null => Err(type_mismatch(value, runtime_ty)),
		_ => write_reflection_body(state, value),
	}
}

fn write_reflection_body<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	value: &Value,
) -> Result<(), PickleError> {
	match value {
		Value::Type(ty) => walker::write_type(state, ty),
		Value::Assembly(assembly) => walker::write_assembly(state, assembly),
		Value::Module(module) => walker::write_module(state, module),
		Value::Field(field) => walker::write_field(state, field),
		Value::Method(method) => walker::write_method(state, method),
		Value::Property(property) => walker::write_property(state, property),
		Value::Event(event) => walker::write_event(state, event),
		_ => Err(type_mismatch(value, &OBJECT)),
	}
}

fn write_array<'p, W: Write>(state: &mut PickleState<'p, W>, array: &Arc<ArrayValue>) -> Result<(), PickleError> {
	match array.is_single_dimension() {
		true => state.out.write_len(array.lengths()[0])?,
		false => {
			for (length, lower_bound) in array.lengths().iter().zip(array.lower_bounds()) {
				state.out.write_len(*length)?;
				state.out.write_v7_signed(*lower_bound)?;
			}
		}
	}

	if let Ty::WellKnown(wk) = array.element() {
		if let Some(width) = wk.bulk_width() {
			return write_bulk_elements(state, array, *wk, width);
		}
	}

	let element_ty = array.element().clone();
	for item in array.items() {
		serialize_value(state, &item, &element_ty)?;
	}
	Ok(())
}

/// Primitive elements go out as raw little-endian bytes, flushed in 4 KiB
/// chunks so the transient buffer stays bounded.
fn write_bulk_elements<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	array: &Arc<ArrayValue>,
	element: WellKnownType,
	width: usize,
) -> Result<(), PickleError> {
	let mut chunk = Vec::with_capacity(BULK_CHUNK);
	for item in array.items() {
		let matches = push_primitive(&mut chunk, &item, element);
		if !matches {
			return Err(type_mismatch(&item, array.element()));
		}
		if chunk.len() + width > BULK_CHUNK {
			state.out.write_raw(&chunk)?;
			chunk.clear();
		}
	}
	if !chunk.is_empty() {
		state.out.write_raw(&chunk)?;
	}
	Ok(())
}

fn push_primitive(chunk: &mut Vec<u8>, value: &Value, element: WellKnownType) -> bool {
	match (element, value) {
		(WellKnownType::Bool, Value::Bool(v)) => chunk.push(*v as u8),
		(WellKnownType::Char, Value::Char(v)) => chunk.extend_from_slice(&(*v as u32).to_le_bytes()),
		(WellKnownType::Int8, Value::I8(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::UInt8, Value::U8(v)) => chunk.push(*v),
		(WellKnownType::Int16, Value::I16(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::UInt16, Value::U16(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::Int32, Value::I32(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::UInt32, Value::U32(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::Int64, Value::I64(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::UInt64, Value::U64(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::Float, Value::F32(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::Double, Value::F64(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::DateTime, Value::DateTime(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		(WellKnownType::Decimal, Value::Decimal(v)) => chunk.extend_from_slice(&v.to_le_bytes()),
		_ => return false,
	}
	true
}
