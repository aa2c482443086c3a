use std::io::Write;

use crate::errors::PickleError;
use crate::reflection::{
	AttrValue, CustomAttribute, EnumCode, Ty, TypeDefKind, NAMED_ARG_FIELD, NAMED_ARG_PROPERTY,
};
use crate::ser::{walker, PickleState};

/// Writes one entity's custom-attribute table: for each attribute the
/// attribute type, the constructor, the positional arguments, then the
/// named field and property arguments.
pub(crate) fn write_custom_attributes<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	attrs: &[CustomAttribute],
) -> Result<(), PickleError> {
	state.out.write_len(attrs.len())?;
	for attr in attrs {
		let attribute_type = attr
			.attribute_type()
			.ok_or_else(|| PickleError::DetachedMember(format!("constructor of `{}`", attr.ctor)))?;
		walker::write_type(state, &attribute_type)?;
		walker::write_method(state, &attr.ctor)?;

		state.out.write_len(attr.fixed_args.len())?;
		for value in &attr.fixed_args {
			write_attr_value(state, value)?;
		}

		state.out.write_len(attr.named_fields.len())?;
		for (name, value) in &attr.named_fields {
			write_named_arg(state, NAMED_ARG_FIELD, name, value)?;
		}
		state.out.write_len(attr.named_properties.len())?;
		for (name, value) in &attr.named_properties {
			write_named_arg(state, NAMED_ARG_PROPERTY, name, value)?;
		}
	}
	Ok(())
}

/// Named arguments lead with the member tag, the declared value tag and
/// the member name, so the reader can bind the member without consulting
/// the constructor.
fn write_named_arg<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	member_tag: u8,
	name: &str,
	value: &AttrValue,
) -> Result<(), PickleError> {
	state.out.write_u8(member_tag)?;
	state.out.write_u8(value.code())?;
	state.out.write_str(name)?;
	write_attr_payload(state, value)
}

fn write_attr_value<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	value: &AttrValue,
) -> Result<(), PickleError> {
	state.out.write_u8(value.code())?;
	write_attr_payload(state, value)
}

fn write_attr_payload<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	value: &AttrValue,
) -> Result<(), PickleError> {
	match value {
		AttrValue::Bool(v) => Ok(state.out.write_bool(*v)?),
		AttrValue::Char(v) => Ok(state.out.write_u32(*v as u32)?),
		AttrValue::I8(v) => Ok(state.out.write_i8(*v)?),
		AttrValue::U8(v) => Ok(state.out.write_u8(*v)?),
		AttrValue::I16(v) => Ok(state.out.write_i16(*v)?),
		AttrValue::U16(v) => Ok(state.out.write_u16(*v)?),
		AttrValue::I32(v) => Ok(state.out.write_i32(*v)?),
		AttrValue::U32(v) => Ok(state.out.write_u32(*v)?),
		AttrValue::I64(v) => Ok(state.out.write_i64(*v)?),
		AttrValue::U64(v) => Ok(state.out.write_u64(*v)?),
		AttrValue::F32(v) => Ok(state.out.write_f32(*v)?),
		AttrValue::F64(v) => Ok(state.out.write_f64(*v)?),
		AttrValue::Str(v) => Ok(state.out.write_opt_str(v.as_deref())?),
		AttrValue::Type(ty) => {
			// Only closed concrete types can cross as attribute literals.
			match ty {
				Ty::TypeParam { .. } | Ty::MethodParam { .. } | Ty::Pointer(_) | Ty::ByRef(_) => {
					Err(PickleError::UnserializableNonRuntimeReflection(ty.to_string()))
				}
				_ => walker::write_type(state, ty),
			}
		}
		AttrValue::Enum { ty, value } => {
			walker::write_type(state, ty)?;
			let code = match ty {
				Ty::Def(def) => match def.kind() {
					TypeDefKind::Enum { underlying, .. } => EnumCode::from_well_known(*underlying),
					_ => None,
				},
				_ => None,
			};
			let code = code.ok_or_else(|| PickleError::InvalidEnumUnderlying(ty.to_string()))?;
			Ok(code.write_raw(&mut state.out, *value)?)
		}
		AttrValue::Array { element, items } => {
			walker::write_type(state, element)?;
			match items {
				None => Ok(state.out.write_u8(0)?),
				Some(items) => {
					state.out.write_u8(1)?;
					state.out.write_len(items.len())?;
					for item in items {
						write_attr_value(state, item)?;
					}
					Ok(())
				}
			}
		}
		AttrValue::Boxed(inner) => write_attr_value(state, inner),
	}
}
