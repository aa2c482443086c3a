use std::io::Write;
use std::sync::Arc;

use crate::errors::PickleError;
use crate::reflection::{
	Assembly, Constant, EnumCode, EventDef, FieldDef, Member, MethodDef, Module, PropertyDef, Ty,
	TypeDef, TypeDefKind, WellKnownType,
};
use crate::ser::{attributes, body, dispatch, GenericContext, PickleState};
use crate::signature::Signature;
use crate::utilities::arc_id;
use crate::wire::ops::{AssemblyOp, ModuleOp, ObjectOp, TypeOp};

fn detached(what: impl ToString) -> PickleError {
	PickleError::DetachedMember(what.to_string())
}

/// Writes an assembly as its well-known token, a memo back-reference, a
/// name reference or a full definition, per the per-assembly policy.
pub(crate) fn write_assembly<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	assembly: &Arc<Assembly>,
) -> Result<(), PickleError> {
	if assembly.is_corlib() {
		return Ok(AssemblyOp::MscorlibAssembly.write(&mut state.out)?);
	}

	let id = arc_id(assembly);
	if let Some(position) = state.memo.get(id) {
		AssemblyOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let position = state.out.position();
	match state.pickler.assembly_by_value(assembly) {
		false => {
			AssemblyOp::AssemblyRef.write(&mut state.out)?;
			state.memo.record(id, position);
			state.out.write_str(&assembly.full_name())?;
		}
		true => {
			AssemblyOp::AssemblyDef.write(&mut state.out)?;
			state.memo.record(id, position);
			state.out.write_str(&assembly.full_name())?;
			let subject = assembly.clone();
			state.push_trailer(Box::new(move |state| {
				attributes::write_custom_attributes(state, &subject.custom_attributes())
			}));
		}
	}
	Ok(())
}

#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub(crate) fn write_module<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	module: &Arc<Module>,
) -> Result<(), PickleError> {
	let assembly = module.assembly().ok_or_else(|| detached(module))?;
	if assembly.is_corlib() && module.is_manifest() {
		return Ok(ModuleOp::MscorlibModule.write(&mut state.out)?);
	}

	let id = arc_id(module);
	if let Some(position) = state.memo.get(id) {
		ModuleOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let position = state.out.position();
	match state.pickler.assembly_by_value(&assembly) {
		false if module.is_manifest() => {
			ModuleOp::ManifestModuleRef.write(&mut state.out)?;
			state.memo.record(id, position);
			write_assembly(state, &assembly)?;
		}
		false => {
			ModuleOp::ModuleRef.write(&mut state.out)?;
			state.memo.record(id, position);
			state.out.write_str(module.name())?;
			write_assembly(state, &assembly)?;
		}
		true => {
			ModuleOp::ModuleDef.write(&mut state.out)?;
			state.memo.record(id, position);
			state.out.write_str(module.name())?;
			state.out.write_raw(module.mvid().as_bytes())?;
			write_assembly(state, &assembly)?;

			let fields = module.global_fields();
			state.out.write_len(fields.len())?;
			for field in &fields {
				state.out.write_str(field.name())?;
				write_rva_blob(state, field.rva_data().unwrap_or(&[]))?;
			}

			let methods = module.global_methods();
			state.out.write_len(methods.len())?;
			for method in &methods {
				write_method_header(state, method)?;
			}

			let subject = module.clone();
			state.push_trailer(Box::new(move |state| {
				for method in subject.global_methods() {
					if method.can_have_body() {
						body::write_body_code(state, &method)?;
					}
				}
				attributes::write_custom_attributes(state, &subject.custom_attributes())
			}));
		}
	}
	Ok(())
}

/// Raw-value-area blob: signed length, with a negated length standing in
/// for that many zero bytes.
fn write_rva_blob<W: Write>(state: &mut PickleState<'_, W>, data: &[u8]) -> Result<(), PickleError> {
	match data.iter().all(|b| *b == 0) && !data.is_empty() {
		true => state.out.write_v7_signed(-(data.len() as i64))?,
		false => {
			state.out.write_v7_signed(data.len() as i64)?;
			state.out.write_raw(data)?;
		}
	}
	Ok(())
}

/// Writes a type in a reflection context: well-known token, structural
/// shape, or a named definition as ref/def/memo.
pub(crate) fn write_type<'p, W: Write>(state: &mut PickleState<'p, W>, ty: &Ty) -> Result<(), PickleError> {
	match ty {
		Ty::WellKnown(wk) => Ok(wk.type_op().write(&mut state.out)?),
		Ty::Nullable(element) => {
			TypeOp::Nullable.write(&mut state.out)?;
			write_type(state, element)
		}
		Ty::Tuple { boxed, items } => {
			match boxed {
				true => TypeOp::Tuple.write(&mut state.out)?,
				false => TypeOp::ValueTuple.write(&mut state.out)?,
			}
			state.out.write_len(items.len())?;
			for item in items {
				write_type(state, item)?;
			}
			Ok(())
		}
		Ty::Array { rank, element } => {
			if *rank > 255 {
				return Err(PickleError::UnsupportedRank(*rank));
			}
			TypeOp::ArrayType.write(&mut state.out)?;
			state.out.write_v7(*rank as u64)?;
			write_type(state, element)
		}
		Ty::ByRef(element) => {
			TypeOp::ByRef.write(&mut state.out)?;
			write_type(state, element)
		}
		Ty::Pointer(_) => Err(PickleError::UnserializablePointer(ty.to_string())),
		Ty::TypeParam { owner, position } => {
			let bound = state
				.context
				.ty
				.as_ref()
				.is_some_and(|ctx| Arc::ptr_eq(ctx, owner));
			match bound {
				true => {
					TypeOp::TVar.write(&mut state.out)?;
					Ok(state.out.write_v7(*position as u64)?)
				}
				false => {
					TypeOp::GenericTypeParameter.write(&mut state.out)?;
					state.out.write_v7(*position as u64)?;
					write_type(state, &Ty::Def(owner.clone()))
				}
			}
		}
		Ty::MethodParam { owner, position } => {
			let bound = state
				.context
				.method
				.as_ref()
				.is_some_and(|ctx| Arc::ptr_eq(ctx, owner));
			match bound {
				true => {
					TypeOp::MVar.write(&mut state.out)?;
					Ok(state.out.write_v7(*position as u64)?)
				}
				false => {
					TypeOp::GenericMethodParameter.write(&mut state.out)?;
					state.out.write_v7(*position as u64)?;
					write_method(state, owner)
				}
			}
		}
		Ty::Generic { def, args } => {
			TypeOp::GenericInstantiation.write(&mut state.out)?;
			write_type(state, &Ty::Def(def.clone()))?;
			state.out.write_len(args.len())?;
			for arg in args {
				write_type(state, arg)?;
			}
			Ok(())
		}
		Ty::Def(def) => write_type_def_or_ref(state, def),
	}
}

fn write_type_def_or_ref<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	def: &Arc<TypeDef>,
) -> Result<(), PickleError> {
	let id = arc_id(def);
	if let Some(position) = state.memo.get(id) {
		TypeOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let module = def.module().ok_or_else(|| detached(def))?;
	let assembly = module.assembly().ok_or_else(|| detached(&module))?;
	let position = state.out.position();

	match state.pickler.assembly_by_value(&assembly) {
		false => {
			TypeOp::TypeRef.write(&mut state.out)?;
			state.memo.record(id, position);
			let declaring = def.declaring_type();
			state.out.write_bool(declaring.is_some())?;
			state.out.write_str(def.name())?;
			state.out.write_str(def.namespace())?;
			match declaring {
				Some(declaring) => write_type(state, &Ty::Def(declaring)),
				None => write_module(state, &module),
			}
		}
		true => write_type_definition(state, def, &module, id, position),
	}
}

/// Full structural definition of a type. The memo is registered once the
/// header is out, so cycles through the kind body resolve to back
/// references; method bodies, attribute tables and static-field values are
/// deferred to the trailer.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
fn write_type_definition<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	def: &Arc<TypeDef>,
	module: &Arc<Module>,
	id: usize,
	position: u64,
) -> Result<(), PickleError> {
	TypeOp::TypeDef.write(&mut state.out)?;
	state.out.write_str(def.name())?;
	state.out.write_str(def.namespace())?;
	state.out.write_v7(def.attrs().bits() as u64)?;
	state.out.write_u8(def.kind().discriminant())?;

	state.out.write_len(def.generic_params().len())?;
	for param in def.generic_params() {
		state.out.write_str(param)?;
	}

	match def.declaring_type() {
		Some(declaring) => {
			state.out.write_u8(1)?;
			write_type(state, &Ty::Def(declaring))?;
		}
		None => {
			state.out.write_u8(0)?;
			write_module(state, module)?;
		}
	}

	state.memo.record(id, position);

	let context = GenericContext { ty: Some(def.clone()), method: None };
	state.with_context(context, |state| write_type_def_body(state, def))?;

	let subject = def.clone();
	state.push_trailer(Box::new(move |state| write_type_trailer(state, &subject)));
	let subject = def.clone();
	state.push_static(Box::new(move |state| write_type_statics(state, &subject)));
	Ok(())
}

fn write_type_def_body<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	def: &Arc<TypeDef>,
) -> Result<(), PickleError> {
	match def.kind() {
		TypeDefKind::Enum { underlying, variants } => {
			let code = EnumCode::from_well_known(*underlying)
				.ok_or_else(|| PickleError::InvalidEnumUnderlying(def.full_name()))?;
			state.out.write_u8(code as u8)?;
			state.out.write_len(variants.len())?;
			for (name, value) in variants {
				state.out.write_str(name)?;
				code.write_raw(&mut state.out, *value)?;
			}
			Ok(())
		}
		TypeDefKind::Delegate { invoke } => Ok(invoke.write(&mut state.out)?),
		TypeDefKind::Class | TypeDefKind::Struct | TypeDefKind::Interface => {
			write_composite_body(state, def)
		}
	}
}

fn write_composite_body<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	def: &Arc<TypeDef>,
) -> Result<(), PickleError> {
	// Value types and interfaces have no base slot on the wire.
	if !def.is_value_type() && !def.is_interface() {
		let base = def.base().unwrap_or(Ty::WellKnown(WellKnownType::Object));
		write_type(state, &base)?;
	}

	let overrides = def.overrides();
	let interfaces = def.interfaces();
	state.out.write_len(interfaces.len())?;
	for interface in &interfaces {
		write_type(state, interface)?;
		// Only the pairs a reader could not reconstruct by signature match:
		// the target lives on this type or replaces a slot, and its
		// signature is not the interface method's.
		let pairs: Vec<_> = overrides
			.iter()
			.filter(|(interface_method, target)| {
				let on_interface = match (interface_method.declaring_type(), interface) {
					(Some(declaring), Ty::Def(interface_def)) => Arc::ptr_eq(&declaring, interface_def),
					(Some(declaring), Ty::Generic { def: interface_def, .. }) => {
						Arc::ptr_eq(&declaring, interface_def)
					}
					_ => false,
				};
				if !on_interface {
					return false;
				}
				let relevant = target
					.declaring_type()
					.is_some_and(|declaring| Arc::ptr_eq(&declaring, def))
					|| target.attrs().contains(crate::reflection::MethodAttributes::NEW_SLOT);
				relevant && Signature::of_method(interface_method) != Signature::of_method(target)
			})
			.collect();
		state.out.write_len(pairs.len())?;
		for (interface_method, target) in pairs {
			Signature::of_method(interface_method).write(&mut state.out)?;
			Signature::of_method(target).write(&mut state.out)?;
		}
	}

	let fields = def.fields();
	state.out.write_len(fields.len())?;
	for field in &fields {
		state.out.write_str(field.name())?;
		state.out.write_v7(field.attrs().bits() as u64)?;
		write_type(state, field.ty())?;
		match field.constant() {
			Some(constant) if field.is_literal() => {
				state.out.write_u8(1)?;
				write_constant(state, constant, field.ty())?;
			}
			_ => state.out.write_u8(0)?,
		}
	}

	let ctors = def.ctors();
	state.out.write_len(ctors.len())?;
	for ctor in &ctors {
		write_method_header(state, ctor)?;
	}

	let methods = def.methods();
	state.out.write_len(methods.len())?;
	for method in &methods {
		write_method_header(state, method)?;
	}

	let properties = def.properties();
	state.out.write_len(properties.len())?;
	for property in &properties {
		write_property_row(state, property)?;
	}

	let events = def.events();
	state.out.write_len(events.len())?;
	for event in &events {
		write_event_row(state, event)?;
	}
	Ok(())
}

fn write_property_row<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	property: &Arc<PropertyDef>,
) -> Result<(), PickleError> {
	state.out.write_str(property.name())?;
	state.out.write_v7(property.attrs().bits() as u64)?;
	write_type(state, property.ty())?;
	state.out.write_len(property.index_params().len())?;
	for param in property.index_params() {
		write_type(state, param)?;
	}

	let getter = property.getter();
	let setter = property.setter();
	let others = property.others();
	// Low two bits flag getter/setter presence, the rest count the others.
	let packed = (others.len() as u64) << 2
		| (setter.is_some() as u64) << 1
		| getter.is_some() as u64;
	state.out.write_v7(packed)?;
	for accessor in getter.iter().chain(setter.iter()).chain(others.iter()) {
		Signature::of_method(accessor).write(&mut state.out)?;
	}
	Ok(())
}

fn write_event_row<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	event: &Arc<EventDef>,
) -> Result<(), PickleError> {
	state.out.write_str(event.name())?;
	state.out.write_v7(event.attrs().bits() as u64)?;
	write_type(state, event.handler_ty())?;

	let add = event.add_accessor().ok_or_else(|| detached(event))?;
	let remove = event.remove_accessor().ok_or_else(|| detached(event))?;
	let raise = event.raise_accessor();
	let others = event.others();
	// Low bit flags raiser presence, the rest count the others.
	let packed = (others.len() as u64) << 1 | raise.is_some() as u64;
	state.out.write_v7(packed)?;
	Signature::of_method(&add).write(&mut state.out)?;
	Signature::of_method(&remove).write(&mut state.out)?;
	if let Some(raise) = raise {
		Signature::of_method(&raise).write(&mut state.out)?;
	}
	for other in others {
		Signature::of_method(&other).write(&mut state.out)?;
	}
	Ok(())
}

/// Body-and-attributes trailer of a by-value type definition.
fn write_type_trailer<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	def: &Arc<TypeDef>,
) -> Result<(), PickleError> {
	for ctor in def.ctors() {
		if ctor.can_have_body() {
			let context = GenericContext { ty: Some(def.clone()), method: None };
			state.with_context(context, |state| body::write_body_code(state, &ctor))?;
		}
	}
	for method in def.methods() {
		if method.can_have_body() {
			let context = GenericContext { ty: Some(def.clone()), method: Some(method.clone()) };
			state.with_context(context, |state| body::write_body_code(state, &method))?;
		}
	}

	attributes::write_custom_attributes(state, &def.custom_attributes())?;
	for field in def.fields() {
		attributes::write_custom_attributes(state, &field.custom_attributes())?;
	}
	for ctor in def.ctors() {
		attributes::write_custom_attributes(state, &ctor.custom_attributes())?;
	}
	for method in def.methods() {
		attributes::write_custom_attributes(state, &method.custom_attributes())?;
	}
	for property in def.properties() {
		attributes::write_custom_attributes(state, &property.custom_attributes())?;
	}
	for event in def.events() {
		attributes::write_custom_attributes(state, &event.custom_attributes())?;
	}
	Ok(())
}

/// Statics trailer: values of non-literal static fields, written after the
/// whole graph.
fn write_type_statics<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	def: &Arc<TypeDef>,
) -> Result<(), PickleError> {
	let statics: Vec<_> = def
		.fields()
		.into_iter()
		.filter(|f| f.is_static() && !f.is_literal())
		.collect();
	state.out.write_len(statics.len())?;
	for field in statics {
		state.out.write_str(field.name())?;
		let value = field.static_value().unwrap_or(crate::values::Value::Null);
		dispatch::serialize_value(state, &value, field.ty())?;
	}
	Ok(())
}

/// Method or constructor header, per the definition layout: attributes,
/// calling convention, generic parameter names, return and parameter rows,
/// then locals and the type set harvested from the body. The body bytes
/// themselves are trailer work.
pub(crate) fn write_method_header<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	method: &Arc<MethodDef>,
) -> Result<(), PickleError> {
	state.out.write_str(method.name())?;
	state.out.write_v7(method.attrs().bits() as u64)?;
	state.out.write_v7(method.impl_attrs().bits() as u64)?;
	state.out.write_u8(method.calling_convention().bits())?;

	state.out.write_len(method.generic_params().len())?;
	for param in method.generic_params() {
		state.out.write_str(param)?;
	}

	let context = GenericContext { ty: state.context.ty.clone(), method: Some(method.clone()) };
	state.with_context(context, |state| {
		let (required, optional) = method.return_modifiers();
		write_modifiers(state, required, optional, method)?;
		write_type(state, method.return_ty())?;

		let params = method.params();
		let any_modifiers = params.iter().any(|p| p.has_modifiers());
		state.out.write_v7((params.len() as u64) << 1 | any_modifiers as u64)?;
		for param in params {
			if any_modifiers {
				write_modifiers(state, &param.required_modifiers, &param.optional_modifiers, method)?;
			}
			write_type(state, &param.ty)?;
			state.out.write_opt_str(param.name.as_deref())?;
			state.out.write_v7(param.attrs.bits() as u64)?;
			match &param.default {
				Some(constant) => {
					state.out.write_u8(1)?;
					write_constant(state, constant, &param.ty)?;
				}
				None => state.out.write_u8(0)?,
			}
		}

		if method.can_have_body() {
			let body = method.body();
			state.out.write_bool(body.as_ref().is_some_and(|b| b.init_locals))?;
			let locals = body.as_ref().map(|b| b.locals.clone()).unwrap_or_default();
			state.out.write_len(locals.len())?;
			for local in &locals {
				write_type(state, local)?;
			}
			// Collect pass: realize every type the body references before
			// the body itself is reinterpreted.
			let referenced = body::collect_referenced_types(method)?;
			state.out.write_len(referenced.len())?;
			for ty in &referenced {
				write_type(state, ty)?;
			}
		}
		Ok(())
	})
}

/// `(required << 4) | optional` modifier counts, then the modifier types.
fn write_modifiers<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	required: &[Ty],
	optional: &[Ty],
	method: &MethodDef,
) -> Result<(), PickleError> {
	if required.len() > 7 || optional.len() > 7 {
		return Err(PickleError::UnsupportedModifierCount(method.to_string()));
	}
	state.out.write_u8(((required.len() as u8) << 4) | optional.len() as u8)?;
	for modifier in required.iter().chain(optional.iter()) {
		write_type(state, modifier)?;
	}
	Ok(())
}

/// Constant encoding by declared type: null object carries no payload,
/// strings are nullable, enums their underlying bits, primitives direct.
pub(crate) fn write_constant<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	constant: &Constant,
	declared: &Ty,
) -> Result<(), PickleError> {
	if matches!(declared, Ty::WellKnown(WellKnownType::String)) {
		return Ok(match constant {
			Constant::Str(value) => state.out.write_opt_str(Some(value))?,
			_ => state.out.write_opt_str(None)?,
		});
	}
	match constant {
		Constant::Null => Ok(()),
		Constant::Bool(v) => Ok(state.out.write_bool(*v)?),
		Constant::Char(v) => Ok(state.out.write_u32(*v as u32)?),
		Constant::I8(v) => Ok(state.out.write_i8(*v)?),
		Constant::U8(v) => Ok(state.out.write_u8(*v)?),
		Constant::I16(v) => Ok(state.out.write_i16(*v)?),
		Constant::U16(v) => Ok(state.out.write_u16(*v)?),
		Constant::I32(v) => Ok(state.out.write_i32(*v)?),
		Constant::U32(v) => Ok(state.out.write_u32(*v)?),
		Constant::I64(v) => Ok(state.out.write_i64(*v)?),
		Constant::U64(v) => Ok(state.out.write_u64(*v)?),
		Constant::F32(v) => Ok(state.out.write_f32(*v)?),
		Constant::F64(v) => Ok(state.out.write_f64(*v)?),
		Constant::Str(v) => Ok(state.out.write_opt_str(Some(v))?),
		Constant::Enum { ty, value } => {
			let code = match ty.kind() {
				TypeDefKind::Enum { underlying, .. } => EnumCode::from_well_known(*underlying),
				_ => None,
			};
			let code = code.ok_or_else(|| PickleError::InvalidEnumUnderlying(ty.full_name()))?;
			Ok(code.write_raw(&mut state.out, *value)?)
		}
	}
}

/// Member reference for a method or constructor: memoized through the
/// object op space, then signature, generic arguments and reflected type.
pub(crate) fn write_method<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	method: &Arc<MethodDef>,
) -> Result<(), PickleError> {
	let id = arc_id(method);
	if let Some(position) = state.memo.get(id) {
		ObjectOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let position = state.out.position();
	ObjectOp::Object.write(&mut state.out)?;
	state.memo.record(id, position);
	state.out.write_u8(method.is_ctor() as u8)?;

	Signature::of_method(method).write(&mut state.out)?;
	if !method.is_ctor() {
		let args = method.generic_args();
		state.out.write_len(args.len())?;
		for arg in &args {
			write_type(state, arg)?;
		}
	}
	write_reflected_scope(state, method.declaring_type(), method.module())
}

pub(crate) fn write_field<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	field: &Arc<FieldDef>,
) -> Result<(), PickleError> {
	let id = arc_id(field);
	if let Some(position) = state.memo.get(id) {
		ObjectOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let position = state.out.position();
	ObjectOp::Object.write(&mut state.out)?;
	state.memo.record(id, position);
	state.out.write_str(field.name())?;
	let module = field.declaring_type().and_then(|ty| ty.module());
	write_reflected_scope(state, field.declaring_type(), module)
}

pub(crate) fn write_property<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	property: &Arc<PropertyDef>,
) -> Result<(), PickleError> {
	let id = arc_id(property);
	if let Some(position) = state.memo.get(id) {
		ObjectOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let position = state.out.position();
	ObjectOp::Object.write(&mut state.out)?;
	state.memo.record(id, position);
	Signature::of_property(property).write(&mut state.out)?;
	let declaring = property.declaring_type().ok_or_else(|| detached(property))?;
	write_type(state, &Ty::Def(declaring))
}

pub(crate) fn write_event<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	event: &Arc<EventDef>,
) -> Result<(), PickleError> {
	let id = arc_id(event);
	if let Some(position) = state.memo.get(id) {
		ObjectOp::Memo.write(&mut state.out)?;
		return Ok(state.out.write_v15(position)?);
	}

	let position = state.out.position();
	ObjectOp::Object.write(&mut state.out)?;
	state.memo.record(id, position);
	state.out.write_str(event.name())?;
	let declaring = event.declaring_type().ok_or_else(|| detached(event))?;
	write_type(state, &Ty::Def(declaring))
}

/// Reflected-type slot of a member reference. Module-global members have
/// no declaring type and reference their module instead.
fn write_reflected_scope<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	declaring: Option<Arc<TypeDef>>,
	module: Option<Arc<Module>>,
) -> Result<(), PickleError> {
	match declaring {
		Some(declaring) => {
			state.out.write_u8(1)?;
			write_type(state, &Ty::Def(declaring))
		}
		None => {
			state.out.write_u8(0)?;
			let module = module.ok_or_else(|| detached("module-global member"))?;
			write_module(state, &module)
		}
	}
}

/// A member designated by an `ldtoken`-style operand: a kind byte, then
/// the entity itself.
pub(crate) fn write_member<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	member: &Member,
) -> Result<(), PickleError> {
	match member {
		Member::Type(ty) => {
			state.out.write_u8(0)?;
			write_type(state, ty)
		}
		Member::Field(field) => {
			state.out.write_u8(1)?;
			write_field(state, field)
		}
		Member::Method(method) => {
			state.out.write_u8(2)?;
			write_method(state, method)
		}
		Member::Property(property) => {
			state.out.write_u8(3)?;
			write_property(state, property)
		}
		Member::Event(event) => {
			state.out.write_u8(4)?;
			write_event(state, event)
		}
	}
}
