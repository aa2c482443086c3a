use std::io::Write;
use std::sync::Arc;

use bitflags::bitflags;
use fxhash::{FxHashMap, FxHashSet};

use crate::errors::PickleError;
use crate::reflection::{EnumCode, FieldDef, Ty, TypeDef, TypeDefKind};
use crate::ser::reducers::Reducer;
use crate::ser::walker;
use crate::ser::{Pickler, PickleState};

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub(crate) struct InfoFlags: u8 {
		const IS_VALUE_TYPE = 0x1;
		const IS_SEALED = 0x2;
		const IS_ABSTRACT = 0x4;
		const HAS_ELEMENT = 0x8;
	}
}

/// Serialization kind of a type. The discriminant shares a byte with
/// [`InfoFlags`], so both halves must stay within four bits.
pub(crate) enum InfoKind {
	Builtin,
	Enum(EnumCode),
	Delegate,
	Reduced(Arc<dyn Reducer>),
	/// The type provides its own `(name, value)` entries.
	Custom,
	/// Automatic field walk over the cached field list.
	Object(Vec<Arc<FieldDef>>),
}

impl InfoKind {
	pub const fn code(&self) -> u8 {
		match self {
			InfoKind::Builtin => 0,
			InfoKind::Enum(_) => 1,
			InfoKind::Delegate => 2,
			InfoKind::Reduced(_) => 3,
			InfoKind::Custom => 4,
			InfoKind::Object(_) => 5,
		}
	}
}

/// Precomputed rejection, raised when the type reaches the dispatcher
/// instead of mid-walk.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Reject {
	Pointer,
	MarshalByRef,
	EnumUnderlying,
}

/// Memoized per-type classification.
pub(crate) struct TypeInfo {
	pub kind: InfoKind,
	pub flags: InfoFlags,
	pub element: Option<Ty>,
	pub tuple: Vec<Ty>,
	pub reject: Option<Reject>,
}

impl TypeInfo {
	pub fn check(&self, ty: &Ty) -> Result<(), PickleError> {
		match self.reject {
			None => Ok(()),
			Some(Reject::Pointer) => Err(PickleError::UnserializablePointer(ty.to_string())),
			Some(Reject::MarshalByRef) => Err(PickleError::UnserializableMarshalByRef(ty.to_string())),
			Some(Reject::EnumUnderlying) => Err(PickleError::InvalidEnumUnderlying(ty.to_string())),
		}
	}

	pub fn is_value_type(&self) -> bool {
		self.flags.contains(InfoFlags::IS_VALUE_TYPE)
	}

	fn rejected(reject: Reject) -> TypeInfo {
		TypeInfo {
			kind: InfoKind::Builtin,
			flags: InfoFlags::default(),
			element: None,
			tuple: Vec::new(),
			reject: Some(reject),
		}
	}

	fn builtin(flags: InfoFlags) -> TypeInfo {
		TypeInfo {
			kind: InfoKind::Builtin,
			flags,
			element: None,
			tuple: Vec::new(),
			reject: None,
		}
	}
}

/// Per-run cache of classifications plus the set of records already
/// emitted inline into the stream.
#[derive(Default)]
pub(crate) struct InfoCache {
	records: FxHashMap<Ty, Arc<TypeInfo>>,
	emitted: FxHashSet<Ty>,
}

impl InfoCache {
	pub fn ensure(&mut self, pickler: &Pickler, ty: &Ty) -> Arc<TypeInfo> {
		if let Some(info) = self.records.get(ty) {
			return info.clone();
		}
		let info = Arc::new(classify(pickler, ty));
		self.records.insert(ty.clone(), info.clone());
		info
	}

	fn mark_emitted(&mut self, ty: &Ty) -> bool {
		self.emitted.insert(ty.clone())
	}
}

fn classify(pickler: &Pickler, ty: &Ty) -> TypeInfo {
	match ty {
		Ty::Pointer(_) | Ty::ByRef(_) => TypeInfo::rejected(Reject::Pointer),
		Ty::Array { element, .. } => TypeInfo {
			kind: InfoKind::Builtin,
			flags: InfoFlags::IS_SEALED | InfoFlags::HAS_ELEMENT,
			element: Some((**element).clone()),
			tuple: Vec::new(),
			reject: None,
		},
		Ty::Nullable(element) => TypeInfo {
			kind: InfoKind::Builtin,
			flags: InfoFlags::IS_VALUE_TYPE | InfoFlags::IS_SEALED | InfoFlags::HAS_ELEMENT,
			element: Some((**element).clone()),
			tuple: Vec::new(),
			reject: None,
		},
		Ty::Tuple { boxed, items } => {
			let mut flags = InfoFlags::IS_SEALED;
			if !boxed {
				flags |= InfoFlags::IS_VALUE_TYPE;
			}
			TypeInfo {
				kind: InfoKind::Builtin,
				flags,
				element: None,
				tuple: items.clone(),
				reject: None,
			}
		}
		Ty::WellKnown(wk) => {
			let mut flags = InfoFlags::default();
			if wk.is_value_type() {
				flags |= InfoFlags::IS_VALUE_TYPE;
			}
			if wk.is_sealed() {
				flags |= InfoFlags::IS_SEALED;
			}
			if wk.is_reflection_root() {
				flags |= InfoFlags::IS_ABSTRACT;
			}
			TypeInfo::builtin(flags)
		}
		Ty::TypeParam { .. } | Ty::MethodParam { .. } => TypeInfo::builtin(InfoFlags::default()),
		Ty::Def(def) | Ty::Generic { def, .. } => classify_def(pickler, ty, def),
	}
}

fn classify_def(pickler: &Pickler, ty: &Ty, def: &Arc<TypeDef>) -> TypeInfo {
	let mut flags = InfoFlags::default();
	if def.is_value_type() {
		flags |= InfoFlags::IS_VALUE_TYPE;
	}
	if def.is_sealed() {
		flags |= InfoFlags::IS_SEALED;
	}
	if def.is_abstract() {
		flags |= InfoFlags::IS_ABSTRACT;
	}

	let kind = match def.kind() {
		TypeDefKind::Enum { underlying, .. } => match EnumCode::from_well_known(*underlying) {
			Some(code) => InfoKind::Enum(code),
			None => return TypeInfo::rejected(Reject::EnumUnderlying),
		},
		TypeDefKind::Delegate { .. } => InfoKind::Delegate,
		_ => match pickler.reducers().find(ty) {
			Some(reducer) => InfoKind::Reduced(reducer),
			None if def.inherits_marshal_by_ref() => {
				return TypeInfo::rejected(Reject::MarshalByRef);
			}
			None if def.has_custom_serialization() => InfoKind::Custom,
			None => {
				let mut fields: Vec<_> = def
					.fields()
					.into_iter()
					.filter(|f| !f.attrs().contains(crate::reflection::FieldAttributes::NOT_SERIALIZED))
					.collect();
				// Sorted so the emitted field order never depends on
				// declaration order.
				fields.sort_by(|a, b| a.name().cmp(b.name()));
				InfoKind::Object(fields)
			}
		},
	};

	TypeInfo { kind, flags, element: None, tuple: Vec::new(), reject: None }
}

/// Writes a type reference in a value context, followed by the type-info
/// record when this is the type's first inline appearance.
pub(crate) fn write_type_with_info<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	ty: &Ty,
) -> Result<(), PickleError> {
	walker::write_type(state, ty)?;
	emit_info(state, ty)
}

/// Emits the `(kind << 4) | flags` record plus its kind-specific suffix,
/// at most once per run per type.
pub(crate) fn emit_info<'p, W: Write>(state: &mut PickleState<'p, W>, ty: &Ty) -> Result<(), PickleError> {
	if !state.infos.mark_emitted(ty) {
		return Ok(());
	}
	let info = state.infos.ensure(state.pickler, ty);
	debug_assert!(info.kind.code() <= 0xF && info.flags.bits() <= 0xF);
	state.out.write_u8((info.kind.code() << 4) | info.flags.bits())?;

	match &info.kind {
		InfoKind::Enum(code) => state.out.write_u8(*code as u8)?,
		InfoKind::Object(fields) => {
			let instance: Vec<_> = fields.iter().filter(|f| !f.is_static()).collect();
			state.out.write_len(instance.len())?;
			for field in instance {
				state.out.write_str(field.name())?;
				write_type_with_info(state, field.ty())?;
			}
		}
		_ => {}
	}

	if let Some(element) = &info.element {
		emit_info(state, element)?;
	}
	for item in &info.tuple {
		emit_info(state, item)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reflection::{FieldAttributes, TypeAttributes, WellKnownType};
	use crate::ser::Reduction;
	use crate::values::Value;

	fn classify_fresh(pickler: &Pickler, ty: &Ty) -> Arc<TypeInfo> {
		InfoCache::default().ensure(pickler, ty)
	}

	#[test]
	fn packed_halves_stay_within_four_bits() {
		let pickler = Pickler::new();
		for ty in [
			Ty::WellKnown(WellKnownType::Int32),
			Ty::WellKnown(WellKnownType::TypeRoot),
			Ty::szarray(Ty::WellKnown(WellKnownType::Object)),
			Ty::Nullable(Box::new(Ty::WellKnown(WellKnownType::Bool))),
			Ty::Tuple { boxed: false, items: vec![Ty::WellKnown(WellKnownType::Int32)] },
		] {
			let info = classify_fresh(&pickler, &ty);
			assert!(info.kind.code() <= 0xF);
			assert!(info.flags.bits() <= 0xF);
		}
	}

	#[test]
	fn auto_serialized_fields_sort_by_name() {
		let def = TypeDef::new("Lab", "Rec", TypeAttributes::PUBLIC, crate::reflection::TypeDefKind::Class);
		for name in ["zeta", "alpha", "mid"] {
			def.attach_field(&FieldDef::new(
				name,
				FieldAttributes::PUBLIC,
				Ty::WellKnown(WellKnownType::Int32),
			));
		}
		let info = classify_fresh(&Pickler::new(), &Ty::Def(def));
		match &info.kind {
			InfoKind::Object(fields) => {
				let names: Vec<_> = fields.iter().map(|f| f.name().to_string()).collect();
				assert_eq!(names, ["alpha", "mid", "zeta"]);
			}
			_ => panic!("expected the automatic field walk"),
		}
	}

	#[test]
	fn reducers_win_over_custom_serialization() {
		struct Noop;
		impl Reducer for Noop {
			fn reduce(&self, _: &Value) -> Result<Reduction, PickleError> {
				Err(PickleError::InvalidReduction("unused".to_string()))
			}
		}

		let def = TypeDef::new("Lab", "Both", TypeAttributes::PUBLIC, crate::reflection::TypeDefKind::Class);
		def.mark_custom_serialization();
		let mut pickler = Pickler::new();
		pickler.reducers_mut().register(Ty::Def(def.clone()), Arc::new(Noop));

		let info = classify_fresh(&pickler, &Ty::Def(def));
		assert!(matches!(info.kind, InfoKind::Reduced(_)));
	}

	#[test]
	fn generic_instantiations_fall_back_to_their_definition() {
		struct Noop;
		impl Reducer for Noop {
			fn reduce(&self, _: &Value) -> Result<Reduction, PickleError> {
				Err(PickleError::InvalidReduction("unused".to_string()))
			}
		}

		let def = TypeDef::new_generic(
			"Lab",
			"Box",
			TypeAttributes::PUBLIC,
			crate::reflection::TypeDefKind::Class,
			&["T"],
		);
		let mut pickler = Pickler::new();
		pickler.reducers_mut().register(Ty::Def(def.clone()), Arc::new(Noop));

		let closed = Ty::Generic { def, args: vec![Ty::WellKnown(WellKnownType::Int32)] };
		let info = classify_fresh(&pickler, &closed);
		assert!(matches!(info.kind, InfoKind::Reduced(_)));
	}
}
