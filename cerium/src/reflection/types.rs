use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use derivative::Derivative;

use crate::reflection::attributes::CustomAttribute;
use crate::reflection::members::{EventDef, FieldDef, MethodDef, PropertyDef};
use crate::reflection::module::Module;
use crate::signature::Signature;
use crate::utilities::arc_id;
use crate::wire::ops::TypeOp;

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct TypeAttributes: u32 {
		const PUBLIC = 0x0000_0001;
		const NESTED_PUBLIC = 0x0000_0002;
		const NESTED_PRIVATE = 0x0000_0003;
		const INTERFACE = 0x0000_0020;
		const ABSTRACT = 0x0000_0080;
		const SEALED = 0x0000_0100;
		const SPECIAL_NAME = 0x0000_0400;
		const SERIALIZABLE = 0x0000_2000;
		const BEFORE_FIELD_INIT = 0x0010_0000;
	}
}

/// Types whose encoding collapses to a single well-known token byte:
/// the primitives plus the reflection roots.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WellKnownType {
	Void,
	Bool,
	Char,
	Int8,
	UInt8,
	Int16,
	UInt16,
	Int32,
	UInt32,
	Int64,
	UInt64,
	Float,
	Double,
	Decimal,
	DateTime,
	String,
	Object,
	/// Root of the type hierarchy of the reflection surface.
	TypeRoot,
	AssemblyRoot,
	ModuleRoot,
	FieldRoot,
	MethodRoot,
	ConstructorRoot,
	PropertyRoot,
	EventRoot,
	/// The remoting base class. Recognized only so inheritors can be
	/// rejected with a precise error.
	MarshalByRef,
}

impl WellKnownType {
	pub const fn type_op(self) -> TypeOp {
		match self {
			WellKnownType::Void => TypeOp::Void,
			WellKnownType::Bool => TypeOp::Bool,
			WellKnownType::Char => TypeOp::Char,
			WellKnownType::Int8 => TypeOp::Int8,
			WellKnownType::UInt8 => TypeOp::UInt8,
			WellKnownType::Int16 => TypeOp::Int16,
			WellKnownType::UInt16 => TypeOp::UInt16,
			WellKnownType::Int32 => TypeOp::Int32,
			WellKnownType::UInt32 => TypeOp::UInt32,
			WellKnownType::Int64 => TypeOp::Int64,
			WellKnownType::UInt64 => TypeOp::UInt64,
			WellKnownType::Float => TypeOp::Float,
			WellKnownType::Double => TypeOp::Double,
			WellKnownType::Decimal => TypeOp::Decimal,
			WellKnownType::DateTime => TypeOp::DateTime,
			WellKnownType::String => TypeOp::String,
			WellKnownType::Object => TypeOp::Object,
			WellKnownType::TypeRoot => TypeOp::TypeRoot,
			WellKnownType::AssemblyRoot => TypeOp::AssemblyRoot,
			WellKnownType::ModuleRoot => TypeOp::ModuleRoot,
			WellKnownType::FieldRoot => TypeOp::FieldRoot,
			WellKnownType::MethodRoot => TypeOp::MethodRoot,
			WellKnownType::ConstructorRoot => TypeOp::ConstructorRoot,
			WellKnownType::PropertyRoot => TypeOp::PropertyRoot,
			WellKnownType::EventRoot => TypeOp::EventRoot,
			WellKnownType::MarshalByRef => TypeOp::MarshalByRef,
		}
	}

	pub const fn is_value_type(self) -> bool {
		matches!(
			self,
			WellKnownType::Bool
				| WellKnownType::Char
				| WellKnownType::Int8
				| WellKnownType::UInt8
				| WellKnownType::Int16
				| WellKnownType::UInt16
				| WellKnownType::Int32
				| WellKnownType::UInt32
				| WellKnownType::Int64
				| WellKnownType::UInt64
				| WellKnownType::Float
				| WellKnownType::Double
				| WellKnownType::Decimal
				| WellKnownType::DateTime
		)
	}

	pub const fn is_sealed(self) -> bool {
		self.is_value_type() || matches!(self, WellKnownType::String)
	}

	pub const fn is_reflection_root(self) -> bool {
		matches!(
			self,
			WellKnownType::TypeRoot
				| WellKnownType::AssemblyRoot
				| WellKnownType::ModuleRoot
				| WellKnownType::FieldRoot
				| WellKnownType::MethodRoot
				| WellKnownType::ConstructorRoot
				| WellKnownType::PropertyRoot
				| WellKnownType::EventRoot
		)
	}

	/// Width of one element in the raw bulk encoding of primitive arrays,
	/// when this type is eligible for it.
	pub const fn bulk_width(self) -> Option<usize> {
		match self {
			WellKnownType::Bool | WellKnownType::Int8 | WellKnownType::UInt8 => Some(1),
			WellKnownType::Int16 | WellKnownType::UInt16 => Some(2),
			WellKnownType::Char | WellKnownType::Int32 | WellKnownType::UInt32 | WellKnownType::Float => Some(4),
			WellKnownType::Int64 | WellKnownType::UInt64 | WellKnownType::Double | WellKnownType::DateTime => Some(8),
			WellKnownType::Decimal => Some(16),
			_ => None,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			WellKnownType::Void => "System.Void",
			WellKnownType::Bool => "System.Boolean",
			WellKnownType::Char => "System.Char",
			WellKnownType::Int8 => "System.SByte",
			WellKnownType::UInt8 => "System.Byte",
			WellKnownType::Int16 => "System.Int16",
			WellKnownType::UInt16 => "System.UInt16",
			WellKnownType::Int32 => "System.Int32",
			WellKnownType::UInt32 => "System.UInt32",
			WellKnownType::Int64 => "System.Int64",
			WellKnownType::UInt64 => "System.UInt64",
			WellKnownType::Float => "System.Single",
			WellKnownType::Double => "System.Double",
			WellKnownType::Decimal => "System.Decimal",
			WellKnownType::DateTime => "System.DateTime",
			WellKnownType::String => "System.String",
			WellKnownType::Object => "System.Object",
			WellKnownType::TypeRoot => "System.Type",
			WellKnownType::AssemblyRoot => "System.Reflection.Assembly",
			WellKnownType::ModuleRoot => "System.Reflection.Module",
			WellKnownType::FieldRoot => "System.Reflection.FieldInfo",
			WellKnownType::MethodRoot => "System.Reflection.MethodInfo",
			WellKnownType::ConstructorRoot => "System.Reflection.ConstructorInfo",
			WellKnownType::PropertyRoot => "System.Reflection.PropertyInfo",
			WellKnownType::EventRoot => "System.Reflection.EventInfo",
			WellKnownType::MarshalByRef => "System.MarshalByRefObject",
		}
	}
}

impl Display for WellKnownType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

/// Underlying numeric code of an enum, using the CLI element-type bytes.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EnumCode {
	Int8 = 0x04,
	UInt8 = 0x05,
	Int16 = 0x06,
	UInt16 = 0x07,
	Int32 = 0x08,
	UInt32 = 0x09,
	Int64 = 0x0A,
	UInt64 = 0x0B,
}

impl EnumCode {
	pub const fn width(self) -> usize {
		match self {
			EnumCode::Int8 | EnumCode::UInt8 => 1,
			EnumCode::Int16 | EnumCode::UInt16 => 2,
			EnumCode::Int32 | EnumCode::UInt32 => 4,
			EnumCode::Int64 | EnumCode::UInt64 => 8,
		}
	}

	/// Writes `raw` truncated to the underlying width, little-endian.
	pub fn write_raw<W: std::io::Write>(
		self,
		out: &mut crate::wire::PickleWriter<W>,
		raw: u64,
	) -> std::io::Result<()> {
		match self {
			EnumCode::Int8 | EnumCode::UInt8 => out.write_u8(raw as u8),
			EnumCode::Int16 | EnumCode::UInt16 => out.write_u16(raw as u16),
			EnumCode::Int32 | EnumCode::UInt32 => out.write_u32(raw as u32),
			EnumCode::Int64 | EnumCode::UInt64 => out.write_u64(raw),
		}
	}

	pub const fn from_well_known(ty: WellKnownType) -> Option<EnumCode> {
		match ty {
			WellKnownType::Int8 => Some(EnumCode::Int8),
			WellKnownType::UInt8 => Some(EnumCode::UInt8),
			WellKnownType::Int16 => Some(EnumCode::Int16),
			WellKnownType::UInt16 => Some(EnumCode::UInt16),
			WellKnownType::Int32 => Some(EnumCode::Int32),
			WellKnownType::UInt32 => Some(EnumCode::UInt32),
			WellKnownType::Int64 => Some(EnumCode::Int64),
			WellKnownType::UInt64 => Some(EnumCode::UInt64),
			_ => None,
		}
	}
}

/// Kind-specific shape of a type definition.
#[derive(Debug)]
pub enum TypeDefKind {
	Class,
	Struct,
	Interface,
	Enum {
		underlying: WellKnownType,
		variants: Vec<(Arc<str>, u64)>,
	},
	Delegate {
		invoke: Signature,
	},
}

impl TypeDefKind {
	pub const fn discriminant(&self) -> u8 {
		match self {
			TypeDefKind::Class => 0,
			TypeDefKind::Struct => 1,
			TypeDefKind::Interface => 2,
			TypeDefKind::Enum { .. } => 3,
			TypeDefKind::Delegate { .. } => 4,
		}
	}
}

/// A named type definition. Identity is reference identity: two `Arc`s to
/// the same definition are the same type, equal names are not.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TypeDef {
	name: Arc<str>,
	namespace: Arc<str>,
	attrs: TypeAttributes,
	kind: TypeDefKind,
	generic_params: Vec<Arc<str>>,
	#[derivative(Debug = "ignore")]
	module: RefCell<Weak<Module>>,
	#[derivative(Debug = "ignore")]
	declaring_type: RefCell<Weak<TypeDef>>,
	base: RefCell<Option<Ty>>,
	interfaces: RefCell<Vec<Ty>>,
	/// `(interface method, implementing method)` pairs of the interface map.
	#[derivative(Debug = "ignore")]
	overrides: RefCell<Vec<(Arc<MethodDef>, Arc<MethodDef>)>>,
	fields: RefCell<Vec<Arc<FieldDef>>>,
	ctors: RefCell<Vec<Arc<MethodDef>>>,
	methods: RefCell<Vec<Arc<MethodDef>>>,
	properties: RefCell<Vec<Arc<PropertyDef>>>,
	events: RefCell<Vec<Arc<EventDef>>>,
	custom_serialization: Cell<bool>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

impl TypeDef {
	pub fn new(namespace: &str, name: &str, attrs: TypeAttributes, kind: TypeDefKind) -> Arc<Self> {
		Arc::new(Self {
			name: Arc::from(name),
			namespace: Arc::from(namespace),
			attrs,
			kind,
			generic_params: Vec::new(),
			module: RefCell::new(Weak::new()),
			declaring_type: RefCell::new(Weak::new()),
			base: RefCell::new(None),
			interfaces: RefCell::new(Vec::new()),
			overrides: RefCell::new(Vec::new()),
			fields: RefCell::new(Vec::new()),
			ctors: RefCell::new(Vec::new()),
			methods: RefCell::new(Vec::new()),
			properties: RefCell::new(Vec::new()),
			events: RefCell::new(Vec::new()),
			custom_serialization: Cell::new(false),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}

	pub fn new_generic(
		namespace: &str,
		name: &str,
		attrs: TypeAttributes,
		kind: TypeDefKind,
		generic_params: &[&str],
	) -> Arc<Self> {
		let mut def = Self::new(namespace, name, attrs, kind);
		if let Some(def) = Arc::get_mut(&mut def) {
			def.generic_params = generic_params.iter().map(|p| Arc::from(*p)).collect();
		}
		def
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn full_name(&self) -> String {
		match self.namespace.is_empty() {
			true => self.name.to_string(),
			false => format!("{}.{}", self.namespace, self.name),
		}
	}

	pub fn attrs(&self) -> TypeAttributes {
		self.attrs
	}

	pub fn kind(&self) -> &TypeDefKind {
		&self.kind
	}

	pub fn generic_params(&self) -> &[Arc<str>] {
		&self.generic_params
	}

	pub fn module(&self) -> Option<Arc<Module>> {
		self.module.borrow().upgrade()
	}

	pub(crate) fn attach_module(&self, module: &Arc<Module>) {
		*self.module.borrow_mut() = Arc::downgrade(module);
	}

	pub fn declaring_type(&self) -> Option<Arc<TypeDef>> {
		self.declaring_type.borrow().upgrade()
	}

	pub fn attach_declaring_type(&self, declaring: &Arc<TypeDef>) {
		*self.declaring_type.borrow_mut() = Arc::downgrade(declaring);
	}

	pub fn base(&self) -> Option<Ty> {
		self.base.borrow().clone()
	}

	pub fn set_base(&self, base: Ty) {
		*self.base.borrow_mut() = Some(base);
	}

	pub fn interfaces(&self) -> Vec<Ty> {
		self.interfaces.borrow().clone()
	}

	pub fn add_interface(&self, interface: Ty) {
		self.interfaces.borrow_mut().push(interface);
	}

	pub fn overrides(&self) -> Vec<(Arc<MethodDef>, Arc<MethodDef>)> {
		self.overrides.borrow().clone()
	}

	pub fn add_override(&self, interface_method: Arc<MethodDef>, target: Arc<MethodDef>) {
		self.overrides.borrow_mut().push((interface_method, target));
	}

	pub fn fields(&self) -> Vec<Arc<FieldDef>> {
		self.fields.borrow().clone()
	}

	pub fn ctors(&self) -> Vec<Arc<MethodDef>> {
		self.ctors.borrow().clone()
	}

	pub fn methods(&self) -> Vec<Arc<MethodDef>> {
		self.methods.borrow().clone()
	}

	pub fn properties(&self) -> Vec<Arc<PropertyDef>> {
		self.properties.borrow().clone()
	}

	pub fn events(&self) -> Vec<Arc<EventDef>> {
		self.events.borrow().clone()
	}

	pub fn is_value_type(&self) -> bool {
		matches!(self.kind, TypeDefKind::Struct | TypeDefKind::Enum { .. })
	}

	pub fn is_interface(&self) -> bool {
		matches!(self.kind, TypeDefKind::Interface)
	}

	pub fn is_sealed(&self) -> bool {
		self.is_value_type()
			|| matches!(self.kind, TypeDefKind::Delegate { .. })
			|| self.attrs.contains(TypeAttributes::SEALED)
	}

	pub fn is_abstract(&self) -> bool {
		self.is_interface() || self.attrs.contains(TypeAttributes::ABSTRACT)
	}

	/// Whether this type or any of its bases is the remoting base class.
	pub fn inherits_marshal_by_ref(&self) -> bool {
		let mut base = self.base();
		while let Some(ty) = base {
			match &ty {
				Ty::WellKnown(WellKnownType::MarshalByRef) => return true,
				Ty::Def(def) | Ty::Generic { def, .. } => base = def.base(),
				_ => return false,
			}
		}
		false
	}

	/// Whether this type or any of its bases is one of the reflection
	/// roots. Such a derived concrete reflection type cannot serve as a
	/// static context: the stream only represents the roots.
	pub fn inherits_reflection_root(&self) -> bool {
		let mut base = self.base();
		while let Some(ty) = base {
			match &ty {
				Ty::WellKnown(wk) if wk.is_reflection_root() => return true,
				Ty::Def(def) | Ty::Generic { def, .. } => base = def.base(),
				_ => return false,
			}
		}
		false
	}

	/// Marks the type as providing its own `(name, value)` serialization
	/// entries instead of the automatic field walk.
	pub fn mark_custom_serialization(&self) {
		self.custom_serialization.set(true);
	}

	pub fn has_custom_serialization(&self) -> bool {
		self.custom_serialization.get()
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}

	pub fn attach_field(self: &Arc<Self>, field: &Arc<FieldDef>) {
		field.attach_declaring_type(self);
		self.fields.borrow_mut().push(field.clone());
	}

	pub fn attach_ctor(self: &Arc<Self>, ctor: &Arc<MethodDef>) {
		ctor.attach_declaring_type(self);
		self.ctors.borrow_mut().push(ctor.clone());
	}

	pub fn attach_method(self: &Arc<Self>, method: &Arc<MethodDef>) {
		method.attach_declaring_type(self);
		self.methods.borrow_mut().push(method.clone());
	}

	pub fn attach_property(self: &Arc<Self>, property: &Arc<PropertyDef>) {
		property.attach_declaring_type(self);
		self.properties.borrow_mut().push(property.clone());
	}

	pub fn attach_event(self: &Arc<Self>, event: &Arc<EventDef>) {
		event.attach_declaring_type(self);
		self.events.borrow_mut().push(event.clone());
	}
}

impl Display for TypeDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.namespace.is_empty() {
			true => write!(f, "{}", self.name),
			false => write!(f, "{}.{}", self.namespace, self.name),
		}
	}
}

/// A type as seen by the serializer: either a well-known token, a named
/// definition, or a structural shape over other types.
#[derive(Clone)]
pub enum Ty {
	WellKnown(WellKnownType),
	Def(Arc<TypeDef>),
	Generic { def: Arc<TypeDef>, args: Vec<Ty> },
	/// `rank` 0 encodes the single-dimension zero-based shape.
	Array { rank: usize, element: Box<Ty> },
	Nullable(Box<Ty>),
	/// `boxed` selects the heap tuple over the value tuple.
	Tuple { boxed: bool, items: Vec<Ty> },
	TypeParam { owner: Arc<TypeDef>, position: u32 },
	MethodParam { owner: Arc<MethodDef>, position: u32 },
	ByRef(Box<Ty>),
	Pointer(Box<Ty>),
}

impl Ty {
	pub fn szarray(element: Ty) -> Ty {
		Ty::Array { rank: 0, element: Box::new(element) }
	}

	pub fn is_value_type(&self) -> bool {
		match self {
			Ty::WellKnown(wk) => wk.is_value_type(),
			Ty::Def(def) | Ty::Generic { def, .. } => def.is_value_type(),
			Ty::Nullable(_) => true,
			Ty::Tuple { boxed, .. } => !boxed,
			Ty::Array { .. } | Ty::TypeParam { .. } | Ty::MethodParam { .. } => false,
			Ty::ByRef(_) | Ty::Pointer(_) => false,
		}
	}

	pub fn is_sealed(&self) -> bool {
		match self {
			Ty::WellKnown(wk) => wk.is_sealed(),
			Ty::Def(def) | Ty::Generic { def, .. } => def.is_sealed(),
			Ty::Array { .. } => true,
			Ty::Nullable(_) | Ty::Tuple { .. } => true,
			Ty::TypeParam { .. } | Ty::MethodParam { .. } => false,
			Ty::ByRef(element) | Ty::Pointer(element) => element.is_sealed(),
		}
	}

	/// Innermost type once arrays and nullables are peeled away. The
	/// runtime-type prefix is elided when this is sealed or a value type.
	pub fn root_element(&self) -> &Ty {
		match self {
			Ty::Array { element, .. } => element.root_element(),
			Ty::Nullable(element) => element.root_element(),
			Ty::ByRef(element) => element.root_element(),
			_ => self,
		}
	}
}

impl PartialEq for Ty {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Ty::WellKnown(a), Ty::WellKnown(b)) => a == b,
			(Ty::Def(a), Ty::Def(b)) => arc_id(a) == arc_id(b),
			(Ty::Generic { def: a, args: x }, Ty::Generic { def: b, args: y }) => {
				arc_id(a) == arc_id(b) && x == y
			}
			(Ty::Array { rank: a, element: x }, Ty::Array { rank: b, element: y }) => a == b && x == y,
			(Ty::Nullable(a), Ty::Nullable(b)) => a == b,
			(Ty::Tuple { boxed: a, items: x }, Ty::Tuple { boxed: b, items: y }) => a == b && x == y,
			(
				Ty::TypeParam { owner: a, position: x },
				Ty::TypeParam { owner: b, position: y },
			) => arc_id(a) == arc_id(b) && x == y,
			(
				Ty::MethodParam { owner: a, position: x },
				Ty::MethodParam { owner: b, position: y },
			) => arc_id(a) == arc_id(b) && x == y,
			(Ty::ByRef(a), Ty::ByRef(b)) => a == b,
			(Ty::Pointer(a), Ty::Pointer(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Ty {}

impl Hash for Ty {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::mem::discriminant(self).hash(state);
		match self {
			Ty::WellKnown(wk) => wk.hash(state),
			Ty::Def(def) => arc_id(def).hash(state),
			Ty::Generic { def, args } => {
				arc_id(def).hash(state);
				args.hash(state);
			}
			Ty::Array { rank, element } => {
				rank.hash(state);
				element.hash(state);
			}
			Ty::Nullable(element) => element.hash(state),
			Ty::Tuple { boxed, items } => {
				boxed.hash(state);
				items.hash(state);
			}
			Ty::TypeParam { owner, position } => {
				arc_id(owner).hash(state);
				position.hash(state);
			}
			Ty::MethodParam { owner, position } => {
				arc_id(owner).hash(state);
				position.hash(state);
			}
			Ty::ByRef(element) | Ty::Pointer(element) => element.hash(state),
		}
	}
}

impl Display for Ty {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Ty::WellKnown(wk) => Display::fmt(wk, f),
			Ty::Def(def) => Display::fmt(def, f),
			Ty::Generic { def, args } => {
				write!(f, "{def}<")?;
				for (i, arg) in args.iter().enumerate() {
					match i {
						0 => write!(f, "{arg}")?,
						_ => write!(f, ", {arg}")?,
					}
				}
				write!(f, ">")
			}
			Ty::Array { rank: 0, element } => write!(f, "{element}[]"),
			Ty::Array { rank, element } => write!(f, "{element}[{}]", ",".repeat(rank - 1)),
			Ty::Nullable(element) => write!(f, "{element}?"),
			Ty::Tuple { items, .. } => {
				write!(f, "(")?;
				for (i, item) in items.iter().enumerate() {
					match i {
						0 => write!(f, "{item}")?,
						_ => write!(f, ", {item}")?,
					}
				}
				write!(f, ")")
			}
			Ty::TypeParam { position, .. } => write!(f, "!{position}"),
			Ty::MethodParam { position, .. } => write!(f, "!!{position}"),
			Ty::ByRef(element) => write!(f, "{element}&"),
			Ty::Pointer(element) => write!(f, "{element}*"),
		}
	}
}

impl Debug for Ty {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}
