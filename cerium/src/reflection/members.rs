use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use derivative::Derivative;

use crate::reflection::attributes::CustomAttribute;
use crate::reflection::module::Module;
use crate::reflection::types::{Ty, TypeDef};
use crate::signature::CallingConvention;
use crate::values::Value;

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct FieldAttributes: u32 {
		const PRIVATE = 0x0001;
		const ASSEMBLY = 0x0003;
		const PUBLIC = 0x0006;
		const STATIC = 0x0010;
		const INIT_ONLY = 0x0020;
		const LITERAL = 0x0040;
		const NOT_SERIALIZED = 0x0080;
		const HAS_FIELD_RVA = 0x0100;
		const SPECIAL_NAME = 0x0200;
		const HAS_DEFAULT = 0x8000;
	}
}

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct MethodAttributes: u32 {
		const PRIVATE = 0x0001;
		const ASSEMBLY = 0x0003;
		const PUBLIC = 0x0006;
		const UNMANAGED_EXPORT = 0x0008;
		const STATIC = 0x0010;
		const FINAL = 0x0020;
		const VIRTUAL = 0x0040;
		const HIDE_BY_SIG = 0x0080;
		const NEW_SLOT = 0x0100;
		const ABSTRACT = 0x0400;
		const SPECIAL_NAME = 0x0800;
		const RT_SPECIAL_NAME = 0x1000;
		const PINVOKE_IMPL = 0x2000;
	}
}

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct MethodImplAttributes: u32 {
		const NATIVE = 0x0001;
		const RUNTIME = 0x0003;
		const UNMANAGED = 0x0004;
		const NO_INLINING = 0x0008;
		const SYNCHRONIZED = 0x0020;
		const INTERNAL_CALL = 0x1000;
	}
}

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct ParamAttributes: u32 {
		const IN = 0x0001;
		const OUT = 0x0002;
		const OPTIONAL = 0x0010;
		const HAS_DEFAULT = 0x1000;
	}
}

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct PropertyAttributes: u32 {
		const SPECIAL_NAME = 0x0200;
		const RT_SPECIAL_NAME = 0x0400;
		const HAS_DEFAULT = 0x1000;
	}
}

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct EventAttributes: u32 {
		const SPECIAL_NAME = 0x0200;
		const RT_SPECIAL_NAME = 0x0400;
	}
}

/// A compile-time constant in a field or parameter-default position.
#[derive(Debug, Clone)]
pub enum Constant {
	Null,
	Bool(bool),
	Char(char),
	I8(i8),
	U8(u8),
	I16(i16),
	U16(u16),
	I32(i32),
	U32(u32),
	I64(i64),
	U64(u64),
	F32(f32),
	F64(f64),
	Str(Arc<str>),
	/// Raw bits of the underlying value; the width comes from the enum.
	Enum { ty: Arc<TypeDef>, value: u64 },
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct FieldDef {
	name: Arc<str>,
	attrs: FieldAttributes,
	ty: Ty,
	#[derivative(Debug = "ignore")]
	declaring_type: RefCell<Weak<TypeDef>>,
	constant: Option<Constant>,
	/// Initial raw-value-area blob carried by module global fields.
	#[derivative(Debug(format_with = "crate::utilities::fmt_opt_blob_len"))]
	rva_data: Option<Vec<u8>>,
	#[derivative(Debug = "ignore")]
	static_value: RefCell<Option<Value>>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

impl FieldDef {
	pub fn new(name: &str, attrs: FieldAttributes, ty: Ty) -> Arc<Self> {
		Arc::new(Self {
			name: Arc::from(name),
			attrs,
			ty,
			declaring_type: RefCell::new(Weak::new()),
			constant: None,
			rva_data: None,
			static_value: RefCell::new(None),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}

	pub fn new_literal(name: &str, attrs: FieldAttributes, ty: Ty, constant: Constant) -> Arc<Self> {
		let mut field = Self::new(name, attrs | FieldAttributes::LITERAL | FieldAttributes::HAS_DEFAULT, ty);
		if let Some(field) = Arc::get_mut(&mut field) {
			field.constant = Some(constant);
		}
		field
	}

	pub fn new_rva(name: &str, attrs: FieldAttributes, ty: Ty, data: Vec<u8>) -> Arc<Self> {
		let mut field = Self::new(name, attrs | FieldAttributes::STATIC | FieldAttributes::HAS_FIELD_RVA, ty);
		if let Some(field) = Arc::get_mut(&mut field) {
			field.rva_data = Some(data);
		}
		field
	}

	pub fn name(&self) -> &Arc<str> {
		&self.name
	}

	pub fn attrs(&self) -> FieldAttributes {
		self.attrs
	}

	pub fn ty(&self) -> &Ty {
		&self.ty
	}

	pub fn declaring_type(&self) -> Option<Arc<TypeDef>> {
		self.declaring_type.borrow().upgrade()
	}

	pub(crate) fn attach_declaring_type(&self, declaring: &Arc<TypeDef>) {
		*self.declaring_type.borrow_mut() = Arc::downgrade(declaring);
	}

	pub fn constant(&self) -> Option<&Constant> {
		self.constant.as_ref()
	}

	pub fn rva_data(&self) -> Option<&[u8]> {
		self.rva_data.as_deref()
	}

	pub fn is_static(&self) -> bool {
		self.attrs.contains(FieldAttributes::STATIC)
	}

	pub fn is_literal(&self) -> bool {
		self.attrs.contains(FieldAttributes::LITERAL)
	}

	/// Current value of a static field, pickled through the statics trailer
	/// when the declaring type is written by value.
	pub fn static_value(&self) -> Option<Value> {
		self.static_value.borrow().clone()
	}

	pub fn set_static_value(&self, value: Value) {
		*self.static_value.borrow_mut() = Some(value);
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}
}

impl Display for FieldDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.declaring_type() {
			Some(ty) => write!(f, "{ty}::{}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

#[derive(Debug, Clone)]
pub struct ParamDef {
	pub name: Option<Arc<str>>,
	pub attrs: ParamAttributes,
	pub ty: Ty,
	pub required_modifiers: Vec<Ty>,
	pub optional_modifiers: Vec<Ty>,
	pub default: Option<Constant>,
}

impl ParamDef {
	pub fn new(name: &str, ty: Ty) -> Self {
		Self {
			name: Some(Arc::from(name)),
			attrs: ParamAttributes::default(),
			ty,
			required_modifiers: Vec::new(),
			optional_modifiers: Vec::new(),
			default: None,
		}
	}

	pub fn has_modifiers(&self) -> bool {
		!self.required_modifiers.is_empty() || !self.optional_modifiers.is_empty()
	}
}

/// An IL method body: local slots plus the raw instruction stream. Operand
/// tokens inside `code` resolve against the declaring module's token map.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MethodBody {
	pub init_locals: bool,
	pub locals: Vec<Ty>,
	#[derivative(Debug(format_with = "crate::utilities::fmt_blob_len"))]
	pub code: Vec<u8>,
}

/// A method or constructor definition. Constructors are methods named
/// `.ctor`/`.cctor` with the ctor flag set.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MethodDef {
	name: Arc<str>,
	attrs: MethodAttributes,
	impl_attrs: MethodImplAttributes,
	calling_convention: CallingConvention,
	is_ctor: bool,
	generic_params: Vec<Arc<str>>,
	return_ty: Ty,
	return_required_modifiers: Vec<Ty>,
	return_optional_modifiers: Vec<Ty>,
	params: Vec<ParamDef>,
	#[derivative(Debug = "ignore")]
	declaring_type: RefCell<Weak<TypeDef>>,
	#[derivative(Debug = "ignore")]
	module: RefCell<Weak<Module>>,
	/// Non-empty marks a constructed generic method over this definition.
	generic_args: RefCell<Vec<Ty>>,
	body: RefCell<Option<Arc<MethodBody>>>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

pub struct MethodDefBuilder {
	name: Arc<str>,
	attrs: MethodAttributes,
	impl_attrs: MethodImplAttributes,
	calling_convention: CallingConvention,
	is_ctor: bool,
	generic_params: Vec<Arc<str>>,
	return_ty: Ty,
	return_required_modifiers: Vec<Ty>,
	return_optional_modifiers: Vec<Ty>,
	params: Vec<ParamDef>,
}

impl MethodDefBuilder {
	pub fn method(name: &str, return_ty: Ty) -> Self {
		Self {
			name: Arc::from(name),
			attrs: MethodAttributes::PUBLIC | MethodAttributes::HIDE_BY_SIG,
			impl_attrs: MethodImplAttributes::default(),
			calling_convention: CallingConvention::HAS_THIS,
			is_ctor: false,
			generic_params: Vec::new(),
			return_ty,
			return_required_modifiers: Vec::new(),
			return_optional_modifiers: Vec::new(),
			params: Vec::new(),
		}
	}

	pub fn ctor() -> Self {
		let mut builder = Self::method(".ctor", Ty::WellKnown(crate::reflection::types::WellKnownType::Void));
		builder.is_ctor = true;
		builder.attrs |= MethodAttributes::SPECIAL_NAME | MethodAttributes::RT_SPECIAL_NAME;
		builder
	}

	pub fn attrs(mut self, attrs: MethodAttributes) -> Self {
		self.attrs = attrs;
		if attrs.contains(MethodAttributes::STATIC) {
			self.calling_convention -= CallingConvention::HAS_THIS;
		}
		self
	}

	pub fn impl_attrs(mut self, impl_attrs: MethodImplAttributes) -> Self {
		self.impl_attrs = impl_attrs;
		self
	}

	pub fn generic_params(mut self, params: &[&str]) -> Self {
		self.generic_params = params.iter().map(|p| Arc::from(*p)).collect();
		if !self.generic_params.is_empty() {
			self.calling_convention |= CallingConvention::GENERIC;
		}
		self
	}

	pub fn param(mut self, param: ParamDef) -> Self {
		self.params.push(param);
		self
	}

	pub fn return_modifiers(mut self, required: Vec<Ty>, optional: Vec<Ty>) -> Self {
		self.return_required_modifiers = required;
		self.return_optional_modifiers = optional;
		self
	}

	pub fn build(self) -> Arc<MethodDef> {
		Arc::new(MethodDef {
			name: self.name,
			attrs: self.attrs,
			impl_attrs: self.impl_attrs,
			calling_convention: self.calling_convention,
			is_ctor: self.is_ctor,
			generic_params: self.generic_params,
			return_ty: self.return_ty,
			return_required_modifiers: self.return_required_modifiers,
			return_optional_modifiers: self.return_optional_modifiers,
			params: self.params,
			declaring_type: RefCell::new(Weak::new()),
			module: RefCell::new(Weak::new()),
			generic_args: RefCell::new(Vec::new()),
			body: RefCell::new(None),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}
}

impl MethodDef {
	pub fn name(&self) -> &Arc<str> {
		&self.name
	}

	pub fn attrs(&self) -> MethodAttributes {
		self.attrs
	}

	pub fn impl_attrs(&self) -> MethodImplAttributes {
		self.impl_attrs
	}

	pub fn calling_convention(&self) -> CallingConvention {
		self.calling_convention
	}

	pub fn is_ctor(&self) -> bool {
		self.is_ctor
	}

	pub fn is_static(&self) -> bool {
		self.attrs.contains(MethodAttributes::STATIC)
	}

	pub fn generic_params(&self) -> &[Arc<str>] {
		&self.generic_params
	}

	pub fn return_ty(&self) -> &Ty {
		&self.return_ty
	}

	pub fn return_modifiers(&self) -> (&[Ty], &[Ty]) {
		(&self.return_required_modifiers, &self.return_optional_modifiers)
	}

	pub fn params(&self) -> &[ParamDef] {
		&self.params
	}

	pub fn declaring_type(&self) -> Option<Arc<TypeDef>> {
		self.declaring_type.borrow().upgrade()
	}

	pub(crate) fn attach_declaring_type(&self, declaring: &Arc<TypeDef>) {
		*self.declaring_type.borrow_mut() = Arc::downgrade(declaring);
		if let Some(module) = declaring.module() {
			*self.module.borrow_mut() = Arc::downgrade(&module);
		}
	}

	pub fn module(&self) -> Option<Arc<Module>> {
		match self.module.borrow().upgrade() {
			Some(module) => Some(module),
			None => self.declaring_type().and_then(|ty| ty.module()),
		}
	}

	pub(crate) fn attach_module(&self, module: &Arc<Module>) {
		*self.module.borrow_mut() = Arc::downgrade(module);
	}

	pub fn generic_args(&self) -> Vec<Ty> {
		self.generic_args.borrow().clone()
	}

	pub fn is_constructed_generic(&self) -> bool {
		!self.generic_args.borrow().is_empty()
	}

	pub fn instantiate(&self, args: Vec<Ty>) {
		*self.generic_args.borrow_mut() = args;
	}

	pub fn body(&self) -> Option<Arc<MethodBody>> {
		self.body.borrow().clone()
	}

	pub fn set_body(&self, body: MethodBody) {
		*self.body.borrow_mut() = Some(Arc::new(body));
	}

	/// Abstract, PInvoke and unmanaged-export methods carry no body.
	pub fn can_have_body(&self) -> bool {
		!self.attrs.intersects(
			MethodAttributes::ABSTRACT | MethodAttributes::PINVOKE_IMPL | MethodAttributes::UNMANAGED_EXPORT,
		)
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}
}

impl Display for MethodDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.declaring_type() {
			Some(ty) => write!(f, "{ty}::{}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct PropertyDef {
	name: Arc<str>,
	attrs: PropertyAttributes,
	ty: Ty,
	index_params: Vec<Ty>,
	#[derivative(Debug = "ignore")]
	declaring_type: RefCell<Weak<TypeDef>>,
	getter: RefCell<Option<Arc<MethodDef>>>,
	setter: RefCell<Option<Arc<MethodDef>>>,
	others: RefCell<Vec<Arc<MethodDef>>>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

impl PropertyDef {
	pub fn new(name: &str, attrs: PropertyAttributes, ty: Ty, index_params: Vec<Ty>) -> Arc<Self> {
		Arc::new(Self {
			name: Arc::from(name),
			attrs,
			ty,
			index_params,
			declaring_type: RefCell::new(Weak::new()),
			getter: RefCell::new(None),
			setter: RefCell::new(None),
			others: RefCell::new(Vec::new()),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}

	pub fn name(&self) -> &Arc<str> {
		&self.name
	}

	pub fn attrs(&self) -> PropertyAttributes {
		self.attrs
	}

	pub fn ty(&self) -> &Ty {
		&self.ty
	}

	pub fn index_params(&self) -> &[Ty] {
		&self.index_params
	}

	pub fn declaring_type(&self) -> Option<Arc<TypeDef>> {
		self.declaring_type.borrow().upgrade()
	}

	pub(crate) fn attach_declaring_type(&self, declaring: &Arc<TypeDef>) {
		*self.declaring_type.borrow_mut() = Arc::downgrade(declaring);
	}

	pub fn getter(&self) -> Option<Arc<MethodDef>> {
		self.getter.borrow().clone()
	}

	pub fn setter(&self) -> Option<Arc<MethodDef>> {
		self.setter.borrow().clone()
	}

	pub fn others(&self) -> Vec<Arc<MethodDef>> {
		self.others.borrow().clone()
	}

	pub fn set_getter(&self, getter: Arc<MethodDef>) {
		*self.getter.borrow_mut() = Some(getter);
	}

	pub fn set_setter(&self, setter: Arc<MethodDef>) {
		*self.setter.borrow_mut() = Some(setter);
	}

	pub fn add_other(&self, accessor: Arc<MethodDef>) {
		self.others.borrow_mut().push(accessor);
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}
}

impl Display for PropertyDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.declaring_type() {
			Some(ty) => write!(f, "{ty}::{}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct EventDef {
	name: Arc<str>,
	attrs: EventAttributes,
	handler_ty: Ty,
	#[derivative(Debug = "ignore")]
	declaring_type: RefCell<Weak<TypeDef>>,
	add: RefCell<Option<Arc<MethodDef>>>,
	remove: RefCell<Option<Arc<MethodDef>>>,
	raise: RefCell<Option<Arc<MethodDef>>>,
	others: RefCell<Vec<Arc<MethodDef>>>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

impl EventDef {
	pub fn new(name: &str, attrs: EventAttributes, handler_ty: Ty) -> Arc<Self> {
		Arc::new(Self {
			name: Arc::from(name),
			attrs,
			handler_ty,
			declaring_type: RefCell::new(Weak::new()),
			add: RefCell::new(None),
			remove: RefCell::new(None),
			raise: RefCell::new(None),
			others: RefCell::new(Vec::new()),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}

	pub fn name(&self) -> &Arc<str> {
		&self.name
	}

	pub fn attrs(&self) -> EventAttributes {
		self.attrs
	}

	pub fn handler_ty(&self) -> &Ty {
		&self.handler_ty
	}

	pub fn declaring_type(&self) -> Option<Arc<TypeDef>> {
		self.declaring_type.borrow().upgrade()
	}

	pub(crate) fn attach_declaring_type(&self, declaring: &Arc<TypeDef>) {
		*self.declaring_type.borrow_mut() = Arc::downgrade(declaring);
	}

	pub fn add_accessor(&self) -> Option<Arc<MethodDef>> {
		self.add.borrow().clone()
	}

	pub fn remove_accessor(&self) -> Option<Arc<MethodDef>> {
		self.remove.borrow().clone()
	}

	pub fn raise_accessor(&self) -> Option<Arc<MethodDef>> {
		self.raise.borrow().clone()
	}

	pub fn others(&self) -> Vec<Arc<MethodDef>> {
		self.others.borrow().clone()
	}

	pub fn set_accessors(&self, add: Arc<MethodDef>, remove: Arc<MethodDef>, raise: Option<Arc<MethodDef>>) {
		*self.add.borrow_mut() = Some(add);
		*self.remove.borrow_mut() = Some(remove);
		*self.raise.borrow_mut() = raise;
	}

	pub fn add_other(&self, accessor: Arc<MethodDef>) {
		self.others.borrow_mut().push(accessor);
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}
}

impl Display for EventDef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.declaring_type() {
			Some(ty) => write!(f, "{ty}::{}", self.name),
			None => write!(f, "{}", self.name),
		}
	}
}

/// Any reflection entity a metadata token or IL operand may designate.
#[derive(Debug, Clone)]
pub enum Member {
	Type(Ty),
	Field(Arc<FieldDef>),
	Method(Arc<MethodDef>),
	Property(Arc<PropertyDef>),
	Event(Arc<EventDef>),
}
