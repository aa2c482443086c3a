use std::sync::Arc;

use crate::reflection::members::MethodDef;
use crate::reflection::types::Ty;

/// A custom-attribute argument value, tagged with the CLI element-type code
/// it is written under.
#[derive(Debug, Clone)]
pub enum AttrValue {
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
	Str(Option<Arc<str>>),
	/// A type literal (`typeof` argument).
	Type(Ty),
	/// Raw bits of the underlying value; the width comes from the enum.
	Enum { ty: Ty, value: u64 },
	/// Single-dimension array with its element type; `None` is a null array.
	Array { element: Ty, items: Option<Vec<AttrValue>> },
	/// An argument declared `object`, boxed with the tag of its actual type.
	Boxed(Box<AttrValue>),
}

impl AttrValue {
	/// CLI element-type code used as the wire tag.
	pub const fn code(&self) -> u8 {
		match self {
			AttrValue::Bool(_) => 0x02,
			AttrValue::Char(_) => 0x03,
			AttrValue::I8(_) => 0x04,
			AttrValue::U8(_) => 0x05,
			AttrValue::I16(_) => 0x06,
			AttrValue::U16(_) => 0x07,
			AttrValue::I32(_) => 0x08,
			AttrValue::U32(_) => 0x09,
			AttrValue::I64(_) => 0x0A,
			AttrValue::U64(_) => 0x0B,
			AttrValue::F32(_) => 0x0C,
			AttrValue::F64(_) => 0x0D,
			AttrValue::Str(_) => 0x0E,
			AttrValue::Array { .. } => 0x1D,
			AttrValue::Type(_) => 0x50,
			AttrValue::Boxed(_) => 0x51,
			AttrValue::Enum { .. } => 0x55,
		}
	}
}

/// Wire tag for a named argument targeting a field.
pub const NAMED_ARG_FIELD: u8 = 0x53;
/// Wire tag for a named argument targeting a property.
pub const NAMED_ARG_PROPERTY: u8 = 0x54;

/// One custom attribute: the constructor, its positional arguments and the
/// named field/property arguments.
#[derive(Debug, Clone)]
pub struct CustomAttribute {
	pub ctor: Arc<MethodDef>,
	pub fixed_args: Vec<AttrValue>,
	pub named_fields: Vec<(Arc<str>, AttrValue)>,
	pub named_properties: Vec<(Arc<str>, AttrValue)>,
}

impl CustomAttribute {
	pub fn new(ctor: Arc<MethodDef>, fixed_args: Vec<AttrValue>) -> Self {
		Self {
			ctor,
			fixed_args,
			named_fields: Vec::new(),
			named_properties: Vec::new(),
		}
	}

	pub fn with_named_field(mut self, name: &str, value: AttrValue) -> Self {
		self.named_fields.push((Arc::from(name), value));
		self
	}

	pub fn with_named_property(mut self, name: &str, value: AttrValue) -> Self {
		self.named_properties.push((Arc::from(name), value));
		self
	}

	/// The attribute type, i.e. the constructor's declaring type.
	pub fn attribute_type(&self) -> Option<Ty> {
		self.ctor.declaring_type().map(Ty::Def)
	}
}
