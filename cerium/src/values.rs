use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::reflection::{
	Assembly, EventDef, FieldDef, MethodDef, Module, PropertyDef, Ty, TypeDef, WellKnownType,
};
use crate::utilities::arc_id;

/// A heap object with named field slots, either auto-serialized from its
/// type's field list or, for custom-serialization types, walked verbatim as
/// `(name, value)` entries.
#[derive(Debug)]
pub struct ObjectValue {
	class: Ty,
	fields: RefCell<Vec<(Arc<str>, Value)>>,
}

impl ObjectValue {
	pub fn new(class: Ty) -> Arc<Self> {
		Arc::new(Self { class, fields: RefCell::new(Vec::new()) })
	}

	pub fn class(&self) -> &Ty {
		&self.class
	}

	pub fn set(&self, name: &str, value: Value) {
		let mut fields = self.fields.borrow_mut();
		match fields.iter_mut().find(|(n, _)| n.as_ref() == name) {
			Some(slot) => slot.1 = value,
			None => fields.push((Arc::from(name), value)),
		}
	}

	pub fn get(&self, name: &str) -> Option<Value> {
		self.fields
			.borrow()
			.iter()
			.find(|(n, _)| n.as_ref() == name)
			.map(|(_, v)| v.clone())
	}

	/// Entries in insertion order, as provided by custom serialization.
	pub fn entries(&self) -> Vec<(Arc<str>, Value)> {
		self.fields.borrow().clone()
	}
}

/// Dimensions and contents of an array value. `lower_bounds` is empty for
/// the single-dimension zero-based shape.
#[derive(Debug)]
pub struct ArrayValue {
	element: Ty,
	lengths: Vec<usize>,
	lower_bounds: Vec<i64>,
	items: RefCell<Vec<Value>>,
}

impl ArrayValue {
	/// Single-dimension, zero-lower-bound array.
	pub fn single(element: Ty, items: Vec<Value>) -> Arc<Self> {
		Arc::new(Self {
			element,
			lengths: vec![items.len()],
			lower_bounds: Vec::new(),
			items: RefCell::new(items),
		})
	}

	/// General array with per-dimension lengths and lower bounds. Items are
	/// stored flattened in row-major order.
	pub fn rectangular(element: Ty, lengths: Vec<usize>, lower_bounds: Vec<i64>, items: Vec<Value>) -> Arc<Self> {
		debug_assert_eq!(lengths.len(), lower_bounds.len());
		debug_assert_eq!(lengths.iter().product::<usize>(), items.len());
		Arc::new(Self { element, lengths, lower_bounds, items: RefCell::new(items) })
	}

	pub fn element(&self) -> &Ty {
		&self.element
	}

	pub fn is_single_dimension(&self) -> bool {
		self.lower_bounds.is_empty()
	}

	pub fn rank(&self) -> usize {
		self.lengths.len()
	}

	pub fn lengths(&self) -> &[usize] {
		&self.lengths
	}

	pub fn lower_bounds(&self) -> &[i64] {
		&self.lower_bounds
	}

	pub fn items(&self) -> Vec<Value> {
		self.items.borrow().clone()
	}

	pub fn set(&self, index: usize, value: Value) {
		self.items.borrow_mut()[index] = value;
	}

	pub fn ty(&self) -> Ty {
		Ty::Array {
			rank: match self.is_single_dimension() {
				true => 0,
				false => self.rank(),
			},
			element: Box::new(self.element.clone()),
		}
	}
}

#[derive(Debug)]
pub struct TupleValue {
	ty: Ty,
	items: RefCell<Vec<Value>>,
}

impl TupleValue {
	/// Heap tuple; participates in memoization and may contain itself.
	pub fn boxed(items: Vec<Value>) -> Arc<Self> {
		Self::with_shape(true, items)
	}

	/// Value tuple; always written inline.
	pub fn value(items: Vec<Value>) -> Arc<Self> {
		Self::with_shape(false, items)
	}

	fn with_shape(boxed: bool, items: Vec<Value>) -> Arc<Self> {
		let item_types = items.iter().map(Value::runtime_type).collect();
		Arc::new(Self {
			ty: Ty::Tuple { boxed, items: item_types },
			items: RefCell::new(items),
		})
	}

	pub fn ty(&self) -> &Ty {
		&self.ty
	}

	pub fn items(&self) -> Vec<Value> {
		self.items.borrow().clone()
	}

	pub fn set(&self, index: usize, value: Value) {
		self.items.borrow_mut()[index] = value;
	}
}

#[derive(Debug)]
pub struct DelegateEntry {
	/// `Value::Null` for static-method entries.
	pub target: Value,
	pub method: Arc<MethodDef>,
}

/// A delegate instance with its multicast invocation list.
#[derive(Debug)]
pub struct DelegateValue {
	ty: Ty,
	invocations: Vec<DelegateEntry>,
}

impl DelegateValue {
	pub fn new(ty: Ty, invocations: Vec<DelegateEntry>) -> Arc<Self> {
		Arc::new(Self { ty, invocations })
	}

	pub fn ty(&self) -> &Ty {
		&self.ty
	}

	pub fn invocations(&self) -> &[DelegateEntry] {
		&self.invocations
	}
}

/// Any value the pickler can take as a root or reach through a graph.
#[derive(Clone)]
pub enum Value {
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
	Decimal(i128),
	/// Tick count.
	DateTime(i64),
	Str(Arc<str>),
	/// Raw bits of the underlying value; the width comes from the enum.
	Enum { ty: Arc<TypeDef>, value: u64 },
	Object(Arc<ObjectValue>),
	Array(Arc<ArrayValue>),
	Tuple(Arc<TupleValue>),
	Delegate(Arc<DelegateValue>),
	Type(Ty),
	Assembly(Arc<Assembly>),
	Module(Arc<Module>),
	Field(Arc<FieldDef>),
	Method(Arc<MethodDef>),
	Property(Arc<PropertyDef>),
	Event(Arc<EventDef>),
}

impl Value {
	pub fn string(value: &str) -> Value {
		Value::Str(Arc::from(value))
	}

	/// The runtime type of the value, written as the runtime-type prefix
	/// when the static type cannot pin it down.
	pub fn runtime_type(&self) -> Ty {
		match self {
			Value::Null => Ty::WellKnown(WellKnownType::Object),
			Value::Bool(_) => Ty::WellKnown(WellKnownType::Bool),
			Value::Char(_) => Ty::WellKnown(WellKnownType::Char),
			Value::I8(_) => Ty::WellKnown(WellKnownType::Int8),
			Value::U8(_) => Ty::WellKnown(WellKnownType::UInt8),
			Value::I16(_) => Ty::WellKnown(WellKnownType::Int16),
			Value::U16(_) => Ty::WellKnown(WellKnownType::UInt16),
			Value::I32(_) => Ty::WellKnown(WellKnownType::Int32),
			Value::U32(_) => Ty::WellKnown(WellKnownType::UInt32),
			Value::I64(_) => Ty::WellKnown(WellKnownType::Int64),
			Value::U64(_) => Ty::WellKnown(WellKnownType::UInt64),
			Value::F32(_) => Ty::WellKnown(WellKnownType::Float),
			Value::F64(_) => Ty::WellKnown(WellKnownType::Double),
			Value::Decimal(_) => Ty::WellKnown(WellKnownType::Decimal),
			Value::DateTime(_) => Ty::WellKnown(WellKnownType::DateTime),
			Value::Str(_) => Ty::WellKnown(WellKnownType::String),
			Value::Enum { ty, .. } => Ty::Def(ty.clone()),
			Value::Object(object) => object.class().clone(),
			Value::Array(array) => array.ty(),
			Value::Tuple(tuple) => tuple.ty().clone(),
			Value::Delegate(delegate) => delegate.ty().clone(),
			Value::Type(_) => Ty::WellKnown(WellKnownType::TypeRoot),
			Value::Assembly(_) => Ty::WellKnown(WellKnownType::AssemblyRoot),
			Value::Module(_) => Ty::WellKnown(WellKnownType::ModuleRoot),
			Value::Field(_) => Ty::WellKnown(WellKnownType::FieldRoot),
			Value::Method(method) => match method.is_ctor() {
				true => Ty::WellKnown(WellKnownType::ConstructorRoot),
				false => Ty::WellKnown(WellKnownType::MethodRoot),
			},
			Value::Property(_) => Ty::WellKnown(WellKnownType::PropertyRoot),
			Value::Event(_) => Ty::WellKnown(WellKnownType::EventRoot),
		}
	}

	/// Reference identity for the memo table. `None` for inline values.
	pub fn identity(&self) -> Option<usize> {
		match self {
			Value::Str(s) => Some(arc_id(s)),
			Value::Object(o) => Some(arc_id(o)),
			Value::Array(a) => Some(arc_id(a)),
			Value::Tuple(t) => Some(arc_id(t)),
			Value::Delegate(d) => Some(arc_id(d)),
			Value::Type(Ty::Def(def)) => Some(arc_id(def)),
			Value::Assembly(a) => Some(arc_id(a)),
			Value::Module(m) => Some(arc_id(m)),
			Value::Field(f) => Some(arc_id(f)),
			Value::Method(m) => Some(arc_id(m)),
			Value::Property(p) => Some(arc_id(p)),
			Value::Event(e) => Some(arc_id(e)),
			_ => None,
		}
	}

	/// Whether the memo protocol is handled inside the reflection walker
	/// rather than at the object level.
	pub(crate) fn is_reflection_entity(&self) -> bool {
		matches!(
			self,
			Value::Type(_)
				| Value::Assembly(_)
				| Value::Module(_)
				| Value::Field(_)
				| Value::Method(_)
				| Value::Property(_)
				| Value::Event(_)
		)
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Null => write!(f, "null"),
			Value::Bool(v) => Debug::fmt(v, f),
			Value::Char(v) => Debug::fmt(v, f),
			Value::I8(v) => Debug::fmt(v, f),
			Value::U8(v) => Debug::fmt(v, f),
			Value::I16(v) => Debug::fmt(v, f),
			Value::U16(v) => Debug::fmt(v, f),
			Value::I32(v) => Debug::fmt(v, f),
			Value::U32(v) => Debug::fmt(v, f),
			Value::I64(v) => Debug::fmt(v, f),
			Value::U64(v) => Debug::fmt(v, f),
			Value::F32(v) => Debug::fmt(v, f),
			Value::F64(v) => Debug::fmt(v, f),
			Value::Decimal(v) => write!(f, "{v}m"),
			Value::DateTime(v) => write!(f, "DateTime({v})"),
			Value::Str(v) => Debug::fmt(v, f),
			Value::Enum { ty, value } => write!(f, "{ty}({value})"),
			Value::Object(v) => write!(f, "{}{{..}}", v.class()),
			Value::Array(v) => write!(f, "{:?}", v.ty()),
			Value::Tuple(v) => write!(f, "{:?}", v.ty()),
			Value::Delegate(v) => write!(f, "{:?}", v.ty()),
			Value::Type(v) => write!(f, "typeof({v})"),
			Value::Assembly(v) => write!(f, "assembly({v})"),
			Value::Module(v) => write!(f, "module({v})"),
			Value::Field(v) => write!(f, "field({v})"),
			Value::Method(v) => write!(f, "method({v})"),
			Value::Property(v) => write!(f, "property({v})"),
			Value::Event(v) => write!(f, "event({v})"),
		}
	}
}
