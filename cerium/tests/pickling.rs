use std::sync::Arc;

use cerium::reflection::{
	Assembly, AssemblyName, Constant, FieldAttributes, FieldDef, MethodAttributes,
	MethodDefBuilder, Module, ParamDef, TokenTarget, Ty, TypeAttributes, TypeDef, TypeDefKind,
	WellKnownType,
};
use cerium::signature::Signature;
use cerium::values::{ArrayValue, DelegateEntry, DelegateValue, ObjectValue, TupleValue};
use cerium::{Factory, PickleError, Pickler, Reducer, Reduction, Value};

fn object() -> Ty {
	Ty::WellKnown(WellKnownType::Object)
}

fn int32() -> Ty {
	Ty::WellKnown(WellKnownType::Int32)
}

fn dynamic_module(assembly_name: &str) -> (Arc<Assembly>, Arc<Module>) {
	let assembly = Assembly::define_dynamic(AssemblyName::new(assembly_name));
	let module = assembly.define_module("main");
	(assembly, module)
}

const PREAMBLE: [u8; 8] = [b'C', b'E', b'R', b'1', 1, 0, 1, 0];

#[test]
fn primitive_root_elides_every_prefix() {
	// A sealed value-type static context pins everything: after the
	// preamble the payload follows directly, little-endian.
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::I32(0x12345678), &int32())
		.unwrap();
	let mut expected = PREAMBLE.to_vec();
	expected.extend_from_slice(&[0x78, 0x56, 0x34, 0x12]);
	assert_eq!(bytes, expected);
}

#[test]
fn shared_string_is_memoized_once() {
	let shared: Arc<str> = Arc::from("x");
	let array = ArrayValue::single(
		object(),
		vec![Value::Str(shared.clone()), Value::Str(shared.clone())],
	);
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Array(array), &Ty::szarray(object()))
		.unwrap();

	let mut expected = PREAMBLE.to_vec();
	expected.extend_from_slice(&[
		0x01, // Object tag of the array, at offset 8
		0x04, 0x00, 0x20, // runtime type: ArrayType, rank 0, Object element
		0x0A, 0x00, // array info (sealed, element-bearing), Object info
		0x02, // length 2
		0x01, // Object tag of the string, at offset 15
		0x1F, // runtime type: String token
		0x02, // string info (sealed)
		0x01, b'x', // the string itself
		0x02, 0x0F, 0x00, // Memo + position 15 in 15-bit groups
	]);
	assert_eq!(bytes, expected);
}

#[test]
fn rectangular_array_writes_bounds_then_raw_bytes() {
	let array = ArrayValue::rectangular(
		Ty::WellKnown(WellKnownType::Int16),
		vec![2, 3],
		vec![1, 2],
		vec![
			Value::I16(10),
			Value::I16(20),
			Value::I16(30),
			Value::I16(40),
			Value::I16(50),
			Value::I16(60),
		],
	);
	let static_ty = Ty::Array {
		rank: 2,
		element: Box::new(Ty::WellKnown(WellKnownType::Int16)),
	};
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Array(array), &static_ty)
		.unwrap();

	let mut expected = PREAMBLE.to_vec();
	expected.push(0x01); // Object tag; the value-typed root element elides the runtime type
	expected.extend_from_slice(&[0x02, 0x02, 0x03, 0x04]); // (len 2, lb 1), (len 3, lb 2) zigzagged
	expected.extend_from_slice(&[
		0x0A, 0x00, 0x14, 0x00, 0x1E, 0x00, 0x28, 0x00, 0x32, 0x00, 0x3C, 0x00,
	]);
	assert_eq!(bytes, expected);
}

#[test]
fn cyclic_record_resolves_to_a_back_reference() {
	let (_assembly, module) = dynamic_module("cyclic");
	let node = TypeDef::new("Lab", "Node", TypeAttributes::PUBLIC, TypeDefKind::Class);
	node.attach_field(&FieldDef::new("next", FieldAttributes::PUBLIC, object()));
	module.define_type(node.clone());

	let record = ObjectValue::new(Ty::Def(node));
	record.set("next", Value::Object(record.clone()));

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Object(record), &object())
		.unwrap();

	// The root object is tagged at offset 8; its single field points back
	// at it as a Memo of position 8.
	let memo = [0x02, 0x08, 0x00];
	assert!(bytes.windows(3).any(|w| w == memo));
}

#[test]
fn value_tuples_never_alias() {
	// Two slots sharing one value-tuple instance must encode exactly like
	// two separately built tuples with equal contents: identity is
	// invisible for value types.
	let shared = TupleValue::value(vec![Value::I32(1), Value::I32(2)]);
	let aliased = ArrayValue::single(
		object(),
		vec![Value::Tuple(shared.clone()), Value::Tuple(shared)],
	);
	let copies = ArrayValue::single(
		object(),
		vec![
			Value::Tuple(TupleValue::value(vec![Value::I32(1), Value::I32(2)])),
			Value::Tuple(TupleValue::value(vec![Value::I32(1), Value::I32(2)])),
		],
	);
	let pickler = Pickler::new();
	let static_ty = Ty::szarray(object());
	assert_eq!(
		pickler.serialize_to_vec(&Value::Array(aliased), &static_ty).unwrap(),
		pickler.serialize_to_vec(&Value::Array(copies), &static_ty).unwrap(),
	);
}

#[test]
fn boxed_tuple_may_contain_itself() {
	let tuple = TupleValue::boxed(vec![Value::Null, Value::I32(7)]);
	tuple.set(0, Value::Tuple(tuple.clone()));
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Tuple(tuple), &object())
		.unwrap();
	assert!(bytes.len() > PREAMBLE.len());
}

#[test]
fn nullable_writes_one_presence_byte() {
	let pickler = Pickler::new();
	let nullable = Ty::Nullable(Box::new(int32()));

	let absent = pickler.serialize_to_vec(&Value::Null, &nullable).unwrap();
	assert_eq!(absent[PREAMBLE.len()..], [0x00]);

	let present = pickler.serialize_to_vec(&Value::I32(5), &nullable).unwrap();
	assert_eq!(present[PREAMBLE.len()..], [0x01, 0x05, 0x00, 0x00, 0x00]);
}

#[test]
fn enums_write_their_underlying_width() {
	let (_assembly, module) = dynamic_module("enums");
	let color = TypeDef::new(
		"Lab",
		"Color",
		TypeAttributes::PUBLIC,
		TypeDefKind::Enum {
			underlying: WellKnownType::Int16,
			variants: vec![(Arc::from("Red"), 0), (Arc::from("Green"), 513)],
		},
	);
	module.define_type(color.clone());

	let value = Value::Enum { ty: color.clone(), value: 513 };
	let bytes = Pickler::new()
		.serialize_to_vec(&value, &Ty::Def(color))
		.unwrap();
	// Value-type static context: the two underlying bytes and nothing else.
	assert_eq!(bytes[PREAMBLE.len()..], [0x01, 0x02]);
}

#[test]
fn pointers_are_rejected_at_dispatch() {
	let err = Pickler::new()
		.serialize_to_vec(&Value::I32(1), &Ty::Pointer(Box::new(int32())))
		.unwrap_err();
	assert!(matches!(err, PickleError::UnserializablePointer(_)));
}

#[test]
fn derived_reflection_types_are_not_stable_static_contexts() {
	let (_assembly, module) = dynamic_module("reflection");
	let runtime_type = TypeDef::new("Lab", "RuntimeType", TypeAttributes::PUBLIC, TypeDefKind::Class);
	runtime_type.set_base(Ty::WellKnown(WellKnownType::TypeRoot));
	module.define_type(runtime_type.clone());

	let err = Pickler::new()
		.serialize_to_vec(&Value::Type(int32()), &Ty::Def(runtime_type))
		.unwrap_err();
	assert!(matches!(err, PickleError::UnstableStaticType(_)));

	// The root itself is fine.
	Pickler::new()
		.serialize_to_vec(&Value::Type(int32()), &Ty::WellKnown(WellKnownType::TypeRoot))
		.unwrap();
}

#[test]
fn marshal_by_ref_inheritors_are_rejected() {
	let (_assembly, module) = dynamic_module("remoting");
	let proxy = TypeDef::new("Lab", "Proxy", TypeAttributes::PUBLIC, TypeDefKind::Class);
	proxy.set_base(Ty::WellKnown(WellKnownType::MarshalByRef));
	module.define_type(proxy.clone());

	let err = Pickler::new()
		.serialize_to_vec(&Value::Object(ObjectValue::new(Ty::Def(proxy))), &object())
		.unwrap_err();
	assert!(matches!(err, PickleError::UnserializableMarshalByRef(_)));
}

#[test]
fn rank_above_255_is_rejected() {
	let array_ty = Ty::Array { rank: 300, element: Box::new(object()) };
	let array = ArrayValue::rectangular(object(), vec![0; 300], vec![0; 300], vec![]);
	let err = Pickler::new()
		.serialize_to_vec(&Value::Array(array), &array_ty)
		.unwrap_err();
	assert!(matches!(err, PickleError::UnsupportedRank(300)));
}

#[test]
fn missing_fields_name_the_offender() {
	let (_assembly, module) = dynamic_module("partial");
	let pair = TypeDef::new("Lab", "Pair", TypeAttributes::PUBLIC, TypeDefKind::Class);
	pair.attach_field(&FieldDef::new("a", FieldAttributes::PUBLIC, int32()));
	pair.attach_field(&FieldDef::new("b", FieldAttributes::PUBLIC, int32()));
	module.define_type(pair.clone());

	let object_value = ObjectValue::new(Ty::Def(pair));
	object_value.set("a", Value::I32(1));
	let err = Pickler::new()
		.serialize_to_vec(&Value::Object(object_value), &object())
		.unwrap_err();
	match err {
		PickleError::MissingField(name) => assert!(name.ends_with("::b")),
		other => panic!("expected MissingField, got {other:?}"),
	}
}

struct DictReducer {
	ctor: Arc<cerium::reflection::MethodDef>,
}

impl Reducer for DictReducer {
	fn reduce(&self, value: &Value) -> Result<Reduction, PickleError> {
		let entries = match value {
			Value::Object(object) => object.get("entries").unwrap_or(Value::Null),
			_ => Value::Null,
		};
		Ok(Reduction {
			factory: Factory::Constructor(self.ctor.clone()),
			receiver: None,
			args: vec![entries, Value::Null],
		})
	}
}

fn dict_fixture() -> (Arc<Assembly>, Arc<TypeDef>, Arc<cerium::reflection::MethodDef>) {
	let (assembly, module) = dynamic_module("containers");
	let dict = TypeDef::new("Lab", "Dict", TypeAttributes::PUBLIC | TypeAttributes::SEALED, TypeDefKind::Class);
	let ctor = MethodDefBuilder::ctor()
		.param(ParamDef::new("entries", Ty::szarray(object())))
		.param(ParamDef::new("comparer", object()))
		.build();
	dict.attach_ctor(&ctor);
	module.define_type(dict.clone());
	(assembly, dict, ctor)
}

#[test]
fn reduced_containers_record_their_factory() {
	let (_assembly, dict, ctor) = dict_fixture();

	let mut pickler = Pickler::new();
	pickler
		.reducers_mut()
		.register(Ty::Def(dict.clone()), Arc::new(DictReducer { ctor }));

	let value = ObjectValue::new(Ty::Def(dict));
	value.set(
		"entries",
		Value::Array(ArrayValue::single(object(), vec![Value::I32(1)])),
	);
	let bytes = pickler
		.serialize_to_vec(&Value::Object(value), &object())
		.unwrap();
	assert!(bytes.len() > PREAMBLE.len());
}

#[test]
fn invalid_reductions_are_refused() {
	struct BadReducer {
		method: Arc<cerium::reflection::MethodDef>,
	}
	impl Reducer for BadReducer {
		fn reduce(&self, _: &Value) -> Result<Reduction, PickleError> {
			Ok(Reduction {
				factory: Factory::Method(self.method.clone()),
				receiver: None,
				args: vec![],
			})
		}
	}

	let (_assembly, module) = dynamic_module("broken");
	let dict = TypeDef::new("Lab", "Dict", TypeAttributes::PUBLIC, TypeDefKind::Class);
	// Returns Int32, not the reduced type: the factory contract fails.
	let factory = MethodDefBuilder::method("Make", int32())
		.attrs(MethodAttributes::PUBLIC | MethodAttributes::STATIC)
		.build();
	dict.attach_method(&factory);
	module.define_type(dict.clone());

	let mut pickler = Pickler::new();
	pickler
		.reducers_mut()
		.register(Ty::Def(dict.clone()), Arc::new(BadReducer { method: factory }));

	let err = pickler
		.serialize_to_vec(&Value::Object(ObjectValue::new(Ty::Def(dict))), &object())
		.unwrap_err();
	assert!(matches!(err, PickleError::InvalidReduction(_)));
}

#[test]
fn custom_serialization_walks_provided_entries() {
	let (_assembly, module) = dynamic_module("custom");
	let bag = TypeDef::new("Lab", "Bag", TypeAttributes::PUBLIC, TypeDefKind::Class);
	bag.mark_custom_serialization();
	module.define_type(bag.clone());

	let value = ObjectValue::new(Ty::Def(bag));
	value.set("anything", Value::I32(3));
	value.set("else", Value::string("ok"));
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Object(value), &object())
		.unwrap();
	assert!(bytes.len() > PREAMBLE.len());
}

#[test]
fn delegates_write_their_invocation_list() {
	let (_assembly, module) = dynamic_module("events");
	let handler = TypeDef::new(
		"Lab",
		"Handler",
		TypeAttributes::PUBLIC | TypeAttributes::SEALED,
		TypeDefKind::Delegate {
			invoke: Signature {
				name: "Invoke".to_string(),
				calling_convention: cerium::signature::CallingConvention::HAS_THIS,
				generic_param_count: 0,
				return_element: cerium::signature::SigElement::Named("System.Void".to_string()),
				parameters: vec![],
			},
		},
	);
	module.define_type(handler.clone());

	let target = MethodDefBuilder::method("OnTick", Ty::WellKnown(WellKnownType::Void))
		.attrs(MethodAttributes::PUBLIC | MethodAttributes::STATIC)
		.build();
	let host = TypeDef::new("Lab", "Host", TypeAttributes::PUBLIC, TypeDefKind::Class);
	host.attach_method(&target);
	module.define_type(host);

	let delegate = DelegateValue::new(
		Ty::Def(handler),
		vec![DelegateEntry { target: Value::Null, method: target }],
	);
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Delegate(delegate), &object())
		.unwrap();
	assert!(bytes.len() > PREAMBLE.len());
}

/// Builds a dynamic value type whose single method calls itself through a
/// module token, then pickles the type definition.
fn self_calling_fixture() -> (Arc<Assembly>, Arc<TypeDef>) {
	let (assembly, module) = dynamic_module("emitted");
	let counter = TypeDef::new("Lab", "Counter", TypeAttributes::PUBLIC, TypeDefKind::Struct);
	let tick = MethodDefBuilder::method("Tick", Ty::WellKnown(WellKnownType::Void))
		.attrs(MethodAttributes::PUBLIC | MethodAttributes::STATIC)
		.build();
	counter.attach_method(&tick);
	module.define_type(counter.clone());

	let token = module.define_token(TokenTarget::Method(tick.clone()));
	let mut code = vec![0x00]; // nop
	code.push(0x28); // call
	code.extend_from_slice(&token.raw().to_le_bytes());
	code.push(0x2A); // ret
	tick.set_body(cerium::reflection::MethodBody { init_locals: false, locals: vec![], code });

	(assembly, counter)
}

#[test]
fn dynamic_type_bodies_flush_through_the_trailer() {
	let (_assembly, counter) = self_calling_fixture();
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Type(Ty::Def(counter)), &object())
		.unwrap();

	// The translated body ends with the sentinel, and the embedded call
	// rewrites its token into a method reference that resolves back into
	// the stream, so the raw token bytes must not survive.
	assert!(bytes.contains(&0xFF));
	let raw_token = 0x0600_0001u32.to_le_bytes();
	assert_eq!(bytes.windows(4).filter(|w| *w == raw_token).count(), 0);
}

#[test]
fn streams_are_deterministic_across_runs() {
	let run = || {
		let (_assembly, counter) = self_calling_fixture();
		Pickler::new()
			.serialize_to_vec(&Value::Type(Ty::Def(counter)), &object())
			.unwrap()
	};
	assert_eq!(run(), run());
}

#[test]
fn corlib_collapses_to_single_byte_tokens() {
	let corlib = Assembly::corlib();
	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Assembly(corlib), &object())
		.unwrap();
	// Object tag, AssemblyRoot runtime type, info byte, MscorlibAssembly.
	assert_eq!(bytes[PREAMBLE.len()..], [0x01, 0x22, 0x04, 0x01]);
}

#[test]
fn literal_fields_carry_constants() {
	let (_assembly, module) = dynamic_module("consts");
	let limits = TypeDef::new("Lab", "Limits", TypeAttributes::PUBLIC, TypeDefKind::Class);
	limits.attach_field(&FieldDef::new_literal(
		"Max",
		FieldAttributes::PUBLIC | FieldAttributes::STATIC,
		int32(),
		Constant::I32(9000),
	));
	module.define_type(limits.clone());

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Type(Ty::Def(limits)), &object())
		.unwrap();
	assert!(bytes.windows(4).any(|w| w == 9000i32.to_le_bytes()));
}

#[test]
fn static_field_values_run_after_the_graph() {
	let (_assembly, module) = dynamic_module("statics");
	let registry = TypeDef::new("Lab", "Registry", TypeAttributes::PUBLIC, TypeDefKind::Class);
	let slot = FieldDef::new("Count", FieldAttributes::PUBLIC | FieldAttributes::STATIC, int32());
	slot.set_static_value(Value::I32(0x0B0B_0B0B));
	registry.attach_field(&slot);
	module.define_type(registry.clone());

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Type(Ty::Def(registry)), &object())
		.unwrap();
	let payload = 0x0B0B_0B0Bi32.to_le_bytes();
	let position = bytes
		.windows(4)
		.position(|w| w == payload)
		.expect("static value missing");
	// Statics land in the trailer region, after the definition itself.
	assert!(position > PREAMBLE.len() + 8);
}

#[test]
fn module_rva_blobs_compress_zero_runs() {
	let byte_array = || Ty::szarray(Ty::WellKnown(WellKnownType::UInt8));
	let pickle_with_blob = |blob: Vec<u8>| {
		let (_assembly, module) = dynamic_module("rva");
		module.define_global_field(FieldDef::new_rva("data", FieldAttributes::ASSEMBLY, byte_array(), blob));
		Pickler::new()
			.serialize_to_vec(&Value::Module(module), &object())
			.unwrap()
	};

	// An all-zero blob collapses into a negated length with no payload, so
	// the stream shrinks by almost the whole blob.
	let with_zeros = pickle_with_blob(vec![0; 64]);
	let with_ones = pickle_with_blob(vec![1; 64]);
	assert!(with_ones.len() >= with_zeros.len() + 60);
}

#[test]
fn properties_and_events_ride_the_type_definition() {
	use cerium::reflection::{EventAttributes, EventDef, PropertyAttributes, PropertyDef};

	let (_assembly, module) = dynamic_module("accessors");
	let handler = TypeDef::new(
		"Lab",
		"Changed",
		TypeAttributes::PUBLIC | TypeAttributes::SEALED,
		TypeDefKind::Delegate {
			invoke: Signature {
				name: "Invoke".to_string(),
				calling_convention: cerium::signature::CallingConvention::HAS_THIS,
				generic_param_count: 0,
				return_element: cerium::signature::SigElement::Named("System.Void".to_string()),
				parameters: vec![],
			},
		},
	);
	module.define_type(handler.clone());

	let widget = TypeDef::new("Lab", "Widget", TypeAttributes::PUBLIC, TypeDefKind::Class);
	let getter = MethodDefBuilder::method("get_Size", int32()).build();
	let setter = MethodDefBuilder::method("set_Size", Ty::WellKnown(WellKnownType::Void))
		.param(ParamDef::new("value", int32()))
		.build();
	widget.attach_method(&getter);
	widget.attach_method(&setter);
	let size = PropertyDef::new("Size", PropertyAttributes::default(), int32(), vec![]);
	size.set_getter(getter);
	size.set_setter(setter);
	widget.attach_property(&size);

	let add = MethodDefBuilder::method("add_Changed", Ty::WellKnown(WellKnownType::Void))
		.param(ParamDef::new("value", Ty::Def(handler.clone())))
		.build();
	let remove = MethodDefBuilder::method("remove_Changed", Ty::WellKnown(WellKnownType::Void))
		.param(ParamDef::new("value", Ty::Def(handler.clone())))
		.build();
	widget.attach_method(&add);
	widget.attach_method(&remove);
	let changed = EventDef::new("Changed", EventAttributes::default(), Ty::Def(handler));
	changed.set_accessors(add, remove, None);
	widget.attach_event(&changed);
	module.define_type(widget.clone());

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Type(Ty::Def(widget)), &object())
		.unwrap();
	assert!(bytes.windows(4).any(|w| w == b"Size"));
	assert!(bytes.windows(7).any(|w| w == b"Changed"));
}

#[test]
fn custom_attributes_flush_through_the_trailer() {
	use cerium::reflection::{AttrValue, CustomAttribute};

	let (assembly, module) = dynamic_module("attrs");
	let marker = TypeDef::new("Lab", "MarkerAttribute", TypeAttributes::PUBLIC, TypeDefKind::Class);
	let ctor = MethodDefBuilder::ctor()
		.param(ParamDef::new("level", int32()))
		.build();
	marker.attach_ctor(&ctor);
	module.define_type(marker);

	assembly.add_custom_attribute(
		CustomAttribute::new(ctor, vec![AttrValue::I32(3)])
			.with_named_field("Reason", AttrValue::Str(Some(Arc::from("because")))),
	);

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Assembly(assembly), &object())
		.unwrap();
	// The named-argument row: field tag, string tag, then the name.
	assert!(bytes.windows(6).any(|w| w == b"Reason"));
	let row = [0x53, 0x0E];
	assert!(bytes.windows(2).any(|w| w == row));
}

#[test]
fn own_generic_parameters_collapse_to_context_slots() {
	let (_assembly, module) = dynamic_module("generics");
	let holder = TypeDef::new_generic("Lab", "Holder", TypeAttributes::PUBLIC, TypeDefKind::Class, &["T"]);
	holder.attach_field(&FieldDef::new(
		"value",
		FieldAttributes::PUBLIC,
		Ty::TypeParam { owner: holder.clone(), position: 0 },
	));
	module.define_type(holder.clone());

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Type(Ty::Def(holder)), &object())
		.unwrap();
	// Inside the definition the parameter is a TVar slot at position 0.
	assert!(bytes.windows(2).any(|w| w == [0x07, 0x00]));
}

#[test]
fn constructed_generic_methods_carry_their_arguments() {
	let (_assembly, module) = dynamic_module("methodspec");
	let host = TypeDef::new("Lab", "Host", TypeAttributes::PUBLIC, TypeDefKind::Class);
	let of = MethodDefBuilder::method("Of", Ty::WellKnown(WellKnownType::Void))
		.attrs(MethodAttributes::PUBLIC | MethodAttributes::STATIC)
		.generic_params(&["T"])
		.build();
	host.attach_method(&of);
	module.define_type(host.clone());
	of.instantiate(vec![int32()]);

	let bytes = Pickler::new()
		.serialize_to_vec(&Value::Method(of), &object())
		.unwrap();
	// One generic argument: the Int32 token right after the argument count.
	assert!(bytes.windows(2).any(|w| w == [0x01, 0x17]));
}

#[test]
fn too_many_modifiers_are_rejected() {
	let (_assembly, module) = dynamic_module("modifiers");
	let host = TypeDef::new("Lab", "Host", TypeAttributes::PUBLIC, TypeDefKind::Class);
	let mut param = ParamDef::new("value", int32());
	param.required_modifiers = vec![object(); 8];
	let method = MethodDefBuilder::method("M", Ty::WellKnown(WellKnownType::Void))
		.param(param)
		.build();
	host.attach_method(&method);
	module.define_type(host.clone());

	let err = Pickler::new()
		.serialize_to_vec(&Value::Type(Ty::Def(host)), &object())
		.unwrap_err();
	assert!(matches!(err, PickleError::UnsupportedModifierCount(_)));
}
