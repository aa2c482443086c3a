use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::SystemTime;

use memory_stats::memory_stats;
use tracing_flame::FlameLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use cerium::reflection::{
	Assembly, AssemblyName, FieldAttributes, FieldDef, MethodAttributes, MethodBody,
	MethodDefBuilder, TokenTarget, Ty, TypeAttributes, TypeDef, TypeDefKind, WellKnownType,
};
use cerium::values::{ArrayValue, ObjectValue};
use cerium::{Pickler, Value};

fn setup_global_subscriber() -> impl Drop {
	let file = File::create("./trace.folded").unwrap();
	let flame_layer = FlameLayer::new(BufWriter::new(file)).with_file_and_line(false);
	let guard = flame_layer.flush_on_drop();

	let subscriber = Registry::default()
		.with(flame_layer);

	tracing::subscriber::set_global_default(subscriber).expect("Could not set global default");
	guard
}

/// Builds a synthetic dynamic assembly: `type_count` classes, each with a
/// couple of fields and one self-calling method body, plus one instance of
/// every class.
fn build_assembly(type_count: usize) -> (Arc<Assembly>, Vec<Value>) {
	let assembly = Assembly::define_dynamic(AssemblyName::new("Synthetic"));
	let module = assembly.define_module("main");

	let mut roots = Vec::with_capacity(type_count);
	for i in 0..type_count {
		let def = TypeDef::new(
			"Synthetic",
			&format!("Generated{i}"),
			TypeAttributes::PUBLIC,
			TypeDefKind::Class,
		);
		def.attach_field(&FieldDef::new("id", FieldAttributes::PUBLIC, Ty::WellKnown(WellKnownType::Int32)));
		def.attach_field(&FieldDef::new("label", FieldAttributes::PUBLIC, Ty::WellKnown(WellKnownType::String)));

		let method = MethodDefBuilder::method("Run", Ty::WellKnown(WellKnownType::Void))
			.attrs(MethodAttributes::PUBLIC | MethodAttributes::STATIC)
			.build();
		def.attach_method(&method);
		module.define_type(def.clone());

		let token = module.define_token(TokenTarget::Method(method.clone()));
		let mut code = vec![0x00, 0x28];
		code.extend_from_slice(&token.raw().to_le_bytes());
		code.push(0x2A);
		method.set_body(MethodBody { init_locals: false, locals: vec![], code });

		let object = ObjectValue::new(Ty::Def(def));
		object.set("id", Value::I32(i as i32));
		object.set("label", Value::string(&format!("instance {i}")));
		roots.push(Value::Object(object));
	}

	(assembly, roots)
}

fn main() {
	let _guard = setup_global_subscriber();

	let mut start = SystemTime::now();
	let (_assembly, roots) = build_assembly(1000);

	println! {
		"Graph construction time: {:?}, RAM: {}MB",
		start.elapsed().unwrap(),
		memory_stats().unwrap().virtual_mem as f32 / 1000000.0,
	}

	start = SystemTime::now();

	let object = Ty::WellKnown(WellKnownType::Object);
	let root = Value::Array(ArrayValue::single(object.clone(), roots));
	let bytes = Pickler::new()
		.serialize_to_vec(&root, &Ty::szarray(object))
		.unwrap();

	println! {
		"Pickle time: {:?}, RAM: {}MB",
		start.elapsed().unwrap(),
		memory_stats().unwrap().virtual_mem as f32 / 1000000.0,
	}

	println!("Stream size: {} bytes", bytes.len());
}
