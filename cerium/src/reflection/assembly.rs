use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::reflection::attributes::CustomAttribute;
use crate::reflection::module::Module;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct AssemblyName {
	pub name: Arc<str>,
	pub major_version: u16,
	pub minor_version: u16,
	pub build_number: u16,
	pub revision_number: u16,
	pub culture: Option<Arc<str>>,
	pub public_key_token: Option<[u8; 8]>,
}

impl AssemblyName {
	pub fn new(name: &str) -> Self {
		Self {
			name: Arc::from(name),
			major_version: 0,
			minor_version: 0,
			build_number: 0,
			revision_number: 0,
			culture: None,
			public_key_token: None,
		}
	}
}

impl Display for AssemblyName {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{}, Version={}.{}.{}.{}, Culture={}",
			self.name,
			self.major_version,
			self.minor_version,
			self.build_number,
			self.revision_number,
			self.culture.as_deref().unwrap_or("neutral"),
		)?;
		match self.public_key_token {
			None => write!(f, ", PublicKeyToken=null"),
			Some(token) => {
				write!(f, ", PublicKeyToken=")?;
				for byte in token {
					write!(f, "{byte:02x}")?;
				}
				Ok(())
			}
		}
	}
}

/// An assembly of the reflection surface. Dynamic assemblies have no
/// location and are pickled by value under the default policy.
#[derive(Debug)]
pub struct Assembly {
	name: AssemblyName,
	dynamic: bool,
	location: Option<Arc<str>>,
	corlib: bool,
	modules: RefCell<Vec<Arc<Module>>>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

thread_local! {
	static CORLIB: RefCell<Option<Arc<Assembly>>> = RefCell::new(None);
}

impl Assembly {
	fn new(name: AssemblyName, dynamic: bool, location: Option<&str>, corlib: bool) -> Arc<Self> {
		Arc::new(Self {
			name,
			dynamic,
			location: location.map(Arc::from),
			corlib,
			modules: RefCell::new(Vec::new()),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}

	/// Defines a dynamic, location-less assembly.
	pub fn define_dynamic(name: AssemblyName) -> Arc<Self> {
		Self::new(name, true, None, false)
	}

	/// Declares a loaded assembly resolvable by name at the consumer.
	pub fn declare_loaded(name: AssemblyName, location: &str) -> Arc<Self> {
		Self::new(name, false, Some(location), false)
	}

	/// The standard-library singleton. Always pickled as its one-byte token.
	pub fn corlib() -> Arc<Self> {
		CORLIB.with(|cell| {
			cell.borrow_mut()
				.get_or_insert_with(|| {
					let mut name = AssemblyName::new("mscorlib");
					name.major_version = 4;
					let assembly = Self::new(name, false, Some("corlib"), true);
					Module::attach_manifest(&assembly, "CommonLanguageRuntimeLibrary");
					assembly
				})
				.clone()
		})
	}

	pub fn name(&self) -> &AssemblyName {
		&self.name
	}

	pub fn full_name(&self) -> String {
		self.name.to_string()
	}

	pub fn is_dynamic(&self) -> bool {
		self.dynamic
	}

	pub fn location(&self) -> Option<&str> {
		self.location.as_deref()
	}

	pub fn is_corlib(&self) -> bool {
		self.corlib
	}

	pub fn modules(&self) -> Vec<Arc<Module>> {
		self.modules.borrow().clone()
	}

	/// The first module defined in the assembly.
	pub fn manifest_module(&self) -> Option<Arc<Module>> {
		self.modules.borrow().first().cloned()
	}

	pub fn define_module(self: &Arc<Self>, name: &str) -> Arc<Module> {
		let module = Module::new(name, self);
		self.modules.borrow_mut().push(module.clone());
		module
	}

	pub(crate) fn push_module(&self, module: Arc<Module>) {
		self.modules.borrow_mut().push(module);
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}
}

impl Display for Assembly {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.name, f)
	}
}
