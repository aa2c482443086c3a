use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};

use fxhash::FxHashMap;
use uuid::Uuid;

use crate::reflection::assembly::Assembly;
use crate::reflection::attributes::CustomAttribute;
use crate::reflection::members::{FieldDef, MethodDef};
use crate::reflection::token::{MetadataToken, MetadataTokenKind, SignatureToken, StringToken};
use crate::reflection::types::TypeDef;
use crate::signature::Signature;

/// What a metadata token resolves to within its module.
#[derive(Debug, Clone)]
pub enum TokenTarget {
	Type(crate::reflection::types::Ty),
	Field(Arc<FieldDef>),
	Method(Arc<MethodDef>),
	String(Arc<str>),
	Signature(Arc<Signature>),
}

/// A module of the reflection surface. IL bodies of its methods embed
/// tokens that resolve through the module token map.
#[derive(Debug)]
pub struct Module {
	name: Arc<str>,
	mvid: Uuid,
	assembly: RefCell<Weak<Assembly>>,
	types: RefCell<Vec<Arc<TypeDef>>>,
	global_fields: RefCell<Vec<Arc<FieldDef>>>,
	global_methods: RefCell<Vec<Arc<MethodDef>>>,
	tokens: RefCell<FxHashMap<u32, TokenTarget>>,
	token_rows: RefCell<FxHashMap<u32, u32>>,
	custom_attributes: RefCell<Vec<CustomAttribute>>,
}

impl Module {
	pub(crate) fn new(name: &str, assembly: &Arc<Assembly>) -> Arc<Self> {
		Arc::new(Self {
			name: Arc::from(name),
			// Derived from the name so repeated runs stay byte-stable.
			mvid: Uuid::from_u64_pair(fxhash::hash64(name.as_bytes()), name.len() as u64),
			assembly: RefCell::new(Arc::downgrade(assembly)),
			types: RefCell::new(Vec::new()),
			global_fields: RefCell::new(Vec::new()),
			global_methods: RefCell::new(Vec::new()),
			tokens: RefCell::new(FxHashMap::default()),
			token_rows: RefCell::new(FxHashMap::default()),
			custom_attributes: RefCell::new(Vec::new()),
		})
	}

	pub(crate) fn attach_manifest(assembly: &Arc<Assembly>, name: &str) -> Arc<Self> {
		let module = Self::new(name, assembly);
		assembly.push_module(module.clone());
		module
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn mvid(&self) -> Uuid {
		self.mvid
	}

	pub fn assembly(&self) -> Option<Arc<Assembly>> {
		self.assembly.borrow().upgrade()
	}

	/// Whether this is the first (manifest) module of its assembly.
	pub fn is_manifest(&self) -> bool {
		match self.assembly() {
			None => false,
			Some(assembly) => assembly
				.manifest_module()
				.is_some_and(|m| Arc::as_ptr(&m) == self as *const Self),
		}
	}

	pub fn types(&self) -> Vec<Arc<TypeDef>> {
		self.types.borrow().clone()
	}

	pub fn define_type(self: &Arc<Self>, def: Arc<TypeDef>) -> Arc<TypeDef> {
		def.attach_module(self);
		self.types.borrow_mut().push(def.clone());
		def
	}

	pub fn global_fields(&self) -> Vec<Arc<FieldDef>> {
		self.global_fields.borrow().clone()
	}

	/// Global module fields carry raw-value-area blobs.
	pub fn define_global_field(self: &Arc<Self>, field: Arc<FieldDef>) -> Arc<FieldDef> {
		self.global_fields.borrow_mut().push(field.clone());
		field
	}

	pub fn global_methods(&self) -> Vec<Arc<MethodDef>> {
		self.global_methods.borrow().clone()
	}

	pub fn define_global_method(self: &Arc<Self>, method: Arc<MethodDef>) -> Arc<MethodDef> {
		method.attach_module(self);
		self.global_methods.borrow_mut().push(method.clone());
		method
	}

	fn next_token(&self, kind: MetadataTokenKind) -> MetadataToken {
		let mut rows = self.token_rows.borrow_mut();
		let row = rows.entry(kind as u32).or_insert(0);
		*row += 1;
		MetadataToken::new(kind, *row)
	}

	/// Assigns a fresh token resolving to `target`. The kind mirrors the
	/// CLI table the target would live in.
	pub fn define_token(&self, target: TokenTarget) -> MetadataToken {
		let kind = match &target {
			TokenTarget::Type(crate::reflection::types::Ty::Def(_)) => MetadataTokenKind::TypeDef,
			TokenTarget::Type(_) => MetadataTokenKind::TypeSpec,
			TokenTarget::Field(_) => MetadataTokenKind::Field,
			TokenTarget::Method(m) if m.is_constructed_generic() => MetadataTokenKind::MethodSpec,
			TokenTarget::Method(_) => MetadataTokenKind::Method,
			TokenTarget::String(_) => MetadataTokenKind::String,
			TokenTarget::Signature(_) => MetadataTokenKind::Signature,
		};
		let token = self.next_token(kind);
		self.tokens.borrow_mut().insert(token.raw(), target);
		token
	}

	pub fn define_user_string(&self, value: &str) -> StringToken {
		let token = self.define_token(TokenTarget::String(Arc::from(value)));
		StringToken(token.index() as u32)
	}

	pub fn define_signature(&self, signature: Signature) -> SignatureToken {
		let token = self.define_token(TokenTarget::Signature(Arc::new(signature)));
		SignatureToken(token.index() as u32)
	}

	pub fn resolve_token(&self, raw: u32) -> Option<TokenTarget> {
		self.tokens.borrow().get(&raw).cloned()
	}

	pub fn custom_attributes(&self) -> Vec<CustomAttribute> {
		self.custom_attributes.borrow().clone()
	}

	pub fn add_custom_attribute(&self, attribute: CustomAttribute) {
		self.custom_attributes.borrow_mut().push(attribute);
	}
}

impl Display for Module {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name)
	}
}
