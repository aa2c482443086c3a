use std::fmt::{Display, Formatter};
use std::io::{Result, Write};

use bitflags::bitflags;

use crate::reflection::{MethodDef, PropertyDef, Ty};
use crate::wire::ops::SigOp;
use crate::wire::PickleWriter;

bitflags! {
	#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
	pub struct CallingConvention: u8 {
		const DEFAULT = 0x0;
		const VAR_ARG = 0x5;
		const GENERIC = 0x10;
		const HAS_THIS = 0x20;
		const EXPLICIT_THIS = 0x40;
	}
}

/// One element of a signature: a type rendered structurally, by name.
///
/// Generic parameters appear as positions, never as owners, so a signature
/// computed against a type builder equals the one computed against the
/// finished type it rebuilds into.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SigElement {
	/// A namespace-qualified type name.
	Named(String),
	/// Generic parameter of the declaring type, by position.
	TypeParam(u32),
	/// Generic parameter of the method, by position.
	MethodParam(u32),
	Generic { def: Box<SigElement>, args: Vec<SigElement> },
	/// `rank` 0 is the single-dimension zero-based shape.
	Array { rank: usize, element: Box<SigElement> },
	ByRef(Box<SigElement>),
	Pointer(Box<SigElement>),
	Required { modifier: Box<SigElement>, element: Box<SigElement> },
	Optional { modifier: Box<SigElement>, element: Box<SigElement> },
}

impl SigElement {
	pub fn from_ty(ty: &Ty) -> SigElement {
		match ty {
			Ty::WellKnown(wk) => SigElement::Named(wk.name().to_string()),
			Ty::Def(def) => SigElement::Named(def.full_name()),
			Ty::Generic { def, args } => SigElement::Generic {
				def: Box::new(SigElement::Named(def.full_name())),
				args: args.iter().map(SigElement::from_ty).collect(),
			},
			Ty::Array { rank, element } => SigElement::Array {
				rank: *rank,
				element: Box::new(SigElement::from_ty(element)),
			},
			Ty::Nullable(element) => SigElement::Generic {
				def: Box::new(SigElement::Named("System.Nullable`1".to_string())),
				args: vec![SigElement::from_ty(element)],
			},
			Ty::Tuple { boxed, items } => SigElement::Generic {
				def: Box::new(SigElement::Named(format!(
					"System.{}Tuple`{}",
					if *boxed { "" } else { "Value" },
					items.len(),
				))),
				args: items.iter().map(SigElement::from_ty).collect(),
			},
			Ty::TypeParam { position, .. } => SigElement::TypeParam(*position),
			Ty::MethodParam { position, .. } => SigElement::MethodParam(*position),
			Ty::ByRef(element) => SigElement::ByRef(Box::new(SigElement::from_ty(element))),
			Ty::Pointer(element) => SigElement::Pointer(Box::new(SigElement::from_ty(element))),
		}
	}

	/// Wraps `element` in `Modreq`/`Modopt` layers, innermost first.
	pub fn with_modifiers(ty: &Ty, required: &[Ty], optional: &[Ty]) -> SigElement {
		let mut element = SigElement::from_ty(ty);
		for modifier in required {
			element = SigElement::Required {
				modifier: Box::new(SigElement::from_ty(modifier)),
				element: Box::new(element),
			};
		}
		for modifier in optional {
			element = SigElement::Optional {
				modifier: Box::new(SigElement::from_ty(modifier)),
				element: Box::new(element),
			};
		}
		element
	}

	pub fn write<W: Write>(&self, out: &mut PickleWriter<W>) -> Result<()> {
		match self {
			SigElement::Named(name) => {
				SigOp::Type.write(out)?;
				out.write_str(name)
			}
			SigElement::TypeParam(position) => {
				SigOp::TVar.write(out)?;
				out.write_v7(*position as u64)
			}
			SigElement::MethodParam(position) => {
				SigOp::MVar.write(out)?;
				out.write_v7(*position as u64)
			}
			SigElement::Generic { def, args } => {
				SigOp::Generic.write(out)?;
				def.write(out)?;
				out.write_len(args.len())?;
				for arg in args {
					arg.write(out)?;
				}
				Ok(())
			}
			SigElement::Array { rank, element } => {
				SigOp::Array.write(out)?;
				out.write_v7(*rank as u64)?;
				element.write(out)
			}
			SigElement::ByRef(element) => {
				SigOp::ByRef.write(out)?;
				element.write(out)
			}
			SigElement::Pointer(element) => {
				SigOp::Pointer.write(out)?;
				element.write(out)
			}
			SigElement::Required { modifier, element } => {
				SigOp::Modreq.write(out)?;
				modifier.write(out)?;
				element.write(out)
			}
			SigElement::Optional { modifier, element } => {
				SigOp::Modopt.write(out)?;
				modifier.write(out)?;
				element.write(out)
			}
		}
	}
}

impl Display for SigElement {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			SigElement::Named(name) => f.write_str(name),
			SigElement::TypeParam(position) => write!(f, "!{position}"),
			SigElement::MethodParam(position) => write!(f, "!!{position}"),
			SigElement::Generic { def, args } => {
				write!(f, "{def}<")?;
				for (i, arg) in args.iter().enumerate() {
					match i {
						0 => write!(f, "{arg}")?,
						_ => write!(f, ", {arg}")?,
					}
				}
				write!(f, ">")
			}
			SigElement::Array { rank: 0, element } => write!(f, "{element}[]"),
			SigElement::Array { rank, element } => write!(f, "{element}[{}]", ",".repeat(rank - 1)),
			SigElement::ByRef(element) => write!(f, "{element}&"),
			SigElement::Pointer(element) => write!(f, "{element}*"),
			SigElement::Required { modifier, element } => write!(f, "{element} modreq({modifier})"),
			SigElement::Optional { modifier, element } => write!(f, "{element} modopt({modifier})"),
		}
	}
}

/// The structural identity of a method or property, stable across a
/// type-builder rebuild.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Signature {
	pub name: String,
	pub calling_convention: CallingConvention,
	pub generic_param_count: u32,
	pub return_element: SigElement,
	pub parameters: Vec<SigElement>,
}

impl Signature {
	pub fn of_method(method: &MethodDef) -> Signature {
		let (required, optional) = method.return_modifiers();
		Signature {
			name: method.name().to_string(),
			calling_convention: method.calling_convention(),
			generic_param_count: method.generic_params().len() as u32,
			return_element: SigElement::with_modifiers(method.return_ty(), required, optional),
			parameters: method
				.params()
				.iter()
				.map(|p| SigElement::with_modifiers(&p.ty, &p.required_modifiers, &p.optional_modifiers))
				.collect(),
		}
	}

	pub fn of_property(property: &PropertyDef) -> Signature {
		Signature {
			name: property.name().to_string(),
			calling_convention: CallingConvention::HAS_THIS,
			generic_param_count: 0,
			return_element: SigElement::from_ty(property.ty()),
			parameters: property.index_params().iter().map(SigElement::from_ty).collect(),
		}
	}

	pub fn write<W: Write>(&self, out: &mut PickleWriter<W>) -> Result<()> {
		out.write_str(&self.name)?;
		out.write_u8(self.calling_convention.bits())?;
		out.write_v7(self.generic_param_count as u64)?;
		self.return_element.write(out)?;
		out.write_len(self.parameters.len())?;
		for parameter in &self.parameters {
			parameter.write(out)?;
		}
		Ok(())
	}
}

impl Display for Signature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}(", self.name)?;
		for (i, parameter) in self.parameters.iter().enumerate() {
			match i {
				0 => write!(f, "{parameter}")?,
				_ => write!(f, ", {parameter}")?,
			}
		}
		write!(f, ") -> {}", self.return_element)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reflection::{MethodDefBuilder, ParamDef, TypeAttributes, TypeDef, TypeDefKind, WellKnownType};

	fn int32() -> Ty {
		Ty::WellKnown(WellKnownType::Int32)
	}

	#[test]
	fn signatures_compare_structurally_across_rebuilds() {
		// Two separately built definitions with identical shapes must
		// produce equal signatures, the way a rebuilt dynamic type has to
		// match the fully-defined type it mirrors.
		let make = || {
			let def = TypeDef::new("Lab", "Widget", TypeAttributes::PUBLIC, TypeDefKind::Class);
			let method = MethodDefBuilder::method("Measure", int32())
				.param(ParamDef::new("scale", int32()))
				.build();
			def.attach_method(&method);
			Signature::of_method(&method)
		};
		assert_eq!(make(), make());
	}

	#[test]
	fn generic_positions_do_not_carry_owners() {
		let def_a = TypeDef::new_generic("Lab", "Holder", TypeAttributes::PUBLIC, TypeDefKind::Class, &["T"]);
		let def_b = TypeDef::new_generic("Lab", "Holder", TypeAttributes::PUBLIC, TypeDefKind::Class, &["T"]);
		let elem_a = SigElement::from_ty(&Ty::TypeParam { owner: def_a, position: 0 });
		let elem_b = SigElement::from_ty(&Ty::TypeParam { owner: def_b, position: 0 });
		assert_eq!(elem_a, elem_b);
	}

	#[test]
	fn modifier_wrapping_changes_identity() {
		let plain = SigElement::with_modifiers(&int32(), &[], &[]);
		let wrapped = SigElement::with_modifiers(&int32(), &[Ty::WellKnown(WellKnownType::Object)], &[]);
		assert_ne!(plain, wrapped);
	}

	#[test]
	fn properties_use_name_type_and_index_parameters() {
		use crate::reflection::{PropertyAttributes, PropertyDef};
		let indexer = PropertyDef::new("Item", PropertyAttributes::default(), int32(), vec![int32()]);
		let plain = PropertyDef::new("Item", PropertyAttributes::default(), int32(), vec![]);
		assert_ne!(Signature::of_property(&indexer), Signature::of_property(&plain));
	}
}
