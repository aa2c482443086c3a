use std::io::{Result, Write};

use crate::wire::PickleWriter;

/// One-byte pickle operations. The four spaces are disjoint enumerations;
/// which space applies is always known from context, so discriminants may
/// overlap across spaces.
macro_rules! define_op_space {
	(
		$(#[$attr: meta])*
		enum $name: ident {
			$(
				$(#[$vattr: meta])*
				$ident: ident = $discriminant: literal
			),* $(,)?
		}
	) => {
		#[repr(u8)]
		$(#[$attr])*
		#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
		pub enum $name {
			$(
				$(#[$vattr])*
				$ident = $discriminant
			),*
		}

		impl $name {
			pub fn write<W: Write>(self, out: &mut PickleWriter<W>) -> Result<()> {
				out.write_u8(self as u8)
			}
		}

		impl TryFrom<u8> for $name {
			type Error = ();
			fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
				match value {
					$($discriminant => Ok($name::$ident),)*
					_ => Err(()),
				}
			}
		}
	};
}

define_op_space! {
	/// Object-level operations. Arrays, tuples, delegates and reflection
	/// entities all route through `Object`; the runtime-type prefix and the
	/// type-info record carry the discriminator.
	enum ObjectOp {
		Null = 0x00,
		Object = 0x01,
		Memo = 0x02,
	}
}

define_op_space! {
	/// Type-level operations. `0x10` and up are the well-known type tokens:
	/// a single byte replaces a full reference for primitives and the
	/// reflection roots.
	enum TypeOp {
		Memo = 0x00,
		TypeRef = 0x01,
		TypeDef = 0x02,
		GenericInstantiation = 0x03,
		ArrayType = 0x04,
		GenericTypeParameter = 0x05,
		GenericMethodParameter = 0x06,
		/// Generic type parameter resolved against the ambient context.
		TVar = 0x07,
		/// Generic method parameter resolved against the ambient context.
		MVar = 0x08,
		Nullable = 0x09,
		Tuple = 0x0A,
		ValueTuple = 0x0B,
		ByRef = 0x0C,

		Void = 0x10,
		Bool = 0x11,
		Char = 0x12,
		Int8 = 0x13,
		UInt8 = 0x14,
		Int16 = 0x15,
		UInt16 = 0x16,
		Int32 = 0x17,
		UInt32 = 0x18,
		Int64 = 0x19,
		UInt64 = 0x1A,
		Float = 0x1B,
		Double = 0x1C,
		Decimal = 0x1D,
		DateTime = 0x1E,
		String = 0x1F,
		Object = 0x20,
		TypeRoot = 0x21,
		AssemblyRoot = 0x22,
		ModuleRoot = 0x23,
		FieldRoot = 0x24,
		MethodRoot = 0x25,
		ConstructorRoot = 0x26,
		PropertyRoot = 0x27,
		EventRoot = 0x28,
		MarshalByRef = 0x29,
	}
}

define_op_space! {
	enum ModuleOp {
		Memo = 0x00,
		MscorlibModule = 0x01,
		ManifestModuleRef = 0x02,
		ModuleRef = 0x03,
		ModuleDef = 0x04,
	}
}

define_op_space! {
	enum AssemblyOp {
		Memo = 0x00,
		MscorlibAssembly = 0x01,
		AssemblyRef = 0x02,
		AssemblyDef = 0x03,
	}
}

define_op_space! {
	/// Signature-element operations, used inside method and property
	/// signatures and for standalone-signature IL operands.
	enum SigOp {
		Type = 0x00,
		TVar = 0x01,
		MVar = 0x02,
		Generic = 0x03,
		Array = 0x04,
		ByRef = 0x05,
		Pointer = 0x06,
		Modreq = 0x07,
		Modopt = 0x08,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip_discriminants() {
		assert_eq!(TypeOp::try_from(TypeOp::ArrayType as u8), Ok(TypeOp::ArrayType));
		assert_eq!(TypeOp::try_from(0x29), Ok(TypeOp::MarshalByRef));
		assert_eq!(ObjectOp::try_from(0x03), Err(()));
	}
}
