use std::fmt::{Display, Formatter};

/// Failure raised while pickling an object graph.
///
/// Every variant that names an offender carries the rendered name of the
/// offending type or member so embedders can report it without holding on
/// to the graph itself.
#[derive(Debug)]
pub enum PickleError {
	IoError(std::io::Error),

	/// A raw pointer type was reached; pointers cannot cross process
	/// boundaries.
	UnserializablePointer(String),
	/// The type transitively inherits the remoting base class.
	UnserializableMarshalByRef(String),
	/// A reflection object outside the runtime-provided concrete kinds.
	UnserializableNonRuntimeReflection(String),
	/// A concrete type deriving a reflection root was passed as a static
	/// context; only the roots themselves are stable across the stream.
	UnstableStaticType(String),
	/// A reducer produced a factory whose shape does not match its target.
	InvalidReduction(String),
	/// Array rank above 255.
	UnsupportedRank(usize),
	/// More than 7 required or optional custom modifiers on one parameter.
	UnsupportedModifierCount(String),
	/// An enum whose underlying numeric code is outside the supported set.
	InvalidEnumUnderlying(String),
	/// A run completed with undrained trailer or static-field closures.
	UnterminatedTrailer,

	/// An object instance is missing a field its type declares.
	MissingField(String),
	/// An IL operand token has no entry in the module token map.
	UnresolvedToken(u32),
	/// A weak back-reference (module -> assembly, member -> type) is gone.
	DetachedMember(String),
}

impl Display for PickleError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			PickleError::IoError(e) => write!(f, "io error: {e}"),
			PickleError::UnserializablePointer(ty) => write!(f, "`{ty}` is a pointer type and cannot be pickled"),
			PickleError::UnserializableMarshalByRef(ty) => write!(f, "`{ty}` inherits MarshalByRefObject and cannot be pickled"),
			PickleError::UnserializableNonRuntimeReflection(what) => write!(f, "`{what}` is not a runtime reflection object"),
			PickleError::UnstableStaticType(ty) => write!(f, "`{ty}` derives a reflection root and is not a stable static type"),
			PickleError::InvalidReduction(why) => write!(f, "invalid reduction: {why}"),
			PickleError::UnsupportedRank(rank) => write!(f, "array rank {rank} exceeds 255"),
			PickleError::UnsupportedModifierCount(member) => write!(f, "`{member}` carries more than 7 custom modifiers"),
			PickleError::InvalidEnumUnderlying(ty) => write!(f, "enum `{ty}` has an unsupported underlying type"),
			PickleError::UnterminatedTrailer => write!(f, "serialization completed with undrained trailers"),
			PickleError::MissingField(field) => write!(f, "object is missing a value for field `{field}`"),
			PickleError::UnresolvedToken(token) => write!(f, "metadata token {token:#010X} has no target in its module"),
			PickleError::DetachedMember(what) => write!(f, "`{what}` is detached from its declaring scope"),
		}
	}
}

impl std::error::Error for PickleError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			PickleError::IoError(e) => Some(e),
			_ => None,
		}
	}
}

impl From<std::io::Error> for PickleError {
	fn from(value: std::io::Error) -> Self {
		Self::IoError(value)
	}
}
