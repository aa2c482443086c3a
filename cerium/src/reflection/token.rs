use std::fmt::{Debug, Formatter};

use paste::paste;

macro_rules! define_metadata_token {
	($($id: ident = $discriminant: literal),* $(,)?) => {
		#[repr(u32)]
		#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
		pub enum MetadataTokenKind {
			$($id = $discriminant),*
		}

		/// CLI-shaped metadata token: the kind in the high byte, a one-based
		/// row index in the low three bytes.
		#[repr(transparent)]
		#[derive(Copy, Clone, Eq, PartialEq, Hash)]
		pub struct MetadataToken(u32);

		impl MetadataToken {
			pub fn new(kind: MetadataTokenKind, index: u32) -> Self {
				debug_assert!(index <= 0x00FF_FFFF);
				Self(((kind as u32) << 24) | (index & 0x00FF_FFFF))
			}

			pub fn kind(&self) -> MetadataTokenKind {
				let discriminant = (self.0 & 0xFF00_0000) >> 24;
				match discriminant {
					$($discriminant => MetadataTokenKind::$id,)*
					_ => unreachable!(),
				}
			}

			pub fn index(&self) -> usize {
				(self.0 & 0x00FF_FFFF) as usize
			}

			pub fn raw(&self) -> u32 {
				self.0
			}
		}

		impl TryFrom<u32> for MetadataToken {
			type Error = ();
			fn try_from(value: u32) -> Result<Self, Self::Error> {
				let discriminant = (value & 0xFF00_0000) >> 24;
				match discriminant {
					$($discriminant => Ok(Self(value)),)*
					_ => Err(()),
				}
			}
		}

		paste! {
			$(
				#[repr(transparent)]
				#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
				pub struct [<$id Token>](pub u32);

				impl TryFrom<MetadataToken> for [<$id Token>] {
					type Error = ();
					fn try_from(value: MetadataToken) -> Result<Self, Self::Error> {
						match value.kind() {
							MetadataTokenKind::$id => Ok(Self(value.index() as u32)),
							_ => Err(()),
						}
					}
				}

				impl From<[<$id Token>]> for MetadataToken {
					fn from(value: [<$id Token>]) -> Self {
						MetadataToken::new(MetadataTokenKind::$id, value.0)
					}
				}
			)*
		}
	};
}

define_metadata_token! {
	TypeRef = 0x01,
	TypeDef = 0x02,
	Field = 0x04,
	Method = 0x06,
	MemberRef = 0x0A,
	Signature = 0x11,
	TypeSpec = 0x1B,
	MethodSpec = 0x2B,
	String = 0x70,
}

impl Debug for MetadataToken {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "MetadataToken::{:?}({:#X})", self.kind(), self.index())
	}
}
