use std::fmt::{Debug, Formatter};

/// Shape of the operand following an IL opcode.
///
/// Token-bearing shapes embed a metadata token that must be rewritten when a
/// body crosses a process boundary; every other shape is an opaque span of
/// known width that the translator mirrors through untouched.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OperandKind {
	InlineNone,
	ShortInlineVar,
	InlineVar,
	ShortInlineI,
	InlineI,
	InlineI8,
	ShortInlineR,
	InlineR,
	ShortInlineBrTarget,
	InlineBrTarget,
	/// `u32` case count followed by that many `i32` branch targets.
	InlineSwitch,
	/// Token of a user string.
	InlineString,
	/// Token of a standalone signature.
	InlineSig,
	InlineType,
	InlineField,
	InlineMethod,
	/// Token of a type, field or method (`ldtoken`).
	InlineTok,
}

impl OperandKind {
	/// Fixed operand width in bytes. [`OperandKind::InlineSwitch`] is the one
	/// variable-width shape; its returned width covers the case count only.
	pub const fn width(self) -> usize {
		match self {
			OperandKind::InlineNone => 0,
			OperandKind::ShortInlineVar => 1,
			OperandKind::ShortInlineI => 1,
			OperandKind::ShortInlineBrTarget => 1,
			OperandKind::InlineVar => 2,
			OperandKind::InlineI => 4,
			OperandKind::ShortInlineR => 4,
			OperandKind::InlineBrTarget => 4,
			OperandKind::InlineSwitch => 4,
			OperandKind::InlineString => 4,
			OperandKind::InlineSig => 4,
			OperandKind::InlineType => 4,
			OperandKind::InlineField => 4,
			OperandKind::InlineMethod => 4,
			OperandKind::InlineTok => 4,
			OperandKind::InlineI8 => 8,
			OperandKind::InlineR => 8,
		}
	}

	pub const fn carries_token(self) -> bool {
		matches!(
			self,
			OperandKind::InlineString
				| OperandKind::InlineSig
				| OperandKind::InlineType
				| OperandKind::InlineField
				| OperandKind::InlineMethod
				| OperandKind::InlineTok
		)
	}
}

/// Prefix byte introducing the two-byte opcode space.
pub const COMPOUND_PREFIX: u8 = 0xFE;

macro_rules! define_opcodes {
	(
		$table: ident, $lookup: ident, $name_lookup: ident {
			$($ident: ident ($kind: ident) = $discriminant: literal),* $(,)?
		}
	) => {
		const $table: [Option<(&str, OperandKind)>; 256] = {
			let mut table: [Option<(&str, OperandKind)>; 256] = [None; 256];
			$(table[$discriminant] = Some((stringify!($ident), OperandKind::$kind));)*
			table
		};

		/// Operand shape for a discriminant in this opcode space.
		pub const fn $lookup(discriminant: u8) -> Option<OperandKind> {
			match $table[discriminant as usize] {
				Some((_, kind)) => Some(kind),
				None => None,
			}
		}

		pub const fn $name_lookup(discriminant: u8) -> Option<&'static str> {
			match $table[discriminant as usize] {
				Some((name, _)) => Some(name),
				None => None,
			}
		}
	};
}

define_opcodes! {
	OPCODES, operand_kind, opcode_name {
		nop(InlineNone) = 0x00,
		dbg_break(InlineNone) = 0x01,
		ldarg_0(InlineNone) = 0x02,
		ldarg_1(InlineNone) = 0x03,
		ldarg_2(InlineNone) = 0x04,
		ldarg_3(InlineNone) = 0x05,
		ldloc_0(InlineNone) = 0x06,
		ldloc_1(InlineNone) = 0x07,
		ldloc_2(InlineNone) = 0x08,
		ldloc_3(InlineNone) = 0x09,
		stloc_0(InlineNone) = 0x0A,
		stloc_1(InlineNone) = 0x0B,
		stloc_2(InlineNone) = 0x0C,
		stloc_3(InlineNone) = 0x0D,
		ldarg_s(ShortInlineVar) = 0x0E,
		ldarga_s(ShortInlineVar) = 0x0F,
		starg_s(ShortInlineVar) = 0x10,
		ldloc_s(ShortInlineVar) = 0x11,
		ldloca_s(ShortInlineVar) = 0x12,
		stloc_s(ShortInlineVar) = 0x13,
		ldnull(InlineNone) = 0x14,
		ldc_i4_m1(InlineNone) = 0x15,
		ldc_i4_0(InlineNone) = 0x16,
		ldc_i4_1(InlineNone) = 0x17,
		ldc_i4_2(InlineNone) = 0x18,
		ldc_i4_3(InlineNone) = 0x19,
		ldc_i4_4(InlineNone) = 0x1A,
		ldc_i4_5(InlineNone) = 0x1B,
		ldc_i4_6(InlineNone) = 0x1C,
		ldc_i4_7(InlineNone) = 0x1D,
		ldc_i4_8(InlineNone) = 0x1E,
		ldc_i4_s(ShortInlineI) = 0x1F,
		ldc_i4(InlineI) = 0x20,
		ldc_i8(InlineI8) = 0x21,
		ldc_r4(ShortInlineR) = 0x22,
		ldc_r8(InlineR) = 0x23,
		dup(InlineNone) = 0x25,
		pop(InlineNone) = 0x26,
		jmp(InlineMethod) = 0x27,
		call(InlineMethod) = 0x28,
		calli(InlineSig) = 0x29,
		ret(InlineNone) = 0x2A,
		br_s(ShortInlineBrTarget) = 0x2B,
		brfalse_s(ShortInlineBrTarget) = 0x2C,
		brtrue_s(ShortInlineBrTarget) = 0x2D,
		beq_s(ShortInlineBrTarget) = 0x2E,
		bge_s(ShortInlineBrTarget) = 0x2F,
		bgt_s(ShortInlineBrTarget) = 0x30,
		ble_s(ShortInlineBrTarget) = 0x31,
		blt_s(ShortInlineBrTarget) = 0x32,
		bne_un_s(ShortInlineBrTarget) = 0x33,
		bge_un_s(ShortInlineBrTarget) = 0x34,
		bgt_un_s(ShortInlineBrTarget) = 0x35,
		ble_un_s(ShortInlineBrTarget) = 0x36,
		blt_un_s(ShortInlineBrTarget) = 0x37,
		br(InlineBrTarget) = 0x38,
		brfalse(InlineBrTarget) = 0x39,
		brtrue(InlineBrTarget) = 0x3A,
		beq(InlineBrTarget) = 0x3B,
		bge(InlineBrTarget) = 0x3C,
		bgt(InlineBrTarget) = 0x3D,
		ble(InlineBrTarget) = 0x3E,
		blt(InlineBrTarget) = 0x3F,
		bne_un(InlineBrTarget) = 0x40,
		bge_un(InlineBrTarget) = 0x41,
		bgt_un(InlineBrTarget) = 0x42,
		ble_un(InlineBrTarget) = 0x43,
		blt_un(InlineBrTarget) = 0x44,
		switch(InlineSwitch) = 0x45,
		ldind_i1(InlineNone) = 0x46,
		ldind_u1(InlineNone) = 0x47,
		ldind_i2(InlineNone) = 0x48,
		ldind_u2(InlineNone) = 0x49,
		ldind_i4(InlineNone) = 0x4A,
		ldind_u4(InlineNone) = 0x4B,
		ldind_i8(InlineNone) = 0x4C,
		ldind_i(InlineNone) = 0x4D,
		ldind_r4(InlineNone) = 0x4E,
		ldind_r8(InlineNone) = 0x4F,
		ldind_ref(InlineNone) = 0x50,
		stind_ref(InlineNone) = 0x51,
		stind_i1(InlineNone) = 0x52,
		stind_i2(InlineNone) = 0x53,
		stind_i4(InlineNone) = 0x54,
		stind_i8(InlineNone) = 0x55,
		stind_r4(InlineNone) = 0x56,
		stind_r8(InlineNone) = 0x57,
		add(InlineNone) = 0x58,
		sub(InlineNone) = 0x59,
		mul(InlineNone) = 0x5A,
		div(InlineNone) = 0x5B,
		div_un(InlineNone) = 0x5C,
		rem(InlineNone) = 0x5D,
		rem_un(InlineNone) = 0x5E,
		and(InlineNone) = 0x5F,
		or(InlineNone) = 0x60,
		xor(InlineNone) = 0x61,
		shl(InlineNone) = 0x62,
		shr(InlineNone) = 0x63,
		shr_un(InlineNone) = 0x64,
		neg(InlineNone) = 0x65,
		not(InlineNone) = 0x66,
		conv_i1(InlineNone) = 0x67,
		conv_i2(InlineNone) = 0x68,
		conv_i4(InlineNone) = 0x69,
		conv_i8(InlineNone) = 0x6A,
		conv_r4(InlineNone) = 0x6B,
		conv_r8(InlineNone) = 0x6C,
		conv_u4(InlineNone) = 0x6D,
		conv_u8(InlineNone) = 0x6E,
		callvirt(InlineMethod) = 0x6F,
		cpobj(InlineType) = 0x70,
		ldobj(InlineType) = 0x71,
		ldstr(InlineString) = 0x72,
		newobj(InlineMethod) = 0x73,
		castclass(InlineType) = 0x74,
		isinst(InlineType) = 0x75,
		conv_r_un(InlineNone) = 0x76,
		unbox(InlineType) = 0x79,
		throw(InlineNone) = 0x7A,
		ldfld(InlineField) = 0x7B,
		ldflda(InlineField) = 0x7C,
		stfld(InlineField) = 0x7D,
		ldsfld(InlineField) = 0x7E,
		ldsflda(InlineField) = 0x7F,
		stsfld(InlineField) = 0x80,
		stobj(InlineType) = 0x81,
		conv_ovf_i1_un(InlineNone) = 0x82,
		conv_ovf_i2_un(InlineNone) = 0x83,
		conv_ovf_i4_un(InlineNone) = 0x84,
		conv_ovf_i8_un(InlineNone) = 0x85,
		conv_ovf_u1_un(InlineNone) = 0x86,
		conv_ovf_u2_un(InlineNone) = 0x87,
		conv_ovf_u4_un(InlineNone) = 0x88,
		conv_ovf_u8_un(InlineNone) = 0x89,
		conv_ovf_i_un(InlineNone) = 0x8A,
		conv_ovf_u_un(InlineNone) = 0x8B,
		box_val(InlineType) = 0x8C,
		newarr(InlineType) = 0x8D,
		ldlen(InlineNone) = 0x8E,
		ldelema(InlineType) = 0x8F,
		ldelem_i1(InlineNone) = 0x90,
		ldelem_u1(InlineNone) = 0x91,
		ldelem_i2(InlineNone) = 0x92,
		ldelem_u2(InlineNone) = 0x93,
		ldelem_i4(InlineNone) = 0x94,
		ldelem_u4(InlineNone) = 0x95,
		ldelem_i8(InlineNone) = 0x96,
		ldelem_i(InlineNone) = 0x97,
		ldelem_r4(InlineNone) = 0x98,
		ldelem_r8(InlineNone) = 0x99,
		ldelem_ref(InlineNone) = 0x9A,
		stelem_i(InlineNone) = 0x9B,
		stelem_i1(InlineNone) = 0x9C,
		stelem_i2(InlineNone) = 0x9D,
		stelem_i4(InlineNone) = 0x9E,
		stelem_i8(InlineNone) = 0x9F,
		stelem_r4(InlineNone) = 0xA0,
		stelem_r8(InlineNone) = 0xA1,
		stelem_ref(InlineNone) = 0xA2,
		ldelem(InlineType) = 0xA3,
		stelem(InlineType) = 0xA4,
		unbox_any(InlineType) = 0xA5,
		conv_ovf_i1(InlineNone) = 0xB3,
		conv_ovf_u1(InlineNone) = 0xB4,
		conv_ovf_i2(InlineNone) = 0xB5,
		conv_ovf_u2(InlineNone) = 0xB6,
		conv_ovf_i4(InlineNone) = 0xB7,
		conv_ovf_u4(InlineNone) = 0xB8,
		conv_ovf_i8(InlineNone) = 0xB9,
		conv_ovf_u8(InlineNone) = 0xBA,
		refanyval(InlineType) = 0xC2,
		ckfinite(InlineNone) = 0xC3,
		mkrefany(InlineType) = 0xC6,
		ldtoken(InlineTok) = 0xD0,
		conv_u2(InlineNone) = 0xD1,
		conv_u1(InlineNone) = 0xD2,
		conv_i(InlineNone) = 0xD3,
		conv_ovf_i(InlineNone) = 0xD4,
		conv_ovf_u(InlineNone) = 0xD5,
		add_ovf(InlineNone) = 0xD6,
		add_ovf_un(InlineNone) = 0xD7,
		mul_ovf(InlineNone) = 0xD8,
		mul_ovf_un(InlineNone) = 0xD9,
		sub_ovf(InlineNone) = 0xDA,
		sub_ovf_un(InlineNone) = 0xDB,
		endfinally(InlineNone) = 0xDC,
		leave(InlineBrTarget) = 0xDD,
		leave_s(ShortInlineBrTarget) = 0xDE,
		stind_i(InlineNone) = 0xDF,
		conv_u(InlineNone) = 0xE0,
	}
}

define_opcodes! {
	COMPOUND_OPCODES, compound_operand_kind, compound_opcode_name {
		arglist(InlineNone) = 0x00,
		ceq(InlineNone) = 0x01,
		cgt(InlineNone) = 0x02,
		cgt_un(InlineNone) = 0x03,
		clt(InlineNone) = 0x04,
		clt_un(InlineNone) = 0x05,
		ldftn(InlineMethod) = 0x06,
		ldvirtftn(InlineMethod) = 0x07,
		ldarg(InlineVar) = 0x09,
		ldarga(InlineVar) = 0x0A,
		starg(InlineVar) = 0x0B,
		ldloc(InlineVar) = 0x0C,
		ldloca(InlineVar) = 0x0D,
		stloc(InlineVar) = 0x0E,
		localloc(InlineNone) = 0x0F,
		endfilter(InlineNone) = 0x11,
		unaligned(ShortInlineI) = 0x12,
		volatile(InlineNone) = 0x13,
		tail(InlineNone) = 0x14,
		initobj(InlineType) = 0x15,
		constrained(InlineType) = 0x16,
		cpblk(InlineNone) = 0x17,
		initblk(InlineNone) = 0x18,
		no_chk(ShortInlineI) = 0x19,
		rethrow(InlineNone) = 0x1A,
		sizeof(InlineType) = 0x1C,
		refanytype(InlineNone) = 0x1D,
		readonly(InlineNone) = 0x1E,
	}
}

/// One decoded instruction: stream offset, discriminant(s) and operand span.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Instruction<'l> {
	pub offset: usize,
	pub compound: bool,
	pub discriminant: u8,
	pub kind: OperandKind,
	pub operand: &'l [u8],
}

impl Instruction<'_> {
	pub fn name(&self) -> &'static str {
		let name = match self.compound {
			true => compound_opcode_name(self.discriminant),
			false => opcode_name(self.discriminant),
		};
		name.unwrap_or("??")
	}

	/// Metadata token embedded in the operand, if this shape carries one.
	pub fn token(&self) -> Option<u32> {
		match self.kind.carries_token() {
			false => None,
			true => Some(u32::from_le_bytes(self.operand[..4].try_into().ok()?)),
		}
	}
}

impl Debug for Instruction<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "IL_{:04X}\t{}", self.offset, self.name())?;
		match self.operand.is_empty() {
			true => Ok(()),
			false => write!(f, " {:02X?}", self.operand),
		}
	}
}

/// Linear walk over a raw IL body, yielding one [`Instruction`] per opcode.
///
/// Used by both translator passes; an out-of-table discriminant or a
/// truncated operand surfaces as an `Err` item and ends the iteration.
pub struct InstructionIterator<'l> {
	bytes: &'l [u8],
	offset: usize,
	poisoned: bool,
}

impl<'l> InstructionIterator<'l> {
	pub fn new(bytes: &'l [u8]) -> Self {
		Self { bytes, offset: 0, poisoned: false }
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IlWalkError {
	UnknownOpCode { offset: usize, discriminant: u8 },
	TruncatedOperand { offset: usize },
}

impl<'l> Iterator for InstructionIterator<'l> {
	type Item = Result<Instruction<'l>, IlWalkError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.poisoned || self.offset >= self.bytes.len() {
			return None;
		}

		let offset = self.offset;
		let mut cursor = offset;
		let first = self.bytes[cursor];
		cursor += 1;

		let (compound, discriminant, kind) = match first {
			COMPOUND_PREFIX => {
				let Some(&second) = self.bytes.get(cursor) else {
					self.poisoned = true;
					return Some(Err(IlWalkError::TruncatedOperand { offset }));
				};
				cursor += 1;
				match compound_operand_kind(second) {
					Some(kind) => (true, second, kind),
					None => {
						self.poisoned = true;
						return Some(Err(IlWalkError::UnknownOpCode { offset, discriminant: second }));
					}
				}
			}
			_ => match operand_kind(first) {
				Some(kind) => (false, first, kind),
				None => {
					self.poisoned = true;
					return Some(Err(IlWalkError::UnknownOpCode { offset, discriminant: first }));
				}
			},
		};

		let mut width = kind.width();
		if kind == OperandKind::InlineSwitch {
			let Some(count) = self.bytes.get(cursor..cursor + 4) else {
				self.poisoned = true;
				return Some(Err(IlWalkError::TruncatedOperand { offset }));
			};
			let count = u32::from_le_bytes(count.try_into().unwrap()) as usize;
			width += count * 4;
		}

		let Some(operand) = self.bytes.get(cursor..cursor + width) else {
			self.poisoned = true;
			return Some(Err(IlWalkError::TruncatedOperand { offset }));
		};

		self.offset = cursor + width;
		Some(Ok(Instruction { offset, compound, discriminant, kind, operand }))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn widths_match_shapes() {
		assert_eq!(operand_kind(0x00), Some(OperandKind::InlineNone));
		assert_eq!(operand_kind(0x20), Some(OperandKind::InlineI));
		assert_eq!(operand_kind(0x28), Some(OperandKind::InlineMethod));
		assert_eq!(operand_kind(0x24), None);
		assert_eq!(compound_operand_kind(0x06), Some(OperandKind::InlineMethod));
		assert_eq!(compound_operand_kind(0x1C), Some(OperandKind::InlineType));
	}

	#[test]
	fn iterator_walks_mixed_bodies() {
		// ldc_i4 1; ldstr <token>; tail; ret
		let body = [
			0x20, 0x01, 0x00, 0x00, 0x00,
			0x72, 0x01, 0x00, 0x00, 0x70,
			0xFE, 0x14,
			0x2A,
		];
		let decoded: Vec<_> = InstructionIterator::new(&body).map(Result::unwrap).collect();
		assert_eq!(decoded.len(), 4);
		assert_eq!(decoded[0].name(), "ldc_i4");
		assert_eq!(decoded[1].token(), Some(0x7000_0001));
		assert_eq!(decoded[2].compound, true);
		assert_eq!(decoded[3].offset, 12);
	}

	#[test]
	fn switch_operand_is_variable_width() {
		let body = [0x45, 0x02, 0x00, 0x00, 0x00, 1, 0, 0, 0, 2, 0, 0, 0, 0x2A];
		let decoded: Vec<_> = InstructionIterator::new(&body).map(Result::unwrap).collect();
		assert_eq!(decoded[0].operand.len(), 12);
		assert_eq!(decoded[1].name(), "ret");
	}

	#[test]
	fn unknown_opcode_poisons_the_walk() {
		let mut it = InstructionIterator::new(&[0x24]);
		assert!(matches!(it.next(), Some(Err(IlWalkError::UnknownOpCode { .. }))));
		assert!(it.next().is_none());
	}
}
