use std::io::{ErrorKind, Write};
use std::sync::Arc;

use fxhash::FxHashSet;

use crate::errors::PickleError;
use crate::il::{IlWalkError, InstructionIterator, OperandKind, COMPOUND_PREFIX};
use crate::reflection::{Member, MethodDef, TokenTarget, Ty};
use crate::ser::{walker, PickleState};
use crate::wire::BODY_TERMINATOR;

fn malformed(method: &MethodDef, error: IlWalkError) -> PickleError {
	let message = match error {
		IlWalkError::UnknownOpCode { offset, discriminant } => {
			format!("unknown opcode {discriminant:#04X} at IL_{offset:04X} in `{method}`")
		}
		IlWalkError::TruncatedOperand { offset } => {
			format!("truncated operand at IL_{offset:04X} in `{method}`")
		}
	};
	PickleError::IoError(std::io::Error::new(ErrorKind::InvalidData, message))
}

/// Collect pass: the declaring type of every token-designated entity, in
/// first-appearance order. Written ahead of the body so all referenced
/// types are realized before the body is reinterpreted.
pub(crate) fn collect_referenced_types(method: &Arc<MethodDef>) -> Result<Vec<Ty>, PickleError> {
	let Some(body) = method.body() else {
		return Ok(Vec::new());
	};
	let module = method
		.module()
		.ok_or_else(|| PickleError::DetachedMember(method.to_string()))?;

	let mut seen = FxHashSet::default();
	let mut types = Vec::new();
	for instruction in InstructionIterator::new(&body.code) {
		let instruction = instruction.map_err(|e| malformed(method, e))?;
		let token = match instruction.kind {
			OperandKind::InlineType
			| OperandKind::InlineField
			| OperandKind::InlineMethod
			| OperandKind::InlineTok => match instruction.token() {
				Some(token) => token,
				None => continue,
			},
			_ => continue,
		};
		let target = module
			.resolve_token(token)
			.ok_or(PickleError::UnresolvedToken(token))?;
		let ty = match target {
			TokenTarget::Type(ty) => ty,
			TokenTarget::Field(field) => match field.declaring_type() {
				Some(declaring) => Ty::Def(declaring),
				None => continue,
			},
			TokenTarget::Method(method) => match method.declaring_type() {
				Some(declaring) => Ty::Def(declaring),
				None => continue,
			},
			TokenTarget::String(_) | TokenTarget::Signature(_) => continue,
		};
		if seen.insert(ty.clone()) {
			types.push(ty);
		}
	}
	Ok(types)
}

/// Emit pass: every opcode copied verbatim, token operands rewritten into
/// recursive entity references, terminated by the sentinel byte.
pub(crate) fn write_body_code<'p, W: Write>(
	state: &mut PickleState<'p, W>,
	method: &Arc<MethodDef>,
) -> Result<(), PickleError> {
	let Some(body) = method.body() else {
		return Ok(state.out.write_u8(BODY_TERMINATOR)?);
	};
	let module = method
		.module()
		.ok_or_else(|| PickleError::DetachedMember(method.to_string()))?;

	for instruction in InstructionIterator::new(&body.code) {
		let instruction = instruction.map_err(|e| malformed(method, e))?;
		if instruction.compound {
			state.out.write_u8(COMPOUND_PREFIX)?;
		}
		state.out.write_u8(instruction.discriminant)?;

		if !instruction.kind.carries_token() {
			state.out.write_raw(instruction.operand)?;
			continue;
		}
		let token = match instruction.token() {
			Some(token) => token,
			None => continue,
		};
		let target = module
			.resolve_token(token)
			.ok_or(PickleError::UnresolvedToken(token))?;
		match (instruction.kind, target) {
			(OperandKind::InlineString, TokenTarget::String(value)) => {
				state.out.write_str(&value)?;
			}
			(OperandKind::InlineSig, TokenTarget::Signature(signature)) => {
				signature.write(&mut state.out)?;
			}
			(OperandKind::InlineType, TokenTarget::Type(ty)) => {
				walker::write_type(state, &ty)?;
			}
			(OperandKind::InlineField, TokenTarget::Field(field)) => {
				walker::write_field(state, &field)?;
			}
			(OperandKind::InlineMethod, TokenTarget::Method(method)) => {
				walker::write_method(state, &method)?;
			}
			(OperandKind::InlineTok, target) => {
				let member = match target {
					TokenTarget::Type(ty) => Member::Type(ty),
					TokenTarget::Field(field) => Member::Field(field),
					TokenTarget::Method(method) => Member::Method(method),
					_ => return Err(PickleError::UnresolvedToken(token)),
				};
				walker::write_member(state, &member)?;
			}
			_ => return Err(PickleError::UnresolvedToken(token)),
		}
	}
	Ok(state.out.write_u8(BODY_TERMINATOR)?)
}
