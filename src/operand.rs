//! Operand encoders. Each validates one source token and returns its packed bit field.

use std::num::IntErrorKind;

use crate::error::AsmErrorKind;
use crate::isa::{BitOp, Condition, ADDRESS_SPACE};
use crate::symbol::LabelTable;

/// Result of reading a numeric literal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Literal {
    Value(i64),
    /// Well-formed, but too large to represent; always out of range.
    Overflow,
}

/// Parse a literal the way the assembler reads all numbers: base 10, unless the token
/// contains `0x` (base 16) or `0b` (base 2) anywhere. Every occurrence of the prefix is
/// removed before parsing, so `-0x10` and `0x-10` both read as -16.
pub fn parse_literal(token: &str) -> Option<Literal> {
    let (digits, radix) = if token.contains("0x") {
        (token.replace("0x", ""), 16)
    } else if token.contains("0b") {
        (token.replace("0b", ""), 2)
    } else {
        (token.to_string(), 10)
    };
    match i64::from_str_radix(&digits, radix) {
        Ok(value) => Some(Literal::Value(value)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Some(Literal::Overflow),
            _ => None,
        },
    }
}

fn in_range(literal: Literal, min: i64, max: i64) -> Option<i64> {
    match literal {
        Literal::Value(value) if (min..=max).contains(&value) => Some(value),
        _ => None,
    }
}

/// `r0`..`r7` -> 3 bits.
pub fn register(token: &str) -> Result<u16, AsmErrorKind> {
    let digits = token
        .strip_prefix('r')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| AsmErrorKind::ExpectedRegister(token.to_string()))?;
    match digits.parse::<u32>() {
        Ok(num) if num < 8 => Ok(num as u16),
        _ => Err(AsmErrorKind::RegisterRange(token.to_string())),
    }
}

/// Literal in [-128, 255] -> 8 bits (two's complement for negatives).
///
/// `port` only changes the wording of diagnostics.
pub fn immediate(token: &str, port: bool) -> Result<u16, AsmErrorKind> {
    let literal = parse_literal(token).ok_or_else(|| AsmErrorKind::ExpectedImmediate {
        token: token.to_string(),
        port,
    })?;
    let value = in_range(literal, -128, 255).ok_or_else(|| AsmErrorKind::ImmediateRange {
        token: token.to_string(),
        port,
    })?;
    Ok((value & 0xff) as u16)
}

/// Literal in [-32, 31] -> 6 bits.
pub fn offset(token: &str) -> Result<u16, AsmErrorKind> {
    let literal =
        parse_literal(token).ok_or_else(|| AsmErrorKind::ExpectedOffset(token.to_string()))?;
    let value = in_range(literal, -32, 31)
        .ok_or_else(|| AsmErrorKind::OffsetRange(token.to_string()))?;
    Ok((value & 0x3f) as u16)
}

/// Literal or label in [0, 1023] -> 10 bits.
///
/// Tokens which are not literals are looked up in the label table.
pub fn address(token: &str, labels: &LabelTable) -> Result<u16, AsmErrorKind> {
    let literal = match parse_literal(token) {
        Some(literal) => literal,
        None => labels
            .address(token)
            .map(|address| Literal::Value(address as i64))
            .ok_or_else(|| AsmErrorKind::UnknownLabel(token.to_string()))?,
    };
    let value = in_range(literal, 0, ADDRESS_SPACE as i64 - 1)
        .ok_or_else(|| AsmErrorKind::AddressRange(token.to_string()))?;
    Ok(value as u16)
}

/// `eq`/`ne`/`ge`/`lt` -> 2 bits.
pub fn condition(token: &str) -> Result<u16, AsmErrorKind> {
    Condition::from_name(token)
        .map(|cond| cond as u16)
        .ok_or_else(|| AsmErrorKind::UnknownCondition(token.to_string()))
}

/// Bitwise operation name -> 3 bits.
pub fn operation(token: &str) -> Result<u16, AsmErrorKind> {
    BitOp::from_name(token)
        .map(|op| op as u16)
        .ok_or_else(|| AsmErrorKind::UnknownOperation(token.to_string()))
}
