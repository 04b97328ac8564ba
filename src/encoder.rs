use crate::error::AsmErrorKind;
use crate::isa::{BitOp, Layout, Opcode};
use crate::operand;
use crate::symbol::LabelTable;

/// Mnemonics without an encoding of their own, rewritten into a primary instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pseudo {
    /// `cmp a, b` -> `sub r0, a, b`
    Cmp,
    /// `mov a, b` -> `add a, b, r0`
    Mov,
    /// `lsh a, b` -> `add a, b, b`
    Lsh,
    /// `inc a` -> `adi a, 1`
    Inc,
    /// `dec a` -> `adi a, -1`
    Dec,
    /// `orr`/`and`/... `a, b, c` -> `bit a, b, <op>, c`
    Bit(BitOp),
    /// `not a, b` -> `bit a, b, nor, r0`
    Not,
}

impl Pseudo {
    fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "cmp" => Self::Cmp,
            "mov" => Self::Mov,
            "lsh" => Self::Lsh,
            "inc" => Self::Inc,
            "dec" => Self::Dec,
            "orr" => Self::Bit(BitOp::Or),
            "and" => Self::Bit(BitOp::And),
            "xor" => Self::Bit(BitOp::Xor),
            "imp" => Self::Bit(BitOp::Implies),
            "nor" => Self::Bit(BitOp::Nor),
            "nnd" => Self::Bit(BitOp::Nand),
            "xnr" => Self::Bit(BitOp::Xnor),
            "nmp" => Self::Bit(BitOp::Nimplies),
            "not" => Self::Not,
            _ => return None,
        })
    }

    fn arity(self) -> usize {
        match self {
            Self::Inc | Self::Dec => 1,
            Self::Cmp | Self::Mov | Self::Lsh | Self::Not => 2,
            Self::Bit(_) => 3,
        }
    }

    /// Rewrite operands into the primary form. `args` must hold exactly `arity()` items.
    fn expand<'a>(self, args: &[&'a str]) -> (&'static str, Vec<&'a str>) {
        match self {
            Self::Cmp => ("sub", vec!["r0", args[0], args[1]]),
            Self::Mov => ("add", vec![args[0], args[1], "r0"]),
            Self::Lsh => ("add", vec![args[0], args[1], args[1]]),
            Self::Inc => ("adi", vec![args[0], "1"]),
            Self::Dec => ("adi", vec![args[0], "-1"]),
            Self::Bit(op) => ("bit", vec![args[0], args[1], op.name(), args[2]]),
            Self::Not => ("bit", vec![args[0], args[1], "nor", "r0"]),
        }
    }
}

fn check_arity(expected: usize, args: &[&str]) -> Result<(), AsmErrorKind> {
    if args.len() != expected {
        return Err(AsmErrorKind::ArgumentCount {
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// Encode one instruction into a word.
///
/// Pseudo-instructions are expanded and encoded recursively. Address operands may
/// name any label in `labels`.
pub fn encode(mnemonic: &str, args: &[&str], labels: &LabelTable) -> Result<u16, AsmErrorKind> {
    if let Some(opcode) = Opcode::from_mnemonic(mnemonic) {
        let layout = opcode.layout();
        check_arity(layout.arity(), args)?;
        let fields = encode_fields(layout, args, labels)?;
        return Ok((opcode as u16) << 12 | fields);
    }
    if let Some(pseudo) = Pseudo::from_mnemonic(mnemonic) {
        check_arity(pseudo.arity(), args)?;
        let (primary, args) = pseudo.expand(args);
        return encode(primary, &args, labels);
    }
    Err(AsmErrorKind::UnknownMnemonic(mnemonic.to_string()))
}

fn encode_fields(layout: Layout, args: &[&str], labels: &LabelTable) -> Result<u16, AsmErrorKind> {
    use operand::{address, condition, immediate, offset, operation, register};

    Ok(match layout {
        Layout::Bare => 0,
        Layout::Addr => address(args[0], labels)?,
        Layout::CondAddr => condition(args[0])? << 10 | address(args[1], labels)?,
        Layout::RegImm => register(args[0])? << 9 | immediate(args[1], false)?,
        Layout::RegPort => register(args[0])? << 9 | immediate(args[1], true)?,
        Layout::RegRegOffset => {
            register(args[0])? << 9 | register(args[1])? << 6 | offset(args[2])?
        }
        Layout::RegRegReg => register(args[0])? << 9 | register(args[1])? << 6 | register(args[2])?,
        Layout::RegRegOpReg => {
            register(args[0])? << 9
                | register(args[1])? << 6
                | operation(args[2])? << 3
                | register(args[3])?
        }
        Layout::RegReg => register(args[0])? << 9 | register(args[1])? << 6,
    })
}
