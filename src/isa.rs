use std::fmt;

/// Highest instruction address plus one. Addresses are 10 bits wide.
pub const ADDRESS_SPACE: u16 = 1 << 10;
/// Size of data memory in bytes.
pub const MEMORY_SIZE: usize = 256;

/// Represents the CPU registers.
///
/// `R0` always reads as zero and ignores writes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    /// Register selected by the low 3 bits of `bits`.
    pub fn from_bits(bits: u16) -> Register {
        Self::ALL[(bits & 0b111) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", *self as u8)
    }
}

/// Branch condition of `brh`, tested against the flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
    /// Zero flag set
    Eq = 0b00,
    /// Zero flag clear
    Ne = 0b01,
    /// Carry flag set
    Ge = 0b10,
    /// Carry flag clear
    Lt = 0b11,
}

impl Condition {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            _ => return None,
        })
    }

    pub fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0b00 => Self::Eq,
            0b01 => Self::Ne,
            0b10 => Self::Ge,
            _ => Self::Lt,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Ge => "ge",
            Self::Lt => "lt",
        }
    }

    pub fn holds(self, zero: bool, carry: bool) -> bool {
        match self {
            Self::Eq => zero,
            Self::Ne => !zero,
            Self::Ge => carry,
            Self::Lt => !carry,
        }
    }
}

/// Boolean operation selected by the `bit` instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BitOp {
    Or = 0,
    And,
    Xor,
    Implies,
    Nor,
    Nand,
    Xnor,
    Nimplies,
}

impl BitOp {
    pub const ALL: [BitOp; 8] = [
        BitOp::Or,
        BitOp::And,
        BitOp::Xor,
        BitOp::Implies,
        BitOp::Nor,
        BitOp::Nand,
        BitOp::Xnor,
        BitOp::Nimplies,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn from_bits(bits: u16) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Xor => "xor",
            Self::Implies => "implies",
            Self::Nor => "nor",
            Self::Nand => "nand",
            Self::Xnor => "xnor",
            Self::Nimplies => "nimplies",
        }
    }

    /// Apply the operation. `b` and `c` are sign-extended register values, so the
    /// result is negative exactly when its low byte has the top bit set.
    pub fn apply(self, b: i16, c: i16) -> i16 {
        match self {
            Self::Or => b | c,
            Self::And => b & c,
            Self::Xor => b ^ c,
            Self::Implies => !b | c,
            Self::Nor => !(b | c),
            Self::Nand => !(b & c),
            Self::Xnor => !(b ^ c),
            Self::Nimplies => b & !c,
        }
    }
}

/// The 16 primary instruction selectors, stored in the top 4 bits of a word.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Nop = 0b0000,
    Hlt = 0b0001,
    Jmp = 0b0010,
    Brh = 0b0011,
    Cal = 0b0100,
    Ret = 0b0101,
    Pld = 0b0110,
    Pst = 0b0111,
    Mld = 0b1000,
    Mst = 0b1001,
    Ldi = 0b1010,
    Adi = 0b1011,
    Add = 0b1100,
    Sub = 0b1101,
    Bit = 0b1110,
    Rsh = 0b1111,
}

/// Which operands an opcode takes, in source order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layout {
    /// No operands
    Bare,
    /// `addr`
    Addr,
    /// `cond, addr`
    CondAddr,
    /// `rA, imm`
    RegImm,
    /// `rA, port`
    RegPort,
    /// `rA, rB, offset`
    RegRegOffset,
    /// `rA, rB, rC`
    RegRegReg,
    /// `rA, rB, op, rC`
    RegRegOpReg,
    /// `rA, rB`
    RegReg,
}

impl Layout {
    pub fn arity(self) -> usize {
        match self {
            Self::Bare => 0,
            Self::Addr => 1,
            Self::CondAddr | Self::RegImm | Self::RegPort | Self::RegReg => 2,
            Self::RegRegOffset | Self::RegRegReg => 3,
            Self::RegRegOpReg => 4,
        }
    }
}

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::Nop,
        Opcode::Hlt,
        Opcode::Jmp,
        Opcode::Brh,
        Opcode::Cal,
        Opcode::Ret,
        Opcode::Pld,
        Opcode::Pst,
        Opcode::Mld,
        Opcode::Mst,
        Opcode::Ldi,
        Opcode::Adi,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Bit,
        Opcode::Rsh,
    ];

    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Hlt => "hlt",
            Self::Jmp => "jmp",
            Self::Brh => "brh",
            Self::Cal => "cal",
            Self::Ret => "ret",
            Self::Pld => "pld",
            Self::Pst => "pst",
            Self::Mld => "mld",
            Self::Mst => "mst",
            Self::Ldi => "ldi",
            Self::Adi => "adi",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Bit => "bit",
            Self::Rsh => "rsh",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Self::Nop | Self::Hlt | Self::Ret => Layout::Bare,
            Self::Jmp | Self::Cal => Layout::Addr,
            Self::Brh => Layout::CondAddr,
            Self::Pld | Self::Pst => Layout::RegPort,
            Self::Mld | Self::Mst => Layout::RegRegOffset,
            Self::Ldi | Self::Adi => Layout::RegImm,
            Self::Add | Self::Sub => Layout::RegRegReg,
            Self::Bit => Layout::RegRegOpReg,
            Self::Rsh => Layout::RegReg,
        }
    }
}

impl TryFrom<u16> for Opcode {
    type Error = u16;

    /// Fails for values wider than 4 bits.
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(value)
    }
}

/// All operand fields of a word, extracted regardless of opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fields {
    pub a: Register,
    pub b: Register,
    pub c: Register,
    pub address: u16,
    pub condition: Condition,
    pub op: BitOp,
    /// Sign-extended 6-bit offset
    pub offset: i8,
    pub immediate: u8,
}

impl Fields {
    pub fn decode(word: u16) -> Self {
        Fields {
            a: Register::from_bits(word >> 9),
            b: Register::from_bits(word >> 6),
            c: Register::from_bits(word),
            address: word & 0x3ff,
            condition: Condition::from_bits(word >> 10),
            op: BitOp::from_bits(word >> 3),
            offset: s_ext6(word),
            immediate: (word & 0xff) as u8,
        }
    }
}

/// Sign-extend the low 6 bits of `val`.
#[inline]
pub fn s_ext6(val: u16) -> i8 {
    (((val & 0x3f) as u8) << 2) as i8 >> 2
}

/// A decoded instruction word.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    Nop,
    Hlt,
    Jmp { address: u16 },
    Brh { condition: Condition, address: u16 },
    Cal { address: u16 },
    Ret,
    Pld { dest: Register, port: u8 },
    Pst { src: Register, port: u8 },
    Mld { dest: Register, base: Register, offset: i8 },
    Mst { src: Register, base: Register, offset: i8 },
    Ldi { dest: Register, immediate: u8 },
    Adi { dest: Register, immediate: u8 },
    Add { dest: Register, lhs: Register, rhs: Register },
    Sub { dest: Register, lhs: Register, rhs: Register },
    Bit { dest: Register, lhs: Register, op: BitOp, rhs: Register },
    Rsh { dest: Register, src: Register },
}

impl Instruction {
    /// Decode a word. Fails only if the opcode lies outside the 16 defined patterns.
    pub fn decode(word: u16) -> Result<Self, u16> {
        let opcode = Opcode::try_from(word >> 12)?;
        let f = Fields::decode(word);
        Ok(match opcode {
            Opcode::Nop => Self::Nop,
            Opcode::Hlt => Self::Hlt,
            Opcode::Jmp => Self::Jmp { address: f.address },
            Opcode::Brh => Self::Brh {
                condition: f.condition,
                address: f.address,
            },
            Opcode::Cal => Self::Cal { address: f.address },
            Opcode::Ret => Self::Ret,
            Opcode::Pld => Self::Pld {
                dest: f.a,
                port: f.immediate,
            },
            Opcode::Pst => Self::Pst {
                src: f.a,
                port: f.immediate,
            },
            Opcode::Mld => Self::Mld {
                dest: f.a,
                base: f.b,
                offset: f.offset,
            },
            Opcode::Mst => Self::Mst {
                src: f.a,
                base: f.b,
                offset: f.offset,
            },
            Opcode::Ldi => Self::Ldi {
                dest: f.a,
                immediate: f.immediate,
            },
            Opcode::Adi => Self::Adi {
                dest: f.a,
                immediate: f.immediate,
            },
            Opcode::Add => Self::Add {
                dest: f.a,
                lhs: f.b,
                rhs: f.c,
            },
            Opcode::Sub => Self::Sub {
                dest: f.a,
                lhs: f.b,
                rhs: f.c,
            },
            Opcode::Bit => Self::Bit {
                dest: f.a,
                lhs: f.b,
                op: f.op,
                rhs: f.c,
            },
            Opcode::Rsh => Self::Rsh { dest: f.a, src: f.b },
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Nop => write!(f, "nop"),
            Self::Hlt => write!(f, "hlt"),
            Self::Jmp { address } => write!(f, "jmp 0x{address:03x}"),
            Self::Brh { condition, address } => {
                write!(f, "brh {}, 0x{address:03x}", condition.name())
            }
            Self::Cal { address } => write!(f, "cal 0x{address:03x}"),
            Self::Ret => write!(f, "ret"),
            Self::Pld { dest, port } => write!(f, "pld {dest}, {port}"),
            Self::Pst { src, port } => write!(f, "pst {src}, {port}"),
            Self::Mld { dest, base, offset } => write!(f, "mld {dest}, {base}, {offset}"),
            Self::Mst { src, base, offset } => write!(f, "mst {src}, {base}, {offset}"),
            Self::Ldi { dest, immediate } => write!(f, "ldi {dest}, {immediate}"),
            Self::Adi { dest, immediate } => write!(f, "adi {dest}, {}", immediate as i8),
            Self::Add { dest, lhs, rhs } => write!(f, "add {dest}, {lhs}, {rhs}"),
            Self::Sub { dest, lhs, rhs } => write!(f, "sub {dest}, {lhs}, {rhs}"),
            Self::Bit { dest, lhs, op, rhs } => {
                write!(f, "bit {dest}, {lhs}, {}, {rhs}", op.name())
            }
            Self::Rsh { dest, src } => write!(f, "rsh {dest}, {src}"),
        }
    }
}
