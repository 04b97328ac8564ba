use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Reasons an assembly run can fail. The first one encountered aborts the run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AsmErrorKind {
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    #[error("expected {expected} argument(s), got {found}")]
    ArgumentCount { expected: usize, found: usize },
    #[error("missing comma between arguments")]
    MissingComma,
    #[error("expected register, got '{0}'")]
    ExpectedRegister(String),
    #[error("register number must be less than 8, got '{0}'")]
    RegisterRange(String),
    #[error("expected {}, got '{token}'", operand_name(.port))]
    ExpectedImmediate { token: String, port: bool },
    #[error("{} must be between -128 and 255, got '{token}'", operand_name(.port))]
    ImmediateRange { token: String, port: bool },
    #[error("expected offset, got '{0}'")]
    ExpectedOffset(String),
    #[error("offset must be between -32 and 31, got '{0}'")]
    OffsetRange(String),
    #[error("unknown label or invalid integer address '{0}'")]
    UnknownLabel(String),
    #[error("address must be between 0 and 1023, got '{0}'")]
    AddressRange(String),
    #[error("unknown condition '{0}'")]
    UnknownCondition(String),
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("label '{0}' already defined")]
    DuplicateLabel(String),
    #[error("program too long")]
    ProgramTooLong,
}

fn operand_name(port: &bool) -> &'static str {
    if *port {
        "port"
    } else {
        "immediate"
    }
}

impl AsmErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownMnemonic(_) => "basm::unknown_mnemonic",
            Self::ArgumentCount { .. } => "basm::argument_count",
            Self::MissingComma => "basm::missing_comma",
            Self::ExpectedRegister(_) | Self::RegisterRange(_) => "basm::register",
            Self::ExpectedImmediate { .. } | Self::ImmediateRange { .. } => "basm::immediate",
            Self::ExpectedOffset(_) | Self::OffsetRange(_) => "basm::offset",
            Self::UnknownLabel(_) | Self::AddressRange(_) => "basm::address",
            Self::UnknownCondition(_) => "basm::condition",
            Self::UnknownOperation(_) => "basm::operation",
            Self::DuplicateLabel(_) => "basm::duplicate_label",
            Self::ProgramTooLong => "basm::program_too_long",
        }
    }

    pub fn help(&self) -> Option<&'static str> {
        Some(match self {
            Self::UnknownMnemonic(_) => "check the list of instructions and pseudo-instructions",
            Self::ArgumentCount { .. } => "check the number of operands for this instruction",
            Self::MissingComma => "operands must be separated by commas",
            Self::ExpectedRegister(_) | Self::RegisterRange(_) => {
                "registers are written r0 through r7"
            }
            Self::ExpectedImmediate { .. } | Self::ExpectedOffset(_) => {
                "literals are decimal, or hex/binary when containing 0x/0b"
            }
            Self::UnknownLabel(_) => "labels are defined with a `name:` prefix",
            Self::UnknownCondition(_) => "conditions are eq, ne, ge and lt",
            Self::UnknownOperation(_) => {
                "operations are or, and, xor, implies, nor, nand, xnor and nimplies"
            }
            Self::DuplicateLabel(_) => "labels may only be defined once per file",
            Self::ProgramTooLong => "programs hold at most 1024 instructions",
            Self::ImmediateRange { .. } | Self::OffsetRange(_) | Self::AddressRange(_) => {
                return None
            }
        })
    }
}

/// An assembly error with the source location it was raised at.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{path}:{line}: {kind}")]
pub struct AsmError {
    pub path: String,
    /// 1-based source line
    pub line: usize,
    pub kind: AsmErrorKind,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, path: impl Into<String>, line: usize) -> Self {
        AsmError {
            path: path.into(),
            line,
            kind,
        }
    }
}

impl Diagnostic for AsmError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind
            .help()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }
}

/// Failure to load a program image or its debug map.
#[derive(Debug, Error, Diagnostic)]
pub enum ImageError {
    #[error("program image is not aligned to 16 bits ({0} bytes)")]
    #[diagnostic(code(image::alignment))]
    Unaligned(usize),
    #[error("program image holds {0} words, at most 1024 are allowed")]
    #[diagnostic(code(image::too_long))]
    TooLong(usize),
    #[error("debug map is malformed: {0}")]
    #[diagnostic(
        code(image::debug_map),
        help("re-run the assembler with the -d flag to regenerate it")
    )]
    DebugMap(#[from] serde_json::Error),
}
