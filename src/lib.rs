// Instruction set
pub mod isa;

// Assembling
mod air;
pub use air::{Air, AsmLine};
mod encoder;
pub use encoder::encode;
pub mod operand;
mod parser;
pub use parser::{assemble, AsmParser};
mod symbol;
pub use symbol::{LabelEntry, LabelTable};

// Artifacts
mod debug_map;
pub use debug_map::{DebugMap, DEBUG_EXTENSION};
mod image;
pub use image::{Image, MAX_WORDS};

// Running
mod runtime;
pub use runtime::{RunState, Step, StepError};
#[macro_use]
pub mod output;
pub mod debugger;
pub use debugger::Debugger;

mod error;
pub use error::{AsmError, AsmErrorKind, ImageError};

pub mod env;
