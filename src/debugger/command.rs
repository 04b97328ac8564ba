use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::isa::ADDRESS_SPACE;
use crate::operand::{parse_literal, Literal};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Step { count: u32 },
    Continue,
    Reset,
    Registers,
    Memory,
    List { line: Option<usize> },
    BreakList,
    BreakAdd { location: Location },
    BreakRemove { location: Location },
    Quit,
}

/// Instruction address, given directly or by label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Address(u16),
    Label(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandName {
    Help,
    Step,
    Continue,
    Reset,
    Registers,
    Memory,
    List,
    Break,
    BreakList,
    BreakAdd,
    BreakRemove,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),
    #[error("'{command}' expects {argument}")]
    MissingArgument {
        command: CommandName,
        argument: &'static str,
    },
    #[error("'{command}' got an unexpected argument '{argument}'")]
    TooManyArguments {
        command: CommandName,
        argument: String,
    },
    #[error("'{command}' expects {expected}, got '{argument}'")]
    InvalidArgument {
        command: CommandName,
        expected: &'static str,
        argument: String,
    },
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Help => "help",
            Self::Step => "step",
            Self::Continue => "continue",
            Self::Reset => "reset",
            Self::Registers => "registers",
            Self::Memory => "memory",
            Self::List => "list",
            Self::Break => "break",
            Self::BreakList => "break list",
            Self::BreakAdd => "break add",
            Self::BreakRemove => "break remove",
            Self::Quit => "quit",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "0x{address:03x}"),
            Self::Label(name) => write!(f, "{name}"),
        }
    }
}

impl CommandName {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "help" | "h" => Self::Help,
            "step" | "s" => Self::Step,
            "continue" | "c" => Self::Continue,
            "reset" | "r" => Self::Reset,
            "registers" | "reg" => Self::Registers,
            "memory" | "mem" => Self::Memory,
            "list" | "l" => Self::List,
            "break" | "b" => Self::Break,
            "quit" | "q" => Self::Quit,
            _ => return None,
        })
    }
}

/// Whitespace-separated arguments of one command.
struct Args<'a> {
    command: CommandName,
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next(&mut self) -> Option<&'a str> {
        self.words.next()
    }

    fn expect(&mut self, argument: &'static str) -> Result<&'a str, CommandError> {
        self.next().ok_or(CommandError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn invalid(&self, expected: &'static str, argument: &str) -> CommandError {
        CommandError::InvalidArgument {
            command: self.command,
            expected,
            argument: argument.to_string(),
        }
    }

    fn positive(&self, word: &str, expected: &'static str) -> Result<u64, CommandError> {
        match parse_literal(word) {
            Some(Literal::Value(value)) if value > 0 => Ok(value as u64),
            _ => Err(self.invalid(expected, word)),
        }
    }

    fn location(&mut self) -> Result<Location, CommandError> {
        let word = self.expect("a label or address")?;
        match parse_literal(word) {
            Some(Literal::Value(value)) if (0..ADDRESS_SPACE as i64).contains(&value) => {
                Ok(Location::Address(value as u16))
            }
            Some(_) => Err(self.invalid("an address between 0 and 1023", word)),
            None => Ok(Location::Label(word.to_string())),
        }
    }

    /// Reject anything left over.
    fn finish(mut self) -> Result<(), CommandError> {
        match self.next() {
            None => Ok(()),
            Some(argument) => Err(CommandError::TooManyArguments {
                command: self.command,
                argument: argument.to_string(),
            }),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    /// Assumes line is non-empty.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let first = words.next().unwrap_or_default();
        let name = CommandName::from_word(&first.to_lowercase())
            .ok_or_else(|| CommandError::UnknownCommand(first.to_string()))?;
        let mut args = Args {
            command: name,
            words,
        };

        let command = match name {
            CommandName::Help => Command::Help,
            CommandName::Continue => Command::Continue,
            CommandName::Reset => Command::Reset,
            CommandName::Registers => Command::Registers,
            CommandName::Memory => Command::Memory,
            CommandName::Quit => Command::Quit,
            CommandName::Step => {
                let count = match args.next() {
                    None => 1,
                    Some(word) => {
                        let count = args.positive(word, "a positive step count")?;
                        u32::try_from(count)
                            .map_err(|_| args.invalid("a positive step count", word))?
                    }
                };
                Command::Step { count }
            }
            CommandName::List => {
                let line = match args.next() {
                    None => None,
                    Some(word) => {
                        let line = args.positive(word, "a line number")?;
                        Some(usize::try_from(line).map_err(|_| args.invalid("a line number", word))?)
                    }
                };
                Command::List { line }
            }
            CommandName::Break | CommandName::BreakList | CommandName::BreakAdd | CommandName::BreakRemove => {
                let sub = args.expect("one of 'add', 'remove' or 'list'")?;
                match sub {
                    "list" | "l" => {
                        args.command = CommandName::BreakList;
                        Command::BreakList
                    }
                    "add" | "a" => {
                        args.command = CommandName::BreakAdd;
                        Command::BreakAdd {
                            location: args.location()?,
                        }
                    }
                    "remove" | "r" => {
                        args.command = CommandName::BreakRemove;
                        Command::BreakRemove {
                            location: args.location()?,
                        }
                    }
                    _ => return Err(args.invalid("one of 'add', 'remove' or 'list'", sub)),
                }
            }
        };
        args.finish()?;
        Ok(command)
    }
}
