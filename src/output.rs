use std::cell::RefCell;
use std::path::Path;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::isa::{Register, MEMORY_SIZE};
use crate::runtime::RunState;

#[macro_export]
macro_rules! dprint {
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            $fmt
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Debugger($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger($cond).print_str(&s);
    }};
}

/// Debugger output, written to stderr.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    Debugger(Condition),
}

/// Whether debugger output survives `--minimal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Sometimes,
}

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

/// Print a right-aligned, colored status line, e.g. `  Assembling target foo.basm`.
pub fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

pub fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }

    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Debugger(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => eprint!("{}", ColoredString::from(string).blue()),
                // Always remove color if `--minimal`
                (true, Condition::Always) => eprint_colorless(string),
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn print_registers(&self, state: &RunState) {
        if Self::is_minimal() {
            for reg in Register::ALL {
                self.print_str(&format!("{} {}\n", reg, state.reg(reg)));
            }
            self.print_str(&format!("pc {}\n", state.pc()));
            self.print_str(&format!(
                "zero {} carry {}\n",
                state.zero() as u8,
                state.carry() as u8
            ));
            self.print_str(&format!("stack {}\n", state.stack().len()));
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│       \x1b[3mhex   uint    int    bin\x1b[0m\x1b[2m      │\x1b[0m\n");
        for reg in Register::ALL {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1m{}\x1b[0m  ", reg));
            self.print_integer(state.reg(reg));
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(&format!(" \x1b[1mpc\x1b[0m  0x{:03x}", state.pc()));
        self.print_str(&format!(
            "  \x1b[1mz\x1b[0m {}  \x1b[1mc\x1b[0m {}",
            state.zero() as u8,
            state.carry() as u8
        ));
        self.print_str(&format!("  \x1b[1msp\x1b[0m {:<4}", state.stack().len()));
        self.print_str(" \x1b[2m│\x1b[0m\n");
        self.print_str("\x1b[2m└──────────────────────────────────┘\x1b[0m\n");
    }

    fn print_integer(&self, value: u8) {
        self.print_str(&format!("0x{:02x}  ", value));
        self.print_str(&format!("{:>4}  ", value));
        self.print_str(&format!("{:>5}  ", value as i8));
        self.print_str(&format!("{:08b}", value));
    }

    /// 16x16 grid of memory, one byte per cell.
    pub fn print_memory(&self, state: &RunState) {
        const ROW: usize = 16;
        let header: String = (0..ROW).map(|col| format!(" {col:02X}")).collect();
        self.print_str(&format!("\x1b[2m   {header}\x1b[0m\n"));
        for (row, bytes) in state.memory().chunks(ROW).enumerate() {
            debug_assert!(row * ROW < MEMORY_SIZE);
            let cells: String = bytes.iter().map(|byte| format!(" {byte:02X}")).collect();
            self.print_str(&format!("\x1b[2m{:02X}\x1b[0m {cells}\n", row * ROW));
        }
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    eprint!("{}", Decolored::new(string).collect::<String>());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decolored() {
        assert_eq!(Decolored::new("abcdef").collect::<String>(), "abcdef");
        assert_eq!(
            Decolored::new("r1\x1b[0;2m 0x05\x1b[0m").collect::<String>(),
            "r1 0x05"
        );
        assert_eq!(Decolored::new("abc\x1b[0xyz").collect::<String>(), "abc");
    }

    #[test]
    fn minimal_flag_is_per_thread() {
        assert!(!Output::set_minimal(true));
        assert!(Output::is_minimal());
        assert!(Output::set_minimal(false));
    }
}
