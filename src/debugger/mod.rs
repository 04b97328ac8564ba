mod breakpoint;
mod command;
mod reader;

use std::io::BufRead;

pub use self::breakpoint::{Breakpoint, Breakpoints};
pub use self::command::{Command, CommandError, CommandName, Location};
pub use self::reader::CommandReader;
use crate::debug_map::DebugMap;
use crate::env::Env;
use crate::image::Image;
use crate::isa::Instruction;
use crate::output::{Condition, Output};
use crate::runtime::{RunState, Step, StepError};

/// Stepping session over one program. Owns the only live machine state.
pub struct Debugger {
    state: RunState,
    debug_map: DebugMap,
    breakpoints: Breakpoints,
    env: Env,
    /// Outcome of the most recent `step` or `continue`
    last_message: Option<String>,
}

/// Why a run of instructions stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stop {
    /// Requested number of steps executed
    Done,
    Halted,
    Breakpoint(u16),
    Error(StepError),
    StepLimit(u64),
}

/// Whether the session should keep reading commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Proceed,
    Quit,
}

impl Debugger {
    pub fn new(image: Image, debug_map: DebugMap, env: Env) -> Self {
        Self {
            state: RunState::new(image),
            debug_map,
            breakpoints: Breakpoints::default(),
            env,
            last_message: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Read and execute commands until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, reader: &mut CommandReader<R>) {
        self.print_position();
        while let Some(line) = reader.read() {
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(error) => {
                    dprintln!(Always, "\x1b[31m{}\x1b[0m", error);
                    continue;
                }
            };
            if self.execute(command) == Action::Quit {
                break;
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> Action {
        match command {
            Command::Help => print_help(),
            Command::Quit => return Action::Quit,
            Command::Step { count } => {
                let count = u64::from(count);
                let limit = self.env.step_limit;
                let stop = match self.step(count.min(limit)) {
                    Stop::Done if count > limit => Stop::StepLimit(limit),
                    stop => stop,
                };
                self.report(stop);
            }
            Command::Continue => {
                let stop = self.run_until_stop();
                self.report(stop);
            }
            Command::Reset => {
                self.state.reset();
                self.last_message = None;
                dprintln!(Always, "Reset program, {} breakpoint(s) kept", self.breakpoints.len());
                self.print_position();
            }
            Command::Registers => Output::Debugger(Condition::Always).print_registers(&self.state),
            Command::Memory => Output::Debugger(Condition::Always).print_memory(&self.state),
            Command::List { line } => self.print_source(line),
            Command::BreakList => self.print_breakpoints(),
            Command::BreakAdd { location } => match self.resolve(&location) {
                Ok(address) => {
                    let label = match location {
                        Location::Label(name) => Some(name),
                        Location::Address(_) => None,
                    };
                    if self.breakpoints.insert(Breakpoint { address, label }) {
                        dprintln!(Always, "Added breakpoint at 0x{:03x}", address);
                    } else {
                        dprintln!(Always, "Breakpoint already exists at 0x{:03x}", address);
                    }
                }
                Err(message) => dprintln!(Always, "\x1b[31m{}\x1b[0m", message),
            },
            Command::BreakRemove { location } => match self.resolve(&location) {
                Ok(address) => {
                    if self.breakpoints.remove(address) {
                        dprintln!(Always, "Removed breakpoint at 0x{:03x}", address);
                    } else {
                        dprintln!(Always, "No breakpoint exists at 0x{:03x}", address);
                    }
                }
                Err(message) => dprintln!(Always, "\x1b[31m{}\x1b[0m", message),
            },
        }
        Action::Proceed
    }

    /// Execute up to `count` instructions.
    ///
    /// A breakpoint on the instruction about to run only stops execution after the first step,
    /// so repeating a command always makes progress.
    pub fn step(&mut self, count: u64) -> Stop {
        for i in 0..count {
            if let Some(stop) = self.step_once(i == 0) {
                return stop;
            }
        }
        Stop::Done
    }

    /// Step until the program halts, fails, hits a breakpoint, or exceeds the step limit.
    pub fn run_until_stop(&mut self) -> Stop {
        match self.step(self.env.step_limit) {
            Stop::Done => Stop::StepLimit(self.env.step_limit),
            stop => stop,
        }
    }

    fn step_once(&mut self, is_first: bool) -> Option<Stop> {
        let pc = self.state.pc();
        if !is_first && self.breakpoints.contains(pc) {
            return Some(Stop::Breakpoint(pc));
        }
        match self.state.step() {
            Ok(Step::Running) => None,
            Ok(Step::Halted) => Some(Stop::Halted),
            Err(error) => Some(Stop::Error(error)),
        }
    }

    fn resolve(&self, location: &Location) -> Result<u16, String> {
        match location {
            Location::Address(address) => Ok(*address),
            Location::Label(name) => self
                .debug_map
                .label_address(name)
                .ok_or_else(|| format!("unknown label '{name}'")),
        }
    }

    fn report(&mut self, stop: Stop) {
        let message = match stop {
            Stop::Done => None,
            Stop::Halted => Some("halted".to_string()),
            Stop::Breakpoint(address) => Some(format!("breakpoint at 0x{address:03x}")),
            Stop::Error(error) => Some(error.to_string()),
            Stop::StepLimit(limit) => Some(format!("stopped after {limit} steps")),
        };
        if let Some(message) = &message {
            dprintln!(Always, "\x1b[33m{}\x1b[0m", message);
        }
        self.last_message = message;
        self.print_position();
    }

    /// One-line summary of where execution is.
    fn print_position(&self) {
        let pc = self.state.pc();
        let instr = match Instruction::decode(self.state.current_word()) {
            Ok(instr) => instr.to_string(),
            Err(opcode) => format!("<opcode 0b{opcode:04b}>"),
        };
        dprint!(Always, "\x1b[1mpc\x1b[0m 0x{:03x}", pc);
        for label in self.debug_map.labels_at(pc) {
            dprint!(Always, " {}:", label);
        }
        if let Some(line) = self.debug_map.line_for(pc) {
            dprint!(Always, " \x1b[2mline {}\x1b[0m", line);
        }
        dprintln!(Always, " {}", instr);
    }

    /// Window of source lines around `line`, or around the current instruction.
    fn print_source(&self, line: Option<usize>) {
        let line_count = self.debug_map.line_count();
        let current = self.debug_map.line_for(self.state.pc());
        let Some(focus) = line.or(current) else {
            dprintln!(Always, "Program counter is outside the program");
            return;
        };
        if focus > line_count {
            dprintln!(Always, "\x1b[31mline {} is past the end of {}\x1b[0m", focus, self.debug_map.source_path());
            return;
        }

        let context = self.env.context_lines;
        let start = focus.saturating_sub(context).max(1);
        let end = (focus + context).min(line_count);
        let breakpoint_lines: Vec<usize> = self
            .breakpoints
            .iter()
            .filter_map(|breakpoint| self.debug_map.line_for(breakpoint.address))
            .collect();

        let lines = self.debug_map.source_lines().enumerate().map(|(i, text)| (i + 1, text));
        for (number, text) in lines.skip(start - 1).take(end + 1 - start) {
            let marker = if Some(number) == current { "->" } else { "  " };
            let breakpoint = if breakpoint_lines.contains(&number) { "*" } else { " " };
            dprintln!(
                Always,
                "{}{} \x1b[2m{:>4}\x1b[0m  {}",
                breakpoint,
                marker,
                number,
                text
            );
        }
    }

    fn print_breakpoints(&self) {
        if self.breakpoints.is_empty() {
            dprintln!(Always, "No breakpoints exist");
            return;
        }
        dprintln!(Always, "Breakpoints:");
        for breakpoint in &self.breakpoints {
            dprint!(Always, "  0x{:03x}", breakpoint.address);
            if let Some(label) = &breakpoint.label {
                dprint!(Always, " {}", label);
            }
            if let Some(line) = self.debug_map.line_for(breakpoint.address) {
                dprint!(Always, " \x1b[2m(line {})\x1b[0m", line);
            }
            dprintln!(Always);
        }
    }
}

fn print_help() {
    let help = include_str!("help.txt")
        .replace("{0}", "\x1b[0m")
        .replace("{1}", "\x1b[1m")
        .replace("{2}", "\x1b[2m");
    dprint!(Always, "{}", help);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::Register;
    use crate::parser::assemble;

    fn session(src: &str) -> Debugger {
        session_with(src, Env::default())
    }

    fn session_with(src: &str, env: Env) -> Debugger {
        let air = assemble(src, "test.basm").unwrap();
        let map = air.debug_map(src, "test.basm");
        Debugger::new(air.into_image(), map, env)
    }

    fn command(debugger: &mut Debugger, line: &str) -> Action {
        debugger.execute(line.parse().unwrap())
    }

    const ADD: &str = "ldi r1, 5\nldi r2, 3\nadd r3, r1, r2\nhlt\n";

    #[test]
    fn step_to_halt() {
        let mut debugger = session(ADD);
        assert_eq!(debugger.step(2), Stop::Done);
        assert_eq!(debugger.state().pc(), 2);
        assert_eq!(debugger.step(10), Stop::Halted);
        assert_eq!(debugger.state().reg(Register::R3), 8);
        assert_eq!(debugger.state().pc(), 3);
        assert_eq!(debugger.step(1), Stop::Error(StepError::Halted));
    }

    #[test]
    fn last_message() {
        let mut debugger = session(ADD);
        command(&mut debugger, "step");
        assert_eq!(debugger.last_message(), None);
        command(&mut debugger, "continue");
        assert_eq!(debugger.last_message(), Some("halted"));
        command(&mut debugger, "reset");
        assert_eq!(debugger.last_message(), None);
        assert_eq!(debugger.state().pc(), 0);
        assert_eq!(debugger.state().reg(Register::R3), 0);
    }

    #[test]
    fn continue_stops_at_breakpoint_then_passes_it() {
        let src = "ldi r1, 3\nloop: dec r1\nbrh ne, loop\nhlt";
        let mut debugger = session(src);
        command(&mut debugger, "break add loop");
        assert_eq!(debugger.run_until_stop(), Stop::Breakpoint(1));
        assert_eq!(debugger.state().reg(Register::R1), 3);
        assert_eq!(debugger.run_until_stop(), Stop::Breakpoint(1));
        assert_eq!(debugger.state().reg(Register::R1), 2);

        command(&mut debugger, "break remove 1");
        assert!(debugger.breakpoints().is_empty());
        assert_eq!(debugger.run_until_stop(), Stop::Halted);
        assert_eq!(debugger.state().reg(Register::R1), 0);
    }

    #[test]
    fn reset_keeps_breakpoints() {
        let mut debugger = session(ADD);
        command(&mut debugger, "break add 2");
        command(&mut debugger, "continue");
        assert_eq!(debugger.state().pc(), 2);
        command(&mut debugger, "reset");
        assert_eq!(debugger.breakpoints().len(), 1);
        assert_eq!(debugger.run_until_stop(), Stop::Breakpoint(2));
    }

    #[test]
    fn unknown_label_breakpoint() {
        let mut debugger = session(ADD);
        command(&mut debugger, "break add nowhere");
        assert!(debugger.breakpoints().is_empty());
    }

    #[test]
    fn step_limit() {
        let env = Env {
            step_limit: 50,
            ..Env::default()
        };
        let mut debugger = session_with("loop: jmp loop", env);
        assert_eq!(debugger.run_until_stop(), Stop::StepLimit(50));
        assert_eq!(debugger.last_message(), None);
        command(&mut debugger, "c");
        assert_eq!(debugger.last_message(), Some("stopped after 50 steps"));
        assert_eq!(debugger.state().pc(), 0);
    }

    #[test]
    fn step_count_is_capped() {
        let env = Env {
            step_limit: 50,
            ..Env::default()
        };
        let mut debugger = session_with("loop: jmp loop", env);
        command(&mut debugger, "step 4000000000");
        assert_eq!(debugger.last_message(), Some("stopped after 50 steps"));
        command(&mut debugger, "step 50");
        assert_eq!(debugger.last_message(), None);
    }

    #[test]
    fn stops_at_step_error() {
        let mut debugger = session("ldi r1, 1\nret\nhlt");
        assert_eq!(
            debugger.step(5),
            Stop::Error(StepError::StackUnderflow { pc: 1 })
        );
        assert_eq!(debugger.state().pc(), 1);
    }

    #[test]
    fn quit() {
        let mut debugger = session(ADD);
        assert_eq!(command(&mut debugger, "quit"), Action::Quit);
        assert_eq!(command(&mut debugger, "registers"), Action::Proceed);
    }
}
