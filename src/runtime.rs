use std::fmt;

use thiserror::Error;

use crate::image::Image;
use crate::isa::{Instruction, Register, ADDRESS_SPACE, MEMORY_SIZE};

/// Represents complete machine state during emulation.
#[derive(Clone, Debug)]
pub struct RunState {
    /// Program being executed. Never mutated, so `reset` can rebuild from it.
    image: Image,
    /// Data memory, 256 bytes
    mem: Box<[u8; MEMORY_SIZE]>,
    /// Program counter, 10 bits
    pc: u16,
    /// 8x 8-bit registers. `reg[0]` is never written.
    reg: [u8; 8],
    zero: bool,
    carry: bool,
    /// Return addresses pushed by `cal`
    stack: Vec<u16>,
    halted: bool,
}

/// Outcome of a successful step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    /// Instruction executed; program counter advanced or transferred.
    Running,
    /// `hlt` reached. The program counter stays on the `hlt`.
    Halted,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Halted => write!(f, "halted"),
        }
    }
}

/// A step that could not be executed. State is left exactly as before the step.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum StepError {
    #[error("unknown opcode 0b{opcode:04b} at address 0x{pc:03x}")]
    UnknownOpcode { opcode: u16, pc: u16 },
    #[error("port io is not implemented yet (address 0x{pc:03x})")]
    PortIo { pc: u16 },
    #[error("return with empty call stack at address 0x{pc:03x}")]
    StackUnderflow { pc: u16 },
    #[error("machine is halted, reset to run again")]
    Halted,
}

/// What the program counter does after an instruction.
enum Flow {
    Advance,
    /// Control transfer; the stored value is `target - 1` to cancel out the advance.
    Transfer(u16),
    Halt,
}

impl RunState {
    pub fn new(image: Image) -> Self {
        RunState {
            image,
            mem: Box::new([0; MEMORY_SIZE]),
            pc: 0,
            reg: [0; 8],
            zero: false,
            carry: false,
            stack: Vec::new(),
            halted: false,
        }
    }

    /// Discard all state and start over from the same program.
    pub fn reset(&mut self) {
        let image = std::mem::take(&mut self.image);
        *self = RunState::new(image);
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn reg(&self, reg: Register) -> u8 {
        self.reg[reg.index()]
    }

    pub fn registers(&self) -> &[u8; 8] {
        &self.reg
    }

    pub fn zero(&self) -> bool {
        self.zero
    }

    pub fn carry(&self) -> bool {
        self.carry
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.mem
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Word the next step will execute.
    pub fn current_word(&self) -> u16 {
        self.image.fetch(self.pc)
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self) -> Result<Step, StepError> {
        if self.halted {
            return Err(StepError::Halted);
        }
        let word = self.current_word();
        let instr = Instruction::decode(word).map_err(|opcode| StepError::UnknownOpcode {
            opcode,
            pc: self.pc,
        })?;

        match self.execute(instr)? {
            Flow::Advance => self.advance(self.pc),
            Flow::Transfer(pc) => self.advance(pc),
            Flow::Halt => {
                self.halted = true;
                return Ok(Step::Halted);
            }
        }
        Ok(Step::Running)
    }

    /// Set the program counter to one past `pc`, within the address space.
    fn advance(&mut self, pc: u16) {
        self.pc = pc.wrapping_add(1) % ADDRESS_SPACE;
    }

    fn execute(&mut self, instr: Instruction) -> Result<Flow, StepError> {
        use Instruction::*;
        match instr {
            Nop => {}
            Hlt => return Ok(Flow::Halt),
            Jmp { address } => return Ok(Self::jump(address)),
            Brh { condition, address } => {
                if condition.holds(self.zero, self.carry) {
                    return Ok(Self::jump(address));
                }
            }
            Cal { address } => {
                self.stack.push(self.pc);
                return Ok(Self::jump(address));
            }
            Ret => {
                let ret = self
                    .stack
                    .pop()
                    .ok_or(StepError::StackUnderflow { pc: self.pc })?;
                return Ok(Flow::Transfer(ret));
            }
            Pld { .. } | Pst { .. } => return Err(StepError::PortIo { pc: self.pc }),
            Mld { dest, base, offset } => {
                let addr = self.effective_address(base, offset);
                self.write(dest, self.mem[addr]);
            }
            Mst { src, base, offset } => {
                let addr = self.effective_address(base, offset);
                self.mem[addr] = self.reg(src);
            }
            Ldi { dest, immediate } => self.write(dest, immediate),
            Adi { dest, immediate } => {
                let res = self.signed(dest) + immediate as i8 as i16;
                self.write_flags(dest, res);
            }
            Add { dest, lhs, rhs } => {
                let res = self.signed(lhs) + self.signed(rhs);
                self.write_flags(dest, res);
            }
            Sub { dest, lhs, rhs } => {
                let res = self.signed(lhs) - self.signed(rhs);
                self.write_flags(dest, res);
            }
            Bit { dest, lhs, op, rhs } => {
                let res = op.apply(self.signed(lhs), self.signed(rhs));
                self.write_flags(dest, res);
            }
            // Logical shift of the raw byte
            Rsh { dest, src } => self.write(dest, self.reg(src) >> 1),
        }
        Ok(Flow::Advance)
    }

    #[inline]
    fn jump(address: u16) -> Flow {
        Flow::Transfer(address.wrapping_sub(1) % ADDRESS_SPACE)
    }

    /// Register value read as two's complement.
    #[inline]
    fn signed(&self, reg: Register) -> i16 {
        self.reg(reg) as i8 as i16
    }

    /// Base register plus offset, wrapped to the size of memory.
    #[inline]
    fn effective_address(&self, base: Register, offset: i8) -> usize {
        self.reg(base).wrapping_add(offset as u8) as usize
    }

    /// Write a register, without touching flags. Writes to `r0` are discarded.
    #[inline]
    fn write(&mut self, reg: Register, val: u8) {
        if reg != Register::R0 {
            self.reg[reg.index()] = val;
        }
    }

    /// Write the low byte of `raw` and set flags from it.
    fn write_flags(&mut self, reg: Register, raw: i16) {
        let val = (raw & 0xff) as u8;
        self.zero = val == 0;
        self.carry = raw < 0;
        self.write(reg, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::assemble;

    fn load(src: &str) -> RunState {
        RunState::new(assemble(src, "test.basm").unwrap().into_image())
    }

    /// Step until halted, panicking on errors or runaway programs.
    fn run(state: &mut RunState) {
        for _ in 0..10_000 {
            if state.step().unwrap() == Step::Halted {
                return;
            }
        }
        panic!("program did not halt");
    }

    fn reg(state: &RunState, i: usize) -> u8 {
        state.reg(Register::ALL[i])
    }

    #[test]
    fn add_program() {
        let mut state = load("ldi r1, 5\nldi r2, 3\nadd r3, r1, r2\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 3), 8);
        assert!(!state.zero());
        assert!(!state.carry());
        assert!(state.is_halted());
        assert_eq!(state.pc(), 3);
        assert_eq!(state.step(), Err(StepError::Halted));
        assert_eq!(state.pc(), 3);
    }

    #[test]
    fn r0_is_hardwired() {
        let mut state = load("ldi r0, 9\nadi r0, 1\nmov r1, r0\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 0), 0);
        assert_eq!(reg(&state, 1), 0);
    }

    #[test]
    fn flags_update_on_r0_write() {
        // `cmp` writes to r0 but still sets flags
        for value in [0, 1, 127, 128, 255] {
            let mut state = load(&format!("ldi r1, {value}\nsub r0, r1, r1\nhlt"));
            run(&mut state);
            assert!(state.zero(), "{value}");
            assert!(!state.carry(), "{value}");
        }
    }

    #[test]
    fn carry_is_sign_of_raw_result() {
        let mut state = load("ldi r1, 1\nldi r2, 2\ncmp r1, r2\nhlt");
        run(&mut state);
        assert!(state.carry());
        assert!(!state.zero());

        // 127 + 1 overflows into the sign bit, but the raw sum is positive
        let mut state = load("ldi r1, 127\ninc r1\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 1), 0x80);
        assert!(!state.carry());

        // -1 + 1 == 0
        let mut state = load("ldi r1, -1\ninc r1\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 1), 0);
        assert!(state.zero());
        assert!(!state.carry());

        // 0 - 1 wraps to 255 with carry
        let mut state = load("dec r1\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 1), 255);
        assert!(state.carry());
        assert!(!state.zero());
    }

    #[test]
    fn ldi_rsh_and_memory_keep_flags() {
        let mut state = load("ldi r1, 1\ncmp r0, r1\nldi r2, 0\nrsh r3, r1\nmst r1, r0, 0\nmld r4, r0, 5\nhlt");
        run(&mut state);
        assert!(state.carry());
        assert!(!state.zero());
    }

    #[test]
    fn bitwise_ops() {
        let src = "
            ldi r1, 0b1100
            ldi r2, 0b1010
            orr r3, r1, r2
            and r4, r1, r2
            xor r5, r1, r2
            imp r6, r1, r2
            nmp r7, r1, r2
            hlt
        ";
        let mut state = load(src);
        run(&mut state);
        assert_eq!(reg(&state, 3), 0b1110);
        assert_eq!(reg(&state, 4), 0b1000);
        assert_eq!(reg(&state, 5), 0b0110);
        assert_eq!(reg(&state, 6), 0b1111_1011);
        assert_eq!(reg(&state, 7), 0b0100);
        // Last result was positive and non-zero
        assert!(!state.zero() && !state.carry());

        let mut state = load("ldi r1, 0b1100\nldi r2, 0b1010\nnor r3, r1, r2\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 3), 0b1111_0001);
        assert!(state.carry());

        let mut state = load("ldi r1, 0b1100\nldi r2, 0b1010\nnnd r3, r1, r2\nxnr r4, r1, r2\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 3), 0b1111_0111);
        assert_eq!(reg(&state, 4), 0b1111_1001);

        let mut state = load("ldi r1, 0xff\nnot r2, r1\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 2), 0);
        assert!(state.zero());
        assert!(!state.carry());
    }

    #[test]
    fn shift_is_logical() {
        let mut state = load("ldi r1, -2\nrsh r2, r1\nldi r3, 7\nrsh r4, r3\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 2), 0x7f);
        assert_eq!(reg(&state, 4), 3);
    }

    #[test]
    fn jump_to_zero_loops() {
        let mut state = load("nop\njmp 0");
        for _ in 0..100 {
            assert_eq!(state.step(), Ok(Step::Running));
        }
        assert_eq!(state.pc(), 0);
        state.step().unwrap();
        assert_eq!(state.pc(), 1);
        state.step().unwrap();
        assert_eq!(state.pc(), 0);
    }

    #[test]
    fn branches_read_previous_flags() {
        let src = "
            ldi r1, 3
        loop:
            dec r1
            brh ne, loop
            hlt
        ";
        let mut state = load(src);
        run(&mut state);
        assert_eq!(reg(&state, 1), 0);
        assert_eq!(state.pc(), 3);

        // ge branches on carry, lt on no carry
        let mut state = load("ldi r1, 1\ncmp r0, r1\nbrh ge, yes\nhlt\nyes: ldi r2, 1\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 2), 1);
        let mut state = load("ldi r1, 1\ncmp r1, r0\nbrh lt, yes\nhlt\nyes: ldi r2, 1\nhlt");
        run(&mut state);
        assert_eq!(reg(&state, 2), 1);
    }

    #[test]
    fn call_and_return() {
        let src = "
            nop
            cal sub
            hlt
        sub:
            ldi r1, 42
            ret
        ";
        let mut state = load(src);
        state.step().unwrap();
        state.step().unwrap();
        assert_eq!(state.pc(), 3);
        assert_eq!(state.stack(), [1]);
        state.step().unwrap();
        state.step().unwrap();
        assert_eq!(state.pc(), 2);
        assert!(state.stack().is_empty());
        assert_eq!(state.step(), Ok(Step::Halted));
        assert_eq!(reg(&state, 1), 42);
    }

    #[test]
    fn stack_underflow() {
        let mut state = load("ldi r1, 1\nret\nhlt");
        state.step().unwrap();
        assert_eq!(state.step(), Err(StepError::StackUnderflow { pc: 1 }));
        // Nothing changed; the error repeats
        assert_eq!(state.pc(), 1);
        assert_eq!(state.step(), Err(StepError::StackUnderflow { pc: 1 }));
        assert!(!state.is_halted());
    }

    #[test]
    fn port_io_not_implemented() {
        let mut state = load("pld r1, 3\nhlt");
        assert_eq!(state.step(), Err(StepError::PortIo { pc: 0 }));
        assert_eq!(state.pc(), 0);
        assert_eq!(reg(&state, 1), 0);
        assert_eq!(
            StepError::PortIo { pc: 0 }.to_string(),
            "port io is not implemented yet (address 0x000)"
        );
    }

    #[test]
    fn memory_addressing() {
        let src = "
            ldi r1, 10
            ldi r2, 77
            mst r2, r1, -3
            mld r3, r0, 7
            ldi r4, 250
            mst r2, r4, 10
            mld r5, r0, 4
            hlt
        ";
        let mut state = load(src);
        run(&mut state);
        assert_eq!(state.memory()[7], 77);
        assert_eq!(reg(&state, 3), 77);
        // 250 + 10 wraps to 4
        assert_eq!(state.memory()[4], 77);
        assert_eq!(reg(&state, 5), 77);
    }

    #[test]
    fn runs_off_end_as_nop() {
        let mut state = load("nop");
        state.step().unwrap();
        assert_eq!(state.pc(), 1);
        assert_eq!(state.step(), Ok(Step::Running));
        assert_eq!(state.pc(), 2);
    }

    #[test]
    fn pc_wraps_address_space() {
        let mut state = load("jmp 1023");
        state.step().unwrap();
        assert_eq!(state.pc(), 1023);
        state.step().unwrap();
        assert_eq!(state.pc(), 0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut state = load("ldi r1, 4\nmst r1, r0, 1\ncal 3\nhlt");
        run(&mut state);
        assert!(state.is_halted());
        state.reset();
        assert_eq!(state.pc(), 0);
        assert_eq!(state.registers(), &[0; 8]);
        assert!(state.memory().iter().all(|byte| *byte == 0));
        assert!(state.stack().is_empty());
        assert!(!state.is_halted() && !state.zero() && !state.carry());
        assert_eq!(state.image().len(), 4);
        run(&mut state);
        assert_eq!(reg(&state, 1), 4);
    }
}
