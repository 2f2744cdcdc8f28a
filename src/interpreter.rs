//! The dispatch loop: fetch an opcode at PC, resolve its operands,
//! execute its effect, advance PC.

use std::io::{Read, Write};

use log::{debug, trace};

use crate::error::VmError;
use crate::instruction::Opcode;
use crate::memory::Memory;
use crate::operand::Operand;
use crate::registers::Registers;

/// The arithmetic modulus and address-space ceiling.
const M: u32 = 32768;

/// What a single [`Interpreter::step`] produced.
pub enum Statement {
    /// The instruction executed normally; PC has already moved on.
    Success,
    /// `halt` was executed, or `ret` popped an empty stack. The run is
    /// over and this is a clean (exit-0) stop.
    Halted,
}

/// The machine: memory, registers, the untyped value/call stack, and
/// the program counter.
pub struct Interpreter {
    memory: Memory,
    registers: Registers,
    stack: Vec<u16>,
    pc: u16,
}

impl Interpreter {
    pub fn new(memory: Memory) -> Self {
        Interpreter {
            memory,
            registers: Registers::new(),
            stack: Vec::new(),
            pc: 0,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    fn resolve(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Literal(value) => value,
            Operand::Register(r) => self.registers.get(r),
        }
    }

    fn store(&mut self, operand: Operand, value: u16, pc: u16) -> Result<(), VmError> {
        match operand {
            Operand::Literal(addr) => self.memory.write(addr, value, pc),
            Operand::Register(r) => {
                self.registers.set(r, value);
                Ok(())
            }
        }
    }

    /// Execute exactly one instruction.
    pub fn step<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<Statement, VmError> {
        let pc = self.pc;
        let (opcode, len) = Opcode::decode(&self.memory, pc)?;
        trace!("{:>5}: {:?}", pc, opcode);

        let mut jumped = false;

        match opcode {
            Opcode::Halt => {
                debug!("halt at {}", pc);
                return Ok(Statement::Halted);
            }
            Opcode::Set { dst, src } => {
                let v = self.resolve(src);
                self.store(dst, v, pc)?;
            }
            Opcode::Push { src } => {
                let v = self.resolve(src);
                self.stack.push(v);
            }
            Opcode::Pop { dst } => {
                let v = self.stack.pop().ok_or(VmError::StackUnderflow { pc })?;
                self.store(dst, v, pc)?;
            }
            Opcode::Eq { dst, b, c } => {
                let (b, c) = (self.resolve(b), self.resolve(c));
                self.store(dst, (b == c) as u16, pc)?;
            }
            Opcode::Gt { dst, b, c } => {
                let (b, c) = (self.resolve(b), self.resolve(c));
                self.store(dst, (b > c) as u16, pc)?;
            }
            Opcode::Jmp { target } => {
                self.pc = self.resolve(target);
                jumped = true;
            }
            Opcode::Jt { test, target } => {
                if self.resolve(test) != 0 {
                    self.pc = self.resolve(target);
                    jumped = true;
                }
            }
            Opcode::Jf { test, target } => {
                if self.resolve(test) == 0 {
                    self.pc = self.resolve(target);
                    jumped = true;
                }
            }
            Opcode::Add { dst, b, c } => {
                let (b, c) = (self.resolve(b) as u32, self.resolve(c) as u32);
                self.store(dst, ((b + c) % M) as u16, pc)?;
            }
            Opcode::Mult { dst, b, c } => {
                let (b, c) = (self.resolve(b) as u32, self.resolve(c) as u32);
                self.store(dst, ((b * c) % M) as u16, pc)?;
            }
            Opcode::Mod { dst, b, c } => {
                let (b, c) = (self.resolve(b), self.resolve(c));
                if c == 0 {
                    return Err(VmError::DivideByZero { pc });
                }
                self.store(dst, b % c, pc)?;
            }
            Opcode::And { dst, b, c } => {
                let (b, c) = (self.resolve(b), self.resolve(c));
                self.store(dst, b & c, pc)?;
            }
            Opcode::Or { dst, b, c } => {
                let (b, c) = (self.resolve(b), self.resolve(c));
                self.store(dst, b | c, pc)?;
            }
            Opcode::Not { dst, src } => {
                let v = self.resolve(src);
                self.store(dst, v ^ 0x7FFF, pc)?;
            }
            Opcode::Rmem { dst, addr } => {
                let addr = self.resolve(addr);
                let v = self.memory.read(addr, pc)?;
                self.store(dst, v, pc)?;
            }
            Opcode::Wmem { addr, value } => {
                let addr = self.resolve(addr);
                let v = self.resolve(value);
                self.memory.write(addr, v, pc)?;
            }
            Opcode::Call { target } => {
                self.stack.push(pc.wrapping_add(len));
                self.pc = self.resolve(target);
                jumped = true;
            }
            Opcode::Ret => match self.stack.pop() {
                Some(addr) => {
                    self.pc = addr;
                    jumped = true;
                }
                None => {
                    debug!("ret on empty stack at {}, treating as clean halt", pc);
                    return Ok(Statement::Halted);
                }
            },
            Opcode::Out { src } => {
                let v = self.resolve(src);
                output.write_all(&[v as u8])?;
                output.flush()?;
            }
            Opcode::In { dst } => {
                let mut byte = [0u8; 1];
                let n = input.read(&mut byte)?;
                if n == 0 {
                    return Err(VmError::InputExhausted { pc });
                }
                self.store(dst, byte[0] as u16, pc)?;
            }
            Opcode::Noop => {}
        }

        if !jumped {
            self.pc = pc.wrapping_add(len);
        }
        Ok(Statement::Success)
    }

    /// Run until a clean halt or a fatal error.
    pub fn run<R: Read, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), VmError> {
        loop {
            match self.step(input, output)? {
                Statement::Success => {}
                Statement::Halted => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_words(words: &[u16]) -> (Interpreter, Vec<u8>) {
        let mut vm = Interpreter::new(Memory::from_words(words));
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        vm.run(&mut input, &mut output).unwrap();
        (vm, output)
    }

    fn run_with_input(words: &[u16], stdin: &[u8]) -> (Interpreter, Vec<u8>) {
        let mut vm = Interpreter::new(Memory::from_words(words));
        let mut input = Cursor::new(stdin.to_vec());
        let mut output = Vec::new();
        vm.run(&mut input, &mut output).unwrap();
        (vm, output)
    }

    // --- end-to-end scenarios ---

    #[test]
    fn hello_prefix() {
        let (_, out) = run_words(&[19, 72, 19, 105, 0]);
        assert_eq!(out, b"Hi");
    }

    #[test]
    fn self_test_arithmetic() {
        // set r1=65, r2=1, out r0 = (r1 + r2) mod M, out r0
        let (_, out) = run_words(&[
            1, 32769, 65,
            1, 32770, 1,
            9, 32768, 32769, 32770,
            19, 32768,
            0,
        ]);
        assert_eq!(out, b"B");
    }

    #[test]
    fn register_mode_store() {
        let (_, out) = run_words(&[
            1, 32768, 42,
            4, 32769, 32768, 42,
            19, 32769,
            0,
        ]);
        assert_eq!(out, vec![1u8]);
    }

    #[test]
    fn call_ret_round_trip() {
        let (vm, out) = run_words(&[17, 6, 0, 0, 0, 0, 19, 88, 18]);
        assert_eq!(out, b"X");
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn stack_underflow_on_pop() {
        let mut vm = Interpreter::new(Memory::from_words(&[3, 32768, 0]));
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = vm.run(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, VmError::StackUnderflow { pc: 0 }));
    }

    #[test]
    fn unknown_opcode_is_fatal() {
        let mut vm = Interpreter::new(Memory::from_words(&[99]));
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = vm.run(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, VmError::UnknownOpcode { op: 99, pc: 0 }));
    }

    #[test]
    fn pc_running_off_the_top_of_memory_is_fatal() {
        use crate::memory::MEM_SIZE;

        // jmp straight to the last address, then noop: PC advances to
        // MEM_SIZE (32768) with no opcode there to fetch.
        let mut words = vec![0u16; MEM_SIZE];
        words[0] = 6; // jmp
        words[1] = (MEM_SIZE - 1) as u16;
        words[MEM_SIZE - 1] = 21; // noop

        let mut vm = Interpreter::new(Memory::from_words(&words));
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = vm.run(&mut input, &mut output).unwrap_err();
        assert!(matches!(
            err,
            VmError::AddressOutOfRange { addr, pc }
                if addr == MEM_SIZE as u32 && pc == MEM_SIZE as u16
        ));
    }

    // --- algebraic laws ---

    #[test]
    fn add_with_zero_is_identity_mod_m() {
        let (vm, _) = run_words(&[9, 32768, 32767, 0, 0]);
        assert_eq!(vm.registers().get(0), 32767);
    }

    #[test]
    fn mult_by_one_is_identity() {
        let (vm, _) = run_words(&[10, 32768, 32767, 1, 0]);
        assert_eq!(vm.registers().get(0), 32767);
    }

    #[test]
    fn double_not_restores_value() {
        let (vm, _) = run_words(&[
            14, 32768, 32769, // r0 = not r1 (r1 starts at 0)
            14, 32768, 32768, // r0 = not r0
            0,
        ]);
        assert_eq!(vm.registers().get(0), 0);
    }

    #[test]
    fn eq_with_equal_operands_is_one() {
        let (vm, _) = run_words(&[4, 32768, 32769, 32769, 0]);
        assert_eq!(vm.registers().get(0), 1);
    }

    #[test]
    fn set_then_set_propagates() {
        let (vm, _) = run_words(&[
            1, 32769, 7, // r1 = 7
            1, 32768, 32769, // r0 = r1
            1, 32770, 32768, // r2 = r0
            0,
        ]);
        assert_eq!(vm.registers().get(2), 7);
    }

    // --- boundary cases ---

    #[test]
    fn add_overflow_wraps() {
        let (vm, _) = run_words(&[9, 32768, 32767, 32767, 0]);
        assert_eq!(vm.registers().get(0), 32766);
    }

    #[test]
    fn mult_overflow_wraps() {
        let (vm, _) = run_words(&[10, 32768, 32767, 32767, 0]);
        assert_eq!(vm.registers().get(0), 1);
    }

    #[test]
    fn not_zero_and_not_max() {
        let (vm, _) = run_words(&[
            14, 32768, 0,
            14, 32769, 32767,
            0,
        ]);
        assert_eq!(vm.registers().get(0), 32767);
        assert_eq!(vm.registers().get(1), 0);
    }

    #[test]
    fn jt_falls_through_on_zero() {
        let (vm, _) = run_words(&[
            7, 0, 9, // jt 0 -> 9, test literal 0, never taken
            1, 32768, 1, // r0 = 1
            0,
            0, 0, 0,
        ]);
        assert_eq!(vm.registers().get(0), 1);
    }

    #[test]
    fn mod_by_one_is_zero() {
        let (vm, _) = run_words(&[11, 32768, 5000, 1, 0]);
        assert_eq!(vm.registers().get(0), 0);
    }

    #[test]
    fn mod_by_zero_is_fatal() {
        let mut vm = Interpreter::new(Memory::from_words(&[11, 32768, 5, 0, 0]));
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = vm.run(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, VmError::DivideByZero { pc: 0 }));
    }

    #[test]
    fn in_reads_one_byte_per_call() {
        let (vm, out) = run_with_input(&[20, 32768, 19, 32768, 0], b"Q");
        assert_eq!(out, b"Q");
        assert_eq!(vm.registers().get(0), b'Q' as u16);
    }

    #[test]
    fn in_on_eof_is_fatal() {
        let mut vm = Interpreter::new(Memory::from_words(&[20, 32768, 0]));
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = vm.run(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, VmError::InputExhausted { pc: 0 }));
    }
}
