//! The 22-opcode instruction set and its decoder.
//!
//! Each opcode is decoded once, at the point it is fetched, into an
//! [`Opcode`] carrying already-resolved [`Operand`]s — the dispatcher in
//! [`crate::interpreter`] never re-reads raw operand slots.

use crate::error::VmError;
use crate::memory::Memory;
use crate::operand::Operand;

/// Numeric opcode values, matching spec's table byte-for-byte.
pub mod op_codes {
    pub const HALT: u16 = 0;
    pub const SET: u16 = 1;
    pub const PUSH: u16 = 2;
    pub const POP: u16 = 3;
    pub const EQ: u16 = 4;
    pub const GT: u16 = 5;
    pub const JMP: u16 = 6;
    pub const JT: u16 = 7;
    pub const JF: u16 = 8;
    pub const ADD: u16 = 9;
    pub const MULT: u16 = 10;
    pub const MOD: u16 = 11;
    pub const AND: u16 = 12;
    pub const OR: u16 = 13;
    pub const NOT: u16 = 14;
    pub const RMEM: u16 = 15;
    pub const WMEM: u16 = 16;
    pub const CALL: u16 = 17;
    pub const RET: u16 = 18;
    pub const OUT: u16 = 19;
    pub const IN: u16 = 20;
    pub const NOOP: u16 = 21;
}

/// A decoded instruction, operands already resolved to [`Operand`]s.
#[derive(Debug, Clone, Copy)]
pub enum Opcode {
    /// Stop execution cleanly.
    Halt,
    /// Write source into destination.
    Set { dst: Operand, src: Operand },
    /// Push source onto the stack.
    Push { src: Operand },
    /// Pop the stack into destination; fails on an empty stack.
    Pop { dst: Operand },
    /// `dst = (b == c)`.
    Eq { dst: Operand, b: Operand, c: Operand },
    /// `dst = (b > c)`.
    Gt { dst: Operand, b: Operand, c: Operand },
    /// Set PC to target.
    Jmp { target: Operand },
    /// Jump to target if test is nonzero.
    Jt { test: Operand, target: Operand },
    /// Jump to target if test is zero.
    Jf { test: Operand, target: Operand },
    /// `dst = (b + c) mod M`.
    Add { dst: Operand, b: Operand, c: Operand },
    /// `dst = (b * c) mod M`.
    Mult { dst: Operand, b: Operand, c: Operand },
    /// `dst = b mod c`; `c == 0` is a fatal error.
    Mod { dst: Operand, b: Operand, c: Operand },
    /// `dst = b & c`.
    And { dst: Operand, b: Operand, c: Operand },
    /// `dst = b | c`.
    Or { dst: Operand, b: Operand, c: Operand },
    /// `dst = src XOR 0x7FFF` — a 15-bit complement, not a 16-bit one.
    Not { dst: Operand, src: Operand },
    /// Read the memory cell at the resolved address `addr` into `dst`.
    Rmem { dst: Operand, addr: Operand },
    /// Write `value` into the memory cell at the resolved address `addr`.
    Wmem { addr: Operand, value: Operand },
    /// Push the return address, then jump to target.
    Call { target: Operand },
    /// Pop a return address and jump to it; halts cleanly on an empty
    /// stack (spec's hardened interpretation of the original's
    /// exception-raising behavior).
    Ret,
    /// Write the low byte of source to stdout.
    Out { src: Operand },
    /// Read one byte from stdin into destination.
    In { dst: Operand },
    /// Do nothing.
    Noop,
}

impl Opcode {
    /// Fetch and decode the instruction at `pc`, returning it together
    /// with its total length in words (`1 + operand_count`), the amount
    /// by which PC advances after any non-branching opcode.
    pub fn decode(memory: &Memory, pc: u16) -> Result<(Opcode, u16), VmError> {
        let op = memory.read(pc, pc)?;
        let operand = |offset: u16| -> Result<Operand, VmError> {
            Operand::decode(memory.read(pc.wrapping_add(offset), pc)?, pc)
        };

        let decoded = match op {
            op_codes::HALT => (Opcode::Halt, 1),
            op_codes::SET => (
                Opcode::Set { dst: operand(1)?, src: operand(2)? },
                3,
            ),
            op_codes::PUSH => (Opcode::Push { src: operand(1)? }, 2),
            op_codes::POP => (Opcode::Pop { dst: operand(1)? }, 2),
            op_codes::EQ => (
                Opcode::Eq { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::GT => (
                Opcode::Gt { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::JMP => (Opcode::Jmp { target: operand(1)? }, 2),
            op_codes::JT => (
                Opcode::Jt { test: operand(1)?, target: operand(2)? },
                3,
            ),
            op_codes::JF => (
                Opcode::Jf { test: operand(1)?, target: operand(2)? },
                3,
            ),
            op_codes::ADD => (
                Opcode::Add { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::MULT => (
                Opcode::Mult { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::MOD => (
                Opcode::Mod { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::AND => (
                Opcode::And { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::OR => (
                Opcode::Or { dst: operand(1)?, b: operand(2)?, c: operand(3)? },
                4,
            ),
            op_codes::NOT => (
                Opcode::Not { dst: operand(1)?, src: operand(2)? },
                3,
            ),
            op_codes::RMEM => (
                Opcode::Rmem { dst: operand(1)?, addr: operand(2)? },
                3,
            ),
            op_codes::WMEM => (
                Opcode::Wmem { addr: operand(1)?, value: operand(2)? },
                3,
            ),
            op_codes::CALL => (Opcode::Call { target: operand(1)? }, 2),
            op_codes::RET => (Opcode::Ret, 1),
            op_codes::OUT => (Opcode::Out { src: operand(1)? }, 2),
            op_codes::IN => (Opcode::In { dst: operand(1)? }, 2),
            op_codes::NOOP => (Opcode::Noop, 1),
            _ => return Err(VmError::UnknownOpcode { op, pc }),
        };

        Ok(decoded)
    }
}
