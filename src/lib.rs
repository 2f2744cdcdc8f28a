//! ## Overview
//! This crate interprets binaries written for the **Synacor**
//! architecture: a small, fictional 15-bit word machine whose
//! instruction set was published as a reverse-engineering challenge.
//!
//! The machine has:
//!
//! - **Memory**: 32768 addressable 15-bit words (`0..32767`), loaded
//!   from a flat little-endian binary image.
//! - **Registers**: 8 general-purpose words, addressed by the sentinel
//!   range `32768..32775` wherever an instruction operand appears.
//! - **A stack**: unbounded, untyped — it holds both program data
//!   (`push`/`pop`) and call-return addresses (`call`/`ret`) with no
//!   tag distinguishing the two.
//! - **22 opcodes**, dispatched from a program counter that starts at
//!   address 0.
//!
//! ## Arithmetic
//! All arithmetic is modular: `M = 32768`. `add`, `mult` reduce their
//! result mod `M` before storing; `not` is a 15-bit complement
//! (`value XOR 0x7FFF`), not a 16-bit one.
//!
//! ## Addressing
//! Every operand slot is a 16-bit field whose numeric value selects its
//! own interpretation: `0..32767` is a literal (or, as a destination, a
//! direct memory address); `32768..32775` names register
//! `value - 32768`; anything at or above `32776` is a program error.
//! See [`operand::Operand`].
//!
//! ## Termination
//! `halt` stops the machine cleanly. So does `ret` with an empty
//! stack — the conventional exit path of the challenge binary's main
//! routine, hardened here from the reference implementation's
//! uncaught-exception behavior. Every other fatal condition
//! (unknown opcode, invalid operand, stack underflow on `pop`, division
//! by zero, end of input on `in`) is a dirty stop: see [`error::VmError`].

pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod operand;
pub mod program;
pub mod registers;

pub use error::VmError;
pub use interpreter::{Interpreter, Statement};
pub use memory::Memory;
pub use program::Program;
