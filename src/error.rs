use std::io;

/// Every way a load or a run of a Synacor binary can fail.
///
/// Each variant corresponds to one of the fatal conditions in the
/// architecture's error model. There is no recoverable variant: once
/// raised, an error terminates the interpreter loop or the loader.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Dispatcher fetched a byte outside the 22 known opcodes.
    #[error("unknown opcode {op} at address {pc}")]
    UnknownOpcode { op: u16, pc: u16 },

    /// An operand slot held a value in `32776..65535`.
    #[error("invalid operand {slot} at address {pc}")]
    InvalidOperand { slot: u16, pc: u16 },

    /// `pop` (or, under strict interpretation, `ret`) on an empty stack.
    #[error("stack underflow at address {pc}")]
    StackUnderflow { pc: u16 },

    /// `mod` with a zero divisor.
    #[error("division by zero at address {pc}")]
    DivideByZero { pc: u16 },

    /// A resolved memory address fell outside `0..32768`.
    #[error("address {addr} out of range at {pc}")]
    AddressOutOfRange { addr: u32, pc: u16 },

    /// The loader read more than 32768 words from the binary.
    #[error("program exceeds the 32768-word address space")]
    ProgramTooLarge,

    /// `in` reached end-of-input before a byte was available.
    #[error("end of input at address {pc}")]
    InputExhausted { pc: u16 },

    /// Loader or stdio failure underneath the VM.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
