use crate::error::VmError;
use crate::memory::MEM_SIZE;

/// A decoded operand slot: either a literal word value or a reference
/// to one of the 8 registers.
///
/// Every instruction operand is one raw `u16` read from memory; this is
/// what it means once the addressing-mode rule (spec's three-way
/// numeric-range split) has been applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Literal(u16),
    Register(u8),
}

impl Operand {
    /// Decode a raw operand slot.
    ///
    /// `0..32767` is a literal; `32768..32775` names register
    /// `slot - 32768`; `32776..65535` is a program error.
    pub fn decode(slot: u16, pc: u16) -> Result<Operand, VmError> {
        match slot as usize {
            v if v < MEM_SIZE => Ok(Operand::Literal(slot)),
            v if v < MEM_SIZE + 8 => Ok(Operand::Register((v - MEM_SIZE) as u8)),
            _ => Err(VmError::InvalidOperand { slot, pc }),
        }
    }
}
