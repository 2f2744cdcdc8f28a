//! Binary-image loader: a flat little-endian `u16` word stream, loaded
//! into a [`Memory`] starting at address 0.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::VmError;
use crate::memory::{Memory, MEM_SIZE};

/// A loaded program, ready to be handed to an [`crate::interpreter::Interpreter`].
pub struct Program {
    words: Vec<u16>,
}

impl Program {
    /// Read a binary image from `path`: little-endian `u16` words, one
    /// after another. A trailing odd byte is discarded. More than
    /// [`MEM_SIZE`] words is a fatal [`VmError::ProgramTooLarge`].
    pub fn load(path: &Path) -> Result<Program, VmError> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Decode an already-read byte buffer the same way [`Program::load`]
    /// decodes a file, for use by tests and embedders who already have
    /// the bytes in hand.
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, VmError> {
        let mut words = Vec::with_capacity(bytes.len() / 2);
        let mut chunks = bytes.chunks_exact(2);
        for chunk in &mut chunks {
            words.push(u16::from_le_bytes([chunk[0], chunk[1]]));
            if words.len() > MEM_SIZE {
                return Err(VmError::ProgramTooLarge);
            }
        }
        // chunks.remainder() is the odd trailing byte, if any; ignored
        // per spec's loader contract.
        debug!("loaded {} words ({} bytes)", words.len(), bytes.len());
        Ok(Program { words })
    }

    /// Consume the program into a fully zero-padded [`Memory`] image.
    pub fn into_memory(self) -> Memory {
        Memory::from_words(&self.words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian_words() {
        let program = Program::from_bytes(&[0x13, 0x00, 0x48, 0x00]).unwrap();
        assert_eq!(program.words, vec![19, 72]);
    }

    #[test]
    fn discards_trailing_odd_byte() {
        let program = Program::from_bytes(&[0x00, 0x00, 0xff]).unwrap();
        assert_eq!(program.words, vec![0]);
    }

    #[test]
    fn empty_input_is_an_empty_program() {
        let program = Program::from_bytes(&[]).unwrap();
        assert!(program.words.is_empty());
    }

    #[test]
    fn oversized_program_is_fatal() {
        let bytes = vec![0u8; (MEM_SIZE + 1) * 2];
        assert!(matches!(
            Program::from_bytes(&bytes),
            Err(VmError::ProgramTooLarge)
        ));
    }

    #[test]
    fn exactly_mem_size_words_is_fine() {
        let bytes = vec![0u8; MEM_SIZE * 2];
        assert!(Program::from_bytes(&bytes).is_ok());
    }
}
