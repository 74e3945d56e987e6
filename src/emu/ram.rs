use crate::plat::RAM_SIZE;

use super::{EmuError, EmuResult};

/// The LS-8's memory, shared between program storage and the stack.
#[derive(Debug, Clone)]
pub struct Ram {
    memory: Box<[u8]>,
}

impl Ram {
    /// Creates a new [`Ram`] instance, allocating and initializing its memory to [0u8; 256].
    pub fn new() -> Self {
        Self {
            memory: vec![0u8; RAM_SIZE].into_boxed_slice(),
        }
    }

    /// Reads the byte at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::OutOfRangeAddress`] if `addr` is not inside RAM.
    pub fn read(&self, addr: u16) -> EmuResult<u8> {
        self.memory
            .get(addr as usize)
            .copied()
            .ok_or(EmuError::OutOfRangeAddress(addr))
    }

    /// Writes `value` to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::OutOfRangeAddress`] if `addr` is not inside RAM.
    pub fn write(&mut self, addr: u16, value: u8) -> EmuResult<()> {
        let cell = self
            .memory
            .get_mut(addr as usize)
            .ok_or(EmuError::OutOfRangeAddress(addr))?;
        *cell = value;
        Ok(())
    }

    /// Copies `program` into memory starting at address 0.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::ProgramTooLarge`] if `program` does not fit; memory is left untouched.
    pub fn load(&mut self, program: &[u8]) -> EmuResult<()> {
        if program.len() > self.memory.len() {
            return Err(EmuError::ProgramTooLarge(program.len()));
        }
        self.memory[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// The raw contents of memory.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}
