use crate::plat::{Register, NUM_REGISTERS, STACK_TOP};

/// The full set of registers in the emulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmuRegisters {
    gp: [u8; NUM_REGISTERS],
    /// Program counter. Only the fetch loop moves it.
    pub pc: u16,
    /// Stack pointer. Points at the top item of the stack, or [`STACK_TOP`] when it is empty.
    pub sp: u16,
}

impl EmuRegisters {
    /// Creates a register file in its power-on state: all zero, with an empty stack.
    pub fn new() -> Self {
        Self {
            gp: [0; NUM_REGISTERS],
            pc: 0,
            sp: STACK_TOP,
        }
    }

    /// Reads a general purpose register.
    pub fn get(&self, reg: Register) -> u8 {
        self.gp[reg as usize]
    }

    /// Writes a general purpose register.
    pub fn set(&mut self, reg: Register, value: u8) {
        self.gp[reg as usize] = value;
    }

    /// The general purpose registers, `R0` first.
    pub fn gp(&self) -> &[u8; NUM_REGISTERS] {
        &self.gp
    }
}

impl Default for EmuRegisters {
    fn default() -> Self {
        Self::new()
    }
}
