use std::{fmt, str::FromStr};

use super::EmuError;

// The ALU's mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AluMode {
    Add = 0,
    Mul,
}

impl FromStr for AluMode {
    type Err = EmuError;

    fn from_str(s: &str) -> Result<Self, EmuError> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Self::Add),
            "MUL" => Ok(Self::Mul),
            _ => Err(EmuError::UnsupportedAluOperation(s.to_owned())),
        }
    }
}

impl fmt::Display for AluMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("ADD"),
            Self::Mul => f.write_str("MUL"),
        }
    }
}

bitflags::bitflags! {
    /// The ALU status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AluStatus: u8 {
        /// Set if the result of the last ALU operation was zero.
        const ZERO = 1 << 0;
        /// Set if the result of the last ALU operation overflowed the register.
        const CARRY = 1 << 1;
    }
}

/// The ALU (Arithmetic and Logic Unit) of LS-8.
///
/// Registers are 8 bits wide, so every result wraps modulo 256. Wrapping is reported through
/// [`AluStatus::CARRY`].
#[derive(Debug, Clone)]
pub struct Alu {
    pub status: AluStatus,
}

impl Alu {
    /// Creates a new [`Alu`].
    pub fn new() -> Self {
        Self {
            status: AluStatus::empty(),
        }
    }

    /// Performs `mode` on the two operands, updating the status flags and returning the result.
    pub fn apply(&mut self, mode: AluMode, left: u8, right: u8) -> u8 {
        let (result, overflow) = match mode {
            AluMode::Add => left.overflowing_add(right),
            AluMode::Mul => left.overflowing_mul(right),
        };
        self.status.set(AluStatus::CARRY, overflow);
        self.status.set(AluStatus::ZERO, result == 0);
        result
    }
}

impl Default for Alu {
    fn default() -> Self {
        Self::new()
    }
}
