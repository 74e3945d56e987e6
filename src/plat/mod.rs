//! Common platform code between LS-8's other modules.

use std::fmt;

use thiserror::Error;

/// Number of addressable bytes in RAM.
pub const RAM_SIZE: usize = 256;

/// Number of general purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Initial value of the stack pointer: one past the last valid address.
pub const STACK_TOP: u16 = RAM_SIZE as u16;

/// An error for the core platform of LS-8.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    #[error("invalid opcode {0:#010b}")]
    InvalidOpcode(u8),
    #[error("invalid register R{0}")]
    InvalidRegister(u8),
}

/// Type alias for Result<T, [PlatformError]>.
pub type PResult<T> = Result<T, PlatformError>;

/// The eight general purpose registers in LS-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl TryFrom<u8> for Register {
    type Error = PlatformError;

    fn try_from(value: u8) -> PResult<Self> {
        match value {
            0 => Ok(Self::R0),
            1 => Ok(Self::R1),
            2 => Ok(Self::R2),
            3 => Ok(Self::R3),
            4 => Ok(Self::R4),
            5 => Ok(Self::R5),
            6 => Ok(Self::R6),
            7 => Ok(Self::R7),
            _ => Err(PlatformError::InvalidRegister(value)),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", *self as u8)
    }
}

/// The opcodes understood by the CPU.
///
/// Opcodes are laid out as `AABCDDDD`, where `AA` is the number of operand bytes following
/// the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /* Control */
    /// Stops the CPU.
    Hlt = 0b0000_0001,

    /* Registers */
    /// `regA <- (immediate value)`
    Ldi = 0b1000_0010,
    /// Writes `regA` to the output in decimal.
    Prn = 0b0100_0111,

    /* ALU */
    /// `regA <- regA + regB`
    Add = 0b1010_0000,
    /// `regA <- regA * regB`
    Mul = 0b1010_0010,

    /* Stack */
    /// `SP <- SP - 1; mem[SP] <- regA`
    Push = 0b0100_0101,
    /// `regA <- mem[SP]; SP <- SP + 1`
    Pop = 0b0100_0110,
}

impl Opcode {
    /// Every opcode the CPU implements.
    pub const ALL: [Opcode; 7] = [
        Self::Hlt,
        Self::Ldi,
        Self::Prn,
        Self::Add,
        Self::Mul,
        Self::Push,
        Self::Pop,
    ];

    /// Number of operand bytes following this opcode in memory.
    pub fn operands(self) -> u8 {
        self as u8 >> 6
    }

    /// The assembly mnemonic, e.g. `LDI`.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Hlt => "HLT",
            Self::Ldi => "LDI",
            Self::Prn => "PRN",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Push => "PUSH",
            Self::Pop => "POP",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = PlatformError;

    fn try_from(value: u8) -> PResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| *op as u8 == value)
            .ok_or(PlatformError::InvalidOpcode(value))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
