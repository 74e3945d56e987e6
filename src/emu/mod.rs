//! The emulator module for LS-8.

use thiserror::Error;

use crate::plat::{PlatformError, RAM_SIZE};

pub mod alu;
pub mod dispatch;
pub mod emulator;
pub mod ram;
pub mod registers;

/// An error raised while the emulator is loading or running a program.
#[derive(Debug, Error)]
pub enum EmuError {
    #[error("instruction {opcode} ({opcode:#010b}) not found at pc {pc:#04x}")]
    UnknownOpcode { opcode: u8, pc: u16 },
    #[error("address {0:#x} is outside of ram")]
    OutOfRangeAddress(u16),
    #[error("stack overflow: stack pointer is already at address 0")]
    StackOverflow,
    #[error("stack underflow: pop from an empty stack")]
    StackUnderflow,
    #[error("program is {0} bytes long, but ram only holds {}", RAM_SIZE)]
    ProgramTooLarge(usize),
    #[error("unsupported ALU operation: {0}")]
    UnsupportedAluOperation(String),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result<T, [EmuError]>.
pub type EmuResult<T> = Result<T, EmuError>;
