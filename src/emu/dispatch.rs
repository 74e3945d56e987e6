//! Opcode dispatch and the instruction handlers behind it.

use std::io::Write;

use crate::plat::{Opcode, Register};

use super::{alu::AluMode, emulator::Emulator, EmuError, EmuResult};

/// What a handler reports back to the fetch loop.
///
/// Handlers never touch the program counter or the run state themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Number of bytes to advance the program counter by.
    pub pc_delta: u16,
    /// Whether the CPU keeps running after this instruction.
    pub running: bool,
}

impl Step {
    /// Moves on to the instruction following `op` and its operands.
    pub fn next(op: Opcode) -> Self {
        Self {
            pc_delta: u16::from(op.operands()) + 1,
            running: true,
        }
    }

    /// Stops the CPU, leaving the program counter where it is.
    pub fn halt() -> Self {
        Self {
            pc_delta: 0,
            running: false,
        }
    }
}

/// An instruction handler, called with the two bytes following the opcode.
pub type Handler<W> = fn(&mut Emulator<W>, u8, u8) -> EmuResult<Step>;

/// Maps every possible opcode byte to its handler, if it has one.
pub struct DispatchTable<W> {
    handlers: [Option<Handler<W>>; 256],
}

impl<W: Write> DispatchTable<W> {
    /// Builds the table, registering a handler for every [`Opcode`].
    pub fn new() -> Self {
        let mut handlers: [Option<Handler<W>>; 256] = [None; 256];
        for op in Opcode::ALL {
            handlers[op as usize] = Some(Self::handler_for(op));
        }
        Self { handlers }
    }

    fn handler_for(op: Opcode) -> Handler<W> {
        match op {
            Opcode::Hlt => hlt,
            Opcode::Ldi => ldi,
            Opcode::Prn => prn,
            Opcode::Add => add,
            Opcode::Mul => mul,
            Opcode::Push => push,
            Opcode::Pop => pop,
        }
    }

    /// Looks up the handler for `opcode`.
    pub fn get(&self, opcode: u8) -> Option<Handler<W>> {
        self.handlers[opcode as usize]
    }
}

impl<W: Write> Default for DispatchTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

fn hlt<W: Write>(_emu: &mut Emulator<W>, _op_a: u8, _op_b: u8) -> EmuResult<Step> {
    Ok(Step::halt())
}

fn ldi<W: Write>(emu: &mut Emulator<W>, op_a: u8, op_b: u8) -> EmuResult<Step> {
    emu.registers.set(Register::try_from(op_a)?, op_b);
    Ok(Step::next(Opcode::Ldi))
}

fn prn<W: Write>(emu: &mut Emulator<W>, op_a: u8, _op_b: u8) -> EmuResult<Step> {
    let value = emu.registers.get(Register::try_from(op_a)?);
    writeln!(emu.output_mut(), "{}", value)?;
    Ok(Step::next(Opcode::Prn))
}

fn add<W: Write>(emu: &mut Emulator<W>, op_a: u8, op_b: u8) -> EmuResult<Step> {
    emu.alu(AluMode::Add, Register::try_from(op_a)?, Register::try_from(op_b)?);
    Ok(Step::next(Opcode::Add))
}

fn mul<W: Write>(emu: &mut Emulator<W>, op_a: u8, op_b: u8) -> EmuResult<Step> {
    emu.alu(AluMode::Mul, Register::try_from(op_a)?, Register::try_from(op_b)?);
    Ok(Step::next(Opcode::Mul))
}

fn push<W: Write>(emu: &mut Emulator<W>, op_a: u8, _op_b: u8) -> EmuResult<Step> {
    let value = emu.registers.get(Register::try_from(op_a)?);
    let sp = emu
        .registers
        .sp
        .checked_sub(1)
        .ok_or(EmuError::StackOverflow)?;
    emu.ram.write(sp, value)?;
    emu.registers.sp = sp;
    Ok(Step::next(Opcode::Push))
}

fn pop<W: Write>(emu: &mut Emulator<W>, op_a: u8, _op_b: u8) -> EmuResult<Step> {
    let reg = Register::try_from(op_a)?;
    let sp = emu.registers.sp;
    if usize::from(sp) >= emu.ram.memory().len() {
        return Err(EmuError::StackUnderflow);
    }
    let value = emu.ram.read(sp)?;
    emu.registers.set(reg, value);
    emu.registers.sp = sp + 1;
    Ok(Step::next(Opcode::Pop))
}
