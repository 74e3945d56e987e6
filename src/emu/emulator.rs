use std::io::{self, Stdout, Write};

use anyhow::Result;

use crate::{
    loader::parse_program,
    plat::{Opcode, Register},
};

use super::{
    alu::{Alu, AluMode},
    dispatch::DispatchTable,
    ram::Ram,
    registers::EmuRegisters,
    EmuError, EmuResult,
};

/// The emulator's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuState {
    /// The emulator will execute the instruction at PC on the next step.
    Running,
    /// Execution has stopped, either through `HLT` or a fatal error.
    Halted,
}

/// The main emulation context for LS-8.
///
/// Everything the machine touches is owned here, including the sink `PRN` writes to, so
/// any number of emulators can run side by side.
pub struct Emulator<W = Stdout> {
    pub registers: EmuRegisters,
    pub alu: Alu,
    pub ram: Ram,
    pub state: EmuState,
    output: W,
    table: DispatchTable<W>,
}

impl Emulator<Stdout> {
    /// Creates an emulator that prints to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Emulator<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Emulator<W> {
    /// Creates an emulator that prints to `output`.
    pub fn with_output(output: W) -> Self {
        Self {
            registers: EmuRegisters::new(),
            alu: Alu::new(),
            ram: Ram::new(),
            state: EmuState::Running,
            output,
            table: DispatchTable::new(),
        }
    }

    /// Parses a program listing and copies it into RAM starting at address 0.
    ///
    /// The machine is reset first, so nothing from an earlier program survives. Returns the
    /// number of bytes loaded.
    ///
    /// # Errors
    ///
    /// This function will return an error if the listing is malformed or doesn't fit in RAM.
    /// The machine is left untouched in that case.
    pub fn load(&mut self, source: &str) -> Result<usize> {
        let program = parse_program(source)?;
        let mut ram = Ram::new();
        ram.load(&program)?;
        self.reset();
        self.ram = ram;
        log::info!("loaded {} bytes", program.len());
        Ok(program.len())
    }

    /// Puts the machine back in its power-on state. The output sink is kept.
    pub fn reset(&mut self) {
        self.registers = EmuRegisters::new();
        self.alu = Alu::new();
        self.ram = Ram::new();
        self.state = EmuState::Running;
    }

    /// Runs the emulator, stepping through instructions until it reaches a halt state.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an instruction; the emulator is halted afterwards.
    pub fn run_until_halt(&mut self) -> EmuResult<()> {
        while self.state == EmuState::Running {
            self.step()?;
        }
        self.output.flush()?;
        log::info!("halted at pc {:#04x}", self.registers.pc);
        Ok(())
    }

    /// Executes a single instruction.
    pub fn step(&mut self) -> EmuResult<()> {
        if self.state == EmuState::Halted {
            return Ok(());
        }
        self.execute().map_err(|e| {
            self.state = EmuState::Halted;
            e
        })
    }

    fn execute(&mut self) -> EmuResult<()> {
        let pc = self.registers.pc;
        let ir = self.ram.read(pc)?;
        let op_a = self.ram.read(pc + 1)?;
        let op_b = self.ram.read(pc + 2)?;
        log::trace!("{}", self.trace());

        let handler = self
            .table
            .get(ir)
            .ok_or(EmuError::UnknownOpcode { opcode: ir, pc })?;
        if let Ok(op) = Opcode::try_from(ir) {
            log::debug!(">>> {:#04x}: {} {:02X} {:02X}", pc, op, op_a, op_b);
        }
        let step = handler(self, op_a, op_b)?;

        if !step.running {
            self.state = EmuState::Halted;
        }
        self.registers.pc += step.pc_delta;
        Ok(())
    }

    /// Applies `mode` to `dst` and `src`, storing the result in `dst`.
    pub fn alu(&mut self, mode: AluMode, dst: Register, src: Register) {
        let left = self.registers.get(dst);
        let right = self.registers.get(src);
        let result = self.alu.apply(mode, left, right);
        self.registers.set(dst, result);
    }

    /// Renders the CPU state as `PC | IR A B | R0 .. R7`, all in hex.
    pub fn trace(&self) -> String {
        let pc = self.registers.pc;
        let peek = |offset: u16| self.ram.read(pc.wrapping_add(offset)).unwrap_or_default();
        let regs = self
            .registers
            .gp()
            .iter()
            .map(|value| format!("{:02X}", value))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} | {}",
            pc,
            peek(0),
            peek(1),
            peek(2),
            regs
        )
    }

    /// The sink `PRN` writes to.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Mutable access to the sink `PRN` writes to.
    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consumes the emulator, handing back its output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emu_with(program: &[u8]) -> Emulator<Vec<u8>> {
        let mut emu = Emulator::with_output(Vec::new());
        emu.ram.load(program).unwrap();
        emu
    }

    fn printed(emu: Emulator<Vec<u8>>) -> String {
        String::from_utf8(emu.into_output()).unwrap()
    }

    const PRINT8: &str = "\
# print8.ls8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";

    #[test]
    fn test_print8() {
        let mut emu = Emulator::with_output(Vec::new());
        assert_eq!(emu.load(PRINT8).unwrap(), 6);
        emu.run_until_halt().unwrap();
        assert_eq!(emu.state, EmuState::Halted);
        assert_eq!(emu.registers.pc, 5);
        assert_eq!(printed(emu), "8\n");
    }

    #[test]
    fn test_ldi() {
        for (reg, value) in [(0u8, 0u8), (3, 42), (7, 255)] {
            let mut emu = emu_with(&[0b1000_0010, reg, value, 0b0000_0001]);
            emu.step().unwrap();
            assert_eq!(emu.registers.get(reg.try_into().unwrap()), value);
            assert_eq!(emu.registers.pc, 3);
            assert_eq!(emu.state, EmuState::Running);
        }
    }

    #[test]
    fn test_push_pop() {
        let mut emu = emu_with(&[
            0b1000_0010, 1, 99, // LDI R1,99
            0b0100_0101, 1, // PUSH R1
            0b0100_0110, 4, // POP R4
            0b0000_0001, 0, 0, // HLT
        ]);
        emu.step().unwrap();
        let sp_before = emu.registers.sp;
        emu.step().unwrap();
        assert_eq!(emu.registers.sp, sp_before - 1);
        assert_eq!(emu.ram.read(255).unwrap(), 99);
        emu.step().unwrap();
        assert_eq!(emu.registers.sp, sp_before);
        assert_eq!(emu.registers.get(Register::R4), 99);
        emu.run_until_halt().unwrap();
        assert_eq!(emu.registers.pc, 7);
    }

    #[test]
    fn test_mul() {
        for (a, b) in [(8u8, 9u8), (0, 200), (255, 1), (255, 255), (16, 16)] {
            let mut emu = emu_with(&[
                0b1000_0010, 0, a, // LDI R0,a
                0b1000_0010, 1, b, // LDI R1,b
                0b1010_0010, 0, 1, // MUL R0,R1
                0b0000_0001, 0, 0, // HLT
            ]);
            emu.run_until_halt().unwrap();
            assert_eq!(emu.registers.get(Register::R0), a.wrapping_mul(b));
            assert_eq!(emu.registers.get(Register::R1), b);
            assert_eq!(emu.registers.pc, 9);
        }
    }

    #[test]
    fn test_add() {
        let mut emu = emu_with(&[
            0b1000_0010, 2, 200, // LDI R2,200
            0b1000_0010, 3, 100, // LDI R3,100
            0b1010_0000, 2, 3, // ADD R2,R3
            0b0100_0111, 2, // PRN R2
            0b0000_0001, 0, 0, // HLT
        ]);
        emu.run_until_halt().unwrap();
        assert_eq!(emu.registers.get(Register::R2), 44);
        assert_eq!(printed(emu), "44\n");
    }

    #[test]
    fn test_alu_by_name() {
        let mut emu = emu_with(&[]);
        emu.registers.set(Register::R0, 6);
        emu.registers.set(Register::R1, 7);
        emu.alu("MUL".parse().unwrap(), Register::R0, Register::R1);
        assert_eq!(emu.registers.get(Register::R0), 42);
        assert!(matches!(
            "DIV".parse::<AluMode>(),
            Err(EmuError::UnsupportedAluOperation(_))
        ));
    }

    #[test]
    fn test_halt_first() {
        let mut emu = emu_with(&[0b0000_0001, 0, 0]);
        let ram_before = emu.ram.memory().to_vec();
        let regs_before = emu.registers.clone();
        emu.run_until_halt().unwrap();
        assert_eq!(emu.state, EmuState::Halted);
        assert_eq!(emu.registers, regs_before);
        assert_eq!(emu.ram.memory(), &ram_before[..]);
        assert_eq!(printed(emu), "");
    }

    #[test]
    fn test_unknown_opcode() {
        let mut emu = emu_with(&[0b1000_0010, 0, 1, 0b1111_1111, 0, 0]);
        let err = emu.run_until_halt().unwrap_err();
        assert!(matches!(
            err,
            EmuError::UnknownOpcode {
                opcode: 0xFF,
                pc: 3
            }
        ));
        assert!(err.to_string().contains("255"));
        assert_eq!(emu.state, EmuState::Halted);
        assert_eq!(emu.registers.pc, 3);
    }

    #[test]
    fn test_invalid_register_is_not_unknown_opcode() {
        let mut emu = emu_with(&[0b0100_0111, 9, 0]);
        let err = emu.run_until_halt().unwrap_err();
        assert!(matches!(
            err,
            EmuError::Platform(crate::plat::PlatformError::InvalidRegister(9))
        ));
        assert_eq!(emu.state, EmuState::Halted);
    }

    #[test]
    fn test_stack_underflow() {
        let mut emu = emu_with(&[0b0100_0110, 0, 0]);
        assert!(matches!(
            emu.run_until_halt(),
            Err(EmuError::StackUnderflow)
        ));
        assert_eq!(emu.registers.sp, 256);
    }

    #[test]
    fn test_stack_overflow() {
        let mut emu = emu_with(&[0b0100_0101, 0, 0]);
        emu.registers.sp = 0;
        assert!(matches!(emu.run_until_halt(), Err(EmuError::StackOverflow)));
        assert_eq!(emu.registers.sp, 0);
    }

    #[test]
    fn test_fetch_past_end_of_ram() {
        let mut emu = emu_with(&[]);
        emu.ram.write(255, 0b0000_0001).unwrap();
        emu.registers.pc = 255;
        assert!(matches!(
            emu.run_until_halt(),
            Err(EmuError::OutOfRangeAddress(256))
        ));
    }

    #[test]
    fn test_step_after_halt_is_noop() {
        let mut emu = emu_with(&[0b0000_0001, 0, 0]);
        emu.step().unwrap();
        emu.step().unwrap();
        assert_eq!(emu.registers.pc, 0);
        assert_eq!(emu.state, EmuState::Halted);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = emu_with(&[0b1000_0010, 0, 1, 0b0000_0001, 0, 0]);
        let mut b = emu_with(&[0b1000_0010, 0, 2, 0b0000_0001, 0, 0]);
        a.run_until_halt().unwrap();
        b.run_until_halt().unwrap();
        assert_eq!(a.registers.get(Register::R0), 1);
        assert_eq!(b.registers.get(Register::R0), 2);
    }

    #[test]
    fn test_load_resets_machine() {
        let mut emu = Emulator::with_output(Vec::new());
        emu.load("10000010\n00000011\n00000011\n").unwrap();
        emu.run_until_halt().unwrap_err();
        assert_eq!(emu.state, EmuState::Halted);

        assert_eq!(emu.load("00000001\n").unwrap(), 1);
        assert_eq!(&emu.ram.memory()[..4], &[1, 0, 0, 0]);
        assert_eq!(emu.registers, EmuRegisters::new());
        assert_eq!(emu.state, EmuState::Running);
        emu.run_until_halt().unwrap();
        assert_eq!(emu.registers.pc, 0);
    }

    #[test]
    fn test_failed_load_keeps_machine() {
        let mut emu = Emulator::with_output(Vec::new());
        emu.load("00000001\n").unwrap();
        emu.registers.set(Register::R1, 5);
        assert!(emu.load("not binary\n").is_err());
        assert_eq!(emu.ram.read(0).unwrap(), 1);
        assert_eq!(emu.registers.get(Register::R1), 5);
    }

    #[test]
    fn test_trace_at_end_of_address_space() {
        let mut emu = emu_with(&[]);
        emu.registers.pc = u16::MAX;
        assert_eq!(
            emu.trace(),
            "TRACE: FFFF | 00 00 00 | 00 00 00 00 00 00 00 00"
        );
    }

    #[test]
    fn test_trace() {
        let mut emu = emu_with(&[0b1000_0010, 0, 8]);
        emu.registers.set(Register::R7, 0xAB);
        assert_eq!(
            emu.trace(),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 AB"
        );
    }
}
