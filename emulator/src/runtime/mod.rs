use miette::Diagnostic;
use parse_display::Display;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants as C;

mod alu;
mod fault;
mod instructions;
mod keypad;
mod memory;
mod opcode;
mod registers;
mod stack;
mod timers;

pub use self::alu::{AluOp, AluResult};
pub use self::fault::{Direction, Fault};
pub use self::instructions::{DecodeError, Instruction};
pub use self::keypad::Keys;
pub use self::memory::{Framebuffer, Memory, MemoryError};
pub use self::opcode::Opcode;
pub use self::registers::{Reg, RegisterParseError, Registers};
pub use self::stack::{Stack, StackError};
pub use self::timers::Timers;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("CPU fault: {0}")]
    #[diagnostic(transparent)]
    Fault(#[from] Fault),

    #[error("computer is halted")]
    Halted,

    #[error("computer has faulted: {0}")]
    #[diagnostic(transparent)]
    Faulted(Fault),
}

type Result<T> = std::result::Result<T, ProcessorError>;

/// Execution state of the computer
#[derive(Debug, Display, Clone, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    #[display("running")]
    Running,

    /// Stopped by the host, can be resumed
    #[display("halted")]
    Halted,

    /// Stopped by a fault, terminal until a reset
    #[display("faulted ({0})")]
    Faulted(Fault),
}

pub struct Computer {
    pub registers: Registers,
    pub memory: Memory,
    pub stack: Stack,
    pub timers: Timers,
    pub keys: Keys,
    pub cycles: usize,
    state: State,
    rng: Box<dyn RngCore + Send>,
}

#[cfg(feature = "entropy")]
impl Default for Computer {
    /// Build a computer with a randomly seeded number generator
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, stack: {:?}, state: {:?}, memory: [...] }}",
            self.registers, self.stack, self.state
        )
    }
}

impl Computer {
    /// Build a computer with a deterministic random number generator
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Build a computer which draws random bytes from the given generator
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            registers: Registers::default(),
            memory: Memory::default(),
            stack: Stack::default(),
            timers: Timers::default(),
            keys: Keys::default(),
            cycles: 0,
            state: State::Running,
            rng: Box::new(rng),
        }
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Copy a program at [`C::PROGRAM_START`]
    ///
    /// # Errors
    ///
    /// Fails without touching memory if the program would overlap the video memory
    #[tracing::instrument(skip_all, fields(size = rom.len()), err)]
    pub fn load(&mut self, rom: &[u8]) -> std::result::Result<(), Fault> {
        if rom.len() > C::PROGRAM_CAPACITY {
            return Err(Fault::LoadOverflow {
                size: rom.len(),
                capacity: C::PROGRAM_CAPACITY,
            });
        }

        self.memory
            .write(C::PROGRAM_START, rom)
            .map_err(|_| Fault::LoadOverflow {
                size: rom.len(),
                capacity: C::PROGRAM_CAPACITY,
            })?;
        info!("Program loaded at {:#x}", C::PROGRAM_START);
        Ok(())
    }

    /// Read the byte under `pc` and move `pc` forward
    ///
    /// # Errors
    ///
    /// Fails if `pc` is out of memory
    pub fn read_byte(&mut self) -> std::result::Result<u8, Fault> {
        let pc = self.registers.pc;
        let byte = self
            .memory
            .get(pc.into())
            .map_err(|_| Fault::OutOfBoundsFetch { pc })?;
        self.registers.pc = pc.wrapping_add(1);
        Ok(byte)
    }

    /// Read a big-endian word under `pc` and move `pc` forward by two.
    ///
    /// # Errors
    ///
    /// Fails if any of the two bytes is out of memory, in which case `pc` is left untouched
    pub fn read_word(&mut self) -> std::result::Result<C::Word, Fault> {
        let pc = self.registers.pc;
        let word = self
            .read_byte()
            .and_then(|high| Ok(C::Word::from_be_bytes([high, self.read_byte()?])));

        if word.is_err() {
            self.registers.pc = pc;
        }
        word
    }

    /// Skip the next instruction if the condition holds
    fn skip_if(&mut self, condition: bool) {
        if condition {
            debug!("Skipping next instruction");
            self.registers.pc = self.registers.pc.wrapping_add(2);
        }
    }

    fn random_byte(&mut self) -> u8 {
        self.rng.gen()
    }

    #[tracing::instrument(skip(self), level = "debug")]
    pub fn step(&mut self) -> Result<()> {
        match &self.state {
            State::Running => {}
            State::Halted => return Err(ProcessorError::Halted),
            State::Faulted(fault) => return Err(ProcessorError::Faulted(fault.clone())),
        }

        let pc = self.registers.pc;
        let res = self.fetch_and_execute();
        if let Err(fault) = res {
            // Nothing after the fetch was committed, only `pc` needs to be restored
            self.registers.pc = pc;
            self.state = State::Faulted(fault.clone());
            return Err(fault.into());
        }

        self.cycles += 1;
        debug!("Register state {}", self.registers);
        Ok(())
    }

    fn fetch_and_execute(&mut self) -> std::result::Result<(), Fault> {
        let pc = self.registers.pc;
        if pc % 2 != 0 {
            return Err(Fault::MisalignedFetch { pc });
        }
        let opcode = Opcode(self.read_word()?);
        let inst = Instruction::try_from(opcode)
            .map_err(|DecodeError(opcode)| Fault::UnrecognizedInstruction { opcode, pc })?;
        debug!(pc, %opcode, "Executing instruction \"{}\"", inst);
        inst.execute(self)
    }

    /// Step until the limit is reached.
    ///
    /// Returns the number of steps executed.
    ///
    /// # Errors
    ///
    /// Stops at the first error
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self, limit: usize) -> Result<usize> {
        for done in 0..limit {
            if let Err(e) = self.step() {
                debug!(steps = done, "Stopped");
                return Err(e);
            }
        }
        Ok(limit)
    }

    /// Stop stepping until [`Computer::resume`] is called
    pub fn halt(&mut self) {
        if self.state == State::Running {
            info!("Halting");
            self.state = State::Halted;
        }
    }

    /// Resume a halted computer. A faulted computer stays faulted.
    pub fn resume(&mut self) {
        if self.state == State::Halted {
            info!("Resuming");
            self.state = State::Running;
        }
    }

    /// Clear memory, registers, stack, timers and keys, and start running again
    pub fn reset(&mut self) {
        info!("Resetting computer");
        self.registers = Registers::default();
        self.memory = Memory::default();
        self.stack = Stack::default();
        self.timers = Timers::default();
        self.keys = Keys::default();
        self.cycles = 0;
        self.state = State::Running;
    }

    /// Read-only view of the screen
    #[must_use]
    pub fn framebuffer(&self) -> Framebuffer<'_> {
        self.memory.framebuffer()
    }

    /// Set which keys are currently pressed
    pub fn set_keys(&mut self, keys: Keys) {
        self.keys = keys;
    }

    #[must_use]
    pub fn timers(&self) -> Timers {
        self.timers
    }

    /// Decrement the delay and sound timers
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }
}
