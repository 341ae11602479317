use thiserror::Error;
use tracing::debug;

use super::{
    alu::AluOp,
    fault::{Direction, Fault},
    opcode::Opcode,
    registers::Reg,
    Computer,
};
use crate::constants::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Clear the screen
    Cls,

    /// Return from a subroutine
    Ret,

    /// Jump to a machine routine, treated as a plain jump
    Sys(Address),

    /// Unconditional jump
    Jp(Address),

    /// Push `pc` and go to the given address
    Call(Address),

    /// Skip the next instruction if `vx` equals the immediate
    SeImm(Reg, u8),

    /// Skip the next instruction if `vx` differs from the immediate
    SneImm(Reg, u8),

    /// Skip the next instruction if `vx` equals `vy`
    Se(Reg, Reg),

    /// Load an immediate in a register
    Ld(Reg, u8),

    /// Add an immediate to a register, without touching `vf`
    AddImm(Reg, u8),

    /// Arithmetic and logic between two registers
    Alu(AluOp, Reg, Reg),

    /// Skip the next instruction if `vx` differs from `vy`
    Sne(Reg, Reg),

    /// Load the index register
    LdI(Address),

    /// Jump to an address offset by `v0`
    JpV0(Address),

    /// Random byte masked with an immediate
    Rnd(Reg, u8),

    /// Draw a sprite of the given height at (`vx`, `vy`)
    Drw(Reg, Reg, u8),

    /// Skip the next instruction if the key in `vx` is pressed
    Skp(Reg),

    /// Skip the next instruction if the key in `vx` is not pressed
    Sknp(Reg),

    /// Add a register to the index register
    AddI(Reg),

    /// Store `v0` to `vx` in memory, starting at the index register
    StoreRegs(Reg),

    /// Load `v0` to `vx` from memory, starting at the index register
    LoadRegs(Reg),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unrecognized instruction {0}")]
pub struct DecodeError(pub Opcode);

impl TryFrom<Opcode> for Instruction {
    type Error = DecodeError;

    fn try_from(op: Opcode) -> Result<Self, Self::Error> {
        use Instruction::*;

        let (x, y) = (op.x(), op.y());
        let instruction = match op.class() {
            0x0 => match op.0 {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Sys(op.address()),
            },
            0x1 => Jp(op.address()),
            0x2 => Call(op.address()),
            0x3 => SeImm(x, op.byte()),
            0x4 => SneImm(x, op.byte()),
            0x5 => Se(x, y),
            0x6 => Ld(x, op.byte()),
            0x7 => AddImm(x, op.byte()),
            0x8 => {
                let alu = AluOp::from_nibble(op.nibble()).ok_or(DecodeError(op))?;
                Alu(alu, x, y)
            }
            0x9 => Sne(x, y),
            0xA => LdI(op.address()),
            0xB => JpV0(op.address()),
            0xC => Rnd(x, op.byte()),
            0xD => Drw(x, y, op.nibble()),
            0xE => match op.sub_op() {
                0x9E => Skp(x),
                0xA1 => Sknp(x),
                _ => return Err(DecodeError(op)),
            },
            0xF => match op.sub_op() {
                0x1E => AddI(x),
                0x55 => StoreRegs(x),
                0x65 => LoadRegs(x),
                _ => return Err(DecodeError(op)),
            },
            _ => unreachable!("opcode class is a nibble"),
        };

        Ok(instruction)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Instruction::*;

        match self {
            Cls => write!(f, "cls"),
            Ret => write!(f, "ret"),
            Sys(addr) => write!(f, "sys  {addr:#05x}"),
            Jp(addr) => write!(f, "jp   {addr:#05x}"),
            Call(addr) => write!(f, "call {addr:#05x}"),
            SeImm(x, byte) => write!(f, "se   {x}, {byte:#04x}"),
            SneImm(x, byte) => write!(f, "sne  {x}, {byte:#04x}"),
            Se(x, y) => write!(f, "se   {x}, {y}"),
            Ld(x, byte) => write!(f, "ld   {x}, {byte:#04x}"),
            AddImm(x, byte) => write!(f, "add  {x}, {byte:#04x}"),
            Alu(op, x, y) => write!(f, "{:<4} {x}, {y}", op.to_string()),
            Sne(x, y) => write!(f, "sne  {x}, {y}"),
            LdI(addr) => write!(f, "ld   i, {addr:#05x}"),
            JpV0(addr) => write!(f, "jp   v0, {addr:#05x}"),
            Rnd(x, byte) => write!(f, "rnd  {x}, {byte:#04x}"),
            Drw(x, y, n) => write!(f, "drw  {x}, {y}, {n}"),
            Skp(x) => write!(f, "skp  {x}"),
            Sknp(x) => write!(f, "sknp {x}"),
            AddI(x) => write!(f, "add  i, {x}"),
            StoreRegs(x) => write!(f, "ld   [i], {x}"),
            LoadRegs(x) => write!(f, "ld   {x}, [i]"),
        }
    }
}

impl Instruction {
    /// Decode a raw instruction
    ///
    /// # Errors
    ///
    /// Fails if the opcode does not match any known instruction
    pub fn decode(word: u16) -> Result<Self, DecodeError> {
        Self::try_from(Opcode(word))
    }

    /// Execute the instruction.
    ///
    /// `pc` must already point past this instruction. Every precondition is
    /// checked before the computer is modified, so a failing instruction
    /// leaves no partial effect behind.
    #[tracing::instrument(skip(computer), level = "trace")]
    pub(crate) fn execute(&self, computer: &mut Computer) -> Result<(), Fault> {
        use Instruction::*;

        // Address of this instruction, for error reports
        let origin = computer.registers.pc.wrapping_sub(2);

        match *self {
            Cls => {
                debug!("Clearing screen");
                computer.memory.framebuffer_mut().clear();
            }

            Ret => {
                let address = computer
                    .stack
                    .pop()
                    .map_err(|_| Fault::StackUnderflow { pc: origin })?;
                debug!("Returning to address {:#x}", address);
                computer.registers.pc = address;
            }

            Sys(address) | Jp(address) => {
                debug!("Jumping to address {:#x}", address);
                computer.registers.pc = address;
            }

            Call(address) => {
                let pc = computer.registers.pc;
                computer
                    .stack
                    .push(pc)
                    .map_err(|_| Fault::StackOverflow { pc: origin })?;
                debug!("Calling subroutine at {:#x}", address);
                computer.registers.pc = address;
            }

            SeImm(x, byte) => computer.skip_if(computer.registers.get(x) == byte),
            SneImm(x, byte) => computer.skip_if(computer.registers.get(x) != byte),
            Se(x, y) => computer.skip_if(computer.registers.get(x) == computer.registers.get(y)),
            Sne(x, y) => computer.skip_if(computer.registers.get(x) != computer.registers.get(y)),

            Ld(x, byte) => computer.registers.set(x, byte),

            AddImm(x, byte) => {
                let res = computer.registers.get(x).wrapping_add(byte);
                computer.registers.set(x, res);
            }

            Alu(op, x, y) => {
                let a = computer.registers.get(x);
                let b = computer.registers.get(y);
                let res = op.apply(a, b);
                debug!("{} {}, {} => {:?}", op, a, b, res);

                // The flag is written last: it wins when `vx` is `vf`
                computer.registers.set(x, res.value);
                if let Some(flag) = res.flag {
                    computer.registers.set_flags(flag);
                }
            }

            LdI(address) => computer.registers.i = address,

            JpV0(address) => {
                let target = address + Address::from(computer.registers.get(Reg::V0));
                debug!("Jumping to address {:#x}", target);
                computer.registers.pc = target;
            }

            Rnd(x, mask) => {
                let byte = computer.random_byte();
                computer.registers.set(x, byte & mask);
            }

            Drw(x, y, height) => {
                let start = computer.registers.i;
                let count = usize::from(height);
                let sprite = computer
                    .memory
                    .slice(start.into(), count)
                    .map_err(|_| Fault::OutOfBoundsTransfer {
                        direction: Direction::Read,
                        start,
                        count,
                    })?
                    .to_vec();

                let px = usize::from(computer.registers.get(x));
                let py = usize::from(computer.registers.get(y));
                let collision = computer
                    .memory
                    .framebuffer_mut()
                    .draw_sprite(px, py, &sprite);
                debug!(px, py, height, collision, "Drawing sprite");
                computer.registers.set_flags(collision);
            }

            Skp(x) => {
                let key = computer.registers.get(x);
                computer.skip_if(computer.keys.is_pressed(key));
            }

            Sknp(x) => {
                let key = computer.registers.get(x);
                computer.skip_if(!computer.keys.is_pressed(key));
            }

            AddI(x) => {
                let i = computer
                    .registers
                    .i
                    .wrapping_add(computer.registers.get(x).into());
                computer.registers.i = i;
            }

            StoreRegs(x) => {
                let start = computer.registers.i;
                let count = x.index() + 1;
                let bytes = computer
                    .memory
                    .slice_mut(start.into(), count)
                    .map_err(|_| transfer_fault(start, x, Direction::Write))?;
                for (byte, reg) in bytes.iter_mut().zip(x.up_to()) {
                    *byte = computer.registers.get(reg);
                }
                debug!(start, count, "Stored registers");
            }

            LoadRegs(x) => {
                let start = computer.registers.i;
                let count = x.index() + 1;
                let values = computer
                    .memory
                    .slice(start.into(), count)
                    .map_err(|_| transfer_fault(start, x, Direction::Read))?;
                for (reg, &value) in x.up_to().zip(values) {
                    computer.registers.set(reg, value);
                }
                debug!(start, count, "Loaded registers");
            }
        }

        Ok(())
    }
}

/// Registers `v0` to `last` do not fit in memory from `start`
fn transfer_fault(start: Address, last: Reg, direction: Direction) -> Fault {
    Fault::OutOfBoundsTransfer {
        direction,
        start,
        count: last.index() + 1,
    }
}
