use miette::Diagnostic;
use parse_display::Display;
use thiserror::Error;

use super::opcode::Opcode;
use crate::constants::Address;

/// Direction of a transfer between registers and memory
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display(style = "lowercase")]
pub enum Direction {
    Read,
    Write,
}

/// Errors raised while executing a program. They are terminal for the current run.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("instruction fetch out of bounds at {pc:#06x}")]
    #[diagnostic(
        code(chip8::out_of_bounds_fetch),
        help("the program counter ran past the end of memory")
    )]
    OutOfBoundsFetch { pc: Address },

    #[error("misaligned instruction fetch at {pc:#06x}")]
    #[diagnostic(
        code(chip8::misaligned_fetch),
        help("instructions are two bytes long and start on even addresses")
    )]
    MisalignedFetch { pc: Address },

    #[error("out of bounds memory {direction} of {count} bytes at {start:#06x}")]
    #[diagnostic(
        code(chip8::out_of_bounds_transfer),
        help("the index register points too close to the end of memory")
    )]
    OutOfBoundsTransfer {
        direction: Direction,
        start: Address,
        count: usize,
    },

    #[error("stack overflow at {pc:#06x}")]
    #[diagnostic(
        code(chip8::stack_overflow),
        help("subroutines are nested deeper than the stack allows")
    )]
    StackOverflow { pc: Address },

    #[error("stack underflow at {pc:#06x}")]
    #[diagnostic(
        code(chip8::stack_underflow),
        help("a subroutine returned without being called")
    )]
    StackUnderflow { pc: Address },

    #[error("unrecognized instruction {opcode} at {pc:#06x}")]
    #[diagnostic(code(chip8::unrecognized_instruction))]
    UnrecognizedInstruction { opcode: Opcode, pc: Address },

    #[error("program of {size} bytes does not fit in {capacity} bytes")]
    #[diagnostic(
        code(chip8::load_overflow),
        help("the program would overlap the video memory")
    )]
    LoadOverflow { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_test() {
        let fault = Fault::OutOfBoundsTransfer {
            direction: Direction::Write,
            start: 0x1FFE,
            count: 4,
        };
        assert_eq!(
            fault.to_string(),
            "out of bounds memory write of 4 bytes at 0x1ffe"
        );

        let fault = Fault::UnrecognizedInstruction {
            opcode: Opcode(0x800F),
            pc: 0x200,
        };
        assert_eq!(
            fault.to_string(),
            "unrecognized instruction 800F at 0x0200"
        );

        let fault = Fault::MisalignedFetch { pc: 0x201 };
        assert_eq!(fault.to_string(), "misaligned instruction fetch at 0x0201");
    }
}
