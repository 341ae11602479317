//! Field extraction from raw 16-bit instructions

use super::registers::Reg;
use crate::constants::{Address, Word};

/// A raw instruction, as fetched from memory
///
/// ```text
///   15   12 11    8 7     4 3     0
///  +-------+-------+-------+-------+
///  | class |   x   |   y   |   n   |
///  +-------+-------+-------+-------+
///                  |     byte      |
///          |        address        |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(pub Word);

impl Opcode {
    /// Opcode class, the top 4 bits
    #[must_use]
    pub const fn class(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// First register operand, bits 8 to 11
    #[must_use]
    pub const fn x(self) -> Reg {
        Reg::from_nibble((self.0 >> 8) as u8)
    }

    /// Second register operand, bits 4 to 7
    #[must_use]
    pub const fn y(self) -> Reg {
        Reg::from_nibble((self.0 >> 4) as u8)
    }

    /// Immediate byte, the low 8 bits
    #[must_use]
    pub const fn byte(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// 12-bit address or literal
    #[must_use]
    pub const fn address(self) -> Address {
        self.0 & 0x0FFF
    }

    /// Low nibble: ALU operation for class 8, sprite height for class D
    #[must_use]
    pub const fn nibble(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Sub-operation byte, for classes E and F
    #[must_use]
    pub const fn sub_op(self) -> u8 {
        self.byte()
    }
}

impl From<Word> for Opcode {
    fn from(word: Word) -> Self {
        Self(word)
    }
}

impl From<[u8; 2]> for Opcode {
    fn from(bytes: [u8; 2]) -> Self {
        Self(Word::from_be_bytes(bytes))
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}
