use parse_display::Display;
use thiserror::Error;

use crate::constants::{self as C, REGISTER_COUNT};

/// General purpose registers. `VF` doubles as the flags register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display(style = "lowercase")]
pub enum Reg {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}

impl Reg {
    /// The flags register, which receives carries, borrows, shifted-out bits and collisions
    pub const FLAGS: Reg = Reg::VF;

    const ALL: [Reg; REGISTER_COUNT] = [
        Reg::V0,
        Reg::V1,
        Reg::V2,
        Reg::V3,
        Reg::V4,
        Reg::V5,
        Reg::V6,
        Reg::V7,
        Reg::V8,
        Reg::V9,
        Reg::VA,
        Reg::VB,
        Reg::VC,
        Reg::VD,
        Reg::VE,
        Reg::VF,
    ];

    /// Get a register from the low 4 bits of a value
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Reg {
        Self::ALL[(nibble & 0xF) as usize]
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Iterate over `v0` to `self`, inclusive
    pub fn up_to(self) -> impl Iterator<Item = Reg> {
        Self::ALL.into_iter().take(self.index() + 1)
    }

    pub fn all() -> impl Iterator<Item = Reg> {
        Self::ALL.into_iter()
    }
}

#[derive(Error, Debug)]
#[error("could not parse register")]
pub struct RegisterParseError;

impl std::str::FromStr for Reg {
    type Err = RegisterParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.strip_prefix('%').unwrap_or(s);
        let digit = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .ok_or(RegisterParseError)?;

        if digit.len() != 1 {
            return Err(RegisterParseError);
        }

        u8::from_str_radix(digit, 16)
            .map(Reg::from_nibble)
            .map_err(|_| RegisterParseError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose registers, `v[15]` being the flags register
    pub v: [u8; REGISTER_COUNT],

    /// Index register
    pub i: C::Address,

    /// Program counter
    pub pc: C::Address,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: C::PROGRAM_START,
        }
    }
}

impl Registers {
    #[must_use]
    pub fn get(&self, reg: Reg) -> u8 {
        self.v[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: u8) {
        self.v[reg.index()] = value;
    }

    /// Value of the flags register
    #[must_use]
    pub fn flags(&self) -> u8 {
        self.get(Reg::FLAGS)
    }

    pub(crate) fn set_flags(&mut self, flag: bool) {
        self.set(Reg::FLAGS, u8::from(flag));
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for reg in Reg::all() {
            write!(f, "{reg} = {:#04x} | ", self.get(reg))?;
        }
        write!(f, "i = {:#06x} | pc = {:#06x}", self.i, self.pc)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_register_test() {
        assert_eq!("v0".parse::<Reg>().unwrap(), Reg::V0);
        assert_eq!("VA".parse::<Reg>().unwrap(), Reg::VA);
        assert_eq!("%vf".parse::<Reg>().unwrap(), Reg::VF);
        assert_eq!("vB".parse::<Reg>().unwrap(), Reg::VB);
        assert!("v10".parse::<Reg>().is_err());
        assert!("a".parse::<Reg>().is_err());
        assert!("vg".parse::<Reg>().is_err());
    }

    #[test]
    fn display_register_test() {
        assert_eq!(Reg::V3.to_string(), "v3");
        assert_eq!(Reg::VF.to_string(), "vf");
    }

    #[test]
    fn up_to_test() {
        let regs: Vec<_> = Reg::V2.up_to().collect();
        assert_eq!(regs, vec![Reg::V0, Reg::V1, Reg::V2]);
        assert_eq!(Reg::VF.up_to().count(), REGISTER_COUNT);
    }

    #[test]
    fn flags_test() {
        let mut registers = Registers::default();
        registers.set_flags(true);
        assert_eq!(registers.get(Reg::VF), 1);
        registers.set_flags(false);
        assert_eq!(registers.flags(), 0);
    }
}
