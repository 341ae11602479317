//! Arithmetic and logic operations of the class 8 instructions

use parse_display::Display;

/// Operation selected by the low nibble of a class 8 instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "lowercase")]
pub enum AluOp {
    /// `vx := vy`
    Ld,
    /// `vx := vx | vy`
    Or,
    /// `vx := vx & vy`
    And,
    /// `vx := vx ^ vy`
    Xor,
    /// `vx := vx + vy`, `vf` is the carry
    Add,
    /// `vx := vx - vy`, `vf` is set if `vx > vy`
    Sub,
    /// `vx := vx >> 1`, `vf` is the shifted-out bit
    Shr,
    /// `vx := vy - vx`, `vf` is set if `vx < vy`
    Subn,
    /// `vx := vx << 1`, `vf` is the shifted-out bit
    Shl,
}

/// Outcome of an ALU operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,

    /// New value of the flags register, if the operation sets it
    pub flag: Option<bool>,
}

impl AluOp {
    /// Decode the low nibble of a class 8 instruction
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Option<AluOp> {
        match nibble {
            0x0 => Some(AluOp::Ld),
            0x1 => Some(AluOp::Or),
            0x2 => Some(AluOp::And),
            0x3 => Some(AluOp::Xor),
            0x4 => Some(AluOp::Add),
            0x5 => Some(AluOp::Sub),
            0x6 => Some(AluOp::Shr),
            0x7 => Some(AluOp::Subn),
            0xE => Some(AluOp::Shl),
            _ => None,
        }
    }

    /// Compute the operation on the values of `vx` and `vy`
    #[must_use]
    pub fn apply(self, x: u8, y: u8) -> AluResult {
        let (value, flag) = match self {
            AluOp::Ld => (y, None),
            AluOp::Or => (x | y, None),
            AluOp::And => (x & y, None),
            AluOp::Xor => (x ^ y, None),
            AluOp::Add => {
                let sum = u16::from(x) + u16::from(y);
                (sum.to_le_bytes()[0], Some(sum > 0xFF))
            }
            AluOp::Sub => (x.wrapping_sub(y), Some(x > y)),
            AluOp::Shr => (x >> 1, Some(x & 0x01 != 0)),
            AluOp::Subn => (y.wrapping_sub(x), Some(x < y)),
            AluOp::Shl => (x << 1, Some(x & 0x80 != 0)),
        };

        AluResult { value, flag }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn result(value: u8, flag: Option<bool>) -> AluResult {
        AluResult { value, flag }
    }

    #[test]
    fn decode_test() {
        for nibble in 0..=0xF {
            let unknown = matches!(nibble, 0x8..=0xD | 0xF);
            assert_eq!(AluOp::from_nibble(nibble).is_none(), unknown);
        }
        assert_eq!(AluOp::from_nibble(0x4), Some(AluOp::Add));
        assert_eq!(AluOp::from_nibble(0x7), Some(AluOp::Subn));
        assert_eq!(AluOp::from_nibble(0xE), Some(AluOp::Shl));
    }

    #[test]
    fn bitwise_test() {
        assert_eq!(AluOp::Ld.apply(0x12, 0x34), result(0x34, None));
        assert_eq!(AluOp::Or.apply(0xF0, 0x0F), result(0xFF, None));
        assert_eq!(AluOp::And.apply(0xF0, 0x3C), result(0x30, None));
        assert_eq!(AluOp::Xor.apply(0xFF, 0x0F), result(0xF0, None));
    }

    #[test]
    fn add_test() {
        for x in 0..=u8::MAX {
            for y in 0..=u8::MAX {
                let sum = u16::from(x) + u16::from(y);
                let res = AluOp::Add.apply(x, y);
                assert_eq!(res.flag, Some(sum > 255));
                assert_eq!(u16::from(res.value), sum % 256);
            }
        }
    }

    #[test]
    fn sub_test() {
        assert_eq!(AluOp::Sub.apply(5, 3), result(2, Some(true)));
        assert_eq!(AluOp::Sub.apply(3, 5), result(254, Some(false)));
        // Equal operands do not set the flag
        assert_eq!(AluOp::Sub.apply(7, 7), result(0, Some(false)));

        assert_eq!(AluOp::Subn.apply(3, 5), result(2, Some(true)));
        assert_eq!(AluOp::Subn.apply(5, 3), result(254, Some(false)));
        assert_eq!(AluOp::Subn.apply(7, 7), result(0, Some(false)));
    }

    #[test]
    fn shift_test() {
        for x in 0..=u8::MAX {
            let res = AluOp::Shr.apply(x, 0);
            assert_eq!(res, result(x >> 1, Some(x & 1 == 1)));

            let res = AluOp::Shl.apply(x, 0);
            assert_eq!(res, result(x.wrapping_shl(1), Some(x >> 7 == 1)));
        }
    }
}
