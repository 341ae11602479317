use std::str::FromStr;

use chip8_emulator::constants as C;
use chip8_emulator::runtime::{Computer, Keys, Reg};
use nom::branch::alt;
use nom::bytes::complete::{is_a, tag_no_case};
use nom::character::complete::{char, digit1, hex_digit1, one_of, satisfy, space0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::error::{convert_error, VerboseError};
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::{Finish, IResult};
use thiserror::Error;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, Error)]
#[error("could not parse {what}: {message}")]
pub struct ParseError {
    what: &'static str,
    message: String,
}

fn run_parser<'a, T>(
    what: &'static str,
    input: &'a str,
    parser: impl FnMut(&'a str) -> Res<'a, T>,
) -> Result<T, ParseError> {
    all_consuming(parser)(input)
        .finish()
        .map(|(_, ret)| ret)
        .map_err(|e| ParseError {
            what,
            message: convert_error(input, e),
        })
}

/// Parse a number literal: hexadecimal with `0x`, binary with `0b`, decimal otherwise
fn parse_number(input: &str) -> Res<'_, u16> {
    alt((
        preceded(
            tag_no_case("0x"),
            map_res(hex_digit1, |s| u16::from_str_radix(s, 16)),
        ),
        preceded(
            tag_no_case("0b"),
            map_res(is_a("01"), |s| u16::from_str_radix(s, 2)),
        ),
        map_res(digit1, str::parse::<u16>),
    ))(input)
}

fn parse_register(input: &str) -> Res<'_, Reg> {
    map_res(
        recognize(tuple((
            opt(char('%')),
            one_of("vV"),
            satisfy(|c| c.is_ascii_hexdigit()),
        ))),
        Reg::from_str,
    )(input)
}

/// Where a value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Literal(u16),
    Register(Reg),
    Index,
    ProgramCounter,
}

fn parse_source(input: &str) -> Res<'_, Source> {
    alt((
        map(parse_register, Source::Register),
        value(
            Source::ProgramCounter,
            preceded(opt(char('%')), tag_no_case("pc")),
        ),
        value(Source::Index, preceded(opt(char('%')), tag_no_case("i"))),
        map(parse_number, Source::Literal),
    ))(input)
}

/// A value, with an optional offset: `0x200`, `v3`, `i + 4`, `pc - 2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    source: Source,
    offset: i32,
}

impl Value {
    pub fn evaluate(self, computer: &Computer) -> u16 {
        let base = match self.source {
            Source::Literal(value) => value,
            Source::Register(reg) => computer.registers.get(reg).into(),
            Source::Index => computer.registers.i,
            Source::ProgramCounter => computer.registers.pc,
        };

        let magnitude = u16::try_from(self.offset.unsigned_abs()).unwrap_or(u16::MAX);
        if self.offset.is_negative() {
            base.wrapping_sub(magnitude)
        } else {
            base.wrapping_add(magnitude)
        }
    }
}

fn parse_value(input: &str) -> Res<'_, Value> {
    let (rest, source) = parse_source(input)?;
    let (rest, offset) = opt(pair(
        delimited(space0, one_of("+-"), space0),
        parse_number,
    ))(rest)?;

    let offset = match offset {
        Some(('-', n)) => -i32::from(n),
        Some((_, n)) => i32::from(n),
        None => 0,
    };

    Ok((rest, Value { source, offset }))
}

impl FromStr for Value {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        run_parser("value", s, parse_value)
    }
}

/// Something that can be assigned by the `set` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    /// A byte in memory, written `[address]`
    Memory(Value),
    Register(Reg),
    Index,
    ProgramCounter,
    DelayTimer,
    SoundTimer,
}

fn parse_assignment_target(input: &str) -> Res<'_, AssignmentTarget> {
    alt((
        map(
            delimited(
                pair(char('['), space0),
                parse_value,
                pair(space0, char(']')),
            ),
            AssignmentTarget::Memory,
        ),
        map(parse_register, AssignmentTarget::Register),
        value(
            AssignmentTarget::ProgramCounter,
            preceded(opt(char('%')), tag_no_case("pc")),
        ),
        value(
            AssignmentTarget::DelayTimer,
            preceded(opt(char('%')), tag_no_case("dt")),
        ),
        value(
            AssignmentTarget::SoundTimer,
            preceded(opt(char('%')), tag_no_case("st")),
        ),
        value(
            AssignmentTarget::Index,
            preceded(opt(char('%')), tag_no_case("i")),
        ),
    ))(input)
}

impl FromStr for AssignmentTarget {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        run_parser("assignment target", s, parse_assignment_target)
    }
}

/// Parse a single key, from `0` to `f`
pub fn parse_key(input: &str) -> Result<u8, ParseError> {
    run_parser(
        "key",
        input,
        map_res(
            recognize(pair(opt(tag_no_case("0x")), satisfy(|c| c.is_ascii_hexdigit()))),
            |s: &str| {
                let digit = s.get(s.len() - 1..).unwrap_or(s);
                u8::from_str_radix(digit, 16)
            },
        ),
    )
}

/// Parse a mask of pressed keys, bit `n` being key `n`
pub fn parse_keys(input: &str) -> Result<Keys, ParseError> {
    run_parser("key mask", input, map(parse_number, Keys::from_bits_truncate))
}

/// Parse an address, which must be inside memory
pub fn parse_address(input: &str) -> Result<C::Address, ParseError> {
    let address = run_parser("address", input, parse_number)?;
    if usize::from(address) < C::MEMORY_SIZE {
        Ok(address)
    } else {
        Err(ParseError {
            what: "address",
            message: format!("{address:#06x} is out of memory"),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_number_test() {
        assert_eq!(parse_number("42"), Ok(("", 42)));
        assert_eq!(parse_number("0x2A"), Ok(("", 42)));
        assert_eq!(parse_number("0b101010"), Ok(("", 42)));
        assert!(run_parser("number", "0x10000", parse_number).is_err());
    }

    #[test]
    fn parse_value_test() {
        assert_eq!(
            "0x300".parse::<Value>().unwrap(),
            Value {
                source: Source::Literal(0x300),
                offset: 0
            }
        );
        assert_eq!(
            "v3".parse::<Value>().unwrap(),
            Value {
                source: Source::Register(Reg::V3),
                offset: 0
            }
        );
        assert_eq!(
            "%i + 4".parse::<Value>().unwrap(),
            Value {
                source: Source::Index,
                offset: 4
            }
        );
        assert_eq!(
            "pc-2".parse::<Value>().unwrap(),
            Value {
                source: Source::ProgramCounter,
                offset: -2
            }
        );
        assert!("vg".parse::<Value>().is_err());
        assert!("v3 +".parse::<Value>().is_err());
    }

    #[test]
    fn evaluate_test() {
        let mut computer = Computer::with_seed(0);
        computer.registers.set(Reg::VA, 0x10);
        computer.registers.i = 0x300;

        let eval = |s: &str| s.parse::<Value>().unwrap().evaluate(&computer);
        assert_eq!(eval("va + 1"), 0x11);
        assert_eq!(eval("i - 0x10"), 0x2F0);
        assert_eq!(eval("pc"), C::PROGRAM_START);
        assert_eq!(eval("0 - 1"), 0xFFFF);
    }

    #[test]
    fn parse_assignment_target_test() {
        let parse = |s: &str| s.parse::<AssignmentTarget>().unwrap();
        assert_eq!(parse("vf"), AssignmentTarget::Register(Reg::VF));
        assert_eq!(parse("i"), AssignmentTarget::Index);
        assert_eq!(parse("%pc"), AssignmentTarget::ProgramCounter);
        assert_eq!(parse("dt"), AssignmentTarget::DelayTimer);
        assert_eq!(parse("st"), AssignmentTarget::SoundTimer);
        assert_eq!(
            parse("[ i + 1 ]"),
            AssignmentTarget::Memory(Value {
                source: Source::Index,
                offset: 1
            })
        );
        assert!("[i".parse::<AssignmentTarget>().is_err());
    }

    #[test]
    fn parse_keys_test() {
        assert_eq!(parse_key("a").unwrap(), 0xA);
        assert_eq!(parse_key("0xF").unwrap(), 0xF);
        assert!(parse_key("10").is_err());

        assert_eq!(
            parse_keys("0b10010").unwrap(),
            Keys::KEY_1 | Keys::KEY_4
        );
    }

    #[test]
    fn parse_address_test() {
        assert_eq!(parse_address("0x1FFF").unwrap(), 0x1FFF);
        assert!(parse_address("0x2000").is_err());
    }
}
