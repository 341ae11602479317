use camino::Utf8PathBuf;
use chip8_emulator::constants as C;
use chip8_emulator::Instruction;
use clap::{Parser, ValueHint};
use tracing::debug;

#[derive(Parser, Debug)]
pub struct DisassembleOpt {
    /// Input file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl DisassembleOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let rom = super::read_rom(&self.input)?;
        debug!("Disassembling program");
        for line in disassemble(&rom, C::PROGRAM_START) {
            println!("{line}");
        }
        Ok(())
    }
}

/// List the instructions of a program loaded at `origin`, one per word.
///
/// Words which are not instructions, and a trailing odd byte, are shown as raw data.
pub(crate) fn disassemble(rom: &[u8], origin: C::Address) -> impl Iterator<Item = String> + '_ {
    rom.chunks(2).enumerate().map(move |(index, chunk)| {
        let offset = u16::try_from(index * 2).unwrap_or(u16::MAX);
        let address = origin.wrapping_add(offset);
        match *chunk {
            [high, low] => {
                let word = C::Word::from_be_bytes([high, low]);
                match Instruction::decode(word) {
                    Ok(instruction) => format!("{address:#06x}  {word:04X}  {instruction}"),
                    Err(_) => format!("{address:#06x}  {word:04X}  db   {high:#04x}, {low:#04x}"),
                }
            }
            [byte] => format!("{address:#06x}  {byte:02X}    db   {byte:#04x}"),
            _ => unreachable!("chunks have one or two bytes"),
        }
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn disassemble_test() {
        let rom = [0x60, 0x05, 0x61, 0x03, 0x80, 0x14, 0x81, 0x28, 0x12, 0x00, 0xAB];
        let listing: Vec<String> = disassemble(&rom, C::PROGRAM_START).collect();
        assert_eq!(
            listing.join("\n"),
            indoc! {"
                0x0200  6005  ld   v0, 0x05
                0x0202  6103  ld   v1, 0x03
                0x0204  8014  add  v0, v1
                0x0206  8128  db   0x81, 0x28
                0x0208  1200  jp   0x200
                0x020a  AB    db   0xab"
            }
        );
    }
}
