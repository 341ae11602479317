use std::io::IsTerminal;

use anstyle::{AnsiColor, Style};
use camino::Utf8PathBuf;
use chip8_emulator::constants as C;
use chip8_emulator::runtime::Memory;
use chip8_emulator::Computer;
use clap::{Parser, ValueHint};
use miette::Report;

use crate::interactive::parse::parse_address;

const BYTES_PER_LINE: usize = 16;

#[derive(Parser, Debug)]
pub struct DumpOpt {
    /// Input file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// First address to dump
    #[clap(long, value_parser = parse_address, default_value = "0")]
    start: C::Address,

    /// Number of bytes to dump. Defaults to the rest of memory
    #[clap(long)]
    length: Option<usize>,
}

impl DumpOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let rom = super::read_rom(&self.input)?;
        let mut computer = Computer::with_seed(0);
        if let Err(e) = computer.load(&rom) {
            eprintln!("{:?}", Report::new(e));
            std::process::exit(1);
        }

        let start = usize::from(self.start);
        let length = self.length.unwrap_or(C::MEMORY_SIZE - start);
        let markers = if std::io::stdout().is_terminal() {
            Markers::colored()
        } else {
            Markers::default()
        };

        for line in hexdump(&computer.memory, start, length, &markers)? {
            println!("{line}");
        }
        Ok(())
    }
}

/// Styles of the lines marking the program and framebuffer origins
#[derive(Debug, Default)]
pub(crate) struct Markers {
    program: Style,
    framebuffer: Style,
}

impl Markers {
    fn colored() -> Self {
        Self {
            program: Style::new().bold().fg_color(Some(AnsiColor::Red.into())),
            framebuffer: Style::new().bold().fg_color(Some(AnsiColor::Green.into())),
        }
    }
}

/// Format `length` bytes of memory from `start`, 16 per line.
///
/// # Errors
///
/// Fails if the range is outside of memory
pub(crate) fn hexdump(
    memory: &Memory,
    start: usize,
    length: usize,
    markers: &Markers,
) -> anyhow::Result<Vec<String>> {
    let bytes = memory.slice(start, length)?;
    let mut lines = Vec::new();

    for (index, chunk) in bytes.chunks(BYTES_PER_LINE).enumerate() {
        let address = start + index * BYTES_PER_LINE;
        let range = address..address + chunk.len();

        for (origin, name, style) in [
            (C::PROGRAM_START, "program start", markers.program),
            (C::FRAMEBUFFER_START, "framebuffer start", markers.framebuffer),
        ] {
            let origin = usize::from(origin);
            if range.contains(&origin) {
                lines.push(format!(
                    "{}-- {name} ({origin:#06x}) --{}",
                    style.render(),
                    style.render_reset()
                ));
            }
        }

        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
        lines.push(format!("{address:#06x}  {}", hex.join(" ")));
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hexdump_test() {
        let mut memory = Memory::default();
        memory.write(C::PROGRAM_START, &[0x60, 0x05, 0x61]).unwrap();

        let lines = hexdump(&memory, 0x1F8, 0x14, &Markers::default()).unwrap();
        assert_eq!(
            lines.join("\n"),
            indoc! {"
                -- program start (0x0200) --
                0x01f8  00 00 00 00 00 00 00 00 60 05 61 00 00 00 00 00
                0x0208  00 00 00 00"
            }
        );

        let lines = hexdump(&memory, 0x200, 3, &Markers::default()).unwrap();
        assert_eq!(lines, ["-- program start (0x0200) --", "0x0200  60 05 61"]);
    }

    #[test]
    fn hexdump_framebuffer_test() {
        let memory = Memory::default();
        let start = usize::from(C::FRAMEBUFFER_START) - 16;
        let lines = hexdump(&memory, start, 32, &Markers::default()).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "-- framebuffer start (0x1e00) --");
    }

    #[test]
    fn hexdump_out_of_bounds_test() {
        let memory = Memory::default();
        assert!(hexdump(&memory, C::MEMORY_SIZE - 4, 8, &Markers::default()).is_err());
    }
}
