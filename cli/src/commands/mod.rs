use anyhow::Context;
use camino::Utf8Path;
use tracing::info;

mod completion;
mod disassemble;
pub(crate) mod dump;
mod run;

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Load and run a program
    Run(self::run::RunOpt),

    /// Print the instructions of a program
    Disassemble(self::disassemble::DisassembleOpt),

    /// Dump the memory after loading a program
    Dump(self::dump::DumpOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Subcommand::Run(opt) => opt.exec(),
            Subcommand::Disassemble(opt) => opt.exec(),
            Subcommand::Dump(opt) => opt.exec(),
            Subcommand::Completion(opt) => opt.exec(),
        }
    }
}

/// Read a program from disk
fn read_rom(path: &Utf8Path) -> anyhow::Result<Vec<u8>> {
    info!(%path, "Reading program");
    let rom = std::fs::read(path).with_context(|| format!("could not read {path}"))?;
    info!(size = rom.len(), "Program read");
    Ok(rom)
}
