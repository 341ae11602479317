use std::num::NonZeroUsize;
use std::process::exit;

use camino::Utf8PathBuf;
use chip8_emulator::runtime::Keys;
use chip8_emulator::{Computer, ProcessorError};
use clap::{ArgAction, Parser, ValueHint};
use miette::Report;
use tracing::{debug, info};

use crate::interactive::parse::parse_keys;
use crate::interactive::run_interactive;
use crate::screen;

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Input file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Seed of the random number generator. Defaults to a random seed
    #[clap(long)]
    seed: Option<u64>,

    /// Maximum number of instructions to execute
    #[clap(long, default_value = "10000")]
    max_steps: usize,

    /// Number of instructions executed between two timer ticks
    #[clap(long, default_value = "10")]
    cycles_per_tick: NonZeroUsize,

    /// Keys held down during the run, as a mask where bit n is key n
    #[clap(long, value_parser = parse_keys)]
    keys: Option<Keys>,

    /// Run the program in interactive mode
    #[clap(short, long, action = ArgAction::SetTrue)]
    interactive: bool,

    /// Do not print the screen at the end of the program
    #[clap(long, action = ArgAction::SetTrue)]
    no_screen: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let rom = super::read_rom(&self.input)?;

        debug!(seed = ?self.seed, "Building computer");
        let mut computer = match self.seed {
            Some(seed) => Computer::with_seed(seed),
            None => Computer::default(),
        };

        if let Err(e) = computer.load(&rom) {
            eprintln!("{:?}", Report::new(e));
            exit(1);
        }

        if let Some(keys) = self.keys {
            computer.set_keys(keys);
        }

        if self.interactive {
            info!("Running program");
            return run_interactive(&mut computer);
        }

        info!(max_steps = self.max_steps, "Running program");
        let res = self.run_headless(&mut computer);

        if !self.no_screen {
            println!("{}", screen::render(&computer.framebuffer()));
        }
        info!(registers = %computer.registers, cycles = computer.cycles, "End of program");

        if let Err(e) = res {
            eprintln!("{:?}", Report::new(e));
            exit(1);
        }

        Ok(())
    }

    /// Step until the step limit, ticking the timers along the way
    fn run_headless(&self, computer: &mut Computer) -> Result<(), ProcessorError> {
        let mut steps = 0;
        while steps < self.max_steps {
            let chunk = self.cycles_per_tick.get().min(self.max_steps - steps);
            steps += computer.run(chunk)?;
            computer.tick_timers();
        }

        Ok(())
    }
}
