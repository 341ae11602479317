use std::io::IsTerminal;
use std::process::exit;

use clap::{ArgAction, ArgGroup, Parser};
use tracing::error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod interactive;
mod screen;

use crate::commands::Subcommand;

#[derive(Parser)]
#[clap(name = "chip8", version, author, about, group = ArgGroup::new("format"))]
struct Opt {
    /// Increase the level of verbosity. Can be used multiple times.
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Force colored output. Default is to check if the output is a tty
    #[clap(short = 'c', long, global = true, group = "format")]
    color: bool,

    /// Force non-colored output. Default is to check if the output is a tty
    #[clap(short = 'C', long, global = true, group = "format")]
    no_color: bool,

    /// Use JSON output for log messages
    #[clap(short, long, global = true, group = "format")]
    json: bool,

    #[clap(subcommand)]
    command: Subcommand,
}

impl Opt {
    const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "chip8_emulator=debug,chip8=debug,info",
            2 => "chip8_emulator=trace,chip8=trace,info",
            3 => "chip8_emulator=trace,chip8=trace,debug",
            4..=u8::MAX => "trace",
        }
    }

    fn should_use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            std::io::stderr().is_terminal()
        }
    }

    fn filter_layer(&self) -> EnvFilter {
        // Parse log level from env
        EnvFilter::try_from_default_env()
            // or infer from args
            .unwrap_or_else(|_| EnvFilter::new(self.log_filter()))
    }

    /// Install the global subscriber. Logs go to stderr, so that stdout only
    /// carries the output of the command.
    fn init_tracing(&self) {
        let registry = tracing_subscriber::Registry::default().with(self.filter_layer());

        if self.json {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(self.should_use_colors())
                .with_target(false)
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
}

fn main() {
    let opt = Opt::parse();
    opt.init_tracing();

    if let Err(e) = opt.command.exec() {
        error!("{:#}", e);
        exit(1);
    }
}
