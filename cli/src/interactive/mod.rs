//! Interactive debugger.
//!
//! Lines are edited with rustyline, then split into words and parsed as
//! commands with clap. Values inside commands are parsed with nom.

use std::collections::BTreeSet;

use chip8_emulator::constants as C;
use chip8_emulator::runtime::{Computer, Instruction, Keys, Reg, State};
use clap::Parser;
use rustyline::history::DefaultHistory;
use rustyline::{Behavior, CompletionType, Config, EditMode, Editor};
use tracing::{debug, info, warn};

use crate::commands::dump::{hexdump, Markers};
use crate::screen;

mod helper;
pub(crate) mod parse;
use self::helper::DebuggerHelper;

static HELP: &str = r#"
Run "help [command]" for command-specific help.
An empty line re-runs the last valid command."#;

#[derive(Parser, Clone, Debug)]
#[clap(
    help_template = "{about}\n\nCOMMANDS:\n{subcommands}\n{after-help}",
    after_help = HELP,
    disable_version_flag = true,
    infer_subcommands = true,
    no_binary_name = true,
)]
/// Debugger commands
enum Command {
    /// Execute the next instructions
    #[command(alias = "s")]
    Step {
        /// Number of steps to execute
        #[clap(default_value = "1")]
        number: u64,
    },

    /// Exit the debugger
    Exit,

    /// Show the state of registers
    Registers { register: Option<Reg> },

    /// Show a block of memory
    Memory {
        /// The address to show. Can be a number, a register or `i`, with an
        /// optional offset like `i + 2`.
        address: parse::Value,

        /// Number of bytes to show
        #[clap(default_value = "16")]
        number: usize,
    },

    /// Set a register, a timer or a byte in memory
    Set {
        /// Either `[address]`, a register, `i`, `pc`, `dt` or `st`
        target: parse::AssignmentTarget,

        /// The value to set
        value: parse::Value,
    },

    /// Show the next few instructions
    List {
        /// Number of instructions to show
        #[clap(default_value = "10")]
        number: u16,
    },

    /// Set a breakpoint
    Break {
        /// The address where to set the breakpoint
        address: parse::Value,
    },

    /// Remove a breakpoint
    Unbreak {
        /// The address of the breakpoint to remove
        address: parse::Value,
    },

    /// Run until the next breakpoint or fault
    Continue {
        /// Maximum number of instructions to execute
        limit: Option<u64>,
    },

    /// Show the screen
    Screen,

    /// Hold a key down
    Press {
        #[clap(value_parser = parse::parse_key)]
        key: u8,
    },

    /// Release a key
    Release {
        #[clap(value_parser = parse::parse_key)]
        key: u8,
    },

    /// Decrement the timers
    Tick {
        #[clap(default_value = "1")]
        number: u32,
    },

    /// Show informations about the current debugging session
    Info {
        #[clap(subcommand)]
        sub: Option<InfoCommand>,
    },
}

#[derive(Parser, Clone, Debug)]
enum InfoCommand {
    /// List active breakpoints
    Breakpoints,

    /// Show the number of instructions executed since the beginning of the program
    Cycles,

    /// Show the return addresses on the stack
    Stack,

    /// Show the delay and sound timers
    Timers,
}

impl Command {
    /// Whether the command changes the state of the computer
    const fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Step { .. }
                | Command::Set { .. }
                | Command::Continue { .. }
                | Command::Press { .. }
                | Command::Release { .. }
                | Command::Tick { .. }
        )
    }
}

/// Holds informations about a debugging session
#[derive(Debug, Default)]
struct Session {
    /// Active breakpoints, sorted by address
    breakpoints: BTreeSet<C::Address>,

    /// Current address for the `list` command
    list_address: Option<C::Address>,
}

impl Session {
    fn add_breakpoint(&mut self, address: C::Address) {
        if self.breakpoints.insert(address) {
            info!(address, "Setting a breakpoint");
        } else {
            warn!(address, "A breakpoint was already set");
        }
    }

    fn remove_breakpoint(&mut self, address: C::Address) {
        if self.breakpoints.remove(&address) {
            info!(address, "Removing breakpoint");
        } else {
            warn!(address, "No breakpoint was set here");
        }
    }

    fn has_breakpoint(&self, address: C::Address) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Reset the `list` command (after running an instruction)
    fn reset_list(&mut self) {
        self.list_address = None;
    }

    /// Offset the `list` command, returns the address to show
    fn offset_list(&mut self, computer: &Computer, count: u16) -> C::Address {
        let addr = self.list_address.unwrap_or(computer.registers.pc);
        self.list_address = Some(addr.wrapping_add(count.wrapping_mul(2)));
        addr
    }

    fn display_breakpoints(&self, computer: &Computer) {
        match self.breakpoints.len() {
            0 => info!("No breakpoints"),
            1 => info!("1 breakpoint:"),
            x => info!("{} breakpoints:", x),
        }

        for &addr in &self.breakpoints {
            self.display_instruction(computer, addr);
        }
    }

    /// Display an instruction at specified address
    fn display_instruction(&self, computer: &Computer, address: C::Address) {
        let is_current_line = computer.registers.pc == address;
        let has_breakpoint = self.has_breakpoint(address);

        let gutter = match (has_breakpoint, is_current_line) {
            (true, true) => "B>",
            (true, false) => "B ",
            (false, true) => " >",
            (false, false) => "  ",
        };

        // `None` if the address is out of memory or the word is not an instruction
        let instruction = computer
            .memory
            .get_word(address.into())
            .ok()
            .and_then(|word| Instruction::decode(word).ok());

        if let Some(instruction) = instruction {
            info!("{:<2} {:#06x}    {}", gutter, address, instruction);
        } else {
            info!("{:<2} {:#06x}    –", gutter, address);
        }
    }

    fn display_cycles(computer: &Computer) {
        info!("Cycles: {}", computer.cycles);
    }

    fn display_stack(computer: &Computer) {
        info!("Stack depth: {}/{}", computer.stack.sp(), C::STACK_SIZE);
        for (level, address) in computer.stack.entries().iter().enumerate().rev() {
            info!("  {level:>2}: {address:#06x}");
        }
    }

    fn display_timers(computer: &Computer) {
        let timers = computer.timers();
        info!(
            delay = timers.delay,
            sound = timers.sound,
            sounding = timers.is_sounding(),
            "Timers"
        );
    }
}

/// Addresses of `count` instructions from `start`, wrapping around the address space
fn instruction_addresses(start: C::Address, count: u16) -> impl Iterator<Item = C::Address> {
    (0..count).map(move |i| start.wrapping_add(i.wrapping_mul(2)))
}

/// Run one step, logging the fault if any. Returns `false` if the computer stopped.
fn step(computer: &mut Computer) -> bool {
    match computer.step() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = &e as &dyn std::error::Error, "Stopped");
            false
        }
    }
}

#[allow(clippy::too_many_lines)]
pub(crate) fn run_interactive(computer: &mut Computer) -> anyhow::Result<()> {
    info!("Running in interactive mode. Type \"help\" to list available commands.");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .behavior(Behavior::PreferTerm)
        .auto_add_history(true)
        .build();

    let mut session = Session::default();

    let mut rl: Editor<DebuggerHelper<Command>, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(DebuggerHelper::new()));

    let mut last_command: Option<Command> = None;

    'read: loop {
        // A macro to unwrap an error, log it and continue the loop
        macro_rules! warn_and_continue {
            ($e:expr) => {
                match $e {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!(error = %e);
                        continue 'read;
                    }
                }
            };
        }

        let Ok(readline) = rl.readline(">> ") else {
            info!("EOF, exiting");
            return Ok(());
        };

        let command = if readline.trim().is_empty() {
            if let Some(command) = &last_command {
                command.clone()
            } else {
                info!("Type \"help\" to get the list of available commands");
                continue 'read;
            }
        } else {
            let Ok(words) = shell_words::split(readline.as_str()) else {
                warn!("Invalid input");
                continue 'read;
            };

            let command = warn_and_continue!(Command::try_parse_from(words));
            last_command = Some(command.clone());
            command
        };

        debug!("Executing command: {:?}", command);

        let faulted = matches!(computer.state(), State::Faulted(_));
        if faulted && command.mutates() {
            warn!(state = %computer.state(), "Computer has faulted. Use \"exit\" to quit");
            continue 'read;
        }

        match command {
            Command::Exit => break,

            Command::Step { number } => {
                session.reset_list();
                for _ in 0..number {
                    if !step(computer) {
                        break;
                    }
                }
                session.display_instruction(computer, computer.registers.pc);
            }

            Command::Registers { register } => {
                if let Some(reg) = register {
                    info!("Register {} = {:#04x}", reg, computer.registers.get(reg));
                } else {
                    info!("Registers: {}", computer.registers);
                }
            }

            Command::Memory { address, number } => {
                let address = usize::from(address.evaluate(computer));
                let lines =
                    warn_and_continue!(hexdump(&computer.memory, address, number, &Markers::default()));
                for line in lines {
                    info!("{line}");
                }
            }

            Command::Set { target, value } => {
                let value = value.evaluate(computer);
                match target {
                    parse::AssignmentTarget::Memory(address) => {
                        let address = address.evaluate(computer);
                        let byte = warn_and_continue!(u8::try_from(value));
                        info!("Setting memory at address {address:#06x} to {byte:#04x}");
                        let cell = warn_and_continue!(computer.memory.get_mut(address.into()));
                        *cell = byte;
                    }

                    parse::AssignmentTarget::Register(reg) => {
                        let byte = warn_and_continue!(u8::try_from(value));
                        info!("Setting register {reg} to {byte:#04x}");
                        computer.registers.set(reg, byte);
                    }

                    parse::AssignmentTarget::Index => {
                        info!("Setting register i to {value:#06x}");
                        computer.registers.i = value;
                    }

                    parse::AssignmentTarget::ProgramCounter => {
                        info!("Setting register pc to {value:#06x}");
                        computer.registers.pc = value;
                        session.reset_list();
                    }

                    parse::AssignmentTarget::DelayTimer => {
                        let byte = warn_and_continue!(u8::try_from(value));
                        info!("Setting delay timer to {byte}");
                        computer.timers.delay = byte;
                    }

                    parse::AssignmentTarget::SoundTimer => {
                        let byte = warn_and_continue!(u8::try_from(value));
                        info!("Setting sound timer to {byte}");
                        computer.timers.sound = byte;
                    }
                }
            }

            Command::List { number } => {
                let addr = session.offset_list(computer, number);
                for address in instruction_addresses(addr, number) {
                    session.display_instruction(computer, address);
                }
            }

            Command::Break { address } => {
                session.add_breakpoint(address.evaluate(computer));
            }

            Command::Unbreak { address } => {
                session.remove_breakpoint(address.evaluate(computer));
            }

            Command::Continue { limit } => {
                session.reset_list();
                let mut executed = 0;
                loop {
                    if limit.is_some_and(|limit| executed >= limit) {
                        info!(executed, "Reached the instruction limit");
                        break;
                    }

                    if !step(computer) {
                        break;
                    }
                    executed += 1;

                    if session.has_breakpoint(computer.registers.pc) {
                        info!(address = computer.registers.pc, "Stopped at a breakpoint");
                        break;
                    }
                }
                session.display_instruction(computer, computer.registers.pc);
            }

            Command::Screen => {
                println!("{}", screen::render(&computer.framebuffer()));
            }

            Command::Press { key } => {
                info!(key, "Pressing key");
                computer.set_keys(computer.keys | Keys::key(key));
            }

            Command::Release { key } => {
                info!(key, "Releasing key");
                computer.set_keys(computer.keys - Keys::key(key));
            }

            Command::Tick { number } => {
                for _ in 0..number {
                    computer.tick_timers();
                }
                Session::display_timers(computer);
            }

            Command::Info { sub } => match sub {
                Some(InfoCommand::Breakpoints) => session.display_breakpoints(computer),
                Some(InfoCommand::Cycles) => Session::display_cycles(computer),
                Some(InfoCommand::Stack) => Session::display_stack(computer),
                Some(InfoCommand::Timers) => Session::display_timers(computer),
                None => {
                    info!(state = %computer.state());
                    session.display_breakpoints(computer);
                    info!("–");
                    Session::display_cycles(computer);
                    Session::display_stack(computer);
                    Session::display_timers(computer);
                }
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(line: &str) -> Command {
        let words = shell_words::split(line).unwrap();
        Command::try_parse_from(words).unwrap()
    }

    #[test]
    fn parse_command_test() {
        assert!(matches!(parse("step"), Command::Step { number: 1 }));
        assert!(matches!(parse("s 5"), Command::Step { number: 5 }));
        assert!(matches!(
            parse("reg vf"),
            Command::Registers {
                register: Some(Reg::VF)
            }
        ));
        assert!(matches!(parse("press a"), Command::Press { key: 0xA }));
        assert!(matches!(parse("cont 100"), Command::Continue { limit: Some(100) }));
        assert!(matches!(
            parse("info timers"),
            Command::Info {
                sub: Some(InfoCommand::Timers)
            }
        ));

        let Command::Set { target, value } = parse("set '[i + 1]' 0x42") else {
            panic!("expected a set command");
        };
        let computer = Computer::with_seed(0);
        assert!(matches!(target, parse::AssignmentTarget::Memory(_)));
        assert_eq!(value.evaluate(&computer), 0x42);

        assert!(Command::try_parse_from(["press", "g"]).is_err());
    }

    #[test]
    fn mutates_test() {
        assert!(parse("step").mutates());
        assert!(parse("tick").mutates());
        assert!(!parse("registers").mutates());
        assert!(!parse("screen").mutates());
        assert!(!parse("list").mutates());
    }

    #[test]
    fn list_test() {
        let computer = Computer::with_seed(0);
        let mut session = Session::default();
        assert_eq!(session.offset_list(&computer, 4), C::PROGRAM_START);
        assert_eq!(session.offset_list(&computer, 4), C::PROGRAM_START + 8);
        session.reset_list();
        assert_eq!(session.offset_list(&computer, 1), C::PROGRAM_START);

        // Long listings wrap around instead of overflowing
        session.reset_list();
        assert_eq!(session.offset_list(&computer, u16::MAX), C::PROGRAM_START);
        let addresses: Vec<_> = instruction_addresses(0xFFFE, 0x8001).collect();
        assert_eq!(addresses.len(), 0x8001);
        assert_eq!(&addresses[..2], &[0xFFFE, 0x0000]);
        assert_eq!(addresses[0x8000], 0xFFFE);
    }

    #[test]
    fn breakpoints_test() {
        let mut session = Session::default();
        session.add_breakpoint(0x204);
        session.add_breakpoint(0x200);
        session.add_breakpoint(0x204);
        assert!(session.has_breakpoint(0x200));
        assert_eq!(session.breakpoints.iter().copied().collect::<Vec<_>>(), [0x200, 0x204]);

        session.remove_breakpoint(0x200);
        assert!(!session.has_breakpoint(0x200));
    }
}
