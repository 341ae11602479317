//! Core of a CHIP-8 style virtual machine: memory, registers, instruction decoding and execution.

pub mod constants;
pub mod runtime;

pub use self::runtime::{Computer, Fault, Instruction, Keys, ProcessorError};
