#![allow(clippy::missing_errors_doc)]

use serde::Serialize;
use tsify::Tsify;
use wasm_bindgen::prelude::*;

use chip8_emulator::runtime::{Instruction, Keys, State};

#[wasm_bindgen(start)]
fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    format!("{e}").into()
}

#[wasm_bindgen]
pub struct Computer {
    computer: chip8_emulator::Computer,
}

#[derive(Serialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Registers {
    v: Vec<u8>,
    i: u16,
    pc: u16,
    sp: usize,
    delay: u8,
    sound: u8,
    cycles: usize,
    state: String,
}

#[wasm_bindgen]
impl Computer {
    /// Create a computer. Without a seed, the random number generator is seeded by the browser.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| js_sys::Math::random().to_bits());
        Self {
            computer: chip8_emulator::Computer::with_seed(seed),
        }
    }

    /// Reset the computer and load a program
    pub fn load(&mut self, rom: &[u8]) -> Result<(), JsValue> {
        self.computer.reset();
        self.computer.load(rom).map_err(to_js)
    }

    pub fn step(&mut self) -> Result<(), JsValue> {
        self.computer.step().map_err(to_js)
    }

    /// Execute up to `limit` instructions, returns how many were executed
    pub fn run(&mut self, limit: u32) -> Result<u32, JsValue> {
        let limit = usize::try_from(limit).map_err(to_js)?;
        let executed = self.computer.run(limit).map_err(to_js)?;
        u32::try_from(executed).map_err(to_js)
    }

    /// Packed pixels of the screen, one bit per pixel, row by row
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn framebuffer(&self) -> Vec<u8> {
        self.computer.framebuffer().as_bytes().to_vec()
    }

    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn width(&self) -> usize {
        self.computer.framebuffer().width()
    }

    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.computer.framebuffer().height()
    }

    /// Set the pressed keys, bit `n` being key `n`
    #[wasm_bindgen(js_name = setKeys)]
    pub fn set_keys(&mut self, mask: u16) {
        self.computer.set_keys(Keys::from_bits_truncate(mask));
    }

    #[wasm_bindgen(js_name = tickTimers)]
    pub fn tick_timers(&mut self) {
        self.computer.tick_timers();
    }

    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn registers(&self) -> Registers {
        let computer = &self.computer;
        let timers = computer.timers();
        Registers {
            v: computer.registers.v.to_vec(),
            i: computer.registers.i,
            pc: computer.registers.pc,
            sp: computer.stack.sp(),
            delay: timers.delay,
            sound: timers.sound,
            cycles: computer.cycles,
            state: computer.state().to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn faulted(&self) -> bool {
        matches!(self.computer.state(), State::Faulted(_))
    }

    /// Decode the instruction at an address
    pub fn disassemble(&self, address: u16) -> Result<String, JsValue> {
        let word = self
            .computer
            .memory
            .get_word(address.into())
            .map_err(to_js)?;
        let instruction = Instruction::decode(word).map_err(to_js)?;
        Ok(instruction.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chip8_emulator::constants as C;

    use super::*;

    #[test]
    fn registers_test() {
        let mut computer = Computer::new(Some(0));
        computer.load(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x14]).unwrap();
        assert_eq!(computer.run(3).unwrap(), 3);

        let registers = computer.registers();
        assert_eq!(&registers.v[..2], &[8, 3]);
        assert_eq!(registers.pc, C::PROGRAM_START + 6);
        assert_eq!(registers.cycles, 3);
        assert_eq!(registers.state, "running");
        assert!(!computer.faulted());

        assert_eq!(computer.disassemble(C::PROGRAM_START + 4).unwrap(), "add  v0, v1");
        assert_eq!(computer.width() * computer.height() / 8, computer.framebuffer().len());
    }
}
