//! Text rendering of the screen

use chip8_emulator::runtime::Framebuffer;

const LIT: char = '█';
const UNLIT: char = ' ';

/// Draw the framebuffer with box-drawing borders, one character per pixel
pub(crate) fn render(framebuffer: &Framebuffer<'_>) -> String {
    let width = framebuffer.width();
    let border = "─".repeat(width);

    let mut out = String::new();
    out.push('┌');
    out.push_str(&border);
    out.push_str("┐\n");

    for y in 0..framebuffer.height() {
        out.push('│');
        out.extend((0..width).map(|x| if framebuffer.pixel(x, y) { LIT } else { UNLIT }));
        out.push_str("│\n");
    }

    out.push('└');
    out.push_str(&border);
    out.push('┘');
    out
}
