use thiserror::Error;

use crate::constants::{
    Address, FRAMEBUFFER_HEIGHT, FRAMEBUFFER_START, FRAMEBUFFER_WIDTH, FRAMEBUFFER_WIDTH_BYTES,
    MEMORY_SIZE, Word,
};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address was invalid
    #[error("invalid address {0:#06x}")]
    InvalidAddress(usize),

    /// The given range does not fit in memory
    #[error("invalid range of {len} bytes at {start:#06x}")]
    InvalidRange { start: usize, len: usize },
}

/// Holds the bytes of the computer memory.
///
/// The last [`crate::constants::FRAMEBUFFER_SIZE`] bytes hold the video memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[u8; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ [{MEMORY_SIZE} bytes] }}")
    }
}

impl Memory {
    /// Get a byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: usize) -> Result<u8, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::InvalidAddress(address))
    }

    /// Get a mutable reference to a byte at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get_mut(&mut self, address: usize) -> Result<&mut u8, MemoryError> {
        self.inner
            .get_mut(address)
            .ok_or(MemoryError::InvalidAddress(address))
    }

    /// Get the big-endian word at an address
    ///
    /// # Errors
    ///
    /// It fails if any of the two bytes is out of bounds.
    pub fn get_word(&self, address: usize) -> Result<Word, MemoryError> {
        let bytes = self
            .slice(address, 2)
            .map_err(|_| MemoryError::InvalidAddress(address))?;
        Ok(Word::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Get `len` bytes starting at `start`
    ///
    /// # Errors
    ///
    /// It fails if any byte of the range is out of bounds.
    pub fn slice(&self, start: usize, len: usize) -> Result<&[u8], MemoryError> {
        start
            .checked_add(len)
            .and_then(|end| self.inner.get(start..end))
            .ok_or(MemoryError::InvalidRange { start, len })
    }

    /// Get `len` bytes starting at `start`, mutably
    ///
    /// # Errors
    ///
    /// It fails if any byte of the range is out of bounds.
    pub fn slice_mut(&mut self, start: usize, len: usize) -> Result<&mut [u8], MemoryError> {
        start
            .checked_add(len)
            .and_then(|end| self.inner.get_mut(start..end))
            .ok_or(MemoryError::InvalidRange { start, len })
    }

    /// Copy bytes at an address
    ///
    /// # Errors
    ///
    /// Nothing is written if the data does not fit.
    pub fn write(&mut self, start: Address, data: &[u8]) -> Result<(), MemoryError> {
        self.slice_mut(start.into(), data.len())?
            .copy_from_slice(data);
        Ok(())
    }

    /// Read-only view of the video memory
    #[must_use]
    pub fn framebuffer(&self) -> Framebuffer<'_> {
        Framebuffer {
            bytes: &self.inner[usize::from(FRAMEBUFFER_START)..],
        }
    }

    pub(crate) fn framebuffer_mut(&mut self) -> FramebufferMut<'_> {
        FramebufferMut {
            bytes: &mut self.inner[usize::from(FRAMEBUFFER_START)..],
        }
    }
}

/// Locate the byte and bit mask of a pixel. Coordinates wrap around the screen.
fn pixel_position(x: usize, y: usize) -> (usize, u8) {
    let x = x % FRAMEBUFFER_WIDTH;
    let y = y % FRAMEBUFFER_HEIGHT;
    let offset = y * FRAMEBUFFER_WIDTH_BYTES + x / 8;
    let mask = 0x80 >> (x % 8);
    (offset, mask)
}

/// A monochrome bitmap, one bit per pixel, most significant bit on the left
#[derive(Debug, Clone, Copy)]
pub struct Framebuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> Framebuffer<'a> {
    /// Width in pixels
    #[must_use]
    pub const fn width(&self) -> usize {
        FRAMEBUFFER_WIDTH
    }

    /// Height in pixels
    #[must_use]
    pub const fn height(&self) -> usize {
        FRAMEBUFFER_HEIGHT
    }

    /// Whether a pixel is lit. Coordinates wrap around the screen.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let (offset, mask) = pixel_position(x, y);
        self.bytes[offset] & mask != 0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

pub(crate) struct FramebufferMut<'a> {
    bytes: &'a mut [u8],
}

impl FramebufferMut<'_> {
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// XOR a sprite on the screen, one byte per row.
    ///
    /// Returns `true` if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, line) in sprite.iter().enumerate() {
            for column in 0..8 {
                if line & (0x80 >> column) == 0 {
                    continue;
                }

                let (offset, mask) = pixel_position(x + column, y + row);
                let byte = &mut self.bytes[offset];
                collision |= *byte & mask != 0;
                *byte ^= mask;
            }
        }
        collision
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::constants::FRAMEBUFFER_SIZE;

    #[test]
    fn bounds_test() {
        let mut memory = Memory::default();
        assert_eq!(memory.get(MEMORY_SIZE - 1), Ok(0));
        assert_eq!(
            memory.get(MEMORY_SIZE),
            Err(MemoryError::InvalidAddress(MEMORY_SIZE))
        );
        assert!(memory.get_mut(MEMORY_SIZE).is_err());
        assert!(memory.slice(MEMORY_SIZE - 2, 2).is_ok());
        assert_eq!(
            memory.slice(MEMORY_SIZE - 2, 3),
            Err(MemoryError::InvalidRange {
                start: MEMORY_SIZE - 2,
                len: 3
            })
        );
        assert!(memory.slice(usize::MAX, 2).is_err());
        assert_eq!(memory.get_word(MEMORY_SIZE - 2), Ok(0));
        assert_eq!(
            memory.get_word(MEMORY_SIZE - 1),
            Err(MemoryError::InvalidAddress(MEMORY_SIZE - 1))
        );
    }

    #[test]
    fn write_test() {
        let mut memory = Memory::default();
        memory.write(0x10, &[1, 2, 3]).unwrap();
        assert_eq!(memory.slice(0x0F, 5).unwrap(), &[0, 1, 2, 3, 0]);
        assert_eq!(memory.get_word(0x11), Ok(0x0203));

        // Nothing is written if it overflows
        let top = u16::try_from(MEMORY_SIZE - 1).unwrap();
        assert!(memory.write(top, &[9, 9]).is_err());
        assert_eq!(memory.get(MEMORY_SIZE - 1), Ok(0));
    }

    #[test]
    fn framebuffer_layout_test() {
        let mut memory = Memory::default();
        let fb = memory.framebuffer();
        assert_eq!(fb.as_bytes().len(), FRAMEBUFFER_SIZE);
        assert_eq!(fb.width() * fb.height(), FRAMEBUFFER_SIZE * 8);
        assert_eq!(fb.width(), 128);
        assert_eq!(fb.height(), 32);

        // Second row, 10th pixel
        *memory
            .get_mut(usize::from(FRAMEBUFFER_START) + FRAMEBUFFER_WIDTH_BYTES + 1)
            .unwrap() = 0b0100_0000;
        let fb = memory.framebuffer();
        assert!(fb.pixel(9, 1));
        assert!(!fb.pixel(8, 1));
        assert!(fb.pixel(9 + FRAMEBUFFER_WIDTH, 1 + FRAMEBUFFER_HEIGHT));
    }

    #[test]
    fn draw_sprite_test() {
        let mut memory = Memory::default();
        let collision = memory.framebuffer_mut().draw_sprite(4, 0, &[0xFF, 0x81]);
        assert!(!collision);

        let fb = memory.framebuffer();
        assert_eq!(fb.as_bytes()[0], 0x0F);
        assert_eq!(fb.as_bytes()[1], 0xF0);
        assert_eq!(fb.as_bytes()[FRAMEBUFFER_WIDTH_BYTES], 0x08);
        assert_eq!(fb.as_bytes()[FRAMEBUFFER_WIDTH_BYTES + 1], 0x10);

        // Drawing again erases the sprite and reports a collision
        let collision = memory.framebuffer_mut().draw_sprite(4, 0, &[0xFF, 0x81]);
        assert!(collision);
        assert!(memory.framebuffer().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn draw_sprite_wraps_test() {
        let mut memory = Memory::default();
        let x = FRAMEBUFFER_WIDTH - 4;
        let y = FRAMEBUFFER_HEIGHT - 1;
        memory.framebuffer_mut().draw_sprite(x, y, &[0xFF, 0xFF]);

        let fb = memory.framebuffer();
        // Right half of the first line wrapped to the left edge
        assert!(fb.pixel(FRAMEBUFFER_WIDTH - 1, y));
        assert!(fb.pixel(0, y));
        assert!(fb.pixel(3, y));
        assert!(!fb.pixel(4, y));
        // Second line wrapped to the top
        assert!(fb.pixel(0, 0));
        assert!(fb.pixel(FRAMEBUFFER_WIDTH - 4, 0));
    }

    #[test]
    fn clear_test() {
        let mut memory = Memory::default();
        memory.framebuffer_mut().draw_sprite(0, 0, &[0xAA; 8]);
        memory.framebuffer_mut().clear();
        assert!(memory.framebuffer().as_bytes().iter().all(|&b| b == 0));
    }
}
