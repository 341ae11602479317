pub type Address = u16;
pub type Word = u16;

/// Total size of the computer memory
pub const MEMORY_SIZE: usize = 0x2000;

/// Where programs are loaded, and where %pc points on startup
pub const PROGRAM_START: Address = 0x0200;

/// Start of the video memory, which runs up to the end of memory
pub const FRAMEBUFFER_START: Address = 0x1E00;

/// Size of the video memory, in bytes
pub const FRAMEBUFFER_SIZE: usize = MEMORY_SIZE - FRAMEBUFFER_START as usize;

/// Number of bytes in one row of pixels
pub const FRAMEBUFFER_WIDTH_BYTES: usize = 0x10;

/// Width of the screen, in pixels
pub const FRAMEBUFFER_WIDTH: usize = FRAMEBUFFER_WIDTH_BYTES * 8;

/// Height of the screen, in pixels
pub const FRAMEBUFFER_HEIGHT: usize = FRAMEBUFFER_SIZE / FRAMEBUFFER_WIDTH_BYTES;

/// Maximum size of a program, so that it does not overlap the video memory
pub const PROGRAM_CAPACITY: usize = (FRAMEBUFFER_START - PROGRAM_START) as usize;

/// Number of return addresses the stack can hold
pub const STACK_SIZE: usize = 16;

/// Number of general purpose registers, including %vf
pub const REGISTER_COUNT: usize = 16;
