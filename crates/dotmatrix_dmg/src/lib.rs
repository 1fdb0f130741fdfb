pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod lcd;
pub mod machine;
pub mod timer;

pub use bus::MemoryBus;
pub use error::{BusError, CoreError};
pub use machine::DmgMachine;

/// Logical screen width in pixels for the Game Boy DMG.
pub const SCREEN_WIDTH: usize = 160;
/// Logical screen height in pixels.
pub const SCREEN_HEIGHT: usize = 144;

/// CPU clock rate in T-cycles per second.
pub const CYCLES_PER_SECOND: u32 = 4_194_304;

/// T-cycles in one complete frame (154 lines of 456 cycles).
pub const CYCLES_PER_FRAME: u32 = 70_224;
