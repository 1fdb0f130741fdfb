use thiserror::Error;

/// Memory bus failures.
///
/// All of these are fatal to the emulation session; the driver decides
/// whether to abort or report and stop. `MemoryBus::safe_read8` exists for
/// debuggers and never produces these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("no device or internal region claims address {addr:#06x}")]
    UnmappedAddress { addr: u16 },

    #[error("write to read-only register {addr:#06x}")]
    ReadOnlyViolation { addr: u16 },

    #[error("read from write-only register {addr:#06x}")]
    WriteOnlyViolation { addr: u16 },

    #[error("devices {first} and {second} both claim address {addr:#06x}")]
    OverlappingDevices {
        addr: u16,
        first: usize,
        second: usize,
    },

    #[error("access to {addr:#06x} is not implemented")]
    NotImplemented { addr: u16 },
}

/// CPU failures surfaced to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("illegal opcode {opcode:#04x} at {pc:#06x} after {instructions} instructions")]
    IllegalOpcode {
        opcode: u8,
        pc: u16,
        instructions: u64,
    },

    #[error("unknown opcode {opcode:#04x} at {pc:#06x} after {instructions} instructions")]
    UnknownOpcode {
        opcode: u8,
        pc: u16,
        instructions: u64,
    },

    #[error(transparent)]
    Bus(#[from] BusError),
}
