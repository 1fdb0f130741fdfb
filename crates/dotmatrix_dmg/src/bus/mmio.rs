use super::MemoryBus;
use crate::cpu::{IE_ADDR, IF_ADDR};
use crate::error::BusError;

/// Access class of an internally stored IO register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RegisterClass {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Classify the IO registers the bus stores itself (everything a device
/// has not claimed). `None` means the address is unmapped.
///
/// The sound block is stored but not interpreted (the APU is an external
/// collaborator); its frequency-low registers are write-only and the PCM
/// amplitude taps read-only, per the published IO map.
fn classify(addr: u16) -> Option<RegisterClass> {
    use RegisterClass::*;

    match addr {
        // Joypad and serial: external devices may claim these; until one
        // does, plain storage keeps polling loops harmless.
        0xFF00..=0xFF02 => Some(ReadWrite),

        // Divider/timer block, normally claimed by the Timer device.
        0xFF04..=0xFF07 => Some(ReadWrite),

        IF_ADDR => Some(ReadWrite),

        // Sound registers NR10–NR52.
        0xFF13 | 0xFF18 | 0xFF1D => Some(WriteOnly),
        0xFF10..=0xFF14 | 0xFF16..=0xFF1E | 0xFF20..=0xFF26 => Some(ReadWrite),

        // Wave pattern RAM.
        0xFF30..=0xFF3F => Some(ReadWrite),

        // PCM amplitude taps.
        0xFF76 | 0xFF77 => Some(ReadOnly),

        IE_ADDR => Some(ReadWrite),

        _ => None,
    }
}

/// Registers that exist on later hardware (speed switch, VRAM banking,
/// HDMA, palette ports) but have no DMG behavior here. Strict accesses
/// report them as unimplemented rather than unmapped.
fn is_unimplemented(addr: u16) -> bool {
    matches!(addr, 0xFF4D | 0xFF4F | 0xFF51..=0xFF56 | 0xFF68..=0xFF6D | 0xFF70)
}

impl MemoryBus {
    /// Read an internally stored IO register.
    pub(super) fn io_read(&self, addr: u16) -> Result<u8, BusError> {
        match classify(addr) {
            Some(RegisterClass::ReadWrite) | Some(RegisterClass::ReadOnly) => {
                Ok(self.io_byte(addr))
            }
            Some(RegisterClass::WriteOnly) => Err(BusError::WriteOnlyViolation { addr }),
            None if is_unimplemented(addr) => Err(BusError::NotImplemented { addr }),
            None => Err(BusError::UnmappedAddress { addr }),
        }
    }

    /// Write an internally stored IO register.
    pub(super) fn io_write(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        match classify(addr) {
            Some(RegisterClass::ReadWrite) | Some(RegisterClass::WriteOnly) => {
                self.set_io_byte(addr, value);
                Ok(())
            }
            Some(RegisterClass::ReadOnly) => Err(BusError::ReadOnlyViolation { addr }),
            None if is_unimplemented(addr) => Err(BusError::NotImplemented { addr }),
            None => {
                log::warn!("write of {value:#04x} to unmapped address {addr:#06x}");
                Err(BusError::UnmappedAddress { addr })
            }
        }
    }

    #[inline]
    fn io_byte(&self, addr: u16) -> u8 {
        match addr {
            IE_ADDR => self.ie,
            // The upper three IF bits do not exist and read as 1.
            IF_ADDR => self.io[(IF_ADDR - 0xFF00) as usize] | 0xE0,
            _ => self.io[(addr - 0xFF00) as usize],
        }
    }

    #[inline]
    fn set_io_byte(&mut self, addr: u16, value: u8) {
        match addr {
            IE_ADDR => self.ie = value,
            IF_ADDR => self.io[(IF_ADDR - 0xFF00) as usize] = value & 0x1F,
            _ => self.io[(addr - 0xFF00) as usize] = value,
        }
    }

    /// Power-on state: IO defaults the boot ROM leaves behind, and RAM
    /// filled with a fixed-seed xorshift pattern. Hardware RAM comes up
    /// effectively random; a deterministic non-zero fill keeps runs
    /// reproducible while still punishing code that assumes zeroed RAM.
    pub(super) fn apply_power_on_state(&mut self) {
        let mut x: u32 = 0xC0DE_1234;
        let mut next_byte = || {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        };

        for byte in self.wram.iter_mut() {
            *byte = next_byte();
        }
        for byte in self.hram.iter_mut() {
            *byte = next_byte();
        }

        // Joypad: no group selected, unused bits high.
        self.io[0x00] = 0xCF;
        // Serial.
        self.io[0x01] = 0x00;
        self.io[0x02] = 0x7E;
        // Interrupts: the boot ROM leaves a VBlank request pending.
        self.io[0x0F] = 0x01;
        self.ie = 0x00;
        // Sound block defaults, visible to software even without an APU.
        self.io[0x10] = 0x80;
        self.io[0x11] = 0xBF;
        self.io[0x12] = 0xF3;
        self.io[0x13] = 0xFF;
        self.io[0x14] = 0xBF;
        self.io[0x16] = 0x3F;
        self.io[0x17] = 0x00;
        self.io[0x18] = 0xFF;
        self.io[0x19] = 0xBF;
        self.io[0x1A] = 0x7F;
        self.io[0x1B] = 0xFF;
        self.io[0x1C] = 0x9F;
        self.io[0x1D] = 0xFF;
        self.io[0x1E] = 0xBF;
        self.io[0x20] = 0xFF;
        self.io[0x21] = 0x00;
        self.io[0x22] = 0x00;
        self.io[0x23] = 0xBF;
        self.io[0x24] = 0x77;
        self.io[0x25] = 0xF3;
        self.io[0x26] = 0xF1;
    }
}
