use crate::bus::{Access, BusDevice};

pub const ROM_BASE: u16 = 0x0000;
pub const ROM_LAST: u16 = 0x7FFF;
pub const RAM_BASE: u16 = 0xA000;
pub const RAM_LAST: u16 = 0xBFFF;
const RAM_SIZE: usize = 0x2000;

/// Flat (bank-switch-free) cartridge: up to 32 KiB of ROM plus 8 KiB of
/// external RAM. Mapper hardware (MBC1/3/5) is an external concern; writes
/// to the ROM area, which would be mapper control on a banked cartridge,
/// are accepted and dropped.
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Box<[u8; RAM_SIZE]>,
}

impl Cartridge {
    pub fn new(rom: impl Into<Vec<u8>>) -> Self {
        let rom = rom.into();
        let mapper = rom.get(0x147).copied().unwrap_or(0);
        if mapper != 0 {
            log::warn!(
                "cartridge type {mapper:#04x} wants a mapper; treating ROM as flat 32 KiB"
            );
        }
        Self {
            rom,
            ram: Box::new([0; RAM_SIZE]),
        }
    }

    pub fn rom_len(&self) -> usize {
        self.rom.len()
    }
}

impl BusDevice for Cartridge {
    fn handle(&mut self, access: Access, addr: u16, value: &mut u8) -> bool {
        match addr {
            ROM_BASE..=ROM_LAST => {
                match access {
                    // Past-the-end reads float high.
                    Access::Read => *value = self.rom.get(addr as usize).copied().unwrap_or(0xFF),
                    Access::Write => {}
                }
                true
            }
            RAM_BASE..=RAM_LAST => {
                let index = (addr - RAM_BASE) as usize;
                match access {
                    Access::Read => *value = self.ram[index],
                    Access::Write => self.ram[index] = *value,
                }
                true
            }
            _ => false,
        }
    }
}
