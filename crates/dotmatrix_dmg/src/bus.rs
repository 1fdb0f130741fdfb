mod device;
mod dma;
mod mmio;


use std::cell::RefCell;
use std::rc::Rc;

pub use device::{Access, BusDevice, UnusableRegion};

use crate::cpu;
use crate::error::BusError;

pub const WRAM_BASE: u16 = 0xC000;
pub const WRAM_SIZE: usize = 0x2000;
pub const ECHO_BASE: u16 = 0xE000;
pub const HRAM_BASE: u16 = 0xFF80;
pub const HRAM_SIZE: usize = 0x7F;

/// OAM DMA source-page register; writes trigger the 160-byte copy.
pub const DMA_ADDR: u16 = 0xFF46;

/// Resolution state of one bus address.
///
/// Every address starts `Unknown`. The first access probes the attached
/// devices and caches the single claimant (or `Unset`); later accesses
/// dispatch straight to the cached owner. This relies on the
/// [`BusDevice`] contract that Read requests are side-effect-free.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Claim {
    Unknown,
    Unset,
    Device(u8),
}

/// The DMG address space: flat work/high RAM, the echo alias, an ordered
/// list of attached devices, and internal storage for every IO register
/// byte no device claims.
pub struct MemoryBus {
    wram: Box<[u8; WRAM_SIZE]>,
    hram: [u8; HRAM_SIZE],
    devices: Vec<Rc<RefCell<dyn BusDevice>>>,
    claims: Vec<Claim>,
    io: [u8; 0x80],
    ie: u8,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        let mut bus = Self {
            wram: Box::new([0; WRAM_SIZE]),
            hram: [0; HRAM_SIZE],
            devices: Vec::new(),
            claims: vec![Claim::Unknown; 0x1_0000],
            io: [0; 0x80],
            ie: 0,
        };
        bus.apply_power_on_state();
        bus
    }

    /// Append a device to the dispatch order. Invalidates the whole
    /// address→device cache so the newcomer gets probed.
    pub fn attach_device(&mut self, device: Rc<RefCell<dyn BusDevice>>) {
        self.devices.push(device);
        self.claims.fill(Claim::Unknown);
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Re-apply the power-on RAM pattern and IO register defaults.
    /// Attached devices and the claim cache are untouched.
    pub fn reset_io(&mut self) {
        self.apply_power_on_state();
    }

    pub fn read8(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr {
            0xC000..=0xDFFF => Ok(self.wram[(addr - WRAM_BASE) as usize]),
            // Echo RAM aliases work RAM byte-for-byte.
            0xE000..=0xFDFF => Ok(self.wram[(addr - ECHO_BASE) as usize]),
            0xFF80..=0xFFFE => Ok(self.hram[(addr - HRAM_BASE) as usize]),
            _ => {
                if let Some(index) = self.resolve_device(addr)? {
                    let device = Rc::clone(&self.devices[index]);
                    let mut value = 0xFF;
                    if device.borrow_mut().handle(Access::Read, addr, &mut value) {
                        return Ok(value);
                    }
                }
                self.io_read(addr)
            }
        }
    }

    pub fn write8(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        match addr {
            0xC000..=0xDFFF => {
                self.wram[(addr - WRAM_BASE) as usize] = value;
                Ok(())
            }
            0xE000..=0xFDFF => {
                self.wram[(addr - ECHO_BASE) as usize] = value;
                Ok(())
            }
            0xFF80..=0xFFFE => {
                self.hram[(addr - HRAM_BASE) as usize] = value;
                Ok(())
            }
            _ => {
                if let Some(index) = self.resolve_device(addr)? {
                    let device = Rc::clone(&self.devices[index]);
                    let mut slot = value;
                    if device.borrow_mut().handle(Access::Write, addr, &mut slot) {
                        if addr == DMA_ADDR {
                            self.oam_dma(value)?;
                        }
                        return Ok(());
                    }
                }
                self.io_write(addr, value)
            }
        }
    }

    /// Little-endian word read as two byte reads, so words spanning two
    /// regions decode correctly.
    pub fn read16(&mut self, addr: u16) -> Result<u16, BusError> {
        let lo = self.read8(addr)?;
        let hi = self.read8(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn write16(&mut self, addr: u16, value: u16) -> Result<(), BusError> {
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr, lo)?;
        self.write8(addr.wrapping_add(1), hi)
    }

    /// Non-failing read for debuggers and tracing: returns the byte and
    /// whether the address was actually mapped. Unmapped or write-only
    /// locations read as 0xFF.
    pub fn safe_read8(&mut self, addr: u16) -> (u8, bool) {
        match self.read8(addr) {
            Ok(value) => (value, true),
            Err(_) => (0xFF, false),
        }
    }

    /// Tick every attached device by `seconds`; returns the OR of the
    /// interrupt masks they request.
    pub fn advance_devices(&mut self, seconds: f64) -> u8 {
        let mut mask = 0;
        for device in &self.devices {
            mask |= device.borrow_mut().advance(seconds);
        }
        mask
    }

    /// Find the device owning `addr`, probing and caching on first touch.
    ///
    /// Probes use Read requests in attach order; exactly one device may
    /// claim an address.
    fn resolve_device(&mut self, addr: u16) -> Result<Option<usize>, BusError> {
        match self.claims[addr as usize] {
            Claim::Device(index) => Ok(Some(index as usize)),
            Claim::Unset => Ok(None),
            Claim::Unknown => {
                let mut claimant = None;
                for (index, device) in self.devices.iter().enumerate() {
                    let mut probe = 0xFF;
                    if device.borrow_mut().handle(Access::Read, addr, &mut probe) {
                        if let Some(first) = claimant {
                            log::error!(
                                "devices {first} and {index} both claim {addr:#06x}"
                            );
                            return Err(BusError::OverlappingDevices {
                                addr,
                                first,
                                second: index,
                            });
                        }
                        claimant = Some(index);
                    }
                }
                self.claims[addr as usize] = match claimant {
                    Some(index) => Claim::Device(index as u8),
                    None => Claim::Unset,
                };
                Ok(claimant)
            }
        }
    }
}

impl cpu::Bus for MemoryBus {
    fn read8(&mut self, addr: u16) -> Result<u8, BusError> {
        MemoryBus::read8(self, addr)
    }

    fn write8(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        MemoryBus::write8(self, addr, value)
    }
}
