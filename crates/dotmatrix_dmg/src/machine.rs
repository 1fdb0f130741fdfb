#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;

use dotmatrix_common::frame::FrameSink;

use crate::bus::{MemoryBus, UnusableRegion};
use crate::cartridge::Cartridge;
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::lcd::Lcd;
use crate::timer::Timer;
use crate::{CYCLES_PER_FRAME, CYCLES_PER_SECOND};

/// The assembled DMG: CPU plus bus, with the LCD, timer, and unusable
/// region attached as bus devices. The machine keeps shared handles to
/// the devices it has to tick and read frames from; the bus holds the
/// dispatching handles.
pub struct DmgMachine {
    pub cpu: Cpu,
    pub bus: MemoryBus,
    lcd: Rc<RefCell<Lcd>>,
    timer: Rc<RefCell<Timer>>,
}

impl Default for DmgMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DmgMachine {
    pub fn new() -> Self {
        let mut bus = MemoryBus::new();
        let lcd = Rc::new(RefCell::new(Lcd::new()));
        let timer = Rc::new(RefCell::new(Timer::new()));
        bus.attach_device(lcd.clone());
        bus.attach_device(timer.clone());
        bus.attach_device(Rc::new(RefCell::new(UnusableRegion)));

        Self {
            cpu: Cpu::new(),
            bus,
            lcd,
            timer,
        }
    }

    /// Attach a flat cartridge image. PC already points at the 0x0100
    /// entry point from reset.
    pub fn load_rom(&mut self, rom: &[u8]) {
        log::info!("loading ROM, {} bytes", rom.len());
        self.bus
            .attach_device(Rc::new(RefCell::new(Cartridge::new(rom))));
    }

    /// Return every component to its post-boot state. Attached devices
    /// (including a loaded cartridge's ROM mapping) stay attached.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.lcd.borrow_mut().reset();
        self.timer.borrow_mut().reset();
        self.bus.reset_io();
    }

    /// Run the machine for `seconds` of emulated time: the CPU first,
    /// then the bus devices, whose requested interrupts are fed back
    /// through the CPU's interrupt line.
    pub fn advance(&mut self, seconds: f64) -> Result<(), CoreError> {
        self.cpu.advance(&mut self.bus, seconds)?;
        let mask = self.bus.advance_devices(seconds);
        if mask != 0 {
            self.cpu.signal_interrupt(&mut self.bus, mask)?;
        }
        Ok(())
    }

    /// Advance by exactly one frame's worth of time (70224 T-cycles).
    pub fn step_frame(&mut self) -> Result<(), CoreError> {
        self.advance(CYCLES_PER_FRAME as f64 / CYCLES_PER_SECOND as f64)
    }

    /// Copy the most recently rendered frame into the driver's surface.
    pub fn render_frame(&self, sink: &mut dyn FrameSink) {
        self.lcd.borrow().blit(sink);
    }
}
