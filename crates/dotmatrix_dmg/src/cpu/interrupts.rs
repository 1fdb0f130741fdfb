use super::{irq, Bus, Cpu, IE_ADDR, IF_ADDR};
use crate::error::CoreError;

/// Interrupt entry costs 5 machine cycles.
const DISPATCH_CYCLES: u32 = 20;

impl Cpu {
    /// EI requested: interrupts turn on after the *following* instruction
    /// retires, so the request passes through two stages.
    pub(super) fn request_ei(&mut self) {
        if !self.ime {
            self.ei_pending = true;
        }
    }

    /// DI cancels an in-flight EI.
    pub(super) fn cancel_ei_delay(&mut self) {
        self.ei_pending = false;
        self.ei_armed = false;
    }

    /// Advance the EI pipeline by one retired instruction.
    pub(super) fn apply_ei_delay(&mut self) {
        if self.ei_armed {
            self.ime = true;
            self.ei_armed = false;
        } else if self.ei_pending {
            self.ei_pending = false;
            self.ei_armed = true;
        }
    }

    /// Take the highest-priority enabled pending interrupt, if IME allows.
    ///
    /// Returns the extra cycles consumed (0 or 20). Dispatch clears the
    /// serviced IF bit and IME, pushes PC, and jumps to the vector:
    /// VBlank 0x40, LCD STAT 0x48, Timer 0x50, Serial 0x58, Joypad 0x60.
    pub(super) fn service_interrupts<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CoreError> {
        if !self.ime {
            return Ok(0);
        }

        let iflags = bus.read8(IF_ADDR)?;
        let pending = iflags & bus.read8(IE_ADDR)? & irq::ALL;
        if pending == 0 {
            return Ok(0);
        }

        // Lowest-numbered bit wins: VBlank over STAT over Timer over
        // Serial over Joypad.
        let index = pending.trailing_zeros() as u16;
        bus.write8(IF_ADDR, iflags & !(1 << index))?;

        self.ime = false;
        self.halted = false;
        self.push16(bus, self.regs.pc)?;
        self.regs.pc = 0x0040 + index * 8;

        log::debug!(
            "interrupt dispatch: line {index} -> {pc:#06x} (IF was {iflags:#04x})",
            pc = self.regs.pc,
        );

        Ok(DISPATCH_CYCLES)
    }
}
