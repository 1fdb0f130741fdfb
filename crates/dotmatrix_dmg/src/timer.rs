use crate::bus::{Access, BusDevice};
use crate::cpu::irq;
use crate::CYCLES_PER_SECOND;

pub const DIV: u16 = 0xFF04;
pub const TIMA: u16 = 0xFF05;
pub const TMA: u16 = 0xFF06;
pub const TAC: u16 = 0xFF07;

/// DIV counts at 16384 Hz: one tick per 256 T-cycles.
const DIV_PERIOD: i64 = 256;

const TAC_ENABLE: u8 = 0x04;

/// Divider and timer unit.
///
/// DIV free-runs; TIMA counts at the TAC-selected rate while enabled,
/// reloading from TMA and requesting the timer interrupt on overflow.
/// Sub-tick time is carried in per-counter cycle accumulators.
pub struct Timer {
    div: u8,
    tima: u8,
    tma: u8,
    tac: u8,
    div_budget: i64,
    tima_budget: i64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        let mut timer = Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            div_budget: 0,
            tima_budget: 0,
        };
        timer.reset();
        timer
    }

    pub fn reset(&mut self) {
        self.div = 0xAB; // post-boot divider value
        self.tima = 0;
        self.tma = 0;
        self.tac = 0xF8;
        self.div_budget = 0;
        self.tima_budget = 0;
    }

    /// TIMA period in T-cycles for the current TAC rate bits.
    fn tima_period(&self) -> i64 {
        match self.tac & 0x03 {
            0 => 1024, // 4096 Hz
            1 => 16,   // 262144 Hz
            2 => 64,   // 65536 Hz
            _ => 256,  // 16384 Hz
        }
    }
}

impl BusDevice for Timer {
    fn handle(&mut self, access: Access, addr: u16, value: &mut u8) -> bool {
        match addr {
            DIV => {
                match access {
                    Access::Read => *value = self.div,
                    // Any write clears the divider.
                    Access::Write => self.div = 0,
                }
                true
            }
            TIMA => {
                match access {
                    Access::Read => *value = self.tima,
                    Access::Write => self.tima = *value,
                }
                true
            }
            TMA => {
                match access {
                    Access::Read => *value = self.tma,
                    Access::Write => self.tma = *value,
                }
                true
            }
            TAC => {
                match access {
                    Access::Read => *value = self.tac,
                    Access::Write => self.tac = *value,
                }
                true
            }
            _ => false,
        }
    }

    fn advance(&mut self, seconds: f64) -> u8 {
        let cycles = (seconds * CYCLES_PER_SECOND as f64) as i64;

        self.div_budget += cycles;
        while self.div_budget >= DIV_PERIOD {
            self.div = self.div.wrapping_add(1);
            self.div_budget -= DIV_PERIOD;
        }

        if self.tac & TAC_ENABLE == 0 {
            self.tima_budget = 0;
            return 0;
        }

        let period = self.tima_period();
        let mut mask = 0;
        self.tima_budget += cycles;
        while self.tima_budget >= period {
            self.tima_budget -= period;
            let (next, overflow) = self.tima.overflowing_add(1);
            if overflow {
                self.tima = self.tma;
                mask |= irq::TIMER;
                log::trace!("TIMA overflow, reloading {tma:#04x}", tma = self.tma);
            } else {
                self.tima = next;
            }
        }
        mask
    }
}
