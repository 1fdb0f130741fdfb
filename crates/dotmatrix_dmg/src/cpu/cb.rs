use super::{Bus, Cpu, Flag};
use crate::error::CoreError;

impl Cpu {
    /// Execute one 0xCB-prefixed opcode. The byte splits into
    /// x (bits 6–7), y (bits 3–5), and z (bits 0–2): x selects the
    /// operation class, y the sub-operation or bit number, z the operand.
    pub(super) fn exec_cb<B: Bus>(&mut self, bus: &mut B) -> Result<u32, CoreError> {
        let cb = self.fetch8(bus)?;
        let x = cb >> 6;
        let y = (cb >> 3) & 0x07;
        let z = cb & 0x07;

        let cycles = match x {
            // Rotates, shifts, and SWAP. These write the operand back and
            // derive Z from the result.
            0 => {
                let value = self.read_r8(bus, z)?;
                let result = match y {
                    0 => self.rot_rlc(value),
                    1 => self.rot_rrc(value),
                    2 => self.rot_rl(value),
                    3 => self.rot_rr(value),
                    4 => self.shift_sla(value),
                    5 => self.shift_sra(value),
                    6 => self.swap_nibbles(value),
                    _ => self.shift_srl(value),
                };
                self.set_zero_from(result);
                self.write_r8(bus, z, result)?;
                if z == 6 {
                    16
                } else {
                    8
                }
            }

            // BIT y,r: Z from the complement of the tested bit, C kept.
            1 => {
                let value = self.read_r8(bus, z)?;
                self.regs.set_flag(Flag::Zero, value & (1 << y) == 0);
                self.regs.set_flag(Flag::Subtract, false);
                self.regs.set_flag(Flag::HalfCarry, true);
                if z == 6 {
                    12
                } else {
                    8
                }
            }

            // RES y,r / SET y,r: no flags.
            _ => {
                let value = self.read_r8(bus, z)?;
                let result = if x == 2 {
                    value & !(1 << y)
                } else {
                    value | (1 << y)
                };
                self.write_r8(bus, z, result)?;
                if z == 6 {
                    16
                } else {
                    8
                }
            }
        };

        Ok(cycles)
    }
}
