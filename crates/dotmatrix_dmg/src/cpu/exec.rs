use super::{Bus, Cpu, Flag};
use crate::error::CoreError;

/// The eight accumulator operations selected by bits 3–5 of the 0x80–0xBF
/// block and of the d8 forms 0xC6/0xCE/…/0xFE.
#[derive(Clone, Copy, Debug)]
enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    #[inline]
    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// Opcodes with no defined encoding on the DMG.
const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

impl Cpu {
    /// Decode and execute one primary-table opcode; returns its T-cycle
    /// cost. PC already points past the opcode byte.
    pub(super) fn exec_opcode<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> Result<u32, CoreError> {
        if ILLEGAL_OPCODES.contains(&opcode) {
            return Err(self.fail_opcode(opcode, true));
        }

        let cycles = match opcode {
            0x00 => 4, // NOP

            // LD rr,d16
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch16(bus)?;
                self.write_r16(opcode >> 4, value);
                12
            }

            // LD (BC),A / LD (DE),A
            0x02 | 0x12 => {
                let addr = if opcode & 0x10 == 0 {
                    self.regs.bc()
                } else {
                    self.regs.de()
                };
                bus.write8(addr, self.regs.a())?;
                8
            }

            // LD A,(BC) / LD A,(DE)
            0x0A | 0x1A => {
                let addr = if opcode & 0x10 == 0 {
                    self.regs.bc()
                } else {
                    self.regs.de()
                };
                let value = bus.read8(addr)?;
                self.regs.set_a(value);
                8
            }

            // LD (HL+),A / LD (HL-),A
            0x22 | 0x32 => {
                let addr = self.regs.hl();
                bus.write8(addr, self.regs.a())?;
                self.bump_hl(opcode & 0x10 == 0);
                8
            }

            // LD A,(HL+) / LD A,(HL-)
            0x2A | 0x3A => {
                let addr = self.regs.hl();
                let value = bus.read8(addr)?;
                self.regs.set_a(value);
                self.bump_hl(opcode & 0x10 == 0);
                8
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                let index = opcode >> 4;
                self.write_r16(index, self.read_r16(index).wrapping_add(1));
                8
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let index = opcode >> 4;
                self.write_r16(index, self.read_r16(index).wrapping_sub(1));
                8
            }

            // INC r8 / INC (HL)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let index = (opcode >> 3) & 0x07;
                let value = self.read_r8(bus, index)?;
                let result = self.alu_inc8(value);
                self.write_r8(bus, index, result)?;
                if index == 6 {
                    12
                } else {
                    4
                }
            }

            // DEC r8 / DEC (HL)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let index = (opcode >> 3) & 0x07;
                let value = self.read_r8(bus, index)?;
                let result = self.alu_dec8(value);
                self.write_r8(bus, index, result)?;
                if index == 6 {
                    12
                } else {
                    4
                }
            }

            // LD r,d8 / LD (HL),d8
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let value = self.fetch8(bus)?;
                let index = (opcode >> 3) & 0x07;
                self.write_r8(bus, index, value)?;
                if index == 6 {
                    12
                } else {
                    8
                }
            }

            // Accumulator rotates. Unlike their CB twins these always
            // clear Z.
            0x07 => {
                let result = self.rot_rlc(self.regs.a());
                self.regs.set_a(result);
                4
            }
            0x0F => {
                let result = self.rot_rrc(self.regs.a());
                self.regs.set_a(result);
                4
            }
            0x17 => {
                let result = self.rot_rl(self.regs.a());
                self.regs.set_a(result);
                4
            }
            0x1F => {
                let result = self.rot_rr(self.regs.a());
                self.regs.set_a(result);
                4
            }

            // LD (a16),SP
            0x08 => {
                let addr = self.fetch16(bus)?;
                bus.write16(addr, self.regs.sp)?;
                20
            }

            // ADD HL,rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                self.alu_add16_hl(self.read_r16(opcode >> 4));
                8
            }

            // STOP (2-byte encoding; the padding byte is fetched and
            // discarded so PC matches hardware)
            0x10 => {
                let _ = self.fetch8(bus)?;
                self.stopped = true;
                4
            }

            // JR r8 / JR cc,r8
            0x18 => self.jump_relative(bus, true)?,
            0x20 | 0x28 | 0x30 | 0x38 => {
                let taken = self.condition((opcode >> 3) & 0x03);
                self.jump_relative(bus, taken)?
            }

            0x27 => {
                self.alu_daa();
                4
            }
            0x2F => {
                // CPL
                self.regs.set_a(!self.regs.a());
                self.regs.set_flag(Flag::Subtract, true);
                self.regs.set_flag(Flag::HalfCarry, true);
                4
            }
            0x37 => {
                // SCF
                self.regs.set_flag(Flag::Subtract, false);
                self.regs.set_flag(Flag::HalfCarry, false);
                self.regs.set_flag(Flag::Carry, true);
                4
            }
            0x3F => {
                // CCF
                let carry = self.regs.flag(Flag::Carry);
                self.regs.set_flag(Flag::Subtract, false);
                self.regs.set_flag(Flag::HalfCarry, false);
                self.regs.set_flag(Flag::Carry, !carry);
                4
            }

            0x76 => {
                // HALT. The CPU idles in 4-cycle slots until an enabled
                // interrupt becomes pending.
                self.halted = true;
                4
            }

            // LD r,r' block (0x76 carved out above)
            0x40..=0x7F => {
                let src = opcode & 0x07;
                let dst = (opcode >> 3) & 0x07;
                let value = self.read_r8(bus, src)?;
                self.write_r8(bus, dst, value)?;
                if src == 6 || dst == 6 {
                    8
                } else {
                    4
                }
            }

            // Accumulator arithmetic block
            0x80..=0xBF => {
                let value = self.read_r8(bus, opcode & 0x07)?;
                self.alu(AluOp::from_bits(opcode >> 3), value);
                if opcode & 0x07 == 6 {
                    8
                } else {
                    4
                }
            }

            // ALU with immediate operand
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.fetch8(bus)?;
                self.alu(AluOp::from_bits(opcode >> 3), value);
                8
            }

            // RET cc / RET / RETI
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                if self.condition((opcode >> 3) & 0x03) {
                    self.regs.pc = self.pop16(bus)?;
                    20
                } else {
                    8
                }
            }
            0xC9 => {
                self.regs.pc = self.pop16(bus)?;
                16
            }
            0xD9 => {
                // RETI re-enables interrupts without the EI delay.
                self.regs.pc = self.pop16(bus)?;
                self.ime = true;
                16
            }

            // POP rr / PUSH rr (AF in slot 3)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16(bus)?;
                match (opcode >> 4) & 0x03 {
                    0 => self.regs.set_bc(value),
                    1 => self.regs.set_de(value),
                    2 => self.regs.set_hl(value),
                    _ => self.regs.set_af(value),
                }
                12
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = match (opcode >> 4) & 0x03 {
                    0 => self.regs.bc(),
                    1 => self.regs.de(),
                    2 => self.regs.hl(),
                    _ => self.regs.af(),
                };
                self.push16(bus, value)?;
                16
            }

            // JP a16 / JP cc,a16 / JP HL
            0xC3 => {
                self.regs.pc = self.fetch16(bus)?;
                16
            }
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let target = self.fetch16(bus)?;
                if self.condition((opcode >> 3) & 0x03) {
                    self.regs.pc = target;
                    16
                } else {
                    12
                }
            }
            0xE9 => {
                self.regs.pc = self.regs.hl();
                4
            }

            // CALL a16 / CALL cc,a16
            0xCD => {
                let target = self.fetch16(bus)?;
                self.push16(bus, self.regs.pc)?;
                self.regs.pc = target;
                24
            }
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let target = self.fetch16(bus)?;
                if self.condition((opcode >> 3) & 0x03) {
                    self.push16(bus, self.regs.pc)?;
                    self.regs.pc = target;
                    24
                } else {
                    12
                }
            }

            // RST n: call into the fixed vector encoded in bits 3–5
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.push16(bus, self.regs.pc)?;
                self.regs.pc = (opcode & 0x38) as u16;
                16
            }

            // High-page loads: 0xFF00 + n / 0xFF00 + C
            0xE0 => {
                let offset = self.fetch8(bus)?;
                bus.write8(0xFF00 | offset as u16, self.regs.a())?;
                12
            }
            0xF0 => {
                let offset = self.fetch8(bus)?;
                let value = bus.read8(0xFF00 | offset as u16)?;
                self.regs.set_a(value);
                12
            }
            0xE2 => {
                bus.write8(0xFF00 | self.regs.c() as u16, self.regs.a())?;
                8
            }
            0xF2 => {
                let value = bus.read8(0xFF00 | self.regs.c() as u16)?;
                self.regs.set_a(value);
                8
            }

            // LD (a16),A / LD A,(a16)
            0xEA => {
                let addr = self.fetch16(bus)?;
                bus.write8(addr, self.regs.a())?;
                16
            }
            0xFA => {
                let addr = self.fetch16(bus)?;
                let value = bus.read8(addr)?;
                self.regs.set_a(value);
                16
            }

            // Stack-pointer arithmetic
            0xE8 => {
                let imm = self.fetch8(bus)?;
                self.regs.sp = self.alu_add16_signed(self.regs.sp, imm);
                16
            }
            0xF8 => {
                let imm = self.fetch8(bus)?;
                let value = self.alu_add16_signed(self.regs.sp, imm);
                self.regs.set_hl(value);
                12
            }
            0xF9 => {
                self.regs.sp = self.regs.hl();
                8
            }

            // Interrupt master enable. DI is immediate; EI lands after
            // the next instruction.
            0xF3 => {
                self.ime = false;
                self.cancel_ei_delay();
                4
            }
            0xFB => {
                self.request_ei();
                4
            }

            0xCB => self.exec_cb(bus)?,

            _ => return Err(self.fail_opcode(opcode, false)),
        };

        Ok(cycles)
    }

    fn alu(&mut self, op: AluOp, value: u8) {
        match op {
            AluOp::Add => self.alu_add(value, false),
            AluOp::Adc => self.alu_add(value, true),
            AluOp::Sub => self.alu_sub(value, false),
            AluOp::Sbc => self.alu_sub(value, true),
            AluOp::And => self.alu_and(value),
            AluOp::Xor => self.alu_xor(value),
            AluOp::Or => self.alu_or(value),
            AluOp::Cp => self.alu_cp(value),
        }
    }

    /// HL post-increment/decrement used by the (HL+)/(HL-) loads.
    #[inline]
    fn bump_hl(&mut self, increment: bool) {
        let hl = self.regs.hl();
        self.regs.set_hl(if increment {
            hl.wrapping_add(1)
        } else {
            hl.wrapping_sub(1)
        });
    }

    /// JR: the displacement is signed and relative to the byte after the
    /// operand.
    fn jump_relative<B: Bus>(&mut self, bus: &mut B, taken: bool) -> Result<u32, CoreError> {
        let offset = self.fetch8(bus)? as i8;
        if taken {
            self.regs.pc = self.regs.pc.wrapping_add(offset as i16 as u16);
            Ok(12)
        } else {
            Ok(8)
        }
    }

    /// Build the error for an opcode the decoder rejected. PC has already
    /// moved past the opcode byte; report the fetch address.
    pub(super) fn fail_opcode(&self, opcode: u8, illegal: bool) -> CoreError {
        let pc = self.regs.pc.wrapping_sub(1);
        log::error!(
            "{} opcode {opcode:#04x} at {pc:#06x} after {} instructions",
            if illegal { "illegal" } else { "unknown" },
            self.instructions,
        );
        if illegal {
            CoreError::IllegalOpcode {
                opcode,
                pc,
                instructions: self.instructions,
            }
        } else {
            CoreError::UnknownOpcode {
                opcode,
                pc,
                instructions: self.instructions,
            }
        }
    }
}
