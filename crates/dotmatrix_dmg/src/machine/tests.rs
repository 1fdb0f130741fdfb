use once_cell::sync::Lazy;

use super::*;
use crate::cpu::{irq, IE_ADDR, IF_ADDR};
use crate::{CYCLES_PER_SECOND, SCREEN_HEIGHT, SCREEN_WIDTH};

use dotmatrix_common::frame::VecFrame;

/// A minimal flat ROM shared by the integration tests:
/// - 0x0100: NOP, then CALL 0x1234
/// - 0x0104: JR -2 (spin)
/// - 0x1234: RET
static TEST_ROM: Lazy<Vec<u8>> = Lazy::new(|| {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100] = 0x00;
    rom[0x0101..0x0104].copy_from_slice(&[0xCD, 0x34, 0x12]);
    rom[0x0104..0x0106].copy_from_slice(&[0x18, 0xFE]);
    rom[0x1234] = 0xC9;
    rom
});

fn seconds(cycles: u32) -> f64 {
    cycles as f64 / CYCLES_PER_SECOND as f64
}

fn machine_with_rom() -> DmgMachine {
    let mut machine = DmgMachine::new();
    machine.load_rom(&TEST_ROM);
    machine
}

#[test]
fn reset_then_fetch_executes_the_entry_point() {
    let mut machine = machine_with_rom();

    machine.advance(seconds(4)).unwrap();
    assert_eq!(machine.cpu.instructions_executed(), 1);
    assert_eq!(machine.cpu.regs.pc, 0x0101);
}

#[test]
fn call_and_return_through_the_real_bus() {
    let mut machine = machine_with_rom();
    machine.advance(seconds(4)).unwrap(); // NOP

    machine.advance(seconds(24)).unwrap(); // CALL 0x1234
    assert_eq!(machine.cpu.regs.pc, 0x1234);
    assert_eq!(machine.cpu.regs.sp, 0xFFFC);
    // Little-endian return address 0x0104 on the stack (in HRAM).
    assert_eq!(machine.bus.read8(0xFFFC).unwrap(), 0x04);
    assert_eq!(machine.bus.read8(0xFFFD).unwrap(), 0x01);

    machine.advance(seconds(16)).unwrap(); // RET
    assert_eq!(machine.cpu.regs.pc, 0x0104);
    assert_eq!(machine.cpu.regs.sp, 0xFFFE);
}

#[test]
fn rom_is_read_only_through_the_bus() {
    let mut machine = machine_with_rom();
    machine.bus.write8(0x0100, 0xAA).unwrap(); // mapper latch, dropped
    assert_eq!(machine.bus.read8(0x0100).unwrap(), 0x00);
}

#[test]
fn a_frame_of_time_raises_vblank() {
    let mut machine = machine_with_rom();
    // Clear the boot-time VBlank request and route STAT's VBlank source.
    machine.bus.write8(IF_ADDR, 0).unwrap();
    machine.bus.write8(0xFF41, 0x10).unwrap();

    machine.step_frame().unwrap();

    let iflags = machine.bus.read8(IF_ADDR).unwrap();
    assert_ne!(iflags & irq::VBLANK, 0);
    assert_ne!(iflags & irq::LCD_STAT, 0);
}

#[test]
fn enabled_vblank_interrupt_reaches_the_vector() {
    let mut machine = machine_with_rom();
    machine.bus.write8(IF_ADDR, 0).unwrap();
    machine.bus.write8(IE_ADDR, irq::VBLANK).unwrap();

    // One frame raises the interrupt; the next advance dispatches it.
    machine.step_frame().unwrap();
    machine.advance(seconds(24)).unwrap();

    assert_eq!(machine.bus.read8(IF_ADDR).unwrap() & irq::VBLANK, 0);
    assert!(!machine.cpu.ime);
    // The handler address was reached through the ROM's vector page.
    assert!(machine.cpu.regs.pc >= 0x0040);
}

#[test]
fn timer_interrupt_flows_through_the_machine() {
    let mut machine = machine_with_rom();
    machine.bus.write8(IF_ADDR, 0).unwrap();
    // Fastest rate, enabled; TIMA overflows after 256 ticks of 16 cycles.
    machine.bus.write8(0xFF05, 0xFF).unwrap();
    machine.bus.write8(0xFF07, 0x05).unwrap();

    machine.advance(seconds(16)).unwrap();
    assert_ne!(machine.bus.read8(IF_ADDR).unwrap() & irq::TIMER, 0);
}

#[test]
fn dma_through_the_machine_fills_oam() {
    let mut machine = machine_with_rom();
    for offset in 0..0xA0u16 {
        machine.bus.write8(0xC100 + offset, offset as u8).unwrap();
    }
    machine.bus.write8(0xFF46, 0xC1).unwrap();
    for offset in 0..0xA0u16 {
        assert_eq!(machine.bus.read8(0xFE00 + offset).unwrap(), offset as u8);
    }
}

#[test]
fn rendering_lands_in_the_driver_frame() {
    let mut machine = machine_with_rom();
    machine.step_frame().unwrap();

    let mut frame = VecFrame::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    machine.render_frame(&mut frame);
    // Zeroed-out VRAM tile maps point at tile 0xFD-filled data, so the
    // frame is some mix of shades; every pixel must be opaque gray.
    for pixel in frame.pixels() {
        assert_eq!(pixel >> 24, 0xFF);
        let r = (pixel >> 16) & 0xFF;
        let g = (pixel >> 8) & 0xFF;
        let b = pixel & 0xFF;
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}

#[test]
fn reset_restores_the_boot_state() {
    let mut machine = machine_with_rom();
    machine.step_frame().unwrap();
    machine.reset();

    assert_eq!(machine.cpu.regs.pc, 0x0100);
    assert_eq!(machine.cpu.instructions_executed(), 0);
    // The cartridge stays attached after reset.
    assert_eq!(machine.bus.read8(0x0101).unwrap(), 0xCD);
}
