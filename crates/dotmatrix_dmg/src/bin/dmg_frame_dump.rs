use std::path::PathBuf;

use dotmatrix_common::frame::VecFrame;
use dotmatrix_dmg::{DmgMachine, SCREEN_HEIGHT, SCREEN_WIDTH};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let rom_path: PathBuf = args.next().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("Usage: dmg_frame_dump <rom_path> <out_argb_path> [frames]");
        std::process::exit(2);
    });
    let out_path: PathBuf = args.next().map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("Usage: dmg_frame_dump <rom_path> <out_argb_path> [frames]");
        std::process::exit(2);
    });
    let frames: u32 = args
        .next()
        .unwrap_or_else(|| "120".to_string())
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("Invalid frame count; expected an integer.");
            std::process::exit(2);
        });

    let rom = std::fs::read(&rom_path).unwrap_or_else(|err| {
        eprintln!("Failed to read ROM '{}': {err}", rom_path.display());
        std::process::exit(1);
    });

    let mut machine = DmgMachine::new();
    machine.load_rom(&rom);

    for _ in 0..frames {
        if let Err(err) = machine.step_frame() {
            eprintln!(
                "Emulation stopped after {} instructions: {err}",
                machine.cpu.instructions_executed()
            );
            std::process::exit(1);
        }
    }

    let mut frame = VecFrame::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    machine.render_frame(&mut frame);

    let mut bytes = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT * 4);
    for pixel in frame.pixels() {
        bytes.extend_from_slice(&pixel.to_be_bytes());
    }

    std::fs::write(&out_path, &bytes).unwrap_or_else(|err| {
        eprintln!("Failed to write '{}': {err}", out_path.display());
        std::process::exit(1);
    });

    println!(
        "Wrote {} bytes ({SCREEN_WIDTH}x{SCREEN_HEIGHT} argb32) after {frames} frames to '{}'",
        bytes.len(),
        out_path.display()
    );
}
