use std::path::PathBuf;

use anyhow::{Context, Result};
use typed_builder::TypedBuilder;

use dotmatrix_common::frame::VecFrame;
use dotmatrix_dmg::{DmgMachine, SCREEN_HEIGHT, SCREEN_WIDTH};

/// How the headless runner drives the machine.
#[derive(TypedBuilder)]
pub struct RunOptions {
    pub rom_path: PathBuf,
    /// Where the final frame lands, as raw big-endian ARGB32.
    pub out_path: PathBuf,
    #[builder(default = 120)]
    pub frames: u32,
    /// Emulated wall time handed to the machine per driver iteration.
    /// One frame of the 59.7 Hz panel by default.
    #[builder(default = 70_224.0 / 4_194_304.0)]
    pub timestep: f64,
}

/// Run a ROM headlessly for a number of frames and dump the last frame.
pub fn run(options: RunOptions) -> Result<()> {
    let rom = std::fs::read(&options.rom_path)
        .with_context(|| format!("reading ROM '{}'", options.rom_path.display()))?;

    let mut machine = DmgMachine::new();
    machine.load_rom(&rom);

    log::info!(
        "running '{}' for {} frames",
        options.rom_path.display(),
        options.frames
    );

    for frame in 0..options.frames {
        machine.advance(options.timestep).with_context(|| {
            format!(
                "emulation failed in frame {frame} after {} instructions",
                machine.cpu.instructions_executed()
            )
        })?;
    }

    let mut frame = VecFrame::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    machine.render_frame(&mut frame);

    let mut bytes = Vec::with_capacity(SCREEN_WIDTH * SCREEN_HEIGHT * 4);
    for pixel in frame.pixels() {
        bytes.extend_from_slice(&pixel.to_be_bytes());
    }
    std::fs::write(&options.out_path, &bytes)
        .with_context(|| format!("writing '{}'", options.out_path.display()))?;

    log::info!(
        "wrote {} bytes to '{}'",
        bytes.len(),
        options.out_path.display()
    );
    Ok(())
}
