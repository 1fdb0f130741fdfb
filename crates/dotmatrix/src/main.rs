use std::path::PathBuf;

use dotmatrix::RunOptions;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(rom_path), Some(out_path)) = (args.next(), args.next()) else {
        eprintln!("Usage: dotmatrix <rom_path> <out_argb_path> [frames]");
        std::process::exit(2);
    };
    let frames: u32 = args
        .next()
        .map(|arg| {
            arg.parse().unwrap_or_else(|_| {
                eprintln!("Invalid frame count '{arg}'");
                std::process::exit(2);
            })
        })
        .unwrap_or(120);

    let options = RunOptions::builder()
        .rom_path(PathBuf::from(rom_path))
        .out_path(PathBuf::from(out_path))
        .frames(frames)
        .build();

    if let Err(err) = dotmatrix::run(options) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
