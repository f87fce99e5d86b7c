//! Print the level table of an analysis buffer's LOD pyramid
//!
//! Usage: `lod-report <file.f32> [channels] [levels]`
//!
//! The file holds raw little-endian `f32` values, `channels` per fragment
//! (default 4). Set RUST_LOG=debug for verbose output.

use anyhow::{bail, Context, Result};
use contour_core::config::DEFAULT_LOD_LEVELS;
use contour_core::lod::{LodPyramid, GUARD_FRAGMENTS};
use std::path::PathBuf;

const DEFAULT_CHANNELS: usize = 4;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = args.first().map(PathBuf::from) else {
        bail!("usage: lod-report <file.f32> [channels] [levels]");
    };
    let channels = parse_arg(&args, 1, "channels", DEFAULT_CHANNELS)?;
    let levels = parse_arg(&args, 2, "levels", DEFAULT_LOD_LEVELS)?;

    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
    if bytes.len() % 4 != 0 {
        bail!("{:?} is {} bytes, not a whole number of f32 values", path, bytes.len());
    }
    let raw: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    log::debug!("lod-report: read {} values from {:?}", raw.len(), path);

    let pyramid = LodPyramid::build(&raw, channels, levels)
        .with_context(|| format!("Failed to build pyramid from {:?}", path))?;

    println!("{}", path.display());
    println!(
        "{} fragments x {} channels, {} levels, {} bytes backing ({} guard fragments)",
        pyramid.fragment_count(),
        pyramid.channels(),
        pyramid.level_count(),
        pyramid.as_bytes().len(),
        GUARD_FRAGMENTS
    );
    println!();
    println!("{:>5}  {:>10}  {:>10}  peaks", "level", "offset", "length");
    for level in 0..pyramid.level_count() {
        let peaks: Vec<String> = pyramid
            .level_peaks(level)
            .iter()
            .map(|p| format!("{:.4}", p))
            .collect();
        println!(
            "{:>5}  {:>10}  {:>10}  [{}]",
            level,
            pyramid.offsets()[level],
            pyramid.level_len(level),
            peaks.join(", ")
        );
    }
    println!("{:>5}  {:>10}", "end", pyramid.offsets()[pyramid.level_count()]);

    Ok(())
}

fn parse_arg(args: &[String], index: usize, name: &str, default: usize) -> Result<usize> {
    match args.get(index) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid {} argument: {:?}", name, value)),
        None => Ok(default),
    }
}
