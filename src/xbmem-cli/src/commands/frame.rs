//! Front buffer capture command

use super::load_mappings;
use crate::config::Config;
use crate::render::save_png;
use anyhow::{Context, Result};
use std::path::Path;
use xbmem::{capture_front_buffer, MemorySource};

/// Handle the frame command
pub fn handle(
    source: &dyn MemorySource,
    mappings: Option<&Path>,
    output: &Path,
    config: &Config,
) -> Result<()> {
    let mappings = load_mappings(source, mappings, config)?;

    eprintln!("Capturing front buffer...");
    let frame = capture_front_buffer(source, &mappings).context("Failed to capture front buffer")?;

    save_png(&frame.rgba, frame.width, frame.height, output)?;
    println!(
        "Saved {}x{} frame to {}",
        frame.width,
        frame.height,
        output.display()
    );

    Ok(())
}
