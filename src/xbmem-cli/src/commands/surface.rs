//! Pixel container inspection

use super::parse_address;
use anyhow::{Context, Result};
use serde::Serialize;
use xbmem::{MemorySource, PixelContainer};

/// Decoded view of a container, as printed or serialized
#[derive(Debug, Serialize)]
struct SurfaceReport {
    address: u32,
    format: String,
    format_code: u8,
    bits_per_pixel: u32,
    width: u32,
    height: u32,
    depth: u32,
    pitch: u32,
    byte_size: u64,
    data_address: u32,
    tiled_pitch: Option<u32>,
    container: PixelContainer,
}

impl SurfaceReport {
    fn new(address: u32, container: PixelContainer) -> Self {
        let format = container.format();
        Self {
            address,
            format: format.to_string(),
            format_code: format.code(),
            bits_per_pixel: format.bits_per_pixel(),
            width: container.width(),
            height: container.height(),
            depth: container.depth(),
            pitch: container.pitch(),
            byte_size: container.byte_size(),
            data_address: container.cpu_address(),
            tiled_pitch: container.tiled_pitch().ok(),
            container,
        }
    }
}

/// Handle the surface command
pub fn handle(source: &dyn MemorySource, address: &str, json: bool) -> Result<()> {
    let address = parse_address(address)?;
    let container = PixelContainer::read(source, address)
        .with_context(|| format!("Failed to read pixel container at {:#010x}", address))?;
    let report = SurfaceReport::new(address, container);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &SurfaceReport) {
    println!("Pixel container at {:#010x}", report.address);
    println!(
        "  Format:      {} ({} bpp)",
        report.format, report.bits_per_pixel
    );
    println!(
        "  Dimensions:  {}x{}x{}",
        report.width, report.height, report.depth
    );
    println!("  Pitch:       {:#x}", report.pitch);
    println!("  Size:        {:#x} bytes", report.byte_size);
    println!("  Data:        {:#010x}", report.data_address);
    match report.tiled_pitch {
        Some(pitch) => println!("  Tiled pitch: {:#x}", pitch),
        None => println!("  Tiled pitch: none (too wide to tile)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_for_linear_surface() {
        // 640x480 X8R8G8B8, pitch 0xA00
        let size = ((0xA00 / 64 - 1) << 24) | (479 << 12) | 639;
        let container = PixelContainer::from_fields(1, 0x0100_0000, 0, 0x07 << 8, size);
        let report = SurfaceReport::new(0x8004_0000, container);

        assert_eq!(report.format, "D3DFMT_X8R8G8B8");
        assert_eq!((report.width, report.height), (640, 480));
        assert_eq!(report.pitch, 0xA00);
        assert_eq!(report.data_address, 0x8100_0000);
        assert_eq!(report.tiled_pitch, Some(0xA00));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["width"], 640);
        assert_eq!(json["container"]["sizing"]["kind"], "explicit");
    }

    #[test]
    fn test_report_untileable_and_oversized() {
        // 32768x32768 at 32 bpp is past the widest tile pitch and covers 4 GB
        let format = (15 << 24) | (15 << 20) | (0x06 << 8);
        let container = PixelContainer::from_fields(1, 0, 0, format, 0);
        let report = SurfaceReport::new(0, container);
        assert_eq!(report.tiled_pitch, None);
        assert_eq!(report.byte_size, 1 << 32);
    }
}
