//! Front buffer capture

use super::mappings::AddressMappings;
use crate::d3d::{linear_to_rgba, untile_to_rgba, D3dDevice, PixelContainer, TilePitch};
use crate::error::{Error, Result};
use crate::pages::PAGE_SIZE;
use crate::source::MemorySource;

/// 1080i surfaces are never tiled but keep the tiled scanline stride
const UNTILED_FRONT_BUFFER_WIDTH: u32 = 1920;

/// A captured frame as tightly packed RGBA rows
#[derive(Debug, Clone)]
pub struct FrameCapture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Capture the surface in frame buffer slot 0
///
/// When the title is stopped on its present call, slot 0 holds the buffer
/// that was just on screen, so the capture is free of tearing.
pub fn capture_front_buffer(
    source: &dyn MemorySource,
    mappings: &AddressMappings,
) -> Result<FrameCapture> {
    let device = D3dDevice::from_pointer(source, mappings.d3d_device)?;
    let container = PixelContainer::read(source, device.frame_buffer(source, 0)?)?;

    let format = container.format();
    if !format.is_bgra32() {
        return Err(Error::UnsupportedPixelFormat(format.code()));
    }

    let width = container.width();
    let height = container.height();
    let pitch = container.tiled_pitch()?;
    let address = container.cpu_address();
    let surface_size = pitch * height;

    tracing::info!(
        "Front buffer {}x{} {} at {:#010x}, pitch {:#x}",
        width,
        height,
        format,
        address,
        pitch
    );

    let rgba = if width == UNTILED_FRONT_BUFFER_WIDTH {
        let linear = source.read_bytes(address, surface_size as usize)?;
        linear_to_rgba(&linear, pitch, width, height)?
    } else {
        device
            .enclosing_tile(source, address, surface_size)?
            .ok_or(Error::NoEnclosingTile(address))?;

        let rounded = surface_size.div_ceil(PAGE_SIZE) * PAGE_SIZE;
        let tiled = source.read_bytes(address, rounded as usize)?;
        untile_to_rgba(&tiled, TilePitch::new(pitch)?, width, height)?
    };

    Ok(FrameCapture {
        width,
        height,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::d3d::{tiled_to_linear, FRAME_BUFFER_OFFSET, TILE_ARRAY_OFFSET};
    use crate::source::MockMemorySource;

    const DEVICE_POINTER: u32 = 0x8002_0000;
    const DEVICE: u32 = 0x8003_0000;
    const CONTAINER: u32 = 0x8004_0000;
    const SURFACE: u32 = 0x8100_0000;

    fn mappings() -> AddressMappings {
        let text: String = crate::halo::MAPPING_KEYS
            .iter()
            .map(|key| format!("{} = 0x0\n", key))
            .collect();
        let mut mappings = AddressMappings::parse(&text).unwrap();
        mappings.d3d_device = DEVICE_POINTER;
        mappings
    }

    /// A device whose frame buffer 0 is `width`x`height` with the given format code
    fn frame_source(width: u32, height: u32, format: u32) -> MockMemorySource {
        let mut source = MockMemorySource::new()
            .with_u32(DEVICE_POINTER, DEVICE)
            .with_bytes(DEVICE + 0x1A00, vec![0u8; 0x200])
            .with_bytes(CONTAINER, vec![0u8; 20]);
        source.write_u32(DEVICE + FRAME_BUFFER_OFFSET, CONTAINER);
        source.write_u32(CONTAINER + 4, SURFACE & 0x0FFF_FFFF);
        source.write_u32(CONTAINER + 12, format << 8);
        source.write_u32(CONTAINER + 16, ((height - 1) << 12) | (width - 1));
        source
    }

    fn set_tile(source: &mut MockMemorySource, index: u32, address: u32, size: u32) {
        let tile = DEVICE + TILE_ARRAY_OFFSET + index * 24;
        source.write_u32(tile + 4, address);
        source.write_u32(tile + 8, size);
    }

    #[test]
    fn test_capture_tiled_front_buffer() {
        // 16x16 X8R8G8B8 surface, tiled pitch 0x200
        let mut source = frame_source(16, 16, 0x07);
        set_tile(&mut source, 5, SURFACE, 0x1_0000);

        let pitch = TilePitch::new(0x200).unwrap();
        let mut tiled = vec![0u8; 0x2000];
        for y in 0..16u32 {
            for x in 0..16u32 {
                let src = tiled_to_linear(pitch, y * 0x200 + x * 4, false) as usize;
                tiled[src..src + 4].copy_from_slice(&[x as u8, y as u8, 0xAA, 0x00]);
            }
        }
        source.add_bytes(SURFACE, tiled);

        let frame = capture_front_buffer(&source, &mappings()).unwrap();
        assert_eq!((frame.width, frame.height), (16, 16));
        assert_eq!(frame.rgba.len(), 16 * 16 * 4);

        let pixel = |x: usize, y: usize| &frame.rgba[(y * 16 + x) * 4..(y * 16 + x) * 4 + 4];
        assert_eq!(pixel(0, 0), &[0xAA, 0, 0, 0xFF]);
        assert_eq!(pixel(3, 7), &[0xAA, 7, 3, 0xFF]);
        assert_eq!(pixel(15, 15), &[0xAA, 15, 15, 0xFF]);
    }

    #[test]
    fn test_capture_without_tile() {
        let mut source = frame_source(16, 16, 0x07);
        source.add_bytes(SURFACE, vec![0u8; 0x2000]);
        // Tile too small to hold the surface
        set_tile(&mut source, 0, SURFACE, 0x1000);

        assert!(matches!(
            capture_front_buffer(&source, &mappings()),
            Err(Error::NoEnclosingTile(SURFACE))
        ));
    }

    #[test]
    fn test_capture_rejects_16bpp() {
        let source = frame_source(16, 16, 0x05);
        assert!(matches!(
            capture_front_buffer(&source, &mappings()),
            Err(Error::UnsupportedPixelFormat(0x05))
        ));
    }

    #[test]
    fn test_capture_rejects_other_32bpp_layouts() {
        // A8B8G8R8 and D24S8 are 32 bpp but not stored as B, G, R, A
        for format in [0x3A, 0x2A] {
            let mut source = frame_source(16, 16, format);
            set_tile(&mut source, 0, SURFACE, 0x1_0000);
            source.add_bytes(SURFACE, vec![0u8; 0x2000]);
            assert!(matches!(
                capture_front_buffer(&source, &mappings()),
                Err(Error::UnsupportedPixelFormat(code)) if u32::from(code) == format
            ));
        }
    }

    #[test]
    fn test_capture_1920_uses_pitch_stride() {
        // 1920 * 4 = 0x1E00, tiled pitch 0x2000
        let mut source = frame_source(1920, 2, 0x06);
        let mut linear = vec![0u8; 0x4000];
        linear[0x2000..0x2004].copy_from_slice(&[1, 2, 3, 0]);
        source.add_bytes(SURFACE, linear);

        let frame = capture_front_buffer(&source, &mappings()).unwrap();
        let second_row = 1920 * 4;
        assert_eq!(&frame.rgba[second_row..second_row + 4], &[3, 2, 1, 0xFF]);
    }
}
