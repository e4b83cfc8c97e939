//! Pixel container (surface and texture header) decoding

use super::format::{tiled_pitch, D3dFormat};
use crate::error::{Error, Result};
use crate::pages::{PAGE_SIZE, PHYSICAL_WINDOW};
use crate::source::MemorySource;
use byteorder::{ByteOrder, LE};
use serde::Serialize;

/// Size of a pixel container record in console memory
pub const PIXEL_CONTAINER_SIZE: usize = 20;

/// How a container encodes its dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceSize {
    /// Swizzled textures: log2 dimensions packed into the format word
    PowerOfTwo {
        log2_width: u8,
        log2_height: u8,
        log2_depth: u8,
    },
    /// Linear surfaces: dimensions and pitch packed into the size word
    Explicit { width: u32, height: u32, pitch: u32 },
}

/// A decoded pixel container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelContainer {
    pub common: u32,
    pub data: u32,
    pub lock: u32,
    pub format_word: u32,
    pub size_word: u32,
    pub sizing: SurfaceSize,
}

impl PixelContainer {
    pub fn from_fields(common: u32, data: u32, lock: u32, format: u32, size: u32) -> Self {
        let sizing = if size == 0 {
            SurfaceSize::PowerOfTwo {
                log2_width: ((format >> 20) & 0xF) as u8,
                log2_height: ((format >> 24) & 0xF) as u8,
                log2_depth: ((format >> 28) & 0xF) as u8,
            }
        } else {
            SurfaceSize::Explicit {
                width: (size & 0xFFF) + 1,
                height: ((size >> 12) & 0xFFF) + 1,
                pitch: ((size >> 24) + 1) * 64,
            }
        };

        Self {
            common,
            data,
            lock,
            format_word: format,
            size_word: size,
            sizing,
        }
    }

    /// Decode a 20-byte little-endian container record
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PIXEL_CONTAINER_SIZE {
            return Err(Error::SurfaceTruncated {
                needed: PIXEL_CONTAINER_SIZE,
                available: bytes.len(),
            });
        }
        Ok(Self::from_fields(
            LE::read_u32(&bytes[0..4]),
            LE::read_u32(&bytes[4..8]),
            LE::read_u32(&bytes[8..12]),
            LE::read_u32(&bytes[12..16]),
            LE::read_u32(&bytes[16..20]),
        ))
    }

    /// Read a container record from console memory
    pub fn read(source: &dyn MemorySource, address: u32) -> Result<Self> {
        let bytes = source.read_bytes(address, PIXEL_CONTAINER_SIZE)?;
        Self::parse(&bytes)
    }

    pub fn format(&self) -> D3dFormat {
        D3dFormat(((self.format_word >> 8) & 0xFF) as u8)
    }

    pub fn width(&self) -> u32 {
        match self.sizing {
            SurfaceSize::PowerOfTwo { log2_width, .. } => 1 << log2_width,
            SurfaceSize::Explicit { width, .. } => width,
        }
    }

    pub fn height(&self) -> u32 {
        match self.sizing {
            SurfaceSize::PowerOfTwo { log2_height, .. } => 1 << log2_height,
            SurfaceSize::Explicit { height, .. } => height,
        }
    }

    pub fn depth(&self) -> u32 {
        match self.sizing {
            SurfaceSize::PowerOfTwo { log2_depth, .. } => 1 << log2_depth,
            SurfaceSize::Explicit { .. } => 1,
        }
    }

    /// Bytes per row
    pub fn pitch(&self) -> u32 {
        match self.sizing {
            SurfaceSize::Explicit { pitch, .. } => pitch,
            SurfaceSize::PowerOfTwo { .. } => {
                let width = self.width();
                match self.format() {
                    D3dFormat::DXT1 => width * 2,
                    D3dFormat::DXT2 | D3dFormat::DXT4 => width * 4,
                    format => width * format.bits_per_pixel() / 8,
                }
            }
        }
    }

    /// Bytes covered by the surface's top level
    ///
    /// A 32768x32768 32-bpp texture covers 4 GB, so the product needs 64 bits.
    pub fn byte_size(&self) -> u64 {
        u64::from(self.pitch()) * u64::from(self.height())
    }

    /// Pages covered by the surface's top level
    pub fn page_count(&self) -> u32 {
        // At most 2^32 bytes, so the page count fits in 20 bits
        self.byte_size().div_ceil(u64::from(PAGE_SIZE)) as u32
    }

    /// Data pointer as seen by the CPU
    pub fn cpu_address(&self) -> u32 {
        self.data | PHYSICAL_WINDOW
    }

    /// Pitch the surface would have inside a tiled region
    pub fn tiled_pitch(&self) -> Result<u32> {
        tiled_pitch(self.width(), self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockMemorySource;

    fn pow2_format(code: u8, log2_w: u32, log2_h: u32, log2_d: u32) -> u32 {
        (log2_d << 28) | (log2_h << 24) | (log2_w << 20) | (u32::from(code) << 8) | 0x29
    }

    #[test]
    fn test_power_of_two_dxt1() {
        // 256x128 DXT1
        let container =
            PixelContainer::from_fields(0, 0x0100_0000, 0, pow2_format(0x0C, 8, 7, 0), 0);

        assert_eq!(container.format(), D3dFormat::DXT1);
        assert_eq!(container.width(), 256);
        assert_eq!(container.height(), 128);
        assert_eq!(container.depth(), 1);
        assert_eq!(container.pitch(), 512);
        assert_eq!(container.byte_size(), 512 * 128);
    }

    #[test]
    fn test_power_of_two_pitch_by_format() {
        let dxt5 = PixelContainer::from_fields(0, 0, 0, pow2_format(0x0F, 6, 6, 0), 0);
        assert_eq!(dxt5.pitch(), 64 * 4);

        let argb = PixelContainer::from_fields(0, 0, 0, pow2_format(0x06, 9, 9, 0), 0);
        assert_eq!(argb.pitch(), 512 * 4);

        let l8 = PixelContainer::from_fields(0, 0, 0, pow2_format(0x00, 4, 2, 3), 0);
        assert_eq!(l8.pitch(), 16);
        assert_eq!(l8.height(), 4);
        assert_eq!(l8.depth(), 8);

        let r5g6b5 = PixelContainer::from_fields(0, 0, 0, pow2_format(0x05, 5, 5, 0), 0);
        assert_eq!(r5g6b5.pitch(), 64);
    }

    #[test]
    fn test_largest_power_of_two_size() {
        // 32768x32768 A8R8G8B8
        let container =
            PixelContainer::from_fields(0, 0x0100_0000, 0, pow2_format(0x06, 15, 15, 0), 0);

        assert_eq!(container.pitch(), 0x2_0000);
        assert_eq!(container.height(), 32768);
        assert_eq!(container.byte_size(), 1 << 32);
        assert_eq!(container.page_count(), 1 << 20);
    }

    #[test]
    fn test_explicit_sizing() {
        // 800x600, pitch (0x31 + 1) * 64 = 3200
        let size = (0x31 << 24) | (599 << 12) | 799;
        let container = PixelContainer::from_fields(0, 0x0020_0000, 0, 0x0000_1E00, size);

        assert_eq!(container.width(), 800);
        assert_eq!(container.height(), 600);
        assert_eq!(container.depth(), 1);
        assert_eq!(container.pitch(), 3200);
        assert_eq!(container.byte_size(), 3200 * 600);
        assert_eq!(container.format(), D3dFormat::LIN_X8R8G8B8);
        assert!(matches!(container.sizing, SurfaceSize::Explicit { .. }));
    }

    #[test]
    fn test_cpu_address() {
        let container = PixelContainer::from_fields(0, 0x0123_4000, 0, 0, 0);
        assert_eq!(container.cpu_address(), 0x8123_4000);

        let already = PixelContainer::from_fields(0, 0x8123_4000, 0, 0, 0);
        assert_eq!(already.cpu_address(), 0x8123_4000);
    }

    #[test]
    fn test_tiled_pitch_from_container() {
        let size = (0x31 << 24) | (479 << 12) | 639;
        let container = PixelContainer::from_fields(0, 0, 0, 0x0000_1E00, size);
        assert_eq!(container.tiled_pitch().unwrap(), 0xA00);
    }

    #[test]
    fn test_read_from_source() {
        let mut record = Vec::new();
        for word in [0x0004_0001u32, 0x0030_0000, 0, 0x0000_0700, (479 << 12) | 639] {
            record.extend_from_slice(&word.to_le_bytes());
        }
        let source = MockMemorySource::new().with_bytes(0x8010_0000, record);

        let container = PixelContainer::read(&source, 0x8010_0000).unwrap();
        assert_eq!(container.common, 0x0004_0001);
        assert_eq!(container.cpu_address(), 0x8030_0000);
        assert_eq!(container.format(), D3dFormat::X8R8G8B8);
        assert_eq!(container.width(), 640);
        assert_eq!(container.height(), 480);

        assert!(PixelContainer::read(&source, 0x8020_0000).is_err());
    }

    #[test]
    fn test_parse_short_record() {
        assert!(matches!(
            PixelContainer::parse(&[0u8; 12]),
            Err(Error::SurfaceTruncated {
                needed: 20,
                available: 12
            })
        ));
    }
}
