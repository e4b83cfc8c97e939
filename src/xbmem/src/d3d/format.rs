//! D3D surface formats
//!
//! Format codes as stored in bits 8-15 of a pixel container's format word.
//! Several names share a code (the swizzled `V8U8` is the same code as
//! `G8B8`, `DXT3` is `DXT2`, ...), so formats are a code newtype rather than
//! an enum.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A D3D format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct D3dFormat(pub u8);

impl D3dFormat {
    // Swizzled
    pub const A8R8G8B8: D3dFormat = D3dFormat(0x06);
    pub const X8R8G8B8: D3dFormat = D3dFormat(0x07);
    pub const R5G6B5: D3dFormat = D3dFormat(0x05);
    pub const R6G5B5: D3dFormat = D3dFormat(0x27);
    pub const X1R5G5B5: D3dFormat = D3dFormat(0x03);
    pub const A1R5G5B5: D3dFormat = D3dFormat(0x02);
    pub const A4R4G4B4: D3dFormat = D3dFormat(0x04);
    pub const A8: D3dFormat = D3dFormat(0x19);
    pub const A8B8G8R8: D3dFormat = D3dFormat(0x3A);
    pub const B8G8R8A8: D3dFormat = D3dFormat(0x3B);
    pub const R4G4B4A4: D3dFormat = D3dFormat(0x39);
    pub const R5G5B5A1: D3dFormat = D3dFormat(0x38);
    pub const R8G8B8A8: D3dFormat = D3dFormat(0x3C);
    pub const R8B8: D3dFormat = D3dFormat(0x29);
    pub const G8B8: D3dFormat = D3dFormat(0x28);
    pub const P8: D3dFormat = D3dFormat(0x0B);
    pub const L8: D3dFormat = D3dFormat(0x00);
    pub const A8L8: D3dFormat = D3dFormat(0x1A);
    pub const AL8: D3dFormat = D3dFormat(0x01);
    pub const L16: D3dFormat = D3dFormat(0x32);
    pub const V8U8: D3dFormat = D3dFormat(0x28);
    pub const L6V5U5: D3dFormat = D3dFormat(0x27);
    pub const X8L8V8U8: D3dFormat = D3dFormat(0x07);
    pub const Q8W8V8U8: D3dFormat = D3dFormat(0x3A);
    pub const V16U16: D3dFormat = D3dFormat(0x33);

    // Depth buffers
    pub const D16: D3dFormat = D3dFormat(0x2C);
    pub const D24S8: D3dFormat = D3dFormat(0x2A);
    pub const F16: D3dFormat = D3dFormat(0x2D);
    pub const F24S8: D3dFormat = D3dFormat(0x2B);

    // YUV
    pub const YUY2: D3dFormat = D3dFormat(0x24);
    pub const UYVY: D3dFormat = D3dFormat(0x25);

    // Compressed
    pub const DXT1: D3dFormat = D3dFormat(0x0C);
    pub const DXT2: D3dFormat = D3dFormat(0x0E);
    pub const DXT3: D3dFormat = D3dFormat(0x0E);
    pub const DXT4: D3dFormat = D3dFormat(0x0F);
    pub const DXT5: D3dFormat = D3dFormat(0x0F);

    // Linear
    pub const LIN_A1R5G5B5: D3dFormat = D3dFormat(0x10);
    pub const LIN_A4R4G4B4: D3dFormat = D3dFormat(0x1D);
    pub const LIN_A8: D3dFormat = D3dFormat(0x1F);
    pub const LIN_A8B8G8R8: D3dFormat = D3dFormat(0x3F);
    pub const LIN_A8R8G8B8: D3dFormat = D3dFormat(0x12);
    pub const LIN_B8G8R8A8: D3dFormat = D3dFormat(0x40);
    pub const LIN_G8B8: D3dFormat = D3dFormat(0x17);
    pub const LIN_R4G4B4A4: D3dFormat = D3dFormat(0x3E);
    pub const LIN_R5G5B5A1: D3dFormat = D3dFormat(0x3D);
    pub const LIN_R5G6B5: D3dFormat = D3dFormat(0x11);
    pub const LIN_R6G5B5: D3dFormat = D3dFormat(0x37);
    pub const LIN_R8B8: D3dFormat = D3dFormat(0x16);
    pub const LIN_R8G8B8A8: D3dFormat = D3dFormat(0x41);
    pub const LIN_X1R5G5B5: D3dFormat = D3dFormat(0x1C);
    pub const LIN_X8R8G8B8: D3dFormat = D3dFormat(0x1E);
    pub const LIN_A8L8: D3dFormat = D3dFormat(0x20);
    pub const LIN_AL8: D3dFormat = D3dFormat(0x1B);
    pub const LIN_L16: D3dFormat = D3dFormat(0x35);
    pub const LIN_L8: D3dFormat = D3dFormat(0x13);
    pub const LIN_V16U16: D3dFormat = D3dFormat(0x36);
    pub const LIN_D24S8: D3dFormat = D3dFormat(0x2E);
    pub const LIN_F24S8: D3dFormat = D3dFormat(0x2F);
    pub const LIN_D16: D3dFormat = D3dFormat(0x30);
    pub const LIN_F16: D3dFormat = D3dFormat(0x31);

    pub const VERTEXDATA: D3dFormat = D3dFormat(100);
    pub const INDEX16: D3dFormat = D3dFormat(101);

    pub fn code(self) -> u8 {
        self.0
    }

    /// Bits per pixel, 16 for any format without a specific entry
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::DXT1 => 4,

            Self::L8
            | Self::AL8
            | Self::P8
            | Self::DXT2
            | Self::DXT4
            | Self::LIN_L8
            | Self::A8
            | Self::LIN_AL8
            | Self::LIN_A8 => 8,

            Self::A8R8G8B8
            | Self::X8R8G8B8
            | Self::LIN_A8R8G8B8
            | Self::LIN_X8R8G8B8
            | Self::D24S8
            | Self::F24S8
            | Self::LIN_D24S8
            | Self::LIN_F24S8
            | Self::V16U16
            | Self::A8B8G8R8
            | Self::B8G8R8A8
            | Self::R8G8B8A8
            | Self::LIN_A8B8G8R8
            | Self::LIN_B8G8R8A8
            | Self::LIN_R8G8B8A8 => 32,

            _ => 16,
        }
    }

    /// Formats whose 32-bit texels are laid out B, G, R, A/X in memory
    pub fn is_bgra32(self) -> bool {
        matches!(
            self,
            Self::A8R8G8B8 | Self::X8R8G8B8 | Self::LIN_A8R8G8B8 | Self::LIN_X8R8G8B8
        )
    }

    /// Canonical name, if the code is a known format
    pub fn name(self) -> Option<&'static str> {
        FORMAT_NAMES
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for D3dFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "D3DFMT_{}", name),
            None => write!(f, "D3DFMT({:#04x})", self.0),
        }
    }
}

/// One display name per code; aliases resolve to the first entry
const FORMAT_NAMES: &[(D3dFormat, &str)] = &[
    (D3dFormat::A8R8G8B8, "A8R8G8B8"),
    (D3dFormat::X8R8G8B8, "X8R8G8B8"),
    (D3dFormat::R5G6B5, "R5G6B5"),
    (D3dFormat::R6G5B5, "R6G5B5"),
    (D3dFormat::X1R5G5B5, "X1R5G5B5"),
    (D3dFormat::A1R5G5B5, "A1R5G5B5"),
    (D3dFormat::A4R4G4B4, "A4R4G4B4"),
    (D3dFormat::A8, "A8"),
    (D3dFormat::A8B8G8R8, "A8B8G8R8"),
    (D3dFormat::B8G8R8A8, "B8G8R8A8"),
    (D3dFormat::R4G4B4A4, "R4G4B4A4"),
    (D3dFormat::R5G5B5A1, "R5G5B5A1"),
    (D3dFormat::R8G8B8A8, "R8G8B8A8"),
    (D3dFormat::R8B8, "R8B8"),
    (D3dFormat::G8B8, "G8B8"),
    (D3dFormat::P8, "P8"),
    (D3dFormat::L8, "L8"),
    (D3dFormat::A8L8, "A8L8"),
    (D3dFormat::AL8, "AL8"),
    (D3dFormat::L16, "L16"),
    (D3dFormat::V16U16, "V16U16"),
    (D3dFormat::D16, "D16"),
    (D3dFormat::D24S8, "D24S8"),
    (D3dFormat::F16, "F16"),
    (D3dFormat::F24S8, "F24S8"),
    (D3dFormat::YUY2, "YUY2"),
    (D3dFormat::UYVY, "UYVY"),
    (D3dFormat::DXT1, "DXT1"),
    (D3dFormat::DXT2, "DXT2"),
    (D3dFormat::DXT4, "DXT4"),
    (D3dFormat::LIN_A1R5G5B5, "LIN_A1R5G5B5"),
    (D3dFormat::LIN_A4R4G4B4, "LIN_A4R4G4B4"),
    (D3dFormat::LIN_A8, "LIN_A8"),
    (D3dFormat::LIN_A8B8G8R8, "LIN_A8B8G8R8"),
    (D3dFormat::LIN_A8R8G8B8, "LIN_A8R8G8B8"),
    (D3dFormat::LIN_B8G8R8A8, "LIN_B8G8R8A8"),
    (D3dFormat::LIN_G8B8, "LIN_G8B8"),
    (D3dFormat::LIN_R4G4B4A4, "LIN_R4G4B4A4"),
    (D3dFormat::LIN_R5G5B5A1, "LIN_R5G5B5A1"),
    (D3dFormat::LIN_R5G6B5, "LIN_R5G6B5"),
    (D3dFormat::LIN_R6G5B5, "LIN_R6G5B5"),
    (D3dFormat::LIN_R8B8, "LIN_R8B8"),
    (D3dFormat::LIN_R8G8B8A8, "LIN_R8G8B8A8"),
    (D3dFormat::LIN_X1R5G5B5, "LIN_X1R5G5B5"),
    (D3dFormat::LIN_X8R8G8B8, "LIN_X8R8G8B8"),
    (D3dFormat::LIN_A8L8, "LIN_A8L8"),
    (D3dFormat::LIN_AL8, "LIN_AL8"),
    (D3dFormat::LIN_L16, "LIN_L16"),
    (D3dFormat::LIN_L8, "LIN_L8"),
    (D3dFormat::LIN_V16U16, "LIN_V16U16"),
    (D3dFormat::LIN_D24S8, "LIN_D24S8"),
    (D3dFormat::LIN_F24S8, "LIN_F24S8"),
    (D3dFormat::LIN_D16, "LIN_D16"),
    (D3dFormat::LIN_F16, "LIN_F16"),
    (D3dFormat::VERTEXDATA, "VERTEXDATA"),
    (D3dFormat::INDEX16, "INDEX16"),
];

/// Pitches the memory controller can tile, ascending
pub const TILE_PITCHES: [u32; 26] = [
    0x200, 0x300, 0x400, 0x500, 0x600, 0x700, 0x800, 0xA00, 0xC00, 0xE00, 0x1000, 0x1400,
    0x1800, 0x1C00, 0x2000, 0x2800, 0x3000, 0x3800, 0x4000, 0x5000, 0x6000, 0x7000, 0x8000,
    0xA000, 0xC000, 0xE000,
];

/// Pitch of a `width`-texel row once placed in a tiled region
///
/// The row is padded to 64 bytes, then snapped up to the next tile pitch.
/// Rows wider than the largest tile pitch cannot be tiled and yield
/// [`Error::UntileablePitch`] carrying the padded pitch.
pub fn tiled_pitch(width: u32, format: D3dFormat) -> Result<u32> {
    let pitch = (width * format.bits_per_pixel() / 8 + 63) & !63;

    TILE_PITCHES
        .iter()
        .copied()
        .find(|&tile_pitch| pitch <= tile_pitch)
        .ok_or(Error::UntileablePitch(pitch))
}
