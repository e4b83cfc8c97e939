//! Memory controller tile address translation
//!
//! A tiled region stores a surface in 4 KB pages. Each page holds a 256-byte
//! wide, 16-scanline tall block, with scanlines and 16-byte columns shuffled
//! inside the page. Adjacent pages are swapped depending on the row parity and
//! whether the region holds a depth buffer.
//!
//! `tiled_to_linear` takes a pixel's offset in surface order (`y * pitch + x *
//! bytes_per_pixel`) and returns where that pixel sits in the tiled region.
//! `linear_to_tiled` is the inverse.

use super::format::TILE_PITCHES;
use crate::error::{Error, Result};

const TILE_PAGE_SIZE: u32 = 4096;
const TILE_PAGE_WIDTH: u32 = 256;
const TILE_PAGE_SCANLINES: u32 = 16;

/// A pitch accepted by the memory controller's tiling hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePitch(u32);

impl TilePitch {
    pub fn new(pitch: u32) -> Result<Self> {
        if TILE_PITCHES.contains(&pitch) {
            Ok(Self(pitch))
        } else {
            Err(Error::InvalidPitch(pitch))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    fn width_in_pages(self) -> u32 {
        self.0 / TILE_PAGE_WIDTH
    }
}

/// Bits `lo..=hi` of `value`
fn field(value: u32, hi: u32, lo: u32) -> u32 {
    (value >> lo) & ((2 << (hi - lo)) - 1)
}

/// Whether the page at `page_row` is swapped with its neighbour
fn page_swapped(width_in_pages: u32, page_row: u32, depth: bool) -> bool {
    if width_in_pages & 1 == 1 {
        depth
    } else {
        let odd_row = page_row & 1 == 1;
        (!depth && odd_row) || (depth && !odd_row)
    }
}

/// Map a surface-order offset to its location within the tiled region
pub fn tiled_to_linear(pitch: TilePitch, offset: u32, depth: bool) -> u32 {
    let pitch_bytes = pitch.get();
    let width_in_pages = pitch.width_in_pages();

    let scan = offset / pitch_bytes;
    let column = offset % pitch_bytes;
    let page_row = scan / TILE_PAGE_SCANLINES;

    let mut page = page_row * width_in_pages + column / TILE_PAGE_WIDTH;
    if page_swapped(width_in_pages, page_row, depth) {
        page ^= 1;
    }

    let s = scan % TILE_PAGE_SCANLINES;
    let c = offset % TILE_PAGE_WIDTH;
    let scan23 = (field(s, 2, 2) << 1) + field(s, 3, 3);

    let intra = (field(s, 3, 2) << 10)
        | (field(c, 7, 6) << 8)
        | (field(s, 1, 0) << 6)
        | (((field(c, 5, 4) + scan23) & 3) << 4)
        | field(c, 3, 0);

    page * TILE_PAGE_SIZE + intra
}

/// Map an offset within the tiled region back to surface order, plus `base`
pub fn linear_to_tiled(pitch: TilePitch, offset: u32, base: u32, depth: bool) -> u32 {
    let pitch_bytes = pitch.get();
    let width_in_pages = pitch.width_in_pages();

    let mut page = offset / TILE_PAGE_SIZE;
    let page_row = if width_in_pages & 1 == 1 {
        // Swaps may cross a row boundary, undo before dividing
        if depth {
            page ^= 1;
        }
        page / width_in_pages
    } else {
        // Swaps stay within the row
        let row = page / width_in_pages;
        if page_swapped(width_in_pages, row, depth) {
            page ^= 1;
        }
        row
    };
    let column = (page % width_in_pages) * TILE_PAGE_WIDTH;

    let scan = (field(offset, 11, 10) << 2) | field(offset, 7, 6);
    let scan23 = (field(offset, 10, 10) << 1) + field(offset, 11, 11);
    let c = (field(offset, 9, 8) << 6)
        | ((field(offset, 5, 4).wrapping_sub(scan23) & 3) << 4)
        | field(offset, 3, 0);

    base + page_row * TILE_PAGE_SCANLINES * pitch_bytes + column + scan * pitch_bytes + c
}

/// Reorder a tiled 32-bpp BGRX surface into linear RGBA
pub fn untile_to_rgba(tiled: &[u8], pitch: TilePitch, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let src = tiled_to_linear(pitch, y * pitch.get() + x * 4, false) as usize;
            let texel = tiled.get(src..src + 4).ok_or(Error::SurfaceTruncated {
                needed: src + 4,
                available: tiled.len(),
            })?;
            rgba.extend_from_slice(&[texel[2], texel[1], texel[0], 0xFF]);
        }
    }

    Ok(rgba)
}

/// Convert a linear 32-bpp BGRX surface with `pitch` byte rows into RGBA
pub fn linear_to_rgba(linear: &[u8], pitch: u32, width: u32, height: u32) -> Result<Vec<u8>> {
    let needed = (pitch * height.saturating_sub(1) + width * 4) as usize;
    if height > 0 && linear.len() < needed {
        return Err(Error::SurfaceTruncated {
            needed,
            available: linear.len(),
        });
    }

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        let row = (y * pitch) as usize;
        for texel in linear[row..row + (width * 4) as usize].chunks_exact(4) {
            rgba.extend_from_slice(&[texel[2], texel[1], texel[0], 0xFF]);
        }
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_pitch_validation() {
        assert_eq!(TilePitch::new(0xA00).unwrap().get(), 0xA00);
        assert!(matches!(TilePitch::new(0), Err(Error::InvalidPitch(0))));
        assert!(matches!(
            TilePitch::new(0x900),
            Err(Error::InvalidPitch(0x900))
        ));
        assert!(TilePitch::new(0x10000).is_err());
    }

    #[test]
    fn test_field() {
        assert_eq!(field(0b1011_0000, 7, 4), 0b1011);
        assert_eq!(field(0b0100, 2, 2), 1);
        assert_eq!(field(0xFFFF_FFFF, 11, 10), 3);
    }

    #[test]
    fn test_tiled_to_linear_known_values() {
        let pitch = TilePitch::new(0x200).unwrap();

        assert_eq!(tiled_to_linear(pitch, 0, false), 0);
        // Second scanline lands in bits 6-7 of the page offset
        assert_eq!(tiled_to_linear(pitch, 0x200, false), 0x40);
        // Second 256-byte column is the next page
        assert_eq!(tiled_to_linear(pitch, 0x100, false), 0x1000);
        // Scanline 4 sets bit 10 and rotates the 16-byte column group
        assert_eq!(tiled_to_linear(pitch, 4 * 0x200, false), 0x420);
        // Second page row of an even-width surface swaps pages
        assert_eq!(tiled_to_linear(pitch, 16 * 0x200, false), 0x3000);
    }

    #[test]
    fn test_depth_swaps_pages() {
        let even = TilePitch::new(0x200).unwrap();
        assert_eq!(tiled_to_linear(even, 0x200, true), 0x1040);
        assert_eq!(tiled_to_linear(even, 16 * 0x200, true), 0x2000);

        let odd = TilePitch::new(0x300).unwrap();
        assert_eq!(tiled_to_linear(odd, 0, false), 0);
        assert_eq!(tiled_to_linear(odd, 0, true), 0x1000);
        assert_eq!(tiled_to_linear(odd, 0x200, true), 0x3000);
    }

    #[test]
    fn test_round_trip_all_pitches() {
        for &p in TILE_PITCHES.iter() {
            let pitch = TilePitch::new(p).unwrap();
            // Two page rows so page swaps stay within the range
            let span = p * TILE_PAGE_SCANLINES * 2;
            for depth in [false, true] {
                for offset in (0..span).step_by(4) {
                    let linear = tiled_to_linear(pitch, offset, depth);
                    assert!(linear < span, "pitch {:#x} offset {:#x}", p, offset);
                    assert_eq!(
                        linear_to_tiled(pitch, linear, 0x8000_0000, depth) - 0x8000_0000,
                        offset,
                        "pitch {:#x} offset {:#x} depth {}",
                        p,
                        offset,
                        depth
                    );
                }
            }
        }
    }

    #[test]
    fn test_round_trip_every_byte() {
        for p in [0x200, 0x300, 0xA00] {
            let pitch = TilePitch::new(p).unwrap();
            let span = p * TILE_PAGE_SCANLINES * 2;
            for depth in [false, true] {
                let mut seen = vec![false; span as usize];
                for offset in 0..span {
                    let linear = tiled_to_linear(pitch, offset, depth);
                    assert!(!seen[linear as usize], "collision at {:#x}", linear);
                    seen[linear as usize] = true;
                    assert_eq!(linear_to_tiled(pitch, linear, 0, depth), offset);
                }
                assert!(seen.iter().all(|&s| s));
            }
        }
    }

    #[test]
    fn test_untile_to_rgba() {
        let pitch = TilePitch::new(0x200).unwrap();
        let mut tiled = vec![0u8; 0x2000];
        // Pixel (1, 1): surface offset 0x204 -> tiled 0x44
        tiled[0x44..0x48].copy_from_slice(&[0x10, 0x20, 0x30, 0x00]);

        let rgba = untile_to_rgba(&tiled, pitch, 2, 2).unwrap();
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[12..16], &[0x30, 0x20, 0x10, 0xFF]);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_untile_truncated() {
        let pitch = TilePitch::new(0x200).unwrap();
        // Second scanline sits at 0x40
        let tiled = vec![0u8; 0x10];
        assert!(matches!(
            untile_to_rgba(&tiled, pitch, 2, 2),
            Err(Error::SurfaceTruncated { .. })
        ));
    }

    #[test]
    fn test_linear_to_rgba_uses_pitch_stride() {
        let mut linear = vec![0u8; 16 + 8];
        linear[16..20].copy_from_slice(&[1, 2, 3, 4]);
        let rgba = linear_to_rgba(&linear, 16, 2, 2).unwrap();
        assert_eq!(&rgba[8..12], &[3, 2, 1, 0xFF]);
        assert!(linear_to_rgba(&linear[..20], 16, 2, 2).is_err());
    }
}
