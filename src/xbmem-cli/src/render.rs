//! PNG rendering of page maps and captured frames

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::Path;
use xbmem::{BusyType, PageTableMap, PageUseType, RegionKind};

/// Pages drawn per row
pub const PAGES_PER_ROW: u32 = 128;
/// Pixel edge length of one page
pub const PAGE_SCALE: u32 = 4;
/// Horizontal space between panels
pub const PANEL_GAP: u32 = 8;

const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const ALLOCATED: Rgba<u8> = Rgba([127, 255, 142, 255]);

const fn rgb(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// A tag-to-color mapping; `None` draws the page gray
pub type Palette = fn(PageUseType) -> Option<Rgba<u8>>;

/// Kernel classification colors
pub fn system_color(tag: PageUseType) -> Option<Rgba<u8>> {
    let color = match tag {
        PageUseType::Kernel => rgb(255, 215, 0),
        PageUseType::InstanceMemory => rgb(100, 149, 237),
        PageUseType::PageTableEntries => rgb(128, 0, 128),
        PageUseType::Allocated => ALLOCATED,
        PageUseType::Busy(busy) => match busy {
            BusyType::Stack => rgb(0, 255, 255),
            BusyType::VirtualPte => rgb(255, 140, 0),
            BusyType::SystemPte => rgb(0, 0, 139),
            BusyType::Pool => rgb(255, 0, 0),
            BusyType::VirtualMemory => rgb(255, 165, 0),
            BusyType::SystemMemory => rgb(0, 0, 255),
            BusyType::Image => rgb(0, 128, 0),
            BusyType::FsCache => rgb(165, 42, 42),
            BusyType::Contiguous => rgb(178, 0, 255),
            BusyType::Debugger => rgb(255, 105, 180),
        },
        PageUseType::Free | PageUseType::Region(_) => return None,
    };
    Some(color)
}

/// Title region colors
pub fn title_color(tag: PageUseType) -> Option<Rgba<u8>> {
    let PageUseType::Region(kind) = tag else {
        return None;
    };

    let color = match kind {
        RegionKind::RuntimeData => rgb(0, 0, 128),
        RegionKind::BackBuffer => rgb(0, 0, 0),
        RegionKind::FrontBuffer => rgb(255, 255, 255),
        RegionKind::DepthBuffer => rgb(0, 255, 255),
        RegionKind::TagData => rgb(255, 215, 0),
        RegionKind::RasterizerBuffer => rgb(255, 255, 0),
        RegionKind::TextureCache => rgb(144, 238, 144),
        RegionKind::LowTextureCache => rgb(0, 100, 0),
        RegionKind::GeometryCache => rgb(255, 0, 0),
        RegionKind::SoundCache => rgb(128, 0, 128),
        RegionKind::AnimationCache => rgb(255, 105, 180),
        RegionKind::NetSimMiscCache => rgb(255, 127, 80),
        RegionKind::Other(_) => return None,
    };
    Some(color)
}

/// Free pages gray, everything else green
pub fn used_free_color(tag: PageUseType) -> Option<Rgba<u8>> {
    if tag.is_free() {
        None
    } else {
        Some(ALLOCATED)
    }
}

/// Draw one panel of the map
pub fn render_panel(map: &PageTableMap, palette: Palette) -> RgbaImage {
    let rows = (map.len() as u32).div_ceil(PAGES_PER_ROW);
    let mut img = RgbaImage::from_pixel(PAGES_PER_ROW * PAGE_SCALE, rows * PAGE_SCALE, GRAY);

    for (pfn, tag) in map.pages().iter().enumerate() {
        let color = palette(*tag).unwrap_or(GRAY);
        let x0 = (pfn as u32 % PAGES_PER_ROW) * PAGE_SCALE;
        let y0 = (pfn as u32 / PAGES_PER_ROW) * PAGE_SCALE;
        for dy in 0..PAGE_SCALE {
            for dx in 0..PAGE_SCALE {
                img.put_pixel(x0 + dx, y0 + dy, color);
            }
        }
    }

    img
}

/// System, title and used/free panels side by side
pub fn render_memory_map(map: &PageTableMap) -> RgbaImage {
    let panels = [
        render_panel(map, system_color),
        render_panel(map, title_color),
        render_panel(map, used_free_color),
    ];

    let panel_width = PAGES_PER_ROW * PAGE_SCALE;
    let height = panels[0].height();
    let width = panel_width * 3 + PANEL_GAP * 2;
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

    for (index, panel) in panels.iter().enumerate() {
        let x_offset = index as u32 * (panel_width + PANEL_GAP);
        for (x, y, pixel) in panel.enumerate_pixels() {
            img.put_pixel(x_offset + x, y, *pixel);
        }
    }

    img
}

/// Save RGBA data as PNG
pub fn save_png(rgba_data: &[u8], width: u32, height: u32, path: &Path) -> Result<()> {
    let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, rgba_data.to_vec())
        .context("Failed to create image buffer")?;

    img.save(path)
        .with_context(|| format!("Failed to save PNG to {}", path.display()))?;

    Ok(())
}
