//! D3D device state: frame buffers, depth buffer and memory controller tiles

use super::surface::PixelContainer;
use crate::error::{Error, Result};
use crate::pages::{pages_for_bytes, MappedRegion, PageTableMap, PageUseType, RegionKind};
use crate::source::MemorySource;
use byteorder::{ByteOrder, LE};
use serde::Serialize;

/// Offsets into the D3D device structure
pub const FRAME_BUFFER_COUNT_OFFSET: u32 = 0x1A10;
pub const FRAME_BUFFER_OFFSET: u32 = 0x1A14;
pub const DEPTH_BUFFER_OFFSET: u32 = 0x1A20;
pub const TILE_ARRAY_OFFSET: u32 = 0x1AC0;

/// Frame buffer pointers sit between the count and the depth buffer pointer
const MAX_FRAME_BUFFERS: u32 = (DEPTH_BUFFER_OFFSET - FRAME_BUFFER_OFFSET) / 4;

pub const TILE_COUNT: u32 = 8;
pub const TILE_SIZE: usize = 24;

/// A memory controller tile register set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Tile {
    pub flags: u32,
    pub address: u32,
    pub size: u32,
    pub pitch: u32,
    pub z_start_tag: u32,
    pub z_offset: u32,
}

impl Tile {
    /// Decode a 24-byte little-endian tile record
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < TILE_SIZE {
            return Err(Error::SurfaceTruncated {
                needed: TILE_SIZE,
                available: bytes.len(),
            });
        }
        Ok(Self {
            flags: LE::read_u32(&bytes[0..4]),
            address: LE::read_u32(&bytes[4..8]),
            size: LE::read_u32(&bytes[8..12]),
            pitch: LE::read_u32(&bytes[12..16]),
            z_start_tag: LE::read_u32(&bytes[16..20]),
            z_offset: LE::read_u32(&bytes[20..24]),
        })
    }

    pub fn read(source: &dyn MemorySource, address: u32) -> Result<Self> {
        let bytes = source.read_bytes(address, TILE_SIZE)?;
        Self::parse(&bytes)
    }

    /// Whether `[start, start + len)` lies entirely inside this tile
    pub fn encloses(&self, start: u32, len: u32) -> bool {
        let tile_end = u64::from(self.address) + u64::from(self.size);
        self.address <= start && u64::from(start) + u64::from(len) <= tile_end
    }
}

/// The global D3D device of a running title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D3dDevice {
    address: u32,
}

impl D3dDevice {
    pub fn new(address: u32) -> Self {
        Self { address }
    }

    /// Dereference the title's device pointer global
    pub fn from_pointer(source: &dyn MemorySource, pointer: u32) -> Result<Self> {
        Ok(Self::new(source.read_u32(pointer)?))
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn frame_buffer_count(&self, source: &dyn MemorySource) -> Result<u32> {
        let count = source.read_i32(self.address + FRAME_BUFFER_COUNT_OFFSET)?;
        let count = u32::try_from(count).unwrap_or(0);
        if count > MAX_FRAME_BUFFERS {
            tracing::warn!(
                "Device reports {} frame buffers, only {} are mapped",
                count,
                MAX_FRAME_BUFFERS
            );
        }
        Ok(count.min(MAX_FRAME_BUFFERS))
    }

    /// Pointer to the pixel container of frame buffer `index`
    pub fn frame_buffer(&self, source: &dyn MemorySource, index: u32) -> Result<u32> {
        source.read_u32(self.address + FRAME_BUFFER_OFFSET + index * 4)
    }

    /// Pointer to the depth buffer's pixel container
    pub fn depth_buffer(&self, source: &dyn MemorySource) -> Result<u32> {
        source.read_u32(self.address + DEPTH_BUFFER_OFFSET)
    }

    pub fn tile(&self, source: &dyn MemorySource, index: u32) -> Result<Tile> {
        Tile::read(
            source,
            self.address + TILE_ARRAY_OFFSET + index * TILE_SIZE as u32,
        )
    }

    pub fn tiles(&self, source: &dyn MemorySource) -> Result<Vec<Tile>> {
        (0..TILE_COUNT).map(|i| self.tile(source, i)).collect()
    }

    /// Whether some tile starts exactly at `cpu_address`
    pub fn is_tiled(&self, source: &dyn MemorySource, cpu_address: u32) -> Result<bool> {
        for i in 0..TILE_COUNT {
            let tile_address =
                source.read_u32(self.address + TILE_ARRAY_OFFSET + i * TILE_SIZE as u32 + 4)?;
            if tile_address == cpu_address {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// First tile enclosing `[start, start + len)`
    pub fn enclosing_tile(
        &self,
        source: &dyn MemorySource,
        start: u32,
        len: u32,
    ) -> Result<Option<Tile>> {
        Ok(self
            .tiles(source)?
            .into_iter()
            .find(|tile| tile.encloses(start, len)))
    }
}

/// Mark the pages backing the pixel container at `container_address`
///
/// Null container pointers and containers without data are skipped. When a
/// device is given, a surface sitting at a tile's base address is sized with
/// its tiled pitch.
pub fn map_texture(
    source: &dyn MemorySource,
    device: Option<&D3dDevice>,
    container_address: u32,
    map: &mut PageTableMap,
    kind: RegionKind,
) -> Result<Option<MappedRegion>> {
    if container_address == 0 {
        tracing::debug!("Skipping null {} container", kind.name());
        return Ok(None);
    }

    let texture = PixelContainer::read(source, container_address)?;
    if texture.data == 0 {
        return Ok(None);
    }

    let tiled = match device {
        Some(device) => device.is_tiled(source, texture.cpu_address())?,
        None => false,
    };

    let pages = if tiled {
        pages_for_bytes(texture.tiled_pitch()? * texture.height())
    } else {
        texture.page_count()
    };

    let region = MappedRegion {
        kind,
        address: texture.cpu_address(),
        pages,
    };
    map.mark_pages(region.address, region.pages, PageUseType::Region(kind))?;
    Ok(Some(region))
}

/// Mark the device's frame buffers and depth buffer
///
/// Frame buffer 1 is the front buffer, all others are back buffers.
pub fn map_render_targets(
    source: &dyn MemorySource,
    device: &D3dDevice,
    map: &mut PageTableMap,
) -> Result<Vec<MappedRegion>> {
    let mut regions = Vec::new();
    for i in 0..device.frame_buffer_count(source)? {
        let kind = if i == 1 {
            RegionKind::FrontBuffer
        } else {
            RegionKind::BackBuffer
        };
        let container = device.frame_buffer(source, i)?;
        regions.extend(map_texture(source, Some(device), container, map, kind)?);
    }

    let depth = device.depth_buffer(source)?;
    regions.extend(map_texture(
        source,
        Some(device),
        depth,
        map,
        RegionKind::DepthBuffer,
    )?);
    Ok(regions)
}
