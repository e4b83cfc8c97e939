//! Title memory layout
//!
//! Walks the title's globals and labels the physical pages behind its
//! runtime data, render targets, streaming caches and network state.

use super::mappings::AddressMappings;
use crate::cache::{map_cache_region, CacheGlobals};
use crate::d3d::{map_render_targets, map_texture, D3dDevice};
use crate::error::{Error, Result};
use crate::pages::{
    pages_for_bytes, MappedRegion, PageTableMap, PageUseType, RegionKind, PAGE_SIZE,
    PHYSICAL_WINDOW,
};
use crate::source::MemorySource;
use serde::Serialize;

/// Rasterizer render targets embedded in the title's target array
pub const RASTERIZER_TARGET_COUNT: u32 = 39;
const RASTERIZER_TARGET_STRIDE: u32 = 0x98;
const RASTERIZER_TARGET_TEXTURE_OFFSET: u32 = 4;

/// Offsets into the active cache file header
const HEADER_TAG_DATA_SIZE_OFFSET: u32 = 0x1C;
const HEADER_LOW_DETAIL_TEXTURE_SIZE_OFFSET: u32 = 0x15C;

/// Regions labelled by [`map_title_data`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct TitleLayout {
    pub runtime_start: u32,
    pub runtime_end: u32,
    pub regions: Vec<MappedRegion>,
}

impl TitleLayout {
    fn mark(
        &mut self,
        map: &mut PageTableMap,
        kind: RegionKind,
        address: u32,
        pages: u32,
    ) -> Result<()> {
        map.mark_pages(address, pages, PageUseType::Region(kind))?;
        self.regions.push(MappedRegion {
            kind,
            address,
            pages,
        });
        Ok(())
    }

    /// Mark a title-allocated array whose pointer lives in `global`
    fn mark_array(
        &mut self,
        source: &dyn MemorySource,
        map: &mut PageTableMap,
        global: u32,
        pages: u32,
    ) -> Result<()> {
        let address = source.read_u32(global)?;
        if address == 0 {
            tracing::debug!("Array at global {:#010x} is not allocated", global);
            return Ok(());
        }
        self.mark(map, RegionKind::NetSimMiscCache, address, pages)
    }
}

/// Page count of a title data array with a trailing allocation bitmap
///
/// `ceil((max_count * size + (1 << alignment) + ceil(max_count / 32) * 4 +
/// modifier) / 4096)`, zero when the total is not positive.
pub fn unknown_array_page_count(max_count: i32, size: u32, alignment: u32, modifier: i32) -> u32 {
    let max_count = i64::from(max_count);
    let rounded = (max_count + 31) / 32;
    let aligned = max_count * i64::from(size) + (1i64 << alignment);
    let total = aligned + rounded * 4 + i64::from(modifier);

    if total <= 0 {
        return 0;
    }
    let pages = (total + i64::from(PAGE_SIZE) - 1) / i64::from(PAGE_SIZE);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Pages needed for `count` entries of `entry_size` bytes
fn array_pages(count: i32, entry_size: u32) -> u32 {
    let bytes = i64::from(count.max(0)) * i64::from(entry_size);
    let pages = (bytes + i64::from(PAGE_SIZE) - 1) / i64::from(PAGE_SIZE);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Label the running title's memory regions on top of a classified map
///
/// Tag data is marked last: it shares its start with the runtime region and
/// is the most specific label for those pages.
pub fn map_title_data(
    source: &dyn MemorySource,
    mappings: &AddressMappings,
    map: &mut PageTableMap,
) -> Result<TitleLayout> {
    let mut layout = TitleLayout {
        runtime_start: source.read_u32(mappings.low_stage_address)? | PHYSICAL_WINDOW,
        runtime_end: source.read_u32(mappings.hi_stage_address)? | PHYSICAL_WINDOW,
        regions: Vec::new(),
    };
    map.mark_range(
        layout.runtime_start,
        layout.runtime_end,
        PageUseType::Region(RegionKind::RuntimeData),
    )?;
    tracing::info!(
        "Runtime data {:#010x}..{:#010x}",
        layout.runtime_start,
        layout.runtime_end
    );

    // D3D render targets
    let device = D3dDevice::from_pointer(source, mappings.d3d_device)?;
    layout
        .regions
        .extend(map_render_targets(source, &device, map)?);

    for i in 0..RASTERIZER_TARGET_COUNT {
        let container = mappings.rasterizer_render_targets
            + i * RASTERIZER_TARGET_STRIDE
            + RASTERIZER_TARGET_TEXTURE_OFFSET;
        layout.regions.extend(map_texture(
            source,
            Some(&device),
            container,
            map,
            RegionKind::RasterizerBuffer,
        )?);
    }

    map_caches(source, mappings, map, &mut layout)?;
    map_network_state(source, mappings, map, &mut layout)?;

    let tag_data_size = source.read_u32(mappings.cache_file_header + HEADER_TAG_DATA_SIZE_OFFSET)?;
    layout.mark(
        map,
        RegionKind::TagData,
        layout.runtime_start,
        pages_for_bytes(tag_data_size),
    )?;

    tracing::info!("Mapped {} title regions", layout.regions.len());
    Ok(layout)
}

fn map_caches(
    source: &dyn MemorySource,
    mappings: &AddressMappings,
    map: &mut PageTableMap,
    layout: &mut TitleLayout,
) -> Result<()> {
    let texture = CacheGlobals {
        name: "texture",
        lruv: mappings.texture_cache,
        base: mappings.texture_cache_base,
        size: None,
    };
    let region = map_cache_region(source, &texture, map, RegionKind::TextureCache)?;
    layout.regions.push(MappedRegion {
        kind: RegionKind::TextureCache,
        address: region.base_address,
        pages: region.page_count,
    });

    // The low detail texture cache has no LRUV table, its size comes from the map header
    let low_detail_size = source
        .read_u32(mappings.cache_file_header + HEADER_LOW_DETAIL_TEXTURE_SIZE_OFFSET)?;
    let low_detail_base = source.read_u32(mappings.low_detail_texture_cache_base)?;
    if low_detail_base == 0 {
        return Err(Error::MissingBaseAddress("low detail texture"));
    }
    layout.mark(
        map,
        RegionKind::LowTextureCache,
        low_detail_base,
        pages_for_bytes(low_detail_size),
    )?;

    let caches = [
        (
            CacheGlobals {
                name: "geometry",
                lruv: mappings.geometry_cache,
                base: mappings.geometry_cache_base,
                size: None,
            },
            RegionKind::GeometryCache,
        ),
        (
            CacheGlobals {
                name: "sound",
                lruv: mappings.sound_cache,
                base: mappings.sound_cache_base,
                size: None,
            },
            RegionKind::SoundCache,
        ),
        (
            CacheGlobals {
                name: "animation",
                lruv: mappings.animation_cache,
                base: mappings.animation_cache_base,
                size: Some(mappings.animation_cache_size_bytes),
            },
            RegionKind::AnimationCache,
        ),
    ];

    for (globals, kind) in &caches {
        let region = map_cache_region(source, globals, map, *kind)?;
        layout.regions.push(MappedRegion {
            kind: *kind,
            address: region.base_address,
            pages: region.page_count,
        });
    }

    Ok(())
}

fn map_network_state(
    source: &dyn MemorySource,
    mappings: &AddressMappings,
    map: &mut PageTableMap,
    layout: &mut TitleLayout,
) -> Result<()> {
    let count = source.read_i32(mappings.something_count)?;
    for (global, entry_size) in [
        (
            mappings.network_channels,
            mappings.network_channels_entry_size,
        ),
        (
            mappings.network_connections,
            mappings.network_connections_entry_size,
        ),
        (
            mappings.network_message_queues,
            mappings.network_message_queues_entry_size,
        ),
    ] {
        layout.mark_array(source, map, global, array_pages(count, entry_size))?;
    }

    let count2 = source.read_i32(mappings.something_count2)?;
    for (global, entry_size) in [
        (
            mappings.simulation_view_data,
            mappings.simulation_view_data_entry_size,
        ),
        (
            mappings.simulation_distributed_view_data,
            mappings.simulation_distributed_view_data_entry_size,
        ),
    ] {
        let pages = unknown_array_page_count(
            count2,
            entry_size,
            0,
            mappings.simulation_data_view_modifier,
        );
        layout.mark_array(source, map, global, pages)?;
    }

    layout.mark_array(
        source,
        map,
        mappings.simulation_distributed_world,
        pages_for_bytes(mappings.simulation_distributed_world_size),
    )?;

    for (global, size_global) in [
        (mappings.network_heap, mappings.network_heap_size),
        (mappings.webstats, mappings.webstats_size),
    ] {
        let size = source.read_u32(size_global)?;
        layout.mark_array(source, map, global, pages_for_bytes(size))?;
    }

    Ok(())
}
