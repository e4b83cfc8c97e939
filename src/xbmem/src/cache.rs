//! LRUV cache region lookup
//!
//! Titles manage their streaming caches (textures, geometry, sound,
//! animations) with LRUV tables. The table itself lives in pool memory while
//! the cached data sits in a separately allocated physical region.

use crate::error::{Error, Result};
use crate::pages::{pages_for_bytes, PageTableMap, PageUseType, RegionKind};
use crate::source::MemorySource;
use serde::Serialize;

/// Signature stored in every LRUV table ("eeew" in memory)
pub const LRUV_SIGNATURE: u32 = 0x7765_6565;

const LRUV_SIGNATURE_OFFSET: u32 = 0x68;
const LRUV_PAGE_COUNT_OFFSET: u32 = 0x30;

/// Globals describing one cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGlobals {
    pub name: &'static str,
    /// Global holding the LRUV table pointer
    pub lruv: u32,
    /// Global holding the cache's base address
    pub base: u32,
    /// Global holding the cache size in bytes, when the table does not track it
    pub size: Option<u32>,
}

/// The physical extent of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheRegion {
    pub base_address: u32,
    pub page_count: u32,
}

/// Locate a cache from its globals
pub fn locate_cache_region(source: &dyn MemorySource, cache: &CacheGlobals) -> Result<CacheRegion> {
    let table = source.read_u32(cache.lruv)?;

    let signature_address = table.wrapping_add(LRUV_SIGNATURE_OFFSET);
    let signature = source.read_u32(signature_address)?;
    if signature != LRUV_SIGNATURE {
        return Err(Error::SignatureMismatch {
            address: signature_address,
            expected: LRUV_SIGNATURE,
            actual: signature,
        });
    }

    let page_count = match cache.size {
        Some(size_address) => pages_for_bytes(source.read_u32(size_address)?),
        None => source.read_u32(table.wrapping_add(LRUV_PAGE_COUNT_OFFSET))?,
    };

    let base_address = source.read_u32(cache.base)?;
    if base_address == 0 {
        return Err(Error::MissingBaseAddress(cache.name));
    }

    tracing::debug!(
        "{} cache at {:#010x}, {} pages",
        cache.name,
        base_address,
        page_count
    );

    Ok(CacheRegion {
        base_address,
        page_count,
    })
}

/// Locate a cache and label its in-use pages
pub fn map_cache_region(
    source: &dyn MemorySource,
    cache: &CacheGlobals,
    map: &mut PageTableMap,
    kind: RegionKind,
) -> Result<CacheRegion> {
    let region = locate_cache_region(source, cache)?;
    map.mark_pages(
        region.base_address,
        region.page_count,
        PageUseType::Region(kind),
    )?;
    Ok(region)
}
