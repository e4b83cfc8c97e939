//! # xbmem
//!
//! Original Xbox physical memory classifier and GPU surface decoder.
//!
//! This library provides functionality to:
//! - Classify every physical page from the kernel's PTE database
//! - Label pages owned by a running title (render targets, caches, tag data)
//! - Decode D3D pixel containers and tile registers
//! - Translate between tiled and linear surface addresses
//! - Capture the front buffer as RGBA
//!
//! ## Example
//!
//! ```no_run
//! use xbmem::{read_page_table_map, AddressMappings, MemorySource, RamSize};
//!
//! # fn run(source: &dyn MemorySource, mapping_text: &str) -> xbmem::Result<()> {
//! let mut map = read_page_table_map(source, RamSize::Mb64)?;
//!
//! let mappings = AddressMappings::parse(mapping_text)?;
//! xbmem::map_title_data(source, &mappings, &mut map)?;
//!
//! for (tag, pages) in map.summary() {
//!     println!("{:<24} {}", tag.to_string(), pages);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod d3d;
pub mod error;
pub mod halo;
pub mod pages;
pub mod pte;
pub mod source;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use pages::{
    pages_for_bytes, pfn_to_physical, physical_to_pfn, BusyType, MappedRegion, PageTableMap,
    PageUseType, RamSize, RegionKind, PAGE_SIZE, PHYSICAL_WINDOW,
};
#[doc(inline)]
pub use pte::{classify, classify_bytes, decode_pte, read_page_table_map, read_pte_database};
#[doc(inline)]
pub use source::{MemoryRegion, MemorySource};

// Title and GPU structures
#[doc(inline)]
pub use cache::{locate_cache_region, map_cache_region, CacheGlobals, CacheRegion};
#[doc(inline)]
pub use d3d::{
    linear_to_tiled, map_render_targets, tiled_pitch, tiled_to_linear, untile_to_rgba,
    D3dDevice, D3dFormat, PixelContainer, Tile, TilePitch,
};
#[doc(inline)]
pub use halo::{
    capture_front_buffer, map_title_data, mapping_file_for_signature, AddressMappings,
    FrameCapture, TitleLayout,
};
