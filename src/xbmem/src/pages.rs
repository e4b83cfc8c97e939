//! Physical page map
//!
//! One [`PageUseType`] per 4 KB physical frame, refined by region overlays.
//!
//! Overlay rules:
//! - `mark_*` only relabels pages that are already in use
//! - `force_*` relabels every page in the range, including free ones
//! - a range reaching past the end of RAM is rejected before anything is written

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const PAGE_SHIFT: u32 = 12;
pub const PAGE_SIZE: u32 = 1 << PAGE_SHIFT;

/// Start of the kernel's identity mapping of physical memory
pub const PHYSICAL_WINDOW: u32 = 0x8000_0000;

/// Size of the physical map window, larger than any retail or debug kit RAM
const BYTES_IN_PHYSICAL_MAP: u32 = 256 * 1024 * 1024;

/// Address bits between the physical window bit and the 256 MB map
const OUTSIDE_PHYSICAL_MAP: u32 = !(PHYSICAL_WINDOW | (BYTES_IN_PHYSICAL_MAP - 1));

const PAGES_PER_64MB: usize = (64 * 1024 * 1024) / PAGE_SIZE as usize;

/// CPU-visible address of a physical frame
pub const fn pfn_to_physical(pfn: u32) -> u32 {
    PHYSICAL_WINDOW | (pfn << PAGE_SHIFT)
}

/// Physical frame number of a CPU or GPU address
pub const fn physical_to_pfn(address: u32) -> u32 {
    (address & (BYTES_IN_PHYSICAL_MAP - 1)) >> PAGE_SHIFT
}

/// Number of pages needed to hold `bytes`
pub const fn pages_for_bytes(bytes: u32) -> u32 {
    bytes.div_ceil(PAGE_SIZE)
}

/// Installed console RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RamSize {
    /// Retail consoles
    Mb64,
    /// Development kits and upgraded consoles
    Mb128,
}

impl RamSize {
    pub fn from_megabytes(mb: u32) -> Option<Self> {
        match mb {
            64 => Some(RamSize::Mb64),
            128 => Some(RamSize::Mb128),
            _ => None,
        }
    }

    pub fn megabytes(self) -> u32 {
        match self {
            RamSize::Mb64 => 64,
            RamSize::Mb128 => 128,
        }
    }

    pub fn bytes(self) -> u32 {
        self.megabytes() * 1024 * 1024
    }

    pub fn page_count(self) -> usize {
        match self {
            RamSize::Mb64 => PAGES_PER_64MB,
            RamSize::Mb128 => 2 * PAGES_PER_64MB,
        }
    }
}

/// Kernel busy-page subtypes, encoded in PTE bits 28-31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BusyType {
    Stack = 1,
    VirtualPte = 2,
    SystemPte = 3,
    Pool = 4,
    VirtualMemory = 5,
    SystemMemory = 6,
    Image = 7,
    FsCache = 8,
    Contiguous = 9,
    Debugger = 10,
}

impl BusyType {
    pub const ALL: [BusyType; 10] = [
        BusyType::Stack,
        BusyType::VirtualPte,
        BusyType::SystemPte,
        BusyType::Pool,
        BusyType::VirtualMemory,
        BusyType::SystemMemory,
        BusyType::Image,
        BusyType::FsCache,
        BusyType::Contiguous,
        BusyType::Debugger,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=10 => Some(Self::ALL[code as usize - 1]),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            BusyType::Stack => "Stack",
            BusyType::VirtualPte => "VirtualPTE",
            BusyType::SystemPte => "SystemPTE",
            BusyType::Pool => "Pool",
            BusyType::VirtualMemory => "VirtualMemory",
            BusyType::SystemMemory => "SystemMemory",
            BusyType::Image => "Image",
            BusyType::FsCache => "FsCache",
            BusyType::Contiguous => "Contiguous",
            BusyType::Debugger => "Debugger",
        }
    }
}

/// Semantic labels attached by overlays once a page's owner is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RegionKind {
    RuntimeData,
    BackBuffer,
    FrontBuffer,
    DepthBuffer,
    TagData,
    RasterizerBuffer,
    TextureCache,
    LowTextureCache,
    GeometryCache,
    SoundCache,
    AnimationCache,
    NetSimMiscCache,
    Other(&'static str),
}

impl RegionKind {
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::RuntimeData => "RuntimeData",
            RegionKind::BackBuffer => "BackBuffer",
            RegionKind::FrontBuffer => "FrontBuffer",
            RegionKind::DepthBuffer => "DepthBuffer",
            RegionKind::TagData => "TagData",
            RegionKind::RasterizerBuffer => "RasterizerBuffer",
            RegionKind::TextureCache => "TextureCache",
            RegionKind::LowTextureCache => "LowTextureCache",
            RegionKind::GeometryCache => "GeometryCache",
            RegionKind::SoundCache => "SoundCache",
            RegionKind::AnimationCache => "AnimationCache",
            RegionKind::NetSimMiscCache => "NetSimMiscCache",
            RegionKind::Other(name) => name,
        }
    }
}

/// A labelled span of physical memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappedRegion {
    pub kind: RegionKind,
    pub address: u32,
    pub pages: u32,
}

/// What a physical page is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum PageUseType {
    #[default]
    Free,
    Allocated,
    Kernel,
    InstanceMemory,
    PageTableEntries,
    Busy(BusyType),
    Region(RegionKind),
}

impl PageUseType {
    pub fn is_free(self) -> bool {
        self == PageUseType::Free
    }
}

impl fmt::Display for PageUseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageUseType::Free => f.write_str("Free"),
            PageUseType::Allocated => f.write_str("Allocated"),
            PageUseType::Kernel => f.write_str("Kernel"),
            PageUseType::InstanceMemory => f.write_str("InstanceMemory"),
            PageUseType::PageTableEntries => f.write_str("PageTableEntries"),
            PageUseType::Busy(busy) => write!(f, "Busy_{}", busy.name()),
            PageUseType::Region(kind) => f.write_str(kind.name()),
        }
    }
}

/// Per-page classification of console physical memory
#[derive(Debug, Clone)]
pub struct PageTableMap {
    ram: RamSize,
    pages: Vec<PageUseType>,
}

impl PageTableMap {
    /// Create a map with every page free
    pub fn new(ram: RamSize) -> Self {
        Self {
            ram,
            pages: vec![PageUseType::Free; ram.page_count()],
        }
    }

    pub fn ram_size(&self) -> RamSize {
        self.ram
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[PageUseType] {
        &self.pages
    }

    pub fn get(&self, pfn: usize) -> Option<PageUseType> {
        self.pages.get(pfn).copied()
    }

    /// Tag of the page holding `address`
    pub fn at_address(&self, address: u32) -> Option<PageUseType> {
        self.get(physical_to_pfn(address) as usize)
    }

    pub(crate) fn set(&mut self, pfn: usize, tag: PageUseType) {
        self.pages[pfn] = tag;
    }

    /// Label the in-use pages of `[start, end)`
    ///
    /// Non-forced overlays refuse `Free` as a label so used pages are never released.
    pub fn mark_range(&mut self, start: u32, end: u32, tag: PageUseType) -> Result<()> {
        let pages = Self::range_pages(start, end)?;
        self.overlay(start, pages, tag, false)
    }

    /// Label `page_count` in-use pages starting at `start`
    pub fn mark_pages(&mut self, start: u32, page_count: u32, tag: PageUseType) -> Result<()> {
        self.overlay(start, page_count, tag, false)
    }

    /// Label every page of `[start, end)`, free or not
    pub fn force_range(&mut self, start: u32, end: u32, tag: PageUseType) -> Result<()> {
        let pages = Self::range_pages(start, end)?;
        self.overlay(start, pages, tag, true)
    }

    /// Label `page_count` pages starting at `start`, free or not
    pub fn force_pages(&mut self, start: u32, page_count: u32, tag: PageUseType) -> Result<()> {
        self.overlay(start, page_count, tag, true)
    }

    fn range_pages(start: u32, end: u32) -> Result<u32> {
        let bytes = end
            .checked_sub(start)
            .ok_or(Error::InvalidRange { start, end })?;
        Ok(pages_for_bytes(bytes))
    }

    fn overlay(&mut self, start: u32, page_count: u32, tag: PageUseType, forced: bool) -> Result<()> {
        tracing::debug!(
            "Marking {:#010x} for {:#x} bytes as {}{}",
            start,
            u64::from(page_count) * u64::from(PAGE_SIZE),
            tag,
            if forced { " (forced)" } else { "" }
        );

        if !forced && tag.is_free() {
            return Err(Error::FreeOverlay(start));
        }

        let first = physical_to_pfn(start) as usize;
        let last = first + page_count as usize;
        if start & OUTSIDE_PHYSICAL_MAP != 0 || last > self.pages.len() {
            return Err(Error::AddressOutOfRange {
                start,
                pages: page_count,
                ram_mb: self.ram.megabytes(),
            });
        }

        for page in &mut self.pages[first..last] {
            if forced || !page.is_free() {
                *page = tag;
            }
        }

        Ok(())
    }

    /// Page counts per tag
    pub fn summary(&self) -> BTreeMap<PageUseType, usize> {
        let mut counts = BTreeMap::new();
        for page in &self.pages {
            *counts.entry(*page).or_insert(0) += 1;
        }
        counts
    }

    pub fn used_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.is_free()).count()
    }
}
