//! Memory Region Types

use serde::Serialize;

/// A window of console address space backed by a memory source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    pub start: u32,
    /// Exclusive end address (u64 so a region may end at 4 GB)
    pub end: u64,
    /// Offset of `start` within the backing storage
    pub offset: usize,
    pub name: Option<String>,
}

impl MemoryRegion {
    pub fn new(start: u32, end: u64, offset: usize) -> Self {
        Self {
            start,
            end,
            offset,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.end - u64::from(self.start)
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.start && u64::from(address) < self.end
    }

    /// Storage offset of `address`, if `len` bytes from it fit in the region
    pub fn offset_of(&self, address: u32, len: usize) -> Option<usize> {
        if !self.contains(address) {
            return None;
        }
        let relative = (address - self.start) as usize;
        if (u64::from(address) + len as u64) > self.end {
            return None;
        }
        Some(self.offset + relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_region_size() {
        let region = MemoryRegion::new(0x8000_0000, 0x8400_0000, 0);
        assert_eq!(region.size(), 0x0400_0000);
    }

    #[test]
    fn test_memory_region_contains() {
        let region = MemoryRegion::new(0x1000, 0x2000, 0);
        assert!(region.contains(0x1000));
        assert!(region.contains(0x1FFF));
        assert!(!region.contains(0x2000));
        assert!(!region.contains(0xFFF));
    }

    #[test]
    fn test_memory_region_top_of_address_space() {
        let region = MemoryRegion::new(0xFFFF_F000, 0x1_0000_0000, 0x100);
        assert!(region.contains(0xFFFF_FFFF));
        assert_eq!(region.offset_of(0xFFFF_FFFC, 4), Some(0x100 + 0xFFC));
        assert_eq!(region.offset_of(0xFFFF_FFFC, 8), None);
    }

    #[test]
    fn test_memory_region_offset_of() {
        let region = MemoryRegion::new(0x1000, 0x2000, 0x400).named("xbe");
        assert_eq!(region.offset_of(0x1010, 4), Some(0x410));
        assert_eq!(region.offset_of(0x1FFE, 4), None);
        assert_eq!(region.offset_of(0x3000, 1), None);
        assert_eq!(region.name.as_deref(), Some("xbe"));
    }
}
