//! Memory Source Trait
//!
//! Core abstraction for reading memory from a console or a snapshot of one.

use super::MemoryRegion;
use crate::error::Result;
use byteorder::{ByteOrder, LE};

/// Trait for reading console memory (live transport, snapshot file, etc.)
///
/// Addresses are 32-bit console addresses. Physical memory is visible through
/// the `0x80000000` window. Implementations report failures as
/// [`Error::MemoryAccess`](crate::Error::MemoryAccess) and never retry.
pub trait MemorySource {
    /// Read bytes from a console address
    fn read_bytes(&self, address: u32, len: usize) -> Result<Vec<u8>>;

    /// Get the list of readable regions
    fn regions(&self) -> &[MemoryRegion];

    /// Read a little-endian u32
    fn read_u32(&self, address: u32) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(LE::read_u32(&bytes))
    }

    /// Read a little-endian i32
    fn read_i32(&self, address: u32) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(LE::read_i32(&bytes))
    }

    /// Find a region containing the given address
    fn find_region(&self, address: u32) -> Option<&MemoryRegion> {
        self.regions().iter().find(|r| r.contains(address))
    }
}
