//! Mock Memory Source
//!
//! A sparse in-memory source for testing structure walkers.

use super::{MemoryRegion, MemorySource};
use crate::error::{Error, Result};
use byteorder::{ByteOrder, LE};

/// A sparse mock memory source made of independent byte chunks
#[derive(Default)]
pub struct MockMemorySource {
    chunks: Vec<(u32, Vec<u8>)>,
    regions: Vec<MemoryRegion>,
}

impl MockMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a block of bytes at `base`
    pub fn with_bytes(mut self, base: u32, data: Vec<u8>) -> Self {
        self.add_bytes(base, data);
        self
    }

    pub fn add_bytes(&mut self, base: u32, data: Vec<u8>) {
        self.regions.push(MemoryRegion::new(
            base,
            u64::from(base) + data.len() as u64,
            0,
        ));
        self.chunks.push((base, data));
    }

    /// Write a u32, reusing an existing chunk when one covers the address
    pub fn write_u32(&mut self, address: u32, value: u32) {
        for (base, data) in self.chunks.iter_mut() {
            if address >= *base && (address - *base) as usize + 4 <= data.len() {
                let offset = (address - *base) as usize;
                LE::write_u32(&mut data[offset..offset + 4], value);
                return;
            }
        }
        self.add_bytes(address, value.to_le_bytes().to_vec());
    }

    pub fn with_u32(mut self, address: u32, value: u32) -> Self {
        self.write_u32(address, value);
        self
    }
}

impl MemorySource for MockMemorySource {
    fn read_bytes(&self, address: u32, len: usize) -> Result<Vec<u8>> {
        for (base, data) in &self.chunks {
            if address < *base {
                continue;
            }
            let offset = (address - *base) as usize;
            if offset + len <= data.len() {
                return Ok(data[offset..offset + len].to_vec());
            }
        }

        Err(Error::MemoryAccess {
            address,
            len,
            reason: "address not mapped in mock".to_string(),
        })
    }

    fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_read_bytes() {
        let source = MockMemorySource::new().with_bytes(0x1000, vec![0x41, 0x42, 0x43, 0x44]);

        assert_eq!(source.read_bytes(0x1000, 4).unwrap(), vec![0x41, 0x42, 0x43, 0x44]);
        assert_eq!(source.read_bytes(0x1001, 2).unwrap(), vec![0x42, 0x43]);
    }

    #[test]
    fn test_mock_source_read_u32() {
        let source = MockMemorySource::new().with_bytes(0x1000, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(source.read_u32(0x1000).unwrap(), 0x04030201); // Little-endian
    }

    #[test]
    fn test_mock_source_read_i32() {
        let source = MockMemorySource::new().with_u32(0x2000, 0xFFFF_FFFE);
        assert_eq!(source.read_i32(0x2000).unwrap(), -2);
    }

    #[test]
    fn test_mock_source_write_into_existing_chunk() {
        let source = MockMemorySource::new()
            .with_bytes(0x1000, vec![0; 16])
            .with_u32(0x1008, 0xDEADBEEF);

        assert_eq!(source.read_u32(0x1008).unwrap(), 0xDEADBEEF);
        assert_eq!(source.regions().len(), 1);
    }

    #[test]
    fn test_mock_source_read_unmapped() {
        let source = MockMemorySource::new().with_bytes(0x1000, vec![0; 4]);

        assert!(matches!(
            source.read_bytes(0x1002, 4),
            Err(Error::MemoryAccess { address: 0x1002, len: 4, .. })
        ));
        assert!(source.read_u32(0x500).is_err());
    }

    #[test]
    fn test_mock_source_find_region() {
        let source = MockMemorySource::new()
            .with_bytes(0x1000, vec![0; 0x100])
            .with_bytes(0x8000, vec![0; 0x100]);

        assert_eq!(source.find_region(0x8010).map(|r| r.start), Some(0x8000));
        assert!(source.find_region(0x5000).is_none());
    }
}
