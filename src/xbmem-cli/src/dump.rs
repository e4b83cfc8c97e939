//! Snapshot File Memory Source
//!
//! Memory source implementation for reading console memory snapshots.
//!
//! A snapshot is a flat file plus an optional `.maps` sidecar listing the
//! console address ranges it holds, one per line:
//!
//! ```text
//! # start      end          size       file offset   [name]
//! 0x80000000   0x84000000   67108864   0x0           physical
//! 0x00010000   0x00011000   4096       0x4000000     xbe_header
//! ```
//!
//! Without a sidecar the file is a raw physical RAM image seen through the
//! `0x80000000` window.

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use xbmem::{MemoryRegion, MemorySource, PHYSICAL_WINDOW};

/// Largest raw image mapped through the physical window
const MAX_RAW_IMAGE: u64 = 0x1000_0000;

/// Memory snapshot file source
pub struct DumpFile {
    /// Memory-mapped snapshot file
    mmap: Mmap,
    /// Console address regions parsed from the maps file
    regions: Vec<MemoryRegion>,
    /// Path to the snapshot file
    pub path: PathBuf,
}

impl DumpFile {
    /// Open a snapshot, using `<snapshot>.maps` when it exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let maps_path = path.with_extension("maps");
        if maps_path.exists() {
            return Self::open_with_maps(path, maps_path.as_path());
        }

        let mmap = Self::map_file(path)?;
        let end = u64::from(PHYSICAL_WINDOW) + (mmap.len() as u64).min(MAX_RAW_IMAGE);
        let regions = vec![MemoryRegion::new(PHYSICAL_WINDOW, end, 0).named("physical")];

        eprintln!(
            "Opened raw snapshot: {:?} ({} MB)",
            path,
            mmap.len() / (1024 * 1024)
        );

        Ok(DumpFile {
            mmap,
            regions,
            path: path.to_path_buf(),
        })
    }

    /// Open a snapshot with an explicit maps file
    pub fn open_with_maps<P: AsRef<Path>>(dump_path: P, maps_path: P) -> Result<Self> {
        let dump_path = dump_path.as_ref();
        let maps_path = maps_path.as_ref();

        let mmap = Self::map_file(dump_path)?;
        let text = fs::read_to_string(maps_path)
            .with_context(|| format!("Failed to read maps file: {:?}", maps_path))?;
        let regions = parse_maps(&text)
            .with_context(|| format!("Failed to parse maps file: {:?}", maps_path))?;

        for region in &regions {
            if region.offset as u64 + region.size() > mmap.len() as u64 {
                bail!(
                    "Region {:#010x}-{:#010x} extends past the end of {:?}",
                    region.start,
                    region.end,
                    dump_path
                );
            }
            tracing::debug!(
                "Region {:#010x}-{:#010x} at file offset {:#x} {}",
                region.start,
                region.end,
                region.offset,
                region.name.as_deref().unwrap_or("")
            );
        }

        eprintln!(
            "Opened snapshot: {:?} ({} MB) with {} regions",
            dump_path,
            mmap.len() / (1024 * 1024),
            regions.len()
        );

        Ok(DumpFile {
            mmap,
            regions,
            path: dump_path.to_path_buf(),
        })
    }

    fn map_file(path: &Path) -> Result<Mmap> {
        let file =
            File::open(path).with_context(|| format!("Failed to open snapshot: {:?}", path))?;

        // SAFETY: the snapshot is opened read-only and not modified while mapped
        unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to mmap snapshot: {:?}", path))
    }
}

/// Parse a maps sidecar: `0xSTART 0xEND SIZE 0xFILE_OFFSET [NAME]`
pub fn parse_maps(text: &str) -> Result<Vec<MemoryRegion>> {
    let mut regions = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            bail!("Line {}: expected START END SIZE FILE_OFFSET", index + 1);
        }

        let start = parse_hex(parts[0]).with_context(|| format!("Line {}: bad start", index + 1))?;
        let end = parse_hex(parts[1]).with_context(|| format!("Line {}: bad end", index + 1))?;
        let offset =
            parse_hex(parts[3]).with_context(|| format!("Line {}: bad file offset", index + 1))?;

        let start = u32::try_from(start)
            .with_context(|| format!("Line {}: start {:#x} is not a 32-bit address", index + 1, start))?;
        if end <= u64::from(start) || end > 1 << 32 {
            bail!("Line {}: invalid range {:#x}-{:#x}", index + 1, start, end);
        }

        let mut region = MemoryRegion::new(start, end, offset as usize);
        if let Some(name) = parts.get(4) {
            region = region.named(*name);
        }
        regions.push(region);
    }

    Ok(regions)
}

fn parse_hex(value: &str) -> Result<u64> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex value: {}", value))
}

impl MemorySource for DumpFile {
    fn read_bytes(&self, address: u32, len: usize) -> xbmem::Result<Vec<u8>> {
        let offset = self
            .regions
            .iter()
            .find_map(|region| region.offset_of(address, len))
            .filter(|offset| offset + len <= self.mmap.len())
            .ok_or_else(|| xbmem::Error::MemoryAccess {
                address,
                len,
                reason: "address not in snapshot".to_string(),
            })?;

        Ok(self.mmap[offset..offset + len].to_vec())
    }

    fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }
}
