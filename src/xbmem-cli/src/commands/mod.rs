//! Command handlers for xbmem CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod frame;
pub mod map;
pub mod surface;
pub mod translate;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use xbmem::{AddressMappings, MemorySource};

use crate::cli::SnapshotArgs;
use crate::config::Config;
use crate::dump::DumpFile;

/// Parse an address or offset (hex with 0x prefix, or decimal)
pub fn parse_address(address: &str) -> Result<u32> {
    if address.starts_with("0x") || address.starts_with("0X") {
        u32::from_str_radix(&address[2..], 16).context("Invalid hex address")
    } else {
        address.parse::<u32>().context("Invalid address")
    }
}

/// Open the snapshot named on the command line
pub fn open_snapshot(args: &SnapshotArgs) -> Result<DumpFile> {
    match &args.maps {
        Some(maps) => DumpFile::open_with_maps(args.snapshot.as_path(), maps.as_path()),
        None => DumpFile::open(&args.snapshot),
    }
}

/// Load address mappings from an explicit file or the build's default file
pub fn load_mappings(
    source: &dyn MemorySource,
    path: Option<&Path>,
    config: &Config,
) -> Result<AddressMappings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let (signature, file) =
                xbmem::halo::detect_build(source).context("Failed to detect title build")?;
            eprintln!("Detected build {:#010x}, using {}", signature, file);
            config.mappings_dir()?.join(file)
        }
    };

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read address mappings: {}", path.display()))?;

    AddressMappings::parse(&text)
        .with_context(|| format!("Invalid address mappings: {}", path.display()))
}
