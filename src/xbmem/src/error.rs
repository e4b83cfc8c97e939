//! Error types for memory classification and surface decoding

use thiserror::Error;

/// Errors produced while classifying pages or decoding GPU structures
#[derive(Debug, Error)]
pub enum Error {
    #[error("Memory read of {len} bytes at {address:#010x} failed: {reason}")]
    MemoryAccess {
        address: u32,
        len: usize,
        reason: String,
    },

    #[error("Unsupported busy type {code} in PTE {pte:#010x} for page {pfn:#x}")]
    UnsupportedBusyType { code: u8, pte: u32, pfn: usize },

    #[error("PTE database holds {actual} entries, expected {expected}")]
    PteCountMismatch { expected: usize, actual: usize },

    #[error("Signature mismatch at {address:#010x}: expected {expected:#010x}, found {actual:#010x}")]
    SignatureMismatch {
        address: u32,
        expected: u32,
        actual: u32,
    },

    #[error("Address range {start:#010x} + {pages} pages exceeds {ram_mb} MB of physical memory")]
    AddressOutOfRange { start: u32, pages: u32, ram_mb: u32 },

    #[error("Overlay at {0:#010x} cannot label in-use pages as free")]
    FreeOverlay(u32),

    #[error("Invalid address range {start:#010x}..{end:#010x}")]
    InvalidRange { start: u32, end: u32 },

    #[error("Pitch {0:#x} is not a memory controller tile pitch")]
    InvalidPitch(u32),

    #[error("Surface pitch {0:#x} exceeds the largest tile pitch")]
    UntileablePitch(u32),

    #[error("Unsupported pixel format {0:#04x}")]
    UnsupportedPixelFormat(u8),

    #[error("No tile encloses the surface at {0:#010x}")]
    NoEnclosingTile(u32),

    #[error("Surface data of {needed} bytes exceeds the {available} bytes read")]
    SurfaceTruncated { needed: usize, available: usize },

    #[error("Base address for {0} is null")]
    MissingBaseAddress(&'static str),

    #[error("Address mapping '{0}' is missing")]
    MissingMapping(&'static str),

    #[error("Malformed address mapping on line {line}: {reason}")]
    InvalidMapping { line: usize, reason: String },

    #[error("No address mappings for build signature {0:#010x}")]
    UnsupportedBuild(u32),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
