//! CLI argument definitions for xbmem
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod snapshot;

pub use core::{Cli, Commands};
pub use snapshot::SnapshotArgs;
