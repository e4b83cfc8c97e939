//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::snapshot::SnapshotArgs;

#[derive(Parser)]
#[command(name = "xbmem")]
#[command(about = "Xbox physical memory maps and front buffer captures", long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify physical memory and render a memory map
    #[command(visible_alias = "m")]
    Map {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        /// Installed RAM in MB (64 or 128, uses configured default if not provided)
        #[arg(long)]
        ram: Option<u32>,

        /// Also label the running title's memory regions
        #[arg(long)]
        title: bool,

        /// Address mapping file (detected from the build signature if not provided)
        #[arg(long)]
        mappings: Option<PathBuf>,

        /// Output PNG path
        #[arg(short, long, default_value = "memory_map.png")]
        output: PathBuf,

        /// Print the page summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Capture the title's front buffer as PNG
    #[command(visible_alias = "f")]
    Frame {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        /// Address mapping file (detected from the build signature if not provided)
        #[arg(long)]
        mappings: Option<PathBuf>,

        /// Output PNG path
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
    },

    /// Decode the pixel container at an address
    #[command(visible_alias = "s")]
    Surface {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        /// Container address (hex with 0x prefix, or decimal)
        address: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate offsets between tiled and linear surface layouts
    #[command(visible_alias = "t")]
    Translate {
        /// Tile pitch in bytes (e.g. 0xA00)
        #[arg(short, long)]
        pitch: String,

        /// Use depth buffer page swapping
        #[arg(long)]
        depth: bool,

        /// Surface-order offset to locate in the tiled region
        #[arg(long, conflicts_with = "linear", required_unless_present = "linear")]
        tiled: Option<String>,

        /// Offset within the tiled region to map back to surface order
        #[arg(long)]
        linear: Option<String>,

        /// Base address added to the surface-order result
        #[arg(long, requires = "linear")]
        base: Option<String>,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Set default installed RAM in MB (64 or 128)
        #[arg(long)]
        ram: Option<u32>,

        /// Set the directory holding address mapping files
        #[arg(long)]
        mappings_dir: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map_command() {
        let cli = Cli::try_parse_from([
            "xbmem", "map", "dump.bin", "--ram", "128", "--title", "-o", "out.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Map {
                snapshot,
                ram,
                title,
                output,
                json,
                ..
            } => {
                assert_eq!(snapshot.snapshot, PathBuf::from("dump.bin"));
                assert!(snapshot.maps.is_none());
                assert_eq!(ram, Some(128));
                assert!(title);
                assert_eq!(output, PathBuf::from("out.png"));
                assert!(!json);
            }
            _ => panic!("expected map command"),
        }
    }

    #[test]
    fn test_translate_requires_one_direction() {
        assert!(Cli::try_parse_from(["xbmem", "translate", "--pitch", "0x200"]).is_err());
        assert!(Cli::try_parse_from([
            "xbmem", "translate", "--pitch", "0x200", "--tiled", "0", "--linear", "0"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["xbmem", "translate", "-p", "0x200", "--tiled", "0x40"]).is_ok());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["xbmem", "surface", "dump.bin", "0x80010000", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
