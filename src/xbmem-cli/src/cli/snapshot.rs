//! Arguments shared by commands that read a memory snapshot

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Memory snapshot file
    pub snapshot: PathBuf,

    /// Region list for the snapshot (defaults to <snapshot>.maps when present)
    #[arg(long)]
    pub maps: Option<PathBuf>,
}
