//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting xbmem CLI defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `ram` - Optional default RAM size in MB
/// * `mappings_dir` - Optional directory holding address mapping files
/// * `show` - If true, show current configuration
pub fn handle(ram: Option<u32>, mappings_dir: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config)?;
        return Ok(());
    }

    if ram.is_none() && mappings_dir.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, ram, mappings_dir)?;
    config.save()?;

    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Apply the requested settings
fn apply(config: &mut Config, ram: Option<u32>, mappings_dir: Option<PathBuf>) -> Result<()> {
    if let Some(mb) = ram {
        config.set_ram_mb(mb)?;
        println!("Default RAM size: {} MB", mb);
    }

    if let Some(dir) = mappings_dir {
        println!("Mappings directory: {}", dir.display());
        config.set_mappings_dir(dir);
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) -> Result<()> {
    match config.ram_mb {
        Some(mb) => println!("Default RAM size: {} MB", mb),
        None => println!("No RAM size configured (64 MB assumed)"),
    }

    println!("Mappings directory: {}", config.mappings_dir()?.display());

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }

    Ok(())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: xbmem configure --ram 128");
    println!("   or: xbmem configure --mappings-dir DIR");
    println!("   or: xbmem configure --show");
    println!();
    println!("Note: Retail consoles have 64 MB of RAM, debug kits 128 MB.");
    println!("      Mapping files are named after the title build, e.g. HaloAddressMappings_v1.0.ini.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_usage_does_not_panic() {
        show_usage();
    }

    #[test]
    fn test_apply_settings() {
        let mut config = Config::default();
        apply(&mut config, Some(128), Some(PathBuf::from("/srv/mappings"))).unwrap();
        assert_eq!(config.ram_mb, Some(128));
        assert_eq!(config.mappings_dir, Some(PathBuf::from("/srv/mappings")));
    }

    #[test]
    fn test_apply_rejects_bad_ram() {
        let mut config = Config::default();
        assert!(apply(&mut config, Some(256), None).is_err());
        assert_eq!(config, Config::default());
    }
}
