//! Configuration management for xbmem CLI

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xbmem::RamSize;

#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Default installed RAM in MB
    pub ram_mb: Option<u32>,
    /// Directory holding address mapping files
    pub mappings_dir: Option<PathBuf>,
}

impl Config {
    fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("xbmem"))
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Configured RAM size, if any
    pub fn ram_size(&self) -> Result<Option<RamSize>> {
        match self.ram_mb {
            None => Ok(None),
            Some(mb) => match RamSize::from_megabytes(mb) {
                Some(ram) => Ok(Some(ram)),
                None => bail!("Configured RAM size {} MB is not 64 or 128", mb),
            },
        }
    }

    /// Set the default RAM size, rejecting anything but 64 or 128
    pub fn set_ram_mb(&mut self, mb: u32) -> Result<()> {
        if RamSize::from_megabytes(mb).is_none() {
            bail!("RAM size must be 64 or 128, got {}", mb);
        }
        self.ram_mb = Some(mb);
        Ok(())
    }

    /// Directory for address mapping files, falling back to `<config dir>/xbmem/mappings`
    pub fn mappings_dir(&self) -> Result<PathBuf> {
        match &self.mappings_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::config_dir()?.join("mappings")),
        }
    }

    pub fn set_mappings_dir(&mut self, dir: PathBuf) {
        self.mappings_dir = Some(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_ram_mb(128).unwrap();
        config.set_mappings_dir(PathBuf::from("/opt/xbmem/mappings"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.ram_size().unwrap(), Some(RamSize::Mb128));
        assert_eq!(
            loaded.mappings_dir().unwrap(),
            PathBuf::from("/opt/xbmem/mappings")
        );
    }

    #[test]
    fn test_rejects_bad_ram_size() {
        let mut config = Config::default();
        assert!(config.set_ram_mb(96).is_err());
        assert!(config.ram_mb.is_none());

        config.ram_mb = Some(32);
        assert!(config.ram_size().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "ram_mb = \"lots\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
