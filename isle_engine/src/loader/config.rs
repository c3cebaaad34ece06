//! Engine configuration and loader.
//!
//! Settings live in `isle.toml` in the data directory. Every key is optional;
//! a missing or unreadable file simply leaves the defaults in place.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::save_files::DEFAULT_SAVE_FILE;

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "isle.toml";

/// Runtime settings for the terminal front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The single save slot.
    pub save_file: PathBuf,
    /// Optional RON world replacing the bundled one.
    pub world_file: Option<PathBuf>,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Fixed wrap width; the terminal width is used when unset.
    pub wrap_width: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_file: PathBuf::from(DEFAULT_SAVE_FILE),
            world_file: None,
            display: DisplayConfig::default(),
        }
    }
}

/// Loads the engine configuration from a TOML file, falling back to defaults on error.
///
/// A missing file is normal and logged at `info`; a file that exists but
/// cannot be read or parsed is logged at `warn`.
pub fn load_config(toml_path: &Path) -> EngineConfig {
    if !toml_path.exists() {
        info!("no config at '{}', using defaults", toml_path.display());
        return EngineConfig::default();
    }
    match try_load_config(toml_path) {
        Ok(config) => {
            info!("engine config loaded from '{}'", toml_path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load engine config from '{}': {:#}. Using defaults.",
                toml_path.display(),
                e
            );
            EngineConfig::default()
        },
    }
}

fn try_load_config(toml_path: &Path) -> Result<EngineConfig> {
    let text =
        fs::read_to_string(toml_path).with_context(|| format!("reading config from '{}'", toml_path.display()))?;
    let config: EngineConfig =
        toml::from_str(&text).with_context(|| format!("parsing config from '{}'", toml_path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = load_config(&dir.path().join("isle.toml"));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.save_file, PathBuf::from("savegame.json"));
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("isle.toml");
        fs::write(&path, "[display]\nwrap_width = 72\n")?;
        let config = load_config(&path);
        assert_eq!(config.display.wrap_width, Some(72));
        assert_eq!(config.save_file, PathBuf::from(DEFAULT_SAVE_FILE));
        assert!(config.world_file.is_none());
        Ok(())
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("isle.toml");
        fs::write(&path, "save_file = [not toml")?;
        assert_eq!(load_config(&path), EngineConfig::default());
        Ok(())
    }

    #[test]
    fn bundled_config_parses() -> Result<()> {
        let config: EngineConfig = toml::from_str(include_str!("../../data/isle.toml"))?;
        assert_eq!(config.save_file, PathBuf::from("savegame.json"));
        Ok(())
    }
}
