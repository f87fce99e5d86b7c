//! YAML configuration I/O
//!
//! Loading never fails: a missing or broken file falls back to defaults so an
//! editor can always open. Saving reports errors to the caller.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a configuration from a YAML file, falling back to `T::default()`
///
/// ```ignore
/// let config: ContourConfig = load_config(Path::new("contour.yaml"));
/// ```
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return T::default();
    }

    let parsed = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))
        .and_then(|contents| parse_config::<T>(&contents));

    match parsed {
        Ok(config) => {
            log::info!("load_config: loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: {:#}, using defaults", e);
            T::default()
        }
    }
}

/// Parse YAML text into a configuration
pub fn parse_config<T: DeserializeOwned>(contents: &str) -> Result<T> {
    serde_yaml::from_str(contents).context("Failed to parse YAML config")
}

/// Save a configuration as YAML, creating parent directories as needed
pub fn save_config<T: Serialize>(config: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContourConfig;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config: ContourConfig = load_config(Path::new("/nonexistent/contour/config.yaml"));
        assert_eq!(config, ContourConfig::default());
    }

    #[test]
    fn test_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "editor: [this is not a map").unwrap();

        let config: ContourConfig = load_config(&path);
        assert_eq!(config, ContourConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("contour.yaml");

        let mut config = ContourConfig::default();
        config.editor.duration = 64.0;
        config.lod.level_bias = 0.25;
        config.waveform.rms.db_mix = 1.0;

        save_config(&config, &path).unwrap();
        let loaded: ContourConfig = load_config(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = parse_config::<ContourConfig>("lod: {levels: many}");
        assert!(result.is_err());
    }
}
