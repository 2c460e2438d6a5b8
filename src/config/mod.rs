//! # Configuration Management Module
//!
//! Settings for the tracker binary and for anything embedding [`crate::tracker::Tracker`].
//!
//! ## Configuration Structure
//!
//! - [`StorageConfig`] - where the sled database lives
//! - [`LoggingConfig`] - log level and optional log file
//! - [`CatalogConfig`] - adjustments to the librarian trade catalog
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "vetrack.log"
//!
//! [catalog]
//! excluded = ["minecraft:mending"]
//!
//! [catalog.max_level_overrides]
//! "minecraft:efficiency" = 4
//! ```
//!
//! Enchantment ids in `[catalog]` may be written in any case and with or
//! without the `minecraft:` namespace.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl LoggingConfig {
    /// Parsed level; unknown strings fall back to `info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Enchantments to leave out of coverage reports.
    #[serde(default)]
    pub excluded: Vec<String>,
    /// Replace the vanilla maximum level for an enchantment (0 removes it).
    #[serde(default)]
    pub max_level_overrides: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Load `path`, or the defaults when no file exists there.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Create a default configuration file
    pub fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
            catalog: CatalogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).unwrap();
        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.storage.data_dir, "./data");
        assert_eq!(loaded.logging.level, "info");
        assert!(loaded.catalog.excluded.is_empty());
    }

    #[test]
    fn test_catalog_section_is_optional() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "/srv/vetrack"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Debug);
        assert!(config.catalog.max_level_overrides.is_empty());
    }

    #[test]
    fn test_catalog_overrides_parse() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "./data"

            [logging]
            level = "loud"

            [catalog]
            excluded = ["mending"]

            [catalog.max_level_overrides]
            "minecraft:efficiency" = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
        assert_eq!(config.catalog.excluded, vec!["mending".to_string()]);
        assert_eq!(
            config.catalog.max_level_overrides.get("minecraft:efficiency"),
            Some(&4)
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::load("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_load_or_default_only_falls_back_when_absent() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        let config = Config::load_or_default(missing.to_str().unwrap()).unwrap();
        assert_eq!(config.storage.data_dir, "./data");

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[storage]\ndata_dir = \"/srv/vetrack\"\n[catalog\n").unwrap();
        assert!(Config::load_or_default(broken.to_str().unwrap()).is_err());

        let good = dir.path().join("good.toml");
        fs::write(
            &good,
            "[storage]\ndata_dir = \"/srv/vetrack\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        let config = Config::load_or_default(good.to_str().unwrap()).unwrap();
        assert_eq!(config.storage.data_dir, "/srv/vetrack");
    }
}
