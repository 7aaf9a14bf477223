//! Configuration management - user preferences and persistence
//!
//! One explicit field per persisted preference, one load/save pair. No
//! dynamic property bags.

use crate::catalog::CatalogOrder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default soft cap for a triage batch
pub const DEFAULT_BATCH_SIZE: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Roots the filesystem catalog source scans
    pub source_folders: Vec<String>,
    /// Soft cap on how many cards a batch materializes
    pub batch_size: usize,
    /// Catalog presentation order, applied once at load
    pub order: CatalogOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_folders: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            order: CatalogOrder::default(),
        }
    }
}

impl Config {
    /// Get the config directory path (OS-specific)
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gallery-triage")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Load config from file, or return default
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            if let Ok(contents) = fs::read_to_string(&path) {
                if let Ok(config) = serde_json::from_str(&contents) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, json).map_err(|e| e.to_string())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_sane_batch_size() {
        let config = Config::default();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.order, CatalogOrder::NewestFirst);
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = Config {
            source_folders: vec!["/dcim".to_string()],
            batch_size: 12,
            order: CatalogOrder::Shuffled,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.batch_size, 12);
        assert_eq!(back.order, CatalogOrder::Shuffled);
    }
}
