//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::inbox::InboxSettings;
use crate::models::{FeedName, SortOrder};
use crate::paths;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Feed shown by `inbox` when none is given
    #[serde(default)]
    pub default_feed: FeedName,

    /// Items per feed page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Items requested from the server per list call
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: u32,

    /// Newest or oldest first
    #[serde(default)]
    pub sort: SortOrder,

    /// Whether read items are printed
    #[serde(default = "default_show_read")]
    pub show_read: bool,
}

fn default_page_size() -> usize {
    20
}

fn default_fetch_limit() -> u32 {
    20 // Lemmy caps list limits at 50
}

fn default_show_read() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_feed: FeedName::default(),
            page_size: default_page_size(),
            fetch_limit: default_fetch_limit(),
            sort: SortOrder::default(),
            show_read: default_show_read(),
        }
    }
}

impl Config {
    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = paths::config_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = paths::config_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Paging parameters for the inbox
    pub fn inbox_settings(&self) -> InboxSettings {
        InboxSettings {
            page_size: self.page_size.max(1),
            fetch_limit: self.fetch_limit.clamp(1, 50),
            sort: self.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_feed = \"unread\"\nfetch_limit = 500\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_feed, FeedName::Unread);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.inbox_settings().fetch_limit, 50);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            sort: SortOrder::Old,
            show_read: false,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
