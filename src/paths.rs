//! Common paths for local data
//!
//! Everything lives under ~/.config/lemmy-inbox/ on all platforms:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted login tokens
//! - accounts.sqlite - Stored accounts

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the data directory (~/.config/lemmy-inbox/), creating it if needed
pub fn data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("lemmy-inbox");
    fs::create_dir_all(&dir).context("Failed to create data directory")?;
    Ok(dir)
}

/// Get the config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}

/// Get the database file path
pub fn database_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("accounts.sqlite"))
}

/// Get the credentials file path
pub fn credentials_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("credentials.enc"))
}
