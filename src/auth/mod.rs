//! Login token storage (encrypted file)
//!
//! Tokens are stored encrypted with AES-256-GCM in
//! ~/.config/lemmy-inbox/credentials.enc, keyed by
//! [`Account::credential_key`]. The encryption key is derived from
//! machine-specific identifiers.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result, anyhow};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Account;
use crate::paths;

const NONCE_SIZE: usize = 12;

/// Encrypted token store backed by one file
pub struct CredentialStore {
    path: PathBuf,
    key: [u8; 32],
}

impl CredentialStore {
    /// Store at the default location with the machine-derived key
    pub fn open() -> Result<Self> {
        Ok(Self::at(paths::credentials_path()?, derive_key()))
    }

    /// Store at `path` encrypted with `key`
    pub fn at(path: impl Into<PathBuf>, key: [u8; 32]) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// Save the token for an account
    pub fn store(&self, account: &Account, token: &str) -> Result<()> {
        let mut creds = self.load().unwrap_or_default();
        creds.insert(account.credential_key(), token.to_string());
        self.save(&creds)
    }

    /// Get the token for an account
    pub fn get(&self, account: &Account) -> Result<Option<String>> {
        Ok(self.load()?.get(&account.credential_key()).cloned())
    }

    /// Delete the token for an account
    pub fn delete(&self, account: &Account) -> Result<()> {
        let mut creds = self.load().unwrap_or_default();
        creds.remove(&account.credential_key());
        self.save(&creds)
    }

    /// Check if a token exists for an account
    pub fn contains(&self, account: &Account) -> bool {
        self.get(account).is_ok_and(|token| token.is_some())
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|_| anyhow!("Invalid key length"))
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let encrypted = fs::read(&self.path).context("Failed to read credentials file")?;
        if encrypted.len() < NONCE_SIZE {
            return Ok(HashMap::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt credentials"))?;

        let json = String::from_utf8(plaintext).context("Invalid UTF-8 in credentials")?;
        serde_json::from_str(&json).context("Failed to parse credentials")
    }

    fn save(&self, creds: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string(creds)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce_bytes);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), json.as_bytes())
            .map_err(|_| anyhow!("Failed to encrypt credentials"))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }
        fs::write(&self.path, output).context("Failed to write credentials file")?;
        restrict_permissions(&self.path)?;

        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Get machine ID for key derivation
fn machine_id() -> String {
    #[cfg(target_os = "linux")]
    {
        for path in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(path) {
                return id.trim().to_string();
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(uuid) = stdout
                .lines()
                .find(|line| line.contains("IOPlatformUUID"))
                .and_then(|line| line.split('"').nth(3))
            {
                return uuid.to_string();
            }
        }
    }

    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "lemmy-inbox-fallback-key".to_string())
}

/// Derive encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(b"lemmy-inbox-credentials-v1");
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_get_delete() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("creds.enc"), [7; 32]);
        let account = Account::new("bob", "lemmy.world", "Bob");

        assert!(!store.contains(&account));
        store.store(&account, "jwt-token").unwrap();
        assert_eq!(store.get(&account).unwrap().as_deref(), Some("jwt-token"));

        store.delete(&account).unwrap();
        assert!(store.get(&account).unwrap().is_none());
    }

    #[test]
    fn test_wrong_key_fails_to_decrypt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("creds.enc");
        let account = Account::new("bob", "lemmy.world", "Bob");
        CredentialStore::at(&path, [1; 32]).store(&account, "secret").unwrap();

        let raw = fs::read(&path).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("secret"));
        assert!(CredentialStore::at(&path, [2; 32]).get(&account).is_err());
    }
}
