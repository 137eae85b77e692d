//! Account model for stored logins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored Lemmy login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: Uuid,
    /// Username on the instance
    pub username: String,
    /// Display name (for output)
    pub display_name: String,
    /// Instance base URL (e.g. `https://lemmy.world`)
    pub instance: String,
    /// Whether this is the active account
    pub is_default: bool,
    /// When the account was added
    pub created_at: DateTime<Utc>,
    /// Last used timestamp
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account
    pub fn new(username: &str, instance: &str, display_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            instance: normalize_instance(instance),
            is_default: false,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    /// Host part of the instance URL
    pub fn host(&self) -> &str {
        self.instance
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }

    /// Get the full handle with instance
    pub fn full_handle(&self) -> String {
        format!("@{}@{}", self.username, self.host())
    }

    /// Key under which the account's token is stored
    pub fn credential_key(&self) -> String {
        format!("lemmy:{}:{}", self.host(), self.id)
    }
}

/// Add `https://` when missing and drop trailing slashes
pub fn normalize_instance(instance: &str) -> String {
    let instance = instance.trim().trim_end_matches('/');
    if instance.starts_with("http://") || instance.starts_with("https://") {
        instance.to_string()
    } else {
        format!("https://{instance}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_is_normalized() {
        let account = Account::new("bob", "lemmy.world/", "Bob");
        assert_eq!(account.instance, "https://lemmy.world");
        assert_eq!(account.full_handle(), "@bob@lemmy.world");
        assert!(account.credential_key().starts_with("lemmy:lemmy.world:"));
    }
}
