//! Database module for `SQLite` storage of accounts

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::path::Path;
use uuid::Uuid;

use crate::models::Account;
use crate::paths;

const ACCOUNT_COLUMNS: &str =
    "id, username, display_name, instance, is_default, created_at, last_used_at";

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        let path = paths::database_path()?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                display_name TEXT NOT NULL,
                instance TEXT NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_used_at TEXT,
                UNIQUE(username, instance)
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_instance ON accounts(instance);
            ",
        )?;

        Ok(())
    }

    /// Insert an account, replacing an older login for the same user
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO accounts (id, username, display_name, instance, is_default, created_at, last_used_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account.id.to_string(),
                account.username,
                account.display_name,
                account.instance,
                i32::from(account.is_default),
                account.created_at.to_rfc3339(),
                account.last_used_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get all accounts
    pub fn get_accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY instance, username"
        ))?;

        let accounts = stmt.query_map([], row_to_account)?;
        accounts.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get the active account
    pub fn get_default_account(&self) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_default = 1"
        ))?;

        match stmt.query_row([], row_to_account) {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Find an account by username (and instance host, if given)
    pub fn find_account(&self, username: &str, host: Option<&str>) -> Result<Option<Account>> {
        Ok(self.get_accounts()?.into_iter().find(|account| {
            account.username.eq_ignore_ascii_case(username)
                && host.is_none_or(|host| account.host().eq_ignore_ascii_case(host))
        }))
    }

    /// Delete an account
    pub fn delete_account(&self, id: Uuid) -> Result<()> {
        self.conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    /// Make an account the active one
    pub fn set_default_account(&self, id: Uuid) -> Result<()> {
        self.conn.execute("UPDATE accounts SET is_default = 0", params![])?;
        self.conn.execute(
            "UPDATE accounts SET is_default = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;

        Ok(())
    }

    /// Update last used timestamp
    pub fn update_account_last_used(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE accounts SET last_used_at = ?2 WHERE id = ?1",
            params![id.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(5)?;

    Ok(Account {
        id: Uuid::parse_str(&id)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        instance: row.get(3)?,
        is_default: row.get::<_, i32>(4)? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
            .with_timezone(&Utc),
        last_used_at: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let _db = Database::open_path(&path).unwrap();
    }

    #[test]
    fn test_account_crud() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        let account = Account::new("test", "lemmy.world", "Test User");
        db.insert_account(&account).unwrap();

        let accounts = db.get_accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "test");
        assert_eq!(accounts[0].instance, "https://lemmy.world");

        db.delete_account(accounts[0].id).unwrap();
        assert!(db.get_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_single_default_account() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();

        let first = Account::new("alice", "lemmy.ml", "Alice");
        let second = Account::new("alice", "beehaw.org", "Alice");
        db.insert_account(&first).unwrap();
        db.insert_account(&second).unwrap();
        assert!(db.get_default_account().unwrap().is_none());

        db.set_default_account(first.id).unwrap();
        db.set_default_account(second.id).unwrap();
        assert_eq!(db.get_default_account().unwrap().unwrap().id, second.id);

        let found = db.find_account("ALICE", Some("lemmy.ml")).unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }
}
