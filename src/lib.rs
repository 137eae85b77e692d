//! # lemmy-inbox
//!
//! One merged, time-ordered inbox for Lemmy accounts.
//!
//! ## Overview
//!
//! Lemmy keeps comment replies, mentions, private messages and moderator
//! reports in separate paged lists. This crate merges them into logical
//! feeds ("All", "Unread", "Replies", ...) that page lazily, newest first,
//! and handles read-state changes optimistically with rollback.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      InboxRepository                        │
//! │   One merger per feed · mark as read · account switching    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Merger      │ │     Merger      │ │     Merger      │
//! │   (All feed)    │ │  (Unread feed)  │ │      ...        │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │
//!          ├── InboxSource (replies)  ─┐
//!          ├── InboxSource (mentions) ─┼──▶  InboxApi (Lemmy / demo)
//!          └── InboxSource (messages) ─┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Remote inbox trait and the Lemmy HTTP client
//! - [`inbox`] - Sources, k-way merger, repository, unread counts
//! - [`auth`] - Encrypted token storage
//! - [`config`] - Configuration management
//! - [`db`] - `SQLite` database for accounts
//! - [`demo`] - In-memory backend with sample data
//! - [`models`] - Data models (`FeedItem`, `Page`, `Account`, ...)
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lemmy_inbox::api::lemmy::LemmyClient;
//! use lemmy_inbox::inbox::{InboxRepository, InboxSettings};
//! use lemmy_inbox::models::FeedName;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Arc::new(LemmyClient::new("https://lemmy.world", Some("jwt")));
//! let repo = InboxRepository::new(client, InboxSettings::default());
//!
//! let page = repo.get_page(0, FeedName::Unread, false).await?;
//! if let Some(item) = page.items.first() {
//!     repo.mark_as_read(item, true).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/lemmy-inbox/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::type_complexity)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod demo;
pub mod inbox;
pub mod models;
pub mod paths;

// Re-export main types for convenience
pub use config::Config;
pub use db::Database;
pub use inbox::{InboxRepository, InboxSettings};
pub use models::{Account, FeedItem, FeedName, ItemKind, Page};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
