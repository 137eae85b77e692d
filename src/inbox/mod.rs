//! Inbox aggregation: paged sources merged into time-ordered feeds
//!
//! ```text
//! InboxRepository ── one MultiSourceMerger per FeedName
//!                          │
//!                          ├── InboxSource (replies)
//!                          ├── InboxSource (mentions)
//!                          └── InboxSource (messages)
//! ```
//!
//! Sources page lazily through one remote list each. A merger repeatedly
//! peeks every source and takes the newest head, so only as many remote
//! pages are fetched as the requested feed page needs.

mod merger;
mod repository;
mod source;
mod unread;

pub use merger::MultiSourceMerger;
pub use repository::InboxRepository;
pub use source::InboxSource;
pub use unread::UnreadCountTracker;

use crate::models::{FeedName, SortOrder};

/// Paging parameters shared by every feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxSettings {
    /// Items per feed page
    pub page_size: usize,
    /// Items requested per remote page
    pub fetch_limit: u32,
    /// Merge and request order
    pub sort: SortOrder,
}

impl Default for InboxSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            fetch_limit: 20,
            sort: SortOrder::New,
        }
    }
}

/// Notifications emitted by [`InboxRepository`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxEvent {
    /// Cached pages of this feed were dropped; reload to show them
    Invalidated(FeedName),
    /// Read state changed on the server; unread counters need a refresh
    UnreadCountStale,
}
