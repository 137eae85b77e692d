//! API clients for the inbox endpoints

mod error;
pub mod lemmy;

pub use error::ApiError;

use crate::models::{FeedItem, ItemKind, SortOrder, UnreadCounts};

/// Parameters of one remote list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Which list to read
    pub kind: ItemKind,
    /// One-based page number
    pub page: u32,
    /// Requested order
    pub sort: SortOrder,
    /// Page size requested from the server
    pub limit: u32,
    /// Only unread (or unresolved) items
    pub unread_only: bool,
    /// Bypass any HTTP cache between us and the server
    pub force_refresh: bool,
}

/// Remote inbox operations
///
/// One implementation serves every item kind; the kind is carried in the
/// query or the item.
#[allow(async_fn_in_trait)]
pub trait InboxApi {
    /// Fetch one page of a list
    async fn list(&self, query: &ListQuery) -> Result<Vec<FeedItem>, ApiError>;

    /// Mark an item read/unread (resolve/unresolve for reports)
    async fn mark_as_read(&self, item: &FeedItem, read: bool) -> Result<(), ApiError>;

    /// Get the unread counters
    async fn unread_count(&self) -> Result<UnreadCounts, ApiError>;
}
