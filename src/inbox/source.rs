//! One remote list, paged on demand

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::api::{InboxApi, ListQuery};
use crate::models::{FeedItem, ItemKind, SortOrder};

/// Lazily paged stream over one remote list endpoint
///
/// `items` holds everything fetched since the last invalidation; items
/// before `cursor` have been handed to the merger, the rest are buffered.
pub struct InboxSource<A> {
    api: Arc<A>,
    kind: ItemKind,
    unread_only: bool,
    sort: SortOrder,
    limit: u32,
    next_page: u32,
    items: Vec<FeedItem>,
    seen: HashSet<i64>,
    cursor: usize,
    exhausted: bool,
    bypass_cache: bool,
    overrides: HashMap<i64, bool>,
    hidden: HashSet<i64>,
}

impl<A: InboxApi> InboxSource<A> {
    /// Create a source positioned before the first page
    pub fn new(api: Arc<A>, kind: ItemKind, unread_only: bool, sort: SortOrder, limit: u32) -> Self {
        Self {
            api,
            kind,
            unread_only,
            sort,
            limit,
            next_page: 1,
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: 0,
            exhausted: false,
            bypass_cache: false,
            overrides: HashMap::new(),
            hidden: HashSet::new(),
        }
    }

    /// Kind of item this source lists
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Exhausted and nothing left in the buffer
    pub fn is_drained(&self) -> bool {
        self.exhausted && self.cursor >= self.items.len()
    }

    /// Next unconsumed item, fetching pages as needed
    ///
    /// On error nothing is committed, so the call can simply be retried.
    pub async fn peek(&mut self) -> Result<Option<FeedItem>> {
        while self.cursor >= self.items.len() && !self.exhausted {
            self.fetch_next_page().await?;
        }
        Ok(self.items.get(self.cursor).cloned())
    }

    /// Consume the item last returned by [`peek`](Self::peek)
    pub fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
    }

    /// Forget fetched pages; the next peek starts again from page one
    ///
    /// Local read overrides and hidden ids survive.
    pub fn invalidate(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.cursor = 0;
        self.next_page = 1;
        self.exhausted = false;
        self.bypass_cache = true;
    }

    /// Invalidate and also drop local read overrides and hidden ids
    pub fn reset(&mut self) {
        self.invalidate();
        self.overrides.clear();
        self.hidden.clear();
    }

    /// Set the local read flag for `id`, applied to this and later fetches
    ///
    /// Returns the updated item, or `None` when it is not currently fetched.
    pub fn mark_as_read(&mut self, id: i64, read: bool) -> Option<FeedItem> {
        self.overrides.insert(id, read);
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.is_read = read;
        Some(item.clone())
    }

    /// Drop the local read flag for `id` and show `was_read` until refetched
    pub fn revert_read(&mut self, id: i64, was_read: bool) {
        self.overrides.remove(&id);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.is_read = was_read;
        }
    }

    /// Withdraw an item: it is dropped from the buffer and from later fetches
    pub fn hide(&mut self, id: i64) {
        self.hidden.insert(id);
        if let Some(offset) = self.items[self.cursor..].iter().position(|item| item.id == id) {
            self.items.remove(self.cursor + offset);
        }
    }

    /// Undo [`hide`](Self::hide) and any read override for `id`
    pub fn unhide(&mut self, id: i64) {
        self.hidden.remove(&id);
        self.overrides.remove(&id);
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        let query = ListQuery {
            kind: self.kind,
            page: self.next_page,
            sort: self.sort,
            limit: self.limit,
            unread_only: self.unread_only,
            force_refresh: self.bypass_cache,
        };

        let fetched = self
            .api
            .list(&query)
            .await
            .with_context(|| format!("Failed to fetch {} page {}", self.kind, query.page))?;

        tracing::debug!(
            kind = %self.kind,
            page = query.page,
            count = fetched.len(),
            "fetched source page"
        );

        self.exhausted = fetched.is_empty() || fetched.len() < self.limit as usize;
        self.next_page += 1;
        self.bypass_cache = false;

        for mut item in fetched {
            if let Some(&read) = self.overrides.get(&item.id) {
                item.is_read = read;
            }
            if self.hidden.contains(&item.id) || (self.unread_only && item.is_read) {
                continue;
            }
            // Offset paging shifts when new items arrive between requests
            if self.seen.insert(item.id) {
                self.items.push(item);
            }
        }

        Ok(())
    }
}
