//! K-way merge of several sources into one ordered feed

use anyhow::Result;
use futures::future::try_join_all;

use crate::api::InboxApi;
use crate::models::{FeedItem, ItemKey, Page, SortOrder};

use super::InboxSource;

/// Merges N sources into one list ordered by `last_update`
///
/// Merged items are kept in an accumulator; their positions are stable
/// until the next invalidation, which always resets the whole list.
pub struct MultiSourceMerger<A> {
    sources: Vec<InboxSource<A>>,
    sort: SortOrder,
    page_size: usize,
    merged: Vec<FeedItem>,
    has_more: bool,
}

impl<A: InboxApi> MultiSourceMerger<A> {
    /// Create a merger over `sources`; ties go to the earlier source
    pub fn new(sources: Vec<InboxSource<A>>, sort: SortOrder, page_size: usize) -> Self {
        Self {
            sources,
            sort,
            page_size: page_size.max(1),
            merged: Vec::new(),
            has_more: true,
        }
    }

    /// Whether nothing has been merged yet
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Get page `index`, merging more items as needed
    ///
    /// A failure from any source aborts the request; items merged in
    /// earlier rounds stay, nothing from the failed round is committed.
    pub async fn get_page(&mut self, index: usize, force: bool) -> Result<Page> {
        if force {
            self.invalidate();
        }

        // No feed holds usize::MAX items, so an unaddressable page is empty
        let Some(end) = index.checked_add(1).and_then(|n| n.checked_mul(self.page_size)) else {
            return Ok(Page {
                index,
                items: Vec::new(),
                has_more: false,
            });
        };
        let start = end - self.page_size;

        while self.merged.len() < end && self.has_more {
            let heads = try_join_all(self.sources.iter_mut().map(|source| source.peek())).await?;

            match pick_head(heads, self.sort) {
                Some((winner, item)) => {
                    self.merged.push(item);
                    self.sources[winner].advance();
                }
                None => self.has_more = false,
            }
        }

        if self.has_more && self.sources.iter().all(InboxSource::is_drained) {
            self.has_more = false;
        }

        let len = self.merged.len();
        let items = self.merged[start.min(len)..end.min(len)].to_vec();
        tracing::debug!(index, count = items.len(), merged = len, "served page");

        Ok(Page {
            index,
            items,
            has_more: self.has_more || end < len,
        })
    }

    /// Flip the read flag of `key` in every source of its kind
    ///
    /// Returns the updated item if one of them had it fetched.
    pub fn mark_as_read(&mut self, key: ItemKey, read: bool) -> Option<FeedItem> {
        let mut updated = None;
        for source in self.sources.iter_mut().filter(|s| s.kind() == key.kind) {
            if let Some(item) = source.mark_as_read(key.id, read) {
                updated = Some(item);
            }
        }

        if let Some(item) = self.merged.iter_mut().find(|item| item.key() == key) {
            item.is_read = read;
        }
        updated
    }

    /// Undo [`mark_as_read`](Self::mark_as_read): show `was_read` and
    /// forget the local flag so the next fetch takes the server's
    pub fn revert_read(&mut self, key: ItemKey, was_read: bool) {
        for source in self.sources.iter_mut().filter(|s| s.kind() == key.kind) {
            source.revert_read(key.id, was_read);
        }
        if let Some(item) = self.merged.iter_mut().find(|item| item.key() == key) {
            item.is_read = was_read;
        }
    }

    /// Drop `key` from the merged list and keep it out of later fetches
    pub fn remove(&mut self, key: ItemKey) {
        self.merged.retain(|item| item.key() != key);
        for source in self.sources.iter_mut().filter(|s| s.kind() == key.kind) {
            source.hide(key.id);
        }
    }

    /// Undo [`remove`](Self::remove); visible after the next invalidation
    pub fn restore(&mut self, key: ItemKey) {
        for source in self.sources.iter_mut().filter(|s| s.kind() == key.kind) {
            source.unhide(key.id);
        }
    }

    /// Clear merged items and invalidate every source
    pub fn invalidate(&mut self) {
        self.merged.clear();
        self.has_more = true;
        for source in &mut self.sources {
            source.invalidate();
        }
    }

    /// Invalidate and forget all local read state
    pub fn reset(&mut self) {
        self.invalidate();
        for source in &mut self.sources {
            source.reset();
        }
    }
}

/// Index and item of the head that goes next
///
/// Only timestamps are compared, so on ties the first source wins.
fn pick_head(heads: Vec<Option<FeedItem>>, sort: SortOrder) -> Option<(usize, FeedItem)> {
    let mut best: Option<(usize, FeedItem)> = None;

    for (index, item) in heads.into_iter().enumerate() {
        let Some(item) = item else { continue };
        let better = match &best {
            None => true,
            Some((_, current)) => match sort {
                SortOrder::New => item.last_update > current.last_update,
                SortOrder::Old => item.last_update < current.last_update,
            },
        };
        if better {
            best = Some((index, item));
        }
    }

    best
}
