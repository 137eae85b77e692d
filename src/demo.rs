//! In-memory inbox backend
//!
//! Serves a fixed set of items through [`InboxApi`] the way a Lemmy server
//! would: filtered, sorted and offset-paged. Used by `lemmy-inbox demo` and
//! by tests, which can also make it fail on purpose.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::{ApiError, InboxApi, ListQuery};
use crate::models::{Author, FeedItem, ItemKey, ItemKind, SortOrder, UnreadCounts};

#[derive(Default)]
struct DemoState {
    items: Vec<FeedItem>,
    fail_lists: bool,
    failing_kind: Option<ItemKind>,
    fail_marks: bool,
    list_calls: Vec<ListQuery>,
    mark_calls: usize,
}

/// In-memory [`InboxApi`]
#[derive(Default)]
pub struct DemoApi {
    state: Mutex<DemoState>,
}

impl DemoApi {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend seeded with [`demo_items`]
    pub fn sample() -> Self {
        Self::new().with_items(demo_items())
    }

    /// Add items (any mix of kinds)
    pub fn with_items(self, items: Vec<FeedItem>) -> Self {
        self.lock().items.extend(items);
        self
    }

    /// Add an item while in use, as if it just arrived on the server
    pub fn insert(&self, item: FeedItem) {
        self.lock().items.push(item);
    }

    fn lock(&self) -> MutexGuard<'_, DemoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every list and unread-count request fail
    pub fn set_fail_lists(&self, fail: bool) {
        self.lock().fail_lists = fail;
    }

    /// Make list requests for one kind fail
    pub fn set_failing_kind(&self, kind: Option<ItemKind>) {
        self.lock().failing_kind = kind;
    }

    /// Make mark-as-read requests fail
    pub fn set_fail_marks(&self, fail: bool) {
        self.lock().fail_marks = fail;
    }

    /// Every list request received so far, failed ones included
    pub fn list_calls(&self) -> Vec<ListQuery> {
        self.lock().list_calls.clone()
    }

    /// Number of list requests received
    pub fn list_call_count(&self) -> usize {
        self.lock().list_calls.len()
    }

    /// Number of mark-as-read requests received
    pub fn mark_call_count(&self) -> usize {
        self.lock().mark_calls
    }

    /// Server-side copy of an item
    pub fn item(&self, key: ItemKey) -> Option<FeedItem> {
        self.lock().items.iter().find(|item| item.key() == key).cloned()
    }
}

fn outage() -> ApiError {
    ApiError::Server {
        status: 503,
        body: r#"{"error":"demo_outage"}"#.to_string(),
    }
}

impl InboxApi for DemoApi {
    async fn list(&self, query: &ListQuery) -> Result<Vec<FeedItem>, ApiError> {
        let mut state = self.lock();
        state.list_calls.push(query.clone());

        if state.fail_lists || state.failing_kind == Some(query.kind) {
            return Err(outage());
        }

        let mut items: Vec<FeedItem> = state
            .items
            .iter()
            .filter(|item| item.kind == query.kind && !(query.unread_only && item.is_read))
            .cloned()
            .collect();

        // Like the server, lists without a sort parameter are newest first
        let sort = if query.kind.honors_sort() { query.sort } else { SortOrder::New };
        match sort {
            SortOrder::New => items.sort_by(|a, b| b.last_update.cmp(&a.last_update)),
            SortOrder::Old => items.sort_by(|a, b| a.last_update.cmp(&b.last_update)),
        }

        let limit = query.limit as usize;
        let offset = query.page.saturating_sub(1) as usize * limit;
        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    async fn mark_as_read(&self, item: &FeedItem, read: bool) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.mark_calls += 1;

        if state.fail_marks {
            return Err(outage());
        }

        let stored = state
            .items
            .iter_mut()
            .find(|stored| stored.key() == item.key())
            .ok_or_else(|| ApiError::Server {
                status: 404,
                body: r#"{"error":"not_found"}"#.to_string(),
            })?;
        stored.is_read = read;
        Ok(())
    }

    async fn unread_count(&self) -> Result<UnreadCounts, ApiError> {
        let state = self.lock();
        if state.fail_lists {
            return Err(outage());
        }

        let unread = |kind: ItemKind| -> u32 {
            state
                .items
                .iter()
                .filter(|item| item.kind == kind && !item.is_read)
                .count() as u32
        };

        Ok(UnreadCounts {
            replies: unread(ItemKind::Reply),
            mentions: unread(ItemKind::Mention),
            private_messages: unread(ItemKind::Message),
        })
    }
}

/// Minimal unread item stamped `timestamp` seconds after the epoch
pub fn demo_item(kind: ItemKind, id: i64, timestamp: i64) -> FeedItem {
    let last_update = Utc.timestamp_opt(timestamp, 0).single().unwrap_or_default();
    let mut item = FeedItem::new(kind, id, last_update);
    item.author = author(id, "demo", "lemmy.example");
    item.title = format!("{kind} #{id}");
    item
}

fn author(id: i64, name: &str, instance: &str) -> Author {
    Author {
        id,
        name: name.to_string(),
        display_name: None,
        instance: instance.to_string(),
    }
}

/// A small, realistic inbox spread over the last few days
pub fn demo_items() -> Vec<FeedItem> {
    let now: DateTime<Utc> = Utc::now();
    let entries: [(ItemKind, i64, i64, &str, &str, &str, &str, bool); 12] = [
        (ItemKind::Reply, 101, 4, "ferris", "lemmy.ml", "What's everyone building this week?", "A TUI for my homelab dashboards, mostly ratatui.", false),
        (ItemKind::Reply, 102, 95, "kestrel", "lemmy.world", "What's everyone building this week?", "Same here, any tips for handling resize events?", false),
        (ItemKind::Reply, 103, 1_500, "oxide", "programming.dev", "Borrow checker war stories", "You can split the borrow by destructuring the struct first.", true),
        (ItemKind::Reply, 104, 3_100, "ferris", "lemmy.ml", "Borrow checker war stories", "Lifetimes clicked for me after reading the nomicon.", true),
        (ItemKind::Mention, 201, 30, "marten", "beehaw.org", "Favourite federated apps", "@you might know, you wrote that inbox merger.", false),
        (ItemKind::Mention, 202, 2_200, "quill", "lemmy.world", "Self-hosting Lemmy", "Pinging @you since you asked about pict-rs.", true),
        (ItemKind::Message, 301, 12, "marten", "beehaw.org", "", "Hey, are you still moderating the rust community?", false),
        (ItemKind::Message, 302, 720, "kestrel", "lemmy.world", "", "Thanks for the help yesterday!", true),
        (ItemKind::Message, 303, 5_000, "quill", "lemmy.world", "", "Welcome to the instance.", true),
        (ItemKind::PostReport, 401, 60, "watcher", "lemmy.ml", "Buy cheap watches here", "Spam", false),
        (ItemKind::CommentReport, 501, 180, "watcher", "lemmy.ml", "you are all idiots", "Rule 1: be civil", false),
        (ItemKind::CommentReport, 502, 4_000, "oxide", "programming.dev", "off topic rant", "Off topic", true),
    ];

    entries
        .into_iter()
        .map(|(kind, id, minutes_ago, name, instance, title, content, read)| {
            let mut item = FeedItem::new(kind, id, now - Duration::minutes(minutes_ago));
            item.author = author(id, name, instance);
            item.title = if kind == ItemKind::Message {
                format!("Message from {name}")
            } else {
                title.to_string()
            };
            item.content = content.to_string();
            item.is_read = read;
            if matches!(kind, ItemKind::Reply | ItemKind::Mention | ItemKind::CommentReport) {
                item.comment_id = Some(id * 10);
                item.comment_path = Some(format!("0.{}", id * 10));
                item.post_id = Some(id / 2);
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let api = DemoApi::sample();
        let query = ListQuery {
            kind: ItemKind::Reply,
            page: 1,
            sort: SortOrder::New,
            limit: 3,
            unread_only: false,
            force_refresh: false,
        };

        let first = api.list(&query).await.unwrap();
        let ids: Vec<i64> = first.iter().map(|item| item.id).collect();
        assert_eq!(ids, [101, 102, 103]);

        let second = api.list(&ListQuery { page: 2, ..query.clone() }).await.unwrap();
        assert_eq!(second.len(), 1);

        let unread = api.list(&ListQuery { unread_only: true, ..query }).await.unwrap();
        assert!(unread.iter().all(|item| !item.is_read));
        assert_eq!(unread.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_updates_server_copy() {
        let api = DemoApi::sample();
        let key = ItemKey { kind: ItemKind::Message, id: 301 };
        let item = api.item(key).unwrap();

        api.mark_as_read(&item, true).await.unwrap();
        assert!(api.item(key).unwrap().is_read);

        let missing = FeedItem::new(ItemKind::Message, 999, Utc::now());
        assert!(api.mark_as_read(&missing, true).await.is_err());
        assert_eq!(api.mark_call_count(), 2);
    }
}
