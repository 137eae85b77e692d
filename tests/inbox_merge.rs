//! Integration tests for merged inbox feeds.
//!
//! Every test runs the real repository, mergers and sources against the
//! in-memory demo backend, which pages and filters like a Lemmy server.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lemmy_inbox::api::{ApiError, InboxApi, ListQuery};
use lemmy_inbox::demo::{DemoApi, demo_item};
use lemmy_inbox::inbox::{InboxRepository, InboxSettings, InboxSource, MultiSourceMerger};
use lemmy_inbox::models::{FeedItem, FeedName, ItemKey, ItemKind, SortOrder, UnreadCounts};
use proptest::prelude::*;

fn settings(page_size: usize, fetch_limit: u32) -> InboxSettings {
    InboxSettings {
        page_size,
        fetch_limit,
        sort: SortOrder::New,
    }
}

fn items_from(kind: ItemKind, timestamps: &[i64]) -> Vec<FeedItem> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| demo_item(kind, i as i64 + 1, ts))
        .collect()
}

/// Walk every page of `feed` until `has_more` is false
async fn drain(repo: &InboxRepository<DemoApi>, feed: FeedName) -> Vec<FeedItem> {
    let mut all = Vec::new();
    let mut index = 0;
    loop {
        let page = repo.get_page(index, feed, false).await.unwrap();
        all.extend(page.items);
        if !page.has_more {
            return all;
        }
        index += 1;
    }
}

/// Demo backend whose message list hangs until the gate opens
struct GatedApi {
    inner: DemoApi,
    open: AtomicBool,
}

impl InboxApi for GatedApi {
    async fn list(&self, query: &ListQuery) -> Result<Vec<FeedItem>, ApiError> {
        if query.kind == ItemKind::Message && !self.open.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.list(query).await
    }

    async fn mark_as_read(&self, item: &FeedItem, read: bool) -> Result<(), ApiError> {
        self.inner.mark_as_read(item, read).await
    }

    async fn unread_count(&self) -> Result<UnreadCounts, ApiError> {
        self.inner.unread_count().await
    }
}

// ============================================================================
// Ordering and completeness
// ============================================================================

proptest! {
    #[test]
    fn merged_feed_is_ordered_complete_and_unique(
        replies in prop::collection::vec(0i64..1_000, 0..15),
        mentions in prop::collection::vec(0i64..1_000, 0..15),
        messages in prop::collection::vec(0i64..1_000, 0..15),
        page_size in 1usize..7,
        fetch_limit in 1u32..6,
    ) {
        let mut items = items_from(ItemKind::Reply, &replies);
        items.extend(items_from(ItemKind::Mention, &mentions));
        items.extend(items_from(ItemKind::Message, &messages));
        let expected: HashSet<ItemKey> = items.iter().map(FeedItem::key).collect();

        let api = Arc::new(DemoApi::new().with_items(items));
        let repo = InboxRepository::new(api, settings(page_size, fetch_limit));
        let merged = tokio_test::block_on(drain(&repo, FeedName::All));

        for pair in merged.windows(2) {
            prop_assert!(pair[0].last_update >= pair[1].last_update);
        }

        let keys: Vec<ItemKey> = merged.iter().map(FeedItem::key).collect();
        let unique: HashSet<ItemKey> = keys.iter().copied().collect();
        prop_assert_eq!(keys.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }
}

#[tokio::test]
async fn test_old_sort_keeps_mixed_feeds_newest_first() {
    let api = Arc::new(DemoApi::sample());
    let settings = InboxSettings {
        sort: SortOrder::Old,
        ..settings(4, 2)
    };
    let repo = InboxRepository::new(api, settings);

    // Messages ignore the sort parameter, so All stays newest first
    let all = drain(&repo, FeedName::All).await;
    assert_eq!(all.len(), 9);
    for pair in all.windows(2) {
        assert!(pair[0].last_update >= pair[1].last_update);
    }

    let replies = drain(&repo, FeedName::Replies).await;
    assert_eq!(replies.len(), 4);
    for pair in replies.windows(2) {
        assert!(pair[0].last_update <= pair[1].last_update);
    }
}

#[tokio::test]
async fn test_newest_head_wins_regardless_of_source_order() {
    let api = Arc::new(DemoApi::new().with_items(vec![
        demo_item(ItemKind::Reply, 1, 100),
        demo_item(ItemKind::Mention, 1, 95),
        demo_item(ItemKind::Message, 1, 98),
    ]));
    let repo = InboxRepository::new(api, settings(3, 10));

    let page = repo.get_page(0, FeedName::All, false).await.unwrap();
    let stamps: Vec<i64> = page.items.iter().map(|i| i.last_update.timestamp()).collect();
    assert_eq!(stamps, [100, 98, 95]);
}

#[tokio::test]
async fn test_exhausted_source_returns_short_page() {
    let api = Arc::new(DemoApi::new().with_items(vec![
        demo_item(ItemKind::Message, 1, 20),
        demo_item(ItemKind::Message, 2, 10),
    ]));
    let repo = InboxRepository::new(api, settings(5, 5));

    let page = repo.get_page(0, FeedName::Messages, false).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(!page.has_more);
}

// ============================================================================
// Paging state
// ============================================================================

#[tokio::test]
async fn test_repeated_page_is_identical_and_cached() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(4, 2));

    let first = repo.get_page(0, FeedName::All, false).await.unwrap();
    let calls = api.list_call_count();
    let second = repo.get_page(0, FeedName::All, false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(api.list_call_count(), calls);
}

#[tokio::test]
async fn test_invalidate_refetches_from_first_page() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(6, 2));

    drain(&repo, FeedName::Replies).await;
    let before = api.list_call_count();

    repo.invalidate(FeedName::Replies).await;
    repo.get_page(0, FeedName::Replies, false).await.unwrap();

    let refetched = &api.list_calls()[before..];
    assert_eq!(refetched[0].page, 1);
    assert!(refetched[0].force_refresh);
}

#[tokio::test]
async fn test_forced_page_sees_new_items() {
    let api = Arc::new(DemoApi::new().with_items(vec![demo_item(ItemKind::Reply, 1, 10)]));
    let repo = InboxRepository::new(Arc::clone(&api), settings(5, 5));
    repo.get_page(0, FeedName::All, false).await.unwrap();

    api.insert(demo_item(ItemKind::Mention, 9, 50));

    let cached = repo.get_page(0, FeedName::All, false).await.unwrap();
    assert_eq!(cached.items.len(), 1);

    let page = repo.get_page(0, FeedName::All, true).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].key(), ItemKey { kind: ItemKind::Mention, id: 9 });
}

#[tokio::test]
async fn test_dropped_page_request_commits_nothing() {
    let api = Arc::new(GatedApi {
        inner: DemoApi::new().with_items(vec![
            demo_item(ItemKind::Reply, 1, 100),
            demo_item(ItemKind::Reply, 2, 80),
            demo_item(ItemKind::Message, 3, 90),
        ]),
        open: AtomicBool::new(false),
    });
    let sources = [ItemKind::Reply, ItemKind::Mention, ItemKind::Message]
        .into_iter()
        .map(|kind| InboxSource::new(Arc::clone(&api), kind, false, SortOrder::New, 5))
        .collect();
    let mut merger = MultiSourceMerger::new(sources, SortOrder::New, 3);

    let pending = tokio::time::timeout(Duration::from_millis(50), merger.get_page(0, false)).await;
    assert!(pending.is_err());
    assert!(merger.is_empty());

    api.open.store(true, Ordering::SeqCst);
    let page = merger.get_page(0, false).await.unwrap();
    let stamps: Vec<i64> = page.items.iter().map(|i| i.last_update.timestamp()).collect();
    assert_eq!(stamps, [100, 90, 80]);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_failing_source_fails_whole_page() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(5, 5));

    api.set_failing_kind(Some(ItemKind::Message));
    assert!(repo.get_page(0, FeedName::All, false).await.is_err());

    // Feeds without the failing kind are unaffected
    assert!(repo.get_page(0, FeedName::Replies, false).await.is_ok());

    api.set_failing_kind(None);
    let page = repo.get_page(0, FeedName::All, false).await.unwrap();
    assert_eq!(page.items.len(), 5);
}

#[tokio::test]
async fn test_concurrent_requests_on_one_feed_are_serialized() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(api, settings(3, 2));

    let (a, b) = tokio::join!(
        repo.get_page(0, FeedName::All, false),
        repo.get_page(1, FeedName::All, false),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.items.last().unwrap().last_update >= b.items[0].last_update);
    let keys: HashSet<ItemKey> = a.items.iter().chain(&b.items).map(FeedItem::key).collect();
    assert_eq!(keys.len(), 6);
}

// ============================================================================
// Read state
// ============================================================================

#[tokio::test]
async fn test_mark_read_moves_item_out_of_unread_only() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(20, 20));

    let unread = repo.get_page(0, FeedName::Unread, false).await.unwrap();
    let target = unread.items[0].clone();
    repo.mark_as_read(&target, true).await.unwrap();

    let unread = repo.get_page(0, FeedName::Unread, false).await.unwrap();
    assert!(unread.items.iter().all(|i| i.key() != target.key()));

    let all = repo.get_page(0, FeedName::All, false).await.unwrap();
    let copy = all.items.iter().find(|i| i.key() == target.key()).unwrap();
    assert!(copy.is_read);
    assert!(api.item(target.key()).unwrap().is_read);
}

#[tokio::test]
async fn test_failed_mark_read_is_rolled_back() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(20, 20));

    let unread = repo.get_page(0, FeedName::Unread, false).await.unwrap();
    let target = unread.items[0].clone();
    repo.get_page(0, FeedName::All, false).await.unwrap();

    api.set_fail_marks(true);
    assert!(repo.mark_as_read(&target, true).await.is_err());

    let all = repo.get_page(0, FeedName::All, false).await.unwrap();
    let copy = all.items.iter().find(|i| i.key() == target.key()).unwrap();
    assert!(!copy.is_read);

    let unread = repo.get_page(0, FeedName::Unread, false).await.unwrap();
    assert!(unread.items.iter().any(|i| i.key() == target.key()));
}

#[tokio::test]
async fn test_mark_unread_returns_item_to_unread() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(20, 20));

    let target = api.item(ItemKey { kind: ItemKind::Reply, id: 103 }).unwrap();
    assert!(target.is_read);

    repo.mark_as_read(&target, false).await.unwrap();

    let unread = repo.get_page(0, FeedName::Unread, false).await.unwrap();
    assert!(unread.items.iter().any(|i| i.key() == target.key()));
}

#[tokio::test]
async fn test_resolving_report_updates_reports_feed() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(20, 20));

    let reports = repo.get_page(0, FeedName::Reports, false).await.unwrap();
    let open = reports.items.iter().find(|i| !i.is_read).unwrap().clone();

    repo.mark_as_read(&open, true).await.unwrap();

    let reports = repo.get_page(0, FeedName::Reports, false).await.unwrap();
    assert!(reports.items.iter().find(|i| i.key() == open.key()).unwrap().is_read);
}

#[tokio::test]
async fn test_failed_mark_keeps_server_read_state() {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), settings(20, 20));
    let key = ItemKey { kind: ItemKind::Reply, id: 103 };
    let target = api.item(key).unwrap();
    assert!(target.is_read);
    repo.get_page(0, FeedName::Replies, false).await.unwrap();

    api.set_fail_marks(true);
    assert!(repo.mark_as_read(&target, true).await.is_err());

    let all = repo.get_page(0, FeedName::All, true).await.unwrap();
    assert!(all.items.iter().find(|i| i.key() == key).unwrap().is_read);
    let replies = repo.get_page(0, FeedName::Replies, false).await.unwrap();
    assert!(replies.items.iter().find(|i| i.key() == key).unwrap().is_read);

    assert!(repo.mark_as_read(&target, false).await.is_err());

    let unread = repo.get_page(0, FeedName::Unread, false).await.unwrap();
    assert!(unread.items.iter().all(|i| i.key() != key));
    let all = repo.get_page(0, FeedName::All, false).await.unwrap();
    assert!(all.items.iter().find(|i| i.key() == key).unwrap().is_read);
}
