//! Owns one merger per feed and routes reads and read-state changes

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::api::InboxApi;
use crate::models::{FeedItem, FeedName, Page};

use super::{InboxEvent, InboxSettings, InboxSource, MultiSourceMerger};

/// Inbox facade used by the presentation layer
///
/// Each feed's merger sits behind its own lock, so requests against one
/// feed are serialized while different feeds proceed independently. At
/// most one feed lock is held at a time and none across a remote call.
pub struct InboxRepository<A> {
    api: Arc<A>,
    feeds: HashMap<FeedName, Mutex<MultiSourceMerger<A>>>,
    events: Option<mpsc::Sender<InboxEvent>>,
}

impl<A: InboxApi> InboxRepository<A> {
    /// Build a merger for every feed, each with its own sources
    pub fn new(api: Arc<A>, settings: InboxSettings) -> Self {
        let feeds = FeedName::all()
            .iter()
            .map(|&feed| {
                let sort = feed.effective_sort(settings.sort);
                let sources = feed
                    .source_specs()
                    .iter()
                    .map(|&(kind, unread_only)| {
                        InboxSource::new(
                            Arc::clone(&api),
                            kind,
                            unread_only,
                            sort,
                            settings.fetch_limit,
                        )
                    })
                    .collect();
                let merger = MultiSourceMerger::new(sources, sort, settings.page_size);
                (feed, Mutex::new(merger))
            })
            .collect();

        Self {
            api,
            feeds,
            events: None,
        }
    }

    /// Send [`InboxEvent`]s to `sender`
    pub fn with_events(mut self, sender: mpsc::Sender<InboxEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    fn feed(&self, feed: FeedName) -> &Mutex<MultiSourceMerger<A>> {
        // Every FeedName gets a merger in `new`
        &self.feeds[&feed]
    }

    /// Get page `index` of `feed`; `force` refetches from the first page
    pub async fn get_page(&self, index: usize, feed: FeedName, force: bool) -> Result<Page> {
        self.feed(feed)
            .lock()
            .await
            .get_page(index, force)
            .await
            .with_context(|| format!("Failed to load {feed} page {index}"))
    }

    /// Drop everything cached for `feed`
    pub async fn invalidate(&self, feed: FeedName) {
        self.feed(feed).lock().await.invalidate();
        self.notify(InboxEvent::Invalidated(feed));
    }

    /// Mark `item` read or unread, locally first and then on the server
    ///
    /// If the server call fails the local change is reverted to the flag
    /// `item` carried and the error returned; refetched pages then show the
    /// server's state.
    pub async fn mark_as_read(&self, item: &FeedItem, read: bool) -> Result<()> {
        let key = item.key();
        let kind_feed = FeedName::for_kind(item.kind);

        {
            let mut all = self.feed(FeedName::All).lock().await;
            all.mark_as_read(key, read);
            all.invalidate();
        }
        self.feed(kind_feed).lock().await.mark_as_read(key, read);
        {
            let mut unread = self.feed(FeedName::Unread).lock().await;
            if read {
                unread.remove(key);
            } else {
                unread.restore(key);
            }
            unread.invalidate();
        }

        if let Err(e) = self.api.mark_as_read(item, read).await {
            tracing::warn!(kind = %item.kind, id = item.id, error = %e, "mark as read failed, rolling back");

            {
                let mut all = self.feed(FeedName::All).lock().await;
                all.revert_read(key, item.is_read);
                all.invalidate();
            }
            self.feed(kind_feed).lock().await.revert_read(key, item.is_read);
            {
                let mut unread = self.feed(FeedName::Unread).lock().await;
                unread.restore(key);
                unread.invalidate();
            }
            self.notify(InboxEvent::Invalidated(FeedName::All));
            self.notify(InboxEvent::Invalidated(FeedName::Unread));

            return Err(e).with_context(|| {
                format!("Failed to mark {} {} as {}", item.kind, item.id, if read { "read" } else { "unread" })
            });
        }

        self.notify(InboxEvent::Invalidated(FeedName::All));
        self.notify(InboxEvent::Invalidated(FeedName::Unread));
        self.notify(InboxEvent::UnreadCountStale);
        Ok(())
    }

    /// Account or instance switched: forget every feed and local read state
    pub async fn on_server_changed(&self) {
        for &feed in FeedName::all() {
            self.feed(feed).lock().await.reset();
            self.notify(InboxEvent::Invalidated(feed));
        }
        self.notify(InboxEvent::UnreadCountStale);
    }

    fn notify(&self, event: InboxEvent) {
        if let Some(events) = &self.events {
            // Fire and forget; a full or closed channel only loses a hint
            if let Err(e) = events.try_send(event) {
                tracing::debug!("inbox event dropped: {e}");
            }
        }
    }
}
