//! Unread counter refresh, driven by repository events

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::InboxApi;
use crate::models::UnreadCounts;

use super::InboxEvent;

/// Keeps the latest unread counters
///
/// Failures are logged and never propagated; the last good value stays.
pub struct UnreadCountTracker<A> {
    api: Arc<A>,
    latest: Option<UnreadCounts>,
}

impl<A: InboxApi> UnreadCountTracker<A> {
    /// Create a tracker with no counts yet
    pub const fn new(api: Arc<A>) -> Self {
        Self { api, latest: None }
    }

    /// Last successfully fetched counters
    pub const fn latest(&self) -> Option<UnreadCounts> {
        self.latest
    }

    /// Fetch counters from the server
    pub async fn refresh(&mut self) -> Option<UnreadCounts> {
        match self.api.unread_count().await {
            Ok(counts) => {
                self.latest = Some(counts);
                Some(counts)
            }
            Err(e) => {
                tracing::warn!("Failed to refresh unread count: {e}");
                None
            }
        }
    }

    /// Handle queued events; refreshes at most once
    pub async fn drain(&mut self, events: &mut mpsc::Receiver<InboxEvent>) -> Option<UnreadCounts> {
        let mut stale = false;
        while let Ok(event) = events.try_recv() {
            stale |= event == InboxEvent::UnreadCountStale;
        }
        if stale {
            self.refresh().await;
        }
        self.latest
    }

    /// Refresh on every stale event until the channel closes
    pub async fn run(mut self, mut events: mpsc::Receiver<InboxEvent>) -> Option<UnreadCounts> {
        while let Some(event) = events.recv().await {
            if event == InboxEvent::UnreadCountStale {
                self.refresh().await;
            }
        }
        self.latest
    }
}
