//! Inbox item model (normalized across replies, mentions, messages and reports)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemKind;

/// Author of an inbox item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Person id on the local instance
    pub id: i64,
    /// Username
    pub name: String,
    /// Display name, if the person set one
    pub display_name: Option<String>,
    /// Home instance host (e.g. `lemmy.world`)
    pub instance: String,
}

impl Author {
    /// Name to show in lists
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    /// Fully qualified handle, `@name@instance`
    pub fn full_handle(&self) -> String {
        format!("@{}@{}", self.name, self.instance)
    }
}

/// Identity of an item: ids are only unique within one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Source feed discriminator
    pub kind: ItemKind,
    /// Id within that feed
    pub id: i64,
}

/// One inbox entry
///
/// Items are immutable once materialized, except for `is_read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Id of the reply/mention/message/report row
    pub id: i64,
    /// Which list this item came from
    pub kind: ItemKind,
    /// Who wrote it
    pub author: Author,
    /// Post title, sender or report subject
    pub title: String,
    /// Body text (markdown)
    pub content: String,
    /// Last edit, or creation time if never edited. Sort key.
    pub last_update: DateTime<Utc>,
    /// Read (or resolved, for reports)
    pub is_read: bool,
    /// Linked comment, for comment-backed items
    pub comment_id: Option<i64>,
    /// Linked comment's tree path (e.g. `0.12.345`)
    pub comment_path: Option<String>,
    /// Linked post
    pub post_id: Option<i64>,
}

impl FeedItem {
    /// Create an item with empty text and an unknown author
    pub fn new(kind: ItemKind, id: i64, last_update: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            author: Author {
                id: 0,
                name: String::new(),
                display_name: None,
                instance: String::new(),
            },
            title: String::new(),
            content: String::new(),
            last_update,
            is_read: false,
            comment_id: None,
            comment_path: None,
            post_id: None,
        }
    }

    /// Identity key
    pub const fn key(&self) -> ItemKey {
        ItemKey {
            kind: self.kind,
            id: self.id,
        }
    }

    /// Get a short preview of the content (for list display)
    pub fn preview(&self, max_len: usize) -> String {
        let content = self.content.replace('\n', " ");
        if content.chars().count() <= max_len {
            content
        } else {
            let cut: String = content.chars().take(max_len.saturating_sub(3)).collect();
            format!("{cut}...")
        }
    }

    /// Get relative time string (e.g., "5m", "2h", "3d")
    pub fn relative_time(&self) -> String {
        let duration = Utc::now().signed_duration_since(self.last_update);

        if duration.num_seconds() < 60 {
            format!("{}s", duration.num_seconds().max(0))
        } else if duration.num_minutes() < 60 {
            format!("{}m", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h", duration.num_hours())
        } else if duration.num_days() < 7 {
            format!("{}d", duration.num_days())
        } else {
            self.last_update.format("%b %d").to_string()
        }
    }
}
