//! Logical feeds, sort order and pages

use serde::{Deserialize, Serialize};

use super::{FeedItem, ItemKind};

/// A logical inbox feed, each backed by its own merger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedName {
    /// Replies, mentions and messages
    #[default]
    All,
    /// Unread replies, mentions and messages
    Unread,
    /// Comment replies only
    Replies,
    /// Mentions only
    Mentions,
    /// Private messages only
    Messages,
    /// Post and comment reports
    Reports,
}

impl FeedName {
    /// Get all feeds
    pub const fn all() -> &'static [Self] {
        &[
            Self::All,
            Self::Unread,
            Self::Replies,
            Self::Mentions,
            Self::Messages,
            Self::Reports,
        ]
    }

    /// Get the display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Unread => "Unread",
            Self::Replies => "Replies",
            Self::Mentions => "Mentions",
            Self::Messages => "Messages",
            Self::Reports => "Reports",
        }
    }

    /// Sources a merger for this feed owns, in declaration order,
    /// as `(kind, unread_only)`
    pub const fn source_specs(&self) -> &'static [(ItemKind, bool)] {
        match self {
            Self::All => &[
                (ItemKind::Reply, false),
                (ItemKind::Mention, false),
                (ItemKind::Message, false),
            ],
            Self::Unread => &[
                (ItemKind::Reply, true),
                (ItemKind::Mention, true),
                (ItemKind::Message, true),
            ],
            Self::Replies => &[(ItemKind::Reply, false)],
            Self::Mentions => &[(ItemKind::Mention, false)],
            Self::Messages => &[(ItemKind::Message, false)],
            Self::Reports => &[
                (ItemKind::PostReport, false),
                (ItemKind::CommentReport, false),
            ],
        }
    }

    /// Order this feed can be merged in when `requested` is configured
    ///
    /// Oldest-first only works when every source lists oldest first;
    /// other feeds fall back to newest first.
    pub fn effective_sort(&self, requested: SortOrder) -> SortOrder {
        if self.source_specs().iter().all(|(kind, _)| kind.honors_sort()) {
            requested
        } else {
            SortOrder::New
        }
    }

    /// The single-kind feed that lists items of `kind`
    pub const fn for_kind(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Reply => Self::Replies,
            ItemKind::Mention => Self::Mentions,
            ItemKind::Message => Self::Messages,
            ItemKind::PostReport | ItemKind::CommentReport => Self::Reports,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "unread" => Some(Self::Unread),
            "replies" | "reply" => Some(Self::Replies),
            "mentions" | "mention" => Some(Self::Mentions),
            "messages" | "message" | "pm" => Some(Self::Messages),
            "reports" | "report" => Some(Self::Reports),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Order requested from the server and produced by the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Newest first
    #[default]
    New,
    /// Oldest first
    Old,
}

impl SortOrder {
    /// Value of the `sort` query parameter
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Old => "Old",
        }
    }
}

/// A page of a merged feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page index
    pub index: usize,
    /// Items on this page, in feed order
    pub items: Vec<FeedItem>,
    /// Whether a later page may hold more items
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_feed() {
        for kind in ItemKind::all() {
            let feed = FeedName::for_kind(*kind);
            assert!(feed.source_specs().iter().any(|(k, _)| k == kind));
        }
    }

    #[test]
    fn test_unread_feed_is_unread_only() {
        assert!(FeedName::Unread.source_specs().iter().all(|(_, unread)| *unread));
        assert!(FeedName::All.source_specs().iter().all(|(_, unread)| !unread));
    }

    #[test]
    fn test_old_sort_only_for_sortable_feeds() {
        assert_eq!(FeedName::Replies.effective_sort(SortOrder::Old), SortOrder::Old);
        assert_eq!(FeedName::Mentions.effective_sort(SortOrder::Old), SortOrder::Old);
        assert_eq!(FeedName::All.effective_sort(SortOrder::Old), SortOrder::New);
        assert_eq!(FeedName::Messages.effective_sort(SortOrder::Old), SortOrder::New);
        assert_eq!(FeedName::Reports.effective_sort(SortOrder::Old), SortOrder::New);
    }
}
