//! Inbox item kinds

use serde::{Deserialize, Serialize};

/// Which remote list an inbox item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Reply to one of the user's posts or comments
    Reply,
    /// Comment mentioning the user
    Mention,
    /// Private message
    Message,
    /// Report filed against a post (moderators only)
    PostReport,
    /// Report filed against a comment (moderators only)
    CommentReport,
}

impl ItemKind {
    /// Get all kinds
    pub const fn all() -> &'static [Self] {
        &[
            Self::Reply,
            Self::Mention,
            Self::Message,
            Self::PostReport,
            Self::CommentReport,
        ]
    }

    /// Get the display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reply => "Reply",
            Self::Mention => "Mention",
            Self::Message => "Message",
            Self::PostReport => "Post report",
            Self::CommentReport => "Comment report",
        }
    }

    /// Whether "read" means "resolved" for this kind
    pub const fn is_report(&self) -> bool {
        matches!(self, Self::PostReport | Self::CommentReport)
    }

    /// Whether the list endpoint takes a `sort` parameter
    ///
    /// Message and report lists always come back newest first.
    pub const fn honors_sort(&self) -> bool {
        matches!(self, Self::Reply | Self::Mention)
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "reply" | "replies" => Some(Self::Reply),
            "mention" | "mentions" => Some(Self::Mention),
            "message" | "messages" | "pm" | "private_message" => Some(Self::Message),
            "post_report" | "postreport" => Some(Self::PostReport),
            "comment_report" | "commentreport" => Some(Self::CommentReport),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
