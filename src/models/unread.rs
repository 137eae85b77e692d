//! Unread counters reported by the server

use serde::{Deserialize, Serialize};

/// Per-kind unread totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    /// Unread comment replies
    pub replies: u32,
    /// Unread mentions
    pub mentions: u32,
    /// Unread private messages
    pub private_messages: u32,
}

impl UnreadCounts {
    /// Sum of every counter
    pub const fn total(&self) -> u32 {
        self.replies + self.mentions + self.private_messages
    }
}
