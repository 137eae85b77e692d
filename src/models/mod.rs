//! Data models for the inbox

mod account;
mod feed;
mod feed_item;
mod kind;
mod unread;

pub use account::{Account, normalize_instance};
pub use feed::{FeedName, Page, SortOrder};
pub use feed_item::{Author, FeedItem, ItemKey};
pub use kind::ItemKind;
pub use unread::UnreadCounts;
