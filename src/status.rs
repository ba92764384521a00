//! Reading-status transitions.
//!
//! The cycle control walks `unread -> in_progress -> read -> unread` and never
//! skips a state. Direct edits may set any value; that path does not go
//! through here.

use crate::models::ReadingStatus;

impl ReadingStatus {
    /// Successor in the fixed three-state cycle.
    pub fn next(self) -> ReadingStatus {
        match self {
            ReadingStatus::Unread => ReadingStatus::InProgress,
            ReadingStatus::InProgress => ReadingStatus::Read,
            ReadingStatus::Read => ReadingStatus::Unread,
        }
    }

    /// Read/unread flip used by the quick "mark as read" action. Anything that
    /// is not read becomes read.
    pub fn toggled(self) -> ReadingStatus {
        match self {
            ReadingStatus::Read => ReadingStatus::Unread,
            ReadingStatus::Unread | ReadingStatus::InProgress => ReadingStatus::Read,
        }
    }

    /// Status from a raw server value. Anything outside the known set is
    /// treated as unread, so the cycle always has a place to continue from.
    pub fn from_wire(raw: &str) -> ReadingStatus {
        raw.parse::<ReadingStatus>().unwrap_or_else(|err| {
            log::warn!("{}; treating as unread", err);
            ReadingStatus::Unread
        })
    }
}
