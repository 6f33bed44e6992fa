//! Recency ordering for conversation entries.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::conversations::core::entry::ConversationEntry;

/// Most recent first; missing timestamps after every present one.
#[must_use]
pub fn recency_order(a: Option<&DateTime<Utc>>, b: Option<&DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort entries by recency.
///
/// The sort is stable: entries that compare equal keep their relative order.
pub fn sort_by_recency(entries: &mut [ConversationEntry]) {
    entries.sort_by(|a, b| recency_order(a.last_message_at.as_ref(), b.last_message_at.as_ref()));
}
