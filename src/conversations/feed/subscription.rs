//! Change-stream subscriptions feeding the merger.

use thiserror::Error;

use crate::conversations::core::ids::UserId;
use crate::conversations::ingest::decode::{RawChange, fields};

/// Equality filter registered with the store for one change stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListenQuery {
    /// Document field compared.
    pub field: &'static str,
    /// Value the field must equal.
    pub equals: UserId,
}

impl ListenQuery {
    /// Whether `raw` falls inside this stream's result set.
    #[must_use]
    pub fn matches(&self, raw: &RawChange) -> bool {
        raw.field_str(self.field)
            .is_some_and(|value| value.trim() == self.equals.as_str())
    }
}

/// The two streams covering every conversation of `local_user`: one where
/// they sent the last message and one where they received it.
#[must_use]
pub fn listen_queries(local_user: &UserId) -> [ListenQuery; 2] {
    [
        ListenQuery {
            field: fields::SENDER_ID,
            equals: local_user.clone(),
        },
        ListenQuery {
            field: fields::RECEIVER_ID,
            equals: local_user.clone(),
        },
    ]
}

/// Failure reported by a store listener in place of a batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The store refused the query.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Any other listener failure.
    #[error("listener failed: {0}")]
    Listener(String),
}

/// One delivery from a subscription: a batch of changes or an error.
pub type SubscriptionMessage = Result<Vec<RawChange>, SubscriptionError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_listen_queries_cover_both_directions() {
        let me = UserId::new("me").expect("id");
        let [as_sender, as_receiver] = listen_queries(&me);

        let outgoing = RawChange::new("added", json!({ "senderId": "me", "receiverId": "bob" }));
        let incoming = RawChange::new("added", json!({ "senderId": "bob", "receiverId": "me" }));
        let unrelated = RawChange::new("added", json!({ "senderId": "bob", "receiverId": "eve" }));

        assert!(as_sender.matches(&outgoing));
        assert!(!as_sender.matches(&incoming));
        assert!(as_receiver.matches(&incoming));
        assert!(!as_receiver.matches(&unrelated));
        assert!(!as_sender.matches(&unrelated));
    }

    #[test]
    fn test_subscription_error_display() {
        let err = SubscriptionError::PermissionDenied("conversations".to_string());
        assert_eq!(err.to_string(), "permission denied: conversations");
    }
}
