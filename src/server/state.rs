//! Application state shared across all request handlers.

use std::sync::Arc;

use tokio::sync::watch;

use crate::conversations::{ConversationEntry, FeedHandle, UserId};

/// Shared application state.
pub struct AppState {
    /// Entry point into the conversation feed.
    pub feed: FeedHandle,
    /// Latest ordered conversation list.
    pub snapshots: watch::Receiver<Vec<ConversationEntry>>,
    /// Id of the local user the list belongs to.
    pub local_user: UserId,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        feed: FeedHandle,
        snapshots: watch::Receiver<Vec<ConversationEntry>>,
        local_user: UserId,
    ) -> Arc<Self> {
        Arc::new(Self {
            feed,
            snapshots,
            local_user,
        })
    }
}
