//! Output sinks for the ordered conversation list.

use tokio::sync::watch;

use crate::conversations::core::entry::ConversationEntry;

/// Receives the full ordered list after every merged batch.
///
/// Consumers re-render from the snapshot; no diff is provided.
pub trait ConversationSink: Send + Sync {
    /// Publish the current list.
    fn publish(&self, entries: &[ConversationEntry]);
}

/// Sink that discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ConversationSink for NullSink {
    fn publish(&self, _entries: &[ConversationEntry]) {}
}

/// Sink that keeps the latest snapshot in a `watch` channel.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Vec<ConversationEntry>>,
}

impl WatchSink {
    /// Create a sink and the first read-only receiver.
    #[must_use]
    pub fn channel() -> (Self, watch::Receiver<Vec<ConversationEntry>>) {
        let (tx, rx) = watch::channel(Vec::new());
        (Self { tx }, rx)
    }

    /// Open another read-only receiver.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<ConversationEntry>> {
        self.tx.subscribe()
    }
}

impl ConversationSink for WatchSink {
    fn publish(&self, entries: &[ConversationEntry]) {
        // Kept even with no receivers so late subscribers see the latest list.
        let _ = self.tx.send_replace(entries.to_vec());
    }
}
