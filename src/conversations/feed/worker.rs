//! Single-consumer feed that serializes batches into the merger.
//!
//! Both store subscriptions push into one bounded channel; the feed task
//! drains it one message at a time, so `apply` never overlaps itself.

use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::conversations::core::errors::{ConversationError, ConversationResult};
use crate::conversations::feed::subscription::{ListenQuery, SubscriptionMessage, listen_queries};
use crate::conversations::merge::merger::{BatchReport, ConversationMerger};

/// Sending side of a feed, cloned into every subscription callback.
#[derive(Clone, Debug)]
pub struct FeedHandle {
    tx: mpsc::Sender<SubscriptionMessage>,
    shutdown: Arc<Notify>,
}

impl FeedHandle {
    /// Queue one subscription delivery.
    ///
    /// # Errors
    /// Returns `FeedClosed` if the feed task has stopped.
    pub async fn deliver(&self, message: SubscriptionMessage) -> ConversationResult<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ConversationError::FeedClosed)
    }

    /// Ask the feed task to stop after the batch it is processing.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Whether the feed task has stopped receiving.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer that owns the merger for its whole lifetime.
#[derive(Debug)]
pub struct ConversationFeed {
    merger: ConversationMerger,
    queries: [ListenQuery; 2],
    rx: mpsc::Receiver<SubscriptionMessage>,
    shutdown: Arc<Notify>,
}

impl ConversationFeed {
    /// Create a feed around `merger` with a channel of `capacity` batches.
    ///
    /// # Errors
    /// Returns an error if `capacity` is zero.
    pub fn new(
        merger: ConversationMerger,
        capacity: usize,
    ) -> ConversationResult<(Self, FeedHandle)> {
        if capacity == 0 {
            return Err(ConversationError::InvalidConfig(
                "feed.channel_capacity must be > 0".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(capacity);
        let shutdown = Arc::new(Notify::new());
        let queries = listen_queries(merger.local_user());
        let handle = FeedHandle {
            tx,
            shutdown: Arc::clone(&shutdown),
        };

        Ok((
            Self {
                merger,
                queries,
                rx,
                shutdown,
            },
            handle,
        ))
    }

    /// Read access to the merger.
    #[must_use]
    pub const fn merger(&self) -> &ConversationMerger {
        &self.merger
    }

    /// Spawn the feed loop as a tokio task.
    ///
    /// The task yields the merger back once it stops.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<ConversationMerger> {
        tokio::spawn(self.run())
    }

    /// Drain the channel until shutdown is signaled or every sender is gone.
    pub async fn run(mut self) -> ConversationMerger {
        info!(local_user = %self.merger.local_user(), "Conversation feed started");

        loop {
            let next = tokio::select! {
                message = self.rx.recv() => message,
                () = self.shutdown.notified() => None,
            };
            let Some(message) = next else {
                break;
            };
            self.handle(message);
        }

        info!(entries = self.merger.len(), "Conversation feed shutting down");
        self.merger
    }

    /// Process one subscription delivery.
    ///
    /// Errors drop the batch without touching the list. Changes outside
    /// both listen queries are discarded before merging.
    pub fn handle(&mut self, message: SubscriptionMessage) -> Option<BatchReport> {
        let mut changes = match message {
            Ok(changes) => changes,
            Err(err) => {
                debug!(%err, "Dropping batch after subscription error");
                return None;
            }
        };

        let before = changes.len();
        changes.retain(|raw| self.queries.iter().any(|query| query.matches(raw)));
        let foreign = before - changes.len();
        if foreign > 0 {
            debug!(foreign, "Discarding changes outside the local user's streams");
        }

        Some(self.merger.apply_raw(&changes))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::conversations::core::config::PairMatching;
    use crate::conversations::core::ids::UserId;
    use crate::conversations::feed::subscription::SubscriptionError;
    use crate::conversations::ingest::decode::RawChange;
    use crate::conversations::sink::{NullSink, WatchSink};

    fn merger() -> ConversationMerger {
        ConversationMerger::new(
            UserId::new("me").expect("id"),
            PairMatching::Directional,
            Box::new(NullSink),
        )
    }

    fn change(kind: &str, sender: &str, receiver: &str, message: &str, ts: i64) -> RawChange {
        RawChange::new(
            kind,
            json!({
                "senderId": sender,
                "receiverId": receiver,
                "lastMessage": message,
                "timestamp": ts
            }),
        )
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ConversationFeed::new(merger(), 0),
            Err(ConversationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_handle_drops_errored_batch() {
        let (mut feed, _handle) = ConversationFeed::new(merger(), 4).expect("feed");

        let report = feed.handle(Err(SubscriptionError::Unavailable("offline".to_string())));

        assert!(report.is_none());
        assert!(feed.merger().is_empty());
    }

    #[test]
    fn test_handle_discards_foreign_changes() {
        let (mut feed, _handle) = ConversationFeed::new(merger(), 4).expect("feed");

        let report = feed
            .handle(Ok(vec![
                change("added", "me", "bob", "hi", 100),
                change("added", "eve", "mallory", "psst", 200),
            ]))
            .expect("report");

        assert_eq!(report.added, 1);
        assert_eq!(feed.merger().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_merges_both_streams_in_order() {
        let (sink, mut snapshots) = WatchSink::channel();
        let merger = ConversationMerger::new(
            UserId::new("me").expect("id"),
            PairMatching::Directional,
            Box::new(sink),
        );
        let (feed, handle) = ConversationFeed::new(merger, 4).expect("feed");
        let task = feed.spawn();

        handle
            .deliver(Ok(vec![change("added", "me", "bob", "hi", 100)]))
            .await
            .expect("deliver");
        handle
            .deliver(Err(SubscriptionError::Listener("transient".to_string())))
            .await
            .expect("deliver");
        handle
            .deliver(Ok(vec![change("added", "carol", "me", "yo", 200)]))
            .await
            .expect("deliver");
        handle
            .deliver(Ok(vec![change("modified", "me", "bob", "hi again", 300)]))
            .await
            .expect("deliver");

        drop(handle);
        let merger = task.await.expect("feed task");

        let order: Vec<_> = merger
            .entries()
            .iter()
            .map(|e| (e.counterpart_id.to_string(), e.last_message.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("bob".to_string(), Some("hi again".to_string())),
                ("carol".to_string(), Some("yo".to_string())),
            ]
        );
        assert_eq!(snapshots.borrow_and_update().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_feed() {
        let (feed, handle) = ConversationFeed::new(merger(), 4).expect("feed");
        let task = feed.spawn();

        handle.shutdown();
        let merger = task.await.expect("feed task");

        assert!(merger.is_empty());
        assert!(handle.is_closed());
        assert!(matches!(
            handle.deliver(Ok(Vec::new())).await,
            Err(ConversationError::FeedClosed)
        ));
    }
}
