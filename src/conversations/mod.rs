//! Recent-conversations list for the chat client.
//!
//! This module keeps the "latest message per counterpart" list in sync with
//! the remote store's change streams, organized into:
//! - `core`: Configuration, errors, ids, and the list entry type
//! - `ingest`: Change events and the typed decode step for raw documents
//! - `merge`: The incremental merger and its recency ordering
//! - `feed`: Listen queries and the single-consumer batch feed
//! - `sink`: Read-only publication of the ordered list

pub mod core;
pub mod feed;
pub mod ingest;
pub mod merge;
pub mod sink;

// Re-export commonly used types for convenience
pub use self::core::{
    ChatConfig, ConversationEntry, ConversationError, ConversationResult, FeedConfig,
    MergerConfig, PairMatching, ServerConfig, UserId, UserIdError,
};
pub use feed::{
    ConversationFeed, FeedHandle, ListenQuery, SubscriptionError, SubscriptionMessage,
    listen_queries,
};
pub use ingest::{ChangeEvent, ChangeKind, DecodeError, RawChange, decode_batch, decode_change};
pub use merge::{BatchReport, ConversationMerger};
pub use sink::{ConversationSink, NullSink, WatchSink};
