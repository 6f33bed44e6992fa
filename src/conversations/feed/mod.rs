//! Subscription plumbing between the store and the merger.

pub mod subscription;
pub mod worker;

pub use subscription::{ListenQuery, SubscriptionError, SubscriptionMessage, listen_queries};
pub use worker::{ConversationFeed, FeedHandle};
