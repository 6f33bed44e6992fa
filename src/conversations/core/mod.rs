//! Core conversation types and identifiers.

pub mod config;
pub mod entry;
pub mod errors;
pub mod ids;

pub use config::{ChatConfig, FeedConfig, MergerConfig, PairMatching, ServerConfig};
pub use entry::ConversationEntry;
pub use errors::{ConversationError, ConversationResult};
pub use ids::{UserId, UserIdError};
