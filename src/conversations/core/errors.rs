//! Error types for the conversation list subsystem.

use thiserror::Error;

use crate::conversations::core::ids::UserIdError;

/// Conversation subsystem error type.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Malformed user identifier.
    #[error("invalid user id: {0}")]
    InvalidUserId(#[from] UserIdError),
    /// The feed task is gone and no longer accepts batches.
    #[error("conversation feed is closed")]
    FeedClosed,
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for conversation operations.
pub type ConversationResult<T> = Result<T, ConversationError>;
