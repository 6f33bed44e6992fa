// File: src/conversations/core/ids.rs

//! Identifier types for conversation participants.
//!
//! The document store hands out opaque string ids for user records. This
//! module wraps them in a validated newtype so that a sender id can never
//! be confused with a message body or an image reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors returned when parsing/validating a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    /// Empty (or whitespace-only) identifier.
    Empty,
    /// Exceeds the maximum accepted length.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        got: usize,
    },
    /// Contains a disallowed character.
    InvalidChar {
        /// The invalid character.
        ch: char,
        /// The index where it was found.
        index: usize,
    },
}

impl fmt::Display for UserIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "user id must not be empty"),
            Self::TooLong { max, got } => write!(f, "user id too long: got {got}, max {max}"),
            Self::InvalidChar { ch, index } => {
                write!(f, "user id contains invalid character {ch:?} at index {index}")
            }
        }
    }
}

impl std::error::Error for UserIdError {}

/// Identifier of a user record in the remote document store.
///
/// Rules:
/// - Non-empty after trimming.
/// - At most [`UserId::MAX_LEN`] bytes.
/// - No path separators (`/`) and no control characters, since document
///   ids are path segments on the store side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Document ids are capped at 1500 bytes by the store.
    pub const MAX_LEN: usize = 1500;

    /// Build a validated `UserId`.
    ///
    /// # Errors
    /// Returns `UserIdError` if the input is empty, too long, or contains invalid characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserIdError> {
        let s = raw.as_ref().trim();

        if s.is_empty() {
            return Err(UserIdError::Empty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(UserIdError::TooLong {
                max: Self::MAX_LEN,
                got: s.len(),
            });
        }

        for (i, ch) in s.chars().enumerate() {
            if ch == '/' || ch.is_control() {
                return Err(UserIdError::InvalidChar { ch, index: i });
            }
        }

        Ok(Self(s.to_owned()))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.into_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_trims_input() {
        let id = UserId::new("  abc123 ").expect("valid id");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_user_id_rejects_empty() {
        assert_eq!(UserId::new("   "), Err(UserIdError::Empty));
    }

    #[test]
    fn test_user_id_rejects_path_separator() {
        assert_eq!(
            UserId::new("users/abc"),
            Err(UserIdError::InvalidChar { ch: '/', index: 5 })
        );
    }

    #[test]
    fn test_user_id_rejects_oversized() {
        let raw = "a".repeat(UserId::MAX_LEN + 1);
        assert!(matches!(
            UserId::new(raw),
            Err(UserIdError::TooLong { got, .. }) if got == UserId::MAX_LEN + 1
        ));
    }

    #[test]
    fn test_user_id_serde_validates() {
        let id: UserId = serde_json::from_str("\"u-1\"").expect("deserialize");
        assert_eq!(id.as_str(), "u-1");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"u-1\"");
    }
}
