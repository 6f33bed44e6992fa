//! Change event model for the conversation change streams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::conversations::core::ids::UserId;

/// Kind of document change reported by the store.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A conversation document entered the result set.
    Added,
    /// A conversation document already in the result set changed.
    Modified,
    /// A conversation document left the result set.
    Removed,
}

impl ChangeKind {
    /// Stable string form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "added" => Ok(Self::Added),
            "modified" => Ok(Self::Modified),
            "removed" => Ok(Self::Removed),
            _ => Err(value.to_string()),
        }
    }
}

/// One side of a conversation as seen from the local user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Counterpart {
    /// Id of the other party.
    pub id: UserId,
    /// Display name of the other party.
    pub name: Option<String>,
    /// Encoded profile image of the other party.
    pub image: Option<String>,
}

/// A typed change to one conversation document.
///
/// Only the ids are guaranteed; every other field is whatever the decode
/// step could recover from the document.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Change kind.
    pub kind: ChangeKind,
    /// Party that sent the last message.
    pub sender_id: UserId,
    /// Party that received the last message.
    pub receiver_id: UserId,
    /// Sender display name.
    pub sender_name: Option<String>,
    /// Sender profile image reference.
    pub sender_image: Option<String>,
    /// Receiver display name.
    pub receiver_name: Option<String>,
    /// Receiver profile image reference.
    pub receiver_image: Option<String>,
    /// Text of the last message.
    pub last_message: Option<String>,
    /// When the last message was sent.
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChangeEvent {
    /// Build a bare event with only ids set.
    #[must_use]
    pub const fn new(kind: ChangeKind, sender_id: UserId, receiver_id: UserId) -> Self {
        Self {
            kind,
            sender_id,
            receiver_id,
            sender_name: None,
            sender_image: None,
            receiver_name: None,
            receiver_image: None,
            last_message: None,
            timestamp: None,
        }
    }

    /// Build an `Added` event.
    #[must_use]
    pub const fn added(sender_id: UserId, receiver_id: UserId) -> Self {
        Self::new(ChangeKind::Added, sender_id, receiver_id)
    }

    /// Build a `Modified` event.
    #[must_use]
    pub const fn modified(sender_id: UserId, receiver_id: UserId) -> Self {
        Self::new(ChangeKind::Modified, sender_id, receiver_id)
    }

    /// Set the last message text.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.last_message = Some(message.into());
        self
    }

    /// Set the last message timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the sender's display name and image.
    #[must_use]
    pub fn with_sender_profile(mut self, name: impl Into<String>, image: Option<String>) -> Self {
        self.sender_name = Some(name.into());
        self.sender_image = image;
        self
    }

    /// Set the receiver's display name and image.
    #[must_use]
    pub fn with_receiver_profile(mut self, name: impl Into<String>, image: Option<String>) -> Self {
        self.receiver_name = Some(name.into());
        self.receiver_image = image;
        self
    }

    /// The party that is not `local_user`.
    ///
    /// When the local user is the sender the counterpart is the receiver;
    /// in every other case it is the sender.
    #[must_use]
    pub fn counterpart_of(&self, local_user: &UserId) -> Counterpart {
        if &self.sender_id == local_user {
            Counterpart {
                id: self.receiver_id.clone(),
                name: self.receiver_name.clone(),
                image: self.receiver_image.clone(),
            }
        } else {
            Counterpart {
                id: self.sender_id.clone(),
                name: self.sender_name.clone(),
                image: self.sender_image.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(raw: &str) -> UserId {
        UserId::new(raw).expect("valid id")
    }

    #[test]
    fn test_change_kind_parse() {
        assert_eq!("ADDED".parse::<ChangeKind>(), Ok(ChangeKind::Added));
        assert_eq!("modified".parse::<ChangeKind>(), Ok(ChangeKind::Modified));
        assert_eq!("removed".parse::<ChangeKind>(), Ok(ChangeKind::Removed));
        assert_eq!("renamed".parse::<ChangeKind>(), Err("renamed".to_string()));
    }

    #[test]
    fn test_counterpart_when_local_sends() {
        let event = ChangeEvent::added(uid("me"), uid("bob"))
            .with_sender_profile("Me", None)
            .with_receiver_profile("Bob", Some("b64bob".to_string()));

        let counterpart = event.counterpart_of(&uid("me"));
        assert_eq!(counterpart.id, uid("bob"));
        assert_eq!(counterpart.name.as_deref(), Some("Bob"));
        assert_eq!(counterpart.image.as_deref(), Some("b64bob"));
    }

    #[test]
    fn test_counterpart_when_local_receives() {
        let event = ChangeEvent::added(uid("alice"), uid("me"))
            .with_sender_profile("Alice", Some("b64alice".to_string()))
            .with_receiver_profile("Me", None);

        let counterpart = event.counterpart_of(&uid("me"));
        assert_eq!(counterpart.id, uid("alice"));
        assert_eq!(counterpart.name.as_deref(), Some("Alice"));
    }
}
