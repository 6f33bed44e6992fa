//! Conversation list entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversations::core::ids::UserId;
use crate::conversations::ingest::change_event::ChangeEvent;

/// Latest message exchanged with one counterpart.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Sender of the document that created this entry.
    pub sender_id: UserId,
    /// Receiver of the document that created this entry.
    pub receiver_id: UserId,
    /// Party that is not the local user.
    pub counterpart_id: UserId,
    /// Counterpart display name.
    pub counterpart_name: Option<String>,
    /// Counterpart profile image reference.
    pub counterpart_image: Option<String>,
    /// Text of the latest message.
    pub last_message: Option<String>,
    /// When the latest message was sent; `None` sorts last.
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ConversationEntry {
    /// Build an entry from the event that introduced the conversation.
    #[must_use]
    pub fn from_event(local_user: &UserId, event: &ChangeEvent) -> Self {
        let counterpart = event.counterpart_of(local_user);
        Self {
            sender_id: event.sender_id.clone(),
            receiver_id: event.receiver_id.clone(),
            counterpart_id: counterpart.id,
            counterpart_name: counterpart.name,
            counterpart_image: counterpart.image,
            last_message: event.last_message.clone(),
            last_message_at: event.timestamp,
        }
    }

    /// Overwrite message and timestamp with whatever `event` carries.
    ///
    /// Fields the event could not provide are left as they were.
    pub fn apply_update(&mut self, event: &ChangeEvent) {
        if let Some(message) = &event.last_message {
            self.last_message = Some(message.clone());
        }
        if let Some(timestamp) = event.timestamp {
            self.last_message_at = Some(timestamp);
        }
    }

    /// The (sender, receiver) key this entry is stored under.
    #[must_use]
    pub const fn pair(&self) -> (&UserId, &UserId) {
        (&self.sender_id, &self.receiver_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn uid(raw: &str) -> UserId {
        UserId::new(raw).expect("valid id")
    }

    #[test]
    fn test_from_event_takes_counterpart_side() {
        let ts = Utc.timestamp_millis_opt(100).single().expect("ts");
        let event = ChangeEvent::added(uid("me"), uid("bob"))
            .with_receiver_profile("Bob", None)
            .with_message("hi")
            .with_timestamp(ts);

        let entry = ConversationEntry::from_event(&uid("me"), &event);
        assert_eq!(entry.pair(), (&uid("me"), &uid("bob")));
        assert_eq!(entry.counterpart_id, uid("bob"));
        assert_eq!(entry.counterpart_name.as_deref(), Some("Bob"));
        assert_eq!(entry.last_message.as_deref(), Some("hi"));
        assert_eq!(entry.last_message_at, Some(ts));
    }

    #[test]
    fn test_apply_update_keeps_absent_fields() {
        let ts = Utc.timestamp_millis_opt(100).single().expect("ts");
        let event = ChangeEvent::added(uid("me"), uid("bob"))
            .with_message("hi")
            .with_timestamp(ts);
        let mut entry = ConversationEntry::from_event(&uid("me"), &event);

        entry.apply_update(&ChangeEvent::modified(uid("me"), uid("bob")).with_message("later"));

        assert_eq!(entry.last_message.as_deref(), Some("later"));
        assert_eq!(entry.last_message_at, Some(ts));
    }
}
