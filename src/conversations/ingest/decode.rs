//! Typed decoding of raw document changes.
//!
//! The store delivers each change as a loosely-typed field map. Decoding is
//! done field by field: the two id fields are required and reject the whole
//! record, everything else degrades to `None` on its own.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::conversations::core::ids::{UserId, UserIdError};
use crate::conversations::ingest::change_event::{ChangeEvent, ChangeKind};

/// Document field names of a conversation record.
pub mod fields {
    /// Sender id.
    pub const SENDER_ID: &str = "senderId";
    /// Receiver id.
    pub const RECEIVER_ID: &str = "receiverId";
    /// Sender display name.
    pub const SENDER_NAME: &str = "senderName";
    /// Sender profile image.
    pub const SENDER_IMAGE: &str = "senderImage";
    /// Receiver display name.
    pub const RECEIVER_NAME: &str = "receiverName";
    /// Receiver profile image.
    pub const RECEIVER_IMAGE: &str = "receiverImage";
    /// Latest message text.
    pub const LAST_MESSAGE: &str = "lastMessage";
    /// Latest message time.
    pub const TIMESTAMP: &str = "timestamp";
}

/// A document change as delivered by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    /// Change type (`added`, `modified`, `removed`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Document field map.
    #[serde(default)]
    pub document: Value,
}

impl RawChange {
    /// Build a raw change from a kind and a document value.
    #[must_use]
    pub fn new(kind: impl Into<String>, document: Value) -> Self {
        Self {
            kind: kind.into(),
            document,
        }
    }

    /// Read a string field from the document, if present.
    #[must_use]
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.document.get(field).and_then(Value::as_str)
    }
}

/// Reasons a record is rejected as a whole.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Change type is not one the store emits.
    #[error("unknown change type {0:?}")]
    UnknownKind(String),
    /// Document is not a field map.
    #[error("document is not an object")]
    NotAnObject,
    /// Required field is absent or null.
    #[error("missing field {0}")]
    MissingField(&'static str),
    /// Required field has the wrong JSON type.
    #[error("field {field} is not a {expected}")]
    WrongType {
        /// Field name.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
    /// Required id field failed validation.
    #[error("field {field} is not a valid user id: {source}")]
    InvalidId {
        /// Field name.
        field: &'static str,
        /// Validation failure.
        source: UserIdError,
    },
}

/// Decoded events of one batch.
#[derive(Clone, Debug, Default)]
pub struct DecodedBatch {
    /// Successfully decoded events, in input order.
    pub events: Vec<ChangeEvent>,
    /// Number of records that could not be decoded.
    pub rejected: usize,
}

/// Decode a single raw change.
///
/// # Errors
/// Returns an error if the change type is unknown, the document is not an
/// object, or either id field is missing or invalid.
pub fn decode_change(raw: &RawChange) -> Result<ChangeEvent, DecodeError> {
    let kind: ChangeKind = raw
        .kind
        .parse()
        .map_err(DecodeError::UnknownKind)?;
    let doc = raw.document.as_object().ok_or(DecodeError::NotAnObject)?;

    let mut event = ChangeEvent::new(
        kind,
        required_id(doc, fields::SENDER_ID)?,
        required_id(doc, fields::RECEIVER_ID)?,
    );
    event.sender_name = optional_string(doc, fields::SENDER_NAME);
    event.sender_image = optional_string(doc, fields::SENDER_IMAGE);
    event.receiver_name = optional_string(doc, fields::RECEIVER_NAME);
    event.receiver_image = optional_string(doc, fields::RECEIVER_IMAGE);
    event.last_message = optional_string(doc, fields::LAST_MESSAGE);
    event.timestamp = optional_timestamp(doc, fields::TIMESTAMP);

    Ok(event)
}

/// Decode a batch, dropping records that fail.
#[must_use]
pub fn decode_batch(raws: &[RawChange]) -> DecodedBatch {
    let mut batch = DecodedBatch {
        events: Vec::with_capacity(raws.len()),
        rejected: 0,
    };

    for (index, raw) in raws.iter().enumerate() {
        match decode_change(raw) {
            Ok(event) => batch.events.push(event),
            Err(err) => {
                debug!(index, %err, "Skipping malformed change");
                batch.rejected += 1;
            }
        }
    }

    batch
}

/// Interpret a store timestamp.
///
/// Accepts RFC 3339 strings, integer epoch milliseconds, and the
/// `{ seconds, nanoseconds }` object form (with or without leading
/// underscores).
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}

fn required_id(doc: &Map<String, Value>, field: &'static str) -> Result<UserId, DecodeError> {
    match doc.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field)),
        Some(Value::String(raw)) => {
            UserId::new(raw).map_err(|source| DecodeError::InvalidId { field, source })
        }
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn optional_string(doc: &Map<String, Value>, field: &'static str) -> Option<String> {
    match doc.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            debug!(field, "Ignoring non-string field");
            None
        }
    }
}

fn optional_timestamp(doc: &Map<String, Value>, field: &'static str) -> Option<DateTime<Utc>> {
    let value = doc.get(field)?;
    if value.is_null() {
        return None;
    }
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        debug!(field, "Ignoring unreadable timestamp");
    }
    parsed
}
