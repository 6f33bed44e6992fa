//! Ingestion of store change events.

pub mod change_event;
pub mod decode;

pub use change_event::{ChangeEvent, ChangeKind, Counterpart};
pub use decode::{
    DecodeError, DecodedBatch, RawChange, decode_batch, decode_change, fields, parse_timestamp,
};
