//! Merge of change batches into the ordered conversation list.

pub mod merger;
pub mod ordering;

pub use merger::{BatchReport, ConversationMerger};
pub use ordering::{recency_order, sort_by_recency};
