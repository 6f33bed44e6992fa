//! Incremental merge of change batches into the conversation list.

use std::collections::HashMap;

use tracing::debug;

use crate::conversations::core::config::{MergerConfig, PairMatching};
use crate::conversations::core::entry::ConversationEntry;
use crate::conversations::core::errors::ConversationResult;
use crate::conversations::core::ids::UserId;
use crate::conversations::ingest::change_event::{ChangeEvent, ChangeKind};
use crate::conversations::ingest::decode::{RawChange, decode_batch};
use crate::conversations::merge::ordering::sort_by_recency;
use crate::conversations::sink::ConversationSink;

/// Counts of what one `apply` call did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BatchReport {
    /// New entries appended.
    pub added: usize,
    /// Existing entries updated in place.
    pub updated: usize,
    /// `Modified` events with no matching entry.
    pub unmatched: usize,
    /// `Removed` events, which are not acted on.
    pub ignored: usize,
    /// Records rejected by decoding.
    pub skipped: usize,
}

/// Owner of the "latest message per conversation" list.
///
/// Batches must be applied one at a time; the merger holds no locks.
pub struct ConversationMerger {
    local_user: UserId,
    pair_matching: PairMatching,
    entries: Vec<ConversationEntry>,
    sink: Box<dyn ConversationSink>,
}

impl ConversationMerger {
    /// Create an empty merger for `local_user`.
    #[must_use]
    pub fn new(
        local_user: UserId,
        pair_matching: PairMatching,
        sink: Box<dyn ConversationSink>,
    ) -> Self {
        Self {
            local_user,
            pair_matching,
            entries: Vec::new(),
            sink,
        }
    }

    /// Create an empty merger from configuration.
    ///
    /// # Errors
    /// Returns an error if the configured local user id is invalid.
    pub fn from_config(
        config: &MergerConfig,
        sink: Box<dyn ConversationSink>,
    ) -> ConversationResult<Self> {
        Ok(Self::new(config.local_user()?, config.pair_matching, sink))
    }

    /// Id of the local user.
    #[must_use]
    pub const fn local_user(&self) -> &UserId {
        &self.local_user
    }

    /// Matching rule used for `Modified` events.
    #[must_use]
    pub const fn pair_matching(&self) -> PairMatching {
        self.pair_matching
    }

    /// Current list, most recent first.
    #[must_use]
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode and merge a batch of raw store changes.
    ///
    /// Undecodable records are skipped and counted in the report.
    pub fn apply_raw(&mut self, raws: &[RawChange]) -> BatchReport {
        let decoded = decode_batch(raws);
        let mut report = self.apply(decoded.events);
        report.skipped = decoded.rejected;
        report
    }

    /// Merge a batch of change events, re-sort, and publish.
    ///
    /// - `Added` appends an entry. A second `Added` for the same
    ///   (sender, receiver) within this batch updates the entry the first
    ///   one created instead; across batches no such check is made.
    /// - `Modified` updates the first entry accepted by the matching rule.
    /// - `Removed` is ignored.
    pub fn apply(&mut self, batch: Vec<ChangeEvent>) -> BatchReport {
        let mut report = BatchReport::default();
        let mut added_in_batch: HashMap<(UserId, UserId), usize> = HashMap::new();

        for event in batch {
            match event.kind {
                ChangeKind::Added => {
                    let pair = (event.sender_id.clone(), event.receiver_id.clone());
                    if let Some(&index) = added_in_batch.get(&pair) {
                        self.entries[index].apply_update(&event);
                        report.updated += 1;
                        continue;
                    }
                    added_in_batch.insert(pair, self.entries.len());
                    self.entries
                        .push(ConversationEntry::from_event(&self.local_user, &event));
                    report.added += 1;
                }
                ChangeKind::Modified => {
                    let matching = self.pair_matching;
                    let target = self.entries.iter_mut().find(|entry| {
                        matching.matches(
                            &entry.sender_id,
                            &entry.receiver_id,
                            &event.sender_id,
                            &event.receiver_id,
                        )
                    });
                    if let Some(entry) = target {
                        entry.apply_update(&event);
                        report.updated += 1;
                    } else {
                        debug!(
                            sender = %event.sender_id,
                            receiver = %event.receiver_id,
                            "No conversation matches modified change"
                        );
                        report.unmatched += 1;
                    }
                }
                ChangeKind::Removed => {
                    report.ignored += 1;
                }
            }
        }

        sort_by_recency(&mut self.entries);
        self.sink.publish(&self.entries);

        debug!(
            added = report.added,
            updated = report.updated,
            unmatched = report.unmatched,
            ignored = report.ignored,
            total = self.entries.len(),
            "Merged conversation batch"
        );
        report
    }
}

impl std::fmt::Debug for ConversationMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMerger")
            .field("local_user", &self.local_user)
            .field("pair_matching", &self.pair_matching)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
