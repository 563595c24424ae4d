//! Bookkeeping for reliable commands awaiting acknowledgment.

use std::collections::BTreeMap;
use std::time::Instant;

use thiserror::Error;

/// A reliable command that has been dispatched but not yet acknowledged.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub command: String,
    pub sent_at: Instant,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PendingError {
    /// The sequence number is still outstanding; more than 256 commands are
    /// in flight and the 8-bit counter has wrapped onto a live entry.
    #[error("sequence number {0} already has a pending command")]
    DuplicateSequence(u8),
}

/// Commands sent reliably but not yet acknowledged, keyed by sequence number.
///
/// Plain data: the session guards it together with the liveness clock inside
/// one mutex, so the receive path and the housekeeping loop always see a
/// consistent queue.
#[derive(Debug, Default)]
pub struct PendingCommands {
    entries: BTreeMap<u8, PendingEntry>,
}

impl PendingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, seq: u8, command: String, sent_at: Instant) -> Result<(), PendingError> {
        if self.entries.contains_key(&seq) {
            return Err(PendingError::DuplicateSequence(seq));
        }
        self.entries.insert(seq, PendingEntry { command, sent_at });
        Ok(())
    }

    /// Remove the entry for an acknowledged sequence number. Acknowledgments
    /// for unknown or late sequence numbers are ignored.
    pub fn remove(&mut self, seq: u8) -> Option<PendingEntry> {
        self.entries.remove(&seq)
    }

    pub fn contains(&self, seq: u8) -> bool {
        self.entries.contains_key(&seq)
    }

    /// The entry with the numerically smallest sequence number. The remote
    /// processes commands in (re)send order, and the housekeeping loop always
    /// retransmits the logically first outstanding command.
    pub fn oldest(&self) -> Option<(u8, &PendingEntry)> {
        self.entries.first_key_value().map(|(seq, entry)| (*seq, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
