/// In-memory bookkeeping shared by both reporting policies.
///
/// Entries are never evicted: the store grows with the number of distinct
/// signatures the caller produces for the life of the reporter.
use crate::signature::Signature;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Per-signature record kept by the bounded-repeat policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Start of the current window. Moves only on creation or window reset.
    pub last_forward_at: DateTime<Utc>,
    /// Forwards within the current window, always >= 1.
    pub forward_count: u32,
}

impl HistoryEntry {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_forward_at: now,
            forward_count: 1,
        }
    }

    pub(crate) fn reset(&mut self, now: DateTime<Utc>) {
        self.last_forward_at = now;
        self.forward_count = 1;
    }
}

/// The single most recent forward across all signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastForward {
    pub signature: Signature,
    pub forwarded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct History {
    entries: HashMap<Signature, HistoryEntry>,
    last_forward: Option<LastForward>,
}

impl History {
    pub(crate) fn entry(&mut self, signature: Signature) -> Entry<'_, Signature, HistoryEntry> {
        self.entries.entry(signature)
    }

    pub(crate) fn get(&self, signature: &Signature) -> Option<HistoryEntry> {
        self.entries.get(signature).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn last_forward(&self) -> Option<&LastForward> {
        self.last_forward.as_ref()
    }

    pub(crate) fn mark_forwarded(&mut self, signature: Signature, at: DateTime<Utc>) {
        self.last_forward = Some(LastForward {
            signature,
            forwarded_at: at,
        });
    }
}
