/// Event reporter for the event_reporter crate
///
/// This module implements the two suppression policies that sit between a
/// control loop and its event sink:
/// 1. Bounded-repeat: forward a signature at most N times per fixed window
/// 2. Change-only: forward only when the occurrence differs from the last
///    forward, or the last forward is an hour old
use crate::clock::{Clock, SystemClock};
use crate::error::IdentityExtractionError;
use crate::history::{History, HistoryEntry, LastForward};
use crate::signature::{EventType, Signature};
use crate::sink::Sink;
use crate::subject::IdentityExtractor;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Minutes `report_if_changed` keeps suppressing an unchanged occurrence.
pub const CHANGE_ONLY_MINUTES: i64 = 60;

/// Decides whether an occurrence reaches the sink.
///
/// The per-signature history and the last-forward pointer share one lock, so
/// every report call evaluates and updates them as a single step. The sink is
/// called while that lock is held, so events reach it in the same order as the
/// pointer moves. A sink must therefore not block, and must not call back into
/// the reporter.
///
/// # Fields
/// * `sink` - Destination for forwarded occurrences
/// * `identity` - Extracts the subject name used in signatures
/// * `clock` - Time source for window arithmetic
/// * `max_forwards_per_window` - N, forwards allowed per signature per window
/// * `window` - W, length of the fixed window
pub struct EventReporter<T> {
    sink: Arc<dyn Sink<T>>,
    identity: Arc<dyn IdentityExtractor<T>>,
    clock: Arc<dyn Clock>,
    max_forwards_per_window: u32,
    window: TimeDelta,
    history: Mutex<History>,
}

impl<T> EventReporter<T> {
    /// Creates a reporter allowing `max_forwards_per_window` forwards per
    /// signature every `window_minutes` minutes.
    pub fn new(
        sink: Arc<dyn Sink<T>>,
        identity: Arc<dyn IdentityExtractor<T>>,
        max_forwards_per_window: u32,
        window_minutes: u32,
    ) -> Self {
        Self::with_window(
            sink,
            identity,
            max_forwards_per_window,
            TimeDelta::minutes(i64::from(window_minutes)),
        )
    }

    pub fn with_window(
        sink: Arc<dyn Sink<T>>,
        identity: Arc<dyn IdentityExtractor<T>>,
        max_forwards_per_window: u32,
        window: TimeDelta,
    ) -> Self {
        Self {
            sink,
            identity,
            clock: Arc::new(SystemClock),
            max_forwards_per_window,
            window,
            history: Mutex::new(History::default()),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_forwards_per_window(&self) -> u32 {
        self.max_forwards_per_window
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Forwards the occurrence unless its signature already reached the
    /// per-window limit.
    ///
    /// The window is anchored at the first forward after creation or reset.
    /// Later forwards inside the window only bump the count, so this is a
    /// fixed window rather than a sliding one.
    pub fn report(&self, subject: &T, event_type: EventType, reason: &str, message: &str) {
        let Some(signature) = self.derive(subject, event_type, reason, message) else {
            return;
        };

        let now = self.clock.now();
        let mut history = self.lock_history();
        let forward = match history.entry(signature.clone()) {
            Entry::Vacant(vacant) => {
                // first occurrence of this signature
                vacant.insert(HistoryEntry::new(now));
                true
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if has_elapsed(entry.last_forward_at, self.window, now) {
                    // window elapsed, start counting again even if the limit was hit
                    entry.reset(now);
                    true
                } else if entry.forward_count < self.max_forwards_per_window {
                    entry.forward_count += 1;
                    true
                } else {
                    false
                }
            }
        };

        if forward {
            history.mark_forwarded(signature.clone(), now);
            tracing::info!("Reporting event {}", signature);
            self.sink.forward(subject, event_type, reason, message);
        } else {
            tracing::debug!(
                "Not reporting event because it was already reported {} times within {} minutes: {}",
                self.max_forwards_per_window,
                self.window.num_minutes(),
                signature
            );
        }
    }

    /// Forwards the occurrence only if it differs from the most recent
    /// forward, or if that forward is at least an hour old.
    ///
    /// Per-signature counts are neither read nor written here.
    pub fn report_if_changed(
        &self,
        subject: &T,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let Some(signature) = self.derive(subject, event_type, reason, message) else {
            return;
        };

        let now = self.clock.now();
        let mut history = self.lock_history();
        let changed = match history.last_forward() {
            Some(last) => {
                last.signature != signature
                    || has_elapsed(
                        last.forwarded_at,
                        TimeDelta::minutes(CHANGE_ONLY_MINUTES),
                        now,
                    )
            }
            None => true,
        };

        if changed {
            history.mark_forwarded(signature.clone(), now);
            tracing::info!("Reporting event {}", signature);
            self.sink.forward(subject, event_type, reason, message);
        } else {
            tracing::debug!(
                "Not reporting event because it is the same as the last one: {}",
                signature
            );
        }
    }

    /// Computes the signature an occurrence would be tracked under.
    pub fn signature_of(
        &self,
        subject: &T,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) -> Result<Signature, IdentityExtractionError> {
        Signature::derive(self.identity.as_ref(), subject, event_type, reason, message)
    }

    /// Snapshot of the bounded-repeat bookkeeping for one signature.
    pub fn history_entry(&self, signature: &Signature) -> Option<HistoryEntry> {
        self.lock_history().get(signature)
    }

    /// Snapshot of the most recent forward, from either policy.
    pub fn last_forward(&self) -> Option<LastForward> {
        self.lock_history().last_forward().cloned()
    }

    /// Number of distinct signatures tracked by the bounded-repeat policy.
    pub fn tracked_signatures(&self) -> usize {
        self.lock_history().len()
    }

    fn derive(
        &self,
        subject: &T,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) -> Option<Signature> {
        match self.signature_of(subject, event_type, reason, message) {
            Ok(signature) => Some(signature),
            Err(e) => {
                tracing::debug!("Dropping {} {} event: {}", event_type, reason, e);
                None
            }
        }
    }

    // Poisoning is ignored: the guarded state is consistent after every statement.
    fn lock_history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `now >= since + span`. A bound past the representable range never elapses.
fn has_elapsed(since: DateTime<Utc>, span: TimeDelta, now: DateTime<Utc>) -> bool {
    since
        .checked_add_signed(span)
        .is_some_and(|bound| now >= bound)
}
