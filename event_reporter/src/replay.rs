/// Replays recorded occurrences through an `EventReporter`.
///
/// Input is JSON lines. Each record may carry its own timestamp, which drives
/// the reporter's clock, so an hour of control-loop output can be replayed in
/// milliseconds.
use crate::clock::{Clock, ManualClock};
use crate::reporter::EventReporter;
use crate::signature::EventType;
use crate::subject::ObjectRef;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Which suppression policy a record goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// At most N forwards per signature per window.
    Bounded,
    /// Only when different from the last forward, or after an hour.
    Changed,
}

/// One recorded occurrence.
#[derive(Debug, Clone, Deserialize)]
pub struct Occurrence {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    pub subject: ObjectRef,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub reason: String,
    pub message: String,
    #[serde(default)]
    pub policy: Option<Policy>,
}

impl Occurrence {
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).with_context(|| format!("Invalid occurrence: {}", line))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub skipped: usize,
}

pub struct Replayer {
    reporter: EventReporter<ObjectRef>,
    clock: Arc<ManualClock>,
    default_policy: Policy,
}

impl Replayer {
    pub fn new(reporter: EventReporter<ObjectRef>, default_policy: Policy) -> Self {
        let clock = Arc::new(ManualClock::default());
        Self {
            reporter: reporter.with_clock(clock.clone()),
            clock,
            default_policy,
        }
    }

    pub fn reporter(&self) -> &EventReporter<ObjectRef> {
        &self.reporter
    }

    /// Feeds one occurrence to the reporter.
    ///
    /// Records without a timestamp are evaluated at the current wall-clock time.
    pub fn apply(&self, occurrence: &Occurrence) {
        self.clock.set(occurrence.at.unwrap_or_else(Utc::now));
        tracing::trace!("Replaying {:?} at {}", occurrence, self.clock.now());

        let Occurrence {
            subject,
            event_type,
            reason,
            message,
            ..
        } = occurrence;
        match occurrence.policy.unwrap_or(self.default_policy) {
            Policy::Bounded => self.reporter.report(subject, *event_type, reason, message),
            Policy::Changed => {
                self.reporter
                    .report_if_changed(subject, *event_type, reason, message)
            }
        }
    }

    /// Reads JSON lines until EOF. Blank lines are ignored; malformed lines
    /// are logged and skipped.
    pub async fn run<R>(&self, reader: R) -> Result<ReplaySummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = ReplaySummary::default();
        let mut lines = reader.lines();

        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read occurrence")?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Occurrence::parse(line) {
                Ok(occurrence) => {
                    self.apply(&occurrence);
                    summary.applied += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping line: {:#}", e);
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;
    use crate::subject::ObjectNameExtractor;
    use pretty_assertions::assert_eq;

    fn setup(policy: Policy) -> (Replayer, tokio::sync::mpsc::Receiver<crate::outputs::Event>) {
        let (sink, rx) = ChannelSink::channel(128);
        let reporter = EventReporter::new(Arc::new(sink), Arc::new(ObjectNameExtractor), 2, 20);
        (Replayer::new(reporter, policy), rx)
    }

    fn drain(rx: &mut tokio::sync::mpsc::Receiver<crate::outputs::Event>) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            messages.push(event.message);
        }
        messages
    }

    #[test]
    fn test_parse_occurrence() {
        let occurrence = Occurrence::parse(
            r#"{"at":"2026-01-01T00:00:00Z","subject":{"kind":"Pod","namespace":"rook-ceph","name":"osd-0"},"type":"Warning","reason":"Failed","message":"boom","policy":"changed"}"#,
        )
        .unwrap();
        assert_eq!(occurrence.subject, ObjectRef::new("Pod", "osd-0").in_namespace("rook-ceph"));
        assert_eq!(occurrence.event_type, EventType::Warning);
        assert_eq!(occurrence.policy, Some(Policy::Changed));
        assert_eq!(
            occurrence.at,
            Some("2026-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let result = Occurrence::parse(
            r#"{"subject":{"kind":"Pod","name":"osd-0"},"type":"Info","reason":"r","message":"m"}"#,
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_replay_honours_timestamps() {
        let (replayer, mut rx) = setup(Policy::Bounded);
        let input = [
            r#"{"at":"2026-01-01T00:00:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"m1"}"#,
            r#"{"at":"2026-01-01T00:05:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"m1"}"#,
            r#"{"at":"2026-01-01T00:10:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"m1"}"#,
            "",
            "not json",
            r#"{"at":"2026-01-01T00:20:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"m1"}"#,
        ]
        .join("\n");

        let summary = replayer.run(input.as_bytes()).await.unwrap();

        assert_eq!(summary, ReplaySummary { applied: 4, skipped: 1 });
        assert_eq!(drain(&mut rx), vec!["m1", "m1", "m1"]);
    }

    #[tokio::test]
    async fn test_replay_mixes_policies() {
        let (replayer, mut rx) = setup(Policy::Changed);
        let input = [
            r#"{"at":"2026-01-01T00:00:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"a"}"#,
            r#"{"at":"2026-01-01T00:01:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"a"}"#,
            r#"{"at":"2026-01-01T00:02:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"b","policy":"bounded"}"#,
            r#"{"at":"2026-01-01T00:03:00Z","subject":{"kind":"Pod","name":"p"},"type":"Normal","reason":"Created","message":"a"}"#,
            r#"{"at":"2026-01-01T00:04:00Z","subject":{"kind":"Pod"},"type":"Normal","reason":"Created","message":"c"}"#,
        ]
        .join("\n");

        let summary = replayer.run(input.as_bytes()).await.unwrap();

        assert_eq!(summary.applied, 5);
        assert_eq!(drain(&mut rx), vec!["a", "b", "a"]);
        assert_eq!(replayer.reporter().tracked_signatures(), 1);
    }
}
