/// The sink seam and its channel-backed implementation.
use crate::signature::EventType;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Receives occurrences the reporter decided to forward.
///
/// Fire-and-forget: the reporter never observes whether delivery succeeded.
pub trait Sink<T>: Send + Sync {
    fn forward(&self, subject: &T, event_type: EventType, reason: &str, message: &str);
}

/// An occurrence that made it past the reporter, stamped at forward time.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedEvent<T> {
    pub subject: T,
    pub event_type: EventType,
    pub reason: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Hands forwarded events to a bounded channel without blocking.
///
/// When the channel is full or closed the event is dropped with a warning.
pub struct ChannelSink<T> {
    tx: mpsc::Sender<ForwardedEvent<T>>,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: mpsc::Sender<ForwardedEvent<T>>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiving half of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ForwardedEvent<T>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl<T> Sink<T> for ChannelSink<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn forward(&self, subject: &T, event_type: EventType, reason: &str, message: &str) {
        let event = ForwardedEvent {
            subject: subject.clone(),
            event_type,
            reason: reason.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        };

        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    "Event channel full, dropping {} {}: {}",
                    event.event_type,
                    event.reason,
                    event.message
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    "Event channel closed, dropping {} {}: {}",
                    event.event_type,
                    event.reason,
                    event.message
                );
            }
        }
    }
}
