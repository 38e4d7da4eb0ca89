use super::{Event, Output};
use anyhow::Result;
use async_trait::async_trait;

/// Output that prints events to stdout.
///
/// One line per event: timestamp, subject, type, reason and message.
pub struct StdoutOutput;

impl StdoutOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdoutOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Output for StdoutOutput {
    async fn report(&self, event: &Event) -> Result<()> {
        println!(
            "[{}] {} {} {}: {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            event.subject,
            event.event_type,
            event.reason,
            event.message
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
