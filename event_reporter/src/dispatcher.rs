use crate::outputs::{Event, Output};
use tokio::sync::mpsc::Receiver;

/// Drains the sink channel and hands every event to the enabled outputs.
///
/// # Fields
/// * `outputs` - Destinations, called in parallel for each event
/// * `rx` - Receiving half of the `ChannelSink` channel
pub struct Dispatcher {
    outputs: Vec<Box<dyn Output>>,
    rx: Receiver<Event>,
}

impl Dispatcher {
    pub fn new(outputs: Vec<Box<dyn Output>>, rx: Receiver<Event>) -> Self {
        Self { outputs, rx }
    }

    /// Runs until every sender is dropped and the channel is empty.
    ///
    /// Returns the number of events delivered.
    pub async fn run(mut self) -> usize {
        tracing::debug!("Dispatcher started with {} outputs", self.outputs.len());

        let mut delivered = 0;
        while let Some(event) = self.rx.recv().await {
            self.call_outputs(&event).await;
            delivered += 1;
        }

        tracing::debug!("Dispatcher stopped after {} events", delivered);
        delivered
    }

    /// Calls all outputs with the event.
    ///
    /// Outputs run in parallel; a failure is logged and does not affect the
    /// others.
    async fn call_outputs(&self, event: &Event) {
        let output_futures: Vec<_> = self
            .outputs
            .iter()
            .map(|output| async move {
                if let Err(e) = output.report(event).await {
                    tracing::warn!("Output '{}' failed: {}", output.name(), e);
                }
            })
            .collect();

        futures::future::join_all(output_futures).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::MockOutput;
    use crate::signature::EventType;
    use crate::sink::{ChannelSink, Sink};
    use crate::subject::ObjectRef;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_delivers_every_event_to_every_output() {
        let (sink, rx) = ChannelSink::channel(8);

        let mut first = MockOutput::new();
        first.expect_report().times(3).returning(|_| Ok(()));
        first.expect_name().return_const("first");
        let mut second = MockOutput::new();
        second
            .expect_report()
            .withf(|event: &Event| event.subject.name.as_deref() == Some("test-pod"))
            .times(3)
            .returning(|_| Ok(()));
        second.expect_name().return_const("second");

        let pod = ObjectRef::new("Pod", "test-pod");
        for message in ["a", "b", "c"] {
            sink.forward(&pod, EventType::Normal, "Created", message);
        }
        drop(sink);

        let outputs: Vec<Box<dyn Output>> = vec![Box::new(first), Box::new(second)];
        let dispatcher = Dispatcher::new(outputs, rx);
        assert_eq!(dispatcher.run().await, 3);
    }

    #[tokio::test]
    async fn test_failing_output_does_not_block_others() {
        let (sink, rx) = ChannelSink::channel(8);

        let mut broken = MockOutput::new();
        broken
            .expect_report()
            .times(2)
            .returning(|_| Err(anyhow::anyhow!("disk full")));
        broken.expect_name().return_const("broken");
        let mut healthy = MockOutput::new();
        healthy.expect_report().times(2).returning(|_| Ok(()));
        healthy.expect_name().return_const("healthy");

        let pod = ObjectRef::new("Pod", "test-pod");
        sink.forward(&pod, EventType::Warning, "Failed", "one");
        sink.forward(&pod, EventType::Warning, "Failed", "two");
        drop(sink);

        let outputs: Vec<Box<dyn Output>> = vec![Box::new(broken), Box::new(healthy)];
        let dispatcher = Dispatcher::new(outputs, rx);
        assert_eq!(dispatcher.run().await, 2);
    }
}
