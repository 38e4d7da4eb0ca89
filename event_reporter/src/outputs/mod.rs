mod file;
mod stdout;

use crate::config::Config;
use crate::sink::ForwardedEvent;
use crate::subject::ObjectRef;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::path::PathBuf;

pub use file::FileOutput;
pub use stdout::StdoutOutput;

/// Event as delivered to outputs.
pub type Event = ForwardedEvent<ObjectRef>;

/// Destination for events that passed the reporter.
///
/// Each output handles its own errors; a failing output never affects the
/// others.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Output: Send + Sync {
    async fn report(&self, event: &Event) -> Result<()>;

    /// Returns the name of this output for logging purposes.
    fn name(&self) -> &'static str;
}

pub fn create_enabled_outputs(conf: &Config) -> Vec<Box<dyn Output>> {
    let mut outputs: Vec<Box<dyn Output>> = Vec::new();

    if conf.output.enable_stdout {
        outputs.push(Box::new(StdoutOutput::new()));
    }

    if let Some(ref file_path) = conf.output.file_path {
        outputs.push(Box::new(FileOutput::new(PathBuf::from(file_path))));
    }

    outputs
}
