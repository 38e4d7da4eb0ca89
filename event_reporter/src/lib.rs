//! Event deduplication and rate limiting for control loops.
//!
//! A control loop that re-evaluates state every few seconds tends to report
//! the same thing over and over. `EventReporter` sits between the loop and its
//! event sink and decides, per call, whether an occurrence is forwarded or
//! suppressed:
//!
//! * [`EventReporter::report`] forwards a signature at most N times per fixed
//!   window of W minutes.
//! * [`EventReporter::report_if_changed`] forwards only when the occurrence
//!   differs from the last one forwarded, or that one is an hour old.
//!
//! A signature is `name:type:reason:message`. Subjects whose name cannot be
//! extracted are dropped silently.
//!
//! ```rust,ignore
//! let (sink, rx) = ChannelSink::channel(1024);
//! let reporter = EventReporter::new(Arc::new(sink), Arc::new(ObjectNameExtractor), 5, 20);
//! reporter.report(&pod, EventType::Normal, "Created", "Pod has been created");
//! ```
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
mod history;
pub mod logger;
pub mod outputs;
pub mod replay;
pub mod reporter;
pub mod signature;
pub mod sink;
pub mod subject;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::IdentityExtractionError;
pub use history::{HistoryEntry, LastForward};
pub use reporter::{CHANGE_ONLY_MINUTES, EventReporter};
pub use signature::{EventType, Signature};
pub use sink::{ChannelSink, ForwardedEvent, Sink};
pub use subject::{IdentityExtractor, ObjectNameExtractor, ObjectRef};
