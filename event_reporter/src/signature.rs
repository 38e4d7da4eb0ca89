use crate::error::IdentityExtractionError;
use crate::subject::IdentityExtractor;
use serde::{Deserialize, Serialize};
use std::fmt;

const SIGNATURE_DELIMITER: char = ':';

/// Severity tag attached to every occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Normal,
    Warning,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an occurrence: `name:type:reason:message`.
///
/// Two calls with the same subject name, type, reason and message always map
/// to the same signature, whenever they arrive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Builds the signature for one occurrence.
    ///
    /// # Errors
    /// Returns the extractor's error when the subject's name cannot be
    /// determined.
    pub fn derive<T, I>(
        identity: &I,
        subject: &T,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) -> Result<Self, IdentityExtractionError>
    where
        I: IdentityExtractor<T> + ?Sized,
    {
        let name = identity.name_of(subject)?;
        Ok(Self(format!(
            "{name}{d}{event_type}{d}{reason}{d}{message}",
            d = SIGNATURE_DELIMITER
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
