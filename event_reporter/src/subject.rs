/// Subject references and the identity extraction seam.
///
/// The reporter is generic over the subject type; it only needs an
/// `IdentityExtractor` that turns a subject into a stable name.
use crate::error::IdentityExtractionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lightweight reference to the object an event is about.
///
/// `name` is optional so that malformed references (for example a replayed
/// record without metadata) can still be handed to the reporter, which then
/// drops the call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ObjectRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            name: Some(name.into()),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<unnamed>");
        match &self.namespace {
            Some(namespace) => write!(f, "{} {}/{}", self.kind, namespace, name),
            None => write!(f, "{} {}", self.kind, name),
        }
    }
}

/// Extracts the stable name used to build occurrence signatures.
pub trait IdentityExtractor<T>: Send + Sync {
    fn name_of(&self, subject: &T) -> Result<String, IdentityExtractionError>;
}

/// Any matching closure can act as an extractor.
impl<T, F> IdentityExtractor<T> for F
where
    F: Fn(&T) -> Result<String, IdentityExtractionError> + Send + Sync,
{
    fn name_of(&self, subject: &T) -> Result<String, IdentityExtractionError> {
        self(subject)
    }
}

/// Reads the `name` field of an `ObjectRef`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectNameExtractor;

impl IdentityExtractor<ObjectRef> for ObjectNameExtractor {
    fn name_of(&self, subject: &ObjectRef) -> Result<String, IdentityExtractionError> {
        // An empty name is still a name; only a reference without one is malformed.
        subject
            .name
            .clone()
            .ok_or_else(|| IdentityExtractionError::MissingName {
                kind: subject.kind.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_name() {
        let pod = ObjectRef::new("Pod", "test-pod").in_namespace("rook-ceph");
        assert_eq!(ObjectNameExtractor.name_of(&pod), Ok("test-pod".to_string()));
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let pod = ObjectRef {
            kind: "Pod".to_string(),
            namespace: None,
            name: None,
        };
        assert_eq!(
            ObjectNameExtractor.name_of(&pod),
            Err(IdentityExtractionError::MissingName {
                kind: "Pod".to_string()
            })
        );
    }

    #[test]
    fn test_blank_name_is_kept() {
        assert_eq!(
            ObjectNameExtractor.name_of(&ObjectRef::new("Pod", "")),
            Ok(String::new())
        );
        assert_eq!(
            ObjectNameExtractor.name_of(&ObjectRef::new("Pod", "  ")),
            Ok("  ".to_string())
        );
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |id: &u32| -> Result<String, IdentityExtractionError> {
            if *id == 0 {
                Err(IdentityExtractionError::Rejected("zero id".to_string()))
            } else {
                Ok(format!("node-{}", id))
            }
        };
        assert_eq!(extractor.name_of(&7u32), Ok("node-7".to_string()));
        assert!(extractor.name_of(&0u32).is_err());
    }

    #[test]
    fn test_display() {
        let pod = ObjectRef::new("Pod", "osd-0").in_namespace("rook-ceph");
        assert_eq!(pod.to_string(), "Pod rook-ceph/osd-0");
        assert_eq!(ObjectRef::new("Node", "worker-1").to_string(), "Node worker-1");
    }
}
