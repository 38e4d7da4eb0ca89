use super::{Event, Output};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

/// Output that appends events to a file, one JSON object per line.
pub struct FileOutput {
    file_path: PathBuf,
}

impl FileOutput {
    /// Creates a new FileOutput instance.
    ///
    /// # Arguments
    /// * `file_path` - Path to the file events are appended to
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }
}

#[async_trait]
impl Output for FileOutput {
    async fn report(&self, event: &Event) -> Result<()> {
        let log_entry = serde_json::json!({
            "timestamp": event.timestamp.to_rfc3339(),
            "kind": event.subject.kind,
            "namespace": event.subject.namespace,
            "name": event.subject.name,
            "type": event.event_type,
            "reason": event.reason,
            "message": event.message,
        });

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await
            .with_context(|| format!("Failed to open event file: {}", self.file_path.display()))?;

        let log_line = format!("{}\n", log_entry);
        file.write_all(log_line.as_bytes())
            .await
            .with_context(|| "Failed to write to event file")?;

        file.flush()
            .await
            .with_context(|| "Failed to flush event file")?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::EventType;
    use crate::subject::ObjectRef;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn make_event(message: &str) -> Event {
        Event {
            subject: ObjectRef::new("Pod", "test-pod").in_namespace("rook-ceph"),
            event_type: EventType::Warning,
            reason: "Failed".to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_appends_json_lines() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("events.jsonl");
        let output = FileOutput::new(path.clone());

        output.report(&make_event("first")).await.unwrap();
        output.report(&make_event("second")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "first");
        assert_eq!(lines[1]["message"], "second");
        assert_eq!(lines[0]["type"], "Warning");
        assert_eq!(lines[0]["namespace"], "rook-ceph");
        assert_eq!(lines[0]["name"], "test-pod");
    }

    #[tokio::test]
    async fn test_unwritable_path_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let output = FileOutput::new(dir.path().join("missing").join("events.jsonl"));
        let err = output.report(&make_event("lost")).await.unwrap_err();
        assert!(err.to_string().contains("Failed to open event file"));
    }
}
