//! Append-only event log at `state/events.jsonl`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SocialError};

pub const EVENTS_FILE: &str = "events.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PostScheduled,
    ScheduleFailed,
    QueueSynced,
    PostCancelled,
    CancelFailed,
    PostRescheduled,
    RescheduleFailed,
    DraftApproved,
    IdeasIngested,
    DraftsCreated,
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Log stored in `state_dir/events.jsonl`
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(EVENTS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, kind: EventKind, data: serde_json::Value) -> Result<Event> {
        let event = Event {
            timestamp: Utc::now(),
            kind,
            data,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(&event).map_err(|e| {
            SocialError::InvalidInput(format!("Event payload is not serializable: {}", e))
        })?;
        line.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(event)
    }

    /// Append, downgrading a failure to a warning
    ///
    /// Used after a remote side effect has already happened, where failing
    /// the whole command would misreport what was done.
    pub fn record(&self, kind: EventKind, data: serde_json::Value) {
        if let Err(e) = self.append(kind, data) {
            tracing::warn!("Failed to append {:?} event to {}: {}", kind, self.path.display(), e);
        }
    }

    /// Every event in append order; a missing log is empty
    pub fn read_all(&self) -> Result<Vec<Event>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| SocialError::Corrupt {
                    path: self.path.display().to_string(),
                    reason: format!("line {}: {}", n + 1, e),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let log = EventLog::new(&temp_dir.path().join("state"));

        log.append(EventKind::PostScheduled, json!({"draft": "a.md"}))
            .unwrap();
        assert!(log.path().exists());
    }

    #[test]
    fn test_append_only_and_ordered() {
        let temp_dir = TempDir::new().unwrap();
        let log = EventLog::new(temp_dir.path());

        log.append(EventKind::PostScheduled, json!({"n": 1})).unwrap();
        let first_line = std::fs::read_to_string(log.path()).unwrap();
        log.append(EventKind::ScheduleFailed, json!({"n": 2})).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with(&first_line));
        assert_eq!(content.lines().count(), 2);

        let events = log.read_all().unwrap();
        assert_eq!(events[0].kind, EventKind::PostScheduled);
        assert_eq!(events[1].kind, EventKind::ScheduleFailed);
        assert_eq!(events[1].data["n"], 2);
    }

    #[test]
    fn test_line_format() {
        let temp_dir = TempDir::new().unwrap();
        let log = EventLog::new(temp_dir.path());
        log.append(EventKind::QueueSynced, json!({"total": 0})).unwrap();

        let line = std::fs::read_to_string(log.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["type"], "queue_synced");
        assert!(value["timestamp"].is_string());
        assert_eq!(value["data"]["total"], 0);
    }

    #[test]
    fn test_read_all_missing_log_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let log = EventLog::new(temp_dir.path());
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_all_reports_corrupt_line() {
        let temp_dir = TempDir::new().unwrap();
        let log = EventLog::new(temp_dir.path());
        std::fs::write(log.path(), "{not json}\n").unwrap();

        let err = log.read_all().unwrap_err();
        assert!(matches!(err, SocialError::Corrupt { .. }));
        assert!(err.to_string().contains("line 1"));
    }
}
