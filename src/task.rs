//! Task records for readyq.
//!
//! A task carries its own half of every dependency edge: `blocks` lists the
//! tasks waiting on it, `blocked_by` lists the tasks it waits on. The graph
//! module keeps both halves in step.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Length of a full task id (lowercase hex, no dashes)
pub const TASK_ID_LEN: usize = 32;

/// Length of the id prefix shown in listings
pub const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Every status, in checklist order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    /// Machine name used on the command line and in JSON
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }

    /// Checklist label used in the markdown document
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Done => "Done",
        }
    }

    /// Map a checklist label back to a status
    pub fn from_label(label: &str) -> Option<TaskStatus> {
        let label = label.trim();
        Self::ALL.into_iter().find(|status| status.label() == label)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "invalid status '{s}' (expected open, in_progress, blocked or done)"
                ))
            })
    }
}

/// One timestamped entry in a task's work journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLog {
    pub timestamp: String,
    pub log: String,
}

impl SessionLog {
    pub fn new(timestamp: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            log: log.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default)]
    pub sessions: Vec<SessionLog>,
}

impl Task {
    /// A fresh open task with a new id, created now
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            id: generate_task_id(),
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Open,
            created_at: now.clone(),
            updated_at: now,
            blocks: Vec::new(),
            blocked_by: Vec::new(),
            sessions: Vec::new(),
        }
    }

    /// First characters of the id, for display
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Bump `updated_at` to `now`, never moving it backwards
    pub fn touch(&mut self, now: &str) {
        if compare_timestamps(now, &self.updated_at) != Ordering::Less {
            self.updated_at = now.to_string();
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// A new task id: a v4 UUID rendered as 32 lowercase hex digits
pub fn generate_task_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Current time in the document's timestamp format (RFC 3339, UTC offset)
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Whether `id` has the canonical 32-lowercase-hex shape
pub fn is_valid_task_id(id: &str) -> bool {
    id.len() == TASK_ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Display prefix of an id; shorter ids are returned whole
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Order two timestamps chronologically when both parse, textually otherwise
fn compare_timestamps(left: &str, right: &str) -> Ordering {
    match (parse_timestamp(left), parse_timestamp(right)) {
        (Some(l), Some(r)) => l.cmp(&r),
        (Some(_), None) => Ordering::Greater,
        _ => left.cmp(right),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_open_with_hex_id() {
        let task = Task::new("Write docs", "");
        assert!(is_valid_task_id(&task.id));
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.blocks.is_empty() && task.blocked_by.is_empty());
    }

    #[test]
    fn status_labels_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_label(status.label()), Some(status));
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert_eq!(TaskStatus::from_label("Someday"), None);
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn id_shape() {
        assert!(is_valid_task_id("0123456789abcdef0123456789abcdef"));
        assert!(!is_valid_task_id("0123456789ABCDEF0123456789ABCDEF"));
        assert!(!is_valid_task_id("abc"));
        assert!(!is_valid_task_id("0123456789abcdef0123456789abcdeg"));
    }

    #[test]
    fn short_id_truncates() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn touch_never_goes_backwards() {
        let mut task = Task::new("t", "");
        task.updated_at = "2030-01-01T00:00:00+00:00".to_string();
        task.touch("2024-01-01T00:00:00+00:00");
        assert_eq!(task.updated_at, "2030-01-01T00:00:00+00:00");

        task.touch("2031-01-01T00:00:00.000001+00:00");
        assert_eq!(task.updated_at, "2031-01-01T00:00:00.000001+00:00");
    }

    #[test]
    fn touch_fills_empty_timestamp() {
        let mut task = Task::new("t", "");
        task.updated_at.clear();
        task.touch("2024-01-01T00:00:00+00:00");
        assert_eq!(task.updated_at, "2024-01-01T00:00:00+00:00");
    }
}
