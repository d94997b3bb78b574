use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format of `last_updated`, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Lifecycle state of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Downloading,
    Merging,
    Transcoding,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Pending,
        TaskStatus::Downloading,
        TaskStatus::Merging,
        TaskStatus::Transcoding,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Merging => "merging",
            TaskStatus::Transcoding => "transcoding",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Completed and Failed end a run; everything else is resumable.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional detail attached to a record. Fields present in an update replace
/// the stored ones; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl TaskInfo {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn file_path(path: impl Into<String>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.error.is_none() && self.file_path.is_none()
    }

    fn merge(&mut self, other: TaskInfo) {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.error.is_some() {
            self.error = other.error;
        }
        if other.file_path.is_some() {
            self.file_path = other.file_path;
        }
    }
}

/// Persisted state of one work item, keyed by item id in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<TaskInfo>,
}

impl TaskRecord {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            last_updated: now_timestamp(),
            info: None,
        }
    }

    /// Apply a status change. `info` merges into the stored detail; a stale
    /// error is dropped once the item moves to any non-failed status.
    pub fn apply(&mut self, status: TaskStatus, info: Option<TaskInfo>) {
        self.status = status;
        self.last_updated = now_timestamp();
        let mut merged = self.info.take().unwrap_or_default();
        if status != TaskStatus::Failed {
            merged.error = None;
        }
        if let Some(info) = info {
            merged.merge(info);
        }
        self.info = if merged.is_empty() { None } else { Some(merged) };
    }

    pub fn url(&self) -> Option<&str> {
        self.info.as_ref().and_then(|i| i.url.as_deref())
    }

    pub fn error(&self) -> Option<&str> {
        self.info.as_ref().and_then(|i| i.error.as_deref())
    }
}

pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
