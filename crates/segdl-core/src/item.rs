//! The unit of work: one episode playlist.

use crate::playlist::SegmentRef;
use crate::state_store::{TaskRecord, TaskStatus};

/// One episode to download, assemble, and transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// State-store key: `"7"` or `"<title>/7"`.
    pub id: String,
    /// Episode number used for file names.
    pub number: u32,
    pub title: Option<String>,
    pub source_locator: String,
    /// Filled once the playlist is parsed.
    pub segments: Vec<SegmentRef>,
    pub status: TaskStatus,
    pub last_error: Option<String>,
}

impl WorkItem {
    pub fn new(number: u32, title: Option<String>, source_locator: impl Into<String>) -> Self {
        Self {
            id: item_id(title.as_deref(), number),
            number,
            title,
            source_locator: source_locator.into(),
            segments: Vec::new(),
            status: TaskStatus::Pending,
            last_error: None,
        }
    }

    /// Rebuild an item from a persisted record. None if the record has no URL
    /// or the id does not end in an episode number.
    pub fn from_record(id: &str, record: &TaskRecord) -> Option<Self> {
        let url = record.url()?;
        let (title, number) = match id.rsplit_once('/') {
            Some((t, n)) => (Some(t.to_string()), n),
            None => (None, id),
        };
        let number: u32 = number.parse().ok()?;
        Some(Self {
            id: id.to_string(),
            number,
            title,
            source_locator: url.to_string(),
            segments: Vec::new(),
            status: record.status,
            last_error: record.error().map(str::to_string),
        })
    }
}

pub fn item_id(title: Option<&str>, number: u32) -> String {
    match title {
        Some(t) => format!("{}/{}", t, number),
        None => number.to_string(),
    }
}
