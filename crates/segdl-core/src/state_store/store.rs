use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StateStoreError;

use super::natural::natural_cmp;
use super::types::{TaskInfo, TaskRecord, TaskStatus};

/// All records, keyed by item id.
pub type TaskMap = BTreeMap<String, TaskRecord>;

/// JSON-file task state shared by every work item of a run.
///
/// Each `update` is a read-modify-write of the whole file under one lock, so
/// concurrent updates for different ids never lose each other. Writes go to a
/// sibling temp file first and are renamed over the original.
#[derive(Debug)]
pub struct TaskStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TaskStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing or empty file is an empty map.
    pub fn load(&self) -> Result<TaskMap, StateStoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TaskMap::new()),
            Err(source) => {
                return Err(StateStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(TaskMap::new());
        }
        serde_json::from_str(&data).map_err(|source| StateStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the file contents with `tasks`.
    pub fn save(&self, tasks: &TaskMap) -> Result<(), StateStoreError> {
        let io_err = |source| StateStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(tasks).map_err(|source| StateStoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Set `id` to `status`, merging `info` into the stored detail, and stamp
    /// the record with the current time. Creates the record if absent.
    pub fn update(
        &self,
        id: &str,
        status: TaskStatus,
        info: Option<TaskInfo>,
    ) -> Result<TaskRecord, StateStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut tasks = self.load()?;
        let record = tasks
            .entry(id.to_string())
            .or_insert_with(|| TaskRecord::new(status));
        record.apply(status, info);
        let out = record.clone();
        self.save(&tasks)?;
        tracing::debug!(id, status = %status, "task state updated");
        Ok(out)
    }

    pub fn get(&self, id: &str) -> Result<Option<TaskRecord>, StateStoreError> {
        Ok(self.load()?.remove(id))
    }

    /// Records not yet completed, naturally sorted by id.
    pub fn list_pending(&self) -> Result<Vec<(String, TaskRecord)>, StateStoreError> {
        let mut pending: Vec<(String, TaskRecord)> = self
            .load()?
            .into_iter()
            .filter(|(_, r)| r.status != TaskStatus::Completed)
            .collect();
        pending.sort_by(|a, b| natural_cmp(&a.0, &b.0));
        Ok(pending)
    }

    /// Count of records per status; statuses with no records are omitted.
    pub fn summary(&self) -> Result<BTreeMap<TaskStatus, usize>, StateStoreError> {
        let mut counts = BTreeMap::new();
        for record in self.load()?.values() {
            *counts.entry(record.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn temp_path(&self) -> PathBuf {
        let mut o = self.path.as_os_str().to_owned();
        o.push(".tmp");
        PathBuf::from(o)
    }
}
