use super::*;
use crate::error::StateStoreError;
use std::sync::Arc;

fn store_in(dir: &tempfile::TempDir) -> TaskStateStore {
    TaskStateStore::new(dir.path().join("state").join("task_status.json"))
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    assert!(store.load().unwrap().is_empty());
    assert!(store.list_pending().unwrap().is_empty());
}

#[test]
fn update_persists_status_and_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .update("1", TaskStatus::Downloading, Some(TaskInfo::url("https://x/1.m3u8")))
        .unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["1"]["status"], "downloading");
    assert_eq!(json["1"]["info"]["url"], "https://x/1.m3u8");
    let ts = json["1"]["last_updated"].as_str().unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok());
}

#[test]
fn info_merges_and_error_clears_on_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .update("2", TaskStatus::Downloading, Some(TaskInfo::url("https://x/2.m3u8")))
        .unwrap();
    let failed = store
        .update("2", TaskStatus::Failed, Some(TaskInfo::error("HTTP 404")))
        .unwrap();
    assert_eq!(failed.url(), Some("https://x/2.m3u8"));
    assert_eq!(failed.error(), Some("HTTP 404"));

    let again = store.update("2", TaskStatus::Downloading, None).unwrap();
    assert_eq!(again.url(), Some("https://x/2.m3u8"));
    assert_eq!(again.error(), None);
}

#[test]
fn list_pending_skips_completed_in_natural_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    for id in ["10", "2", "1", "3"] {
        store.update(id, TaskStatus::Pending, None).unwrap();
    }
    store.update("3", TaskStatus::Completed, None).unwrap();
    store.update("1", TaskStatus::Failed, None).unwrap();

    let ids: Vec<String> = store.list_pending().unwrap().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["1", "2", "10"]);
}

#[test]
fn summary_counts_by_status() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.update("1", TaskStatus::Completed, None).unwrap();
    store.update("2", TaskStatus::Completed, None).unwrap();
    store.update("3", TaskStatus::Failed, None).unwrap();
    let s = store.summary().unwrap();
    assert_eq!(s.get(&TaskStatus::Completed), Some(&2));
    assert_eq!(s.get(&TaskStatus::Failed), Some(&1));
    assert_eq!(s.get(&TaskStatus::Pending), None);
}

#[test]
fn concurrent_updates_from_two_threads_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store_in(&dir));
    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|prefix| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..25 {
                    store
                        .update(&format!("{prefix}{i}"), TaskStatus::Downloading, None)
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let all = store.load().unwrap();
    assert_eq!(all.len(), 50);
    assert!(all.values().all(|r| r.status == TaskStatus::Downloading));
}

#[test]
fn corrupt_file_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "{ not json").unwrap();
    assert!(matches!(store.load(), Err(StateStoreError::Json { .. })));
}

#[test]
fn record_without_info_omits_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.update("1", TaskStatus::Pending, None).unwrap();
    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(!raw.contains("info"));
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(TaskStatus::Failed.is_terminal());
}
