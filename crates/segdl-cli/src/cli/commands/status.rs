//! `segdl status` – show every task record and per-status counts.

use anyhow::Result;
use segdl_core::config::SegdlConfig;
use segdl_core::state_store::{natural_cmp, TaskStatus};

use super::shared::open_store;

pub fn run_status(cfg: &SegdlConfig) -> Result<()> {
    let store = open_store(cfg)?;
    let mut records: Vec<_> = store.load()?.into_iter().collect();
    if records.is_empty() {
        println!("No tasks in {}.", store.path().display());
        return Ok(());
    }
    records.sort_by(|a, b| natural_cmp(&a.0, &b.0));

    println!("{:<24} {:<12} {:<20} {}", "ID", "STATUS", "UPDATED", "DETAIL");
    for (id, r) in &records {
        let detail = match r.status {
            TaskStatus::Failed => r.error().unwrap_or("-"),
            TaskStatus::Completed => r
                .info
                .as_ref()
                .and_then(|i| i.file_path.as_deref())
                .unwrap_or("-"),
            _ => r.url().unwrap_or("-"),
        };
        println!("{:<24} {:<12} {:<20} {}", id, r.status, r.last_updated, detail);
    }

    let counts = store.summary()?;
    let parts: Vec<String> = TaskStatus::ALL
        .iter()
        .filter_map(|s| counts.get(s).map(|n| format!("{}: {}", s, n)))
        .collect();
    println!();
    println!("Total {}  ({})", records.len(), parts.join(", "));
    Ok(())
}
