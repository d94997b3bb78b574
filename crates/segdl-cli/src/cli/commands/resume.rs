//! `segdl resume` – re-run every unfinished item recorded in the task state.

use anyhow::Result;
use segdl_core::config::SegdlConfig;
use segdl_core::item::WorkItem;

use super::shared::{open_store, run_work, Work};

pub async fn run_resume(cfg: &SegdlConfig) -> Result<()> {
    let store = open_store(cfg)?;
    let pending = store.list_pending()?;
    let mut items = Vec::with_capacity(pending.len());
    for (id, record) in &pending {
        match WorkItem::from_record(id, record) {
            Some(item) => items.push(item),
            None => tracing::warn!(item = %id, "no playlist URL recorded; skipping"),
        }
    }
    if items.is_empty() {
        println!("Nothing to resume.");
        return Ok(());
    }
    println!("Resuming {} item(s).", items.len());
    run_work(cfg, Work::Items(items)).await
}
