//! `segdl fetch` – download one playlist URL.

use anyhow::Result;
use segdl_core::config::SegdlConfig;
use segdl_core::item::WorkItem;

use super::shared::{run_work, Work};

pub async fn run_fetch(cfg: &SegdlConfig, url: String, id: u32, title: Option<String>) -> Result<()> {
    let item = WorkItem::new(id, title, url);
    run_work(cfg, Work::Items(vec![item])).await
}
