//! `segdl run` – process a batch list or a range of numbered episodes.

use anyhow::Result;
use segdl_core::batch::{detect_episodes, read_batch_list};
use segdl_core::config::SegdlConfig;

use super::shared::{episode_pattern, run_work, transport, Work};
use crate::cli::RunArgs;

/// Probe limit when `--to` is omitted.
const DETECT_LIMIT: u32 = 200;

pub async fn run_run(cfg: &SegdlConfig, args: RunArgs) -> Result<()> {
    if let Some(list) = &args.list {
        let batch = read_batch_list(list)?;
        for w in &batch.warnings {
            eprintln!("line {}: {} ({})", w.line, w.reason, w.text);
        }
        if batch.items.is_empty() {
            println!("No playlist URLs in {}.", list.display());
            return Ok(());
        }
        return run_work(cfg, Work::Items(batch.items)).await;
    }

    let pattern = episode_pattern(args.pattern, args.example)?;
    let numbers: Vec<u32> = match args.to {
        Some(to) if to < args.from => anyhow::bail!("--to {} is before --from {}", to, args.from),
        Some(to) => (args.from..=to).collect(),
        None => {
            let transport = transport(cfg);
            let p = pattern.clone();
            let from = args.from;
            let found = tokio::task::spawn_blocking(move || {
                detect_episodes(&transport, &p, from, DETECT_LIMIT)
            })
            .await?;
            println!("Detected {} episode(s).", found.len());
            found
        }
    };
    if numbers.is_empty() {
        println!("No episodes to download.");
        return Ok(());
    }
    run_work(cfg, Work::Episodes(pattern, numbers)).await
}
