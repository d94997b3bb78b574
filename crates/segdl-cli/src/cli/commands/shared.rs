//! Pipeline construction and end-of-run reporting shared by the commands
//! that download.

use anyhow::{Context, Result};
use segdl_core::batch::EpisodePattern;
use segdl_core::config::SegdlConfig;
use segdl_core::item::WorkItem;
use segdl_core::pipeline::{BatchReport, Pipeline, PipelineOptions};
use segdl_core::state_store::{TaskStateStore, TaskStatus};
use segdl_core::transcode::FfmpegTranscoder;
use segdl_core::transport::{CurlTransport, TransportOptions};
use std::sync::Arc;

use crate::cli::progress;

pub fn open_store(cfg: &SegdlConfig) -> Result<TaskStateStore> {
    let path = cfg.state_file_path().context("resolve task-state path")?;
    tracing::debug!("task state at {}", path.display());
    Ok(TaskStateStore::new(path))
}

pub fn transport(cfg: &SegdlConfig) -> CurlTransport {
    CurlTransport::new(TransportOptions::from_config(cfg))
}

/// Resolve `--pattern` / `--example` into an episode pattern.
pub fn episode_pattern(pattern: Option<String>, example: Option<String>) -> Result<EpisodePattern> {
    match (pattern, example) {
        (Some(p), _) => EpisodePattern::new(p),
        (None, Some(e)) => EpisodePattern::from_example(&e)
            .with_context(|| format!("no episode number (第NN集) found in {}", e)),
        (None, None) => anyhow::bail!("either --pattern or --example is required"),
    }
}

/// What to feed the pipeline.
pub enum Work {
    Items(Vec<WorkItem>),
    Episodes(EpisodePattern, Vec<u32>),
}

/// Build a pipeline, run `work` with live progress, and print the summary.
/// Fails when any item ended Failed.
pub async fn run_work(cfg: &SegdlConfig, work: Work) -> Result<()> {
    let store = Arc::new(open_store(cfg)?);
    let transcoder = FfmpegTranscoder::discover(cfg.encoder.as_deref());
    let (progress_tx, progress_handle) = progress::spawn_printer();
    let pipeline = Pipeline::new(
        PipelineOptions::from_config(cfg),
        Arc::new(transport(cfg)),
        Arc::new(transcoder),
        Arc::clone(&store),
    )
    .with_progress(progress_tx);

    let report = match work {
        Work::Items(items) => pipeline.run_batch(items).await,
        Work::Episodes(pattern, numbers) => pipeline.run_episodes(&pattern, &numbers).await,
    };
    drop(pipeline);
    let _ = progress_handle.await;

    print_report(&report, &store);
    let failed = report.count(TaskStatus::Failed);
    if failed > 0 {
        anyhow::bail!("{} of {} item(s) failed", failed, report.results.len());
    }
    Ok(())
}

fn print_report(report: &BatchReport, store: &TaskStateStore) {
    for (id, status) in &report.results {
        println!("{:<24} {}", id, status);
    }
    let counts = report.counts();
    let line: Vec<String> = TaskStatus::ALL
        .iter()
        .filter_map(|s| counts.get(s).map(|n| format!("{} {}", n, s)))
        .collect();
    println!(
        "Processed {} item(s) in {:.1}s: {}",
        report.results.len(),
        report.elapsed.as_secs_f64(),
        if line.is_empty() { "nothing to do".to_string() } else { line.join(", ") }
    );
    match store.summary() {
        Ok(all) if !all.is_empty() => {
            let total: usize = all.values().sum();
            let done = all.get(&TaskStatus::Completed).copied().unwrap_or(0);
            println!("Task state: {}/{} completed ({})", done, total, store.path().display());
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("could not read task state: {}", e),
    }
}
