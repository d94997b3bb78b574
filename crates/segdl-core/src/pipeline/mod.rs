//! Per-item state machine and sequential batch runner.
//!
//! ```text
//! Pending -> Downloading -> Merging -> Transcoding -> Completed
//!                 |             |            |
//!                 +-------------+------------+--> Failed (resumable)
//! ```
//!
//! Every transition is written to the task-state store before the next stage
//! starts. The encoder writes to a staging file that is renamed onto the final
//! path only on success, so an existing final file is always complete. Blocking work (curl transfers, the segment pool, assembly, the
//! encoder) runs on `spawn_blocking`; items run one at a time with pacing.

mod layout;
mod pacing;


use anyhow::Context;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler::{assemble, cleanup_segments};
use crate::batch::{episode_exists, EpisodePattern};
use crate::config::SegdlConfig;
use crate::coordinator::{Coordinator, ProgressCounter, ProgressSnapshot};
use crate::error::{PipelineError, TranscodeError};
use crate::fetcher::SegmentFetcher;
use crate::item::WorkItem;
use crate::playlist::{fetch_playlist, PlaylistRules};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::state_store::{TaskInfo, TaskStateStore, TaskStatus};
use crate::transcode::Transcoder;
use crate::transport::Transport;

pub use layout::Layout;
pub use pacing::Pacing;

/// Knobs for one pipeline, usually derived from `SegdlConfig`.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub worker_count: usize,
    pub retry: RetryPolicy,
    pub transcode_attempts: u32,
    pub rules: PlaylistRules,
    pub layout: Layout,
    pub pacing: Pacing,
}

impl PipelineOptions {
    pub fn from_config(cfg: &SegdlConfig) -> Self {
        Self {
            worker_count: cfg.worker_count,
            retry: cfg.retry_policy(),
            transcode_attempts: cfg.transcode_attempts,
            rules: cfg.playlist_rules(),
            layout: Layout::new(&cfg.scratch_dir, &cfg.output_dir, &cfg.output_format),
            pacing: Pacing {
                delay: Duration::from_millis(cfg.pacing_delay_ms),
                jitter: Duration::from_millis(cfg.pacing_jitter_ms),
            },
        }
    }

    fn transcode_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.transcode_attempts.max(1),
            ..self.retry
        }
    }
}

/// Final status per item, in processing order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<(String, TaskStatus)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn counts(&self) -> BTreeMap<TaskStatus, usize> {
        let mut counts = BTreeMap::new();
        for (_, status) in &self.results {
            *counts.entry(*status).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|(_, s)| *s == status).count()
    }
}

pub struct Pipeline {
    transport: Arc<dyn Transport>,
    transcoder: Arc<dyn Transcoder>,
    store: Arc<TaskStateStore>,
    opts: PipelineOptions,
    progress_tx: Option<tokio::sync::mpsc::Sender<ProgressSnapshot>>,
}

impl Pipeline {
    pub fn new(
        opts: PipelineOptions,
        transport: Arc<dyn Transport>,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<TaskStateStore>,
    ) -> Self {
        Self {
            transport,
            transcoder,
            store,
            opts,
            progress_tx: None,
        }
    }

    /// Forward segment progress snapshots to `tx`.
    pub fn with_progress(mut self, tx: tokio::sync::mpsc::Sender<ProgressSnapshot>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    pub fn store(&self) -> &TaskStateStore {
        &self.store
    }

    /// Persist a transition. The file read and rename run on the blocking
    /// pool. Store failures are logged and the run goes on with the in-memory
    /// status.
    async fn record(&self, item: &mut WorkItem, status: TaskStatus, info: Option<TaskInfo>) {
        item.status = status;
        let saved = tokio::task::spawn_blocking({
            let store = Arc::clone(&self.store);
            let id = item.id.clone();
            move || store.update(&id, status, info).map(|_| ())
        })
        .await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(item = %item.id, status = %status, "task state not saved: {}", e)
            }
            Err(e) => {
                tracing::warn!(item = %item.id, status = %status, "task state task join: {}", e)
            }
        }
    }

    /// Drive one item to Completed or Failed. Never returns an error: every
    /// failure is logged and recorded against the item.
    pub async fn process_item(&self, item: &mut WorkItem) -> TaskStatus {
        match self.try_process(item).await {
            Ok(status) => status,
            Err(e) => {
                let msg = e.to_string();
                tracing::error!(item = %item.id, "failed: {}", msg);
                item.last_error = Some(msg.clone());
                self.record(item, TaskStatus::Failed, Some(TaskInfo::error(msg))).await;
                TaskStatus::Failed
            }
        }
    }

    async fn try_process(&self, item: &mut WorkItem) -> Result<TaskStatus, PipelineError> {
        let layout = &self.opts.layout;
        let final_path = layout.final_path(item);
        if final_path.exists() {
            tracing::info!(item = %item.id, path = %final_path.display(), "already downloaded");
            let info = TaskInfo {
                url: Some(item.source_locator.clone()),
                error: None,
                file_path: Some(final_path.display().to_string()),
            };
            self.record(item, TaskStatus::Completed, Some(info)).await;
            return Ok(TaskStatus::Completed);
        }

        layout
            .prepare(item)
            .with_context(|| format!("create directories for {}", item.id))?;
        item.last_error = None;
        let info = TaskInfo::url(item.source_locator.clone());
        self.record(item, TaskStatus::Downloading, Some(info)).await;

        let playlist = tokio::task::spawn_blocking({
            let transport = Arc::clone(&self.transport);
            let source = item.source_locator.clone();
            let rules = self.opts.rules.clone();
            move || fetch_playlist(transport.as_ref(), &source, &rules)
        })
        .await
        .context("playlist task join")??;
        item.segments = playlist.segments.clone();

        let segment_dir = layout.segment_dir(item);
        let progress = Arc::new(
            ProgressCounter::new(item.id.clone(), playlist.segments.len())
                .with_sink(self.progress_tx.clone()),
        );
        let outcome = tokio::task::spawn_blocking({
            let fetcher = SegmentFetcher::new(Arc::clone(&self.transport), self.opts.retry);
            let coordinator = Coordinator::new(fetcher, self.opts.worker_count);
            let dir = segment_dir.clone();
            let progress = Arc::clone(&progress);
            move || coordinator.run(&playlist.segments, &playlist.base, &dir, &progress)
        })
        .await
        .context("segment pool join")?;

        if !outcome.has_output() {
            let _ = std::fs::remove_dir(&segment_dir);
            return Err(PipelineError::NoSegmentsDownloaded {
                total: outcome.total(),
                failed: outcome.failed(),
            });
        }
        if outcome.failed() > 0 {
            tracing::warn!(
                item = %item.id,
                failed = outcome.failed(),
                total = outcome.total(),
                "assembling without failed segments"
            );
        }

        self.record(item, TaskStatus::Merging, None).await;
        let paths = outcome.succeeded_paths();
        let intermediate = layout.intermediate_path(item);
        tokio::task::spawn_blocking({
            let paths = paths.clone();
            let out = intermediate.clone();
            move || assemble(&paths, &out)
        })
        .await
        .context("assemble task join")??;
        cleanup_segments(&paths);
        let _ = std::fs::remove_dir(&segment_dir);

        self.record(item, TaskStatus::Transcoding, None).await;
        let encoded = tokio::task::spawn_blocking({
            let transcoder = Arc::clone(&self.transcoder);
            let policy = self.opts.transcode_policy();
            let input = intermediate.clone();
            let staging = layout.staging_path(item);
            let output = final_path.clone();
            let format = layout.format.clone();
            move || {
                let encoded =
                    run_with_retry(&policy, |_| transcoder.transcode(&input, &staging, &format))
                        .and_then(|outcome| {
                            std::fs::rename(&staging, &output)
                                .map(|()| outcome)
                                .map_err(|source| TranscodeError::Finalize {
                                    from: staging.clone(),
                                    to: output.clone(),
                                    source,
                                })
                        });
                if encoded.is_err() {
                    let _ = std::fs::remove_file(&staging);
                }
                encoded
            }
        })
        .await
        .context("transcode task join")??;
        tracing::debug!(item = %item.id, outcome = ?encoded, "transcoded");

        if let Err(e) = std::fs::remove_file(&intermediate) {
            tracing::warn!("could not remove {}: {}", intermediate.display(), e);
        }
        self.record(
            item,
            TaskStatus::Completed,
            Some(TaskInfo::file_path(final_path.display().to_string())),
        )
        .await;
        tracing::info!(item = %item.id, path = %final_path.display(), "completed");
        Ok(TaskStatus::Completed)
    }

    /// Process `items` one after another, pausing between items.
    pub async fn run_batch(&self, items: Vec<WorkItem>) -> BatchReport {
        self.run_items(items, None).await
    }

    /// Process episodes `numbers` of `pattern`, probing each first. Episodes
    /// that do not exist are recorded Failed without downloading.
    pub async fn run_episodes(&self, pattern: &EpisodePattern, numbers: &[u32]) -> BatchReport {
        let items = numbers
            .iter()
            .map(|n| WorkItem::new(*n, None, pattern.url_for(*n)))
            .collect();
        self.run_items(items, Some(pattern)).await
    }

    async fn run_items(&self, items: Vec<WorkItem>, probe: Option<&EpisodePattern>) -> BatchReport {
        let started = Instant::now();
        let mut report = BatchReport::default();
        let total = items.len();
        for (i, mut item) in items.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.opts.pacing.next_delay()).await;
            }
            tracing::info!(item = %item.id, "item {}/{}", i + 1, total);
            let missing = match probe {
                Some(pattern) => !self.exists(pattern, item.number).await,
                None => false,
            };
            let status = if missing {
                let msg = PipelineError::EpisodeNotFound.to_string();
                tracing::warn!(item = %item.id, "{}", msg);
                item.last_error = Some(msg.clone());
                let info = TaskInfo {
                    url: Some(item.source_locator.clone()),
                    error: Some(msg),
                    file_path: None,
                };
                self.record(&mut item, TaskStatus::Failed, Some(info)).await;
                TaskStatus::Failed
            } else {
                self.process_item(&mut item).await
            };
            report.results.push((item.id, status));
        }
        report.elapsed = started.elapsed();
        report
    }

    async fn exists(&self, pattern: &EpisodePattern, n: u32) -> bool {
        let transport = Arc::clone(&self.transport);
        let pattern = pattern.clone();
        tokio::task::spawn_blocking(move || episode_exists(transport.as_ref(), &pattern, n))
            .await
            .unwrap_or(false)
    }
}
