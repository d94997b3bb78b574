//! Bounded concurrent segment download for one work item.
//!
//! A fixed pool of worker threads pulls segments from a shared queue, fetches
//! each through `SegmentFetcher`, and reports `(index, success)` on a channel.
//! Results land in a slot array keyed by index, so the returned path list is in
//! playlist order no matter which worker finished first.

mod progress;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::fetcher::SegmentFetcher;
use crate::naming::segment_file_name;
use crate::playlist::{resolve, SegmentRef};

pub use progress::{ProgressCounter, ProgressSnapshot};

/// Outcome for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub index: usize,
    pub local_path: PathBuf,
    pub success: bool,
}

/// Everything the assembler needs: per-segment results in index order.
#[derive(Debug, Clone)]
pub struct CoordinatorOutcome {
    pub results: Vec<DownloadResult>,
}

impl CoordinatorOutcome {
    /// Local paths of successful segments, ascending by index.
    pub fn succeeded_paths(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.local_path.clone())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// At least one segment made it; zero successes fails the item.
    pub fn has_output(&self) -> bool {
        self.succeeded() > 0
    }
}

struct Job {
    index: usize,
    url: Option<Url>,
    dest: PathBuf,
}

/// Runs the segments of one playlist with at most `worker_count` in flight.
#[derive(Clone)]
pub struct Coordinator {
    fetcher: SegmentFetcher,
    worker_count: usize,
}

impl Coordinator {
    pub fn new(fetcher: SegmentFetcher, worker_count: usize) -> Self {
        Self {
            fetcher,
            worker_count: worker_count.max(1),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Download every segment into `scratch_dir`, resolving locators against
    /// `base`. Blocks until all segments have an outcome. A locator that does
    /// not resolve counts as a failed segment.
    pub fn run(
        &self,
        segments: &[SegmentRef],
        base: &Url,
        scratch_dir: &Path,
        progress: &Arc<ProgressCounter>,
    ) -> CoordinatorOutcome {
        let jobs: VecDeque<Job> = segments
            .iter()
            .map(|seg| {
                let url = match resolve(base, &seg.locator) {
                    Ok(u) => Some(u),
                    Err(e) => {
                        tracing::warn!(index = seg.index, "unresolvable segment: {}", e);
                        None
                    }
                };
                let dest = scratch_dir.join(segment_file_name(seg.index, url.as_ref()));
                Job {
                    index: seg.index,
                    url,
                    dest,
                }
            })
            .collect();

        let count = jobs.len();
        let mut slots: Vec<Option<DownloadResult>> = vec![None; count];
        let positions: Vec<(usize, PathBuf)> =
            jobs.iter().map(|j| (j.index, j.dest.clone())).collect();
        if count == 0 {
            return CoordinatorOutcome { results: Vec::new() };
        }

        let work: Arc<Mutex<VecDeque<(usize, Job)>>> =
            Arc::new(Mutex::new(jobs.into_iter().enumerate().collect()));
        let (tx, rx) = mpsc::channel();
        let num_workers = self.worker_count.min(count);
        tracing::debug!(segments = count, workers = num_workers, "starting segment pool");

        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let work = Arc::clone(&work);
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            let progress = Arc::clone(progress);
            handles.push(std::thread::spawn(move || loop {
                let next = work.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
                let (slot, job) = match next {
                    Some(p) => p,
                    None => break,
                };
                let success = match &job.url {
                    Some(url) => fetcher.fetch(url.as_str(), &job.dest),
                    None => false,
                };
                progress.record(success);
                let _ = tx.send((
                    slot,
                    DownloadResult {
                        index: job.index,
                        local_path: job.dest,
                        success,
                    },
                ));
            }));
        }
        drop(tx);

        for (slot, result) in rx.iter() {
            slots[slot] = Some(result);
        }
        for h in handles {
            if let Err(e) = h.join() {
                tracing::error!("segment worker panicked: {:?}", e);
            }
        }

        // A panicked worker leaves its slot empty; that segment counts as failed.
        let mut results: Vec<DownloadResult> = slots
            .into_iter()
            .zip(positions)
            .map(|(slot, (index, local_path))| {
                slot.unwrap_or(DownloadResult {
                    index,
                    local_path,
                    success: false,
                })
            })
            .collect();
        results.sort_by_key(|r| r.index);
        CoordinatorOutcome { results }
    }
}
