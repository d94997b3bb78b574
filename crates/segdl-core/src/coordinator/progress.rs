//! Shared per-item progress tally.

use std::sync::Mutex;

/// Point-in-time view of one work item's segment downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub item: String,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl ProgressSnapshot {
    pub fn done(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Completed fraction in `0.0..=1.0`; an empty item counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done() as f64 / self.total as f64
        }
    }
}

/// Counter updated by every worker as a segment completes. Each update is
/// applied under one lock, so `succeeded + failed` never exceeds `total` and
/// no completion is lost. Snapshots are optionally forwarded to a listener
/// with `try_send`, so a slow listener drops intermediate snapshots. The
/// final snapshot is sent with `blocking_send` from worker threads so the
/// listener always sees the finished tally.
#[derive(Debug)]
pub struct ProgressCounter {
    tally: Mutex<ProgressSnapshot>,
    sink: Option<tokio::sync::mpsc::Sender<ProgressSnapshot>>,
}

impl ProgressCounter {
    pub fn new(item: impl Into<String>, total: usize) -> Self {
        Self {
            tally: Mutex::new(ProgressSnapshot {
                item: item.into(),
                succeeded: 0,
                failed: 0,
                total,
            }),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Option<tokio::sync::mpsc::Sender<ProgressSnapshot>>) -> Self {
        self.sink = sink;
        self
    }

    /// Record one completion and return the tally after it.
    pub fn record(&self, success: bool) -> ProgressSnapshot {
        let (snap, finished) = {
            let mut t = self.tally.lock().unwrap_or_else(|e| e.into_inner());
            let mut finished = false;
            if t.done() < t.total {
                if success {
                    t.succeeded += 1;
                } else {
                    t.failed += 1;
                }
                finished = t.done() == t.total;
            }
            (t.clone(), finished)
        };
        if let Some(tx) = &self.sink {
            // blocking_send panics inside a runtime context.
            let on_runtime = tokio::runtime::Handle::try_current().is_ok();
            if finished && !on_runtime {
                let _ = tx.blocking_send(snap.clone());
            } else {
                let _ = tx.try_send(snap.clone());
            }
        }
        snap
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tally.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn concurrent_records_are_not_lost() {
        let counter = Arc::new(ProgressCounter::new("ep", 400));
        let handles: Vec<_> = (0..8)
            .map(|w| {
                let c = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        c.record((w + i) % 4 != 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = counter.snapshot();
        assert_eq!(snap.done(), 400);
        assert_eq!(snap.succeeded, 300);
        assert_eq!(snap.failed, 100);
        assert!((snap.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn never_exceeds_total() {
        let counter = ProgressCounter::new("ep", 1);
        counter.record(true);
        let snap = counter.record(true);
        assert_eq!(snap.done(), 1);
    }

    #[tokio::test]
    async fn snapshots_reach_listener() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let counter = ProgressCounter::new("3", 2).with_sink(Some(tx));
        counter.record(true);
        counter.record(false);
        let first = rx.recv().await.unwrap();
        assert_eq!((first.succeeded, first.failed), (1, 0));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.item, "3");
        assert_eq!(second.done(), 2);
    }

    #[tokio::test]
    async fn final_snapshot_waits_for_full_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let counter = Arc::new(ProgressCounter::new("5", 3).with_sink(Some(tx)));
        counter.record(true);
        // Channel is full: this intermediate snapshot is dropped.
        counter.record(true);
        let worker = {
            let c = Arc::clone(&counter);
            std::thread::spawn(move || c.record(false))
        };

        let first = rx.recv().await.unwrap();
        assert_eq!(first.done(), 1);
        let last = rx.recv().await.unwrap();
        assert_eq!((last.succeeded, last.failed, last.total), (2, 1, 3));
        tokio::task::spawn_blocking(move || worker.join().unwrap())
            .await
            .unwrap();
    }
}
