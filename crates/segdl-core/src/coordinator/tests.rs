use super::*;
use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::transport::{ProbeResult, Transport};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves `seg-<n>.ts` as the bytes `"<n>;"`. Earlier segments take longer,
/// so completion order is the reverse of playlist order.
struct SlowFirst {
    total: usize,
    failing: HashSet<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowFirst {
    fn new(total: usize, failing: &[&str]) -> Self {
        Self {
            total,
            failing: failing.iter().map(|s| s.to_string()).collect(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

impl Transport for SlowFirst {
    fn get_text(&self, _url: &str) -> Result<String, FetchError> {
        unreachable!()
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let name = url.rsplit('/').next().unwrap().to_string();
        let n: usize = name
            .trim_start_matches("seg-")
            .trim_end_matches(".ts")
            .parse()
            .unwrap();
        std::thread::sleep(Duration::from_millis(((self.total - n) * 5) as u64));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(&name) {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            });
        }
        let body = format!("{};", n);
        std::fs::write(dest, &body).unwrap();
        Ok(body.len() as u64)
    }

    fn probe(&self, _url: &str) -> Result<ProbeResult, FetchError> {
        unreachable!()
    }
}

fn segments(n: usize) -> Vec<SegmentRef> {
    (0..n)
        .map(|i| SegmentRef {
            index: i,
            locator: format!("seg-{}.ts", i),
        })
        .collect()
}

fn base() -> Url {
    Url::parse("https://cdn.example.com/show/ep01/").unwrap()
}

fn coordinator(transport: Arc<SlowFirst>, workers: usize) -> Coordinator {
    let fetcher = SegmentFetcher::new(transport, RetryPolicy::once());
    Coordinator::new(fetcher, workers)
}

#[test]
fn paths_follow_index_not_completion_order() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(SlowFirst::new(12, &[]));
    let progress = Arc::new(ProgressCounter::new("1", 12));
    let out = coordinator(transport.clone(), 4).run(&segments(12), &base(), dir.path(), &progress);

    assert_eq!(out.succeeded(), 12);
    let paths = out.succeeded_paths();
    let contents: Vec<String> = paths
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect();
    let expected: Vec<String> = (0..12).map(|i| format!("{};", i)).collect();
    assert_eq!(contents, expected);
    assert_eq!(paths[3].file_name().unwrap(), "00003_seg-3.ts");
    assert!(transport.peak.load(Ordering::SeqCst) <= 4);
    assert_eq!(progress.snapshot().done(), 12);
}

#[test]
fn failed_segments_are_omitted_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(SlowFirst::new(5, &["seg-1.ts", "seg-3.ts"]));
    let progress = Arc::new(ProgressCounter::new("1", 5));
    let out = coordinator(transport, 2).run(&segments(5), &base(), dir.path(), &progress);

    assert_eq!(out.total(), 5);
    assert_eq!(out.failed(), 2);
    let names: Vec<String> = out
        .succeeded_paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["00000_seg-0.ts", "00002_seg-2.ts", "00004_seg-4.ts"]);
    let snap = progress.snapshot();
    assert_eq!((snap.succeeded, snap.failed), (3, 2));
}

#[test]
fn all_failures_yield_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let names: Vec<String> = (0..3).map(|i| format!("seg-{}.ts", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let transport = Arc::new(SlowFirst::new(3, &refs));
    let progress = Arc::new(ProgressCounter::new("1", 3));
    let out = coordinator(transport, 8).run(&segments(3), &base(), dir.path(), &progress);

    assert!(out.succeeded_paths().is_empty());
    assert!(!out.has_output());
    assert_eq!(out.failed(), 3);
}

#[test]
fn empty_segment_list_returns_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(SlowFirst::new(0, &[]));
    let progress = Arc::new(ProgressCounter::new("1", 0));
    let out = coordinator(transport, 8).run(&[], &base(), dir.path(), &progress);
    assert_eq!(out.total(), 0);
    assert!(!out.has_output());
}
