//! Segment fetch with retry: one URL into one local file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::retry::{run_with_retry_using, RetryPolicy};
use crate::transport::Transport;

/// Sleeps between attempts. Replaced in tests to record backoff delays.
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Downloads single segments, retrying transient failures with capped
/// exponential backoff. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct SegmentFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sleeper: Sleeper,
}

impl SegmentFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `url` into `dest`. True once the body is fully written; false
    /// after the retry budget is spent or on a non-retryable error. A failed
    /// fetch never leaves `dest` behind.
    pub fn fetch(&self, url: &str, dest: &Path) -> bool {
        match self.try_fetch(url, dest) {
            Ok(bytes) => {
                tracing::debug!(url, bytes, dest = %dest.display(), "segment saved");
                true
            }
            Err(e) => {
                tracing::warn!(url, "segment failed: {}", e);
                let _ = std::fs::remove_file(dest);
                false
            }
        }
    }

    /// Like `fetch` but returns the last error.
    pub fn try_fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let sleeper = Arc::clone(&self.sleeper);
        run_with_retry_using(
            &self.policy,
            move |d| sleeper(d),
            |attempt| {
                self.transport.download_to(url, dest).map_err(|e| {
                    tracing::debug!(url, attempt, "segment attempt failed: {}", e);
                    e
                })
            },
        )
    }
}
