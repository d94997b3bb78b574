//! Retry and backoff policy.
//!
//! One retry primitive shared by the segment fetcher and the transcode stage:
//! errors are classified into an `ErrorKind`, the policy turns
//! (attempt, kind) into a decision, and the runner sleeps between attempts.

mod classify;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status, Retryable};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, run_with_retry_using};
