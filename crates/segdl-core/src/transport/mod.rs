//! HTTP transport: playlist GET, streamed segment GET, and HEAD probe.
//!
//! The pipeline only talks to the network through the `Transport` trait so the
//! fetcher and the pipeline can be driven by stubs in tests. `CurlTransport`
//! is the real implementation (libcurl Easy handles, one per request).

mod curl_impl;
mod headers;

use std::path::Path;

use crate::error::FetchError;

pub use curl_impl::{CurlTransport, TransportOptions};
pub use headers::{parse_probe_headers, ProbeResult};

/// Blocking HTTP operations used by the pipeline. Implementations must be
/// shareable across the segment worker threads.
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text (lossy UTF-8).
    fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET `url` and stream the body into `dest` (created or truncated).
    /// Returns bytes written. On error `dest` may hold a partial body.
    fn download_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;

    /// HEAD `url`. Non-2xx statuses are returned in `ProbeResult::status`,
    /// only transport failures are errors.
    fn probe(&self, url: &str) -> Result<ProbeResult, FetchError>;
}

/// True for 2xx.
pub(crate) fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}
