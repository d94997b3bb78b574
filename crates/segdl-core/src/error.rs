//! Error taxonomy for the download-and-assembly pipeline.
//!
//! Each stage has its own error type so the pipeline can decide what is
//! retryable and what marks a work item failed. `PipelineError` is what crosses
//! the work-item boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Network/HTTP layer failure for one request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),

    /// Response had a non-2xx status.
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u32 },

    /// Destination file could not be created or written. Not retried.
    #[error("storage: {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Playlist could not be turned into a segment list.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document was fetched but listed no segments.
    #[error("playlist {source_locator} lists no segments")]
    EmptyPlaylist { source_locator: String },

    /// A locator could not be parsed or resolved against the base.
    #[error("invalid locator {locator:?}: {source}")]
    InvalidLocator {
        locator: String,
        #[source]
        source: url::ParseError,
    },
}

/// A segment reported as downloaded is gone at assembly time.
#[derive(Debug, Error)]
#[error("segment file missing at assembly: {}", .path.display())]
pub struct MissingSegmentError {
    pub path: PathBuf,
}

/// Assembly (concatenation) failure.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    MissingSegment(#[from] MissingSegmentError),

    #[error("assemble {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// External encoder failure.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Encoder ran and exited non-zero; `stderr` holds its diagnostics.
    #[error("encoder exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Failed { code: Option<i32>, stderr: String },

    /// Encoder could not be started.
    #[error("could not start encoder {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copy fallback failed.
    #[error("copy {} -> {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Staged output could not be moved onto the final path.
    #[error("finalize {} -> {}: {source}", .from.display(), .to.display())]
    Finalize {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Task-state persistence failure. Logged; never aborts a run.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("task state {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("task state {} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of one work item, recorded as `Failed` with this text.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("playlist fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("no segments downloaded ({failed} of {total} failed)")]
    NoSegmentsDownloaded { total: usize, failed: usize },

    #[error("assembly failed: {0}")]
    Assemble(#[from] AssembleError),

    #[error("transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("episode not found")]
    EpisodeNotFound,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// True when the playlist simply had nothing to download.
    pub fn is_no_data(&self) -> bool {
        matches!(self, PipelineError::Parse(ParseError::EmptyPlaylist { .. }))
    }
}
