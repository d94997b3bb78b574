//! Intermediate file to final container.
//!
//! `FfmpegTranscoder` re-encodes with an external `ffmpeg`; when no encoder is
//! available it degrades to a plain copy and reports `Copied`.

mod ffmpeg;

use std::path::Path;

use crate::error::TranscodeError;

pub use ffmpeg::FfmpegTranscoder;

/// How the final file was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Encoded,
    Copied,
}

/// Produces `output` from `input`. `input` is never modified or removed.
pub trait Transcoder: Send + Sync {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: &str,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}
