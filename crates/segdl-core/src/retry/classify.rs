//! Classify HTTP status, curl errors, and stage errors into retry kinds.

use crate::error::{FetchError, TranscodeError};
use crate::retry::policy::ErrorKind;

/// Errors that the retry runner knows how to classify.
pub trait Retryable {
    fn kind(&self) -> ErrorKind;
}

/// Classify a non-2xx HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        _ => ErrorKind::HttpStatus(code.min(u16::MAX as u32) as u16),
    }
}

/// Classify a curl error. Malformed URLs and local write failures are not retried.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() || e.is_write_error() {
        return ErrorKind::Other;
    }
    ErrorKind::Connection
}

impl Retryable for FetchError {
    fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Curl(e) => classify_curl_error(e),
            FetchError::Http { status, .. } => classify_http_status(*status),
            FetchError::Storage { .. } => ErrorKind::Other,
        }
    }
}

impl Retryable for TranscodeError {
    fn kind(&self) -> ErrorKind {
        match self {
            TranscodeError::Failed { .. } => ErrorKind::Transient,
            TranscodeError::Spawn { .. }
            | TranscodeError::Copy { .. }
            | TranscodeError::Finalize { .. } => ErrorKind::Other,
        }
    }
}
