//! Parse HEAD response header lines into ProbeResult.

/// Result of a HEAD request: what episode discovery needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    /// Final HTTP status (after redirects).
    pub status: u32,
    /// `Content-Type`, if present.
    pub content_type: Option<String>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
}

impl ProbeResult {
    /// True if the response looks like a playlist document.
    pub fn is_playlist(&self) -> bool {
        if self.status != 200 {
            return false;
        }
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("mpegurl") || ct.contains("text/plain")
            })
            .unwrap_or(false)
    }
}

/// Parse collected header lines. A new status line (redirect hop) resets
/// the headers seen so far, so only the final response counts.
pub fn parse_probe_headers(status: u32, lines: &[String]) -> ProbeResult {
    let mut content_type = None;
    let mut content_length = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            content_type = None;
            content_length = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    content_length = Some(n);
                }
            }
        }
    }

    ProbeResult {
        status,
        content_type,
        content_length,
    }
}
