use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

use crate::item::WorkItem;

/// A skipped input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWarning {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct BatchList {
    pub items: Vec<WorkItem>,
    pub warnings: Vec<BatchWarning>,
}

/// True for an http(s) URL whose path ends in `.m3u8`.
pub fn is_playlist_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(u) => {
            matches!(u.scheme(), "http" | "https")
                && u.path().to_ascii_lowercase().ends_with(".m3u8")
        }
        Err(_) => false,
    }
}

fn section_title(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

/// Parse a batch list. Untitled entries share one running counter across the
/// file; each `[Title]` section restarts at 1 and ends at the next blank line.
pub fn parse_batch_list(text: &str) -> BatchList {
    let mut out = BatchList::default();
    let mut title: Option<String> = None;
    let mut untitled = 0u32;
    let mut in_section = 0u32;

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let warn = |reason| BatchWarning {
            line: i + 1,
            text: line.to_string(),
            reason,
        };
        if line.is_empty() {
            title = None;
            continue;
        }
        if let Some(t) = section_title(line) {
            title = Some(t.to_string());
            in_section = 0;
            continue;
        }
        if line.starts_with('#') {
            out.warnings.push(warn("comment"));
            continue;
        }
        if !is_playlist_url(line) {
            out.warnings.push(warn("not a playlist URL"));
            continue;
        }
        let number = match &title {
            Some(_) => {
                in_section += 1;
                in_section
            }
            None => {
                untitled += 1;
                untitled
            }
        };
        out.items.push(WorkItem::new(number, title.clone(), line));
    }
    out
}

/// Read and parse a batch list file; warnings are logged.
pub fn read_batch_list(path: &Path) -> Result<BatchList> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read batch list {}", path.display()))?;
    let list = parse_batch_list(&text);
    for w in &list.warnings {
        tracing::warn!(line = w.line, "{}: skipping {:?}", w.reason, w.text);
    }
    tracing::info!(items = list.items.len(), "batch list {}", path.display());
    Ok(list)
}
