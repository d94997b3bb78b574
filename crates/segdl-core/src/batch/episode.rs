//! Numbered-episode URL templates and HEAD-probe discovery.

use anyhow::{bail, Result};
use regex::Regex;
use url::Url;

use crate::transport::Transport;

pub const PLACEHOLDER: &str = "{{episode}}";

/// Misses tolerated at the start of a scan before it stops on the first gap.
const LEADING_GRACE: u32 = 2;

/// A playlist URL with an `{{episode}}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePattern {
    template: String,
    width: usize,
}

impl EpisodePattern {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            bail!("pattern {:?} has no {} placeholder", template, PLACEHOLDER);
        }
        Ok(Self { template, width: 2 })
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Build a pattern from one concrete episode URL: percent-decode it and
    /// replace the number in the `第NN集` token. None when there is no token.
    pub fn from_example(url: &str) -> Option<Self> {
        let decoded = urlencoding::decode(url).ok()?;
        let re = Regex::new(r"第(\d+)集").ok()?;
        let caps = re.captures(&decoded)?;
        let digits = caps.get(1)?;
        let template = format!(
            "{}{}{}",
            &decoded[..digits.start()],
            PLACEHOLDER,
            &decoded[digits.end()..]
        );
        Some(Self {
            template,
            width: digits.as_str().len().max(2),
        })
    }

    /// URL for episode `n`. Non-ASCII path text is percent-encoded.
    pub fn url_for(&self, n: u32) -> String {
        let raw = self
            .template
            .replace(PLACEHOLDER, &format!("{:0width$}", n, width = self.width));
        Url::parse(&raw).map(String::from).unwrap_or(raw)
    }
}

/// HEAD the episode playlist; true on 200 with a playlist content type.
pub fn episode_exists(transport: &dyn Transport, pattern: &EpisodePattern, n: u32) -> bool {
    let url = pattern.url_for(n);
    match transport.probe(&url) {
        Ok(p) => {
            tracing::debug!(episode = n, status = p.status, content_type = ?p.content_type, "probe");
            p.is_playlist()
        }
        Err(e) => {
            tracing::warn!(episode = n, url = %url, "probe failed: {}", e);
            false
        }
    }
}

/// Probe episodes `start..start + max_check` in order and return the ones
/// that exist. Stops at the first miss once past `start + 2`.
pub fn detect_episodes(
    transport: &dyn Transport,
    pattern: &EpisodePattern,
    start: u32,
    max_check: u32,
) -> Vec<u32> {
    let mut found = Vec::new();
    for n in start..start.saturating_add(max_check) {
        if episode_exists(transport, pattern, n) {
            found.push(n);
        } else if n > start + LEADING_GRACE {
            break;
        }
    }
    tracing::info!(found = found.len(), "episode scan from {}", start);
    found
}
