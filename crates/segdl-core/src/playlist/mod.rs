//! Playlist fetch and parse.
//!
//! Turns a segment-listing text document into an ordered list of
//! `SegmentRef`s plus the base URL that relative locators resolve against.
//! Two classification modes share one parser:
//! - `Lines`: one locator per line, `#` comments and blanks skipped, a line is a
//!   segment if its path ends with a configured extension (optionally followed
//!   by `?query`).
//! - `Pattern`: legacy numbering-only playlists; the whole body is scanned for
//!   `<digits>.<ext>` tokens.

mod parse;
mod resolve;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ParseError, PipelineError};
use crate::transport::Transport;

pub use parse::{is_segment_line, parse_playlist};
pub use resolve::{base_locator, resolve};

/// One segment reference. `index` is the order key, never the locator text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub index: usize,
    pub locator: String,
}

/// Line-classification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Lines,
    Pattern,
}

/// Rules for recognizing segment lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRules {
    pub mode: ParseMode,
    /// Extensions without the dot, compared case-insensitively.
    pub extensions: Vec<String>,
    pub allow_query: bool,
}

impl Default for PlaylistRules {
    fn default() -> Self {
        Self {
            mode: ParseMode::Lines,
            extensions: vec!["ts".to_string()],
            allow_query: true,
        }
    }
}

/// Parsed playlist: ordered segments and the directory-equivalent base URL.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub source: String,
    pub base: Url,
    pub segments: Vec<SegmentRef>,
}

impl Playlist {
    /// Absolute URL for a segment of this playlist.
    pub fn segment_url(&self, segment: &SegmentRef) -> Result<Url, ParseError> {
        resolve(&self.base, &segment.locator)
    }
}

/// GET the playlist at `source` and parse it. A fetch failure is a
/// `PipelineError::Fetch`; an empty listing is `ParseError::EmptyPlaylist`.
pub fn fetch_playlist(
    transport: &dyn Transport,
    source: &str,
    rules: &PlaylistRules,
) -> Result<Playlist, PipelineError> {
    let body = transport.get_text(source)?;
    tracing::debug!(url = source, bytes = body.len(), "fetched playlist");
    let playlist = parse_playlist(&body, source, rules)?;
    tracing::info!(
        url = source,
        segments = playlist.segments.len(),
        base = %playlist.base,
        "parsed playlist"
    );
    Ok(playlist)
}
