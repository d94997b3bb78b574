//! Segment-line classification.

use regex::Regex;

use super::resolve::base_locator;
use super::{ParseMode, Playlist, PlaylistRules, SegmentRef};
use crate::error::ParseError;

const COMMENT_MARKER: char = '#';

/// True if `line` (already trimmed) names a segment under `rules`.
pub fn is_segment_line(line: &str, rules: &PlaylistRules) -> bool {
    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return false;
    }
    let (path, query) = match line.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (line, None),
    };
    if query.is_some() && !rules.allow_query {
        return false;
    }
    let path = path.split('#').next().unwrap_or(path);
    let Some((stem, ext)) = path.rsplit_once('.') else {
        return false;
    };
    if stem.is_empty() || stem.ends_with('/') {
        return false;
    }
    rules
        .extensions
        .iter()
        .any(|want| ext.eq_ignore_ascii_case(want))
}

fn parse_lines(body: &str, rules: &PlaylistRules) -> Vec<SegmentRef> {
    body.lines()
        .map(str::trim)
        .filter(|line| is_segment_line(line, rules))
        .enumerate()
        .map(|(index, line)| SegmentRef {
            index,
            locator: line.to_string(),
        })
        .collect()
}

fn parse_pattern(body: &str, rules: &PlaylistRules) -> Vec<SegmentRef> {
    let exts: Vec<String> = rules.extensions.iter().map(|e| regex::escape(e)).collect();
    if exts.is_empty() {
        return Vec::new();
    }
    let pattern = format!(r"(?i)(\d+)\.({})\b", exts.join("|"));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("bad segment pattern {}: {}", pattern, e);
            return Vec::new();
        }
    };
    re.captures_iter(body)
        .enumerate()
        .map(|(index, caps)| SegmentRef {
            index,
            locator: format!("{}.{}", &caps[1], &caps[2]),
        })
        .collect()
}

/// Parse a playlist body fetched from `source`.
pub fn parse_playlist(
    body: &str,
    source: &str,
    rules: &PlaylistRules,
) -> Result<Playlist, ParseError> {
    let base = base_locator(source)?;
    let segments = match rules.mode {
        ParseMode::Lines => parse_lines(body, rules),
        ParseMode::Pattern => parse_pattern(body, rules),
    };
    if segments.is_empty() {
        return Err(ParseError::EmptyPlaylist {
            source_locator: source.to_string(),
        });
    }
    Ok(Playlist {
        source: source.to_string(),
        base,
        segments,
    })
}
