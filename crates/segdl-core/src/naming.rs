//! Local file and directory names: segment scratch files, episode outputs,
//! per-title directories. Everything that reaches the filesystem goes through
//! `sanitize_component` first.

use url::Url;

/// Sanitizes a candidate path component for safe use on Linux.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Trims leading/trailing spaces, dots, and underscores
/// - Collapses consecutive underscores
/// - Limits length to 255 bytes (Linux NAME_MAX)
pub fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() || c == '\t' {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.' || c == '_');
    truncate_name(trimmed).to_string()
}

/// Linux NAME_MAX, in bytes.
const NAME_MAX: usize = 255;

/// Longest prefix of `name` that fits NAME_MAX on a char boundary.
fn truncate_name(name: &str) -> &str {
    if name.len() <= NAME_MAX {
        return name;
    }
    let mut take = NAME_MAX;
    while take > 0 && !name.is_char_boundary(take) {
        take -= 1;
    }
    &name[..take]
}

/// Scratch file name for segment `index`: zero-padded index plus the last
/// path component of its URL, so equal names from different directories
/// never collide and a directory listing sorts in playlist order.
pub fn segment_file_name(index: usize, url: Option<&Url>) -> String {
    let tail = url
        .and_then(|u| u.path_segments())
        .and_then(|mut segs| segs.next_back().map(str::to_string))
        .map(|s| sanitize_component(&s))
        .filter(|s| !s.is_empty());
    match tail {
        Some(name) => truncate_name(&format!("{:05}_{}", index, name)).to_string(),
        None => format!("{:05}.seg", index),
    }
}

/// Stem shared by an episode's intermediate and final files: `episode_07`.
pub fn episode_stem(number: u32) -> String {
    format!("episode_{:02}", number)
}
