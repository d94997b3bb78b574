use std::io;
use std::path::{Path, PathBuf};

use crate::item::WorkItem;
use crate::naming::{episode_stem, sanitize_component};

/// Where an item's files live.
///
/// ```text
/// <scratch>/[<title>/]episode_07.segments/00000_seg.ts …
/// <scratch>/[<title>/]episode_07.temp.mp4
/// <output>/[<title>/]episode_07.part.mp4   (encoder output until renamed)
/// <output>/[<title>/]episode_07.mp4
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: String,
}

impl Layout {
    pub fn new(scratch_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            output_dir: output_dir.into(),
            format: format.into(),
        }
    }

    fn namespaced(&self, root: &Path, item: &WorkItem) -> PathBuf {
        match item.title.as_deref().map(sanitize_component) {
            Some(t) if !t.is_empty() => root.join(t),
            _ => root.to_path_buf(),
        }
    }

    pub fn final_path(&self, item: &WorkItem) -> PathBuf {
        self.namespaced(&self.output_dir, item)
            .join(format!("{}.{}", episode_stem(item.number), self.format))
    }

    /// Encoder target next to the final file. The extension stays last so
    /// the encoder still infers the container from it.
    pub fn staging_path(&self, item: &WorkItem) -> PathBuf {
        self.namespaced(&self.output_dir, item)
            .join(format!("{}.part.{}", episode_stem(item.number), self.format))
    }

    pub fn intermediate_path(&self, item: &WorkItem) -> PathBuf {
        self.namespaced(&self.scratch_dir, item)
            .join(format!("{}.temp.{}", episode_stem(item.number), self.format))
    }

    pub fn segment_dir(&self, item: &WorkItem) -> PathBuf {
        self.namespaced(&self.scratch_dir, item)
            .join(format!("{}.segments", episode_stem(item.number)))
    }

    /// Create the scratch, segment, and output directories for `item`.
    pub fn prepare(&self, item: &WorkItem) -> io::Result<()> {
        std::fs::create_dir_all(self.segment_dir(item))?;
        std::fs::create_dir_all(self.namespaced(&self.output_dir, item))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untitled_paths() {
        let l = Layout::new("data", "video", "mp4");
        let item = WorkItem::new(7, None, "https://x/7.m3u8");
        assert_eq!(l.final_path(&item), PathBuf::from("video/episode_07.mp4"));
        assert_eq!(l.intermediate_path(&item), PathBuf::from("data/episode_07.temp.mp4"));
        assert_eq!(l.segment_dir(&item), PathBuf::from("data/episode_07.segments"));
        assert_eq!(l.staging_path(&item), PathBuf::from("video/episode_07.part.mp4"));
    }

    #[test]
    fn titled_paths_are_sanitized() {
        let l = Layout::new("data", "video", "mkv");
        let item = WorkItem::new(12, Some("Show/S1".to_string()), "https://x/a.m3u8");
        assert_eq!(l.final_path(&item), PathBuf::from("video/Show_S1/episode_12.mkv"));
        assert_eq!(l.intermediate_path(&item), PathBuf::from("data/Show_S1/episode_12.temp.mkv"));
    }
}
