//! Work-item sources: batch list files and numbered-episode URL patterns.

mod episode;
mod list;

pub use episode::{detect_episodes, episode_exists, EpisodePattern, PLACEHOLDER};
pub use list::{is_playlist_url, parse_batch_list, read_batch_list, BatchList, BatchWarning};
