use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::playlist::{ParseMode, PlaylistRules};
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per segment (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds; the backoff before retry `n` is `base * 2^n`.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 1.0,
            max_delay_secs: 10,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Playlist line-classification rules (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// "lines" (default) or "pattern" for numbering-only legacy playlists.
    #[serde(default)]
    pub mode: ParseMode,
    /// Segment file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Accept a `?query` suffix after the extension.
    pub allow_query: bool,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::Lines,
            extensions: vec!["ts".to_string()],
            allow_query: true,
        }
    }
}

impl PlaylistConfig {
    pub fn to_rules(&self) -> PlaylistRules {
        PlaylistRules {
            mode: self.mode,
            extensions: self.extensions.clone(),
            allow_query: self.allow_query,
        }
    }
}

/// Global configuration loaded from `~/.config/segdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegdlConfig {
    /// Concurrent segment downloads per work item.
    pub worker_count: usize,
    /// Per-attempt timeout for one segment GET, in seconds.
    pub segment_timeout_secs: u64,
    /// Connect timeout for every request, in seconds.
    pub connect_timeout_secs: u64,
    /// Fixed pause between work items, in milliseconds.
    pub pacing_delay_ms: u64,
    /// Upper bound of the random extra pause between work items, in milliseconds.
    pub pacing_jitter_ms: u64,
    /// Target container/extension handed to the encoder.
    pub output_format: String,
    /// Scratch directory for segment files and the intermediate assembly.
    pub scratch_dir: PathBuf,
    /// Directory for finished episodes.
    pub output_dir: PathBuf,
    /// Task-state file; defaults to `~/.local/state/segdl/task_status.json`.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Encoder binary; when unset, `ffmpeg` is looked up on PATH.
    #[serde(default)]
    pub encoder: Option<PathBuf>,
    /// How many times the transcode stage is attempted before the item fails.
    #[serde(default = "default_transcode_attempts")]
    pub transcode_attempts: u32,
    /// Optional User-Agent for every request.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Extra request headers (e.g. Referer).
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional playlist rules; if missing, `.ts` lines with optional query.
    #[serde(default)]
    pub playlist: Option<PlaylistConfig>,
}

fn default_transcode_attempts() -> u32 {
    1
}

impl Default for SegdlConfig {
    fn default() -> Self {
        Self {
            worker_count: 8,
            segment_timeout_secs: 10,
            connect_timeout_secs: 10,
            pacing_delay_ms: 1000,
            pacing_jitter_ms: 1000,
            output_format: "mp4".to_string(),
            scratch_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("video"),
            state_file: None,
            encoder: None,
            transcode_attempts: default_transcode_attempts(),
            user_agent: None,
            headers: None,
            retry: None,
            playlist: None,
        }
    }
}

impl SegdlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().to_policy()
    }

    pub fn playlist_rules(&self) -> PlaylistRules {
        self.playlist.clone().unwrap_or_default().to_rules()
    }

    /// Resolved task-state path: explicit `state_file` or the XDG default.
    pub fn state_file_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(p) => Ok(p.clone()),
            None => default_state_file(),
        }
    }
}

/// Default task-state path: `~/.local/state/segdl/task_status.json`.
pub fn default_state_file() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segdl")?;
    Ok(xdg_dirs.get_state_home().join("task_status.json"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SegdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SegdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SegdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
