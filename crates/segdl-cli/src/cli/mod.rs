//! CLI for the segdl episode downloader.

mod commands;
mod progress;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use segdl_core::config::{self, SegdlConfig};
use std::path::PathBuf;

use commands::{run_detect, run_fetch, run_resume, run_run, run_status};

/// Top-level CLI for the segdl episode downloader.
#[derive(Debug, Parser)]
#[command(name = "segdl")]
#[command(about = "segdl: resumable segmented-playlist episode downloader", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Per-invocation overrides of config.toml values.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Concurrent segment downloads per episode.
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// Output container / extension (e.g. mp4, mkv).
    #[arg(long, global = true, value_name = "EXT")]
    pub format: Option<String>,

    /// Directory for finished episodes.
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for segment files and intermediate assemblies.
    #[arg(long, global = true, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Task-state JSON file.
    #[arg(long, global = true, value_name = "FILE")]
    pub state_file: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut SegdlConfig) {
        if let Some(n) = self.workers {
            cfg.worker_count = n.max(1);
        }
        if let Some(f) = &self.format {
            cfg.output_format = f.trim_start_matches('.').to_string();
        }
        if let Some(d) = &self.output_dir {
            cfg.output_dir = d.clone();
        }
        if let Some(d) = &self.scratch_dir {
            cfg.scratch_dir = d.clone();
        }
        if let Some(p) = &self.state_file {
            cfg.state_file = Some(p.clone());
        }
    }
}

/// Where the episode playlist URLs come from.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["list", "pattern", "example"])))]
pub struct RunArgs {
    /// Text file with one playlist URL per line (`[Title]` lines open sections).
    #[arg(long, value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// URL template containing `{{episode}}`.
    #[arg(long, value_name = "URL")]
    pub pattern: Option<String>,

    /// A concrete episode URL containing a `第NN集` token.
    #[arg(long, value_name = "URL")]
    pub example: Option<String>,

    /// First episode number (pattern/example only).
    #[arg(long, default_value = "1", value_name = "N")]
    pub from: u32,

    /// Last episode number; probed with HEAD when omitted (pattern/example only).
    #[arg(long, value_name = "N")]
    pub to: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download, assemble, and transcode a batch of episodes.
    Run(RunArgs),

    /// Re-run every item that is not completed in the task-state file.
    Resume,

    /// Show the task-state table and per-status counts.
    Status,

    /// Probe which episodes of a URL pattern exist, without downloading.
    #[command(group(ArgGroup::new("source").required(true).args(["pattern", "example"])))]
    Detect {
        /// URL template containing `{{episode}}`.
        #[arg(long, value_name = "URL")]
        pattern: Option<String>,

        /// A concrete episode URL containing a `第NN集` token.
        #[arg(long, value_name = "URL")]
        example: Option<String>,

        /// First episode number to probe.
        #[arg(long, default_value = "1", value_name = "N")]
        start: u32,

        /// Maximum number of episodes to probe.
        #[arg(long, default_value = "200", value_name = "N")]
        max: u32,
    },

    /// Download a single playlist URL.
    Fetch {
        /// Playlist URL.
        url: String,

        /// Episode number (names the output file and the task id).
        #[arg(long, default_value = "1", value_name = "N")]
        id: u32,

        /// Place the episode under this title.
        #[arg(long)]
        title: Option<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        cli.overrides.apply(&mut cfg);
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => run_run(&cfg, args).await?,
            CliCommand::Resume => run_resume(&cfg).await?,
            CliCommand::Status => run_status(&cfg)?,
            CliCommand::Detect {
                pattern,
                example,
                start,
                max,
            } => run_detect(&cfg, pattern, example, start, max).await?,
            CliCommand::Fetch { url, id, title } => run_fetch(&cfg, url, id, title).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
