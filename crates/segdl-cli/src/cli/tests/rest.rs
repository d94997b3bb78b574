//! Tests for resume, status, detect, and fetch.

use super::parse;
use crate::cli::{progress, Cli, CliCommand};
use clap::Parser;
use segdl_core::coordinator::ProgressSnapshot;

#[test]
fn cli_parse_resume_and_status() {
    assert!(matches!(parse(&["segdl", "resume"]), CliCommand::Resume));
    assert!(matches!(parse(&["segdl", "status"]), CliCommand::Status));
}

#[test]
fn cli_parse_detect_defaults() {
    match parse(&["segdl", "detect", "--pattern", "https://x/{{episode}}.m3u8"]) {
        CliCommand::Detect {
            pattern,
            example,
            start,
            max,
        } => {
            assert_eq!(pattern.as_deref(), Some("https://x/{{episode}}.m3u8"));
            assert!(example.is_none());
            assert_eq!((start, max), (1, 200));
        }
        _ => panic!("expected Detect"),
    }
}

#[test]
fn cli_parse_detect_requires_pattern_or_example() {
    assert!(Cli::try_parse_from(["segdl", "detect", "--start", "5"]).is_err());
}

#[test]
fn cli_parse_fetch() {
    match parse(&["segdl", "fetch", "https://x/index.m3u8", "--id", "4", "--title", "Show"]) {
        CliCommand::Fetch { url, id, title } => {
            assert_eq!(url, "https://x/index.m3u8");
            assert_eq!(id, 4);
            assert_eq!(title.as_deref(), Some("Show"));
        }
        _ => panic!("expected Fetch"),
    }
    match parse(&["segdl", "fetch", "https://x/index.m3u8"]) {
        CliCommand::Fetch { id, title, .. } => {
            assert_eq!(id, 1);
            assert!(title.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn progress_line_renders_counts() {
    let line = progress::render(&ProgressSnapshot {
        item: "7".to_string(),
        succeeded: 9,
        failed: 1,
        total: 20,
    });
    assert!(line.contains("[7]"));
    assert!(line.contains("10/20 segments (1 failed) 50.0%"));
    assert!(line.contains(&format!("[{}{}]", "#".repeat(15), "-".repeat(15))));
}
