//! `segdl detect` – probe a URL pattern for available episodes.

use anyhow::Result;
use segdl_core::batch::detect_episodes;
use segdl_core::config::SegdlConfig;

use super::shared::{episode_pattern, transport};

pub async fn run_detect(
    cfg: &SegdlConfig,
    pattern: Option<String>,
    example: Option<String>,
    start: u32,
    max: u32,
) -> Result<()> {
    let pattern = episode_pattern(pattern, example)?;
    println!("Probing {} from episode {}", pattern.template(), start);
    let transport = transport(cfg);
    let p = pattern.clone();
    let found = tokio::task::spawn_blocking(move || detect_episodes(&transport, &p, start, max)).await?;

    if found.is_empty() {
        println!("No episodes found.");
        return Ok(());
    }
    for n in &found {
        println!("{:>4}  {}", n, pattern.url_for(*n));
    }
    println!("Found {} episode(s).", found.len());
    Ok(())
}
