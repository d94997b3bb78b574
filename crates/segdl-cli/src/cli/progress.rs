//! Live segment progress on stdout.

use segdl_core::coordinator::ProgressSnapshot;
use std::io::Write;
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u64 = 500;
const BAR_WIDTH: usize = 30;

pub fn render(s: &ProgressSnapshot) -> String {
    let filled = ((s.fraction() * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!(
        "  [{}] [{}{}] {}/{} segments ({} failed) {:.1}%",
        s.item,
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        s.done(),
        s.total,
        s.failed,
        s.fraction() * 100.0
    )
}

/// Spawn the printer task. It ends once every sender is dropped.
pub fn spawn_printer() -> (
    tokio::sync::mpsc::Sender<ProgressSnapshot>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ProgressSnapshot>(64);
    let handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        let mut printed = false;
        while let Some(snap) = rx.recv().await {
            let now = Instant::now();
            let due = last_print
                .map(|t| now.duration_since(t).as_millis() as u64 >= PROGRESS_INTERVAL_MS)
                .unwrap_or(true);
            let finished = snap.done() >= snap.total;
            if due || finished {
                print!("\r{}", render(&snap));
                if finished {
                    println!();
                }
                let _ = std::io::stdout().flush();
                last_print = Some(now);
                printed = !finished;
            }
        }
        if printed {
            println!();
        }
    });
    (tx, handle)
}
