use rand::Rng;
use std::time::Duration;

/// Pause between consecutive work items: a fixed delay plus uniform jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub delay: Duration,
    pub jitter: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}
