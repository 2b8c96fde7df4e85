//! Reading-speed heuristic for how long a line stays on screen.

use std::time::Duration;

use crate::config::PacingConfig;
use crate::utils::{PlayerError, PlayerResult};

/// Seconds a line of `chars` characters is shown before the story advances:
/// `base + base * chars / chars_per_base_wait`, clamped only when a maximum
/// is configured.
pub fn line_wait_secs(chars: usize, pacing: &PacingConfig) -> f64 {
    let base = pacing.base_wait_secs;
    let per_base = f64::from(pacing.chars_per_base_wait.max(1));
    let secs = base + base * chars as f64 / per_base;

    match pacing.max_line_wait_secs {
        Some(max) => secs.min(max),
        None => secs,
    }
}

pub fn line_wait(text: &str, pacing: &PacingConfig) -> PlayerResult<Duration> {
    seconds(line_wait_secs(text.chars().count(), pacing))
}

/// Converts configured seconds into a `Duration`, rejecting values no
/// `Duration` can hold.
pub fn seconds(secs: f64) -> PlayerResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| PlayerError::configuration(format!("Wait of {}s is out of range: {}", secs, e)))
}
