//! Latency timing.
//!
//! Observations go to `tracing` at debug level and never affect the
//! operation being measured.

use std::time::{Duration, Instant};

/// Start marker returned by [`start`].
#[derive(Debug, Clone, Copy)]
pub struct LatencyMark(Instant);

pub fn start() -> LatencyMark {
    LatencyMark(Instant::now())
}

/// Record the time elapsed since `mark` under `label`.
pub fn end(mark: LatencyMark, label: &str) -> Duration {
    let elapsed = mark.0.elapsed();
    tracing::debug!(
        label,
        elapsed_us = elapsed.as_micros() as u64,
        "{}: {}us",
        label,
        elapsed.as_micros()
    );
    elapsed
}
