//! telemetry/snapshot.rs
//! Immutable record of one session run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::executor::{Backend, Direction};
use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub backend: Backend,
    pub direction: Direction,
    pub workers: usize,
    pub counters: TelemetryCounters,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn new(
        backend: Backend,
        direction: Direction,
        workers: usize,
        counters: TelemetryCounters,
        timer: &TelemetryTimer,
    ) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            backend,
            direction,
            workers,
            counters,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Time spent in the block transform itself, whichever direction ran.
    pub fn transform_time(&self) -> Duration {
        self.stage_times.get(Stage::Encrypt) + self.stage_times.get(Stage::Decrypt)
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        expected.iter().all(|s| self.stage_times.contains(*s))
    }

    /// Stages are timed back to back, so they never add up to more than the run.
    pub fn sanity_check(&self) -> bool {
        self.stage_times.total() <= self.elapsed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
