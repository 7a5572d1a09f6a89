//! telemetry/mod.rs
//! Counters, stage timers, and immutable per-run snapshots.
//!
//! Every session run produces one `TelemetrySnapshot`. Snapshots are plain
//! data (serde) so front ends can print or persist them.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
