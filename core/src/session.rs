//! session.rs
//! Orchestrates one input buffer and one key across any backend.
//!
//! Construction pads, splits and expands the key up front. Each `run` picks an
//! executor, transforms the blocks, and (for decryption) strips padding. The
//! session itself never changes after construction except for the telemetry of
//! the latest successful run, so a failed run can simply be retried.

use std::time::Instant;

use tracing::{debug, info};

use crate::cipher::{expand_key, Key, RoundKeySchedule};
use crate::executor::{make_executor, Backend, Direction, Executor};
use crate::segmenting::{segment, split, unpad, BlockSequence};
use crate::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::CipherError;

pub use wgpu::PowerPreference;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// CPU pool size. `None` means one worker per processor.
    pub worker_count: Option<usize>,

    /// Adapter preference for the accelerator backend.
    pub power_preference: PowerPreference,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            power_preference: PowerPreference::HighPerformance,
        }
    }
}

impl SessionConfig {
    pub fn new(worker_count: Option<usize>, power_preference: PowerPreference) -> Self {
        Self {
            worker_count,
            power_preference,
        }
    }

    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count: Some(worker_count),
            ..Self::default()
        }
    }
}

pub struct CipherSession {
    input: Vec<u8>,
    padded: BlockSequence,
    schedule: RoundKeySchedule,
    config: SessionConfig,
    setup_times: StageTimes,
    last_run: Option<TelemetrySnapshot>,
}

impl CipherSession {
    pub fn new(input: Vec<u8>, key: &Key) -> Self {
        let mut setup_times = StageTimes::default();
        let padded = setup_times.measure(Stage::Segment, || segment(&input));
        let schedule = setup_times.measure(Stage::KeySchedule, || expand_key(key));

        debug!(bytes = input.len(), blocks = padded.len(), "session ready");

        Self {
            input,
            padded,
            schedule,
            config: SessionConfig::default(),
            setup_times,
            last_run: None,
        }
    }

    /// Like `new`, validating raw key bytes first.
    pub fn from_key_bytes(input: Vec<u8>, key: &[u8]) -> Result<Self, CipherError> {
        let key = Key::from_slice(key)?;
        Ok(Self::new(input, &key))
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// Blocks of the padded input, as encryption consumes them.
    pub fn padded_blocks(&self) -> &BlockSequence {
        &self.padded
    }

    pub fn schedule(&self) -> &RoundKeySchedule {
        &self.schedule
    }

    /// Segment and key-schedule time spent during construction.
    pub fn setup_times(&self) -> &StageTimes {
        &self.setup_times
    }

    /// Snapshot of the most recent successful run.
    pub fn telemetry(&self) -> Option<&TelemetrySnapshot> {
        self.last_run.as_ref()
    }

    pub fn encrypt(&mut self, backend: Backend) -> Result<Vec<u8>, CipherError> {
        self.run(Direction::Encrypt, backend)
    }

    pub fn decrypt(&mut self, backend: Backend) -> Result<Vec<u8>, CipherError> {
        self.run(Direction::Decrypt, backend)
    }

    /// Build the executor for `backend` and run it.
    pub fn run(&mut self, direction: Direction, backend: Backend) -> Result<Vec<u8>, CipherError> {
        let mut executor = make_executor(backend, &self.config)?;
        self.run_with(executor.as_mut(), direction)
    }

    /// Run on a caller-supplied executor, e.g. one accelerator reused across sessions.
    ///
    /// Encrypt returns the padded ciphertext. Decrypt treats the input as
    /// ciphertext, which must be block-aligned, and strips padding afterwards.
    pub fn run_with(
        &mut self,
        executor: &mut dyn Executor,
        direction: Direction,
    ) -> Result<Vec<u8>, CipherError> {
        let mut timer = TelemetryTimer::new();

        let mut block_count = self.padded.len();
        let (output, counters) = match direction {
            Direction::Encrypt => {
                let out = executor.run(&self.padded, &self.schedule, direction, &mut timer.stage_times)?;
                let counters = TelemetryCounters::for_encrypt(self.input.len(), self.padded.len(), out.len());
                (out.into_bytes(), counters)
            }
            Direction::Decrypt => {
                let start = Instant::now();
                let blocks = split(&self.input)?;
                timer.add_stage_time(Stage::Segment, start.elapsed());
                block_count = blocks.len();

                let out = executor.run(&blocks, &self.schedule, direction, &mut timer.stage_times)?;

                let start = Instant::now();
                let plain = unpad(out.as_bytes())?.to_vec();
                timer.add_stage_time(Stage::Unpad, start.elapsed());

                let counters = TelemetryCounters::for_decrypt(self.input.len(), blocks.len(), plain.len());
                (plain, counters)
            }
        };

        timer.finish();
        let snapshot = TelemetrySnapshot::new(
            executor.backend(),
            direction,
            executor.workers(block_count),
            counters,
            &timer,
        );

        info!(
            backend = %snapshot.backend,
            %direction,
            blocks = snapshot.counters.blocks,
            bytes_out = snapshot.counters.bytes_out,
            elapsed_ms = snapshot.elapsed.as_secs_f64() * 1_000.0,
            "run complete"
        );

        self.last_run = Some(snapshot);
        Ok(output)
    }
}
