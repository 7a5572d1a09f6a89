use tracing::debug;

use crate::cipher::{BlockTransform, RoundKeySchedule};
use crate::executor::types::{Backend, Direction, Executor};
use crate::segmenting::{BlockSequence, OutputBuffer};
use crate::telemetry::StageTimes;
use crate::types::CipherError;

/// Single-threaded, in-order reference executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Transform every block in order into a fresh output buffer.
    pub fn apply(
        &self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        transform: BlockTransform,
    ) -> OutputBuffer {
        let mut out = OutputBuffer::zeroed(blocks.len());
        for (block, (_, slot)) in blocks.iter().zip(out.slots_mut()) {
            *slot = transform(block, schedule);
        }
        out
    }
}

impl Executor for SequentialExecutor {
    fn run(
        &mut self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        direction: Direction,
        times: &mut StageTimes,
    ) -> Result<OutputBuffer, CipherError> {
        debug!(blocks = blocks.len(), %direction, "sequential run");
        Ok(times.measure(direction.stage(), || {
            self.apply(blocks, schedule, direction.transform())
        }))
    }

    fn backend(&self) -> Backend {
        Backend::Sequential
    }
}
