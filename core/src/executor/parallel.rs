use crossbeam::channel::bounded;
use tracing::{debug, error};

use crate::cipher::{BlockTransform, RoundKeySchedule};
use crate::constants::MAX_WORKERS;
use crate::parallelism::default_workers;
use crate::executor::types::{Backend, Direction, Executor};
use crate::segmenting::{Block, BlockSequence, OutputBuffer};
use crate::telemetry::StageTimes;
use crate::types::CipherError;

/// Jobs queued per worker before the producer blocks.
const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Bounded pool of scoped OS threads, one job per block index.
///
/// Each job carries the only mutable reference to its output slot, so workers
/// write without locks. The scope end is the join barrier.
#[derive(Debug, Clone, Copy)]
pub struct ParallelCpuExecutor {
    worker_count: usize,
}

impl ParallelCpuExecutor {
    pub fn new(worker_count: usize) -> Result<Self, CipherError> {
        if worker_count == 0 || worker_count > MAX_WORKERS {
            return Err(CipherError::InvalidWorkerCount {
                requested: worker_count,
                max: MAX_WORKERS,
            });
        }
        Ok(Self { worker_count })
    }

    /// One worker per available processor.
    pub fn with_default_workers() -> Self {
        Self {
            worker_count: default_workers(),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn apply(
        &self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        transform: BlockTransform,
    ) -> Result<OutputBuffer, CipherError> {
        let mut out = OutputBuffer::zeroed(blocks.len());
        if blocks.is_empty() {
            return Ok(out);
        }

        let workers = self.workers(blocks.len());
        debug!(workers, blocks = blocks.len(), "dispatching cpu workers");

        let joined = crossbeam::thread::scope(|scope| {
            let (tx, rx) = bounded::<(usize, &mut Block)>(workers * QUEUE_DEPTH_PER_WORKER);

            for _ in 0..workers {
                let rx = rx.clone();
                scope.spawn(move |_| {
                    for (index, slot) in rx.iter() {
                        *slot = transform(&blocks[index], schedule);
                    }
                });
            }
            drop(rx);

            for job in out.slots_mut() {
                // Every receiver is gone only if every worker died.
                if tx.send(job).is_err() {
                    break;
                }
            }
        });

        joined.map_err(|_| {
            error!("cpu worker panicked");
            CipherError::WorkerPanicked
        })?;

        Ok(out)
    }
}

impl Default for ParallelCpuExecutor {
    fn default() -> Self {
        Self::with_default_workers()
    }
}

impl Executor for ParallelCpuExecutor {
    fn run(
        &mut self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        direction: Direction,
        times: &mut StageTimes,
    ) -> Result<OutputBuffer, CipherError> {
        times.measure(direction.stage(), || {
            self.apply(blocks, schedule, direction.transform())
        })
    }

    fn backend(&self) -> Backend {
        Backend::ParallelCpu
    }

    /// Never more threads than blocks.
    fn workers(&self, block_count: usize) -> usize {
        self.worker_count.min(block_count)
    }
}
