//! executor/mod.rs
//! Execution strategies that apply a block transform to a whole sequence.
//!
//! Responsibilities:
//! - Sequential, CPU-parallel and GPU execution behind one `Executor` trait
//! - Backend selection from a `Backend` tag (`make_executor`)
//!
//! Non-responsibilities:
//! - Padding (segmenting) and key expansion (cipher)

pub mod accelerator;
pub mod parallel;
pub mod sequential;
pub mod types;

pub use accelerator::{AcceleratorExecutor, AcceleratorState};
pub use parallel::ParallelCpuExecutor;
pub use sequential::SequentialExecutor;
pub use types::{Backend, Direction, Executor};

use crate::parallelism::ParallelismProfile;
use crate::session::SessionConfig;
use crate::types::CipherError;

/// Factory: build the executor for `backend`.
///
/// Accelerator construction acquires the device here, so a missing adapter
/// surfaces as `DeviceUnavailable` before any work is done.
pub fn make_executor(
    backend: Backend,
    config: &SessionConfig,
) -> Result<Box<dyn Executor>, CipherError> {
    match backend {
        Backend::Sequential => Ok(Box::new(SequentialExecutor::new())),
        Backend::ParallelCpu => {
            let workers = ParallelismProfile::resolve_workers(config.worker_count)?;
            Ok(Box::new(ParallelCpuExecutor::new(workers)?))
        }
        Backend::Accelerator => Ok(Box::new(AcceleratorExecutor::new(config.power_preference)?)),
    }
}
