//! parallelism.rs
//! Worker-count resolution and compute adapter detection.

use tracing::debug;

use crate::constants::MAX_WORKERS;
use crate::types::CipherError;

async fn detect_wgpu_count() -> usize {
    let instance = wgpu::Instance::default();
    let adapters = instance.enumerate_adapters(wgpu::Backends::all()).await;
    for adapter in &adapters {
        let info = adapter.get_info();
        debug!(name = %info.name, backend = ?info.backend, device_type = ?info.device_type, "compute adapter found");
    }
    adapters.len()
}

/// Number of compute adapters visible through wgpu (Vulkan, Metal, DX12, GL).
pub fn detect_gpu_count() -> usize {
    let count = pollster::block_on(detect_wgpu_count());
    if count == 0 {
        debug!("no compute adapters found");
    }
    count
}

/// Resources available to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub cpu_workers: usize,
    pub gpu_adapters: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            cpu_workers: 1,
            gpu_adapters: 0,
        }
    }

    /// Probe the host: one worker per processor, plus adapter count.
    pub fn detect() -> Self {
        let profile = Self {
            cpu_workers: default_workers(),
            gpu_adapters: detect_gpu_count(),
        };
        debug!(
            cpu_workers = profile.cpu_workers,
            gpu_adapters = profile.gpu_adapters,
            "parallelism profile"
        );
        profile
    }

    pub fn has_accelerator(&self) -> bool {
        self.gpu_adapters > 0
    }

    /// Validate an explicit worker count, or fall back to the processor count.
    pub fn resolve_workers(requested: Option<usize>) -> Result<usize, CipherError> {
        match requested {
            None => Ok(default_workers()),
            Some(n) if n == 0 || n > MAX_WORKERS => Err(CipherError::InvalidWorkerCount {
                requested: n,
                max: MAX_WORKERS,
            }),
            Some(n) => Ok(n),
        }
    }
}

/// One worker per available processor, capped at `MAX_WORKERS`.
pub fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_WORKERS)
}
