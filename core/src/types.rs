use std::io;
use thiserror::Error;

/// Unified engine error covering input validation, device failures and API misuse.
/// - Malformed-input variants are recoverable: the session stays usable.
/// - Device variants end the current run; callers may retry on another backend.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Key material is not exactly 16 bytes.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Trailing padding bytes are out of range or not uniform.
    #[error("invalid padding: {0}")]
    InvalidPadding(String),

    /// Ciphertext length is not a whole number of blocks.
    #[error("invalid ciphertext length: {len} is not a multiple of {block_size}")]
    InvalidCiphertextLength { len: usize, block_size: usize },

    /// Block size cannot be encoded in a single padding byte.
    #[error("invalid block size: {0}")]
    InvalidBlockSize(usize),

    /// CPU pool size out of range.
    #[error("invalid worker count: {requested}, must be in 1..={max}")]
    InvalidWorkerCount { requested: usize, max: usize },

    /// A CPU worker thread panicked before finishing its blocks.
    #[error("cpu worker panicked")]
    WorkerPanicked,

    /// No compatible compute adapter or driver.
    #[error("accelerator device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Device buffer could not be created (size limits, out of memory).
    #[error("accelerator allocation failure: {0}")]
    AllocationFailure(String),

    /// The device reported a fault while running or reading back the kernel.
    #[error("accelerator execution failure: {0}")]
    AcceleratorExecutionFailure(String),

    /// Operation called in the wrong lifecycle state.
    #[error("invalid state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    /// File collaborator I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CipherError {
    /// True for failures caused by the accelerator device rather than by the input.
    pub fn is_device_error(&self) -> bool {
        matches!(
            self,
            CipherError::DeviceUnavailable(_)
                | CipherError::AllocationFailure(_)
                | CipherError::AcceleratorExecutionFailure(_)
        )
    }

    /// True for malformed input (bad key, bad padding, misaligned ciphertext).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CipherError::InvalidKeyLength { .. }
                | CipherError::InvalidPadding(_)
                | CipherError::InvalidCiphertextLength { .. }
        )
    }
}

pub type Result<T, E = CipherError> = std::result::Result<T, E>;
