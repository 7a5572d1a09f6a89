//! telemetry/counters.rs
//! Byte and block counts collected during one session run.

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Blocks handed to the executor.
    pub blocks: u64,
    /// Bytes the caller supplied.
    pub bytes_in: u64,
    /// Bytes returned to the caller.
    pub bytes_out: u64,
    /// Padding bytes added (encrypt) or removed (decrypt).
    pub bytes_padding: u64,
}

impl TelemetryCounters {
    pub fn for_encrypt(input_len: usize, blocks: usize, output_len: usize) -> Self {
        Self {
            blocks: blocks as u64,
            bytes_in: input_len as u64,
            bytes_out: output_len as u64,
            bytes_padding: output_len.saturating_sub(input_len) as u64,
        }
    }

    pub fn for_decrypt(input_len: usize, blocks: usize, output_len: usize) -> Self {
        Self {
            blocks: blocks as u64,
            bytes_in: input_len as u64,
            bytes_out: output_len as u64,
            bytes_padding: input_len.saturating_sub(output_len) as u64,
        }
    }
}
