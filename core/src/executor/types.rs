use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cipher::{decrypt_block, encrypt_block, BlockTransform, RoundKeySchedule};
use crate::segmenting::{BlockSequence, OutputBuffer};
use crate::telemetry::{Stage, StageTimes};
use crate::types::CipherError;

/// Which way the round sequence runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Host-side transform for this direction.
    pub fn transform(self) -> BlockTransform {
        match self {
            Direction::Encrypt => encrypt_block,
            Direction::Decrypt => decrypt_block,
        }
    }

    /// Telemetry stage the transform is charged to.
    pub fn stage(self) -> Stage {
        match self {
            Direction::Encrypt => Stage::Encrypt,
            Direction::Decrypt => Stage::Decrypt,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encrypt"),
            Direction::Decrypt => f.write_str("decrypt"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "encrypt" => Ok(Direction::Encrypt),
            "decrypt" => Ok(Direction::Decrypt),
            other => Err(format!("unknown operation '{other}', expected encrypt or decrypt")),
        }
    }
}

/// Execution strategy. All three produce byte-identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    Sequential,
    ParallelCpu,
    Accelerator,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Sequential, Backend::ParallelCpu, Backend::Accelerator];

    /// Short mode tag used on the command line and in result file names.
    pub fn tag(self) -> &'static str {
        match self {
            Backend::Sequential  => "SEQ",
            Backend::ParallelCpu => "CPU",
            Backend::Accelerator => "GPU",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SEQ" => Ok(Backend::Sequential),
            "CPU" => Ok(Backend::ParallelCpu),
            "GPU" => Ok(Backend::Accelerator),
            other => Err(format!("unknown mode '{other}', expected SEQ, CPU or GPU")),
        }
    }
}

/// One execution strategy over a whole block sequence.
///
/// Implementations must write block `i` of the result only from block `i` of
/// the input, and must leave `blocks` and `schedule` untouched.
pub trait Executor: Send {
    fn run(
        &mut self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        direction: Direction,
        times: &mut StageTimes,
    ) -> Result<OutputBuffer, CipherError>;

    fn backend(&self) -> Backend;

    /// Threads (or device queues) a run over `block_count` blocks uses.
    fn workers(&self, _block_count: usize) -> usize {
        1
    }
}
