//! Block segmentation.
//!
//! Responsibilities:
//! - Pad a byte stream to the block size and split it into blocks
//! - Strip and validate padding after decryption
//! - Own the index-addressed output arena
//!
//! Non-responsibilities:
//! - Cryptography
//! - Parallelism

pub mod types;
pub mod pad;

pub use types::{
    Block,
    BlockSequence,
    OutputBuffer,
};
pub use pad::{
    pad,
    pad_with,
    unpad,
    split,
    segment,
};
