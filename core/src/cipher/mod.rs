//! AES-128 primitives: key schedule and single-block round transform.

pub mod tables;
pub mod key_schedule;
pub mod block;

pub use key_schedule::{
    expand,
    expand_key,
    Key,
    RoundKeySchedule,
};
pub use block::{
    decrypt_block,
    encrypt_block,
    BlockTransform,
};
