/// AES block size in bytes. Every block, round key and output slice has this length.
pub const BLOCK_SIZE: usize = 16;

/// AES-128 key length in bytes.
pub const KEY_LEN_16: usize = 16;

/// Number of full cipher rounds for a 128-bit key.
pub const NUM_ROUNDS: usize = 10;

/// Round keys produced by the schedule: round 0 (the key itself) plus one per round.
pub const ROUND_KEY_COUNT: usize = NUM_ROUNDS + 1;

/// Upper bound on the CPU pool size accepted from callers.
pub const MAX_WORKERS: usize = 1024;

/// Threads per workgroup in the compute kernel. Must match `@workgroup_size` in the WGSL source.
pub const KERNEL_WORKGROUP_SIZE: u32 = 64;

/// File extensions used by the result collaborator.
pub mod extensions {
    pub const CIPHERTEXT: &str = "aes";
    pub const PLAINTEXT: &str = "dec";
    pub const KEY: &str = "key";
}
