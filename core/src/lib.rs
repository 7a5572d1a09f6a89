//! aes128-core
//!
//! Pure Rust AES-128 block engine.
//! One cipher, three interchangeable executors (sequential, CPU pool, GPU),
//! byte-identical output from all of them.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;

// Cipher layers
pub mod segmenting;
pub mod cipher;
pub mod executor;

// Orchestration and surroundings
pub mod parallelism;
pub mod session;
pub mod telemetry;
pub mod io;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::cipher::{expand, Key, RoundKeySchedule};
    pub use crate::executor::{make_executor, Backend, Direction, Executor};
    pub use crate::session::{CipherSession, SessionConfig};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::{CipherError, Result};
}
