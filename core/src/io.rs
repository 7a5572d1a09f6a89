//! io.rs
//! File conventions around a session: inputs, key files, result files.
//!
//! Ciphertext, plaintext and keys are raw bytes with no header. Results are
//! written next to the input as `<stem>_<suffix>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::cipher::Key;
use crate::constants::{extensions, KEY_LEN_16};
use crate::executor::{Backend, Direction};
use crate::types::CipherError;

pub fn read_input(path: &Path) -> Result<Vec<u8>, CipherError> {
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "input read");
    Ok(bytes)
}

/// Sibling of `original` named `<stem>_<suffix>.<ext>`.
pub fn result_path(original: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    original.with_file_name(format!("{stem}_{suffix}.{ext}"))
}

/// Result file for a run: `_SEQ.aes` style for encryption, `_seq.dec` style
/// for decryption.
pub fn output_path(original: &Path, direction: Direction, backend: Backend) -> PathBuf {
    match direction {
        Direction::Encrypt => result_path(original, backend.tag(), extensions::CIPHERTEXT),
        Direction::Decrypt => result_path(
            original,
            &backend.tag().to_ascii_lowercase(),
            extensions::PLAINTEXT,
        ),
    }
}

/// Key file written alongside an encryption result.
pub fn key_path(original: &Path, backend: Backend) -> PathBuf {
    result_path(original, backend.tag(), extensions::KEY)
}

pub fn write_result(path: &Path, bytes: &[u8]) -> Result<(), CipherError> {
    fs::write(path, bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "result written");
    Ok(())
}

/// Read a raw 16-byte key file.
pub fn load_key(path: &Path) -> Result<Key, CipherError> {
    let bytes = fs::read(path)?;
    Key::from_slice(&bytes)
}

pub fn save_key(path: &Path, key: &Key) -> Result<(), CipherError> {
    fs::write(path, key.as_bytes())?;
    Ok(())
}

/// Fresh key from the operating system CSPRNG.
pub fn generate_key() -> Key {
    let mut bytes = [0u8; KEY_LEN_16];
    OsRng.fill_bytes(&mut bytes);
    Key::new(bytes)
}
