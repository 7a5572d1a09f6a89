use std::fmt;

use crate::cipher::tables::{RCON, S_BOX};
use crate::constants::{BLOCK_SIZE, KEY_LEN_16, ROUND_KEY_COUNT};
use crate::segmenting::Block;
use crate::types::CipherError;

/// 128-bit cipher key. Read-only for the lifetime of a session.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN_16]);

impl Key {
    pub fn new(bytes: [u8; KEY_LEN_16]) -> Self {
        Self(bytes)
    }

    /// Validate length and copy key material.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CipherError> {
        let arr: [u8; KEY_LEN_16] =
            bytes
                .try_into()
                .map_err(|_| CipherError::InvalidKeyLength {
                    expected: KEY_LEN_16,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN_16] {
        &self.0
    }
}

// Never print key material.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&"<redacted>").finish()
    }
}

/// Round keys 0..=10. Round 0 is the key itself.
///
/// Built once per key and never mutated, so it can be shared by reference
/// across every worker and staged verbatim to the device.
#[derive(Clone, PartialEq, Eq)]
pub struct RoundKeySchedule {
    round_keys: [Block; ROUND_KEY_COUNT],
}

impl RoundKeySchedule {
    pub fn round_key(&self, round: usize) -> &Block {
        &self.round_keys[round]
    }

    pub fn len(&self) -> usize {
        ROUND_KEY_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// All round keys back to back (176 bytes), round 0 first.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.round_keys)
    }
}

impl fmt::Debug for RoundKeySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundKeySchedule")
            .field("rounds", &ROUND_KEY_COUNT)
            .finish_non_exhaustive()
    }
}

/// Expand raw key bytes. Fails only on a key that is not 16 bytes long.
pub fn expand(key: &[u8]) -> Result<RoundKeySchedule, CipherError> {
    let key = Key::from_slice(key)?;
    Ok(expand_key(&key))
}

/// Expand a validated key into 11 round keys (FIPS-197 §5.2).
pub fn expand_key(key: &Key) -> RoundKeySchedule {
    const WORDS: usize = ROUND_KEY_COUNT * 4;
    const KEY_WORDS: usize = KEY_LEN_16 / 4;

    let mut words = [[0u8; 4]; WORDS];
    for (i, word) in words.iter_mut().take(KEY_WORDS).enumerate() {
        word.copy_from_slice(&key.as_bytes()[i * 4..i * 4 + 4]);
    }

    for i in KEY_WORDS..WORDS {
        let mut temp = words[i - 1];

        if i % KEY_WORDS == 0 {
            // RotWord, SubWord, Rcon
            temp.rotate_left(1);
            for byte in &mut temp {
                *byte = S_BOX[*byte as usize];
            }
            temp[0] ^= RCON[i / KEY_WORDS - 1];
        }

        for j in 0..4 {
            words[i][j] = words[i - KEY_WORDS][j] ^ temp[j];
        }
    }

    let mut round_keys = [[0u8; BLOCK_SIZE]; ROUND_KEY_COUNT];
    for (round, round_key) in round_keys.iter_mut().enumerate() {
        for w in 0..4 {
            round_key[w * 4..w * 4 + 4].copy_from_slice(&words[round * 4 + w]);
        }
    }

    RoundKeySchedule { round_keys }
}
