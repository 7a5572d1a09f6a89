//! Single-block AES round transform.
//!
//! State layout follows FIPS-197: byte `i` of the block is row `i % 4`,
//! column `i / 4`. Both directions are pure functions of the block and a
//! read-only schedule, so any number of threads can call them at once.

use crate::cipher::key_schedule::RoundKeySchedule;
use crate::cipher::tables::{INV_S_BOX, S_BOX};
use crate::constants::NUM_ROUNDS;
use crate::segmenting::Block;

/// Signature shared by both directions; executors take one of these.
pub type BlockTransform = fn(&Block, &RoundKeySchedule) -> Block;

/// Forward cipher: initial key mix, 9 full rounds, final round without MixColumns.
pub fn encrypt_block(block: &Block, schedule: &RoundKeySchedule) -> Block {
    let mut state = *block;

    add_round_key(&mut state, schedule.round_key(0));

    for round in 1..NUM_ROUNDS {
        sub_bytes(&mut state);
        shift_rows(&mut state);
        mix_columns(&mut state);
        add_round_key(&mut state, schedule.round_key(round));
    }

    sub_bytes(&mut state);
    shift_rows(&mut state);
    add_round_key(&mut state, schedule.round_key(NUM_ROUNDS));

    state
}

/// Inverse cipher, round keys in reverse order.
pub fn decrypt_block(block: &Block, schedule: &RoundKeySchedule) -> Block {
    let mut state = *block;

    add_round_key(&mut state, schedule.round_key(NUM_ROUNDS));

    for round in (1..NUM_ROUNDS).rev() {
        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, schedule.round_key(round));
        inv_mix_columns(&mut state);
    }

    inv_shift_rows(&mut state);
    inv_sub_bytes(&mut state);
    add_round_key(&mut state, schedule.round_key(0));

    state
}

#[inline(always)]
fn add_round_key(state: &mut Block, round_key: &Block) {
    for (s, k) in state.iter_mut().zip(round_key) {
        *s ^= k;
    }
}

#[inline(always)]
fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = S_BOX[*byte as usize];
    }
}

#[inline(always)]
fn inv_sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = INV_S_BOX[*byte as usize];
    }
}

/// Row `r` rotates left by `r` columns.
#[inline(always)]
fn shift_rows(state: &mut Block) {
    let src = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * c] = src[r + 4 * ((c + r) % 4)];
        }
    }
}

#[inline(always)]
fn inv_shift_rows(state: &mut Block) {
    let src = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * ((c + r) % 4)] = src[r + 4 * c];
        }
    }
}

/// Multiply by x in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
#[inline(always)]
fn xtime(a: u8) -> u8 {
    (a << 1) ^ (((a >> 7) & 1) * 0x1b)
}

#[inline(always)]
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

#[inline(always)]
fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        column[0] = xtime(a0) ^ (xtime(a1) ^ a1) ^ a2 ^ a3;
        column[1] = a0 ^ xtime(a1) ^ (xtime(a2) ^ a2) ^ a3;
        column[2] = a0 ^ a1 ^ xtime(a2) ^ (xtime(a3) ^ a3);
        column[3] = (xtime(a0) ^ a0) ^ a1 ^ a2 ^ xtime(a3);
    }
}

#[inline(always)]
fn inv_mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [column[0], column[1], column[2], column[3]];
        column[0] = gmul(a0, 0x0e) ^ gmul(a1, 0x0b) ^ gmul(a2, 0x0d) ^ gmul(a3, 0x09);
        column[1] = gmul(a0, 0x09) ^ gmul(a1, 0x0e) ^ gmul(a2, 0x0b) ^ gmul(a3, 0x0d);
        column[2] = gmul(a0, 0x0d) ^ gmul(a1, 0x09) ^ gmul(a2, 0x0e) ^ gmul(a3, 0x0b);
        column[3] = gmul(a0, 0x0b) ^ gmul(a1, 0x0d) ^ gmul(a2, 0x09) ^ gmul(a3, 0x0e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_rows_round_trips() {
        let mut state: Block = core::array::from_fn(|i| i as u8);
        let original = state;
        shift_rows(&mut state);
        // FIPS-197 figure 8: row 1 of column 0 comes from column 1.
        assert_eq!(state[1], original[5]);
        assert_eq!(state[2], original[10]);
        assert_eq!(state[3], original[15]);
        inv_shift_rows(&mut state);
        assert_eq!(state, original);
    }

    #[test]
    fn mix_columns_known_column() {
        // FIPS-197 / common test column db 13 53 45 -> 8e 4d a1 bc
        let mut state: Block = [0; 16];
        state[..4].copy_from_slice(&[0xdb, 0x13, 0x53, 0x45]);
        mix_columns(&mut state);
        assert_eq!(&state[..4], &[0x8e, 0x4d, 0xa1, 0xbc]);
        inv_mix_columns(&mut state);
        assert_eq!(&state[..4], &[0xdb, 0x13, 0x53, 0x45]);
    }

    #[test]
    fn gmul_matches_fips_example() {
        // FIPS-197 §4.2: {57} • {13} = {fe}
        assert_eq!(gmul(0x57, 0x13), 0xfe);
    }
}
