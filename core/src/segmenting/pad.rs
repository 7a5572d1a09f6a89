use tracing::trace;

use crate::constants::BLOCK_SIZE;
use crate::segmenting::types::{Block, BlockSequence};
use crate::types::CipherError;

/// Pad `data` to a multiple of `block_size`.
///
/// Appends `r = block_size - len % block_size` bytes of value `r`. Aligned input
/// gets a full extra block so `unpad` can always read the pad length back.
pub fn pad_with(data: &[u8], block_size: usize) -> Result<Vec<u8>, CipherError> {
    if block_size == 0 || block_size > u8::MAX as usize {
        return Err(CipherError::InvalidBlockSize(block_size));
    }
    Ok(pad_to(data, block_size))
}

/// Pad to the AES block size.
pub fn pad(data: &[u8]) -> Vec<u8> {
    pad_to(data, BLOCK_SIZE)
}

fn pad_to(data: &[u8], block_size: usize) -> Vec<u8> {
    let pad_len = block_size - (data.len() % block_size);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);

    trace!(input = data.len(), pad_len, "padded input");
    padded
}

/// Strip and validate padding. Empty input is returned unchanged.
pub fn unpad(data: &[u8]) -> Result<&[u8], CipherError> {
    let Some(&last) = data.last() else {
        return Ok(data);
    };

    let pad_len = last as usize;
    validate_padding(data, pad_len)?;

    Ok(&data[..data.len() - pad_len])
}

fn validate_padding(data: &[u8], pad_len: usize) -> Result<(), CipherError> {
    if pad_len == 0 {
        return Err(CipherError::InvalidPadding("pad length is zero".into()));
    }
    if pad_len > data.len() {
        return Err(CipherError::InvalidPadding(format!(
            "pad length {} exceeds buffer length {}",
            pad_len,
            data.len()
        )));
    }

    let tail = &data[data.len() - pad_len..];
    if tail.iter().any(|&b| b as usize != pad_len) {
        return Err(CipherError::InvalidPadding(format!(
            "trailing {} bytes are not uniform",
            pad_len
        )));
    }
    Ok(())
}

/// Split block-aligned `data` into consecutive blocks.
pub fn split(data: &[u8]) -> Result<BlockSequence, CipherError> {
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::InvalidCiphertextLength {
            len: data.len(),
            block_size: BLOCK_SIZE,
        });
    }
    Ok(to_blocks(data))
}

/// Pad then split. Never fails: padded data is always aligned.
pub fn segment(data: &[u8]) -> BlockSequence {
    to_blocks(&pad(data))
}

fn to_blocks(aligned: &[u8]) -> BlockSequence {
    let blocks = aligned
        .chunks_exact(BLOCK_SIZE)
        .map(|chunk| {
            let mut block: Block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(chunk);
            block
        })
        .collect();
    BlockSequence::new(blocks)
}
