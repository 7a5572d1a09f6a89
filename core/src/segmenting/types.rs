use std::ops::Index;

use crate::constants::BLOCK_SIZE;
use crate::types::CipherError;

/// One 16-byte unit of cipher input or output.
pub type Block = [u8; BLOCK_SIZE];

/// Ordered blocks of a padded (or already aligned) byte stream.
///
/// Order defines output offsets only; blocks are transformed independently.
/// The sequence is read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSequence {
    blocks: Vec<Block>,
}

impl BlockSequence {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Contiguous view of every block, in order. Used to stage device input.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// Size in bytes of the output this sequence produces.
    pub fn byte_len(&self) -> usize {
        self.blocks.len() * BLOCK_SIZE
    }
}

impl Index<usize> for BlockSequence {
    type Output = Block;

    fn index(&self, index: usize) -> &Block {
        &self.blocks[index]
    }
}

impl<'a> IntoIterator for &'a BlockSequence {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Pre-sized output arena of `block_count × 16` bytes.
///
/// Writers address it by block index only: `slots_mut` hands out one disjoint
/// `&mut Block` per index, so concurrent writers never share a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl OutputBuffer {
    /// Zero-filled buffer sized for `block_count` blocks.
    pub fn zeroed(block_count: usize) -> Self {
        Self {
            bytes: vec![0u8; block_count * BLOCK_SIZE],
        }
    }

    /// Wrap bytes read back from a device. Length must be a whole number of blocks.
    pub fn from_bytes(bytes: Vec<u8>, block_count: usize) -> Result<Self, CipherError> {
        if bytes.len() != block_count * BLOCK_SIZE {
            return Err(CipherError::AcceleratorExecutionFailure(format!(
                "output length mismatch: expected {}, got {}",
                block_count * BLOCK_SIZE,
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    pub fn block_count(&self) -> usize {
        self.bytes.len() / BLOCK_SIZE
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Output slice for block `index`.
    pub fn slot(&self, index: usize) -> &Block {
        &bytemuck::cast_slice::<u8, Block>(&self.bytes)[index]
    }

    /// Mutable output slice for block `index`.
    pub fn slot_mut(&mut self, index: usize) -> &mut Block {
        &mut bytemuck::cast_slice_mut::<u8, Block>(&mut self.bytes)[index]
    }

    /// Every output slice, paired with its block index. Slices are disjoint by construction.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = (usize, &mut Block)> {
        bytemuck::cast_slice_mut::<u8, Block>(&mut self.bytes)
            .iter_mut()
            .enumerate()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
