use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::block::{BlockType, FormattedBlock};

/// A formatted document: an ordered sequence of blocks.
///
/// A document always contains at least one block. Equality for
/// dirty-checking goes through [`content_hash`](Self::content_hash) so a
/// surrounding form control can compare cheaply against a baseline taken at
/// load time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattedText {
    blocks: Vec<FormattedBlock>,
}

impl Default for FormattedText {
    fn default() -> Self {
        Self::new()
    }
}

impl FormattedText {
    /// An empty document: a single empty paragraph.
    pub fn new() -> Self {
        Self {
            blocks: vec![FormattedBlock::new(BlockType::Para)],
        }
    }

    /// A document from pre-built blocks; an empty list collapses to the
    /// empty document.
    pub fn of(blocks: Vec<FormattedBlock>) -> Self {
        if blocks.is_empty() {
            return Self::new();
        }
        Self { blocks }
    }

    /// A single-paragraph document from plain text (`\n` becomes line
    /// breaks within the paragraph).
    pub fn plain(text: &str) -> Self {
        Self {
            blocks: vec![FormattedBlock::of(BlockType::Para, text)],
        }
    }

    pub fn blocks(&self) -> &[FormattedBlock] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> Option<&FormattedBlock> {
        self.blocks.get(index)
    }

    pub fn block_mut(&mut self, index: usize) -> Option<&mut FormattedBlock> {
        self.blocks.get_mut(index)
    }

    pub fn insert_block(&mut self, index: usize, block: FormattedBlock) {
        self.blocks.insert(index, block);
    }

    /// Removes and returns a block. Removing the last remaining block
    /// leaves an empty paragraph behind to keep the document non-empty.
    pub fn remove_block(&mut self, index: usize) -> FormattedBlock {
        let block = self.blocks.remove(index);
        if self.blocks.is_empty() {
            self.blocks.push(FormattedBlock::new(BlockType::Para));
        }
        block
    }

    pub fn replace_block(&mut self, index: usize, block: FormattedBlock) -> FormattedBlock {
        std::mem::replace(&mut self.blocks[index], block)
    }

    /// Deterministic content hash for dirty-checking.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
