use serde::{Deserialize, Serialize};

use super::error::EditError;
use super::position;
use super::step::Mapping;
use crate::models::FormattedText;

/// A selection within the document: an anchor (where selection started) and
/// a head (where it ends). Equal endpoints form a cursor.
///
/// Coordinates are block index plus character offset within the block's
/// content, with line breaks counting one character, matching the
/// addressing scheme the host's selection bridge uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor_block: usize,
    pub anchor_offset: usize,
    pub head_block: usize,
    pub head_offset: usize,
}

impl Selection {
    /// A cursor (insertion point).
    pub fn cursor(block: usize, offset: usize) -> Self {
        Self {
            anchor_block: block,
            anchor_offset: offset,
            head_block: block,
            head_offset: offset,
        }
    }

    pub fn range(
        anchor_block: usize,
        anchor_offset: usize,
        head_block: usize,
        head_offset: usize,
    ) -> Self {
        Self {
            anchor_block,
            anchor_offset,
            head_block,
            head_offset,
        }
    }

    pub fn is_cursor(&self) -> bool {
        self.anchor_block == self.head_block && self.anchor_offset == self.head_offset
    }

    /// Block index of the document-order start of the selection.
    pub fn from_block(&self) -> usize {
        self.anchor_block.min(self.head_block)
    }

    /// Character offset of the document-order start of the selection.
    pub fn from_offset(&self) -> usize {
        if self.anchor_block < self.head_block {
            self.anchor_offset
        } else if self.anchor_block > self.head_block {
            self.head_offset
        } else {
            self.anchor_offset.min(self.head_offset)
        }
    }

    /// Block index of the document-order end of the selection.
    pub fn to_block(&self) -> usize {
        self.anchor_block.max(self.head_block)
    }

    /// Character offset of the document-order end of the selection.
    pub fn to_offset(&self) -> usize {
        if self.anchor_block > self.head_block {
            self.anchor_offset
        } else if self.anchor_block < self.head_block {
            self.head_offset
        } else {
            self.anchor_offset.max(self.head_offset)
        }
    }

    /// Checks the selection against document bounds. Host-reported
    /// selections go through this before being accepted.
    pub fn validate(&self, doc: &FormattedText) -> Result<(), EditError> {
        let ok = |block: usize, offset: usize| {
            doc.block(block)
                .map(|b| offset <= b.content_len())
                .unwrap_or(false)
        };
        if ok(self.anchor_block, self.anchor_offset) && ok(self.head_block, self.head_offset) {
            Ok(())
        } else {
            Err(EditError::InvalidSelection {
                anchor_block: self.anchor_block,
                anchor_offset: self.anchor_offset,
                head_block: self.head_block,
                head_offset: self.head_offset,
            })
        }
    }

    pub fn anchor_flat(&self, doc: &FormattedText) -> usize {
        position::to_flat(doc, self.anchor_block, self.anchor_offset)
    }

    pub fn head_flat(&self, doc: &FormattedText) -> usize {
        position::to_flat(doc, self.head_block, self.head_offset)
    }

    /// Builds a selection from flat positions, resolving against `doc`.
    pub fn from_flat(doc: &FormattedText, anchor: usize, head: usize) -> Self {
        let a = position::resolve(doc, anchor);
        let h = position::resolve(doc, head);
        Self {
            anchor_block: a.block_index,
            anchor_offset: a.block_offset.unwrap_or(0),
            head_block: h.block_index,
            head_offset: h.block_offset.unwrap_or(0),
        }
    }

    /// Maps the selection through a transaction's position mapping: flat
    /// positions are computed against the pre-apply document, pushed through
    /// the mapping, then resolved against the post-apply document.
    pub fn map(&self, mapping: &Mapping, old_doc: &FormattedText, new_doc: &FormattedText) -> Self {
        let anchor = mapping.map(self.anchor_flat(old_doc), 1);
        let head = mapping.map(self.head_flat(old_doc), 1);
        Self::from_flat(new_doc, anchor, head)
    }
}
