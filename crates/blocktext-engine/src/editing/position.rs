//! Flat document position arithmetic.
//!
//! Positions follow ProseMirror conventions: each block contributes an
//! opening and a closing boundary token (one position each), characters
//! consume one position each and line breaks within a block consume one
//! position. Atomic blocks contribute boundary tokens only.
//!
//! For a document `[PARA "Hello\nWorld", H1 "Title"]`:
//!
//! ```text
//! [open] H e l l o \n W o r l d [close] [open] T i t l e [close]
//!   0    1 2 3 4 5  6  7 8 9 10 11  12     13  14 15 16 17 18  19
//! ```

use crate::models::{FormattedBlock, FormattedText};

/// Content size of a block excluding its boundary tokens. Zero for atomic
/// blocks (the cursor cannot enter them).
pub fn content_size(block: &FormattedBlock) -> usize {
    block.content_len()
}

/// Total footprint of a block in position space.
pub fn node_size(block: &FormattedBlock) -> usize {
    2 + content_size(block)
}

/// The flat position of a block's opening boundary.
pub fn block_start(doc: &FormattedText, block_index: usize) -> usize {
    doc.blocks()
        .iter()
        .take(block_index)
        .map(node_size)
        .sum()
}

/// Total document length in position space.
pub fn doc_len(doc: &FormattedText) -> usize {
    doc.blocks().iter().map(node_size).sum()
}

/// Converts block-relative coordinates (block index plus character offset
/// across the block's lines) to a flat position.
pub fn to_flat(doc: &FormattedText, block_index: usize, offset: usize) -> usize {
    block_start(doc, block_index) + 1 + offset
}

/// A flat position resolved back to structural coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPosition {
    pub position: usize,
    pub block_index: usize,
    /// Content offset within the block; `None` at the opening boundary.
    pub block_offset: Option<usize>,
}

/// Resolves a flat position to block coordinates, clamping positions at or
/// beyond the document end to the last block's closing boundary.
pub fn resolve(doc: &FormattedText, position: usize) -> ResolvedPosition {
    let mut pos = 0;
    for (bi, block) in doc.blocks().iter().enumerate() {
        let ns = node_size(block);
        if position == pos {
            return ResolvedPosition {
                position,
                block_index: bi,
                block_offset: None,
            };
        }
        if position < pos + ns {
            return ResolvedPosition {
                position,
                block_index: bi,
                // Both interior positions and the closing boundary resolve
                // to a content offset (the close clamps to content size).
                block_offset: Some((position - pos - 1).min(content_size(block))),
            };
        }
        pos += ns;
    }
    let last = doc.block_count() - 1;
    ResolvedPosition {
        position,
        block_index: last,
        block_offset: Some(content_size(&doc.blocks()[last])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockType, FormattedBlock, FormattedText};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sample() -> FormattedText {
        FormattedText::of(vec![
            FormattedBlock::of(BlockType::Para, "Hello\nWorld"),
            FormattedBlock::of(BlockType::H1, "Title"),
        ])
    }

    #[test]
    fn node_size_is_content_plus_boundaries() {
        let doc = sample();
        assert_eq!(node_size(&doc.blocks()[0]), 13); // 11 chars + 2 tokens
        assert_eq!(node_size(&doc.blocks()[1]), 7);
        assert_eq!(doc_len(&doc), 20);
    }

    #[test]
    fn atomic_block_occupies_boundaries_only() {
        let eqn = FormattedBlock::of(BlockType::Eqn, "E = mc^2");
        assert_eq!(content_size(&eqn), 0);
        assert_eq!(node_size(&eqn), 2);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 13)]
    fn block_start_accumulates_node_sizes(#[case] index: usize, #[case] expect: usize) {
        assert_eq!(block_start(&sample(), index), expect);
    }

    #[test]
    fn to_flat_skips_opening_boundary() {
        let doc = sample();
        assert_eq!(to_flat(&doc, 0, 0), 1);
        assert_eq!(to_flat(&doc, 0, 6), 7); // after the line break
        assert_eq!(to_flat(&doc, 1, 0), 14);
    }

    #[rstest]
    #[case(0, 0, None)] // open boundary of block 0
    #[case(1, 0, Some(0))]
    #[case(7, 0, Some(6))]
    #[case(12, 0, Some(11))] // close boundary clamps to content size
    #[case(13, 1, None)]
    #[case(16, 1, Some(2))]
    #[case(19, 1, Some(5))]
    fn resolve_round_trips(
        #[case] position: usize,
        #[case] block: usize,
        #[case] offset: Option<usize>,
    ) {
        let r = resolve(&sample(), position);
        assert_eq!(r.block_index, block, "position {position}");
        assert_eq!(r.block_offset, offset, "position {position}");
    }

    #[test]
    fn resolve_clamps_past_document_end() {
        let r = resolve(&sample(), 99);
        assert_eq!(r.block_index, 1);
        assert_eq!(r.block_offset, Some(5));
    }
}
