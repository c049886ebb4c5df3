use thiserror::Error;

/// Invariant violations raised by step and transaction application.
///
/// These indicate a caller bug (a step addressed against a document that
/// does not satisfy its precondition), never recoverable user input.
/// Policy-level "nothing to do" outcomes are values on
/// [`CommandOutcome`](crate::editing::commands::CommandOutcome), not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("block index {index} out of range (document has {count} blocks)")]
    BlockOutOfRange { index: usize, count: usize },

    #[error("offset {offset} out of range in block {block} (content length {len})")]
    OffsetOutOfRange {
        block: usize,
        offset: usize,
        len: usize,
    },

    #[error("cannot delete the only block in the document")]
    LastBlock,

    #[error("block {index} has no following block to join with")]
    NoJoinTarget { index: usize },

    #[error("block {index} is atomic and cannot be edited as text")]
    AtomicBlock { index: usize },

    #[error(
        "selection references out-of-range coordinates \
         (anchor {anchor_block}:{anchor_offset}, head {head_block}:{head_offset})"
    )]
    InvalidSelection {
        anchor_block: usize,
        anchor_offset: usize,
        head_block: usize,
        head_offset: usize,
    },
}
