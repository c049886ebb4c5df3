use std::collections::BTreeMap;

use super::error::EditError;
use super::position::{block_start, node_size, to_flat};
use crate::models::{BlockType, FormatType, FormattedBlock, FormattedText, META_LINK};

/// A single position rewrite: `old_size` positions starting at `start` were
/// replaced by `new_size` positions.
///
/// Positions strictly before the range are unchanged; positions strictly
/// after shift by the size delta; positions inside resolve to the range
/// start (`bias < 0`) or the end of the replacement (`bias >= 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    start: usize,
    old_size: usize,
    new_size: usize,
}

impl StepMap {
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        Self {
            start,
            old_size,
            new_size,
        }
    }

    pub fn map(&self, pos: usize, bias: i32) -> usize {
        if pos < self.start {
            pos
        } else if pos > self.start + self.old_size {
            pos - self.old_size + self.new_size
        } else if bias < 0 {
            self.start
        } else {
            self.start + self.new_size
        }
    }
}

/// The composed position rewrites of a transaction, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub(crate) fn extend(&mut self, maps: impl IntoIterator<Item = StepMap>) {
        self.maps.extend(maps);
    }

    /// Maps a flat position through every step map in order.
    pub fn map(&self, pos: usize, bias: i32) -> usize {
        self.maps.iter().fold(pos, |p, m| m.map(p, bias))
    }
}

/// An atomic, invertible document edit.
///
/// Block indices and offsets address the document a step is applied to;
/// within a transaction each step therefore addresses the document as left
/// by the steps before it. Applying a step yields the steps that undo it
/// plus the [`StepMap`]s describing how positions moved.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Insert a block so that it occupies `index`.
    InsertBlock { index: usize, block: FormattedBlock },
    /// Remove the block at `index`.
    DeleteBlock { index: usize },
    /// Replace the block at `index` wholesale.
    ReplaceBlock { index: usize, block: FormattedBlock },
    /// Convert the block at `index` to another type (see
    /// [`FormattedBlock::transform`] for the conversion rules).
    SetBlockType { index: usize, block_type: BlockType },
    /// Set the indent of the block at `index`.
    SetBlockIndent { index: usize, indent: u8 },
    /// Set (`Some`) or remove (`None`) one metadata entry on a block.
    SetBlockMeta {
        index: usize,
        key: String,
        value: Option<String>,
    },
    /// Move `count` blocks starting at `from` so the group starts at `to`
    /// (`to` addresses the document with the group removed).
    MoveBlock {
        from: usize,
        to: usize,
        count: usize,
    },
    /// Insert text at a content offset; `\n` produces line breaks.
    InsertText {
        block: usize,
        offset: usize,
        text: String,
    },
    /// Delete `length` characters at a content offset; deleting a break
    /// position merges the adjacent lines.
    DeleteText {
        block: usize,
        offset: usize,
        length: usize,
    },
    /// Split the block at a content offset into two blocks of the same type.
    SplitBlock { block: usize, offset: usize },
    /// Join the block at `index` with the one after it; the earlier block's
    /// type, indent and metadata win.
    JoinBlocks { index: usize },
    /// Add or remove one format over a content range. `link` carries the
    /// target when the format is [`FormatType::Anchor`].
    ChangeFormat {
        block: usize,
        start: usize,
        length: usize,
        format: FormatType,
        link: Option<String>,
        add: bool,
    },
    /// Remove all formatting over a content range.
    ClearFormat {
        block: usize,
        start: usize,
        length: usize,
    },
}

/// The outcome of applying a step: the steps that undo it (applied in the
/// order given) and its position rewrites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepResult {
    pub inverse: Vec<Step>,
    pub maps: Vec<StepMap>,
}

impl StepResult {
    fn noop() -> Self {
        Self::default()
    }
}

fn check_block(doc: &FormattedText, index: usize) -> Result<&FormattedBlock, EditError> {
    doc.block(index).ok_or(EditError::BlockOutOfRange {
        index,
        count: doc.block_count(),
    })
}

fn check_block_mut(
    doc: &mut FormattedText,
    index: usize,
) -> Result<&mut FormattedBlock, EditError> {
    let count = doc.block_count();
    doc.block_mut(index)
        .ok_or(EditError::BlockOutOfRange { index, count })
}

fn check_text_range(
    doc: &FormattedText,
    index: usize,
    offset: usize,
    length: usize,
) -> Result<(), EditError> {
    let block = check_block(doc, index)?;
    if block.block_type().is_atomic() {
        return Err(EditError::AtomicBlock { index });
    }
    let len = block.content_len();
    if offset + length > len {
        return Err(EditError::OffsetOutOfRange {
            block: index,
            offset: offset + length,
            len,
        });
    }
    Ok(())
}

impl Step {
    /// Applies the step to the document, mutating it in place.
    ///
    /// On error the document is left untouched (all validation happens
    /// before any mutation), which is what transaction atomicity builds on.
    pub fn apply(&self, doc: &mut FormattedText) -> Result<StepResult, EditError> {
        match self {
            Step::InsertBlock { index, block } => {
                if *index > doc.block_count() {
                    return Err(EditError::BlockOutOfRange {
                        index: *index,
                        count: doc.block_count(),
                    });
                }
                let start = block_start(doc, *index);
                let size = node_size(block);
                doc.insert_block(*index, block.clone());
                Ok(StepResult {
                    inverse: vec![Step::DeleteBlock { index: *index }],
                    maps: vec![StepMap::new(start, 0, size)],
                })
            }
            Step::DeleteBlock { index } => {
                check_block(doc, *index)?;
                if doc.block_count() == 1 {
                    return Err(EditError::LastBlock);
                }
                let start = block_start(doc, *index);
                let removed = doc.remove_block(*index);
                let size = node_size(&removed);
                Ok(StepResult {
                    inverse: vec![Step::InsertBlock {
                        index: *index,
                        block: removed,
                    }],
                    maps: vec![StepMap::new(start, size, 0)],
                })
            }
            Step::ReplaceBlock { index, block } => {
                check_block(doc, *index)?;
                let start = block_start(doc, *index);
                let new_size = node_size(block);
                let old = doc.replace_block(*index, block.clone());
                let old_size = node_size(&old);
                let maps = if old_size != new_size {
                    vec![StepMap::new(start, old_size, new_size)]
                } else {
                    Vec::new()
                };
                Ok(StepResult {
                    inverse: vec![Step::ReplaceBlock {
                        index: *index,
                        block: old,
                    }],
                    maps,
                })
            }
            Step::SetBlockType { index, block_type } => {
                let current = check_block(doc, *index)?;
                if current.block_type() == *block_type {
                    return Ok(StepResult::noop());
                }
                let start = block_start(doc, *index);
                let old = current.clone();
                let old_size = node_size(&old);
                check_block_mut(doc, *index)?.transform(*block_type);
                let new_size = node_size(&doc.blocks()[*index]);
                let maps = if old_size != new_size {
                    vec![StepMap::new(start, old_size, new_size)]
                } else {
                    Vec::new()
                };
                Ok(StepResult {
                    inverse: vec![Step::ReplaceBlock {
                        index: *index,
                        block: old,
                    }],
                    maps,
                })
            }
            Step::SetBlockIndent { index, indent } => {
                let current = check_block(doc, *index)?;
                let old = current.indent();
                if old == *indent {
                    return Ok(StepResult::noop());
                }
                check_block_mut(doc, *index)?.set_indent(*indent);
                Ok(StepResult {
                    inverse: vec![Step::SetBlockIndent {
                        index: *index,
                        indent: old,
                    }],
                    maps: Vec::new(),
                })
            }
            Step::SetBlockMeta { index, key, value } => {
                let block = check_block_mut(doc, *index)?;
                let old = match value {
                    Some(v) => block.meta_mut().insert(key.clone(), v.clone()),
                    None => block.meta_mut().remove(key),
                };
                Ok(StepResult {
                    inverse: vec![Step::SetBlockMeta {
                        index: *index,
                        key: key.clone(),
                        value: old,
                    }],
                    maps: Vec::new(),
                })
            }
            Step::MoveBlock { from, to, count } => {
                let total = doc.block_count();
                if *count == 0 || from + count > total {
                    return Err(EditError::BlockOutOfRange {
                        index: from + count.saturating_sub(1),
                        count: total,
                    });
                }
                if *to > total - count {
                    return Err(EditError::BlockOutOfRange {
                        index: *to,
                        count: total,
                    });
                }
                if from == to {
                    return Ok(StepResult::noop());
                }
                let from_start = block_start(doc, *from);
                let moved: Vec<FormattedBlock> = (0..*count)
                    .map(|_| doc.remove_block(*from))
                    .collect();
                let size: usize = moved.iter().map(node_size).sum();
                let to_start = block_start(doc, *to);
                for (i, block) in moved.into_iter().enumerate() {
                    doc.insert_block(to + i, block);
                }
                Ok(StepResult {
                    inverse: vec![Step::MoveBlock {
                        from: *to,
                        to: *from,
                        count: *count,
                    }],
                    maps: vec![
                        StepMap::new(from_start, size, 0),
                        StepMap::new(to_start, 0, size),
                    ],
                })
            }
            Step::InsertText {
                block,
                offset,
                text,
            } => {
                check_text_range(doc, *block, *offset, 0)?;
                let target = check_block_mut(doc, *block)?;
                let before = target.content_len();
                target.insert_text(*offset, text);
                let added = target.content_len() - before;
                if added == 0 {
                    return Ok(StepResult::noop());
                }
                Ok(StepResult {
                    inverse: vec![Step::DeleteText {
                        block: *block,
                        offset: *offset,
                        length: added,
                    }],
                    maps: vec![StepMap::new(to_flat_pre(doc, *block, *offset), 0, added)],
                })
            }
            Step::DeleteText {
                block,
                offset,
                length,
            } => {
                check_text_range(doc, *block, *offset, *length)?;
                if *length == 0 {
                    return Ok(StepResult::noop());
                }
                let old = doc.blocks()[*block].clone();
                let pos = to_flat(doc, *block, *offset);
                check_block_mut(doc, *block)?.delete_text(*offset, *length);
                Ok(StepResult {
                    inverse: vec![Step::ReplaceBlock {
                        index: *block,
                        block: old,
                    }],
                    maps: vec![StepMap::new(pos, *length, 0)],
                })
            }
            Step::SplitBlock { block, offset } => {
                check_text_range(doc, *block, *offset, 0)?;
                let old = doc.blocks()[*block].clone();
                let pos = to_flat(doc, *block, *offset);
                let right = check_block_mut(doc, *block)?.split(*offset);
                doc.insert_block(block + 1, right);
                // Splitting exactly at a line break consumes the break, so
                // its position belongs to the rewritten range. A join would
                // not reinstate it; the inverse restores the block clone.
                let consumed = old.content_len()
                    - doc.blocks()[*block].content_len()
                    - doc.blocks()[block + 1].content_len();
                Ok(StepResult {
                    inverse: vec![
                        Step::ReplaceBlock {
                            index: *block,
                            block: old,
                        },
                        Step::DeleteBlock { index: block + 1 },
                    ],
                    maps: vec![StepMap::new(pos, consumed, 2)],
                })
            }
            Step::JoinBlocks { index } => {
                let left = check_block(doc, *index)?;
                if left.block_type().is_atomic() {
                    return Err(EditError::AtomicBlock { index: *index });
                }
                let Some(right) = doc.block(index + 1) else {
                    return Err(EditError::NoJoinTarget { index: *index });
                };
                if right.block_type().is_atomic() {
                    return Err(EditError::AtomicBlock { index: index + 1 });
                }
                let left_old = left.clone();
                let right_old = right.clone();
                let close_pos = block_start(doc, *index) + node_size(&left_old) - 1;
                let mut incoming = doc.remove_block(index + 1);
                incoming.transform(left_old.block_type());
                check_block_mut(doc, *index)?.join(incoming);
                Ok(StepResult {
                    inverse: vec![
                        Step::ReplaceBlock {
                            index: *index,
                            block: left_old,
                        },
                        Step::InsertBlock {
                            index: index + 1,
                            block: right_old,
                        },
                    ],
                    maps: vec![StepMap::new(close_pos, 2, 0)],
                })
            }
            Step::ChangeFormat {
                block,
                start,
                length,
                format,
                link,
                add,
            } => {
                check_text_range(doc, *block, *start, *length)?;
                let old = doc.blocks()[*block].clone();
                let target = check_block_mut(doc, *block)?;
                if *add {
                    let mut meta = BTreeMap::new();
                    if *format == FormatType::Anchor
                        && let Some(href) = link
                    {
                        meta.insert(META_LINK.to_string(), href.clone());
                    }
                    target.apply_format(*start, *length, *format, &meta);
                } else {
                    target.remove_format(*start, *length, *format);
                }
                Ok(StepResult {
                    inverse: vec![Step::ReplaceBlock {
                        index: *block,
                        block: old,
                    }],
                    maps: Vec::new(),
                })
            }
            Step::ClearFormat {
                block,
                start,
                length,
            } => {
                check_text_range(doc, *block, *start, *length)?;
                let old = doc.blocks()[*block].clone();
                check_block_mut(doc, *block)?.clear_format(*start, *length);
                Ok(StepResult {
                    inverse: vec![Step::ReplaceBlock {
                        index: *block,
                        block: old,
                    }],
                    maps: Vec::new(),
                })
            }
        }
    }
}

/// Flat position of `(block, offset)` computed against the document as it
/// stood before the block's own content changed. Only earlier blocks feed
/// the computation, so calling it after an in-block mutation is safe.
fn to_flat_pre(doc: &FormattedText, block: usize, offset: usize) -> usize {
    block_start(doc, block) + 1 + offset
}
