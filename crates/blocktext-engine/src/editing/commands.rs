//! Intent-level editing commands.
//!
//! Each command inspects the current [`EditorState`] and synthesizes the
//! transaction realizing the intent, resolving edge-case policy (empty list
//! item on Enter, heading-to-paragraph coercion, cross-type backspace).
//! Commands never construct invalid steps; the document is only read here.
//!
//! Every command returns a [`CommandOutcome`]: a transaction to apply,
//! nothing to do, or an explicit boundary case the caller must resolve
//! (for example by force-joining across a block type change).

use crate::config::EditorConfig;
use crate::models::{BlockType, FormatType, FormattedText};

use super::selection::Selection;
use super::state::EditorState;
use super::step::Step;
use super::transaction::Transaction;

/// The three-way result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// A transaction realizing the intent, ready for
    /// [`EditorState::apply`].
    Applied(Transaction),
    /// The intent is inapplicable in the current state; apply nothing,
    /// push nothing to history.
    NoOp,
    /// The intent hit a policy boundary the caller must decide on.
    Boundary(BoundaryReason),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }

    pub fn transaction(self) -> Option<Transaction> {
        match self {
            CommandOutcome::Applied(tr) => Some(tr),
            _ => None,
        }
    }
}

/// Why a command declined to choose a policy on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryReason {
    /// A backward delete/join would merge blocks of different types.
    CrossTypePrevious,
    /// A forward delete/join would merge blocks of different types.
    CrossTypeNext,
}

/// Accumulates steps while tracking the document they produce, so later
/// steps can be addressed against the evolving document the way
/// transactions apply them.
struct StepBuffer {
    work: FormattedText,
    steps: Vec<Step>,
}

impl StepBuffer {
    fn new(doc: &FormattedText) -> Self {
        Self {
            work: doc.clone(),
            steps: Vec::new(),
        }
    }

    fn doc(&self) -> &FormattedText {
        &self.work
    }

    /// Applies and records a step. Commands only build steps valid for the
    /// working document, so a failure aborts the whole command as a no-op.
    fn push(&mut self, step: Step) -> bool {
        match step.apply(&mut self.work) {
            Ok(_) => {
                self.steps.push(step);
                true
            }
            Err(_) => false,
        }
    }

    fn into_transaction(self, selection: Selection) -> Transaction {
        let mut tr = Transaction::new();
        for step in self.steps {
            tr = tr.step(step);
        }
        tr.set_selection(selection)
    }
}

fn block_type(doc: &FormattedText, index: usize) -> BlockType {
    doc.blocks()[index].block_type()
}

fn block_len(doc: &FormattedText, index: usize) -> usize {
    doc.blocks()[index].content_len()
}

/// Characters that survive line sanitization; keeps the post-insert cursor
/// arithmetic in step with what the model actually stores.
fn surviving_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| *c == '\n' || *c == '\u{00a0}' || !c.is_control())
        .count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Adds the steps removing the selected range. Leaves the cursor location
/// at the selection's document-order start. Boundary blocks of different
/// types are trimmed but not merged.
fn push_delete_range(buf: &mut StepBuffer, sel: &Selection) -> bool {
    let (fb, fo) = (sel.from_block(), sel.from_offset());
    let (tb, to) = (sel.to_block(), sel.to_offset());
    if fb == tb {
        if to > fo {
            return buf.push(Step::DeleteText {
                block: fb,
                offset: fo,
                length: to - fo,
            });
        }
        return true;
    }
    let left_type = block_type(buf.doc(), fb);
    let right_type = block_type(buf.doc(), tb);
    let left_len = block_len(buf.doc(), fb);
    if !left_type.is_atomic()
        && left_len > fo
        && !buf.push(Step::DeleteText {
            block: fb,
            offset: fo,
            length: left_len - fo,
        })
    {
        return false;
    }
    for index in (fb + 1..tb).rev() {
        if !buf.push(Step::DeleteBlock { index }) {
            return false;
        }
    }
    if !right_type.is_atomic()
        && to > 0
        && !buf.push(Step::DeleteText {
            block: fb + 1,
            offset: 0,
            length: to,
        })
    {
        return false;
    }
    if left_type == right_type && !left_type.is_atomic() {
        return buf.push(Step::JoinBlocks { index: fb });
    }
    true
}

/// Inserts text at the selection, replacing it when it is a range.
pub fn insert_text(state: &EditorState, text: &str) -> CommandOutcome {
    let sel = state.selection();
    let (b, o) = (sel.from_block(), sel.from_offset());
    if block_type(state.doc(), b).is_atomic() {
        return CommandOutcome::NoOp;
    }
    let added = surviving_chars(text);
    if added == 0 && sel.is_cursor() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !sel.is_cursor() && !push_delete_range(&mut buf, &sel) {
        return CommandOutcome::NoOp;
    }
    if added > 0
        && !buf.push(Step::InsertText {
            block: b,
            offset: o,
            text: text.to_string(),
        })
    {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b, o + added)))
}

/// Inserts an intra-block line break at the selection.
pub fn insert_line_break(state: &EditorState) -> CommandOutcome {
    insert_text(state, "\n")
}

/// Splits the anchor block at the cursor (the Enter key). A range
/// selection is deleted first. An empty list item exits the list instead
/// of splitting; splitting a heading at its end starts a paragraph when
/// [`EditorConfig::paragraph_after_heading`] is set.
pub fn insert_paragraph(state: &EditorState, config: &EditorConfig) -> CommandOutcome {
    let sel = state.selection();
    let (b, o) = (sel.from_block(), sel.from_offset());
    if block_type(state.doc(), b).is_atomic() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !sel.is_cursor() && !push_delete_range(&mut buf, &sel) {
        return CommandOutcome::NoOp;
    }
    let block = &buf.doc().blocks()[b];
    if block.block_type().is_list() && block.content_len() == 0 {
        if !buf.push(Step::SetBlockType {
            index: b,
            block_type: BlockType::Para,
        }) {
            return CommandOutcome::NoOp;
        }
        return CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b, 0)));
    }
    let at_end = o == block.content_len();
    let is_heading = block.block_type().is_heading();
    if !buf.push(Step::SplitBlock { block: b, offset: o }) {
        return CommandOutcome::NoOp;
    }
    if is_heading
        && at_end
        && config.paragraph_after_heading
        && !buf.push(Step::SetBlockType {
            index: b + 1,
            block_type: BlockType::Para,
        })
    {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b + 1, 0)))
}

/// Alias for the Enter-key intent.
pub fn split_block(state: &EditorState, config: &EditorConfig) -> CommandOutcome {
    insert_paragraph(state, config)
}

/// Deletes the selected range. A cursor selection is a no-op.
pub fn delete_selection(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if sel.is_cursor() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !push_delete_range(&mut buf, &sel) {
        return CommandOutcome::NoOp;
    }
    let target = Selection::cursor(sel.from_block(), sel.from_offset());
    CommandOutcome::Applied(buf.into_transaction(target))
}

/// Backspace. At offset 0 the policy ladder is: outdent an indented block,
/// exit a list, otherwise join with the previous block, reporting a
/// boundary when that join would cross block types.
pub fn delete_backward(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if !sel.is_cursor() {
        return delete_selection(state);
    }
    let (b, o) = (sel.anchor_block, sel.anchor_offset);
    if o > 0 {
        let mut buf = StepBuffer::new(state.doc());
        if !buf.push(Step::DeleteText {
            block: b,
            offset: o - 1,
            length: 1,
        }) {
            return CommandOutcome::NoOp;
        }
        return CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b, o - 1)));
    }
    let block = &state.doc().blocks()[b];
    if block.indent() > 0 {
        let mut buf = StepBuffer::new(state.doc());
        if !buf.push(Step::SetBlockIndent {
            index: b,
            indent: block.indent() - 1,
        }) {
            return CommandOutcome::NoOp;
        }
        return CommandOutcome::Applied(buf.into_transaction(sel));
    }
    if block.block_type().is_list() {
        let mut buf = StepBuffer::new(state.doc());
        if !buf.push(Step::SetBlockType {
            index: b,
            block_type: BlockType::Para,
        }) {
            return CommandOutcome::NoOp;
        }
        return CommandOutcome::Applied(buf.into_transaction(sel));
    }
    if b == 0 {
        return CommandOutcome::NoOp;
    }
    if block_type(state.doc(), b - 1) != block.block_type() {
        return CommandOutcome::Boundary(BoundaryReason::CrossTypePrevious);
    }
    join_with_previous(state)
}

/// Forward delete. At the end of a block this joins with the next block,
/// reporting a boundary when the join would cross block types.
pub fn delete_forward(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if !sel.is_cursor() {
        return delete_selection(state);
    }
    let (b, o) = (sel.anchor_block, sel.anchor_offset);
    let len = block_len(state.doc(), b);
    if o < len {
        let mut buf = StepBuffer::new(state.doc());
        if !buf.push(Step::DeleteText {
            block: b,
            offset: o,
            length: 1,
        }) {
            return CommandOutcome::NoOp;
        }
        return CommandOutcome::Applied(buf.into_transaction(sel));
    }
    if b + 1 == state.doc().block_count() {
        return CommandOutcome::NoOp;
    }
    if block_type(state.doc(), b + 1) != block_type(state.doc(), b) {
        return CommandOutcome::Boundary(BoundaryReason::CrossTypeNext);
    }
    join_with_next(state)
}

/// Joins the anchor block into the previous one; same-type blocks only.
pub fn join_with_previous(state: &EditorState) -> CommandOutcome {
    let b = state.selection().anchor_block;
    if b == 0 {
        return CommandOutcome::NoOp;
    }
    if block_type(state.doc(), b - 1) != block_type(state.doc(), b) {
        return CommandOutcome::Boundary(BoundaryReason::CrossTypePrevious);
    }
    force_join_with_previous(state)
}

/// Joins the next block into the anchor block; same-type blocks only.
pub fn join_with_next(state: &EditorState) -> CommandOutcome {
    let b = state.selection().anchor_block;
    if b + 1 == state.doc().block_count() {
        return CommandOutcome::NoOp;
    }
    if block_type(state.doc(), b + 1) != block_type(state.doc(), b) {
        return CommandOutcome::Boundary(BoundaryReason::CrossTypeNext);
    }
    force_join_with_next(state)
}

/// Joins with the previous block regardless of type; the earlier block's
/// type wins.
pub fn force_join_with_previous(state: &EditorState) -> CommandOutcome {
    let b = state.selection().anchor_block;
    if b == 0
        || block_type(state.doc(), b).is_atomic()
        || block_type(state.doc(), b - 1).is_atomic()
    {
        return CommandOutcome::NoOp;
    }
    let prev_len = block_len(state.doc(), b - 1);
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::JoinBlocks { index: b - 1 }) {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b - 1, prev_len)))
}

/// Joins with the next block regardless of type; this block's type wins.
pub fn force_join_with_next(state: &EditorState) -> CommandOutcome {
    let b = state.selection().anchor_block;
    if b + 1 == state.doc().block_count()
        || block_type(state.doc(), b).is_atomic()
        || block_type(state.doc(), b + 1).is_atomic()
    {
        return CommandOutcome::NoOp;
    }
    let len = block_len(state.doc(), b);
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::JoinBlocks { index: b }) {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b, len)))
}

/// Deletes the word (or run of spaces, or single other character) before
/// the cursor. At offset 0 this falls back to the backspace ladder.
pub fn delete_word_backward(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if !sel.is_cursor() {
        return delete_selection(state);
    }
    let (b, o) = (sel.anchor_block, sel.anchor_offset);
    if o == 0 {
        return delete_backward(state);
    }
    let chars: Vec<char> = state.doc().blocks()[b].text().chars().collect();
    let mut start = o;
    while start > 0 && chars[start - 1] == ' ' {
        start -= 1;
    }
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    if start == o {
        start -= 1;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::DeleteText {
        block: b,
        offset: start,
        length: o - start,
    }) {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(Selection::cursor(b, start)))
}

/// Deletes the word (or run of spaces, or single other character) after
/// the cursor. At the block end this falls back to forward delete.
pub fn delete_word_forward(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if !sel.is_cursor() {
        return delete_selection(state);
    }
    let (b, o) = (sel.anchor_block, sel.anchor_offset);
    let len = block_len(state.doc(), b);
    if o == len {
        return delete_forward(state);
    }
    let chars: Vec<char> = state.doc().blocks()[b].text().chars().collect();
    let mut end = o;
    while end < len && chars[end] == ' ' {
        end += 1;
    }
    while end < len && is_word_char(chars[end]) {
        end += 1;
    }
    if end == o {
        end += 1;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::DeleteText {
        block: b,
        offset: o,
        length: end - o,
    }) {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Per-block portion of the selection usable for formatting, as
/// `(block, start, length)`; atomic and untouched blocks are skipped.
fn formatted_ranges(doc: &FormattedText, sel: &Selection) -> Vec<(usize, usize, usize)> {
    let (fb, fo) = (sel.from_block(), sel.from_offset());
    let (tb, to) = (sel.to_block(), sel.to_offset());
    let mut ranges = Vec::new();
    for b in fb..=tb {
        if block_type(doc, b).is_atomic() {
            continue;
        }
        let len = block_len(doc, b);
        let start = if b == fb { fo } else { 0 };
        let end = if b == tb { to } else { len };
        if start < end {
            ranges.push((b, start, end - start));
        }
    }
    ranges
}

/// Toggles a format uniformly over the selection: if every covered
/// character already carries it, it is removed everywhere, otherwise it is
/// added everywhere. A cursor selection is a no-op (pending formats are
/// the host's concern).
pub fn toggle_format(state: &EditorState, format: FormatType) -> CommandOutcome {
    let sel = state.selection();
    if sel.is_cursor() {
        return CommandOutcome::NoOp;
    }
    let ranges = formatted_ranges(state.doc(), &sel);
    if ranges.is_empty() {
        return CommandOutcome::NoOp;
    }
    let uniform = ranges
        .iter()
        .all(|&(b, start, len)| state.doc().blocks()[b].has_format(start, len, format));
    let mut buf = StepBuffer::new(state.doc());
    for &(block, start, length) in &ranges {
        if !buf.push(Step::ChangeFormat {
            block,
            start,
            length,
            format,
            link: None,
            add: !uniform,
        }) {
            return CommandOutcome::NoOp;
        }
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Whether every covered character of the selection carries the format;
/// what a toolbar uses to light its buttons.
pub fn is_format_active(state: &EditorState, format: FormatType) -> bool {
    let sel = state.selection();
    if sel.is_cursor() {
        return false;
    }
    let ranges = formatted_ranges(state.doc(), &sel);
    !ranges.is_empty()
        && ranges
            .iter()
            .all(|&(b, start, len)| state.doc().blocks()[b].has_format(start, len, format))
}

/// Removes all formatting from the selection.
pub fn clear_formatting(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if sel.is_cursor() {
        return CommandOutcome::NoOp;
    }
    let ranges = formatted_ranges(state.doc(), &sel);
    if ranges.is_empty() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    for (block, start, length) in ranges {
        if !buf.push(Step::ClearFormat {
            block,
            start,
            length,
        }) {
            return CommandOutcome::NoOp;
        }
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Marks the selection as a link to `href`.
pub fn apply_link(state: &EditorState, href: &str) -> CommandOutcome {
    let sel = state.selection();
    if sel.is_cursor() {
        return CommandOutcome::NoOp;
    }
    let ranges = formatted_ranges(state.doc(), &sel);
    if ranges.is_empty() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    for (block, start, length) in ranges {
        if !buf.push(Step::ChangeFormat {
            block,
            start,
            length,
            format: FormatType::Anchor,
            link: Some(href.to_string()),
            add: true,
        }) {
            return CommandOutcome::NoOp;
        }
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Removes any link from the selection.
pub fn remove_link(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if sel.is_cursor() {
        return CommandOutcome::NoOp;
    }
    let ranges = formatted_ranges(state.doc(), &sel);
    if ranges.is_empty() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    for (block, start, length) in ranges {
        if !buf.push(Step::ChangeFormat {
            block,
            start,
            length,
            format: FormatType::Anchor,
            link: None,
            add: false,
        }) {
            return CommandOutcome::NoOp;
        }
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Sets the type of every block spanned by the selection.
pub fn set_block_type(state: &EditorState, block_type: BlockType) -> CommandOutcome {
    let sel = state.selection();
    let mut buf = StepBuffer::new(state.doc());
    let mut changed = false;
    for index in sel.from_block()..=sel.to_block() {
        if self::block_type(state.doc(), index) == block_type {
            continue;
        }
        if !buf.push(Step::SetBlockType { index, block_type }) {
            return CommandOutcome::NoOp;
        }
        changed = true;
    }
    if !changed {
        return CommandOutcome::NoOp;
    }
    // No explicit selection: type changes that collapse content (EQN)
    // re-resolve the cursor through the position mapping.
    let mut tr = Transaction::new();
    for step in buf.steps {
        tr = tr.step(step);
    }
    CommandOutcome::Applied(tr)
}

/// Sets the spanned blocks to `block_type`, or back to paragraphs when the
/// anchor block already has that type.
pub fn toggle_block_type(state: &EditorState, block_type: BlockType) -> CommandOutcome {
    if self::block_type(state.doc(), state.selection().anchor_block) == block_type {
        set_block_type(state, BlockType::Para)
    } else {
        set_block_type(state, block_type)
    }
}

/// Indents every spanned block one level, up to the configured maximum.
pub fn indent(state: &EditorState, config: &EditorConfig) -> CommandOutcome {
    let sel = state.selection();
    let max = config.max_indent();
    let mut buf = StepBuffer::new(state.doc());
    let mut changed = false;
    for index in sel.from_block()..=sel.to_block() {
        let current = state.doc().blocks()[index].indent();
        if current >= max {
            continue;
        }
        if !buf.push(Step::SetBlockIndent {
            index,
            indent: current + 1,
        }) {
            return CommandOutcome::NoOp;
        }
        changed = true;
    }
    if !changed {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Outdents every spanned block one level; blocks at indent 0 stay put,
/// and if none can move the command is a no-op.
pub fn outdent(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    let mut buf = StepBuffer::new(state.doc());
    let mut changed = false;
    for index in sel.from_block()..=sel.to_block() {
        let current = state.doc().blocks()[index].indent();
        if current == 0 {
            continue;
        }
        if !buf.push(Step::SetBlockIndent {
            index,
            indent: current - 1,
        }) {
            return CommandOutcome::NoOp;
        }
        changed = true;
    }
    if !changed {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Moves the anchor block one position up.
pub fn move_block_up(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if sel.anchor_block != sel.head_block {
        return CommandOutcome::NoOp;
    }
    let b = sel.anchor_block;
    if b == 0 {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::MoveBlock {
        from: b,
        to: b - 1,
        count: 1,
    }) {
        return CommandOutcome::NoOp;
    }
    let target = Selection::range(b - 1, sel.anchor_offset, b - 1, sel.head_offset);
    CommandOutcome::Applied(buf.into_transaction(target))
}

/// Moves the anchor block one position down.
pub fn move_block_down(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    if sel.anchor_block != sel.head_block {
        return CommandOutcome::NoOp;
    }
    let b = sel.anchor_block;
    if b + 1 == state.doc().block_count() {
        return CommandOutcome::NoOp;
    }
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::MoveBlock {
        from: b,
        to: b + 1,
        count: 1,
    }) {
        return CommandOutcome::NoOp;
    }
    let target = Selection::range(b + 1, sel.anchor_offset, b + 1, sel.head_offset);
    CommandOutcome::Applied(buf.into_transaction(target))
}

/// Inserts a copy of the anchor block directly after it.
pub fn duplicate_block(state: &EditorState) -> CommandOutcome {
    let sel = state.selection();
    let b = sel.anchor_block;
    let copy = state.doc().blocks()[b].clone();
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::InsertBlock {
        index: b + 1,
        block: copy,
    }) {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Sets (or with `None` removes) one metadata entry on the anchor block.
pub fn set_block_meta(state: &EditorState, key: &str, value: Option<&str>) -> CommandOutcome {
    let sel = state.selection();
    let mut buf = StepBuffer::new(state.doc());
    if !buf.push(Step::SetBlockMeta {
        index: sel.anchor_block,
        key: key.to_string(),
        value: value.map(str::to_string),
    }) {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(sel))
}

/// Selects the whole document. Carries no steps; callers should not push
/// the (empty) inverse to history.
pub fn select_all(state: &EditorState) -> CommandOutcome {
    let last = state.doc().block_count() - 1;
    let len = block_len(state.doc(), last);
    CommandOutcome::Applied(
        Transaction::new().set_selection(Selection::range(0, 0, last, len)),
    )
}

/// Copies the selected content out as a standalone document (the clipboard
/// payload for copy/cut). `None` when the selection is a cursor.
pub fn extract_selection(state: &EditorState) -> Option<FormattedText> {
    let sel = state.selection();
    if sel.is_cursor() {
        return None;
    }
    let (fb, fo) = (sel.from_block(), sel.from_offset());
    let (tb, to) = (sel.to_block(), sel.to_offset());
    if fb == tb {
        let mut block = state.doc().blocks()[fb].clone();
        if !block.block_type().is_atomic() {
            let len = block.content_len();
            block.delete_text(to, len - to);
            block.delete_text(0, fo);
        }
        return Some(FormattedText::of(vec![block]));
    }
    let mut blocks = Vec::new();
    let mut first = state.doc().blocks()[fb].clone();
    if !first.block_type().is_atomic() {
        first.delete_text(0, fo);
    }
    blocks.push(first);
    for b in fb + 1..tb {
        blocks.push(state.doc().blocks()[b].clone());
    }
    if to > 0 {
        let mut last = state.doc().blocks()[tb].clone();
        if !last.block_type().is_atomic() {
            let len = last.content_len();
            last.delete_text(to, len - to);
        }
        blocks.push(last);
    }
    Some(FormattedText::of(blocks))
}

/// Pastes plain text at the selection; `\n` becomes intra-block line
/// breaks, with no block-structure or formatting inference.
pub fn paste_text(state: &EditorState, text: &str) -> CommandOutcome {
    insert_text(state, text)
}

/// Pastes a block-structured fragment at the selection.
///
/// The target block is split at the cursor and the fragment's blocks are
/// inserted between the two remnants; a remnant then merges with the
/// neighbouring pasted block when the types match, and an empty remnant of
/// a different type is dropped. The cursor lands at the end of the pasted
/// content.
pub fn paste(state: &EditorState, fragment: &FormattedText) -> CommandOutcome {
    let sel = state.selection();
    let n = fragment.block_count();
    let mut buf = StepBuffer::new(state.doc());
    if !sel.is_cursor() && !push_delete_range(&mut buf, &sel) {
        return CommandOutcome::NoOp;
    }
    let (b, o) = (sel.from_block(), sel.from_offset());

    if block_type(buf.doc(), b).is_atomic() {
        // Cannot split an atomic block; insert the fragment after it.
        for (i, block) in fragment.blocks().iter().enumerate() {
            if !buf.push(Step::InsertBlock {
                index: b + 1 + i,
                block: block.clone(),
            }) {
                return CommandOutcome::NoOp;
            }
        }
        let last = b + n;
        let len = block_len(buf.doc(), last);
        return CommandOutcome::Applied(buf.into_transaction(Selection::cursor(last, len)));
    }

    if !buf.push(Step::SplitBlock { block: b, offset: o }) {
        return CommandOutcome::NoOp;
    }
    for (i, block) in fragment.blocks().iter().enumerate() {
        if !buf.push(Step::InsertBlock {
            index: b + 1 + i,
            block: block.clone(),
        }) {
            return CommandOutcome::NoOp;
        }
    }
    // Layout now: left remnant at b, pasted at b+1..=b+n, right remnant
    // at b+n+1.
    let mut last_pasted = b + n;
    let left_type = block_type(buf.doc(), b);
    let first_type = block_type(buf.doc(), b + 1);
    if left_type == first_type && !left_type.is_atomic() {
        if !buf.push(Step::JoinBlocks { index: b }) {
            return CommandOutcome::NoOp;
        }
        last_pasted -= 1;
    } else if o == 0 {
        // Splitting at offset 0 leaves an empty left remnant; drop it
        // rather than keep an empty block of a foreign type.
        if !buf.push(Step::DeleteBlock { index: b }) {
            return CommandOutcome::NoOp;
        }
        last_pasted -= 1;
    }
    let cursor = Selection::cursor(last_pasted, block_len(buf.doc(), last_pasted));
    let right = last_pasted + 1;
    let right_type = block_type(buf.doc(), right);
    let last_type = block_type(buf.doc(), last_pasted);
    if right_type == last_type && !right_type.is_atomic() {
        if !buf.push(Step::JoinBlocks { index: last_pasted }) {
            return CommandOutcome::NoOp;
        }
    } else if block_len(buf.doc(), right) == 0
        && !buf.push(Step::DeleteBlock { index: right })
    {
        return CommandOutcome::NoOp;
    }
    CommandOutcome::Applied(buf.into_transaction(cursor))
}
