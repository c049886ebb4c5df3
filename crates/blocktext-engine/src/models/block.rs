use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::format::FormatType;
use super::line::FormattedLine;

/// Deepest list indent the editor will produce.
pub const MAX_INDENT: u8 = 5;

/// Paragraph-level block kinds. `Eqn` is atomic: it carries raw `content`
/// instead of editable lines and the cursor cannot enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Para,
    H1,
    H2,
    H3,
    Nlist,
    Olist,
    Eqn,
}

impl BlockType {
    pub fn is_heading(self) -> bool {
        matches!(self, BlockType::H1 | BlockType::H2 | BlockType::H3)
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockType::Nlist | BlockType::Olist)
    }

    pub fn is_atomic(self) -> bool {
        matches!(self, BlockType::Eqn)
    }

    /// Whether inline formatting survives a conversion into this type.
    /// Headings and atomic blocks strip formatting.
    pub fn preserves_formatting(self) -> bool {
        matches!(self, BlockType::Para | BlockType::Nlist)
    }
}

/// A paragraph-level unit of the document: type, indent, one or more lines
/// (or raw `content` for atomic types) and host-defined metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattedBlock {
    block_type: BlockType,
    indent: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    lines: Vec<FormattedLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    meta: BTreeMap<String, String>,
}

impl FormattedBlock {
    pub fn new(block_type: BlockType) -> Self {
        if block_type.is_atomic() {
            Self {
                block_type,
                indent: 0,
                lines: Vec::new(),
                content: Some(String::new()),
                meta: BTreeMap::new(),
            }
        } else {
            Self {
                block_type,
                indent: 0,
                lines: vec![FormattedLine::new()],
                content: None,
                meta: BTreeMap::new(),
            }
        }
    }

    /// A block whose lines come from splitting `text` on `\n`. For atomic
    /// types the text becomes the raw content.
    pub fn of(block_type: BlockType, text: &str) -> Self {
        let mut block = Self::new(block_type);
        if block_type.is_atomic() {
            block.content = Some(text.to_string());
        } else {
            block.lines = text.split('\n').map(FormattedLine::of).collect();
        }
        block
    }

    /// A block built from pre-formed lines; an empty list yields one empty
    /// line (a lined block always has at least one line).
    pub fn from_lines(block_type: BlockType, lines: Vec<FormattedLine>) -> Self {
        let mut block = Self::new(block_type);
        if !block_type.is_atomic() && !lines.is_empty() {
            block.lines = lines;
        }
        block
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent.min(MAX_INDENT);
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn indent(&self) -> u8 {
        self.indent
    }

    pub fn set_indent(&mut self, indent: u8) {
        self.indent = indent.min(MAX_INDENT);
    }

    pub fn lines(&self) -> &[FormattedLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<FormattedLine> {
        &mut self.lines
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn set_content(&mut self, content: &str) {
        self.content = Some(content.to_string());
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.meta
    }

    /// Content length in characters, with line breaks counting one each.
    /// Atomic blocks have no enterable content.
    pub fn content_len(&self) -> usize {
        if self.block_type.is_atomic() {
            return 0;
        }
        let mut len = 0;
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                len += 1;
            }
            len += line.len();
        }
        len
    }

    /// The block's text with lines joined by `\n`. Atomic blocks yield their
    /// raw content.
    pub fn text(&self) -> String {
        if let Some(content) = &self.content {
            return content.clone();
        }
        let texts: Vec<&str> = self.lines.iter().map(|l| l.text()).collect();
        texts.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.content_len() == 0 && self.content.as_deref().unwrap_or("").is_empty()
    }

    /// Resolves a block content offset to `(line index, offset in line)`,
    /// clamping past-the-end offsets to the end of the last line.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let mut acc = 0;
        for (li, line) in self.lines.iter().enumerate() {
            let len = line.len();
            if offset <= acc + len {
                return (li, offset - acc);
            }
            acc += len + 1;
        }
        let last = self.lines.len().saturating_sub(1);
        (last, self.lines.get(last).map(|l| l.len()).unwrap_or(0))
    }

    /// The character at a content offset; `\n` at line-break positions.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.content_len() {
            return None;
        }
        let (li, ci) = self.locate(offset);
        match self.lines[li].char_at(ci) {
            Some(c) => Some(c),
            None => Some('\n'),
        }
    }

    /// Inserts text at a content offset; embedded `\n` split into new lines.
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        let (li, ci) = self.locate(offset);
        if !text.contains('\n') {
            self.lines[li].insert(ci, text);
            return;
        }
        let tail = self.lines[li].split_off(ci);
        let parts: Vec<&str> = text.split('\n').collect();
        self.lines[li].append(parts[0]);
        let mut insert_at = li + 1;
        for part in &parts[1..] {
            self.lines.insert(insert_at, FormattedLine::of(part));
            insert_at += 1;
        }
        self.lines[insert_at - 1].merge(tail);
    }

    /// Deletes `len` characters starting at a content offset; deleting a
    /// line-break position merges the adjacent lines.
    pub fn delete_text(&mut self, offset: usize, len: usize) {
        let (li, ci) = self.locate(offset);
        let mut remaining = len;
        while remaining > 0 {
            let line_len = self.lines[li].len();
            if ci < line_len {
                let take = remaining.min(line_len - ci);
                self.lines[li].remove(ci, take);
                remaining -= take;
            } else if li + 1 < self.lines.len() {
                let next = self.lines.remove(li + 1);
                self.lines[li].merge(next);
                remaining -= 1;
            } else {
                break;
            }
        }
    }

    /// Splits the block at a content offset, returning the right portion.
    /// The line break at the split point (if any) is consumed. Splitting at
    /// offset 0 moves all content to the right portion.
    pub fn split(&mut self, offset: usize) -> FormattedBlock {
        let mut right = FormattedBlock {
            block_type: self.block_type,
            indent: self.indent,
            lines: Vec::new(),
            content: None,
            meta: self.meta.clone(),
        };
        if offset == 0 {
            right.lines = std::mem::take(&mut self.lines);
            self.lines.push(FormattedLine::new());
            return right;
        }
        let (li, ci) = self.locate(offset);
        let mut moved: Vec<FormattedLine> = self.lines.drain(li + 1..).collect();
        if ci < self.lines[li].len() {
            moved.insert(0, self.lines[li].split_off(ci));
        }
        right.lines = moved;
        if right.lines.is_empty() {
            right.lines.push(FormattedLine::new());
        }
        right
    }

    /// Appends another block's lines, merging the boundary pair into a
    /// single line. This block's type, indent and metadata win.
    pub fn join(&mut self, other: FormattedBlock) {
        let mut incoming = other.lines.into_iter();
        if let Some(first) = incoming.next() {
            if let Some(last) = self.lines.last_mut() {
                last.merge(first);
            } else {
                self.lines.push(first);
            }
        }
        self.lines.extend(incoming);
    }

    /// Converts the block to another type in place. Conversions into types
    /// that do not preserve formatting strip it; converting to an atomic
    /// type flattens the lines into raw content (destructive), and
    /// converting away from one restores the content as plain lines.
    pub fn transform(&mut self, block_type: BlockType) {
        if block_type == self.block_type {
            return;
        }
        let was_atomic = self.block_type.is_atomic();
        self.block_type = block_type;
        if block_type.is_atomic() {
            let texts: Vec<&str> = self.lines.iter().map(|l| l.text()).collect();
            self.content = Some(texts.join("\n"));
            self.lines.clear();
            return;
        }
        if was_atomic {
            let content = self.content.take().unwrap_or_default();
            self.lines = content.split('\n').map(FormattedLine::of).collect();
        }
        if !block_type.preserves_formatting() {
            for line in &mut self.lines {
                line.strip_formatting();
            }
        }
    }

    /// Applies a format over a content range (line breaks are skipped).
    pub fn apply_format(
        &mut self,
        start: usize,
        len: usize,
        format: FormatType,
        meta: &BTreeMap<String, String>,
    ) {
        self.for_line_ranges(start, len, |line, s, l| line.apply_format(s, l, format, meta));
    }

    /// Removes a format over a content range.
    pub fn remove_format(&mut self, start: usize, len: usize, format: FormatType) {
        self.for_line_ranges(start, len, |line, s, l| line.remove_format(s, l, format));
    }

    /// Removes all formatting over a content range.
    pub fn clear_format(&mut self, start: usize, len: usize) {
        self.for_line_ranges(start, len, |line, s, l| line.clear_format(s, l));
    }

    /// Whether every text character in the range carries the format; line
    /// breaks are ignored. Empty ranges and atomic blocks are `false`.
    pub fn has_format(&self, start: usize, len: usize, format: FormatType) -> bool {
        if len == 0 || self.block_type.is_atomic() {
            return false;
        }
        let end = start + len;
        let mut acc = 0;
        let mut seen_text = false;
        for line in &self.lines {
            let line_start = acc;
            let line_end = acc + line.len();
            let s = start.max(line_start);
            let e = end.min(line_end);
            if s < e {
                seen_text = true;
                if !line.has_format(s - line_start, e - s, format) {
                    return false;
                }
            }
            acc = line_end + 1;
        }
        seen_text
    }

    fn for_line_ranges(
        &mut self,
        start: usize,
        len: usize,
        mut f: impl FnMut(&mut FormattedLine, usize, usize),
    ) {
        if len == 0 {
            return;
        }
        let end = start + len;
        let mut acc = 0;
        for line in &mut self.lines {
            let line_start = acc;
            let line_end = acc + line.len();
            let s = start.max(line_start);
            let e = end.min(line_end);
            if s < e {
                f(line, s - line_start, e - s);
            }
            acc = line_end + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn para(text: &str) -> FormattedBlock {
        FormattedBlock::of(BlockType::Para, text)
    }

    #[test]
    fn content_len_counts_line_breaks() {
        let block = para("Hello\nWorld");
        assert_eq!(block.content_len(), 11);
        assert_eq!(block.lines().len(), 2);
    }

    #[test]
    fn atomic_block_has_no_enterable_content() {
        let block = FormattedBlock::of(BlockType::Eqn, "E = mc^2");
        assert_eq!(block.content_len(), 0);
        assert_eq!(block.content(), Some("E = mc^2"));
        assert!(block.lines().is_empty());
    }

    #[rstest]
    #[case(0, (0, 0))]
    #[case(5, (0, 5))] // end of first line
    #[case(6, (1, 0))] // start of second line
    #[case(11, (1, 5))]
    fn locate_resolves_across_lines(#[case] offset: usize, #[case] expect: (usize, usize)) {
        let block = para("Hello\nWorld");
        assert_eq!(block.locate(offset), expect);
    }

    #[test]
    fn char_at_reports_newline_at_break() {
        let block = para("ab\ncd");
        assert_eq!(block.char_at(1), Some('b'));
        assert_eq!(block.char_at(2), Some('\n'));
        assert_eq!(block.char_at(3), Some('c'));
        assert_eq!(block.char_at(5), None);
    }

    #[test]
    fn insert_text_with_newline_splits_lines() {
        let mut block = para("HelloWorld");
        block.insert_text(5, "\n");
        assert_eq!(block.lines().len(), 2);
        assert_eq!(block.lines()[0].text(), "Hello");
        assert_eq!(block.lines()[1].text(), "World");
    }

    #[test]
    fn insert_multiline_text_in_middle() {
        let mut block = para("AD");
        block.insert_text(1, "B\nC");
        assert_eq!(block.text(), "AB\nCD");
    }

    #[test]
    fn delete_text_across_break_merges_lines() {
        let mut block = para("Hello\nWorld");
        block.delete_text(4, 3);
        assert_eq!(block.text(), "Hellorld");
        assert_eq!(block.lines().len(), 1);
    }

    #[test]
    fn delete_break_only_merges() {
        let mut block = para("ab\ncd");
        block.delete_text(2, 1);
        assert_eq!(block.text(), "abcd");
    }

    #[test]
    fn split_in_middle_of_line() {
        let mut block = para("Hello World");
        let right = block.split(5);
        assert_eq!(block.text(), "Hello");
        assert_eq!(right.text(), " World");
        assert_eq!(right.block_type(), BlockType::Para);
    }

    #[test]
    fn split_at_zero_moves_everything_right() {
        let mut block = para("Hello");
        let right = block.split(0);
        assert_eq!(block.text(), "");
        assert_eq!(right.text(), "Hello");
    }

    #[test]
    fn split_at_line_break_consumes_it() {
        let mut block = para("ab\ncd");
        let right = block.split(2);
        assert_eq!(block.text(), "ab");
        assert_eq!(right.text(), "cd");
    }

    #[test]
    fn split_keeps_indent_and_type() {
        let mut block = FormattedBlock::of(BlockType::Olist, "one two").with_indent(2);
        let right = block.split(3);
        assert_eq!(right.block_type(), BlockType::Olist);
        assert_eq!(right.indent(), 2);
    }

    #[test]
    fn join_merges_boundary_lines() {
        let mut left = para("Hello");
        let right = para(" World");
        left.join(right);
        assert_eq!(left.text(), "Hello World");
        assert_eq!(left.lines().len(), 1);
    }

    #[test]
    fn join_keeps_left_attributes() {
        let mut left = FormattedBlock::of(BlockType::H2, "Title");
        let right = para("Body");
        left.join(right);
        assert_eq!(left.block_type(), BlockType::H2);
        assert_eq!(left.text(), "TitleBody");
    }

    #[test]
    fn transform_to_heading_strips_formatting() {
        let mut block = FormattedBlock::from_lines(
            BlockType::Para,
            vec![FormattedLine::formatted("bold", [FormatType::Bold])],
        );
        block.transform(BlockType::H1);
        assert_eq!(block.block_type(), BlockType::H1);
        assert!(block.lines()[0].formatting().is_empty());
    }

    #[test]
    fn transform_between_list_and_para_keeps_text() {
        let mut block = FormattedBlock::of(BlockType::Nlist, "item");
        block.transform(BlockType::Para);
        assert_eq!(block.block_type(), BlockType::Para);
        assert_eq!(block.text(), "item");
    }

    #[test]
    fn transform_to_atomic_flattens_lines() {
        let mut block = para("a\nb");
        block.transform(BlockType::Eqn);
        assert_eq!(block.content(), Some("a\nb"));
        assert!(block.lines().is_empty());
        block.transform(BlockType::Para);
        assert_eq!(block.text(), "a\nb");
        assert_eq!(block.lines().len(), 2);
    }

    #[test]
    fn has_format_spans_lines_ignoring_breaks() {
        let mut block = para("ab\ncd");
        block.apply_format(0, 5, FormatType::Bold, &BTreeMap::new());
        assert!(block.has_format(0, 5, FormatType::Bold));
        assert!(block.has_format(1, 3, FormatType::Bold));
        assert!(!block.has_format(0, 5, FormatType::Italic));
    }

    #[test]
    fn indent_clamps_to_max() {
        let mut block = para("x");
        block.set_indent(9);
        assert_eq!(block.indent(), MAX_INDENT);
    }
}
