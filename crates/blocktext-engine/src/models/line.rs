use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::format::{Format, FormatType, META_LINK, TextSegment};

/// A single line of formatted text.
///
/// The line owns its text plus an ordered, non-overlapping list of [`Format`]
/// ranges. All offsets are character offsets (not bytes). A line never
/// contains `\n`; line breaks are represented by the owning block holding
/// multiple lines.
///
/// Formatting is kept canonical after every mutation: ranges ordered by
/// start, no overlaps, no empty format sets, adjacent ranges with identical
/// formatting merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormattedLine {
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    formatting: Vec<Format>,
}

/// Per-character style used while recomputing format ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CharStyle {
    formats: BTreeSet<FormatType>,
    meta: BTreeMap<String, String>,
}

impl CharStyle {
    fn is_plain(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Replaces non-breaking spaces with plain spaces and drops control
/// characters (lines never carry `\n` or `\t` from pasted content).
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\u{00a0}' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect()
}

fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl FormattedLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(text: &str) -> Self {
        Self {
            text: sanitize(text),
            formatting: Vec::new(),
        }
    }

    /// A line whose entire text carries the given formats.
    pub fn formatted(text: &str, formats: impl IntoIterator<Item = FormatType>) -> Self {
        let mut line = Self::of(text);
        let len = line.len();
        if len > 0 {
            line.formatting.push(Format::new(0, len, formats));
            line.canonicalize();
        }
        line
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn formatting(&self) -> &[Format] {
        &self.formatting
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.text.chars().nth(idx)
    }

    /// Appends sanitized plain text.
    pub fn append(&mut self, text: &str) {
        self.text.push_str(&sanitize(text));
    }

    /// Appends sanitized text carrying the given formats.
    pub fn append_formatted(&mut self, text: &str, formats: impl IntoIterator<Item = FormatType>) {
        let start = self.len();
        self.text.push_str(&sanitize(text));
        let added = self.len() - start;
        if added > 0 {
            self.formatting.push(Format::new(start, added, formats));
            self.canonicalize();
        }
    }

    /// Inserts text at a character offset. Ranges starting at or after the
    /// insertion point shift right; a range spanning the insertion point
    /// grows, so typing inside a bold run stays bold.
    pub fn insert(&mut self, idx: usize, text: &str) {
        let clean = sanitize(text);
        let added = clean.chars().count();
        if added == 0 {
            return;
        }
        let at = byte_offset(&self.text, idx);
        self.text.insert_str(at, &clean);
        for fmt in &mut self.formatting {
            if fmt.index >= idx {
                fmt.index += added;
            } else if idx < fmt.end() {
                fmt.length += added;
            }
        }
    }

    /// Removes `len` characters starting at `idx`, clamped to the line end.
    pub fn remove(&mut self, idx: usize, len: usize) {
        let total = self.len();
        if idx >= total || len == 0 {
            return;
        }
        let take = len.min(total - idx);
        let mut styles = self.paint();
        styles.drain(idx..idx + take);
        let start = byte_offset(&self.text, idx);
        let end = byte_offset(&self.text, idx + take);
        self.text.replace_range(start..end, "");
        self.formatting = Self::recompose(&styles);
    }

    /// Splits the line at a character offset, returning the right portion.
    pub fn split_off(&mut self, idx: usize) -> FormattedLine {
        let total = self.len();
        let idx = idx.min(total);
        let styles = self.paint();
        let at = byte_offset(&self.text, idx);
        let right_text = self.text.split_off(at);
        let right = FormattedLine {
            text: right_text,
            formatting: Self::recompose(&styles[idx..]),
        };
        self.formatting = Self::recompose(&styles[..idx]);
        right
    }

    /// Appends another line's content, shifting its formatting to follow
    /// this line's text and merging adjacent identical runs.
    pub fn merge(&mut self, other: FormattedLine) {
        let offset = self.len();
        self.text.push_str(&other.text);
        for mut fmt in other.formatting {
            fmt.index += offset;
            self.formatting.push(fmt);
        }
        self.canonicalize();
    }

    /// Adds a format (with optional metadata) over a character range.
    pub fn apply_format(
        &mut self,
        idx: usize,
        len: usize,
        format: FormatType,
        meta: &BTreeMap<String, String>,
    ) {
        let total = self.len();
        if idx >= total || len == 0 {
            return;
        }
        let end = (idx + len).min(total);
        let mut styles = self.paint();
        for style in &mut styles[idx..end] {
            style.formats.insert(format);
            for (k, v) in meta {
                style.meta.insert(k.clone(), v.clone());
            }
        }
        self.formatting = Self::recompose(&styles);
    }

    /// Removes a format over a character range. Removing `Anchor` also drops
    /// the link metadata.
    pub fn remove_format(&mut self, idx: usize, len: usize, format: FormatType) {
        let total = self.len();
        if idx >= total || len == 0 {
            return;
        }
        let end = (idx + len).min(total);
        let mut styles = self.paint();
        for style in &mut styles[idx..end] {
            style.formats.remove(&format);
            if format == FormatType::Anchor {
                style.meta.remove(META_LINK);
            }
        }
        self.formatting = Self::recompose(&styles);
    }

    /// Removes all formatting over a character range.
    pub fn clear_format(&mut self, idx: usize, len: usize) {
        let total = self.len();
        if idx >= total || len == 0 {
            return;
        }
        let end = (idx + len).min(total);
        let mut styles = self.paint();
        for style in &mut styles[idx..end] {
            style.formats.clear();
            style.meta.clear();
        }
        self.formatting = Self::recompose(&styles);
    }

    /// Removes all formatting from the line.
    pub fn strip_formatting(&mut self) {
        self.formatting.clear();
    }

    /// Whether every character in the range carries the format. An empty or
    /// out-of-range query is `false`.
    pub fn has_format(&self, idx: usize, len: usize, format: FormatType) -> bool {
        let total = self.len();
        if len == 0 || idx >= total || idx + len > total {
            return false;
        }
        let styles = self.paint();
        styles[idx..idx + len].iter().all(|s| s.formats.contains(&format))
    }

    /// Decomposes the line into maximal uniformly formatted runs, in order.
    /// An empty line yields no segments.
    pub fn sequence(&self) -> Vec<TextSegment> {
        let styles = self.paint();
        let chars: Vec<char> = self.text.chars().collect();
        let mut segments: Vec<TextSegment> = Vec::new();
        let mut run_start = 0;
        for i in 1..=chars.len() {
            if i == chars.len() || styles[i] != styles[run_start] {
                let style = &styles[run_start];
                segments.push(TextSegment {
                    text: chars[run_start..i].iter().collect(),
                    formats: style.formats.clone(),
                    link: style.meta.get(META_LINK).cloned(),
                });
                run_start = i;
            }
        }
        segments
    }

    /// Expands the format ranges into one style per character.
    fn paint(&self) -> Vec<CharStyle> {
        let total = self.len();
        let mut styles = vec![CharStyle::default(); total];
        for fmt in &self.formatting {
            let end = fmt.end().min(total);
            for style in styles.iter_mut().take(end).skip(fmt.index.min(total)) {
                style.formats.extend(fmt.formats.iter().copied());
                for (k, v) in &fmt.meta {
                    style.meta.insert(k.clone(), v.clone());
                }
            }
        }
        styles
    }

    /// Rebuilds the canonical range list from per-character styles.
    fn recompose(styles: &[CharStyle]) -> Vec<Format> {
        let mut out: Vec<Format> = Vec::new();
        let mut i = 0;
        while i < styles.len() {
            if styles[i].is_plain() {
                i += 1;
                continue;
            }
            let mut j = i + 1;
            while j < styles.len() && styles[j] == styles[i] {
                j += 1;
            }
            out.push(Format {
                index: i,
                length: j - i,
                formats: styles[i].formats.clone(),
                meta: styles[i].meta.clone(),
            });
            i = j;
        }
        out
    }

    fn canonicalize(&mut self) {
        let styles = self.paint();
        self.formatting = Self::recompose(&styles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn of_sanitizes_control_chars_and_nbsp() {
        let line = FormattedLine::of("a\u{00a0}b\u{0007}c");
        assert_eq!(line.text(), "a bc");
    }

    #[test]
    fn insert_inside_formatted_run_extends_it() {
        let mut line = FormattedLine::formatted("Hello", [FormatType::Bold]);
        line.insert(3, "XY");
        assert_eq!(line.text(), "HelXYlo");
        assert_eq!(line.formatting().len(), 1);
        assert_eq!(line.formatting()[0].index, 0);
        assert_eq!(line.formatting()[0].length, 7);
    }

    #[test]
    fn insert_before_formatted_run_shifts_it() {
        let mut line = FormattedLine::of("abc");
        line.apply_format(1, 2, FormatType::Italic, &BTreeMap::new());
        line.insert(0, "xx");
        assert_eq!(line.text(), "xxabc");
        assert_eq!(line.formatting()[0].index, 3);
        assert_eq!(line.formatting()[0].length, 2);
    }

    #[test]
    fn remove_shrinks_covering_run() {
        let mut line = FormattedLine::formatted("Hello", [FormatType::Bold]);
        line.remove(2, 2);
        assert_eq!(line.text(), "Heo");
        assert_eq!(line.formatting().len(), 1);
        assert_eq!(line.formatting()[0].length, 3);
    }

    #[test]
    fn split_off_divides_formatting() {
        let mut line = FormattedLine::formatted("Hello", [FormatType::Bold]);
        let right = line.split_off(2);
        assert_eq!(line.text(), "He");
        assert_eq!(right.text(), "llo");
        assert_eq!(line.formatting()[0].length, 2);
        assert_eq!(right.formatting()[0].index, 0);
        assert_eq!(right.formatting()[0].length, 3);
    }

    #[test]
    fn merge_shifts_and_joins_identical_runs() {
        let mut left = FormattedLine::formatted("ab", [FormatType::Bold]);
        let right = FormattedLine::formatted("cd", [FormatType::Bold]);
        left.merge(right);
        assert_eq!(left.text(), "abcd");
        // Adjacent identical runs collapse into one.
        assert_eq!(left.formatting().len(), 1);
        assert_eq!(left.formatting()[0].length, 4);
    }

    #[test]
    fn apply_format_overlapping_runs_fragment_canonically() {
        let mut line = FormattedLine::of("abcdef");
        line.apply_format(0, 4, FormatType::Bold, &BTreeMap::new());
        line.apply_format(2, 4, FormatType::Italic, &BTreeMap::new());
        let seq = line.sequence();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[0].text, "ab");
        assert!(seq[0].formats.contains(&FormatType::Bold));
        assert_eq!(seq[1].text, "cd");
        assert!(seq[1].formats.contains(&FormatType::Bold));
        assert!(seq[1].formats.contains(&FormatType::Italic));
        assert_eq!(seq[2].text, "ef");
        assert!(!seq[2].formats.contains(&FormatType::Bold));
    }

    #[test]
    fn remove_format_leaves_other_formats_intact() {
        let mut line = FormattedLine::formatted("abcd", [FormatType::Bold, FormatType::Italic]);
        line.remove_format(0, 2, FormatType::Bold);
        assert!(!line.has_format(0, 2, FormatType::Bold));
        assert!(line.has_format(0, 4, FormatType::Italic));
        assert!(line.has_format(2, 2, FormatType::Bold));
    }

    #[test]
    fn removing_anchor_drops_link_meta() {
        let mut line = FormattedLine::of("click");
        let mut meta = BTreeMap::new();
        meta.insert(META_LINK.to_string(), "https://example.com".to_string());
        line.apply_format(0, 5, FormatType::Anchor, &meta);
        assert_eq!(
            line.sequence()[0].link.as_deref(),
            Some("https://example.com")
        );
        line.remove_format(0, 5, FormatType::Anchor);
        assert_eq!(line.formatting().len(), 0);
    }

    #[rstest]
    #[case(0, 0, false)] // empty range
    #[case(0, 5, true)]
    #[case(4, 2, false)] // runs past end
    #[case(2, 2, true)]
    fn has_format_range_checks(#[case] idx: usize, #[case] len: usize, #[case] expect: bool) {
        let line = FormattedLine::formatted("Hello", [FormatType::Bold]);
        assert_eq!(line.has_format(idx, len, FormatType::Bold), expect);
    }

    #[test]
    fn sequence_of_plain_line_is_single_segment() {
        let line = FormattedLine::of("plain");
        let seq = line.sequence();
        assert_eq!(seq, vec![TextSegment::plain("plain")]);
    }

    #[test]
    fn sequence_of_empty_line_is_empty() {
        assert!(FormattedLine::new().sequence().is_empty());
    }

    #[test]
    fn multibyte_chars_use_character_offsets() {
        let mut line = FormattedLine::of("héllo");
        line.insert(2, "XY");
        assert_eq!(line.text(), "héXYllo");
        line.remove(2, 2);
        assert_eq!(line.text(), "héllo");
    }
}
