//! Read-only render snapshot of a document.
//!
//! A [`Snapshot`] is what the view layer consumes: every block resolved to
//! its tag, indent and (for ordered lists) its label, every line broken
//! into styled spans. Ordered-list labels are computed here, in a single
//! pass over the document, so numbering is a pure function of block order
//! and never stored on the blocks themselves.

use serde::Serialize;

use crate::models::{BlockType, FormattedBlock, FormattedText, FormatType, MAX_INDENT};

/// A run of characters sharing one style, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderSpan {
    pub text: String,
    /// CSS classes for the span's formats, in a fixed order.
    pub classes: Vec<&'static str>,
    /// Link target when the span is inside an anchor.
    pub link: Option<String>,
}

/// One block resolved for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderBlock {
    /// HTML tag the block renders as.
    pub tag: &'static str,
    pub block_type: BlockType,
    pub indent: u8,
    /// Ordered-list label ("1", "a", "i") for `Olist` blocks; bare value,
    /// punctuation is the renderer's concern.
    pub list_index: Option<String>,
    /// Lines of styled spans; empty for atomic blocks.
    pub lines: Vec<Vec<RenderSpan>>,
    /// Raw content of atomic blocks.
    pub content: Option<String>,
}

/// The whole document resolved for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub blocks: Vec<RenderBlock>,
}

impl Snapshot {
    /// Renders the document into a snapshot. Deterministic: the same
    /// document always yields the same snapshot.
    pub fn of(doc: &FormattedText) -> Self {
        let mut counters = ListCounters::new();
        let blocks = doc
            .blocks()
            .iter()
            .map(|block| render_block(block, counters.next(block)))
            .collect();
        Self { blocks }
    }

    /// Serializes the snapshot as an HTML fragment, mainly for export and
    /// tests; interactive hosts bind the structured snapshot directly.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            out.push('<');
            out.push_str(block.tag);
            if block.indent > 0 {
                out.push_str(&format!(" data-indent=\"{}\"", block.indent));
            }
            if let Some(label) = &block.list_index {
                out.push_str(" data-label=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(label));
                out.push('"');
            }
            out.push('>');
            if let Some(content) = &block.content {
                out.push_str(&html_escape::encode_text(content));
            }
            for (i, line) in block.lines.iter().enumerate() {
                if i > 0 {
                    out.push_str("<br>");
                }
                for span in line {
                    push_span(&mut out, span);
                }
            }
            out.push_str("</");
            out.push_str(block.tag);
            out.push('>');
        }
        out
    }
}

fn push_span(out: &mut String, span: &RenderSpan) {
    let escaped = html_escape::encode_text(&span.text);
    if span.classes.is_empty() && span.link.is_none() {
        out.push_str(&escaped);
        return;
    }
    let tag = if span.link.is_some() { "a" } else { "span" };
    out.push('<');
    out.push_str(tag);
    if let Some(href) = &span.link {
        out.push_str(" href=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(href));
        out.push('"');
    }
    if !span.classes.is_empty() {
        out.push_str(" class=\"");
        out.push_str(&span.classes.join(" "));
        out.push('"');
    }
    out.push('>');
    out.push_str(&escaped);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_block(block: &FormattedBlock, list_index: Option<String>) -> RenderBlock {
    let tag = match block.block_type() {
        BlockType::Para => "p",
        BlockType::H1 => "h1",
        BlockType::H2 => "h2",
        BlockType::H3 => "h3",
        BlockType::Nlist | BlockType::Olist => "li",
        BlockType::Eqn => "div",
    };
    let (lines, content) = if block.block_type().is_atomic() {
        (Vec::new(), Some(block.content().unwrap_or("").to_string()))
    } else {
        let lines = block
            .lines()
            .iter()
            .map(|line| {
                line.sequence()
                    .into_iter()
                    .map(|seg| RenderSpan {
                        classes: seg.formats.iter().filter_map(|f| format_class(*f)).collect(),
                        link: seg.link,
                        text: seg.text,
                    })
                    .collect()
            })
            .collect();
        (lines, None)
    };
    RenderBlock {
        tag,
        block_type: block.block_type(),
        indent: block.indent(),
        list_index,
        lines,
        content,
    }
}

fn format_class(format: FormatType) -> Option<&'static str> {
    match format {
        FormatType::Bold => Some("fmt_bold"),
        FormatType::Italic => Some("fmt_italic"),
        FormatType::Underline => Some("fmt_underline"),
        FormatType::Strike => Some("fmt_strike"),
        FormatType::Subscript => Some("fmt_subscript"),
        FormatType::Superscript => Some("fmt_superscript"),
        FormatType::Code => Some("fmt_code"),
        FormatType::Highlight => Some("fmt_highlight"),
        // Anchors render as the span's link, not a class.
        FormatType::Anchor => None,
    }
}

const COUNTER_DEPTH: usize = MAX_INDENT as usize + 1;

/// Per-pass ordered-list numbering state.
///
/// A counter per indent level; any non-ordered-list block ends the run and
/// resets all counters, and stepping back to a shallower indent resets the
/// deeper ones, so a list resumed after a nested stretch keeps counting.
struct ListCounters {
    counters: [u32; COUNTER_DEPTH],
    in_list: bool,
    prev_indent: usize,
}

impl ListCounters {
    fn new() -> Self {
        Self {
            counters: [0; COUNTER_DEPTH],
            in_list: false,
            prev_indent: 0,
        }
    }

    fn next(&mut self, block: &FormattedBlock) -> Option<String> {
        if block.block_type() != BlockType::Olist {
            self.counters = [0; COUNTER_DEPTH];
            self.in_list = false;
            return None;
        }
        let indent = (block.indent() as usize).min(COUNTER_DEPTH - 1);
        if self.in_list && indent < self.prev_indent {
            for deeper in indent + 1..COUNTER_DEPTH {
                self.counters[deeper] = 0;
            }
        }
        self.counters[indent] += 1;
        self.in_list = true;
        self.prev_indent = indent;
        let n = self.counters[indent];
        // Bare label value; the renderer adds the trailing punctuation.
        Some(match indent % 3 {
            0 => n.to_string(),
            1 => to_letters(n),
            _ => to_roman(n),
        })
    }
}

/// 1 -> "a", 26 -> "z", 27 -> "aa" (bijective base 26).
fn to_letters(mut n: u32) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
    }
    out.iter().rev().collect()
}

/// Lowercase roman numerals with the standard subtractive forms.
fn to_roman(mut n: u32) -> String {
    const PAIRS: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, digits) in PAIRS {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}
