use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metadata key carrying the target of an [`FormatType::Anchor`] run.
pub const META_LINK: &str = "link";

/// Inline formatting applied to a run of characters within a line.
///
/// `Anchor` is the link format; it carries its target in the owning
/// [`Format`]'s metadata under [`META_LINK`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatType {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Code,
    Highlight,
    Anchor,
}

/// A contiguous formatted range within a line.
///
/// Ranges are expressed in character offsets relative to the line start.
/// A line's formatting is kept canonical: ranges are ordered, non-overlapping
/// and non-empty, and adjacent ranges with identical formatting are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Format {
    pub index: usize,
    pub length: usize,
    pub formats: BTreeSet<FormatType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl Format {
    pub fn new(index: usize, length: usize, formats: impl IntoIterator<Item = FormatType>) -> Self {
        Self {
            index,
            length,
            formats: formats.into_iter().collect(),
            meta: BTreeMap::new(),
        }
    }

    /// A link run over the given range.
    pub fn link(index: usize, length: usize, href: &str) -> Self {
        let mut fmt = Self::new(index, length, [FormatType::Anchor]);
        fmt.meta.insert(META_LINK.to_string(), href.to_string());
        fmt
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    pub fn has(&self, ty: FormatType) -> bool {
        self.formats.contains(&ty)
    }
}

/// A rendered run of uniformly formatted text, produced by
/// [`FormattedLine::sequence`](super::FormattedLine::sequence).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub formats: BTreeSet<FormatType>,
    pub link: Option<String>,
}

impl TextSegment {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            formats: BTreeSet::new(),
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn link_format_carries_target_in_meta() {
        let fmt = Format::link(2, 5, "https://example.com");
        assert!(fmt.has(FormatType::Anchor));
        assert_eq!(
            fmt.meta.get(META_LINK).map(String::as_str),
            Some("https://example.com")
        );
        assert_eq!(fmt.end(), 7);
    }

    #[test]
    fn format_types_order_deterministically() {
        let fmt = Format::new(0, 1, [FormatType::Italic, FormatType::Bold]);
        let collected: Vec<_> = fmt.formats.iter().copied().collect();
        assert_eq!(collected, vec![FormatType::Bold, FormatType::Italic]);
    }
}
