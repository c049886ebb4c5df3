//! Document value types: text, blocks, lines and inline formatting.

pub mod block;
pub mod format;
pub mod line;
pub mod text;

pub use block::{BlockType, FormattedBlock, MAX_INDENT};
pub use format::{Format, FormatType, META_LINK, TextSegment};
pub use line::FormattedLine;
pub use text::FormattedText;
