use serde::{Deserialize, Serialize};

use crate::models::MAX_INDENT;

/// Behavioural knobs for the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pressing Enter at the end of a heading starts a paragraph rather
    /// than another heading.
    pub paragraph_after_heading: bool,
    /// Deepest list indent commands will produce (capped at the model's
    /// [`MAX_INDENT`]).
    pub max_indent: u8,
    /// Undo history depth.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            paragraph_after_heading: true,
            max_indent: MAX_INDENT,
            history_limit: crate::editing::history::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EditorConfig {
    pub fn max_indent(&self) -> u8 {
        self.max_indent.min(MAX_INDENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_behaviour() {
        let config = EditorConfig::default();
        assert!(config.paragraph_after_heading);
        assert_eq!(config.max_indent(), MAX_INDENT);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn max_indent_is_capped_by_the_model() {
        let config = EditorConfig {
            max_indent: 99,
            ..Default::default()
        };
        assert_eq!(config.max_indent(), MAX_INDENT);
    }
}
