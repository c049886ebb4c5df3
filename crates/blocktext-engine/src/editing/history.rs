use super::error::EditError;
use super::state::EditorState;
use super::transaction::Transaction;
use crate::config::EditorConfig;

/// Default maximum number of undoable transactions kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Two-stack undo/redo over inverse transactions.
///
/// The editor pushes the inverse returned by
/// [`EditorState::apply`](super::state::EditorState::apply) after every user
/// edit. Undo pops an inverse, applies it and pushes the resulting inverse
/// (the redo) onto the other stack; pushing a fresh edit discards the redo
/// branch.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// History sized by the host's [`EditorConfig::history_limit`].
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::with_limit(config.history_limit)
    }

    /// Records the inverse of an applied transaction, discarding any redo
    /// branch and the oldest entry beyond the depth limit.
    pub fn push(&mut self, inverse: Transaction) {
        self.redo_stack.clear();
        self.undo_stack.push(inverse);
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undoes the most recent edit. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self, state: &mut EditorState) -> Result<bool, EditError> {
        let Some(tr) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let redo = state.apply(&tr)?;
        self.redo_stack.push(redo);
        Ok(true)
    }

    /// Redoes the most recently undone edit. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, state: &mut EditorState) -> Result<bool, EditError> {
        let Some(tr) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let undo = state.apply(&tr)?;
        self.undo_stack.push(undo);
        Ok(true)
    }

    /// Drops both stacks, e.g. when a new document is loaded.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::selection::Selection;
    use crate::editing::step::Step;
    use crate::models::FormattedText;
    use pretty_assertions::assert_eq;

    fn insert(offset: usize, text: &str) -> Transaction {
        Transaction::new()
            .step(Step::InsertText {
                block: 0,
                offset,
                text: text.to_string(),
            })
            .set_selection(Selection::cursor(0, offset + text.chars().count()))
    }

    fn text(state: &EditorState) -> String {
        state.doc().blocks()[0].text()
    }

    #[test]
    fn undo_redo_cursor_cycle() {
        let mut state = EditorState::with_selection(
            FormattedText::plain("Hello"),
            Selection::cursor(0, 3),
        )
        .unwrap();
        let mut history = History::new();

        let inverse = state.apply(&insert(3, "XY")).unwrap();
        history.push(inverse);
        assert_eq!(text(&state), "HelXYlo");
        assert_eq!(state.selection(), Selection::cursor(0, 5));

        assert!(history.undo(&mut state).unwrap());
        assert_eq!(text(&state), "Hello");
        assert_eq!(state.selection(), Selection::cursor(0, 3));

        assert!(history.redo(&mut state).unwrap());
        assert_eq!(text(&state), "HelXYlo");
        assert_eq!(state.selection(), Selection::cursor(0, 5));
    }

    #[test]
    fn n_undos_restore_initial_document() {
        let mut state = EditorState::new(FormattedText::plain(""));
        let mut history = History::new();
        let initial = state.doc().clone();

        for (i, word) in ["a", "b", "c", "d"].iter().enumerate() {
            let inverse = state.apply(&insert(i, word)).unwrap();
            history.push(inverse);
        }
        assert_eq!(text(&state), "abcd");

        for _ in 0..4 {
            assert!(history.undo(&mut state).unwrap());
        }
        assert_eq!(state.doc(), &initial);
        assert!(!history.undo(&mut state).unwrap());

        for _ in 0..4 {
            assert!(history.redo(&mut state).unwrap());
        }
        assert_eq!(text(&state), "abcd");
        assert!(!history.redo(&mut state).unwrap());
    }

    #[test]
    fn push_clears_redo_branch() {
        let mut state = EditorState::new(FormattedText::plain(""));
        let mut history = History::new();

        let inverse = state.apply(&insert(0, "a")).unwrap();
        history.push(inverse);
        history.undo(&mut state).unwrap();
        assert!(history.can_redo());

        let inverse = state.apply(&insert(0, "z")).unwrap();
        history.push(inverse);
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_limit_discards_oldest() {
        let mut state = EditorState::new(FormattedText::plain(""));
        let mut history = History::with_limit(2);

        for (i, word) in ["a", "b", "c"].iter().enumerate() {
            let inverse = state.apply(&insert(i, word)).unwrap();
            history.push(inverse);
        }
        assert!(history.undo(&mut state).unwrap());
        assert!(history.undo(&mut state).unwrap());
        // The first edit fell off the stack.
        assert!(!history.undo(&mut state).unwrap());
        assert_eq!(text(&state), "a");
    }

    #[test]
    fn from_config_respects_the_depth_limit() {
        let config = EditorConfig {
            history_limit: 2,
            ..Default::default()
        };
        let mut state = EditorState::new(FormattedText::plain(""));
        let mut history = History::from_config(&config);

        for (i, word) in ["a", "b", "c"].iter().enumerate() {
            let inverse = state.apply(&insert(i, word)).unwrap();
            history.push(inverse);
        }
        assert!(history.undo(&mut state).unwrap());
        assert!(history.undo(&mut state).unwrap());
        assert!(!history.undo(&mut state).unwrap());
        assert_eq!(text(&state), "a");
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut state = EditorState::new(FormattedText::plain(""));
        let mut history = History::new();
        let inverse = state.apply(&insert(0, "a")).unwrap();
        history.push(inverse);
        history.undo(&mut state).unwrap();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
