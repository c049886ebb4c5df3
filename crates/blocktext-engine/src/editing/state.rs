use super::error::EditError;
use super::selection::Selection;
use super::transaction::Transaction;
use crate::models::FormattedText;

/// The editor's live state: the current document and selection.
///
/// There is exactly one writer (the owning editor component); all document
/// mutation funnels through [`apply`](Self::apply).
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    doc: FormattedText,
    selection: Selection,
}

impl EditorState {
    /// State with the cursor at the start of the document.
    pub fn new(doc: FormattedText) -> Self {
        Self {
            doc,
            selection: Selection::cursor(0, 0),
        }
    }

    /// State with an explicit selection, validated against the document.
    pub fn with_selection(doc: FormattedText, selection: Selection) -> Result<Self, EditError> {
        selection.validate(&doc)?;
        Ok(Self { doc, selection })
    }

    pub fn doc(&self) -> &FormattedText {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Accepts a host-reported selection if it is in range; an out-of-range
    /// selection is rejected and the current selection kept.
    pub fn try_set_selection(&mut self, selection: Selection) -> Result<(), EditError> {
        selection.validate(&self.doc)?;
        self.selection = selection;
        Ok(())
    }

    /// Applies a transaction, updating the document and selection in place,
    /// and returns the inverse transaction ready for the history stack.
    ///
    /// The selection becomes the transaction's target selection when set,
    /// otherwise the current selection mapped through the step maps. The
    /// inverse carries the pre-apply selection so undo restores the cursor.
    pub fn apply(&mut self, tr: &Transaction) -> Result<Transaction, EditError> {
        let before = self.selection;
        let old_doc = self.doc.clone();
        let result = tr.apply(&mut self.doc)?;
        self.selection = match tr.selection() {
            Some(sel) => sel,
            None => before.map(result.mapping(), &old_doc, &self.doc),
        };
        Ok(result.into_inverse().set_selection(before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::step::Step;
    use pretty_assertions::assert_eq;

    fn state(text: &str, sel: Selection) -> EditorState {
        EditorState::with_selection(FormattedText::plain(text), sel).unwrap()
    }

    #[test]
    fn explicit_target_selection_wins() {
        let mut st = state("Hello", Selection::cursor(0, 0));
        let tr = Transaction::new()
            .step(Step::InsertText {
                block: 0,
                offset: 0,
                text: "XY".to_string(),
            })
            .set_selection(Selection::cursor(0, 2));
        st.apply(&tr).unwrap();
        assert_eq!(st.selection(), Selection::cursor(0, 2));
    }

    #[test]
    fn selection_maps_through_insertion_before_cursor() {
        let mut st = state("Hello", Selection::cursor(0, 4));
        let tr = Transaction::new().step(Step::InsertText {
            block: 0,
            offset: 1,
            text: "XY".to_string(),
        });
        st.apply(&tr).unwrap();
        assert_eq!(st.selection(), Selection::cursor(0, 6));
    }

    #[test]
    fn selection_unmoved_by_insertion_after_cursor() {
        let mut st = state("Hello", Selection::cursor(0, 1));
        let tr = Transaction::new().step(Step::InsertText {
            block: 0,
            offset: 3,
            text: "XY".to_string(),
        });
        st.apply(&tr).unwrap();
        assert_eq!(st.selection(), Selection::cursor(0, 1));
    }

    #[test]
    fn selection_inside_deleted_range_collapses_to_its_start() {
        let mut st = state("Hello World", Selection::cursor(0, 7));
        let tr = Transaction::new().step(Step::DeleteText {
            block: 0,
            offset: 5,
            length: 4,
        });
        st.apply(&tr).unwrap();
        assert_eq!(st.selection(), Selection::cursor(0, 5));
    }

    #[test]
    fn selection_tracks_content_into_split_off_block() {
        let mut st = state("Hello World", Selection::cursor(0, 8));
        let tr = Transaction::new().step(Step::SplitBlock {
            block: 0,
            offset: 5,
        });
        st.apply(&tr).unwrap();
        // "Wor|ld" is now in block 1 at offset 3.
        assert_eq!(st.selection(), Selection::cursor(1, 3));
    }

    #[test]
    fn inverse_carries_pre_apply_selection() {
        let mut st = state("Hello", Selection::cursor(0, 3));
        let tr = Transaction::new()
            .step(Step::InsertText {
                block: 0,
                offset: 3,
                text: "XY".to_string(),
            })
            .set_selection(Selection::cursor(0, 5));
        let inverse = st.apply(&tr).unwrap();
        assert_eq!(inverse.selection(), Some(Selection::cursor(0, 3)));
    }

    #[test]
    fn failed_transaction_changes_nothing() {
        let mut st = state("Hello", Selection::cursor(0, 2));
        let before = st.clone();
        let tr = Transaction::new().step(Step::DeleteBlock { index: 5 });
        assert!(st.apply(&tr).is_err());
        assert_eq!(st, before);
    }

    #[test]
    fn out_of_range_host_selection_is_rejected() {
        let mut st = state("Hello", Selection::cursor(0, 2));
        let err = st.try_set_selection(Selection::cursor(3, 0)).unwrap_err();
        assert!(matches!(err, EditError::InvalidSelection { .. }));
        assert_eq!(st.selection(), Selection::cursor(0, 2));
    }
}
