//! Mapping from host input events to commands.
//!
//! The host translates DOM `beforeinput`/keyboard events into
//! [`InputEvent`]s; [`handle_input`] dispatches them and resolves the
//! boundary outcomes the way a plain keypress should (a cross-type
//! backspace joins the blocks).

use crate::config::EditorConfig;
use crate::models::FormatType;

use super::commands::{self, BoundaryReason, CommandOutcome};
use super::state::EditorState;

/// Editing intents in `beforeinput` vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    InsertText(String),
    InsertParagraph,
    InsertLineBreak,
    DeleteContentBackward,
    DeleteContentForward,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteByCut,
}

/// Dispatches an input event. Cross-type delete boundaries are resolved
/// by force-joining, so a keypress never stalls on a [`CommandOutcome::Boundary`].
pub fn handle_input(
    state: &EditorState,
    config: &EditorConfig,
    event: &InputEvent,
) -> CommandOutcome {
    let outcome = match event {
        InputEvent::InsertText(text) => commands::insert_text(state, text),
        InputEvent::InsertParagraph => commands::insert_paragraph(state, config),
        InputEvent::InsertLineBreak => commands::insert_line_break(state),
        InputEvent::DeleteContentBackward => commands::delete_backward(state),
        InputEvent::DeleteContentForward => commands::delete_forward(state),
        InputEvent::DeleteWordBackward => commands::delete_word_backward(state),
        InputEvent::DeleteWordForward => commands::delete_word_forward(state),
        InputEvent::DeleteByCut => commands::delete_selection(state),
    };
    match outcome {
        CommandOutcome::Boundary(BoundaryReason::CrossTypePrevious) => {
            commands::force_join_with_previous(state)
        }
        CommandOutcome::Boundary(BoundaryReason::CrossTypeNext) => {
            commands::force_join_with_next(state)
        }
        other => other,
    }
}

/// The format a Ctrl/Cmd+letter shortcut toggles, if any.
pub fn shortcut_format(key: char) -> Option<FormatType> {
    match key.to_ascii_lowercase() {
        'b' => Some(FormatType::Bold),
        'i' => Some(FormatType::Italic),
        'u' => Some(FormatType::Underline),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::selection::Selection;
    use crate::models::{BlockType, FormattedBlock, FormattedText};
    use pretty_assertions::assert_eq;

    fn state(blocks: Vec<FormattedBlock>, sel: Selection) -> EditorState {
        EditorState::with_selection(FormattedText::of(blocks), sel).unwrap()
    }

    fn dispatch(state: &mut EditorState, event: InputEvent) {
        let outcome = handle_input(state, &EditorConfig::default(), &event);
        let tr = outcome.transaction().expect("event should apply");
        state.apply(&tr).unwrap();
    }

    #[test]
    fn typing_inserts_text() {
        let mut st = state(
            vec![FormattedBlock::of(BlockType::Para, "Hell")],
            Selection::cursor(0, 4),
        );
        dispatch(&mut st, InputEvent::InsertText("o".to_string()));
        assert_eq!(st.doc().blocks()[0].text(), "Hello");
        assert_eq!(st.selection(), Selection::cursor(0, 5));
    }

    #[test]
    fn cross_type_backspace_joins_without_surfacing_the_boundary() {
        let mut st = state(
            vec![
                FormattedBlock::of(BlockType::H2, "Title"),
                FormattedBlock::of(BlockType::Para, "Body"),
            ],
            Selection::cursor(1, 0),
        );
        dispatch(&mut st, InputEvent::DeleteContentBackward);
        assert_eq!(st.doc().block_count(), 1);
        assert_eq!(st.doc().blocks()[0].text(), "TitleBody");
        assert_eq!(st.doc().blocks()[0].block_type(), BlockType::H2);
        assert_eq!(st.selection(), Selection::cursor(0, 5));
    }

    #[test]
    fn line_break_stays_inside_the_block() {
        let mut st = state(
            vec![FormattedBlock::of(BlockType::Para, "ab")],
            Selection::cursor(0, 1),
        );
        dispatch(&mut st, InputEvent::InsertLineBreak);
        assert_eq!(st.doc().block_count(), 1);
        assert_eq!(st.doc().blocks()[0].lines().len(), 2);
        assert_eq!(st.selection(), Selection::cursor(0, 2));
    }

    #[test]
    fn cut_deletes_the_selection() {
        let mut st = state(
            vec![FormattedBlock::of(BlockType::Para, "Hello World")],
            Selection::range(0, 5, 0, 11),
        );
        dispatch(&mut st, InputEvent::DeleteByCut);
        assert_eq!(st.doc().blocks()[0].text(), "Hello");
    }

    #[test]
    fn backspace_at_document_start_is_noop() {
        let st = state(
            vec![FormattedBlock::of(BlockType::Para, "x")],
            Selection::cursor(0, 0),
        );
        let outcome = handle_input(&st, &EditorConfig::default(), &InputEvent::DeleteContentBackward);
        assert_eq!(outcome, CommandOutcome::NoOp);
    }

    #[test]
    fn format_shortcuts() {
        assert_eq!(shortcut_format('b'), Some(FormatType::Bold));
        assert_eq!(shortcut_format('I'), Some(FormatType::Italic));
        assert_eq!(shortcut_format('u'), Some(FormatType::Underline));
        assert_eq!(shortcut_format('x'), None);
    }
}
