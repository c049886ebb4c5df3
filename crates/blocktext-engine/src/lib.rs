/*!
Core engine for a block-structured rich-text editor.

The engine owns the document model and all editing logic; it has no UI
and no DOM. A host (web component, desktop shell, test harness) feeds it
input events or commands, applies the transactions it produces, and
renders the snapshots it emits.

# Architecture

```text
host input ──► editing::commands ──► Transaction ──► EditorState::apply
                                                          │
                     editing::History ◄── inverse ────────┤
                                                          ▼
                     host render ◄── editing::Snapshot::of(doc)
```

- [`models`]: the persistent document model (`FormattedText` down to
  `Format` runs), serializable with serde
- [`editing`]: steps, transactions, state, history, commands, input
  dispatch and render snapshots
- [`config`]: behavioural knobs for the command layer

Every mutation is an invertible [`editing::Step`]; applying a
[`editing::Transaction`] yields the inverse transaction, which is the
entire undo system. Documents are value types: cheap to clone, compared
structurally, hashed for dirty checks.
*/

pub mod config;
pub mod editing;
pub mod models;

pub use config::EditorConfig;
pub use editing::{
    CommandOutcome, EditError, EditorState, History, InputEvent, Selection, Snapshot, Step,
    Transaction,
};
pub use models::{BlockType, Format, FormatType, FormattedBlock, FormattedLine, FormattedText};
