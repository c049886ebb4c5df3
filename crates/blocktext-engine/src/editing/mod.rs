/*!
Transaction-based editing over the block document model.

Layered bottom-up:

- [`step`]: the primitive, invertible document mutations and the position
  maps they emit
- [`transaction`]: atomic groups of steps with a composed mapping and a
  ready-made inverse
- [`state`]: the live document + selection pair all mutation funnels
  through
- [`history`]: two-stack undo/redo over inverse transactions
- [`commands`]: intent-level editing operations (what a toolbar button or
  keypress means)
- [`input`]: dispatch from host input events to commands
- [`snapshot`]: the read-only render tree the view consumes

Hosts drive the engine by turning user input into [`commands`] (directly
or via [`input::handle_input`]), applying the resulting transactions with
[`EditorState::apply`], pushing the returned inverses onto a [`History`],
and re-rendering from [`Snapshot::of`].
*/

pub mod commands;
pub mod error;
pub mod history;
pub mod input;
pub mod position;
pub mod selection;
pub mod snapshot;
pub mod state;
pub mod step;
pub mod transaction;

pub use commands::{BoundaryReason, CommandOutcome};
pub use error::EditError;
pub use history::History;
pub use input::InputEvent;
pub use selection::Selection;
pub use snapshot::{RenderBlock, RenderSpan, Snapshot};
pub use state::EditorState;
pub use step::{Mapping, Step, StepMap};
pub use transaction::{Transaction, TransactionResult};
