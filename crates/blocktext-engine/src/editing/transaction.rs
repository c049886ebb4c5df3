use super::error::EditError;
use super::selection::Selection;
use super::step::{Mapping, Step, StepResult};
use crate::models::FormattedText;

/// An ordered group of steps applied atomically, plus an optional target
/// selection for the state layer to adopt after application.
///
/// Built fluently:
///
/// ```
/// use blocktext_engine::editing::{Step, Transaction};
/// use blocktext_engine::models::FormattedText;
///
/// let mut doc = FormattedText::plain("Hello");
/// let result = Transaction::new()
///     .step(Step::InsertText { block: 0, offset: 5, text: " World".into() })
///     .apply(&mut doc)
///     .unwrap();
/// assert_eq!(doc.blocks()[0].text(), "Hello World");
/// result.inverse().apply(&mut doc).unwrap();
/// assert_eq!(doc.blocks()[0].text(), "Hello");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Selection>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step. Each step addresses the document as left by the
    /// steps before it.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Sets the selection the editor state should adopt instead of mapping
    /// the current selection through the step maps.
    pub fn set_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Whether the transaction carries no steps (it may still carry a
    /// selection, e.g. select-all).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Applies all steps in order, atomically.
    ///
    /// Steps run against a working copy; only if every step succeeds is the
    /// result committed back into `doc`, so a failing transaction leaves the
    /// document exactly as it was.
    pub fn apply(&self, doc: &mut FormattedText) -> Result<TransactionResult, EditError> {
        let mut working = doc.clone();
        let mut results: Vec<StepResult> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            results.push(step.apply(&mut working)?);
        }
        let mut mapping = Mapping::new();
        for result in &results {
            mapping.extend(result.maps.iter().copied());
        }
        // Inverse steps in reverse order: undoing replays LIFO.
        let mut inverse_steps = Vec::new();
        for result in results.into_iter().rev() {
            inverse_steps.extend(result.inverse);
        }
        *doc = working;
        Ok(TransactionResult {
            inverse: Transaction {
                steps: inverse_steps,
                selection: None,
            },
            mapping,
        })
    }
}

/// The product of applying a transaction: the inverse transaction and the
/// composed position mapping.
#[derive(Debug, Clone)]
pub struct TransactionResult {
    inverse: Transaction,
    mapping: Mapping,
}

impl TransactionResult {
    pub fn inverse(&self) -> &Transaction {
        &self.inverse
    }

    pub fn into_inverse(self) -> Transaction {
        self.inverse
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }
}
