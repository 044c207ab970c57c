use std::fmt;

use crate::error::{BackendError, col_to_a1};

/// Typed result of evaluating a cell.
///
/// Only `Number` carries a usable value for the orchestrator; every other
/// category is reported so callers can decide their own failure policy.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Number(f64),
    Boolean(bool),
    Text(String),
    Blank,
    /// Syntax was accepted but the engine cannot evaluate a construct.
    Unsupported(String),
    /// Any other engine error code (`#NAME?`, `#DIV/0!`, ...).
    Error(String),
    /// The cell holds a formula that was never computed.
    Unresolved,
}

impl EvalOutcome {
    /// The value as a finite number, if it is one.
    pub fn as_finite_number(&self) -> Option<f64> {
        match self {
            EvalOutcome::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            EvalOutcome::Number(_) => "number",
            EvalOutcome::Boolean(_) => "boolean",
            EvalOutcome::Text(_) => "text",
            EvalOutcome::Blank => "blank",
            EvalOutcome::Unsupported(_) => "unsupported",
            EvalOutcome::Error(_) => "error",
            EvalOutcome::Unresolved => "unresolved",
        }
    }
}

/// One name bound to a cell during a run, with the raw definition text the
/// name documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBinding {
    pub name: String,
    pub sheet: String,
    pub row: u32,
    pub col: u32,
    pub text: String,
}

impl fmt::Display for NamedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{name: {}, cell: '{}'!{}{}, text: {}}}",
            self.name,
            self.sheet,
            col_to_a1(self.col),
            self.row,
            self.text
        )
    }
}

/// The grid/formula engine contract the orchestrator drives.
///
/// One implementor instance backs exactly one run; the orchestrator owns it
/// for the run's lifetime and releases it with [`GridBackend::close`] on
/// every exit path. Rows and cells are allocate-once: re-creating an
/// occupied slot is an error, never an overwrite.
pub trait GridBackend {
    /// Create the sheet after validating its name, or reuse it if it
    /// already exists in this instance.
    fn ensure_sheet(&mut self, name: &str) -> Result<(), BackendError>;

    /// Allocate a fresh row. Fails with [`BackendError::RowExists`] if the
    /// row was already created in this instance.
    fn create_row(&mut self, sheet: &str, row: u32) -> Result<(), BackendError>;

    /// Allocate a fresh cell within an existing row. Fails if the cell is
    /// occupied or the column exceeds the backend's bound.
    fn create_cell(&mut self, sheet: &str, row: u32, col: u32) -> Result<(), BackendError>;

    /// Write a numeric value into a cell. No formula text is recorded.
    fn set_number(&mut self, sheet: &str, row: u32, col: u32, value: f64)
    -> Result<(), BackendError>;

    /// Write formula text into a cell. The engine parses it eagerly and
    /// fails with [`BackendError::FormulaSyntax`] on rejection.
    fn set_formula(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        formula: &str,
    ) -> Result<(), BackendError>;

    /// Create a named reference to a single cell, carrying `doc` as
    /// free-form documentation. Fails with [`BackendError::Name`] when the
    /// name duplicates an existing one, violates the engine's identifier
    /// rules, or the cell reference itself cannot be built.
    fn define_name(
        &mut self,
        name: &str,
        sheet: &str,
        row: u32,
        col: u32,
        doc: &str,
    ) -> Result<(), BackendError>;

    /// Compute the cell and report the typed outcome.
    fn evaluate(&mut self, sheet: &str, row: u32, col: u32) -> Result<EvalOutcome, BackendError>;

    /// Whether the engine can evaluate the named function.
    fn supports_function(&self, name: &str) -> bool;

    /// Release the instance and discard any transient storage it created.
    fn close(self) -> Result<(), BackendError>
    where
        Self: Sized;
}
