use paybatch_backend::{BackendError, EvalOutcome, GridBackend, NamedBinding};
use thiserror::Error;
use tracing::trace;

use crate::definition::{Definition, parse_finite};
use crate::error::BatchError;
use crate::slot::Slot;

/// Per-definition failure categories that validate mode downgrades to
/// `false`. Everything else a binding step can produce is fatal and
/// travels as [`BatchError`].
#[derive(Debug, Error)]
pub enum BindFailure {
    #[error("value {text:?} does not parse as a finite number")]
    InvalidConstant { text: String },

    #[error("{0}")]
    NameConflict(BackendError),

    #[error("{0}")]
    Syntax(BackendError),

    #[error("{0}")]
    Unsupported(String),

    #[error("result is {category}, not a finite number")]
    NonNumeric { category: &'static str },
}

/// Result of binding one definition.
#[derive(Debug)]
pub enum BindOutcome {
    Value(f64),
    Rejected(BindFailure),
}

/// Binds definitions into backend slots: name first, then row, cell and
/// content, one row per definition. Records every created
/// [`NamedBinding`] for end-of-phase reporting.
pub struct Registrar {
    sheet: String,
    bindings: Vec<NamedBinding>,
}

impl Registrar {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            bindings: Vec::new(),
        }
    }

    /// Names bound so far, in binding order.
    pub fn bindings(&self) -> &[NamedBinding] {
        &self.bindings
    }

    /// Bind a constant: define the name, parse the value, then write it
    /// into a fresh cell as a plain number. No formula text reaches the
    /// backend on this path.
    pub fn bind_constant<B: GridBackend>(
        &mut self,
        backend: &mut B,
        slot: Slot,
        def: &Definition,
    ) -> Result<BindOutcome, BatchError> {
        match backend.define_name(&def.name, &self.sheet, slot.row, slot.col, &def.text) {
            Ok(()) => self.record(def, slot),
            Err(e @ BackendError::Name { .. }) => {
                return Ok(BindOutcome::Rejected(BindFailure::NameConflict(e)));
            }
            Err(other) => return Err(BatchError::Backend(other)),
        }

        let Some(value) = parse_finite(&def.text) else {
            return Ok(BindOutcome::Rejected(BindFailure::InvalidConstant {
                text: def.text.clone(),
            }));
        };

        self.allocate(backend, slot, &def.name)?;
        backend
            .set_number(&self.sheet, slot.row, slot.col, value)
            .map_err(BatchError::Backend)?;
        Ok(BindOutcome::Value(value))
    }

    /// Bind a formula: define the name, allocate the slot, hand the raw
    /// text to the backend, then evaluate the cell.
    pub fn bind_formula<B: GridBackend>(
        &mut self,
        backend: &mut B,
        slot: Slot,
        def: &Definition,
    ) -> Result<BindOutcome, BatchError> {
        match backend.define_name(&def.name, &self.sheet, slot.row, slot.col, &def.text) {
            Ok(()) => self.record(def, slot),
            Err(e @ BackendError::Name { .. }) => {
                return Ok(BindOutcome::Rejected(BindFailure::NameConflict(e)));
            }
            Err(other) => return Err(BatchError::Backend(other)),
        }

        self.allocate(backend, slot, &def.name)?;

        match backend.set_formula(&self.sheet, slot.row, slot.col, &def.text) {
            Ok(()) => {}
            Err(e @ BackendError::FormulaSyntax { .. }) => {
                return Ok(BindOutcome::Rejected(BindFailure::Syntax(e)));
            }
            Err(other) => return Err(BatchError::Backend(other)),
        }

        let outcome = backend
            .evaluate(&self.sheet, slot.row, slot.col)
            .map_err(BatchError::Backend)?;
        trace!(name = %def.name, category = outcome.category(), "cell evaluated");

        Ok(match outcome {
            EvalOutcome::Number(n) if n.is_finite() => BindOutcome::Value(n),
            EvalOutcome::Number(_) => BindOutcome::Rejected(BindFailure::NonNumeric {
                category: "non-finite number",
            }),
            EvalOutcome::Unsupported(message) => {
                BindOutcome::Rejected(BindFailure::Unsupported(message))
            }
            other => BindOutcome::Rejected(BindFailure::NonNumeric {
                category: other.category(),
            }),
        })
    }

    fn record(&mut self, def: &Definition, slot: Slot) {
        self.bindings.push(NamedBinding {
            name: def.name.clone(),
            sheet: self.sheet.clone(),
            row: slot.row,
            col: slot.col,
            text: def.text.clone(),
        });
    }

    /// Row first, then cell. Occupancy failures are invariant violations:
    /// the allocator never hands out a row twice.
    fn allocate<B: GridBackend>(
        &self,
        backend: &mut B,
        slot: Slot,
        name: &str,
    ) -> Result<(), BatchError> {
        if let Err(e) = backend.create_row(&self.sheet, slot.row) {
            return Err(Self::slot_error(name, e));
        }
        if let Err(e) = backend.create_cell(&self.sheet, slot.row, slot.col) {
            return Err(Self::slot_error(name, e));
        }
        Ok(())
    }

    fn slot_error(name: &str, source: BackendError) -> BatchError {
        match source {
            e @ (BackendError::RowExists { .. }
            | BackendError::CellExists { .. }
            | BackendError::ColumnOutOfBounds { .. }) => BatchError::SlotConflict {
                name: name.to_string(),
                source: e,
            },
            other => BatchError::Backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use paybatch_backend::testing::ScriptedGrid;

    use super::*;

    fn slot(row: u32) -> Slot {
        Slot { row, col: 1 }
    }

    #[test]
    fn constant_binds_and_returns_its_value() {
        let mut grid = ScriptedGrid::new();
        grid.ensure_sheet("S").unwrap();
        let mut registrar = Registrar::new("S");
        let outcome = registrar
            .bind_constant(&mut grid, slot(1), &Definition::new("CTC", "50000"))
            .unwrap();
        assert!(matches!(outcome, BindOutcome::Value(v) if v == 50_000.0));
        assert_eq!(registrar.bindings().len(), 1);
    }

    #[test]
    fn colliding_name_is_rejected_without_corrupting_earlier_bindings() {
        let mut grid = ScriptedGrid::new();
        grid.ensure_sheet("S").unwrap();
        let mut registrar = Registrar::new("S");

        let first = registrar
            .bind_constant(&mut grid, slot(1), &Definition::new("CTC", "50000"))
            .unwrap();
        assert!(matches!(first, BindOutcome::Value(_)));

        let second = registrar
            .bind_constant(&mut grid, slot(2), &Definition::new("CTC", "60000"))
            .unwrap();
        assert!(matches!(
            second,
            BindOutcome::Rejected(BindFailure::NameConflict(_))
        ));

        // The first binding is still the only one on record.
        assert_eq!(registrar.bindings().len(), 1);
        assert_eq!(registrar.bindings()[0].text, "50000");
    }

    #[test]
    fn unparsable_constant_is_rejected_after_name_creation() {
        let mut grid = ScriptedGrid::new();
        grid.ensure_sheet("S").unwrap();
        let mut registrar = Registrar::new("S");
        let outcome = registrar
            .bind_constant(&mut grid, slot(1), &Definition::new("X", "NaN"))
            .unwrap();
        assert!(matches!(
            outcome,
            BindOutcome::Rejected(BindFailure::InvalidConstant { .. })
        ));
        // The name itself was created before the parse failed.
        assert_eq!(registrar.bindings().len(), 1);
    }

    #[test]
    fn rejected_formula_syntax_is_recoverable() {
        let mut grid = ScriptedGrid::new().with_rejected_formula("((");
        grid.ensure_sheet("S").unwrap();
        let mut registrar = Registrar::new("S");
        let outcome = registrar
            .bind_formula(&mut grid, slot(1), &Definition::new("X", "ROUND(("))
            .unwrap();
        assert!(matches!(
            outcome,
            BindOutcome::Rejected(BindFailure::Syntax(_))
        ));
    }

    #[test]
    fn non_numeric_outcome_is_recoverable() {
        let mut grid = ScriptedGrid::new().with_outcome("X", EvalOutcome::Boolean(true));
        grid.ensure_sheet("S").unwrap();
        let mut registrar = Registrar::new("S");
        let outcome = registrar
            .bind_formula(&mut grid, slot(1), &Definition::new("X", "1 > 0"))
            .unwrap();
        assert!(matches!(
            outcome,
            BindOutcome::Rejected(BindFailure::NonNumeric { category: "boolean" })
        ));
    }

    #[test]
    fn occupied_slot_is_fatal() {
        let mut grid = ScriptedGrid::new().with_conflicting_row(1);
        grid.ensure_sheet("S").unwrap();
        let mut registrar = Registrar::new("S");
        let err = registrar
            .bind_constant(&mut grid, slot(1), &Definition::new("CTC", "50000"))
            .unwrap_err();
        assert!(matches!(err, BatchError::SlotConflict { .. }));
    }
}
