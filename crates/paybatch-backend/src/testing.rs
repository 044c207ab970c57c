//! Lightweight scriptable grid for unit tests.
//!
//! `ScriptedGrid` honors the allocate-once slot rules and the name
//! uniqueness rules of the real contract, but does not evaluate anything:
//! outcomes are scripted per definition name with builder methods.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::BackendError;
use crate::naming::validate_sheet_name;
use crate::traits::{EvalOutcome, GridBackend};

#[derive(Default)]
pub struct ScriptedGrid {
    sheets: FxHashSet<String>,
    rows: FxHashSet<(String, u32)>,
    cells: FxHashSet<(String, u32, u32)>,
    names: FxHashSet<String>,
    bound_at: FxHashMap<(String, u32, u32), String>,
    outcomes: FxHashMap<String, EvalOutcome>,
    reject_names: FxHashSet<String>,
    reject_formulas_containing: Vec<String>,
    fail_evaluate_for: FxHashSet<String>,
    fail_row: Option<u32>,
    missing_functions: FxHashSet<String>,
    closed: Option<Arc<AtomicBool>>,
}

impl ScriptedGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome returned when the cell bound to `name` is evaluated.
    /// Unscripted names evaluate to `Number(1.0)`.
    pub fn with_outcome<S: Into<String>>(mut self, name: S, outcome: EvalOutcome) -> Self {
        self.outcomes.insert(name.into(), outcome);
        self
    }

    /// Reject `define_name` for this name, as a duplicate would be.
    pub fn with_rejected_name<S: Into<String>>(mut self, name: S) -> Self {
        self.reject_names.insert(name.into());
        self
    }

    /// Reject any formula whose text contains `fragment`.
    pub fn with_rejected_formula<S: Into<String>>(mut self, fragment: S) -> Self {
        self.reject_formulas_containing.push(fragment.into());
        self
    }

    /// Fail evaluation of the cell bound to `name` with an engine error.
    pub fn with_failing_evaluation<S: Into<String>>(mut self, name: S) -> Self {
        self.fail_evaluate_for.insert(name.into());
        self
    }

    /// Simulate a slot conflict: `create_row` fails for this row index.
    pub fn with_conflicting_row(mut self, row: u32) -> Self {
        self.fail_row = Some(row);
        self
    }

    /// Report this function as unsupported.
    pub fn without_function<S: Into<String>>(mut self, name: S) -> Self {
        let name: String = name.into();
        self.missing_functions.insert(name.to_ascii_uppercase());
        self
    }

    /// Flag set to `true` when the grid is closed, observable after the
    /// grid has been consumed.
    pub fn with_close_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.closed = Some(flag);
        self
    }
}

impl GridBackend for ScriptedGrid {
    fn ensure_sheet(&mut self, name: &str) -> Result<(), BackendError> {
        if self.sheets.contains(name) {
            return Ok(());
        }
        validate_sheet_name(name)?;
        self.sheets.insert(name.to_string());
        Ok(())
    }

    fn create_row(&mut self, sheet: &str, row: u32) -> Result<(), BackendError> {
        if self.fail_row == Some(row) || !self.rows.insert((sheet.to_string(), row)) {
            return Err(BackendError::RowExists {
                sheet: sheet.to_string(),
                row,
            });
        }
        Ok(())
    }

    fn create_cell(&mut self, sheet: &str, row: u32, col: u32) -> Result<(), BackendError> {
        if !self.cells.insert((sheet.to_string(), row, col)) {
            return Err(BackendError::CellExists {
                sheet: sheet.to_string(),
                row,
                col,
            });
        }
        Ok(())
    }

    fn set_number(
        &mut self,
        _sheet: &str,
        _row: u32,
        _col: u32,
        _value: f64,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_formula(
        &mut self,
        _sheet: &str,
        _row: u32,
        _col: u32,
        formula: &str,
    ) -> Result<(), BackendError> {
        for fragment in &self.reject_formulas_containing {
            if formula.contains(fragment.as_str()) {
                return Err(BackendError::FormulaSyntax {
                    message: format!("scripted rejection: formula contains {fragment:?}"),
                });
            }
        }
        Ok(())
    }

    fn define_name(
        &mut self,
        name: &str,
        sheet: &str,
        row: u32,
        col: u32,
        _doc: &str,
    ) -> Result<(), BackendError> {
        if self.reject_names.contains(name) || !self.names.insert(name.to_string()) {
            return Err(BackendError::Name {
                name: name.to_string(),
                message: "name already exists".to_string(),
            });
        }
        self.bound_at
            .insert((sheet.to_string(), row, col), name.to_string());
        Ok(())
    }

    fn evaluate(&mut self, sheet: &str, row: u32, col: u32) -> Result<EvalOutcome, BackendError> {
        let Some(name) = self.bound_at.get(&(sheet.to_string(), row, col)) else {
            return Ok(EvalOutcome::Blank);
        };
        if self.fail_evaluate_for.contains(name) {
            return Err(BackendError::Backend {
                message: format!("scripted evaluation failure for {name}"),
            });
        }
        Ok(self
            .outcomes
            .get(name)
            .cloned()
            .unwrap_or(EvalOutcome::Number(1.0)))
    }

    fn supports_function(&self, name: &str) -> bool {
        !self.missing_functions.contains(&name.to_ascii_uppercase())
    }

    fn close(self) -> Result<(), BackendError> {
        if let Some(flag) = &self.closed {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}
