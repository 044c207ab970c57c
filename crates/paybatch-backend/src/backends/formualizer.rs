use std::path::Path;

use formualizer_common::{ExcelErrorKind, LiteralValue, RangeAddress};
use formualizer_workbook::{IoError, NamedRangeScope, Workbook, WorkbookMode};
use rustc_hash::FxHashSet;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{BackendError, col_to_a1};
use crate::naming::validate_sheet_name;
use crate::traits::{EvalOutcome, GridBackend};

/// Column bound of the underlying engine (Excel's XFD).
pub const MAX_COLUMNS: u32 = 16_384;

/// [`GridBackend`] over the Formualizer engine.
///
/// Drives a [`Workbook`] in ephemeral mode so formula text is parsed at
/// `set_formula` time rather than staged. The engine itself never rejects a
/// re-created row or cell, so slot occupancy is tracked here; the contract
/// requires allocate-once semantics.
pub struct FormualizerAdapter {
    workbook: Workbook,
    rows: FxHashSet<(String, u32)>,
    cells: FxHashSet<(String, u32, u32)>,
    scratch: Option<NamedTempFile>,
}

impl FormualizerAdapter {
    /// Create a fresh instance with its own scratch file. The scratch file
    /// lives until [`GridBackend::close`] (or drop, after a panic).
    pub fn new() -> Result<Self, BackendError> {
        formualizer_eval::builtins::load_builtins();
        let scratch = tempfile::Builder::new()
            .prefix("temp-paybatch-")
            .suffix(".scratch")
            .tempfile()
            .map_err(|e| BackendError::Backend {
                message: format!("cannot create scratch file: {e}"),
            })?;
        debug!(path = %scratch.path().display(), "scratch file created");
        Ok(Self {
            workbook: Workbook::new_with_mode(WorkbookMode::Ephemeral),
            rows: FxHashSet::default(),
            cells: FxHashSet::default(),
            scratch: Some(scratch),
        })
    }

    /// Path of the transient scratch file, while the instance is open.
    pub fn scratch_path(&self) -> Option<&Path> {
        self.scratch.as_ref().map(|s| s.path())
    }

    fn map_io(err: IoError) -> BackendError {
        match err {
            IoError::Engine(e) => BackendError::Engine(e),
            other => BackendError::Backend {
                message: other.to_string(),
            },
        }
    }
}

impl GridBackend for FormualizerAdapter {
    fn ensure_sheet(&mut self, name: &str) -> Result<(), BackendError> {
        if self.workbook.has_sheet(name) {
            trace!(sheet = name, "reusing existing sheet");
            return Ok(());
        }
        validate_sheet_name(name)?;
        self.workbook.add_sheet(name).map_err(BackendError::Engine)?;
        debug!(sheet = name, "sheet created");
        Ok(())
    }

    fn create_row(&mut self, sheet: &str, row: u32) -> Result<(), BackendError> {
        if row == 0 {
            return Err(BackendError::Backend {
                message: format!("invalid row index: {row}"),
            });
        }
        if !self.rows.insert((sheet.to_string(), row)) {
            return Err(BackendError::RowExists {
                sheet: sheet.to_string(),
                row,
            });
        }
        trace!(sheet, row, "row created");
        Ok(())
    }

    fn create_cell(&mut self, sheet: &str, row: u32, col: u32) -> Result<(), BackendError> {
        if col == 0 || col > MAX_COLUMNS {
            return Err(BackendError::ColumnOutOfBounds {
                col,
                max: MAX_COLUMNS,
            });
        }
        if !self.rows.contains(&(sheet.to_string(), row)) {
            return Err(BackendError::Backend {
                message: format!("cannot create cell on row {row}: the row does not exist"),
            });
        }
        if !self.cells.insert((sheet.to_string(), row, col)) {
            return Err(BackendError::CellExists {
                sheet: sheet.to_string(),
                row,
                col,
            });
        }
        trace!(sheet, cell = %format!("{}{row}", col_to_a1(col)), "cell created");
        Ok(())
    }

    fn set_number(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: f64,
    ) -> Result<(), BackendError> {
        self.workbook
            .set_value(sheet, row, col, LiteralValue::Number(value))
            .map_err(Self::map_io)?;
        debug!(sheet, cell = %format!("{}{row}", col_to_a1(col)), value, "numeric value written");
        Ok(())
    }

    fn set_formula(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        formula: &str,
    ) -> Result<(), BackendError> {
        match self.workbook.set_formula(sheet, row, col, formula) {
            Ok(()) => {
                debug!(sheet, cell = %format!("{}{row}", col_to_a1(col)), formula, "formula written");
                Ok(())
            }
            Err(IoError::FormulaParser { message, .. }) => {
                Err(BackendError::FormulaSyntax { message })
            }
            Err(IoError::Backend { backend, message }) if backend == "parser" => {
                Err(BackendError::FormulaSyntax { message })
            }
            // An undefined name inside the formula is rejected by the engine
            // at set time; the contract reports it as a formula rejection.
            Err(IoError::Engine(e)) if e.kind == ExcelErrorKind::Name => {
                Err(BackendError::FormulaSyntax {
                    message: e.to_string(),
                })
            }
            Err(other) => Err(Self::map_io(other)),
        }
    }

    fn define_name(
        &mut self,
        name: &str,
        sheet: &str,
        row: u32,
        col: u32,
        doc: &str,
    ) -> Result<(), BackendError> {
        let address =
            RangeAddress::new(sheet, row, col, row, col).map_err(|reason| BackendError::Name {
                name: name.to_string(),
                message: format!("cannot build cell reference: {reason}"),
            })?;
        match self
            .workbook
            .define_named_range(name, &address, NamedRangeScope::Workbook)
        {
            Ok(()) => {
                // The engine stores no free-form comment per name; the
                // documentation text only reaches the log.
                debug!(name, cell = %format!("'{sheet}'!{}{row}", col_to_a1(col)), doc, "name created");
                Ok(())
            }
            Err(IoError::Engine(e)) if e.kind == ExcelErrorKind::Name => Err(BackendError::Name {
                name: name.to_string(),
                message: e.to_string(),
            }),
            Err(other) => Err(Self::map_io(other)),
        }
    }

    fn evaluate(&mut self, sheet: &str, row: u32, col: u32) -> Result<EvalOutcome, BackendError> {
        let value = match self.workbook.evaluate_cell(sheet, row, col) {
            Ok(v) => v,
            Err(IoError::Engine(e)) if e.kind == ExcelErrorKind::NImpl => {
                return Ok(EvalOutcome::Unsupported(e.to_string()));
            }
            Err(other) => return Err(Self::map_io(other)),
        };
        Ok(match value {
            LiteralValue::Number(n) => EvalOutcome::Number(n),
            LiteralValue::Int(i) => EvalOutcome::Number(i as f64),
            LiteralValue::Boolean(b) => EvalOutcome::Boolean(b),
            LiteralValue::Text(s) => EvalOutcome::Text(s),
            LiteralValue::Empty => EvalOutcome::Blank,
            LiteralValue::Pending => EvalOutcome::Unresolved,
            LiteralValue::Error(e) if e.kind == ExcelErrorKind::NImpl => {
                EvalOutcome::Unsupported(e.to_string())
            }
            LiteralValue::Error(e) => EvalOutcome::Error(e.to_string()),
            // Dates and durations surface as their serial number.
            other => match other.as_serial_number() {
                Some(n) => EvalOutcome::Number(n),
                None => EvalOutcome::Text(other.to_string()),
            },
        })
    }

    fn supports_function(&self, name: &str) -> bool {
        formualizer_eval::function_registry::get("", &name.to_ascii_uppercase()).is_some()
    }

    fn close(mut self) -> Result<(), BackendError> {
        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            scratch.close().map_err(|e| BackendError::Cleanup {
                message: format!("could not remove scratch file {}: {e}", path.display()),
            })?;
            debug!(path = %path.display(), "scratch file removed");
        }
        debug!("backend released");
        Ok(())
    }
}
