use formualizer_common::ExcelError;
use thiserror::Error;

/// Failures surfaced by a [`GridBackend`](crate::traits::GridBackend).
///
/// `SheetName`, `Name` and `FormulaSyntax` describe rejected input;
/// `RowExists`, `CellExists` and `ColumnOutOfBounds` describe slot
/// bookkeeping violations that callers treat as invariant failures.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("illegal sheet name {name:?}: {reason}")]
    SheetName { name: String, reason: String },

    #[error("cannot create row {row} on sheet {sheet:?}: it already exists")]
    RowExists { sheet: String, row: u32 },

    #[error("cannot create cell at row {row}, column {col} on sheet {sheet:?}: it already exists")]
    CellExists { sheet: String, row: u32, col: u32 },

    #[error("cannot create cell at column {col}: outside backend bounds (max {max})")]
    ColumnOutOfBounds { col: u32, max: u32 },

    #[error("cannot create name {name:?}: {message}")]
    Name { name: String, message: String },

    #[error("cannot set formula: {message}")]
    FormulaSyntax { message: String },

    #[error("engine: {0}")]
    Engine(#[from] ExcelError),

    #[error("backend: {message}")]
    Backend { message: String },

    #[error("cleanup: {message}")]
    Cleanup { message: String },
}

/// 1-based column index to its A1 letter form (1 → A, 27 → AA).
pub fn col_to_a1(col: u32) -> String {
    let mut col = col;
    let mut out = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        out.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
