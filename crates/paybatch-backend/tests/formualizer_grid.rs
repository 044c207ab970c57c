use paybatch_backend::backends::formualizer::MAX_COLUMNS;
use paybatch_backend::{BackendError, EvalOutcome, FormualizerAdapter, GridBackend};

fn adapter() -> FormualizerAdapter {
    FormualizerAdapter::new().unwrap()
}

#[test]
fn sheet_is_created_then_reused() {
    let mut grid = adapter();
    grid.ensure_sheet("Payroll").unwrap();
    grid.ensure_sheet("Payroll").unwrap();
    grid.close().unwrap();
}

#[test]
fn illegal_sheet_names_are_rejected() {
    let mut grid = adapter();
    let long = "x".repeat(32);
    for name in ["", "  ", "a:b", "'lead", "trail'", long.as_str()] {
        assert!(
            matches!(
                grid.ensure_sheet(name),
                Err(BackendError::SheetName { .. })
            ),
            "{name:?}"
        );
    }
    grid.close().unwrap();
}

#[test]
fn rows_and_cells_allocate_once() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();

    grid.create_row("S", 1).unwrap();
    assert!(matches!(
        grid.create_row("S", 1),
        Err(BackendError::RowExists { row: 1, .. })
    ));

    grid.create_cell("S", 1, 1).unwrap();
    assert!(matches!(
        grid.create_cell("S", 1, 1),
        Err(BackendError::CellExists { .. })
    ));

    assert!(matches!(
        grid.create_cell("S", 1, MAX_COLUMNS + 1),
        Err(BackendError::ColumnOutOfBounds { .. })
    ));
    grid.close().unwrap();
}

#[test]
fn numeric_cell_evaluates_to_its_value() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();
    grid.create_row("S", 1).unwrap();
    grid.create_cell("S", 1, 1).unwrap();
    grid.set_number("S", 1, 1, 50_000.0).unwrap();
    assert_eq!(
        grid.evaluate("S", 1, 1).unwrap().as_finite_number(),
        Some(50_000.0)
    );
    grid.close().unwrap();
}

#[test]
fn formula_referencing_a_name_evaluates() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();

    grid.define_name("CTC", "S", 1, 1, "50000").unwrap();
    grid.create_row("S", 1).unwrap();
    grid.create_cell("S", 1, 1).unwrap();
    grid.set_number("S", 1, 1, 50_000.0).unwrap();

    grid.define_name("BASIC", "S", 2, 1, "ROUND(CTC * 40%, 0)")
        .unwrap();
    grid.create_row("S", 2).unwrap();
    grid.create_cell("S", 2, 1).unwrap();
    grid.set_formula("S", 2, 1, "ROUND(CTC * 40%, 0)").unwrap();

    assert_eq!(
        grid.evaluate("S", 2, 1).unwrap().as_finite_number(),
        Some(20_000.0)
    );
    grid.close().unwrap();
}

#[test]
fn malformed_formula_is_a_syntax_error() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();
    grid.create_row("S", 1).unwrap();
    grid.create_cell("S", 1, 1).unwrap();
    assert!(matches!(
        grid.set_formula("S", 1, 1, "ROUND(1 * 2%, 0"),
        Err(BackendError::FormulaSyntax { .. })
    ));
    grid.close().unwrap();
}

#[test]
fn undefined_name_is_a_formula_rejection() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();
    grid.create_row("S", 1).unwrap();
    grid.create_cell("S", 1, 1).unwrap();
    assert!(matches!(
        grid.set_formula("S", 1, 1, "MISSING * 2"),
        Err(BackendError::FormulaSyntax { .. })
    ));
    grid.close().unwrap();
}

#[test]
fn duplicate_and_illegal_names_are_rejected() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();
    grid.define_name("CTC", "S", 1, 1, "50000").unwrap();

    assert!(matches!(
        grid.define_name("CTC", "S", 2, 1, "60000"),
        Err(BackendError::Name { .. })
    ));
    // Looks like a cell reference.
    assert!(matches!(
        grid.define_name("A1", "S", 2, 1, "1"),
        Err(BackendError::Name { .. })
    ));
    assert!(matches!(
        grid.define_name("My Name", "S", 2, 1, "1"),
        Err(BackendError::Name { .. })
    ));
    grid.close().unwrap();
}

#[test]
fn non_numeric_outcomes_are_categorized() {
    let mut grid = adapter();
    grid.ensure_sheet("S").unwrap();

    grid.create_row("S", 1).unwrap();
    grid.create_cell("S", 1, 1).unwrap();
    grid.set_formula("S", 1, 1, "1 > 2").unwrap();
    assert!(matches!(
        grid.evaluate("S", 1, 1).unwrap(),
        EvalOutcome::Boolean(false)
    ));

    grid.create_row("S", 2).unwrap();
    grid.create_cell("S", 2, 1).unwrap();
    grid.set_formula("S", 2, 1, "\"abc\"").unwrap();
    assert!(matches!(
        grid.evaluate("S", 2, 1).unwrap(),
        EvalOutcome::Text(ref s) if s == "abc"
    ));

    grid.create_row("S", 3).unwrap();
    grid.create_cell("S", 3, 1).unwrap();
    grid.set_formula("S", 3, 1, "1 / 0").unwrap();
    assert!(matches!(
        grid.evaluate("S", 3, 1).unwrap(),
        EvalOutcome::Error(_)
    ));

    // Never written: evaluates to blank.
    assert_eq!(grid.evaluate("S", 9, 1).unwrap(), EvalOutcome::Blank);
    grid.close().unwrap();
}

#[test]
fn function_support_lookup() {
    let grid = adapter();
    assert!(grid.supports_function("ROUND"));
    assert!(grid.supports_function("round"));
    assert!(!grid.supports_function("NO_SUCH_FUNCTION"));
    grid.close().unwrap();
}

#[test]
fn close_removes_the_scratch_file() {
    let grid = adapter();
    let path = grid.scratch_path().unwrap().to_path_buf();
    assert!(path.exists());
    grid.close().unwrap();
    assert!(!path.exists());
}
