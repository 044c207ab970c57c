//! Run a small payroll batch through both modes.

use indexmap::IndexMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut batch = IndexMap::new();
    batch.insert("DA".to_string(), "ROUND(CTC * 12%, 0)".to_string());
    batch.insert("CTC".to_string(), "50000".to_string());
    batch.insert("HRA".to_string(), "ROUND(BASIC * 30%, 0)".to_string());
    batch.insert("PB".to_string(), "ROUND((BASIC + DA) * 12%, 0)".to_string());
    batch.insert("BASIC".to_string(), "ROUND(CTC * 40%, 0)".to_string());
    println!("input: {batch:?}");

    let validation = paybatch::validate_formulae(&batch, "FormulaValidationSheet")?;
    println!("validation: {validation:?}");

    let output = paybatch::process_formulae(&batch, "FormulaEvaluationSheet")?;
    println!("output: {output:?}");

    Ok(())
}
