//! Advisory pre-checks run before a batch touches the backend.

use indexmap::IndexMap;
use paybatch_backend::GridBackend;

use crate::definition::{Classification, classify};

/// Report, per definition name, the function-call tokens in its formula
/// text that the backend cannot evaluate. Constants are skipped. Purely
/// advisory: neither run mode consults this.
///
/// A function-call token is an identifier directly followed by `(`; the
/// scan does not parse the formula grammar, so tokens inside string
/// literals are reported too.
pub fn unsupported_functions<B: GridBackend>(
    backend: &B,
    batch: &IndexMap<String, String>,
) -> IndexMap<String, Vec<String>> {
    let mut report = IndexMap::new();
    for (name, text) in batch {
        if matches!(classify(text), Classification::Constant(_)) {
            continue;
        }
        let mut missing: Vec<String> = Vec::new();
        for token in function_tokens(text) {
            if !backend.supports_function(&token) && !missing.contains(&token) {
                missing.push(token);
            }
        }
        if !missing.is_empty() {
            report.insert(name.clone(), missing);
        }
    }
    report
}

/// Identifiers directly followed by an opening parenthesis, left to right.
fn function_tokens(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
            {
                i += 1;
            }
            let mut rest = i;
            while rest < bytes.len() && bytes[rest] == b' ' {
                rest += 1;
            }
            if rest < bytes.len() && bytes[rest] == b'(' {
                tokens.push(text[start..i].to_string());
            }
        } else {
            i += 1;
        }
    }
    tokens
}
