/// One named pay-element definition: a unique, case-sensitive name and the
/// raw text it was supplied with. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub text: String,
}

impl Definition {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn classify(&self) -> Classification {
        classify(&self.text)
    }
}

/// Derived (never stored) classification of a definition's raw text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// The text parses directly as a finite number.
    Constant(f64),
    /// Anything else: an expression for the backend to evaluate.
    Formula,
}

/// Classify raw text: a strict float parse of the trimmed text that yields
/// a finite value makes a constant; any failure (malformed, empty,
/// non-numeric, `NaN`/`inf`) makes a formula.
pub fn classify(text: &str) -> Classification {
    match parse_finite(text) {
        Some(value) => Classification::Constant(value),
        None => Classification::Formula,
    }
}

pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
