use indexmap::IndexMap;
use paybatch_backend::{FormualizerAdapter, GridBackend, NamedBinding};
use tracing::{debug, warn};

use crate::definition::{Classification, Definition};
use crate::error::BatchError;
use crate::registrar::{BindOutcome, Registrar};
use crate::resolver::{ContainmentDetector, ReferenceDetector, order_formulas};
use crate::slot::{Slot, SlotAllocator};

/// Accumulates `(name, result)` pairs strictly in processing order:
/// constants in input order, then formulas in resolved dependency order.
/// This ordering is part of the output contract; callers must not assume
/// it matches the input order.
pub struct Aggregator<T> {
    map: IndexMap<String, T>,
}

impl<T> Aggregator<T> {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            map: IndexMap::with_capacity(n),
        }
    }

    pub fn record(&mut self, name: String, value: T) {
        self.map.insert(name, value);
    }

    pub fn into_map(self) -> IndexMap<String, T> {
        self.map
    }
}

/// Runs one batch against one exclusively-owned backend instance.
///
/// Both modes share the same pass structure — classify, bind constants,
/// order formulas, bind and evaluate each — and differ only in the fold
/// applied per entry: validate downgrades per-name rejections to `false`
/// and continues; process escalates the first rejection and aborts. The
/// backend is released on every exit path.
pub struct BatchRunner<B: GridBackend> {
    backend: B,
    sheet: String,
    detector: Box<dyn ReferenceDetector>,
}

impl<B: GridBackend> BatchRunner<B> {
    pub fn new(backend: B, sheet_name: impl Into<String>) -> Self {
        Self {
            backend,
            sheet: sheet_name.into(),
            detector: Box::new(ContainmentDetector),
        }
    }

    /// Replace the containment heuristic with another reference detector.
    pub fn with_detector(mut self, detector: impl ReferenceDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Report per-name well-formedness. A name maps to `true` iff its
    /// definition binds and yields a usable number; rejected names map to
    /// `false` and the run continues. Slot conflicts and unclassified
    /// backend failures abort even here.
    pub fn validate(
        self,
        batch: &IndexMap<String, String>,
    ) -> Result<IndexMap<String, bool>, BatchError> {
        self.finish(|runner| {
            runner.drive(batch, &mut |def, slot, outcome| match outcome {
                BindOutcome::Value(_) => Ok(true),
                BindOutcome::Rejected(failure) => {
                    warn!(name = %def.name, slot = %slot, %failure, "definition rejected");
                    Ok(false)
                }
            })
        })
    }

    /// Resolve every name to a number. The first rejection aborts the
    /// whole batch with the originating name, slot and raw text.
    pub fn process(
        self,
        batch: &IndexMap<String, String>,
    ) -> Result<IndexMap<String, f64>, BatchError> {
        self.finish(|runner| {
            runner.drive(batch, &mut |def, slot, outcome| match outcome {
                BindOutcome::Value(value) => Ok(value),
                BindOutcome::Rejected(failure) => Err(BatchError::Element {
                    name: def.name.clone(),
                    slot,
                    text: def.text.clone(),
                    failure,
                }),
            })
        })
    }

    /// Run, then release the backend no matter how the run went. A failed
    /// release is reported but never replaces the run's own outcome.
    fn finish<T>(
        mut self,
        run: impl FnOnce(&mut Self) -> Result<T, BatchError>,
    ) -> Result<T, BatchError> {
        let result = run(&mut self);
        if let Err(e) = self.backend.close() {
            warn!(error = %e, "backend cleanup failed");
        }
        result
    }

    fn drive<T>(
        &mut self,
        batch: &IndexMap<String, String>,
        fold: &mut dyn FnMut(&Definition, Slot, BindOutcome) -> Result<T, BatchError>,
    ) -> Result<IndexMap<String, T>, BatchError> {
        self.backend.ensure_sheet(&self.sheet)?;

        let mut constants = Vec::new();
        let mut formulas = Vec::new();
        for (name, text) in batch {
            let def = Definition::new(name.clone(), text.clone());
            match def.classify() {
                Classification::Constant(_) => constants.push(def),
                Classification::Formula => formulas.push(def),
            }
        }
        debug!(
            constants = constants.len(),
            formulas = formulas.len(),
            "batch classified"
        );

        let mut slots = SlotAllocator::default();
        let mut registrar = Registrar::new(self.sheet.clone());
        let mut results = Aggregator::with_capacity(batch.len());

        // Constants first: theirs are the names formulas reference.
        for def in &constants {
            let slot = slots.next();
            let outcome = registrar.bind_constant(&mut self.backend, slot, def)?;
            results.record(def.name.clone(), fold(def, slot, outcome)?);
        }
        debug!(
            bound = registrar.bindings().len(),
            names = %summarize(registrar.bindings()),
            "constants bound"
        );

        let ordered = order_formulas(formulas, self.detector.as_ref());
        for def in &ordered {
            let slot = slots.next();
            let outcome = registrar.bind_formula(&mut self.backend, slot, def)?;
            results.record(def.name.clone(), fold(def, slot, outcome)?);
        }
        debug!(
            bound = registrar.bindings().len(),
            names = %summarize(registrar.bindings()),
            "formulas bound"
        );

        Ok(results.into_map())
    }
}

fn summarize(bindings: &[NamedBinding]) -> String {
    bindings
        .iter()
        .map(NamedBinding::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a batch against a fresh Formualizer backend. Output order is
/// processing order (constants, then dependency order), not input order.
pub fn validate_formulae(
    batch: &IndexMap<String, String>,
    sheet_name: &str,
) -> Result<IndexMap<String, bool>, BatchError> {
    let backend = FormualizerAdapter::new().map_err(BatchError::Backend)?;
    BatchRunner::new(backend, sheet_name).validate(batch)
}

/// Resolve a batch to numbers against a fresh Formualizer backend. Aborts
/// on the first failing definition. Output order is processing order.
pub fn process_formulae(
    batch: &IndexMap<String, String>,
    sheet_name: &str,
) -> Result<IndexMap<String, f64>, BatchError> {
    let backend = FormualizerAdapter::new().map_err(BatchError::Backend)?;
    BatchRunner::new(backend, sheet_name).process(batch)
}
