//! Batch resolution of named pay-element definitions over a grid backend.
//!
//! A batch maps element names to raw text: numeric literals become
//! constants, everything else is handed to the backend as a formula that
//! may reference other elements by name. The orchestrator classifies the
//! batch, orders formulas so references resolve before their referencers,
//! binds each definition to its own backend slot, and runs in one of two
//! modes: [`validate_formulae`] reports per-name well-formedness and keeps
//! going past individual failures, [`process_formulae`] resolves every
//! name to a number and aborts on the first failure.
//!
//! The backend is a narrow contract ([`paybatch_backend::GridBackend`]);
//! the bundled adapter drives the Formualizer engine.

pub mod definition;
pub mod error;
pub mod preflight;
pub mod registrar;
pub mod resolver;
pub mod runner;
pub mod slot;

pub use definition::{Classification, Definition, classify};
pub use error::BatchError;
pub use registrar::{BindFailure, BindOutcome, Registrar};
pub use resolver::{ContainmentDetector, ReferenceDetector, order_formulas};
pub use runner::{Aggregator, BatchRunner, process_formulae, validate_formulae};
pub use slot::{BINDING_COLUMN, Slot, SlotAllocator};

// Re-export for convenience
pub use indexmap::IndexMap;
pub use paybatch_backend::{
    BackendError, EvalOutcome, FormualizerAdapter, GridBackend, NamedBinding,
};
