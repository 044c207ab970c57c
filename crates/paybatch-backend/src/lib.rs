//! Backend seam for the paybatch orchestrator: the narrow [`GridBackend`]
//! contract, a production adapter over the Formualizer engine, and a
//! scripted in-memory grid for tests.

pub mod backends;
pub mod error;
pub mod naming;
pub mod testing;
pub mod traits;

pub use backends::FormualizerAdapter;
pub use error::{BackendError, col_to_a1};
pub use naming::{MAX_SHEET_NAME_LEN, validate_sheet_name};
pub use traits::{EvalOutcome, GridBackend, NamedBinding};
