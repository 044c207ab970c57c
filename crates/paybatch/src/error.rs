use paybatch_backend::BackendError;
use thiserror::Error;

use crate::registrar::BindFailure;
use crate::slot::Slot;

/// Fatal batch failure. Per-name failures that evaluate mode escalates are
/// wrapped in `Element` together with the originating definition, so the
/// caller can tell which entry sank the run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cannot resolve {name} at {slot} (text: {text:?}): {failure}")]
    Element {
        name: String,
        slot: Slot,
        text: String,
        failure: BindFailure,
    },

    /// A row or cell was already occupied: an internal invariant violation,
    /// never downgraded, in either mode.
    #[error("slot invariant violated while binding {name}: {source}")]
    SlotConflict {
        name: String,
        source: BackendError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}
