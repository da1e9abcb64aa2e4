//! Failure taxonomy of the annotation session.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the session controller. None of them is fatal.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Action attempted without a loaded element, with a stale element or an empty label.
    #[error("{0}")]
    InvalidState(String),
    /// The store rejected or failed to record a write.
    #[error("Failed to save: {0}")]
    Persistence(#[source] StoreError),
    /// The store failed to return the next element or its details.
    #[error("Failed to load element: {0}")]
    Fetch(#[source] StoreError),
}
