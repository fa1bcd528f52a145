//! Error kinds for the communicator façade.
//!
//! Following the precondition-violation / communication-failure split used
//! throughout this workspace, these are returned to the caller rather than
//! panicking; callers above the façade boundary decide whether a given
//! violation is fatal.

#[derive(Debug, thiserror::Error)]
pub enum CommError {
    #[error("scatter size mismatch on root: expected {expected} elements, got {actual}")]
    ScatterSizeMismatch { expected: usize, actual: usize },

    #[error("gather size mismatch on root: expected {expected} elements, got {actual}")]
    GatherSizeMismatch { expected: usize, actual: usize },

    #[error("broadcast payload missing from root rank {root}")]
    BroadcastMissingRoot { root: usize },
}
