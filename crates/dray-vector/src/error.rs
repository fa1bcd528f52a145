//! Error kinds for the distributed vector: precondition violations,
//! reported rather than panicked.

#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("scatter called on root rank {root} without a source buffer")]
    ScatterMissingRoot { root: usize },

    #[error("scatter size mismatch on root: expected {expected} elements, got {actual}")]
    ScatterSizeMismatch { expected: usize, actual: usize },

    #[error("gather called on root rank {root} without a destination buffer")]
    GatherMissingRoot { root: usize },

    #[error("gather size mismatch on root: expected {expected} elements, got {actual}")]
    GatherSizeMismatch { expected: usize, actual: usize },
}
