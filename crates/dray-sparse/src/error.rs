//! Error kinds for the distributed sparse matrix.

#[derive(Debug, thiserror::Error)]
pub enum SparseError {
    #[error("sparse matrix construction requires a source CSR on root rank {root}")]
    MissingRoot { root: usize },

    #[error("row_ptr length {actual} does not match rows+1 ({expected})")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("segment {segment} is not resident on this rank ({rank})")]
    NotResident { segment: usize, rank: usize },
}
