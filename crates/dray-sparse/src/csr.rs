/// A locally-materialized Compressed Sparse Row matrix — the
/// `(row_ptr, col_idx, vals)` encoding of a sparse matrix — used only as
/// the root-rank source for [`crate::DistributedSparseMatrix::from_root`].
#[derive(Debug, Clone)]
pub struct Csr<T> {
    pub rows: usize,
    pub cols: usize,
    /// Length `rows + 1`; `row_ptr[r]..row_ptr[r + 1]` bounds row `r`'s
    /// entries in `col_idx`/`vals`.
    pub row_ptr: Vec<usize>,
    pub col_idx: Vec<usize>,
    pub vals: Vec<T>,
}

impl<T> Csr<T> {
    pub fn nnz(&self) -> usize {
        self.vals.len()
    }
}

fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

/// How a CSR's nonzeros are split across ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseDistribution {
    /// Equal nonzero count per rank; segment boundaries may fall mid-row.
    Eq,
    /// Equal row count per rank; every segment is a contiguous run of whole
    /// rows.
    Row,
}

impl SparseDistribution {
    /// `[start, end)` nnz-space bounds for every rank, in rank order. Pure:
    /// every rank computes the same table independently from the broadcast
    /// shape and `row_ptr`, no communication needed.
    pub(crate) fn segment_bounds(
        &self,
        rows: usize,
        row_ptr: &[usize],
        nnz: usize,
        p: usize,
    ) -> Vec<(usize, usize)> {
        match self {
            SparseDistribution::Eq => {
                let chunk = div_ceil(nnz, p);
                (0..p)
                    .map(|rank| {
                        let start = (rank * chunk).min(nnz);
                        let end = ((rank + 1) * chunk).min(nnz);
                        (start, end)
                    })
                    .collect()
            }
            SparseDistribution::Row => {
                let rows_per_rank = div_ceil(rows, p);
                (0..p)
                    .map(|rank| {
                        let row_start = (rank * rows_per_rank).min(rows);
                        let row_end = ((rank + 1) * rows_per_rank).min(rows);
                        (row_ptr[row_start], row_ptr[row_end])
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// `Eq` segment bounds must partition `[0, nnz)` across every rank
        /// exactly once, for any `(nnz, p)`.
        #[test]
        fn eq_segment_bounds_partition_0_nnz_exactly_once(nnz in 0usize..200, p in 1usize..8) {
            let bounds = SparseDistribution::Eq.segment_bounds(0, &[], nnz, p);
            prop_assert_eq!(bounds.len(), p);
            prop_assert_eq!(bounds[0].0, 0);
            prop_assert_eq!(bounds.last().unwrap().1, nnz);
            for w in bounds.windows(2) {
                prop_assert_eq!(w[0].1, w[1].0, "gap or overlap between adjacent ranks");
            }
        }

        /// `Row` segment bounds must partition `[0, nnz)` across every rank
        /// exactly once, for any row-size profile and `p`.
        #[test]
        fn row_segment_bounds_partition_0_nnz_exactly_once(
            row_sizes in proptest::collection::vec(0usize..6, 1..12),
            p in 1usize..8,
        ) {
            let rows = row_sizes.len();
            let mut row_ptr = Vec::with_capacity(rows + 1);
            row_ptr.push(0);
            for &size in &row_sizes {
                row_ptr.push(row_ptr.last().unwrap() + size);
            }
            let nnz = *row_ptr.last().unwrap();
            let bounds = SparseDistribution::Row.segment_bounds(rows, &row_ptr, nnz, p);
            prop_assert_eq!(bounds.len(), p);
            prop_assert_eq!(bounds[0].0, 0);
            prop_assert_eq!(bounds.last().unwrap().1, nnz);
            for w in bounds.windows(2) {
                prop_assert_eq!(w[0].1, w[1].0, "gap or overlap between adjacent ranks");
            }
        }
    }
}
