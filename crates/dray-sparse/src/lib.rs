//! Distributed sparse matrix: a CSR matrix whose `col_idx`/`vals` arrays
//! are partitioned across a communicator group, with `row_ptr` replicated
//! on every rank so row-index reconstruction is a local scan rather than a
//! second RMA round-trip per element.

mod csr;
mod error;
mod segment;

pub use csr::{Csr, SparseDistribution};
pub use error::SparseError;
pub use segment::Segment;

use dray_comm::{Communicator, Window};
use dray_proxy::{RemoteRead, XIterator, XRange};

/// A CSR matrix distributed across `comm`'s ranks.
///
/// `col_idx`/`vals` live behind one-sided [`Window`]s, indexed by
/// `(segment_index, local_offset)` the same way a dense distributed vector
/// indexes by `(rank, offset)`. `row_ptr` is a plain `Vec<usize>` replicated
/// on every rank rather than itself distributed.
pub struct DistributedSparseMatrix<T, C: Communicator> {
    comm: C,
    rows: usize,
    cols: usize,
    nnz: usize,
    row_ptr: Vec<usize>,
    bounds: Vec<(usize, usize)>,
    col_window: Window<usize, C>,
    val_window: Window<T, C>,
}

impl<T: Copy + Default + Send + Sync + 'static, C: Communicator> DistributedSparseMatrix<T, C> {
    /// Builds a distributed matrix from a CSR materialized only on `root`:
    /// broadcasts shape and `row_ptr`, then every rank independently
    /// computes its own segment bounds from `distribution` (a pure function
    /// of shape, needing no RMA) before `root` writes each rank's
    /// `col_idx`/`vals` chunk directly via one-sided `put_range`.
    pub fn from_root(
        comm: C,
        csr: Option<Csr<T>>,
        root: usize,
        distribution: SparseDistribution,
    ) -> Result<Self, SparseError> {
        // Validation can only happen on `root` (only it has `csr`), but every
        // rank must call the same sequence of collectives — so a bad CSR
        // can't simply early-return on root while
        // other ranks sail on into a broadcast nobody else will join. Root's
        // validation result rides along inside the shape broadcast itself: a
        // sentinel shape means "construction failed", and every rank decides
        // whether to bail out only *after* all of them have made that same
        // collective call.
        const INVALID: [usize; 3] = [usize::MAX; 3];
        let root_validation: Result<[usize; 3], SparseError> = if comm.rank() == root {
            match &csr {
                None => Err(SparseError::MissingRoot { root }),
                Some(source) if source.row_ptr.len() != source.rows + 1 => {
                    Err(SparseError::ShapeMismatch {
                        expected: source.rows + 1,
                        actual: source.row_ptr.len(),
                    })
                }
                Some(source) => Ok([source.rows, source.cols, source.nnz()]),
            }
        } else {
            Ok(INVALID) // never read on non-root ranks; overwritten by the broadcast below
        };
        let mut shape = match &root_validation {
            Ok(s) if comm.rank() == root => *s,
            _ => INVALID,
        };
        comm.broadcast(&mut shape, root)
            .expect("shape broadcast is a fatal communicator failure");

        if shape == INVALID {
            return match root_validation {
                Err(e) => Err(e),
                Ok(_) => Err(SparseError::MissingRoot { root }),
            };
        }
        let [rows, cols, nnz] = shape;

        let mut row_ptr = vec![0usize; rows + 1];
        if comm.rank() == root {
            row_ptr.copy_from_slice(&csr.as_ref().expect("checked above").row_ptr);
        }
        comm.broadcast(&mut row_ptr, root)
            .expect("row_ptr broadcast is a fatal communicator failure");

        let p = comm.size();
        let bounds = distribution.segment_bounds(rows, &row_ptr, nnz, p);
        let (my_start, my_end) = bounds[comm.rank()];
        let local_col = vec![0usize; my_end - my_start];
        let local_val = vec![T::default(); my_end - my_start];
        let col_window = comm.create_window(local_col);
        let val_window = comm.create_window(local_val);

        if comm.rank() == root {
            let source = csr.as_ref().expect("checked above");
            for (target, &(start, end)) in bounds.iter().enumerate() {
                if end == start {
                    continue;
                }
                col_window.put_range(target, 0, &source.col_idx[start..end]);
                val_window.put_range(target, 0, &source.vals[start..end]);
            }
        }
        col_window.fence();
        val_window.fence();

        Ok(Self {
            comm,
            rows,
            cols,
            nnz,
            row_ptr,
            bounds,
            col_window,
            val_window,
        })
    }
}

impl<T: Copy + Send + Sync + 'static, C: Communicator> DistributedSparseMatrix<T, C> {
    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored nonzeros (`size() == nnz`).
    pub fn size(&self) -> usize {
        self.nnz
    }

    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    pub(crate) fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub(crate) fn col_window(&self) -> &Window<usize, C> {
        &self.col_window
    }

    pub(crate) fn val_window(&self) -> &Window<T, C> {
        &self.val_window
    }

    /// The segment (rank) owning global nnz offset `index`, and that
    /// segment's local offset. Binary search over segment start offsets,
    /// which is the single-element counterpart to the bulk monotonic-cursor
    /// scan [`Segment::local`] runs — running the scan once is an
    /// optimization for bulk reads, not a requirement on random access.
    fn segment_for(&self, index: usize) -> (usize, usize) {
        let seg = self
            .bounds
            .partition_point(|&(start, _)| start <= index)
            .saturating_sub(1);
        (seg, index - self.bounds[seg].0)
    }

    /// Row owning global nnz offset `position`: the row `r` such that
    /// `row_ptr[r] <= position < row_ptr[r + 1]`.
    pub(crate) fn row_for_position(&self, position: usize) -> usize {
        self.row_ptr
            .partition_point(|&start| start <= position)
            .saturating_sub(1)
    }

    pub fn begin(&self) -> XIterator<'_, Self> {
        XIterator::new(self, 0)
    }

    pub fn end(&self) -> XIterator<'_, Self> {
        XIterator::new(self, self.nnz)
    }

    /// Forward iteration over the whole distributed range, row-major by
    /// the source CSR's own nonzero order.
    pub fn iter(&self) -> XRange<'_, Self> {
        XRange::new(self.begin(), self.end())
    }

    /// One handle per rank, in rank order.
    pub fn segments(&self) -> Vec<Segment<'_, T, C>> {
        self.bounds
            .iter()
            .enumerate()
            .map(|(rank, &(start, end))| Segment::new(self, rank, start, end - start))
            .collect()
    }
}

impl<T: Copy + Send + Sync + 'static, C: Communicator> RemoteRead for DistributedSparseMatrix<T, C> {
    type Element = ((usize, usize), T);

    /// Reconstructs `((row, col), value)` for global nnz offset `index`.
    fn get(&self, index: usize) -> Self::Element {
        let (segment, local_offset) = self.segment_for(index);
        let value = self.val_window.get(segment, local_offset);
        let col = self.col_window.get(segment, local_offset);
        let row = self.row_for_position(index);
        tracing::trace!(index, segment, local_offset, row, col, "sparse matrix get");
        ((row, col), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dray_comm::thread;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn sample_csr() -> Csr<f64> {
        // 4x4, row-major entries:
        // row 0: (0,0)=1, (0,2)=2
        // row 1: (1,1)=3
        // row 2: -- empty --
        // row 3: (3,0)=4, (3,3)=5
        Csr {
            rows: 4,
            cols: 4,
            row_ptr: vec![0, 2, 3, 3, 5],
            col_idx: vec![0, 2, 1, 0, 3],
            vals: vec![1.0, 2.0, 3.0, 4.0, 5.0],
        }
    }

    fn reference_triples(csr: &Csr<f64>) -> HashMap<(usize, usize), f64> {
        let mut map = HashMap::new();
        for row in 0..csr.rows {
            for k in csr.row_ptr[row]..csr.row_ptr[row + 1] {
                map.insert((row, csr.col_idx[k]), csr.vals[k]);
            }
        }
        map
    }

    #[test]
    fn iterates_every_original_triple_exactly_once_row_distribution() {
        let csr = sample_csr();
        let expected = reference_triples(&csr);
        thread::run(2, move |comm| {
            let csr = if comm.rank() == 0 { Some(csr.clone()) } else { None };
            let matrix =
                DistributedSparseMatrix::from_root(comm.clone(), csr, 0, SparseDistribution::Row)
                    .unwrap();
            assert_eq!(matrix.size(), 5);
            let observed: HashMap<(usize, usize), f64> =
                matrix.iter().map(|r| r.get()).collect();
            assert_eq!(observed, expected);
        });
    }

    #[test]
    fn iterates_every_original_triple_exactly_once_eq_distribution() {
        let csr = sample_csr();
        let expected = reference_triples(&csr);
        thread::run(3, move |comm| {
            let csr = if comm.rank() == 0 { Some(csr.clone()) } else { None };
            let matrix =
                DistributedSparseMatrix::from_root(comm.clone(), csr, 0, SparseDistribution::Eq)
                    .unwrap();
            let observed: HashMap<(usize, usize), f64> =
                matrix.iter().map(|r| r.get()).collect();
            assert_eq!(observed, expected);
        });
    }

    #[test]
    fn segments_sum_to_nnz_and_agree_with_rma_iteration() {
        let csr = sample_csr();
        thread::run(2, move |comm| {
            let csr = if comm.rank() == 0 { Some(csr.clone()) } else { None };
            let matrix =
                DistributedSparseMatrix::from_root(comm.clone(), csr, 0, SparseDistribution::Row)
                    .unwrap();
            let segments = matrix.segments();
            assert_eq!(segments.iter().map(Segment::len).sum::<usize>(), matrix.size());
            for segment in &segments {
                let via_rma: Vec<((usize, usize), f64)> = segment.iter().map(|r| r.get()).collect();
                if let Ok(local) = segment.local() {
                    assert_eq!(local, via_rma);
                }
            }
        });
    }

    #[test]
    fn reduce_over_segments_matches_reference_sum() {
        // scenario 5: transformer (r,c,v) -> v + r + c, reduced with +.
        let csr = sample_csr();
        let reference: f64 = reference_triples(&csr)
            .iter()
            .map(|(&(r, c), &v)| v + r as f64 + c as f64)
            .sum();
        thread::run(2, move |comm| {
            let csr = if comm.rank() == 0 { Some(csr.clone()) } else { None };
            let matrix =
                DistributedSparseMatrix::from_root(comm.clone(), csr, 0, SparseDistribution::Row)
                    .unwrap();
            let reduced: f64 = matrix
                .iter()
                .map(|r| {
                    let ((row, col), value) = r.get();
                    value + row as f64 + col as f64
                })
                .sum();
            assert_eq!(reduced, reference);
        });
    }

    #[test]
    fn local_reports_not_resident_for_foreign_segment() {
        let csr = sample_csr();
        thread::run(2, move |comm| {
            let csr = if comm.rank() == 0 { Some(csr.clone()) } else { None };
            let matrix =
                DistributedSparseMatrix::from_root(comm.clone(), csr, 0, SparseDistribution::Row)
                    .unwrap();
            let foreign_rank = 1 - comm.rank();
            let segment = &matrix.segments()[foreign_rank];
            assert!(matches!(
                segment.local(),
                Err(SparseError::NotResident { .. })
            ));
        });
    }

    #[test]
    fn rejects_missing_root_csr() {
        thread::run(2, |comm| {
            let result =
                DistributedSparseMatrix::<f64, _>::from_root(comm.clone(), None, 0, SparseDistribution::Row);
            if comm.rank() == 0 {
                assert!(matches!(result, Err(SparseError::MissingRoot { .. })));
            }
        });
    }
}
