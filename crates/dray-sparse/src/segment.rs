use dray_comm::Communicator;
use dray_proxy::{XIterator, XRange};

use crate::{DistributedSparseMatrix, SparseError};

/// One rank's contiguous run of nonzeros: `start`/`len` are offsets into
/// the matrix's global nnz order, not row indices.
pub struct Segment<'a, T, C: Communicator> {
    matrix: &'a DistributedSparseMatrix<T, C>,
    rank: usize,
    start: usize,
    len: usize,
}

impl<'a, T, C: Communicator> Segment<'a, T, C> {
    pub(crate) fn new(matrix: &'a DistributedSparseMatrix<T, C>, rank: usize, start: usize, len: usize) -> Self {
        Self {
            matrix,
            rank,
            start,
            len,
        }
    }

    /// The owning rank — every iterator over this segment knows its
    /// `segment_index`, which is this rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'a, T: Copy + Send + Sync + 'static, C: Communicator> Segment<'a, T, C> {
    /// Proxy iteration over this segment's global nnz range, valid from any
    /// rank (one RMA `get` per element).
    pub fn iter(&self) -> XRange<'a, DistributedSparseMatrix<T, C>> {
        let begin = XIterator::new(self.matrix, self.start);
        let end = XIterator::new(self.matrix, self.start + self.len);
        XRange::new(begin, end)
    }

    /// Bulk-decodes this segment's `((row, col), value)` triples from its own
    /// local slab, iff resident on the caller's rank — reported as an error
    /// rather than panicked otherwise.
    ///
    /// Batches the value and column-index reads into two bulk fetches and
    /// runs the row scan once with a monotonically advancing cursor, rather
    /// than one `get` per element as [`Segment::iter`] does.
    pub fn local(&self) -> Result<Vec<((usize, usize), T)>, SparseError> {
        if self.rank != self.matrix.comm().rank() {
            return Err(SparseError::NotResident {
                segment: self.rank,
                rank: self.matrix.comm().rank(),
            });
        }
        if self.len == 0 {
            return Ok(Vec::new());
        }

        // This segment is resident on the caller's rank, so its backing slab
        // is just this rank's own window slice — reading it directly (one
        // lock each) is both a single bulk fetch and cheaper than routing
        // through `get`/`get_range`'s RMA path.
        let val_slab = self.matrix.val_window().local();
        let col_slab = self.matrix.col_window().local();
        let vals = val_slab.lock().expect("window slab poisoned");
        let cols = col_slab.lock().expect("window slab poisoned");

        let row_ptr = self.matrix.row_ptr();
        let mut current_row = self.matrix.row_for_position(self.start);
        let mut out = Vec::with_capacity(self.len);
        for k in 0..self.len {
            let position = self.start + k;
            while row_ptr[current_row + 1] <= position {
                current_row += 1;
            }
            out.push(((current_row, cols[k]), vals[k]));
        }
        Ok(out)
    }
}
