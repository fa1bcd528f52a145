use std::sync::{Arc, Mutex};

use dray_comm::Communicator;
use dray_proxy::{XIterator, XRange};

use crate::DistributedVector;

/// One rank's interior as a locally-iterable range.
///
/// Boundaries are global indices into the vector's logical `[0, N)` range,
/// not slab offsets; a segment's `rank()` is the only rank on which
/// [`Segment::local`] can succeed.
pub struct Segment<'a, T, C: Communicator> {
    vector: &'a DistributedVector<T, C>,
    rank: usize,
    first: usize,
    len: usize,
}

impl<'a, T, C: Communicator> Segment<'a, T, C> {
    pub(crate) fn new(vector: &'a DistributedVector<T, C>, rank: usize, first: usize, len: usize) -> Self {
        Self {
            vector,
            rank,
            first,
            len,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first_index(&self) -> usize {
        self.first
    }
}

impl<'a, T: Copy, C: Communicator> Segment<'a, T, C> {
    /// A snapshot of this segment's interior, iff the segment is resident on
    /// the caller's rank — `local()` is only meaningful when a segment is
    /// resident on the current rank. Non-resident callers get `None` rather
    /// than a panic; whether to fall back to [`Segment::iter`] is the
    /// algorithm layer's decision.
    pub fn local(&self) -> Option<Vec<T>> {
        if self.rank != self.vector.comm().rank() {
            return None;
        }
        let slab: Arc<Mutex<Vec<T>>> = self.vector.local();
        let guard = slab.lock().expect("window slab poisoned");
        let offset = self.vector.local_offset(self.first);
        Some(guard[offset..offset + self.len].to_vec())
    }

    /// Proxy iteration over this segment's global indices, regardless of
    /// residency (one RMA `get`/`put` per element, per the same policy as
    /// [`DistributedVector`] element access). The only path available for a
    /// segment not owned by the caller's rank.
    pub fn iter(&self) -> XRange<'a, DistributedVector<T, C>> {
        let begin = XIterator::new(self.vector, self.first);
        let end = XIterator::new(self.vector, self.first + self.len);
        XRange::new(begin, end)
    }
}
