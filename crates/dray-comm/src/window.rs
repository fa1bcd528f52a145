use std::sync::{Arc, Mutex};

use crate::Communicator;

/// A region of memory registered for one-sided remote access.
///
/// `get`/`put` are one-sided and not guaranteed visible until the next
/// [`Window::fence`] or [`Window::flush`]. The in-process
/// backend ([`crate::thread::ThreadCommunicator`]) happens to make writes
/// visible immediately (each rank's slab is a `Mutex`-guarded `Vec`), but
/// callers must not rely on that: fencing is part of the portable contract,
/// not an artifact of this particular backend.
pub struct Window<T, C: Communicator> {
    comm: C,
    directory: Vec<Arc<Mutex<Vec<T>>>>,
}

impl<T, C: Communicator> Window<T, C> {
    pub(crate) fn new(comm: C, directory: Vec<Arc<Mutex<Vec<T>>>>) -> Self {
        Self { comm, directory }
    }
}

impl<T: Copy, C: Communicator> Window<T, C> {
    /// One-sided read of a single element from `rank`'s slab.
    ///
    /// Issues exactly one access; bulk algorithms should prefer
    /// [`Window::local`] or a container's `segments()` to avoid per-element
    /// RMA.
    pub fn get(&self, rank: usize, offset: usize) -> T {
        let slab = self.directory[rank].lock().expect("window slab poisoned");
        slab[offset]
    }

    /// One-sided write of a single element into `rank`'s slab.
    pub fn put(&self, rank: usize, offset: usize, value: T) {
        let mut slab = self.directory[rank].lock().expect("window slab poisoned");
        slab[offset] = value;
    }

    /// Batched one-sided read of `dst.len()` contiguous elements starting at
    /// `offset` on `rank`, in a single lock acquisition instead of one RMA
    /// per element.
    pub fn get_range(&self, rank: usize, offset: usize, dst: &mut [T]) {
        let slab = self.directory[rank].lock().expect("window slab poisoned");
        dst.copy_from_slice(&slab[offset..offset + dst.len()]);
    }

    /// Batched one-sided write of `src` into `rank`'s slab starting at
    /// `offset`, in a single lock acquisition. Symmetric counterpart to
    /// [`Window::get_range`], used by distributed-vector `scatter` so each
    /// rank's chunk lands in one RMA instead of one `put` per element.
    pub fn put_range(&self, rank: usize, offset: usize, src: &[T]) {
        let mut slab = self.directory[rank].lock().expect("window slab poisoned");
        slab[offset..offset + src.len()].copy_from_slice(src);
    }
}

impl<T, C: Communicator> Window<T, C> {
    /// Closes the current RMA epoch: all prior `get`/`put` issued by any
    /// rank become globally visible after this call returns on every rank.
    pub fn fence(&self) {
        self.comm.fence();
    }

    /// Local completion with respect to `rank`. The in-process backend has
    /// no outstanding asynchronous state to drain, so this is a no-op; it
    /// exists so algorithms written against the façade compile against any
    /// backend, including ones where `flush` does real work.
    pub fn flush(&self, _rank: usize) {}

    /// This rank's own slab, including halo cells where present.
    pub fn local(&self) -> Arc<Mutex<Vec<T>>> {
        self.directory[self.comm.rank()].clone()
    }

    /// Final fence and release. There is no separate deallocation step
    /// since the backing `Vec`s are reclaimed when their last `Arc` drops.
    pub fn free(self) {
        self.fence();
    }
}
