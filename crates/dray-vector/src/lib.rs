//! Distributed vector: a dense, decomposition-partitioned container with
//! proxy-reference element access.

mod error;
mod segment;

pub use error::VectorError;
pub use segment::Segment;

use dray_comm::{Communicator, Window};
use dray_decomp::{Decomposition, Method, Radius, Stencil};
use dray_halo::{HaloError, HaloManager};
use dray_proxy::{RemoteRead, RemoteWrite, XIterator, XRange};

/// A dense vector of `size` logical elements, partitioned across a
/// communicator group by a [`Decomposition`].
///
/// Element access goes through the [`dray_proxy`] machinery: `RemoteRead`/
/// `RemoteWrite` are implemented directly on `DistributedVector`, so
/// `dv.at(i).get()` / `.set(v)` each issue exactly one RMA `get`/`put` —
/// access must not silently batch.
pub struct DistributedVector<T, C: Communicator> {
    decomp: Decomposition<C>,
    size: usize,
    window: Window<T, C>,
}

impl<T: Copy + Default + Send + Sync + 'static, C: Communicator> DistributedVector<T, C> {
    /// `(size)` constructor mode: equal-block decomposition, no stencil.
    pub fn new(comm: C, size: usize) -> Self {
        Self::with_decomposition(Decomposition::new(comm, Method::Div), size)
    }

    /// `(decomp, size)` constructor mode.
    pub fn with_decomposition(decomp: Decomposition<C>, size: usize) -> Self {
        let slab_size = decomp.local_slab_size(size);
        let local = vec![T::default(); slab_size];
        let window = decomp.comm().create_window(local);
        Self {
            decomp,
            size,
            window,
        }
    }

    /// `(stencil, size)` constructor mode.
    pub fn with_stencil(comm: C, stencil: Stencil, size: usize) -> Self {
        Self::with_decomposition(Decomposition::with_stencil(comm, stencil), size)
    }

    /// `(radius, periodic, size)` constructor mode.
    pub fn with_radius(comm: C, radius: Radius, periodic: bool, size: usize) -> Self {
        Self::with_stencil(comm, Stencil::new(radius, periodic), size)
    }
}

impl<T: Copy + Send + Sync + 'static, C: Communicator> DistributedVector<T, C> {
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn decomposition(&self) -> &Decomposition<C> {
        &self.decomp
    }

    pub fn comm(&self) -> &C {
        self.decomp.comm()
    }

    /// The local slab offset `global_index` resides at on its owning rank.
    ///
    /// Equal to `radius.prev` for every rank except the two edges, which
    /// own their boundary range at offset 0 / immediately after the
    /// interior rather than behind a leading/trailing ghost — see
    /// [`Decomposition::rank_extent`]'s boundary handling.
    pub(crate) fn local_offset(&self, global_index: usize) -> usize {
        self.decomp.rank_offset(global_index, self.size).1
    }

    /// Refreshes this vector's ghost cells from its neighbors' interiors via
    /// `halo`. A no-op when the stencil has zero radius. Visibility to other
    /// ranks still requires a subsequent [`DistributedVector::fence`].
    pub fn exchange(&self, halo: &HaloManager<C>) -> Result<(), HaloError> {
        halo.exchange(&self.window, &self.decomp, self.size)
    }

    /// Splits `src` (valid only on `root`) according to this vector's
    /// decomposition and one-sidedly writes each rank's chunk into its slab.
    ///
    /// Unlike [`dray_comm::Communicator::scatter`] (equal-size chunks), the
    /// per-rank chunk sizes here follow [`Decomposition::rank_extent`], which
    /// may be uneven when `size` doesn't divide evenly across ranks. Every
    /// rank must call this (non-root ranks pass `None`), but only `root`
    /// performs any writes; visibility to other ranks still requires a
    /// subsequent [`DistributedVector::fence`] — after `scatter` and a
    /// `fence`, `dv[i] == src[i]`.
    pub fn scatter(&self, src: Option<&[T]>, root: usize) -> Result<(), VectorError> {
        if self.comm().rank() != root {
            return Ok(());
        }
        let src = src.ok_or(VectorError::ScatterMissingRoot { root })?;
        if src.len() != self.size {
            return Err(VectorError::ScatterSizeMismatch {
                expected: self.size,
                actual: src.len(),
            });
        }
        for target in 0..self.comm().size() {
            let extent = self.decomp.rank_extent(self.size, target);
            if extent.interior_len == 0 {
                continue;
            }
            let chunk = &src[extent.first_interior_index..extent.first_interior_index + extent.interior_len];
            let offset = self.local_offset(extent.first_interior_index);
            self.window.put_range(target, offset, chunk);
        }
        Ok(())
    }

    /// Concatenates every rank's interior into `dst` (valid only on `root`)
    /// in rank order.
    pub fn gather(&self, dst: Option<&mut [T]>, root: usize) -> Result<(), VectorError> {
        if self.comm().rank() != root {
            return Ok(());
        }
        let dst = dst.ok_or(VectorError::GatherMissingRoot { root })?;
        if dst.len() != self.size {
            return Err(VectorError::GatherSizeMismatch {
                expected: self.size,
                actual: dst.len(),
            });
        }
        for source in 0..self.comm().size() {
            let extent = self.decomp.rank_extent(self.size, source);
            if extent.interior_len == 0 {
                continue;
            }
            let slice = &mut dst[extent.first_interior_index..extent.first_interior_index + extent.interior_len];
            let offset = self.local_offset(extent.first_interior_index);
            self.window.get_range(source, offset, slice);
        }
        Ok(())
    }

    pub fn at(&self, index: usize) -> dray_proxy::XRef<'_, Self> {
        XIterator::new(self, index).at()
    }

    pub fn begin(&self) -> XIterator<'_, Self> {
        XIterator::new(self, 0)
    }

    pub fn end(&self) -> XIterator<'_, Self> {
        XIterator::new(self, self.size)
    }

    pub fn iter(&self) -> XRange<'_, Self> {
        XRange::new(self.begin(), self.end())
    }

    pub fn fence(&self) {
        self.window.fence();
    }

    pub fn flush(&self, rank: usize) {
        self.window.flush(rank);
    }

    /// The local slab, including halo cells where present.
    pub fn local(&self) -> std::sync::Arc<std::sync::Mutex<Vec<T>>> {
        self.window.local()
    }

    /// `true` iff `other` shares this vector's decomposition and size.
    pub fn conforms(&self, other: &Self) -> bool {
        self.decomp == other.decomp && self.size == other.size
    }

    /// `true` iff `[first, last)` spans this entire container; `last`
    /// defaults to [`DistributedVector::end`].
    pub fn congruent(&self, first: XIterator<'_, Self>, last: Option<XIterator<'_, Self>>) -> bool {
        let last = last.unwrap_or_else(|| self.end());
        std::ptr::eq(first.container(), self)
            && std::ptr::eq(last.container(), self)
            && first.index() == 0
            && last.index() == self.size
    }

    /// One handle per rank, in rank order, each exposing that rank's
    /// interior as a locally-iterable range.
    pub fn segments(&self) -> Vec<Segment<'_, T, C>> {
        (0..self.comm().size())
            .map(|rank| {
                let extent = self.decomp.rank_extent(self.size, rank);
                Segment::new(self, rank, extent.first_interior_index, extent.interior_len)
            })
            .collect()
    }
}

/// Fills every logical index with a single value — the `(count, value,
/// decomp)` constructor mode. Resolved as "allocate and fence the window
/// first, then `put` `value` into every interior index and fence again"
/// rather than pre-seeding the slab at allocation time, so the fill itself
/// exercises the same RMA path as any other write.
pub struct DistributedVectorBuilder<T> {
    value: T,
}

impl<T: Copy + Send + Sync + 'static> DistributedVectorBuilder<T> {
    pub fn fill(value: T) -> Self {
        Self { value }
    }

    pub fn build<C: Communicator>(self, decomp: Decomposition<C>, size: usize) -> DistributedVector<T, C>
    where
        T: Default,
    {
        let dv = DistributedVector::with_decomposition(decomp, size);
        let rank = dv.comm().rank();
        let extent = dv.decomp.rank_extent(size, rank);
        for k in 0..extent.interior_len {
            dv.at(extent.first_interior_index + k)
                .set(self.value);
        }
        dv.fence();
        dv
    }
}

impl<T: Copy + Send + Sync + 'static, C: Communicator> RemoteRead for DistributedVector<T, C> {
    type Element = T;

    fn get(&self, index: usize) -> T {
        let (rank, offset) = self.decomp.rank_offset(index, self.size);
        tracing::trace!(index, rank, offset, "distributed vector get");
        self.window.get(rank, offset)
    }
}

impl<T: Copy + Send + Sync + 'static, C: Communicator> RemoteWrite for DistributedVector<T, C> {
    fn put(&self, index: usize, value: T) {
        let (rank, offset) = self.decomp.rank_offset(index, self.size);
        tracing::trace!(index, rank, offset, "distributed vector put");
        self.window.put(rank, offset, value);
    }
}
