//! Decomposition & stencil: maps a global linear index to a `(rank,
//! local_offset)` pair under a chosen partitioning method, and inflates the
//! per-rank slab to hold stencil ghost cells.

mod method;
mod stencil;

pub use method::Method;
pub use stencil::{Radius, Stencil};

use dray_comm::Communicator;

fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}

/// Per-rank shape produced by a decomposition for a given global size:
/// `(local_slab_size, first_interior_index, last_interior_index)`.
///
/// Stores `interior_len` rather than a literal `last_interior_index` field
/// so the `N < P` boundary case (some ranks hold zero interior elements) has
/// an unambiguous representation instead of requiring an inclusive bound
/// below `first_interior_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankExtent {
    pub local_slab_size: usize,
    pub first_interior_index: usize,
    pub interior_len: usize,
}

impl RankExtent {
    /// This rank's inclusive last interior index, or `None` when its
    /// interior is empty.
    pub fn last_interior_index(&self) -> Option<usize> {
        (self.interior_len > 0).then(|| self.first_interior_index + self.interior_len - 1)
    }
}

/// An immutable value carrying a partitioning method, a communicator, and
/// (for dense vectors) a stencil radius.
///
/// Equality is used by [`Decomposition::conforms`]-style checks to
/// determine conformance between two containers: two decompositions
/// compare equal when they share the same method, stencil,
/// and communicator *size* — the communicator identity itself is
/// deliberately excluded, since conformance is about shape, not which
/// process object happens to back it.
#[derive(Debug, Clone)]
pub struct Decomposition<C> {
    method: Method,
    stencil: Stencil,
    comm: C,
}

impl<C: Communicator> Decomposition<C> {
    pub fn new(comm: C, method: Method) -> Self {
        Self {
            method,
            stencil: Stencil::none(),
            comm,
        }
    }

    pub fn with_stencil(comm: C, stencil: Stencil) -> Self {
        Self {
            method: Method::Div,
            stencil,
            comm,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn stencil(&self) -> Stencil {
        self.stencil
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Size of the *interior* slice owned by any one rank, before ghost
    /// cells are added (`slice_size = slab − prev − next`).
    ///
    /// For [`Method::Div`] this is uniform across ranks (`ceil((n - prev -
    /// next) / size())`), which is what lets [`Decomposition::rank_offset`]
    /// stay branch-light and O(1): every rank can compute any other rank's
    /// extent without a lookup table.
    pub fn interior_slice_size(&self, n: usize) -> usize {
        let radius = self.stencil.radius;
        match self.method {
            Method::Div => div_ceil(n - radius.prev - radius.next, self.comm.size()),
            Method::Cyclic | Method::BlockCyclic(_) => {
                assert!(radius.is_none(), "stencil halo requires Method::Div");
                0
            }
        }
    }

    /// Total local slab size including both ghost regions: `slab =
    /// ceil((N − prev − next)/P) + prev + next`.
    pub fn local_slab_size(&self, n: usize) -> usize {
        let radius = self.stencil.radius;
        self.interior_slice_size(n) + radius.prev + radius.next
    }

    /// The hot-path addressing function: must be branch-light, O(1), and
    /// pure. Returns `(owning_rank, local_offset)` for global index `i`.
    ///
    /// `local_offset` follows the literal formula `i − rank·slice_size`,
    /// which — because every rank's slab is laid
    /// out `[leading ghost][interior][trailing ghost]` with the *same*
    /// `slice_size` — also happens to be the correct byte offset into that
    /// rank's own slab buffer, not merely an "interior-relative" index: for
    /// `rank`'s first interior element (global index `rank*slice + prev`),
    /// the formula yields `prev`, exactly where that rank's interior begins
    /// after its leading ghost cells.
    pub fn rank_offset(&self, i: usize, n: usize) -> (usize, usize) {
        let p = self.comm.size();
        match self.method {
            Method::Div => {
                let radius = self.stencil.radius;
                let slice = self.interior_slice_size(n);
                let rank = if i < radius.prev {
                    0
                } else if i >= n - radius.next {
                    p - 1
                } else {
                    (i - radius.prev) / slice
                };
                let offset = i - rank * slice;
                (rank, offset)
            }
            Method::Cyclic => {
                assert!(self.stencil.radius.is_none(), "stencil halo requires Method::Div");
                (i % p, i / p)
            }
            Method::BlockCyclic(block) => {
                assert!(self.stencil.radius.is_none(), "stencil halo requires Method::Div");
                assert!(block > 0, "block_cyclic block size must be nonzero");
                let block_index = i / block;
                let rank = block_index % p;
                let offset = (block_index / p) * block + i % block;
                (rank, offset)
            }
        }
    }

    /// Per-rank shape. Only meaningful for [`Method::Div`]:
    /// cyclic/block-cyclic distributions don't have a single contiguous
    /// "interior run" per rank, so `first_interior_index`/
    /// `last_interior_index` are undefined for them and this panics.
    pub fn rank_extent(&self, n: usize, rank: usize) -> RankExtent {
        assert_eq!(
            self.method,
            Method::Div,
            "rank_extent is only defined for Method::Div"
        );
        let radius = self.stencil.radius;
        let p = self.comm.size();
        let slice = self.interior_slice_size(n);
        let first = rank * slice + radius.prev;
        // Exclusive bound, clamped to the global interior's own exclusive
        // bound (`n - radius.next`) so short last slices and the `N < P`
        // case (some ranks past the interior entirely) both fall out of the
        // same formula instead of needing their own branches.
        let interior_end = n.saturating_sub(radius.next);
        let last_exclusive = (first + slice).min(interior_end);
        // Rank 0 and rank `size()-1` own the boundary ranges `[0, prev)` /
        // `[n-next, n)` directly: there's no neighbor on that side for them
        // to mirror instead, so `rank_offset` already routes those indices
        // to them (see its own boundary branches) and the reported interior
        // has to agree, or scatter/gather/segments would silently skip them.
        let first = if rank == 0 { 0 } else { first };
        let last_exclusive = if rank + 1 == p { n } else { last_exclusive };
        let interior_len = last_exclusive.saturating_sub(first);
        RankExtent {
            local_slab_size: self.local_slab_size(n),
            first_interior_index: first,
            interior_len,
        }
    }
}

impl<C: Communicator> PartialEq for Decomposition<C> {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.stencil == other.stencil
            && self.comm.size() == other.comm.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dray_comm::thread;

    #[test]
    fn div_rank_offset_partitions_exactly() {
        thread::run(3, |comm| {
            let decomp = Decomposition::new(comm.clone(), Method::Div);
            let n = 10;
            let mut owners = vec![0usize; n];
            for i in 0..n {
                let (rank, _) = decomp.rank_offset(i, n);
                owners[i] = rank;
            }
            // every index owned by exactly one rank in range
            assert!(owners.iter().all(|&r| r < comm.size()));
        });
    }

    #[test]
    fn div_with_halo_matches_hand_worked_example() {
        thread::run(2, |comm| {
            let stencil = Stencil::new(Radius::new(2, 1), false);
            let decomp = Decomposition::with_stencil(comm.clone(), stencil);
            let n = 20;
            // slice = ceil((20-3)/2) = 9
            assert_eq!(decomp.interior_slice_size(n), 9);
            assert_eq!(decomp.local_slab_size(n), 12);
            // first interior element of rank 1 is global index 11
            assert_eq!(decomp.rank_offset(11, n), (1, 2));
            // rank 0 leading ghost
            assert_eq!(decomp.rank_offset(0, n), (0, 0));
            assert_eq!(decomp.rank_offset(1, n), (0, 1));
        });
    }

    #[test]
    fn cyclic_round_robins() {
        thread::run(3, |comm| {
            let decomp = Decomposition::new(comm.clone(), Method::Cyclic);
            assert_eq!(decomp.rank_offset(0, 10), (0, 0));
            assert_eq!(decomp.rank_offset(1, 10), (1, 0));
            assert_eq!(decomp.rank_offset(3, 10), (0, 1));
        });
    }

    #[test]
    fn rank_extent_handles_more_ranks_than_elements() {
        thread::run(4, |comm| {
            let decomp = Decomposition::new(comm.clone(), Method::Div);
            let n = 2; // fewer elements than ranks
            let extent = decomp.rank_extent(n, comm.rank());
            if comm.rank() < n {
                assert_eq!(extent.interior_len, 1);
                assert_eq!(extent.last_interior_index(), Some(extent.first_interior_index));
            } else {
                assert_eq!(extent.interior_len, 0);
                assert_eq!(extent.last_interior_index(), None);
            }
        });
    }

    #[test]
    fn conforms_iff_method_stencil_and_size_match() {
        thread::run(2, |comm| {
            let a = Decomposition::new(comm.clone(), Method::Div);
            let b = Decomposition::new(comm.clone(), Method::Div);
            let c = Decomposition::new(comm.clone(), Method::Cyclic);
            assert_eq!(a, b);
            assert_ne!(a, c);
        });
    }

    #[test]
    fn rank_extent_includes_boundary_owned_by_edge_ranks() {
        thread::run(2, |comm| {
            let stencil = Stencil::new(Radius::new(2, 1), false);
            let decomp = Decomposition::with_stencil(comm.clone(), stencil);
            let n = 20;
            let rank0 = decomp.rank_extent(n, 0);
            let rank1 = decomp.rank_extent(n, 1);
            // rank 0 has no left neighbor, so it owns the leading boundary
            // [0, 2) directly rather than leaving it unaddressed.
            assert_eq!(rank0.first_interior_index, 0);
            assert_eq!(rank0.interior_len, 11);
            // rank 1 (the last rank) owns the trailing boundary [19, 20).
            assert_eq!(rank1.first_interior_index, 11);
            assert_eq!(rank1.interior_len, 9);
            assert_eq!(rank0.interior_len + rank1.interior_len, n);
        });
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use dray_comm::thread;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// `rank_extent`'s reported ranges must partition `[0, n)` exactly
        /// once across every rank, for any stencil radius compatible with
        /// `n` — the property `rank_extent`'s boundary handling used to
        /// violate for the edge ranks.
        #[test]
        fn rank_extents_partition_0_n_exactly_once(
            n in 0usize..30,
            p in 1usize..6,
            prev in 0usize..3,
            next in 0usize..3,
        ) {
            prop_assume!(n >= prev + next);
            let stencil = Stencil::new(Radius::new(prev, next), false);
            let extents: Vec<RankExtent> = thread::run(p, move |comm| {
                let decomp = Decomposition::with_stencil(comm.clone(), stencil);
                decomp.rank_extent(n, comm.rank())
            });

            let mut covered = vec![false; n];
            for extent in &extents {
                for i in extent.first_interior_index..extent.first_interior_index + extent.interior_len {
                    prop_assert!(!covered[i], "index {i} covered by more than one rank");
                    covered[i] = true;
                }
            }
            prop_assert!(covered.iter().all(|&c| c), "every index in 0..n must be covered exactly once");
        }

        /// The rank `rank_offset` assigns index `i` to must be the same rank
        /// whose `rank_extent` reports `i` inside its interior — the two
        /// addressing functions have to agree on ownership.
        #[test]
        fn rank_offset_owner_matches_the_extent_that_contains_each_index(
            n in 1usize..30,
            p in 1usize..6,
        ) {
            let results: Vec<(RankExtent, Vec<usize>)> = thread::run(p, move |comm| {
                let decomp = Decomposition::new(comm.clone(), Method::Div);
                let extent = decomp.rank_extent(n, comm.rank());
                let owners: Vec<usize> = (0..n).map(|i| decomp.rank_offset(i, n).0).collect();
                (extent, owners)
            });
            let extents: Vec<RankExtent> = results.iter().map(|(e, _)| *e).collect();
            let owners = &results[0].1;

            for (i, &owner) in owners.iter().enumerate() {
                let extent = &extents[owner];
                prop_assert!(
                    i >= extent.first_interior_index && i < extent.first_interior_index + extent.interior_len,
                    "index {i} owned by rank {owner} per rank_offset, but not contained in that rank's extent"
                );
            }
        }
    }
}
