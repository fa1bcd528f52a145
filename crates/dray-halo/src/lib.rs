//! Halo manager: allocates and refreshes the two ghost regions at the ends
//! of a rank's local slab.
//!
//! Halo exchange is **explicit**: it only runs when [`HaloManager::exchange`]
//! is called, never implicitly from element-wise `get`/`put`.

mod error;

pub use error::HaloError;

use dray_comm::{Communicator, Window};
use dray_decomp::Decomposition;

/// Owns no state of its own: ghost cells live inside the container's own
/// window slab, laid out `[leading ghost][interior][trailing ghost]`. This
/// type is just the operation that refreshes them.
pub struct HaloManager<C: Communicator> {
    comm: C,
}

impl<C: Communicator> HaloManager<C> {
    pub fn new(comm: C) -> Self {
        Self { comm }
    }

    /// Refreshes both ghost regions of this rank's slab from its neighbors'
    /// interiors. A no-op when the stencil has zero radius.
    ///
    /// Periodic wraparound (resolved in [`dray_decomp::Stencil`]'s docs) is
    /// handled here: when
    /// `decomp.stencil().periodic` is set, rank 0's leading neighbor is
    /// rank `size()-1` and rank `size()-1`'s trailing neighbor is rank 0;
    /// otherwise those edge ranks have no neighbor on that side and their
    /// corresponding ghost region is left untouched.
    ///
    /// Does not itself fence: whether a rank has a neighbor on a given side
    /// varies by rank (edge ranks skip one side), so any fatal condition
    /// here is inherently rank-asymmetric and must not be followed by a
    /// rank-symmetric collective inside the same call. Callers that need
    /// the stronger cross-rank visibility guarantee should call
    /// `window.fence()` themselves once every rank's `exchange` has
    /// returned `Ok`.
    pub fn exchange<T: Copy>(
        &self,
        window: &Window<T, C>,
        decomp: &Decomposition<C>,
        n: usize,
    ) -> Result<(), HaloError> {
        let stencil = decomp.stencil();
        let radius = stencil.radius;
        if radius.is_none() {
            return Ok(());
        }

        let rank = self.comm.rank();
        let p = self.comm.size();
        let slice = decomp.interior_slice_size(n);

        if radius.prev > 0 {
            let neighbor = if rank > 0 {
                Some(rank - 1)
            } else if stencil.periodic && p > 1 {
                Some(p - 1)
            } else {
                None
            };
            if let Some(src_rank) = neighbor {
                if slice < radius.prev {
                    return Err(HaloError::RadiusExceedsNeighbor {
                        radius: radius.prev,
                        neighbor_interior: slice,
                    });
                }
                // Neighbor's interior occupies slab offsets
                // [radius.prev, radius.prev + slice); we want its last
                // `radius.prev` elements, which start at `slice` (since
                // radius.prev + slice - radius.prev == slice).
                let src_start = slice;
                for k in 0..radius.prev {
                    let value = window.get(src_rank, src_start + k);
                    window.put(rank, k, value);
                }
            }
        }

        if radius.next > 0 {
            let neighbor = if rank + 1 < p {
                Some(rank + 1)
            } else if stencil.periodic && p > 1 {
                Some(0)
            } else {
                None
            };
            if let Some(src_rank) = neighbor {
                if slice < radius.next {
                    return Err(HaloError::RadiusExceedsNeighbor {
                        radius: radius.next,
                        neighbor_interior: slice,
                    });
                }
                // Neighbor's interior starts right after its own leading
                // ghost, at offset `radius.prev`.
                let src_start = radius.prev;
                let dst_start = radius.prev + slice;
                for k in 0..radius.next {
                    let value = window.get(src_rank, src_start + k);
                    window.put(rank, dst_start + k, value);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dray_comm::thread;
    use dray_decomp::{Radius, Stencil};

    #[test]
    fn exchange_fills_interior_neighbors_non_periodic() {
        let n = 12usize;
        let stencil = Stencil::new(Radius::new(1, 1), false);
        let results: Vec<Vec<i32>> = thread::run(3, move |comm| {
            let decomp = Decomposition::with_stencil(comm.clone(), stencil);
            let slab_size = decomp.local_slab_size(n);
            let extent = decomp.rank_extent(n, comm.rank());
            let mut local = vec![0i32; slab_size];
            let first = extent.first_interior_index;
            for k in 0..extent.interior_len {
                local[1 + k] = (first + k) as i32;
            }
            let window = comm.create_window(local);
            let halo = HaloManager::new(comm.clone());
            halo.exchange(&window, &decomp, n).unwrap();
            window.local().lock().unwrap().clone()
        });

        // rank 0 has no real leading neighbor (non periodic): slab[0] stays 0.
        assert_eq!(results[0][0], 0);
        // rank 0's trailing ghost mirrors rank 1's first interior element.
        assert_eq!(*results[0].last().unwrap(), results[1][1]);
        // rank 1's leading ghost mirrors rank 0's last interior element.
        assert_eq!(results[1][0], results[0][results[0].len() - 2]);
    }

    #[test]
    fn exchange_wraps_around_when_periodic() {
        let n = 9usize;
        let stencil = Stencil::new(Radius::new(1, 1), true);
        let results: Vec<Vec<i32>> = thread::run(3, move |comm| {
            let decomp = Decomposition::with_stencil(comm.clone(), stencil);
            let slab_size = decomp.local_slab_size(n);
            let extent = decomp.rank_extent(n, comm.rank());
            let mut local = vec![-1i32; slab_size];
            let first = extent.first_interior_index;
            for k in 0..extent.interior_len {
                local[1 + k] = (first + k) as i32;
            }
            let window = comm.create_window(local);
            let halo = HaloManager::new(comm.clone());
            halo.exchange(&window, &decomp, n).unwrap();
            window.local().lock().unwrap().clone()
        });

        // rank 0's leading ghost now mirrors the last rank's last interior element.
        let last_rank = results.len() - 1;
        assert_eq!(results[0][0], *results[last_rank].get(results[last_rank].len() - 2).unwrap());
        // last rank's trailing ghost mirrors rank 0's first interior element.
        assert_eq!(*results[last_rank].last().unwrap(), results[0][1]);
    }

    #[test]
    fn exchange_reports_radius_larger_than_neighbor_interior() {
        let n = 4usize;
        let stencil = Stencil::new(Radius::new(3, 0), false);
        let results: Vec<Result<(), HaloError>> = thread::run(2, move |comm| {
            let decomp = Decomposition::with_stencil(comm.clone(), stencil);
            let slab_size = decomp.local_slab_size(n);
            let window = comm.create_window(vec![0i32; slab_size]);
            let halo = HaloManager::new(comm.clone());
            halo.exchange(&window, &decomp, n)
        });
        assert!(results.iter().any(|r| r.is_err()));
    }
}
