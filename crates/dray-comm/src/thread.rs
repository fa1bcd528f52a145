//! In-process SPMD backend: simulates a communicator group of `size` ranks
//! as OS threads inside one process.
//!
//! There is no real fabric here. Collectives are implemented as a rendezvous
//! over a shared, type-erased slot table guarded by a pair of
//! [`std::sync::Barrier`]s: every rank writes its contribution, all ranks
//! wait, every rank reads whichever slots it needs, all ranks wait again
//! before the table can be reused by the next collective call. Because every
//! rank runs the same program in the same order (the SPMD model), a given
//! round always sees the same concrete type across all `size` contributions,
//! so the `Any` downcast inside [`Exchange::round`] never fails in practice.

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex};

use crate::error::CommError;
use crate::window::Window;
use crate::Communicator;

struct Exchange {
    slots: Mutex<Vec<Option<Box<dyn Any + Send>>>>,
    write_barrier: Barrier,
    read_barrier: Barrier,
}

impl Exchange {
    fn new(size: usize) -> Self {
        Self {
            slots: Mutex::new((0..size).map(|_| None).collect()),
            write_barrier: Barrier::new(size),
            read_barrier: Barrier::new(size),
        }
    }

    /// One round of the rendezvous: `rank` publishes `value`, then every
    /// rank runs `read` over the fully-populated slot table.
    fn round<T, R>(&self, rank: usize, value: T, read: impl FnOnce(&[Option<Box<dyn Any + Send>>]) -> R) -> R
    where
        T: Send + 'static,
    {
        {
            let mut slots = self.slots.lock().expect("exchange slots poisoned");
            slots[rank] = Some(Box::new(value) as Box<dyn Any + Send>);
        }
        self.write_barrier.wait();
        let result = {
            let slots = self.slots.lock().expect("exchange slots poisoned");
            read(&slots)
        };
        self.read_barrier.wait();
        result
    }

    /// Every rank contributes a `T`; every rank gets the full, rank-ordered
    /// vector of contributions back.
    fn all_gather<T: Clone + Send + 'static>(&self, rank: usize, value: T) -> Vec<T> {
        self.round(rank, value, |slots| {
            slots
                .iter()
                .map(|slot| {
                    slot.as_ref()
                        .expect("exchange slot missing after write barrier")
                        .downcast_ref::<T>()
                        .expect("exchange type mismatch across ranks")
                        .clone()
                })
                .collect()
        })
    }
}

struct GroupState {
    size: usize,
    fence_barrier: Barrier,
    exchange: Exchange,
}

impl GroupState {
    fn new(size: usize) -> Self {
        Self {
            size,
            fence_barrier: Barrier::new(size),
            exchange: Exchange::new(size),
        }
    }
}

/// In-process SPMD communicator handle. One instance per simulated rank;
/// all instances in a group share a [`GroupState`] via `Arc`.
#[derive(Clone)]
pub struct ThreadCommunicator {
    rank: usize,
    group: Arc<GroupState>,
}

// Hand-rolled: `GroupState` holds synchronization primitives with no
// meaningful `Debug` of their own, so only the externally-visible rank/size
// are printed.
impl std::fmt::Debug for ThreadCommunicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.group.size)
            .finish()
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.group.size
    }

    fn scatter<T: Copy + Send + Sync + 'static>(
        &self,
        src: Option<&[T]>,
        dst: &mut [T],
        root: usize,
    ) -> Result<(), CommError> {
        let contribution = src.map(|s| s.to_vec());
        let all: Vec<Option<Vec<T>>> = self.group.exchange.all_gather(self.rank, contribution);
        let root_data = all[root]
            .as_ref()
            .expect("scatter: root contributed no data");
        let chunk = self.size();
        let expected = dst.len() * chunk;
        if root_data.len() != expected {
            return Err(CommError::ScatterSizeMismatch {
                expected,
                actual: root_data.len(),
            });
        }
        let start = self.rank * dst.len();
        dst.copy_from_slice(&root_data[start..start + dst.len()]);
        Ok(())
    }

    fn gather<T: Copy + Send + Sync + 'static>(
        &self,
        src: &[T],
        dst: Option<&mut [T]>,
        root: usize,
    ) -> Result<(), CommError> {
        let all: Vec<Vec<T>> = self.group.exchange.all_gather(self.rank, src.to_vec());
        if let Some(dst) = dst {
            if self.rank != root {
                return Ok(());
            }
            let total: usize = all.iter().map(|v| v.len()).sum();
            if total != dst.len() {
                return Err(CommError::GatherSizeMismatch {
                    expected: dst.len(),
                    actual: total,
                });
            }
            let mut offset = 0;
            for chunk in &all {
                dst[offset..offset + chunk.len()].copy_from_slice(chunk);
                offset += chunk.len();
            }
        }
        Ok(())
    }

    fn broadcast<T: Copy + Send + Sync + 'static>(
        &self,
        buf: &mut [T],
        root: usize,
    ) -> Result<(), CommError> {
        let contribution = if self.rank == root {
            Some(buf.to_vec())
        } else {
            None
        };
        let all: Vec<Option<Vec<T>>> = self.group.exchange.all_gather(self.rank, contribution);
        let root_data = all[root]
            .as_ref()
            .ok_or(CommError::BroadcastMissingRoot { root })?;
        buf.copy_from_slice(root_data);
        Ok(())
    }

    fn create_window<T: Copy + Send + Sync + 'static>(&self, local: Vec<T>) -> Window<T, Self> {
        let slab = Arc::new(Mutex::new(local));
        let directory: Vec<Arc<Mutex<Vec<T>>>> =
            self.group.exchange.all_gather(self.rank, slab);
        let window = Window::new(self.clone(), directory);
        window.fence();
        window
    }

    fn fence(&self) {
        self.group.fence_barrier.wait();
    }
}

/// Launches `size` simulated ranks, each running `f` with its own
/// [`ThreadCommunicator`] handle, and collects their return values in rank
/// order. Panics in a worker rank propagate as a panic from `run` itself:
/// any communicator-level failure is treated as fatal.
pub fn run<F, R>(size: usize, f: F) -> Vec<R>
where
    F: Fn(ThreadCommunicator) -> R + Sync,
    R: Send,
{
    assert!(size > 0, "communicator group must have at least one rank");
    let group = Arc::new(GroupState::new(size));
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..size)
            .map(|rank| {
                let comm = ThreadCommunicator {
                    rank,
                    group: group.clone(),
                };
                let f = &f;
                scope.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("simulated rank panicked"))
            .collect()
    })
}
