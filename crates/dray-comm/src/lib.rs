//! Communicator façade: abstracts rank/size, collectives, and one-sided RMA
//! window operations behind a single trait so the rest of the workspace
//! never hard-codes a transport.
//!
//! `ThreadCommunicator` (see [`thread`]) is the only backend shipped here: it
//! simulates an SPMD group as OS threads inside one process. There is no real
//! network transport in this workspace — message passing is treated as a
//! black-box collaborator, and a real MPI/UCX binding is out of scope. The
//! in-process backend exists so the rest of the crates (and their tests)
//! have something to run the distributed contracts against.

mod error;
pub mod thread;
mod window;

pub use error::CommError;
pub use thread::ThreadCommunicator;
pub use window::Window;

/// Abstracts rank, size, collectives, and RMA window lifecycle.
///
/// Implementors are SPMD group handles: cheap to clone, one per rank, all
/// sharing whatever state backs the group's collectives and windows.
pub trait Communicator: Clone + Send + Sync + 'static {
    /// This rank's index in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks participating in this communicator group.
    fn size(&self) -> usize;

    /// Splits `src` (valid only on `root`) into `size()` equal chunks and
    /// copies this rank's chunk into `dst`.
    fn scatter<T: Copy + Send + Sync + 'static>(
        &self,
        src: Option<&[T]>,
        dst: &mut [T],
        root: usize,
    ) -> Result<(), CommError>;

    /// Concatenates every rank's `src` into `dst`, valid only on `root`.
    fn gather<T: Copy + Send + Sync + 'static>(
        &self,
        src: &[T],
        dst: Option<&mut [T]>,
        root: usize,
    ) -> Result<(), CommError>;

    /// Copies `root`'s `buf` to every rank's `buf`.
    fn broadcast<T: Copy + Send + Sync + 'static>(
        &self,
        buf: &mut [T],
        root: usize,
    ) -> Result<(), CommError>;

    /// Collectively registers `local` as this rank's slice of a new RMA
    /// window, then fences so construction completes with the window
    /// globally visible.
    fn create_window<T: Copy + Send + Sync + 'static>(&self, local: Vec<T>) -> Window<T, Self>;

    /// Collective barrier that closes the current RMA epoch.
    fn fence(&self);
}
