/// Ghost-cell radius in elements, `(prev, next)` — the stencil / halo
/// radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Radius {
    pub prev: usize,
    pub next: usize,
}

impl Radius {
    pub const fn none() -> Self {
        Self { prev: 0, next: 0 }
    }

    pub const fn new(prev: usize, next: usize) -> Self {
        Self { prev, next }
    }

    pub fn is_none(&self) -> bool {
        self.prev == 0 && self.next == 0
    }
}

/// Stencil specification for a dense distributed vector.
///
/// `periodic` resolves a deliberate design choice: periodicity is
/// **not** encoded into `rank_offset` (the addressing layer never wraps);
/// it is consulted only by the halo manager's `exchange()`, so that
/// rank 0's leading ghost and rank `P-1`'s trailing ghost are filled from
/// the opposite end of the vector when `periodic` is set, and left
/// untouched otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stencil {
    pub radius: Radius,
    pub periodic: bool,
}

impl Stencil {
    pub const fn none() -> Self {
        Self {
            radius: Radius::none(),
            periodic: false,
        }
    }

    pub const fn new(radius: Radius, periodic: bool) -> Self {
        Self { radius, periodic }
    }

    /// Convenience constructor matching the `(radius, periodic, size)` dense
    /// vector constructor mode, for a symmetric radius.
    pub const fn symmetric(radius: usize, periodic: bool) -> Self {
        Self {
            radius: Radius::new(radius, radius),
            periodic,
        }
    }
}
