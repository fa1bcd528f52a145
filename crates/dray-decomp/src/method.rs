/// Partitioning policy tag.
///
/// `BlockCyclic`/`Cyclic` are only meaningful without a stencil halo: a
/// stencil assumes each rank owns one contiguous interior run so its two
/// ghost regions mirror exactly one neighbor on each side, which block-cyclic
/// and cyclic distributions do not provide. Combining either with a nonzero
/// [`crate::Radius`] is a precondition violation, checked in
/// [`crate::Decomposition::rank_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Equal contiguous split: `ceil(n / size())` elements per rank.
    Div,
    /// Round-robin: index `i` owned by rank `i % size()`.
    Cyclic,
    /// Blocks of `block_size` elements dealt round-robin across ranks.
    BlockCyclic(usize),
}

impl Default for Method {
    fn default() -> Self {
        Method::Div
    }
}
