#[derive(Debug, thiserror::Error)]
pub enum HaloError {
    #[error(
        "stencil radius {radius} exceeds neighbor's interior size {neighbor_interior}"
    )]
    RadiusExceedsNeighbor {
        radius: usize,
        neighbor_interior: usize,
    },
}
