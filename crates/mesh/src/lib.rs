//! Mesh: subdivided plane generation for the terrain grid.
//!
//! # Invariants
//! - Every cell index is `< positions.len()`.
//! - `positions` and `uvs` have equal length and share ordering.
//! - Generation is deterministic: the same `PlaneSpec` yields the same mesh.

mod mesh;
mod plane;

pub use mesh::{Mesh, MeshError, MeshStats};
pub use plane::{PlaneSpec, plane, remap_to_ground, terrain_grid};

pub fn crate_info() -> &'static str {
    "gridscape-mesh v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("mesh"));
    }
}
