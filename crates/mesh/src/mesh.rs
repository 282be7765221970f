use glam::{Vec2, Vec3};
use serde::Serialize;

/// Errors from mesh generation and validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("subdivisions must be at least 1, got {x}x{y}")]
    ZeroSubdivisions { x: u32, y: u32 },
    #[error("plane size must be positive and finite, got {width}x{height}")]
    InvalidSize { width: f32, height: f32 },
    #[error("{vertices} vertices do not fit in 32-bit indices")]
    IndexOverflow { vertices: u64 },
    #[error("attribute length mismatch: {positions} positions, {uvs} uvs")]
    AttributeMismatch { positions: usize, uvs: usize },
    #[error("cell {cell} references vertex {index}, but only {count} exist")]
    IndexOutOfBounds { cell: usize, index: u32, count: usize },
}

/// Indexed triangle mesh: positions, texture coordinates and index triples.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub cells: Vec<[u32; 3]>,
}

/// Summary numbers for logging and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshStats {
    pub vertices: usize,
    pub triangles: usize,
    pub min: Vec3,
    pub max: Vec3,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.cells.len()
    }

    /// Flattened index buffer, three entries per cell.
    pub fn indices(&self) -> Vec<u32> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Check the attribute and index invariants.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.positions.len() != self.uvs.len() {
            return Err(MeshError::AttributeMismatch {
                positions: self.positions.len(),
                uvs: self.uvs.len(),
            });
        }
        let count = self.positions.len();
        for (cell, triple) in self.cells.iter().enumerate() {
            if let Some(&index) = triple.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::IndexOutOfBounds { cell, index, count });
            }
        }
        Ok(())
    }

    /// Axis-aligned bounds; both corners are zero for an empty mesh.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut iter = self.positions.iter().copied();
        let Some(first) = iter.next() else {
            return (Vec3::ZERO, Vec3::ZERO);
        };
        iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)))
    }

    pub fn stats(&self) -> MeshStats {
        let (min, max) = self.bounds();
        MeshStats {
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            min,
            max,
        }
    }
}
