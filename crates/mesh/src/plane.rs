use crate::mesh::{Mesh, MeshError};
use glam::{Vec2, Vec3};

/// Size and subdivision counts of a generated plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSpec {
    pub width: f32,
    pub height: f32,
    pub subdivisions_x: u32,
    pub subdivisions_y: u32,
}

impl PlaneSpec {
    /// The unit plane the terrain sketch displaces: 1x1, 250x250 quads.
    pub const TERRAIN: Self = Self {
        width: 1.0,
        height: 1.0,
        subdivisions_x: 250,
        subdivisions_y: 250,
    };

    pub fn new(width: f32, height: f32, subdivisions_x: u32, subdivisions_y: u32) -> Self {
        Self {
            width,
            height,
            subdivisions_x,
            subdivisions_y,
        }
    }

    /// Vertex count: `(x + 1) * (y + 1)`.
    pub fn vertex_count(&self) -> u64 {
        (self.subdivisions_x as u64 + 1) * (self.subdivisions_y as u64 + 1)
    }

    /// Triangle count: two per quad.
    pub fn triangle_count(&self) -> u64 {
        2 * self.subdivisions_x as u64 * self.subdivisions_y as u64
    }

    fn check(&self) -> Result<(), MeshError> {
        if self.subdivisions_x == 0 || self.subdivisions_y == 0 {
            return Err(MeshError::ZeroSubdivisions {
                x: self.subdivisions_x,
                y: self.subdivisions_y,
            });
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.width) || !positive(self.height) {
            return Err(MeshError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        let vertices = self.vertex_count();
        if vertices > u32::MAX as u64 {
            return Err(MeshError::IndexOverflow { vertices });
        }
        Ok(())
    }
}

impl Default for PlaneSpec {
    fn default() -> Self {
        Self::TERRAIN
    }
}

/// Generate a plane in the XY plane, centered on the origin, facing +Z.
///
/// Rows run top to bottom (+Y to -Y), columns left to right. UVs have
/// `v` flipped so the top row sits at `v = 1`.
pub fn plane(spec: &PlaneSpec) -> Result<Mesh, MeshError> {
    spec.check()?;

    let nx = spec.subdivisions_x;
    let ny = spec.subdivisions_y;
    let vertex_count = spec.vertex_count() as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    let mut cells = Vec::with_capacity(spec.triangle_count() as usize);

    for iy in 0..=ny {
        for ix in 0..=nx {
            let u = ix as f32 / nx as f32;
            let v = iy as f32 / ny as f32;
            positions.push(Vec3::new(
                -spec.width / 2.0 + u * spec.width,
                spec.height / 2.0 - v * spec.height,
                0.0,
            ));
            uvs.push(Vec2::new(u, 1.0 - v));

            if iy < ny && ix < nx {
                let row = iy * (nx + 1);
                let next_row = (iy + 1) * (nx + 1);
                cells.push([row + ix, next_row + ix + 1, row + ix + 1]);
                cells.push([next_row + ix + 1, row + ix, next_row + ix]);
            }
        }
    }

    tracing::debug!(
        vertices = positions.len(),
        triangles = cells.len(),
        "generated {}x{} plane",
        nx,
        ny
    );

    Ok(Mesh {
        positions,
        uvs,
        cells,
    })
}

/// Lay a [`plane`] flat on the ground in place.
///
/// Equivalent to a quarter turn about X followed by a half-unit shift on X
/// and Z. Swapping Y and Z directly leaves `y == 0` with no rounding residue.
pub fn remap_to_ground(mesh: &mut Mesh) {
    for position in &mut mesh.positions {
        let Vec3 { x, y: z, z: y } = *position;
        *position = Vec3::new(x + 0.5, y, z + 0.5);
    }
}

/// The grid the terrain shaders displace: [`PlaneSpec::TERRAIN`] laid on the ground.
pub fn terrain_grid() -> Result<Mesh, MeshError> {
    let mut mesh = plane(&PlaneSpec::TERRAIN)?;
    remap_to_ground(&mut mesh);
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use std::f32::consts::FRAC_PI_2;

    fn ground_transform() -> Mat4 {
        Mat4::from_translation(Vec3::new(0.5, 0.0, 0.5)) * Mat4::from_rotation_x(FRAC_PI_2)
    }

    #[test]
    fn vertex_and_uv_counts_match_subdivisions() {
        let spec = PlaneSpec::new(1.0, 1.0, 4, 3);
        let mesh = plane(&spec).unwrap();
        assert_eq!(mesh.positions.len(), 5 * 4);
        assert_eq!(mesh.uvs.len(), mesh.positions.len());
        assert_eq!(mesh.cells.len(), 2 * 4 * 3);
    }

    #[test]
    fn all_indices_in_bounds() {
        let mesh = plane(&PlaneSpec::new(2.0, 1.0, 7, 5)).unwrap();
        let n = mesh.positions.len() as u32;
        assert!(mesh.cells.iter().flatten().all(|&i| i < n));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn single_quad_layout() {
        let mesh = plane(&PlaneSpec::new(1.0, 1.0, 1, 1)).unwrap();
        assert_eq!(
            mesh.positions,
            vec![
                Vec3::new(-0.5, 0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
            ]
        );
        assert_eq!(
            mesh.uvs,
            vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
            ]
        );
        assert_eq!(mesh.cells, vec![[0, 3, 1], [3, 0, 2]]);
    }

    #[test]
    fn zero_subdivisions_rejected() {
        let err = plane(&PlaneSpec::new(1.0, 1.0, 0, 4)).unwrap_err();
        assert_eq!(err, MeshError::ZeroSubdivisions { x: 0, y: 4 });
    }

    #[test]
    fn non_positive_size_rejected() {
        assert!(matches!(
            plane(&PlaneSpec::new(0.0, 1.0, 2, 2)),
            Err(MeshError::InvalidSize { .. })
        ));
        assert!(matches!(
            plane(&PlaneSpec::new(1.0, f32::NAN, 2, 2)),
            Err(MeshError::InvalidSize { .. })
        ));
    }

    #[test]
    fn oversized_grid_rejected_before_allocating() {
        let spec = PlaneSpec::new(1.0, 1.0, u32::MAX, 2);
        assert!(matches!(
            plane(&spec),
            Err(MeshError::IndexOverflow { .. })
        ));
    }

    #[test]
    fn remap_lies_flat_in_unit_square() {
        let mut mesh = plane(&PlaneSpec::new(1.0, 1.0, 10, 10)).unwrap();
        remap_to_ground(&mut mesh);
        for p in &mesh.positions {
            assert_eq!(p.y, 0.0);
            assert!((0.0..=1.0).contains(&p.x), "x out of range: {p}");
            assert!((0.0..=1.0).contains(&p.z), "z out of range: {p}");
        }
    }

    #[test]
    fn remap_matches_ground_transform() {
        let mut mesh = plane(&PlaneSpec::new(1.0, 1.0, 6, 6)).unwrap();
        let expected: Vec<Vec3> = mesh
            .positions
            .iter()
            .map(|&p| ground_transform().transform_point3(p))
            .collect();
        remap_to_ground(&mut mesh);
        for (got, want) in mesh.positions.iter().zip(&expected) {
            assert!(got.abs_diff_eq(*want, 1e-6), "{got} != {want}");
        }
    }

    #[test]
    fn terrain_grid_shape() {
        let mesh = terrain_grid().unwrap();
        assert_eq!(mesh.positions.len(), 251 * 251);
        assert_eq!(mesh.uvs.len(), 251 * 251);
        assert_eq!(mesh.cells.len(), 2 * 250 * 250);
        assert!(mesh.validate().is_ok());

        let (min, max) = mesh.bounds();
        assert!(min.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(max.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn terrain_grid_is_deterministic() {
        assert_eq!(terrain_grid().unwrap(), terrain_grid().unwrap());
    }
}
