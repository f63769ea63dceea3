//! CPU-side triangle mesh data.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;

/// Mesh validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("empty mesh: no geometry found")]
    EmptyMesh,
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch { normals: usize, vertices: usize },
}

/// Indexed triangle geometry.
///
/// Positions and normals are parallel arrays; indices reference them in
/// groups of three. GPU upload is the host's concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates validated mesh data.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        if normals.len() != positions.len() {
            return Err(MeshError::NormalCountMismatch {
                normals: normals.len(),
                vertices: positions.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }
        Ok(Self {
            positions,
            normals,
            indices,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounds of the geometry.
    pub fn compute_bounds(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions.iter().map(|p| Vec3::from(*p)))
    }

    /// A `size` x `size` quad centered at the origin, facing +Z.
    pub fn quad(size: f32) -> Self {
        let half = size * 0.5;
        let normal = [0.0, 0.0, 1.0];
        Self {
            positions: vec![
                [-half, -half, 0.0],
                [half, -half, 0.0],
                [half, half, 0.0],
                [-half, half, 0.0],
            ],
            normals: vec![normal; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// An axis-aligned cube with edge length `size` centered at the origin.
    ///
    /// Four vertices per face so each face has a flat normal.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // +X
            (
                [1.0, 0.0, 0.0],
                [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
            ),
            // -X
            (
                [-1.0, 0.0, 0.0],
                [[-h, -h, h], [-h, h, h], [-h, h, -h], [-h, -h, -h]],
            ),
            // +Y
            (
                [0.0, 1.0, 0.0],
                [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
            ),
            // -Y
            (
                [0.0, -1.0, 0.0],
                [[-h, -h, h], [-h, -h, -h], [h, -h, -h], [h, -h, h]],
            ),
            // +Z
            (
                [0.0, 0.0, 1.0],
                [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
            ),
            // -Z
            (
                [0.0, 0.0, -1.0],
                [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
            ),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = positions.len() as u32;
            positions.extend_from_slice(&corners);
            normals.extend(std::iter::repeat_n(normal, 4));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            positions,
            normals,
            indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_index_validation() {
        let result = MeshData::new(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0.0, 0.0, 1.0]; 3],
            vec![0, 1, 3],
        );
        assert!(matches!(
            result,
            Err(MeshError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_normal_count_validation() {
        let result = MeshData::new(vec![[0.0; 3]; 3], vec![[0.0, 0.0, 1.0]; 2], vec![0, 1, 2]);
        assert!(matches!(result, Err(MeshError::NormalCountMismatch { .. })));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            MeshData::new(vec![], vec![], vec![]),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_quad_bounds() {
        let quad = MeshData::quad(4.0);
        let bounds = quad.compute_bounds();
        assert_relative_eq!(bounds.min.x, -2.0);
        assert_relative_eq!(bounds.max.y, 2.0);
        assert_relative_eq!(bounds.size().z, 0.0);
        assert_eq!(quad.triangle_count(), 2);
    }

    #[test]
    fn test_unit_cube_bounds() {
        let cube = MeshData::cube(1.0);
        let bounds = cube.compute_bounds();
        assert_relative_eq!(bounds.diagonal(), 3.0_f32.sqrt(), epsilon = 1e-6);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.positions.len(), cube.normals.len());
    }
}
