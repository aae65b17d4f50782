//! Geometry
//!
//! A geometry bundles the vertex streams one drawable needs: positions,
//! normals, and an optional index stream. The bounding sphere is the
//! culling input; geometries without one are treated as always visible.

use glam::Vec3;
use uuid::Uuid;

use crate::resources::attribute::BufferAttribute;

/// World-agnostic bounding volume in the geometry's local space.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

pub struct Geometry {
    uuid: Uuid,
    pub position: BufferAttribute<f32>,
    pub normal: BufferAttribute<f32>,
    pub index: Option<BufferAttribute<u32>>,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl Geometry {
    /// Creates a non-indexed geometry from flat position/normal streams
    /// (three components per vertex). The bounding sphere is computed
    /// from the positions.
    #[must_use]
    pub fn new(positions: Vec<f32>, normals: Vec<f32>) -> Self {
        let mut geometry = Self {
            uuid: Uuid::new_v4(),
            position: BufferAttribute::new(positions, 3),
            normal: BufferAttribute::new(normals, 3),
            index: None,
            bounding_sphere: None,
        };
        geometry.compute_bounding_sphere();
        geometry
    }

    /// Adds an index stream.
    #[must_use]
    pub fn with_index(mut self, indices: Vec<u32>) -> Self {
        self.index = Some(BufferAttribute::new(indices, 1));
        self
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Number of elements a draw of this geometry covers: index count
    /// when indexed, vertex count otherwise.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.index
            .as_ref()
            .map_or_else(|| self.position.count(), BufferAttribute::count)
    }

    /// Recomputes the bounding sphere from the position stream. Call
    /// after replacing position data.
    pub fn compute_bounding_sphere(&mut self) {
        let positions = self.position.data();
        if positions.len() < 3 {
            self.bounding_sphere = None;
            return;
        }

        let mut center = Vec3::ZERO;
        let count = positions.len() / 3;
        for vertex in positions.chunks_exact(3) {
            center += Vec3::new(vertex[0], vertex[1], vertex[2]);
        }
        center /= count as f32;

        let mut radius_sq = 0.0f32;
        for vertex in positions.chunks_exact(3) {
            let p = Vec3::new(vertex[0], vertex[1], vertex[2]);
            radius_sq = radius_sq.max(center.distance_squared(p));
        }

        self.bounding_sphere = Some(BoundingSphere {
            center,
            radius: radius_sq.sqrt(),
        });
    }
}
