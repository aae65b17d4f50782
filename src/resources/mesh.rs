//! Meshes
//!
//! A mesh is the drawable unit: shared geometry plus shared material.
//! Both sides are reference-counted so several meshes can reuse one
//! geometry or one material, and so the renderer can hold them across
//! the collect/draw phases without cloning data.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

pub struct Mesh {
    pub geometry: Arc<RwLock<Geometry>>,
    pub material: Arc<RwLock<Material>>,
    /// Explicit draw-group override; items with a lower group draw first
    /// regardless of depth. `0` for everything that does not care.
    pub render_order: i32,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Arc<RwLock<Geometry>>, material: Arc<RwLock<Material>>) -> Self {
        Self {
            geometry,
            material,
            render_order: 0,
        }
    }

    #[must_use]
    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }
}
