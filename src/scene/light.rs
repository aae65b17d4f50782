//! Lights
//!
//! Closed variant set read by per-draw binding. Positions come from the
//! owning scene node's world matrix; a light resource only carries what
//! the transform cannot.

use glam::Vec3;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum LightKind {
    /// Direction-less fill light, accumulated into the ambient term.
    Ambient,
    Directional,
    Point {
        range: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Directional,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color,
            intensity,
            kind: LightKind::Point { range },
        }
    }

    /// Color scaled by intensity, as pushed to the shader.
    #[must_use]
    pub fn scaled_color(&self) -> Vec3 {
        self.color * self.intensity
    }
}
