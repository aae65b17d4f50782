//! Materials
//!
//! A material pairs a shader program with the fixed-function state a
//! draw of it requires. The renderer only reads two things from it when
//! classifying: the transparency flag (bucket selection) and the program
//! reference (dirty check + bind); the rest is applied as GPU state just
//! before the draw.

use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::gpu::{CullFace, FrontFace, GpuApi};
use crate::shader::forward;
use crate::shader::program::ShaderProgram;

/// Which side(s) of a face get rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

pub struct Material {
    uuid: Uuid,
    /// Base surface color, bound as the `diffuse` uniform.
    pub color: Vec3,
    /// Transparent materials are drawn in the back-to-front pass with
    /// blending; opaque ones front-to-back.
    pub transparent: bool,
    pub side: Side,
    pub depth_test: bool,
    pub depth_write: bool,
    pub color_write: bool,

    pub program: Arc<RwLock<ShaderProgram>>,
}

impl Material {
    /// Creates an opaque material over an existing program.
    #[must_use]
    pub fn new(program: Arc<RwLock<ShaderProgram>>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            color: Vec3::ONE,
            transparent: false,
            side: Side::Front,
            depth_test: true,
            depth_write: true,
            color_write: true,
            program,
        }
    }

    /// Creates a material over a fresh stock forward-shading program.
    #[must_use]
    pub fn forward() -> Self {
        Self::new(Arc::new(RwLock::new(forward::forward_program())))
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Pushes this material's fixed-function state to the driver.
    pub fn apply_render_state(&self, gpu: &dyn GpuApi) {
        gpu.set_depth_test(self.depth_test);
        gpu.set_depth_write(self.depth_write);
        gpu.set_color_write(self.color_write);

        let cull = match self.side {
            Side::Front => CullFace::Back,
            Side::Back => CullFace::Front,
            Side::Double => CullFace::None,
        };
        gpu.set_face_culling(cull, FrontFace::CounterClockwise);
    }
}
