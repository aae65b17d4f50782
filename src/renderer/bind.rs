//! Per-Draw Binding
//!
//! Pushes one draw's GPU state: geometry buffers through the registry,
//! camera/object matrices, and the frame's flattened light data. Every
//! attribute and uniform is looked up by name through the program's
//! location cache; a location of -1 means the linked program does not use
//! that input, and binding it is skipped; that is expected, not an
//! error.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use smallvec::SmallVec;

use crate::gpu::{BufferKind, GpuApi};
use crate::renderer::buffers::BufferRegistry;
use crate::resources::geometry::Geometry;
use crate::scene::node::{Node, NodeKind};
use crate::scene::{Camera, LightKind, NodeKey, Scene};
use crate::shader::forward::MAX_LIGHTS;
use crate::shader::program::ShaderProgram;

/// The frame's lights, flattened into the arrays the shader contract
/// expects.
pub(crate) struct FrameLights {
    pub ambient: Vec3,
    pub positions: SmallVec<[Vec3; MAX_LIGHTS]>,
    pub colors: SmallVec<[Vec3; MAX_LIGHTS]>,
}

/// Folds the collected light nodes into per-draw uniform data. Ambient
/// lights accumulate into one term; positional lights fill the arrays up
/// to [`MAX_LIGHTS`], the rest are dropped for the frame.
pub(crate) fn collect_lights(scene: &Scene, keys: &[NodeKey]) -> FrameLights {
    let mut lights = FrameLights {
        ambient: Vec3::ZERO,
        positions: SmallVec::new(),
        colors: SmallVec::new(),
    };

    for &key in keys {
        let Some(node) = scene.get_node(key) else {
            continue;
        };
        let NodeKind::Light(light) = &node.kind else {
            continue;
        };
        match light.kind {
            LightKind::Ambient => lights.ambient += light.scaled_color(),
            LightKind::Directional | LightKind::Point { .. } => {
                if lights.positions.len() == MAX_LIGHTS {
                    log::warn!("More than {MAX_LIGHTS} positional lights; extra lights dropped");
                    continue;
                }
                lights.positions.push(node.world_matrix.translation.into());
                lights.colors.push(light.scaled_color());
            }
        }
    }
    lights
}

/// Binds everything one mesh draw needs. The program must already be
/// compiled and bound.
pub(crate) fn bind_mesh(
    gpu: &dyn GpuApi,
    buffers: &Arc<BufferRegistry>,
    context_id: u64,
    program: &mut ShaderProgram,
    camera: &Camera,
    node: &Node,
    geometry: &Geometry,
    lights: &FrameLights,
    diffuse: Vec3,
) {
    // === Geometry buffers ===

    if let Some(index) = &geometry.index {
        let handle =
            BufferRegistry::setup_buffer(buffers, context_id, index, BufferKind::ElementArray);
        gpu.bind_buffer(BufferKind::ElementArray, handle);
    }

    let position_handle =
        BufferRegistry::setup_buffer(buffers, context_id, &geometry.position, BufferKind::Array);
    let normal_handle =
        BufferRegistry::setup_buffer(buffers, context_id, &geometry.normal, BufferKind::Array);

    let position_loc = program.attrib_location(gpu, "position");
    if position_loc != -1 {
        gpu.bind_buffer(BufferKind::Array, position_handle);
        gpu.enable_vertex_attrib(position_loc);
        gpu.vertex_attrib_pointer(position_loc, geometry.position.item_size() as i32);
    }

    let normal_loc = program.attrib_location(gpu, "normal");
    if normal_loc != -1 {
        gpu.bind_buffer(BufferKind::Array, normal_handle);
        gpu.enable_vertex_attrib(normal_loc);
        gpu.vertex_attrib_pointer(normal_loc, geometry.normal.item_size() as i32);
    }

    // === Camera & object uniforms ===

    let model = Mat4::from(node.world_matrix);

    let loc = program.uniform_location(gpu, "cameraPosition");
    if loc != -1 {
        gpu.uniform_vec3(loc, camera.position());
    }
    let loc = program.uniform_location(gpu, "projectionMatrix");
    if loc != -1 {
        gpu.uniform_mat4(loc, camera.projection_matrix());
    }
    let loc = program.uniform_location(gpu, "viewMatrix");
    if loc != -1 {
        gpu.uniform_mat4(loc, camera.view_matrix());
    }
    let loc = program.uniform_location(gpu, "modelMatrix");
    if loc != -1 {
        gpu.uniform_mat4(loc, &model);
    }
    let loc = program.uniform_location(gpu, "modelView");
    if loc != -1 {
        gpu.uniform_mat4(loc, &(*camera.view_matrix() * model));
    }

    // === Material & lights ===

    let loc = program.uniform_location(gpu, "diffuse");
    if loc != -1 {
        gpu.uniform_vec3(loc, diffuse);
    }
    let loc = program.uniform_location(gpu, "ambientLightColor");
    if loc != -1 {
        gpu.uniform_vec3(loc, lights.ambient);
    }
    let loc = program.uniform_location(gpu, "numLights");
    if loc != -1 {
        gpu.uniform_i32(loc, lights.positions.len() as i32);
    }
    for (i, (&position, &color)) in lights.positions.iter().zip(&lights.colors).enumerate() {
        let loc = program.uniform_location(gpu, &format!("lightPositions[{i}]"));
        if loc != -1 {
            gpu.uniform_vec3(loc, position);
        }
        let loc = program.uniform_location(gpu, &format!("lightColors[{i}]"));
        if loc != -1 {
            gpu.uniform_vec3(loc, color);
        }
    }
}
