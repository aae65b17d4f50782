//! Stock Forward-Shading Graph
//!
//! The default shader the renderer hands to materials that do not bring
//! their own: a single-pass forward shader with per-fragment Lambert
//! lighting. It exists both as a usable default and as the reference for
//! the attribute/uniform contract the per-draw binding code pushes:
//! `position`/`normal` attributes, the camera and object matrices, and
//! the flattened light arrays.

use crate::shader::node::{CodeNode, ShaderNodeRef};
use crate::shader::program::ShaderProgram;

/// Upper bound on positional lights bound to one draw. Lights collected
/// beyond this are dropped for the frame.
pub const MAX_LIGHTS: usize = 8;

/// Builds the forward vertex-stage graph.
#[must_use]
pub fn vertex_root() -> ShaderNodeRef {
    let position = CodeNode::attribute("vec3", "position").into_ref();
    let normal = CodeNode::attribute("vec3", "normal").into_ref();
    let matrices = CodeNode::new(
        concat!(
            "uniform mat4 projectionMatrix;\n",
            "uniform mat4 viewMatrix;\n",
            "uniform mat4 modelMatrix;\n",
        ),
        "",
    )
    .into_ref();
    let varyings = CodeNode::new(
        "varying vec3 vNormal;\nvarying vec3 vWorldPosition;\n",
        concat!(
            "\tvec4 worldPosition = modelMatrix * vec4(position, 1.0);\n",
            "\tvWorldPosition = worldPosition.xyz;\n",
            "\tvNormal = mat3(modelMatrix) * normal;\n",
        ),
    )
    .with_input(position)
    .with_input(normal)
    .with_input(matrices.clone())
    .into_ref();

    CodeNode::new(
        "",
        "\tgl_Position = projectionMatrix * viewMatrix * worldPosition;\n",
    )
    .with_input(varyings)
    .with_input(matrices)
    .into_ref()
}

/// Builds the forward fragment-stage graph.
#[must_use]
pub fn fragment_root() -> ShaderNodeRef {
    let precision = CodeNode::new("precision mediump float;\n", "").into_ref();
    let varyings =
        CodeNode::new("varying vec3 vNormal;\nvarying vec3 vWorldPosition;\n", "").into_ref();
    let lights = CodeNode::new(
        format!(
            concat!(
                "uniform vec3 ambientLightColor;\n",
                "uniform int numLights;\n",
                "uniform vec3 lightPositions[{max}];\n",
                "uniform vec3 lightColors[{max}];\n",
            ),
            max = MAX_LIGHTS
        ),
        "",
    )
    .into_ref();
    let material = CodeNode::new("uniform vec3 diffuse;\n", "").into_ref();

    let lighting = CodeNode::new(
        "",
        format!(
            concat!(
                "\tvec3 n = normalize(vNormal);\n",
                "\tvec3 irradiance = ambientLightColor;\n",
                "\tfor (int i = 0; i < {max}; i++) {{\n",
                "\t\tif (i >= numLights) break;\n",
                "\t\tvec3 l = normalize(lightPositions[i] - vWorldPosition);\n",
                "\t\tirradiance += lightColors[i] * max(dot(n, l), 0.0);\n",
                "\t}}\n",
            ),
            max = MAX_LIGHTS
        ),
    )
    .with_input(precision)
    .with_input(varyings)
    .with_input(lights)
    .into_ref();

    CodeNode::new("", "\tgl_FragColor = vec4(diffuse * irradiance, 1.0);\n")
        .with_input(lighting)
        .with_input(material)
        .into_ref()
}

/// The assembled forward program, dirty and ready to compile.
#[must_use]
pub fn forward_program() -> ShaderProgram {
    ShaderProgram::new(vertex_root(), fragment_root())
}
