#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod context;
pub mod errors;
pub mod gpu;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod shader;

pub use context::{
    ContextManager, HeadlessWindowBackend, RenderContext, WindowBackend, WindowDesc,
};
pub use errors::{EmberError, Result};
pub use gpu::{
    BufferKind, BufferUsage, ClearMask, Color, CullFace, FrontFace, GpuApi, HeadlessGpu,
    ShaderStage,
};
pub use renderer::{BufferRegistry, RenderItem, RenderLists, RenderTarget, Renderer};
pub use resources::{BoundingSphere, BufferAttribute, Geometry, Material, Mesh, Side};
pub use scene::{Camera, Frustum, Light, LightKind, Node, NodeKey, NodeKind, Scene};
pub use shader::{
    CodeNode, NagaOptimizer, NullOptimizer, ShaderNode, ShaderNodeRef, ShaderOptimizer,
    ShaderProgram,
};
