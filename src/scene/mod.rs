//! Scene Graph
//!
//! Arena-backed node hierarchy plus the camera and light collaborators
//! the renderer reads. Nodes are addressed by [`NodeKey`]s into the
//! scene's slotmap; a node carries its transforms, a visibility flag and
//! its drawable payload (mesh, light, or nothing).

pub mod camera;
pub mod light;
pub mod node;
pub mod scene;

pub use camera::{Camera, Frustum, ProjectionType};
pub use light::{Light, LightKind};
pub use node::{Node, NodeKind};
pub use scene::Scene;

slotmap::new_key_type! {
    /// Handle to a node stored in a [`Scene`].
    pub struct NodeKey;
}
