//! Scene Nodes
//!
//! A node keeps the hot per-frame data (hierarchy links and transforms)
//! inline, and everything else behind [`NodeKind`].

use glam::Affine3A;

use crate::resources::mesh::Mesh;
use crate::scene::NodeKey;
use crate::scene::light::Light;

/// What a node contributes to the frame.
pub enum NodeKind {
    /// Pure transform/grouping node.
    Group,
    /// A drawable.
    Mesh(Mesh),
    /// A light source.
    Light(Light),
}

pub struct Node {
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    /// Transform relative to the parent node.
    pub local_matrix: Affine3A,
    /// Local-to-world transform; recomputed by
    /// [`Scene::update_world_matrices`](crate::scene::Scene::update_world_matrices).
    pub world_matrix: Affine3A,

    /// Invisible nodes are pruned together with their whole subtree.
    pub visible: bool,

    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            visible: true,
            kind,
        }
    }

    /// A pure grouping node.
    #[must_use]
    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    #[must_use]
    pub fn mesh(mesh: Mesh) -> Self {
        Self::new(NodeKind::Mesh(mesh))
    }

    #[must_use]
    pub fn light(light: Light) -> Self {
        Self::new(NodeKind::Light(light))
    }

    #[must_use]
    pub fn with_local_matrix(mut self, local_matrix: Affine3A) -> Self {
        self.local_matrix = local_matrix;
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}
