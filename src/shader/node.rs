//! Shader Graph Nodes
//!
//! A shader node is one unit of shader logic. It contributes two code
//! fragments: a *static* fragment emitted at declaration level (attribute,
//! uniform, varying, and function declarations) and an *instance* fragment
//! emitted inside `main` (statements). Nodes reference the nodes they
//! depend on through ordered input [`Slot`]s; a slot may be empty, meaning
//! that input is unconnected and contributes nothing.
//!
//! Nodes are shared: the same node may be an input of several parents, so
//! a graph is a DAG rather than a tree, and node references are
//! `Arc<dyn ShaderNode>`. Identity is the node's UUID and is what the
//! compiler dedups on, never the address of the `Arc`.

use smallvec::SmallVec;
use std::sync::Arc;
use uuid::Uuid;

/// Shared reference to a node in a shader graph.
pub type ShaderNodeRef = Arc<dyn ShaderNode>;

/// One input of a node. `None` = nothing connected.
pub type Slot = Option<ShaderNodeRef>;

/// A node in the shader graph IR.
pub trait ShaderNode: Send + Sync {
    /// Stable, process-unique identity. Must not change between
    /// traversals.
    fn uuid(&self) -> Uuid;

    /// Declaration-level fragment, emitted once per compilation.
    fn static_code(&self) -> &str;

    /// Statement-level fragment, emitted once per compilation after all
    /// of this node's inputs have emitted theirs.
    fn instance_code(&self) -> &str;

    /// Input slots in declaration order.
    fn inputs(&self) -> &[Slot];
}

/// General-purpose shader node holding literal code fragments.
///
/// Everything in the stock node set is a `CodeNode` under a constructor
/// that writes the right declaration; see [`CodeNode::attribute`],
/// [`CodeNode::uniform`] and [`CodeNode::varying`].
pub struct CodeNode {
    uuid: Uuid,
    static_code: String,
    instance_code: String,
    inputs: SmallVec<[Slot; 4]>,
}

impl CodeNode {
    #[must_use]
    pub fn new(static_code: impl Into<String>, instance_code: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            static_code: static_code.into(),
            instance_code: instance_code.into(),
            inputs: SmallVec::new(),
        }
    }

    /// A vertex attribute declaration, e.g. `attribute("vec3", "position")`.
    #[must_use]
    pub fn attribute(ty: &str, name: &str) -> Self {
        Self::new(format!("attribute {ty} {name};\n"), "")
    }

    /// A uniform declaration.
    #[must_use]
    pub fn uniform(ty: &str, name: &str) -> Self {
        Self::new(format!("uniform {ty} {name};\n"), "")
    }

    /// A varying declaration. Varyings must be declared in both stages,
    /// with a distinct node per stage, because the two stage compilations are
    /// independent.
    #[must_use]
    pub fn varying(ty: &str, name: &str) -> Self {
        Self::new(format!("varying {ty} {name};\n"), "")
    }

    /// Connects `node` as the next input slot.
    #[must_use]
    pub fn with_input(mut self, node: ShaderNodeRef) -> Self {
        self.inputs.push(Some(node));
        self
    }

    /// Leaves the next input slot unconnected.
    #[must_use]
    pub fn with_empty_input(mut self) -> Self {
        self.inputs.push(None);
        self
    }

    /// Wraps the node for sharing.
    #[must_use]
    pub fn into_ref(self) -> ShaderNodeRef {
        Arc::new(self)
    }
}

impl ShaderNode for CodeNode {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn static_code(&self) -> &str {
        &self.static_code
    }

    fn instance_code(&self) -> &str {
        &self.instance_code
    }

    fn inputs(&self) -> &[Slot] {
        &self.inputs
    }
}
