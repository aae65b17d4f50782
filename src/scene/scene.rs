//! Scene Container
//!
//! Pure data layer: owns the node arena and the root list, maintains the
//! hierarchy invariants (a node appears either in the root list or in
//! exactly one parent's child list), and runs the world-matrix
//! propagation pass the renderer triggers at the start of a frame.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NodeKey;
use crate::scene::node::Node;

#[derive(Default)]
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub root_nodes: Vec<NodeKey>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
        }
    }

    /// Adds a node at the root of the scene.
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.root_nodes.push(key);
        key
    }

    #[must_use]
    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn get_node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Makes `child` a child of `parent`, detaching it from its previous
    /// parent (or the root list) first. Attaching a node to itself is a
    /// no-op.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) {
        if child == parent || !self.nodes.contains_key(parent) {
            return;
        }
        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        } else {
            return;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Detaches `child` from its parent and returns it to the root list.
    pub fn detach(&mut self, child: NodeKey) {
        let had_parent = self.nodes.get(child).is_some_and(|n| n.parent.is_some());
        if !had_parent {
            return;
        }
        self.unlink(child);
        self.root_nodes.push(child);
    }

    /// Removes the node from wherever it currently hangs: its parent's
    /// child list or the root list.
    fn unlink(&mut self, child: NodeKey) {
        let Some(parent) = self.nodes.get(child).and_then(|n| n.parent) else {
            self.root_nodes.retain(|&k| k != child);
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&k| k != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
    }

    /// Removes a node and its whole subtree.
    pub fn remove_node(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        let children = node.children.clone();
        for child in children {
            self.remove_node(child);
        }

        if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|&k| k != key);
            }
        } else {
            self.root_nodes.retain(|&k| k != key);
        }
        self.nodes.remove(key);
    }

    /// Recomputes every node's world matrix from the root transforms
    /// down. Runs once per frame before classification.
    pub fn update_world_matrices(&mut self) {
        let mut stack: Vec<(NodeKey, Affine3A)> = self
            .root_nodes
            .iter()
            .map(|&k| (k, Affine3A::IDENTITY))
            .collect();

        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            node.world_matrix = parent_world * node.local_matrix;
            let world = node.world_matrix;
            for &child in &node.children {
                stack.push((child, world));
            }
        }
    }
}
