//! Render Lists & Painter Sorts
//!
//! Per-frame buckets of drawables. Items are ephemeral: collected,
//! sorted, consumed, then the buckets are cleared for the next frame.
//!
//! Both sort orders are stable: items at equal depth keep their
//! collection order, so a scene that does not move does not flicker from
//! frame-to-frame reordering.

use crate::scene::NodeKey;

/// One drawable queued for the frame: the node, its view-space depth,
/// and its draw group.
#[derive(Debug, Clone, Copy)]
pub struct RenderItem {
    pub node: NodeKey,
    /// Distance along the camera's forward axis; larger = farther.
    pub z: f32,
    /// Explicit draw group; `-1` = ungrouped.
    pub group: i32,
}

impl RenderItem {
    #[must_use]
    pub fn new(node: NodeKey, z: f32) -> Self {
        Self { node, z, group: -1 }
    }

    #[must_use]
    pub fn with_group(node: NodeKey, z: f32, group: i32) -> Self {
        Self { node, z, group }
    }
}

/// The frame's classification output: lights plus the two depth-ordered
/// draw buckets.
#[derive(Debug, Default)]
pub struct RenderLists {
    pub lights: Vec<NodeKey>,
    pub opaque: Vec<RenderItem>,
    pub transparent: Vec<RenderItem>,
}

impl RenderLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties all buckets; the start of a new collection phase.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.opaque.clear();
        self.transparent.clear();
    }

    pub fn push_mesh(&mut self, item: RenderItem, transparent: bool) {
        if transparent {
            self.transparent.push(item);
        } else {
            self.opaque.push(item);
        }
    }

    /// Opaque front-to-back, transparent back-to-front.
    pub fn sort(&mut self) {
        painter_sort(&mut self.opaque);
        reverse_painter_sort(&mut self.transparent);
    }
}

/// Front-to-back: group ascending, then depth ascending. Nearest first,
/// so opaque fragments behind already-drawn geometry fail the depth test
/// early.
pub fn painter_sort(items: &mut [RenderItem]) {
    items.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.z.total_cmp(&b.z)));
}

/// Back-to-front: group ascending, then depth descending. Farthest
/// first, since alpha blending is order-dependent.
pub fn reverse_painter_sort(items: &mut [RenderItem]) {
    items.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| b.z.total_cmp(&a.z)));
}
