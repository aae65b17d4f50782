//! Render List & Painter Sort Tests
//!
//! Tests for:
//! - Opaque front-to-back ordering (ascending depth)
//! - Transparent back-to-front ordering (descending depth)
//! - Stability: equal depths keep collection order
//! - Draw-group precedence over depth
//! - Bucket clearing between frames

use ember::{NodeKey, RenderItem, RenderLists};
use ember::renderer::{painter_sort, reverse_painter_sort};
use slotmap::KeyData;

fn key(id: u64) -> NodeKey {
    // Synthesized keys: list sorting never dereferences them.
    KeyData::from_ffi(id).into()
}

fn items_with_depths(depths: &[f32]) -> Vec<RenderItem> {
    depths
        .iter()
        .enumerate()
        .map(|(i, &z)| RenderItem::new(key(i as u64 + 1), z))
        .collect()
}

fn depths(items: &[RenderItem]) -> Vec<f32> {
    items.iter().map(|item| item.z).collect()
}

// ============================================================================
// Painter sorts
// ============================================================================

#[test]
fn opaque_sorts_front_to_back() {
    let mut items = items_with_depths(&[5.0, 1.0, 3.0, 1.0, 2.0]);
    painter_sort(&mut items);
    assert_eq!(depths(&items), vec![1.0, 1.0, 2.0, 3.0, 5.0]);
}

#[test]
fn opaque_sort_is_stable_on_ties() {
    let mut items = items_with_depths(&[5.0, 1.0, 3.0, 1.0, 2.0]);
    // Items 2 and 4 (1-based collection order) tie at depth 1.
    let first_tied = items[1].node;
    let second_tied = items[3].node;

    painter_sort(&mut items);

    assert_eq!(items[0].node, first_tied);
    assert_eq!(items[1].node, second_tied);
}

#[test]
fn transparent_sorts_back_to_front() {
    let mut items = items_with_depths(&[5.0, 1.0, 3.0, 1.0, 2.0]);
    reverse_painter_sort(&mut items);
    assert_eq!(depths(&items), vec![5.0, 3.0, 2.0, 1.0, 1.0]);
}

#[test]
fn transparent_sort_is_stable_on_ties() {
    let mut items = items_with_depths(&[5.0, 1.0, 3.0, 1.0, 2.0]);
    let first_tied = items[1].node;
    let second_tied = items[3].node;

    reverse_painter_sort(&mut items);

    assert_eq!(items[3].node, first_tied);
    assert_eq!(items[4].node, second_tied);
}

#[test]
fn draw_group_outranks_depth() {
    let mut items = vec![
        RenderItem::with_group(key(1), 1.0, 1),
        RenderItem::with_group(key(2), 9.0, 0),
    ];
    painter_sort(&mut items);
    assert_eq!(items[0].node, key(2), "lower group draws first");

    let mut items = vec![
        RenderItem::with_group(key(1), 1.0, 1),
        RenderItem::with_group(key(2), 9.0, 0),
    ];
    reverse_painter_sort(&mut items);
    assert_eq!(items[0].node, key(2));
}

// ============================================================================
// Buckets
// ============================================================================

#[test]
fn push_mesh_routes_by_transparency() {
    let mut lists = RenderLists::new();
    lists.push_mesh(RenderItem::new(key(1), 1.0), false);
    lists.push_mesh(RenderItem::new(key(2), 2.0), true);

    assert_eq!(lists.opaque.len(), 1);
    assert_eq!(lists.transparent.len(), 1);
}

#[test]
fn clear_empties_every_bucket() {
    let mut lists = RenderLists::new();
    lists.push_mesh(RenderItem::new(key(1), 1.0), false);
    lists.push_mesh(RenderItem::new(key(2), 2.0), true);
    lists.lights.push(key(3));

    lists.clear();

    assert!(lists.opaque.is_empty());
    assert!(lists.transparent.is_empty());
    assert!(lists.lights.is_empty());
}

#[test]
fn default_render_item_is_ungrouped() {
    let item = RenderItem::new(key(1), 0.5);
    assert_eq!(item.group, -1);
}
