//! Scene Graph Tests
//!
//! Tests for:
//! - Node creation and removal (including subtrees)
//! - Hierarchy maintenance: attach/detach keep both sides in sync
//! - World-matrix propagation through the hierarchy

use glam::{Affine3A, Vec3};
use ember::{Node, Scene};

// ============================================================================
// Creation & removal
// ============================================================================

#[test]
fn add_node_lands_in_the_root_list() {
    let mut scene = Scene::new();
    let key = scene.add_node(Node::group());
    assert!(scene.root_nodes.contains(&key));
    assert!(scene.get_node(key).is_some());
}

#[test]
fn remove_node_removes_from_root_list() {
    let mut scene = Scene::new();
    let key = scene.add_node(Node::group());

    scene.remove_node(key);
    assert!(!scene.root_nodes.contains(&key));
    assert!(scene.get_node(key).is_none());
}

#[test]
fn remove_node_removes_the_subtree() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::group());
    let child = scene.add_node(Node::group());
    let grandchild = scene.add_node(Node::group());
    scene.attach(child, parent);
    scene.attach(grandchild, child);

    scene.remove_node(parent);

    assert!(scene.get_node(parent).is_none());
    assert!(scene.get_node(child).is_none());
    assert!(scene.get_node(grandchild).is_none());
    assert_eq!(scene.node_count(), 0);
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn attach_sets_both_sides() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::group());
    let child = scene.add_node(Node::group());

    scene.attach(child, parent);

    assert_eq!(scene.get_node(child).unwrap().parent(), Some(parent));
    assert!(scene.get_node(parent).unwrap().children().contains(&child));
    assert!(
        !scene.root_nodes.contains(&child),
        "attached node must leave the root list"
    );
}

#[test]
fn attach_moves_between_parents() {
    let mut scene = Scene::new();
    let first = scene.add_node(Node::group());
    let second = scene.add_node(Node::group());
    let child = scene.add_node(Node::group());

    scene.attach(child, first);
    scene.attach(child, second);

    assert!(!scene.get_node(first).unwrap().children().contains(&child));
    assert!(scene.get_node(second).unwrap().children().contains(&child));
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(second));
}

#[test]
fn attach_to_self_is_a_noop() {
    let mut scene = Scene::new();
    let key = scene.add_node(Node::group());

    scene.attach(key, key);
    assert_eq!(scene.get_node(key).unwrap().parent(), None);
    assert!(scene.root_nodes.contains(&key));
}

#[test]
fn detach_returns_the_node_to_the_root_list() {
    let mut scene = Scene::new();
    let parent = scene.add_node(Node::group());
    let child = scene.add_node(Node::group());
    scene.attach(child, parent);

    scene.detach(child);

    assert_eq!(scene.get_node(child).unwrap().parent(), None);
    assert!(!scene.get_node(parent).unwrap().children().contains(&child));
    assert!(scene.root_nodes.contains(&child));
}

// ============================================================================
// World matrices
// ============================================================================

#[test]
fn world_matrices_compose_down_the_hierarchy() {
    let mut scene = Scene::new();
    let parent = scene.add_node(
        Node::group().with_local_matrix(Affine3A::from_translation(Vec3::new(1.0, 0.0, 0.0))),
    );
    let child = scene.add_node(
        Node::group().with_local_matrix(Affine3A::from_translation(Vec3::new(0.0, 2.0, 0.0))),
    );
    scene.attach(child, parent);

    scene.update_world_matrices();

    let world = scene.get_node(child).unwrap().world_matrix;
    assert_eq!(Vec3::from(world.translation), Vec3::new(1.0, 2.0, 0.0));
}

#[test]
fn reattaching_changes_the_world_matrix() {
    let mut scene = Scene::new();
    let left = scene.add_node(
        Node::group().with_local_matrix(Affine3A::from_translation(Vec3::new(-5.0, 0.0, 0.0))),
    );
    let right = scene.add_node(
        Node::group().with_local_matrix(Affine3A::from_translation(Vec3::new(5.0, 0.0, 0.0))),
    );
    let child = scene.add_node(Node::group());

    scene.attach(child, left);
    scene.update_world_matrices();
    assert_eq!(
        Vec3::from(scene.get_node(child).unwrap().world_matrix.translation),
        Vec3::new(-5.0, 0.0, 0.0)
    );

    scene.attach(child, right);
    scene.update_world_matrices();
    assert_eq!(
        Vec3::from(scene.get_node(child).unwrap().world_matrix.translation),
        Vec3::new(5.0, 0.0, 0.0)
    );
}
