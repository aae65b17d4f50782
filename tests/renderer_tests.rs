//! Frame Renderer Tests
//!
//! End-to-end frames against the headless backend. Tests for:
//! - Plugin lifecycle: per-frame invocation, ordering around the clear,
//!   unregistration
//! - Pass ordering: opaque before transparent, painter order inside each
//! - Frustum culling and invisible-subtree pruning
//! - Per-draw failure isolation (driver errors, dirty programs that fail
//!   to compile)
//! - Buffer reuse across meshes and render targets
//!
//! Meshes are given distinct triangle counts so their draw calls can be
//! told apart in the recorded call log.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Vec3};
use parking_lot::RwLock;
use uuid::Uuid;

use ember::{
    BufferRegistry, ContextManager, Geometry, GpuApi, HeadlessGpu, HeadlessWindowBackend, Light,
    Material, Mesh, Node, NodeKey, NullOptimizer, RenderContext, RenderTarget, Renderer, Scene,
    ShaderStage, WindowDesc,
};

fn make_renderer(gpu: &Arc<HeadlessGpu>) -> Renderer {
    let backend = Arc::new(HeadlessWindowBackend::new());
    let manager = ContextManager::new(backend);
    let context = RenderContext::new(&manager, &WindowDesc::default(), None).unwrap();
    let gpu: Arc<dyn GpuApi> = gpu.clone();
    let buffers = BufferRegistry::new(gpu.clone());
    Renderer::new(context, gpu, buffers).with_optimizer(Box::new(NullOptimizer))
}

fn camera() -> ember::Camera {
    // At the origin, looking down -Z.
    ember::Camera::new_perspective(60.0, 1.0, 0.1, 100.0)
}

/// `triangle_count` triangles in the plane z = 0; place with the node's
/// local matrix. Distinct counts make draws recognizable in the log.
fn triangles(triangle_count: usize) -> Geometry {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    for i in 0..triangle_count {
        let x = i as f32;
        positions.extend_from_slice(&[x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x, 1.0, 0.0]);
        normals.extend_from_slice(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }
    Geometry::new(positions, normals)
}

fn add_mesh(scene: &mut Scene, triangle_count: usize, z: f32, transparent: bool) -> NodeKey {
    let mut material = Material::forward();
    material.transparent = transparent;
    let mesh = Mesh::new(
        Arc::new(RwLock::new(triangles(triangle_count))),
        Arc::new(RwLock::new(material)),
    );
    scene.add_node(
        Node::mesh(mesh).with_local_matrix(Affine3A::from_translation(Vec3::new(0.0, 0.0, z))),
    )
}

fn draw_order(gpu: &HeadlessGpu) -> Vec<String> {
    gpu.call_log()
        .into_iter()
        .filter(|call| call.starts_with("draw_"))
        .collect()
}

// ============================================================================
// Plugins
// ============================================================================

#[test]
fn pre_render_plugin_runs_once_per_frame() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    let mut camera = camera();

    let counter = Arc::new(AtomicU32::new(0));
    let plugin_counter = counter.clone();
    renderer.register_pre_render_plugin(Uuid::new_v4(), move |_scene, _camera| {
        plugin_counter.fetch_add(1, Ordering::SeqCst);
    });

    renderer.render(&mut scene, &mut camera, None, false);
    renderer.render(&mut scene, &mut camera, None, false);
    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn pre_render_plugin_always_runs_before_the_clear() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    let mut camera = camera();

    // Record how many clears had happened when the plugin ran; frame N's
    // plugin must only ever see frames 0..N-1 worth of clears.
    let seen = Arc::new(RwLock::new(Vec::new()));
    let plugin_seen = seen.clone();
    let plugin_gpu = gpu.clone();
    renderer.register_pre_render_plugin(Uuid::new_v4(), move |_scene, _camera| {
        plugin_seen.write().push(plugin_gpu.clear_calls());
    });

    renderer.render(&mut scene, &mut camera, None, false);
    renderer.render(&mut scene, &mut camera, None, false);
    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(*seen.read(), vec![0, 1, 2]);
}

#[test]
fn post_render_plugin_runs_after_the_draws() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 1, -5.0, false);
    let mut camera = camera();

    let seen = Arc::new(AtomicU32::new(0));
    let plugin_seen = seen.clone();
    let plugin_gpu = gpu.clone();
    renderer.register_post_render_plugin(Uuid::new_v4(), move |_scene, _camera| {
        plugin_seen.store(plugin_gpu.draw_calls(), Ordering::SeqCst);
    });

    renderer.render(&mut scene, &mut camera, None, false);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn unregistered_plugin_stops_running() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    let mut camera = camera();

    let counter = Arc::new(AtomicU32::new(0));
    let plugin_counter = counter.clone();
    let id = Uuid::new_v4();
    renderer.register_pre_render_plugin(id, move |_scene, _camera| {
        plugin_counter.fetch_add(1, Ordering::SeqCst);
    });

    renderer.render(&mut scene, &mut camera, None, false);
    renderer.unregister_pre_render_plugin(id);
    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Pass & painter ordering
// ============================================================================

#[test]
fn opaque_draws_before_transparent() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    // The transparent mesh is nearer; it must still draw last.
    add_mesh(&mut scene, 1, -2.0, true);
    add_mesh(&mut scene, 2, -8.0, false);
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(draw_order(&gpu), vec!["draw_arrays(6)", "draw_arrays(3)"]);
}

#[test]
fn opaque_bucket_draws_front_to_back() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 3, -9.0, false); // far
    add_mesh(&mut scene, 1, -2.0, false); // near
    add_mesh(&mut scene, 2, -5.0, false); // middle
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(
        draw_order(&gpu),
        vec!["draw_arrays(3)", "draw_arrays(6)", "draw_arrays(9)"]
    );
}

#[test]
fn transparent_bucket_draws_back_to_front() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 1, -2.0, true); // near
    add_mesh(&mut scene, 3, -9.0, true); // far
    add_mesh(&mut scene, 2, -5.0, true); // middle
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(
        draw_order(&gpu),
        vec!["draw_arrays(9)", "draw_arrays(6)", "draw_arrays(3)"]
    );
}

#[test]
fn disabling_sort_objects_keeps_collection_order() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    renderer.sort_objects = false;
    let mut scene = Scene::new();
    add_mesh(&mut scene, 3, -9.0, false);
    add_mesh(&mut scene, 1, -2.0, false);
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(draw_order(&gpu), vec!["draw_arrays(9)", "draw_arrays(3)"]);
}

// ============================================================================
// Culling & visibility
// ============================================================================

#[test]
fn meshes_behind_the_camera_are_culled() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 1, -5.0, false);
    add_mesh(&mut scene, 1, 5.0, false); // behind the camera
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(gpu.draw_calls(), 1);
}

#[test]
fn invisible_subtrees_are_pruned() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    let group = scene.add_node(Node::group());
    let mesh = add_mesh(&mut scene, 1, -5.0, false);
    scene.attach(mesh, group);
    scene.get_node_mut(group).unwrap().visible = false;
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(gpu.draw_calls(), 0);
}

#[test]
fn lights_do_not_stop_the_frame() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    scene.add_node(Node::light(Light::new_ambient(Vec3::ONE, 0.2)));
    scene.add_node(
        Node::light(Light::new_point(Vec3::ONE, 1.0, 50.0))
            .with_local_matrix(Affine3A::from_translation(Vec3::new(0.0, 4.0, -5.0))),
    );
    add_mesh(&mut scene, 1, -5.0, false);
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(gpu.draw_calls(), 1);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[test]
fn driver_error_on_one_draw_does_not_abort_the_frame() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 1, -2.0, false);
    add_mesh(&mut scene, 2, -5.0, false);
    let mut camera = camera();

    gpu.push_error("simulated driver error");
    renderer.render(&mut scene, &mut camera, None, false);

    // Both draws were submitted; the frame completed.
    assert_eq!(gpu.draw_calls(), 2);
    assert_eq!(gpu.clear_calls(), 1);
}

#[test]
fn failing_shader_skips_only_its_item() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    // Separate materials: separate programs, separate compiles.
    add_mesh(&mut scene, 1, -2.0, false);
    add_mesh(&mut scene, 2, -5.0, false);
    let mut camera = camera();

    // Poisons the first compile of the frame (the nearest item).
    gpu.fail_next_compile(ShaderStage::Vertex);
    renderer.render(&mut scene, &mut camera, None, false);
    assert_eq!(gpu.draw_calls(), 1, "only the healthy item draws");

    // The failed program stayed dirty; the next frame recovers it.
    renderer.render(&mut scene, &mut camera, None, false);
    assert_eq!(gpu.draw_calls(), 3);
}

#[test]
fn frame_where_every_item_fails_still_clears_and_finishes() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 1, -5.0, false);
    let mut camera = camera();

    let ran_post = Arc::new(AtomicU32::new(0));
    let plugin_ran = ran_post.clone();
    renderer.register_post_render_plugin(Uuid::new_v4(), move |_scene, _camera| {
        plugin_ran.fetch_add(1, Ordering::SeqCst);
    });

    gpu.fail_next_compile(ShaderStage::Fragment);
    renderer.render(&mut scene, &mut camera, None, false);

    assert_eq!(gpu.draw_calls(), 0);
    assert_eq!(gpu.clear_calls(), 1);
    assert_eq!(ran_post.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Resource reuse
// ============================================================================

#[test]
fn shared_material_compiles_its_program_once() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();

    let material = Arc::new(RwLock::new(Material::forward()));
    for z in [-2.0f32, -5.0, -8.0] {
        let mesh = Mesh::new(Arc::new(RwLock::new(triangles(1))), material.clone());
        scene.add_node(
            Node::mesh(mesh).with_local_matrix(Affine3A::from_translation(Vec3::new(0.0, 0.0, z))),
        );
    }
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);
    renderer.render(&mut scene, &mut camera, None, false);

    let links = gpu
        .call_log()
        .iter()
        .filter(|call| *call == "link_program")
        .count();
    assert_eq!(links, 1);
    assert_eq!(gpu.draw_calls(), 6);
}

#[test]
fn shared_geometry_uploads_its_buffers_once() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();

    let geometry = Arc::new(RwLock::new(triangles(1)));
    for z in [-2.0f32, -5.0] {
        let mesh = Mesh::new(geometry.clone(), Arc::new(RwLock::new(Material::forward())));
        scene.add_node(
            Node::mesh(mesh).with_local_matrix(Affine3A::from_translation(Vec3::new(0.0, 0.0, z))),
        );
    }
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);
    renderer.render(&mut scene, &mut camera, None, false);

    // One position + one normal buffer, regardless of mesh count or frames.
    assert_eq!(gpu.buffers_allocated(), 2);
}

// ============================================================================
// Render targets
// ============================================================================

#[test]
fn rendering_to_a_target_binds_and_restores_the_framebuffer() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    let mut scene = Scene::new();
    add_mesh(&mut scene, 1, -5.0, false);
    let mut camera = camera();

    let target = RenderTarget::new(gpu.as_ref(), 256, 256);
    renderer.render(&mut scene, &mut camera, Some(&target), false);

    let log = gpu.call_log();
    let bind_target = log
        .iter()
        .position(|c| *c == format!("bind_framebuffer({})", target.framebuffer()))
        .expect("target must be bound");
    let restore = log
        .iter()
        .rposition(|c| *c == "bind_framebuffer(0)")
        .expect("default framebuffer must be restored");
    assert!(bind_target < restore);
}

#[test]
fn target_read_back_returns_rgba8() {
    let gpu = Arc::new(HeadlessGpu::new());
    let renderer = make_renderer(&gpu);
    let target = RenderTarget::new(gpu.as_ref(), 16, 8);

    let pixels = renderer.read_render_target_pixels(&target, 0, 0, 16, 8);
    assert_eq!(pixels.len(), 16 * 8 * 4);
}

// ============================================================================
// Forced clear
// ============================================================================

#[test]
fn force_clear_overrides_a_disabled_auto_clear() {
    let gpu = Arc::new(HeadlessGpu::new());
    let mut renderer = make_renderer(&gpu);
    renderer.auto_clear = ember::ClearMask::empty();
    let mut scene = Scene::new();
    let mut camera = camera();

    renderer.render(&mut scene, &mut camera, None, false);
    assert_eq!(gpu.clear_calls(), 0);

    renderer.render(&mut scene, &mut camera, None, true);
    assert_eq!(gpu.clear_calls(), 1);
}
