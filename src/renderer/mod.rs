//! Frame Renderer
//!
//! Orchestrates a frame: pre-render plugins → target bind → scene
//! classification → clear → opaque pass (front-to-back) → transparent
//! pass (back-to-front) → post-render plugins → present.
//!
//! One renderer owns one window/context. Renderers whose contexts share a
//! context group should share one [`BufferRegistry`] so geometry uploads
//! are reused; unrelated renderers must not.
//!
//! Failure policy inside a frame: anything that goes wrong while drawing
//! a single item (a shader that will not compile, a driver error on the
//! draw) is logged and that item is skipped. The frame always completes
//! and presents.

pub mod bind;
pub mod buffers;
pub mod list;
pub mod target;

pub use buffers::BufferRegistry;
pub use list::{RenderItem, RenderLists, painter_sort, reverse_painter_sort};
pub use target::RenderTarget;

use std::sync::Arc;

use uuid::Uuid;

use crate::context::RenderContext;
use crate::errors::Result;
use crate::gpu::{ClearMask, Color, CullFace, DrawMode, FrontFace, GpuApi};
use crate::scene::node::NodeKind;
use crate::scene::{Camera, NodeKey, Scene};
use crate::shader::optimizer::{NagaOptimizer, ShaderOptimizer};

use self::bind::FrameLights;

/// A frame hook: runs once per frame with the scene and camera being
/// rendered. Errors are the plugin's own business; the renderer does not
/// isolate them.
pub type RenderPlugin = Box<dyn FnMut(&mut Scene, &Camera) + Send>;

pub struct Renderer {
    context: RenderContext,
    gpu: Arc<dyn GpuApi>,
    optimizer: Box<dyn ShaderOptimizer>,
    buffers: Arc<BufferRegistry>,

    /// When false, buckets keep collection order, for scenes that
    /// guarantee their own ordering.
    pub sort_objects: bool,
    /// Planes cleared at the start of every frame. Empty disables the
    /// automatic clear (a `force_clear` render still clears everything).
    pub auto_clear: ClearMask,

    clear_color: Color,
    viewport: Option<(i32, i32, u32, u32)>,

    // Registration order is invocation order.
    pre_plugins: Vec<(Uuid, RenderPlugin)>,
    post_plugins: Vec<(Uuid, RenderPlugin)>,

    lists: RenderLists,
}

impl Renderer {
    /// Creates a renderer over an existing context. `buffers` must wrap
    /// the same driver as `gpu` and be shared exactly with the renderers
    /// of this context's group.
    #[must_use]
    pub fn new(context: RenderContext, gpu: Arc<dyn GpuApi>, buffers: Arc<BufferRegistry>) -> Self {
        Self {
            context,
            gpu,
            optimizer: Box::new(NagaOptimizer),
            buffers,
            sort_objects: true,
            auto_clear: ClearMask::all(),
            clear_color: Color::BLACK,
            viewport: None,
            pre_plugins: Vec::new(),
            post_plugins: Vec::new(),
            lists: RenderLists::new(),
        }
    }

    /// Replaces the source-level shader optimizer (e.g. with
    /// [`NullOptimizer`](crate::shader::NullOptimizer) to debug generated
    /// source).
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: Box<dyn ShaderOptimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    #[must_use]
    pub fn buffers(&self) -> &Arc<BufferRegistry> {
        &self.buffers
    }

    // ========================================================================
    // Plugins
    // ========================================================================

    /// Registers a callback invoked at the start of every frame, before
    /// anything is cleared or drawn. Re-registering an id replaces its
    /// callback but keeps its position in the invocation order.
    pub fn register_pre_render_plugin(
        &mut self,
        id: Uuid,
        callback: impl FnMut(&mut Scene, &Camera) + Send + 'static,
    ) {
        Self::register_plugin(&mut self.pre_plugins, id, Box::new(callback));
    }

    /// Registers a callback invoked after both passes, before present.
    pub fn register_post_render_plugin(
        &mut self,
        id: Uuid,
        callback: impl FnMut(&mut Scene, &Camera) + Send + 'static,
    ) {
        Self::register_plugin(&mut self.post_plugins, id, Box::new(callback));
    }

    pub fn unregister_pre_render_plugin(&mut self, id: Uuid) {
        self.pre_plugins.retain(|(pid, _)| *pid != id);
    }

    pub fn unregister_post_render_plugin(&mut self, id: Uuid) {
        self.post_plugins.retain(|(pid, _)| *pid != id);
    }

    fn register_plugin(plugins: &mut Vec<(Uuid, RenderPlugin)>, id: Uuid, callback: RenderPlugin) {
        if let Some(slot) = plugins.iter_mut().find(|(pid, _)| *pid == id) {
            slot.1 = callback;
        } else {
            plugins.push((id, callback));
        }
    }

    // ========================================================================
    // Clear & state surface
    // ========================================================================

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    #[must_use]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    #[must_use]
    pub fn clear_alpha(&self) -> f32 {
        self.clear_color.a
    }

    /// Clears the given planes of the bound framebuffer immediately.
    pub fn clear(&self, mask: ClearMask) {
        self.context.with_lock(|| {
            self.gpu.set_clear_color(self.clear_color);
            self.gpu.clear(mask);
        });
    }

    pub fn clear_color_plane(&self) {
        self.clear(ClearMask::COLOR);
    }

    pub fn clear_depth(&self) {
        self.clear(ClearMask::DEPTH);
    }

    pub fn clear_stencil(&self) {
        self.clear(ClearMask::STENCIL);
    }

    /// Clears an offscreen target, restoring the default framebuffer
    /// afterwards.
    pub fn clear_target(&self, target: &RenderTarget, mask: ClearMask) {
        self.context.with_lock(|| {
            self.gpu.bind_framebuffer(Some(target.framebuffer()));
            self.gpu.set_clear_color(self.clear_color);
            self.gpu.clear(mask);
            self.gpu.bind_framebuffer(None);
        });
    }

    /// Overrides the viewport used when rendering to the window.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Some((x, y, width, height));
    }

    /// Returns to tracking the window's framebuffer size.
    pub fn set_default_viewport(&mut self) {
        self.viewport = None;
    }

    pub fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32) {
        self.context.with_lock(|| self.gpu.set_scissor(x, y, width, height));
    }

    pub fn set_scissor_test(&self, enable: bool) {
        self.context.with_lock(|| self.gpu.set_scissor_test(enable));
    }

    pub fn set_depth_test(&self, enable: bool) {
        self.context.with_lock(|| self.gpu.set_depth_test(enable));
    }

    pub fn set_depth_write(&self, enable: bool) {
        self.context.with_lock(|| self.gpu.set_depth_write(enable));
    }

    pub fn set_color_write(&self, enable: bool) {
        self.context.with_lock(|| self.gpu.set_color_write(enable));
    }

    pub fn set_face_culling(&self, cull: CullFace, front: FrontFace) {
        self.context.with_lock(|| self.gpu.set_face_culling(cull, front));
    }

    /// Reads back RGBA8 pixels from an offscreen target.
    #[must_use]
    pub fn read_render_target_pixels(
        &self,
        target: &RenderTarget,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Vec<u8> {
        self.context.with_lock(|| {
            self.gpu.bind_framebuffer(Some(target.framebuffer()));
            let pixels = self.gpu.read_pixels(x, y, width, height);
            self.gpu.bind_framebuffer(None);
            pixels
        })
    }

    // ========================================================================
    // Window passthrough
    // ========================================================================

    pub fn process_events(&self) {
        self.context.poll_events();
    }

    #[must_use]
    pub fn needs_to_close(&self) -> bool {
        self.context.should_close()
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Renders one frame of `scene` through `camera`, into `target` or
    /// the window. Single-item failures are logged and skipped; the frame
    /// itself always completes.
    pub fn render(
        &mut self,
        scene: &mut Scene,
        camera: &mut Camera,
        target: Option<&RenderTarget>,
        force_clear: bool,
    ) {
        let _guard = self.context.manager().lock();
        self.context.make_current(false);

        // 1. Pre-render plugins, before anything touches the frame.
        for (_, plugin) in &mut self.pre_plugins {
            plugin(scene, camera);
        }

        // 2. Bind the output.
        match target {
            Some(t) => {
                self.gpu.bind_framebuffer(Some(t.framebuffer()));
                self.gpu.set_viewport(0, 0, t.width(), t.height());
            }
            None => {
                self.gpu.bind_framebuffer(None);
                let (x, y, width, height) = self
                    .viewport
                    .unwrap_or_else(|| {
                        let (w, h) = self.context.framebuffer_size();
                        (0, 0, w, h)
                    });
                if width > 0 && height > 0 {
                    self.gpu.set_viewport(x, y, width, height);
                }
            }
        }

        // 3. Classify: refresh matrices, walk the graph, fill buckets.
        scene.update_world_matrices();
        camera.update_view_projection();
        self.lists.clear();
        for root in scene.root_nodes.clone() {
            Self::project_node(scene, root, camera, &mut self.lists);
        }

        // 4. Clear.
        let mask = if force_clear {
            ClearMask::all()
        } else {
            self.auto_clear
        };
        if !mask.is_empty() {
            self.gpu.set_clear_color(self.clear_color);
            self.gpu.clear(mask);
        }

        // 5. Sort.
        if self.sort_objects {
            self.lists.sort();
        }

        // 6. Draw: opaque front-to-back, then transparent back-to-front.
        let lights = bind::collect_lights(scene, &self.lists.lights);
        for item in &self.lists.opaque {
            self.render_item(scene, camera, item, &lights);
        }
        for item in &self.lists.transparent {
            self.render_item(scene, camera, item, &lights);
        }

        // 7. Post-render plugins.
        for (_, plugin) in &mut self.post_plugins {
            plugin(scene, camera);
        }

        // 8. Present.
        if target.is_none() {
            self.context.swap_buffers();
        } else {
            self.gpu.bind_framebuffer(None);
        }
    }

    /// Recursive scene walk. Invisible nodes prune their whole subtree;
    /// visible meshes are frustum-tested and bucketed with their
    /// view-space depth.
    fn project_node(scene: &Scene, key: NodeKey, camera: &Camera, lists: &mut RenderLists) {
        let Some(node) = scene.get_node(key) else {
            return;
        };
        if !node.visible {
            return;
        }

        match &node.kind {
            NodeKind::Group => {}
            NodeKind::Light(_) => lists.lights.push(key),
            NodeKind::Mesh(mesh) => {
                let geometry = mesh.geometry.read();
                let (center, viewable) = match geometry.bounding_sphere {
                    Some(sphere) => {
                        let center = node.world_matrix.transform_point3(sphere.center);
                        let m = node.world_matrix.matrix3;
                        let scale = m
                            .x_axis
                            .length()
                            .max(m.y_axis.length())
                            .max(m.z_axis.length());
                        (
                            center,
                            camera.frustum().intersects_sphere(center, sphere.radius * scale),
                        )
                    }
                    // No bounds, never cull.
                    None => (node.world_matrix.translation.into(), true),
                };
                drop(geometry);

                if viewable {
                    let view_pos = camera.view_matrix().transform_point3(center);
                    // The camera looks down -Z in view space.
                    let z = -view_pos.z;
                    let transparent = mesh.material.read().transparent;
                    lists.push_mesh(
                        RenderItem::with_group(key, z, mesh.render_order),
                        transparent,
                    );
                }
            }
        }

        for &child in node.children() {
            Self::project_node(scene, child, camera, lists);
        }
    }

    /// Draws one item, isolating its failures from the rest of the frame.
    fn render_item(&self, scene: &Scene, camera: &Camera, item: &RenderItem, lights: &FrameLights) {
        if let Err(e) = self.draw_item(scene, camera, item, lights) {
            log::error!("Draw skipped: {e}");
            return;
        }
        if let Some(driver_error) = self.gpu.poll_error() {
            log::error!("GPU error during draw, object skipped: {driver_error}");
        }
    }

    fn draw_item(
        &self,
        scene: &Scene,
        camera: &Camera,
        item: &RenderItem,
        lights: &FrameLights,
    ) -> Result<()> {
        let Some(node) = scene.get_node(item.node) else {
            return Ok(());
        };
        let NodeKind::Mesh(mesh) = &node.kind else {
            return Ok(());
        };

        let material = mesh.material.read();
        let mut program = material.program.write();

        // A dirty program is never drawn with.
        if program.is_dirty() {
            program.compile(self.gpu.as_ref(), self.optimizer.as_ref())?;
        }
        program.bind(self.gpu.as_ref());
        material.apply_render_state(self.gpu.as_ref());

        let geometry = mesh.geometry.read();
        bind::bind_mesh(
            self.gpu.as_ref(),
            &self.buffers,
            self.context.id(),
            &mut program,
            camera,
            node,
            &geometry,
            lights,
            material.color,
        );

        let count = geometry.draw_count() as i32;
        if geometry.is_indexed() {
            self.gpu.draw_elements(DrawMode::Triangles, count);
        } else {
            self.gpu.draw_arrays(DrawMode::Triangles, 0, count);
        }
        Ok(())
    }
}
