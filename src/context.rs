//! Window & Context Management
//!
//! Rendering contexts are owned one-per-window and may share GPU objects
//! when created against an existing context (a *context group*). All
//! context-affecting work (creation, destruction, current-context
//! switches, and any direct driver call) happens under one process-wide
//! re-entrant lock, acquired through [`ContextManager::lock`] or the
//! [`RenderContext::with_lock`] primitive.
//!
//! The windowing system itself sits behind [`WindowBackend`]; the engine
//! only drives it through that trait. [`HeadlessWindowBackend`] is the
//! windowless implementation used by tests and CI.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use rustc_hash::FxHashMap;

use crate::errors::{EmberError, Result};

/// Backend-assigned window identifier.
pub type WindowId = u64;

/// Creation parameters for a window and its context.
#[derive(Debug, Clone)]
pub struct WindowDesc {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Backend-specific creation hints, passed through untouched.
    pub hints: Vec<(i32, i32)>,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "ember".to_string(),
            hints: Vec::new(),
        }
    }
}

/// The windowing collaborator: window/context lifecycle, current-context
/// switching, presentation, and OS event pumping.
///
/// Implementations are driven exclusively under the [`ContextManager`]
/// lock; they do not need their own synchronization for correctness,
/// though they must be `Send + Sync` to be shared across renderers.
pub trait WindowBackend: Send + Sync {
    /// Process-wide initialization, called before the first window.
    fn init(&self) -> std::result::Result<(), String>;
    /// Process-wide teardown, called after the last window is destroyed.
    fn terminate(&self);

    /// Creates a window plus context, optionally sharing GPU objects with
    /// `share`'s context.
    fn create_window(
        &self,
        desc: &WindowDesc,
        share: Option<WindowId>,
    ) -> std::result::Result<WindowId, String>;
    fn destroy_window(&self, window: WindowId);

    fn make_current(&self, window: WindowId);
    fn current_window(&self) -> Option<WindowId>;

    fn swap_buffers(&self, window: WindowId);
    fn poll_events(&self);
    fn should_close(&self, window: WindowId) -> bool;
    fn framebuffer_size(&self, window: WindowId) -> (u32, u32);
    fn set_resize_callback(&self, window: WindowId, callback: Box<dyn FnMut(u32, u32) + Send>);
}

/// Process-wide service coordinating every [`RenderContext`].
///
/// Owns the re-entrant context lock, counts live windows so the backend is
/// initialized exactly once and torn down with the last window, and hands
/// out context and context-group ids. Explicitly owned and passed by
/// reference (`Arc`), never ambient global state.
pub struct ContextManager {
    backend: Arc<dyn WindowBackend>,
    lock: ReentrantMutex<()>,
    instances: Mutex<u32>,
    next_context_id: AtomicU64,
    next_group_id: AtomicU64,
}

impl ContextManager {
    #[must_use]
    pub fn new(backend: Arc<dyn WindowBackend>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            lock: ReentrantMutex::new(()),
            instances: Mutex::new(0),
            next_context_id: AtomicU64::new(1),
            next_group_id: AtomicU64::new(1),
        })
    }

    /// Acquires the process-wide context lock. Required around any direct
    /// driver call made outside of [`RenderContext::with_lock`].
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn WindowBackend> {
        &self.backend
    }

    /// Number of live windows under this manager.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        *self.instances.lock()
    }
}

/// One window plus its GPU context.
///
/// Created through [`RenderContext::new`]; destroying the last one tears
/// the windowing backend down. Contexts created with a `share` partner
/// belong to the same context group and may reuse each other's GPU
/// buffers; unrelated contexts must not (see
/// [`BufferRegistry`](crate::renderer::BufferRegistry)).
pub struct RenderContext {
    id: u64,
    group: u64,
    window: WindowId,
    manager: Arc<ContextManager>,
}

impl RenderContext {
    /// Creates a window and context. Fails with
    /// [`EmberError::ContextInit`] if the backend cannot initialize or
    /// refuses the window.
    pub fn new(
        manager: &Arc<ContextManager>,
        desc: &WindowDesc,
        share: Option<&RenderContext>,
    ) -> Result<Self> {
        let _guard = manager.lock();

        let mut instances = manager.instances.lock();
        if *instances == 0 {
            manager
                .backend
                .init()
                .map_err(EmberError::ContextInit)?;
            log::info!("Window backend initialized");
        }

        let window = match manager.backend.create_window(desc, share.map(|s| s.window)) {
            Ok(window) => window,
            Err(message) => {
                if *instances == 0 {
                    manager.backend.terminate();
                }
                return Err(EmberError::ContextInit(message));
            }
        };
        *instances += 1;
        drop(instances);

        let group = share.map_or_else(
            || manager.next_group_id.fetch_add(1, Ordering::Relaxed),
            |s| s.group,
        );

        let context = Self {
            id: manager.next_context_id.fetch_add(1, Ordering::Relaxed),
            group,
            window,
            manager: manager.clone(),
        };
        log::debug!(
            "Created context {} (group {}, window {})",
            context.id,
            context.group,
            context.window
        );
        context.make_current(false);
        Ok(context)
    }

    /// Process-unique context id; keys per-context GPU resources.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Context-group id; contexts in one group share GPU objects.
    #[must_use]
    pub fn group(&self) -> u64 {
        self.group
    }

    /// The manager this context was created under.
    #[must_use]
    pub fn manager(&self) -> &Arc<ContextManager> {
        &self.manager
    }

    /// Makes this context current, skipping the switch when it already is
    /// (unless `force`).
    pub fn make_current(&self, force: bool) {
        let _guard = self.manager.lock();
        let backend = &self.manager.backend;
        if force || backend.current_window() != Some(self.window) {
            backend.make_current(self.window);
        }
    }

    /// Runs `f` with the context lock held and this context current. The
    /// lock is re-entrant, so nesting is fine.
    pub fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.manager.lock();
        self.make_current(false);
        f()
    }

    pub fn swap_buffers(&self) {
        let _guard = self.manager.lock();
        self.manager.backend.swap_buffers(self.window);
    }

    pub fn poll_events(&self) {
        let _guard = self.manager.lock();
        self.manager.backend.poll_events();
    }

    #[must_use]
    pub fn should_close(&self) -> bool {
        let _guard = self.manager.lock();
        self.manager.backend.should_close(self.window)
    }

    #[must_use]
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let _guard = self.manager.lock();
        self.manager.backend.framebuffer_size(self.window)
    }

    /// Registers a callback fired when the framebuffer is resized.
    pub fn on_resize(&self, callback: impl FnMut(u32, u32) + Send + 'static) {
        let _guard = self.manager.lock();
        self.manager
            .backend
            .set_resize_callback(self.window, Box::new(callback));
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        let _guard = self.manager.lock();
        self.manager.backend.destroy_window(self.window);
        log::debug!("Destroyed context {}", self.id);

        let mut instances = self.manager.instances.lock();
        *instances -= 1;
        if *instances == 0 {
            self.manager.backend.terminate();
            log::info!("Window backend terminated");
        }
    }
}

// ============================================================================
// Headless backend
// ============================================================================

#[derive(Default)]
struct HeadlessWindows {
    sizes: FxHashMap<WindowId, (u32, u32)>,
    current: Option<WindowId>,
}

/// Windowless [`WindowBackend`] for tests and CI. Tracks window lifetimes
/// and init/terminate cycles; presentation and event pumping are no-ops.
pub struct HeadlessWindowBackend {
    windows: Mutex<HeadlessWindows>,
    next_window: AtomicU64,
    init_calls: AtomicU64,
    terminate_calls: AtomicU64,
    fail_window_creation: Mutex<bool>,
}

impl Default for HeadlessWindowBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessWindowBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HeadlessWindows::default()),
            next_window: AtomicU64::new(1),
            init_calls: AtomicU64::new(0),
            terminate_calls: AtomicU64::new(0),
            fail_window_creation: Mutex::new(false),
        }
    }

    /// Makes the next `create_window` call fail.
    pub fn fail_next_window(&self) {
        *self.fail_window_creation.lock() = true;
    }

    #[must_use]
    pub fn init_calls(&self) -> u64 {
        self.init_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn terminate_calls(&self) -> u64 {
        self.terminate_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn live_windows(&self) -> usize {
        self.windows.lock().sizes.len()
    }
}

impl WindowBackend for HeadlessWindowBackend {
    fn init(&self) -> std::result::Result<(), String> {
        self.init_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn terminate(&self) {
        self.terminate_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn create_window(
        &self,
        desc: &WindowDesc,
        _share: Option<WindowId>,
    ) -> std::result::Result<WindowId, String> {
        let mut fail = self.fail_window_creation.lock();
        if *fail {
            *fail = false;
            return Err("window creation rejected".to_string());
        }
        let id = self.next_window.fetch_add(1, Ordering::Relaxed);
        self.windows
            .lock()
            .sizes
            .insert(id, (desc.width, desc.height));
        Ok(id)
    }

    fn destroy_window(&self, window: WindowId) {
        let mut windows = self.windows.lock();
        windows.sizes.remove(&window);
        if windows.current == Some(window) {
            windows.current = None;
        }
    }

    fn make_current(&self, window: WindowId) {
        self.windows.lock().current = Some(window);
    }

    fn current_window(&self) -> Option<WindowId> {
        self.windows.lock().current
    }

    fn swap_buffers(&self, _window: WindowId) {}

    fn poll_events(&self) {}

    fn should_close(&self, _window: WindowId) -> bool {
        false
    }

    fn framebuffer_size(&self, window: WindowId) -> (u32, u32) {
        self.windows
            .lock()
            .sizes
            .get(&window)
            .copied()
            .unwrap_or((0, 0))
    }

    fn set_resize_callback(&self, _window: WindowId, _callback: Box<dyn FnMut(u32, u32) + Send>) {}
}
