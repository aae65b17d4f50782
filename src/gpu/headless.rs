//! Headless GPU Backend
//!
//! A driverless [`GpuApi`] implementation that simulates object lifetimes
//! with handle counters and records every interesting call. It backs the
//! integration test suite (allocation counting, call ordering, failure
//! injection) and doubles as a no-output backend for CI environments
//! without a GPU.
//!
//! Semantics mirror a well-behaved driver:
//! - creation calls hand out ascending non-zero handles
//! - attribute/uniform locations are assigned per program on first query
//! - compile/link succeed unless a failure has been injected
//! - `poll_error` drains errors injected with [`HeadlessGpu::push_error`]

use glam::{Mat4, Vec3};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    BufferHandle, BufferKind, BufferUsage, ClearMask, Color, CullFace, DrawMode, FramebufferHandle,
    FrontFace, GpuApi, ProgramHandle, ShaderHandle, ShaderStage,
};

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderHandle>,
    linked: bool,
    locations: FxHashMap<String, i32>,
    next_location: i32,
}

#[derive(Default)]
struct HeadlessState {
    next_handle: u32,

    shaders: FxHashMap<ShaderHandle, ShaderObject>,
    programs: FxHashMap<ProgramHandle, ProgramObject>,
    buffers: FxHashSet<BufferHandle>,
    framebuffers: FxHashSet<FramebufferHandle>,
    bound_buffers: FxHashMap<BufferKind, BufferHandle>,

    // Names that resolve to -1, simulating variables the (virtual) driver
    // optimized out of the program.
    unused_names: FxHashSet<String>,

    calls: Vec<String>,

    buffers_allocated: u32,
    buffers_deleted: u32,
    uploads: FxHashMap<BufferHandle, u32>,
    location_queries: u32,
    draw_calls: u32,
    clear_calls: u32,

    // Survives stage-object deletion, unlike `shaders`.
    last_sources: FxHashMap<ShaderStage, String>,

    fail_compile: Option<ShaderStage>,
    fail_link: bool,
    errors: Vec<String>,
}

/// Recording, driverless GPU backend.
pub struct HeadlessGpu {
    state: Mutex<HeadlessState>,
}

impl Default for HeadlessGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessGpu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HeadlessState::default()),
        }
    }

    // === Failure injection ===

    /// Makes the next compile of `stage` report failure.
    pub fn fail_next_compile(&self, stage: ShaderStage) {
        self.state.lock().fail_compile = Some(stage);
    }

    /// Makes the next program link report failure.
    pub fn fail_next_link(&self) {
        self.state.lock().fail_link = true;
    }

    /// Queues a driver error for [`GpuApi::poll_error`] to drain.
    pub fn push_error(&self, message: impl Into<String>) {
        self.state.lock().errors.push(message.into());
    }

    /// Marks `name` as unused: location queries for it return -1.
    pub fn mark_name_unused(&self, name: impl Into<String>) {
        self.state.lock().unused_names.insert(name.into());
    }

    // === Inspection ===

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn call_log(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    #[must_use]
    pub fn buffers_allocated(&self) -> u32 {
        self.state.lock().buffers_allocated
    }

    #[must_use]
    pub fn buffers_deleted(&self) -> u32 {
        self.state.lock().buffers_deleted
    }

    /// Number of `buffer_data` uploads that targeted `buffer`.
    #[must_use]
    pub fn upload_count(&self, buffer: BufferHandle) -> u32 {
        self.state.lock().uploads.get(&buffer).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn draw_calls(&self) -> u32 {
        self.state.lock().draw_calls
    }

    #[must_use]
    pub fn clear_calls(&self) -> u32 {
        self.state.lock().clear_calls
    }

    /// Driver-side location queries actually issued (cache-miss count).
    #[must_use]
    pub fn location_queries(&self) -> u32 {
        self.state.lock().location_queries
    }

    /// Shader objects that have been created but not yet deleted.
    #[must_use]
    pub fn live_shaders(&self) -> usize {
        self.state.lock().shaders.len()
    }

    /// Program objects that have been created but not yet deleted.
    #[must_use]
    pub fn live_programs(&self) -> usize {
        self.state.lock().programs.len()
    }

    /// The source last attached to the given shader object, if it is alive.
    #[must_use]
    pub fn shader_source_of(&self, shader: ShaderHandle) -> Option<String> {
        self.state.lock().shaders.get(&shader).map(|s| s.source.clone())
    }

    /// The source most recently submitted for `stage`, surviving deletion
    /// of the stage object itself.
    #[must_use]
    pub fn last_source(&self, stage: ShaderStage) -> Option<String> {
        self.state.lock().last_sources.get(&stage).cloned()
    }
}

impl HeadlessState {
    fn alloc_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn record(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }
}

impl GpuApi for HeadlessGpu {
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle {
        let mut state = self.state.lock();
        let handle = state.alloc_handle();
        state.shaders.insert(
            handle,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        state.record(format!("create_shader({stage})"));
        handle
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        let mut state = self.state.lock();
        let Some(stage) = state.shaders.get(&shader).map(|s| s.stage) else {
            return;
        };
        state.last_sources.insert(stage, source.to_string());
        if let Some(obj) = state.shaders.get_mut(&shader) {
            obj.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) -> bool {
        let mut state = self.state.lock();
        let Some(stage) = state.shaders.get(&shader).map(|s| s.stage) else {
            return false;
        };
        let ok = state.fail_compile != Some(stage);
        if !ok {
            state.fail_compile = None;
        }
        if let Some(obj) = state.shaders.get_mut(&shader) {
            obj.compiled = ok;
        }
        state.record(format!("compile_shader({stage})"));
        ok
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        let state = self.state.lock();
        match state.shaders.get(&shader) {
            Some(obj) if !obj.compiled => format!("injected {} compile failure", obj.stage),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.lock();
        state.shaders.remove(&shader);
        state.record("delete_shader");
    }

    fn create_program(&self) -> ProgramHandle {
        let mut state = self.state.lock();
        let handle = state.alloc_handle();
        state.programs.insert(handle, ProgramObject::default());
        state.record("create_program");
        handle
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.lock();
        if let Some(obj) = state.programs.get_mut(&program) {
            obj.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.lock();
        if let Some(obj) = state.programs.get_mut(&program) {
            obj.attached.retain(|&s| s != shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.lock();
        let ok = !state.fail_link;
        state.fail_link = false;
        if let Some(obj) = state.programs.get_mut(&program) {
            obj.linked = ok;
        }
        state.record("link_program");
        ok
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        let state = self.state.lock();
        match state.programs.get(&program) {
            Some(obj) if !obj.linked => "injected link failure".to_string(),
            _ => String::new(),
        }
    }

    fn use_program(&self, program: ProgramHandle) {
        self.state.lock().record(format!("use_program({program})"));
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        state.programs.remove(&program);
        state.record("delete_program");
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> i32 {
        let mut state = self.state.lock();
        state.location_queries += 1;
        if state.unused_names.contains(name) {
            return -1;
        }
        let Some(obj) = state.programs.get_mut(&program) else {
            return -1;
        };
        if let Some(&loc) = obj.locations.get(name) {
            return loc;
        }
        let loc = obj.next_location;
        obj.next_location += 1;
        obj.locations.insert(name.to_string(), loc);
        loc
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32 {
        // Uniforms and attributes share one per-program namespace here;
        // a real driver keeps them apart but nothing in the engine relies
        // on that.
        self.attrib_location(program, name)
    }

    fn uniform_mat4(&self, _location: i32, _value: &Mat4) {}

    fn uniform_vec3(&self, _location: i32, _value: Vec3) {}

    fn uniform_f32(&self, _location: i32, _value: f32) {}

    fn uniform_i32(&self, _location: i32, _value: i32) {}

    fn gen_buffer(&self) -> BufferHandle {
        let mut state = self.state.lock();
        let handle = state.alloc_handle();
        state.buffers.insert(handle);
        state.buffers_allocated += 1;
        state.record(format!("gen_buffer({handle})"));
        handle
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: BufferHandle) {
        let mut state = self.state.lock();
        state.bound_buffers.insert(kind, buffer);
    }

    fn buffer_data(&self, kind: BufferKind, data: &[u8], usage: BufferUsage) {
        let mut state = self.state.lock();
        let bound = state.bound_buffers.get(&kind).copied().unwrap_or(0);
        *state.uploads.entry(bound).or_insert(0) += 1;
        state.record(format!(
            "buffer_data({bound}, {} bytes, {usage:?})",
            data.len()
        ));
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        if state.buffers.remove(&buffer) {
            state.buffers_deleted += 1;
            state.record(format!("delete_buffer({buffer})"));
        }
    }

    fn enable_vertex_attrib(&self, _location: i32) {}

    fn vertex_attrib_pointer(&self, _location: i32, _components: i32) {}

    fn bind_framebuffer(&self, target: Option<FramebufferHandle>) {
        let mut state = self.state.lock();
        state.record(format!("bind_framebuffer({})", target.unwrap_or(0)));
    }

    fn create_framebuffer(&self) -> FramebufferHandle {
        let mut state = self.state.lock();
        let handle = state.alloc_handle();
        state.framebuffers.insert(handle);
        handle
    }

    fn delete_framebuffer(&self, target: FramebufferHandle) {
        self.state.lock().framebuffers.remove(&target);
    }

    fn read_pixels(&self, _x: i32, _y: i32, width: u32, height: u32) -> Vec<u8> {
        vec![0; (width * height * 4) as usize]
    }

    fn set_clear_color(&self, _color: Color) {}

    fn clear(&self, mask: ClearMask) {
        let mut state = self.state.lock();
        state.clear_calls += 1;
        state.record(format!("clear({mask:?})"));
    }

    fn set_viewport(&self, _x: i32, _y: i32, _width: u32, _height: u32) {}

    fn set_scissor(&self, _x: i32, _y: i32, _width: u32, _height: u32) {}

    fn set_scissor_test(&self, _enable: bool) {}

    fn set_depth_test(&self, _enable: bool) {}

    fn set_depth_write(&self, _enable: bool) {}

    fn set_color_write(&self, _enable: bool) {}

    fn set_face_culling(&self, _cull: CullFace, _front: FrontFace) {}

    fn draw_arrays(&self, _mode: DrawMode, _first: i32, count: i32) {
        let mut state = self.state.lock();
        state.draw_calls += 1;
        state.record(format!("draw_arrays({count})"));
    }

    fn draw_elements(&self, _mode: DrawMode, count: i32) {
        let mut state = self.state.lock();
        state.draw_calls += 1;
        state.record(format!("draw_elements({count})"));
    }

    fn poll_error(&self) -> Option<String> {
        let mut state = self.state.lock();
        if state.errors.is_empty() {
            None
        } else {
            Some(state.errors.remove(0))
        }
    }
}
