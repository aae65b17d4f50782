//! GPU Driver Boundary
//!
//! The engine core is expressed against [`GpuApi`], a thin trait over an
//! immediate-mode rasterization driver: shader/program objects addressed by
//! integer handles, named attribute/uniform locations, buffer objects, and
//! explicit draw submission. Any backend that can satisfy this surface
//! (GL-family drivers being the obvious fit) can host the renderer; the
//! [`headless`] backend satisfies it with no driver at all and is what the
//! test suite runs against.
//!
//! Handle value `0` is the "unallocated" sentinel for every object kind,
//! and location `-1` means "name not used by the program"; callers skip
//! binding rather than treating it as an error.

pub mod headless;

pub use headless::HeadlessGpu;

use bitflags::bitflags;
use glam::{Mat4, Vec3};

/// GPU shader object handle. `0` = unallocated.
pub type ShaderHandle = u32;
/// GPU program object handle. `0` = unallocated.
pub type ProgramHandle = u32;
/// GPU buffer object handle. `0` = unallocated.
pub type BufferHandle = u32;
/// GPU framebuffer object handle. `0` = the default framebuffer.
pub type FramebufferHandle = u32;

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

/// Upload frequency hint, carried by the attribute that owns the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

/// Primitive assembly mode for draw submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Triangles,
    Lines,
    Points,
}

/// Which faces get culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    None,
    Back,
    Front,
    FrontAndBack,
}

/// Winding order that counts as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

bitflags! {
    /// Buffer planes selected by a clear.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ClearMask: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// An RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// The immediate-mode driver surface consumed by the engine core.
///
/// All calls are assumed to execute against the context that is current on
/// the calling thread; holding the context lock (see
/// [`RenderContext::with_lock`](crate::context::RenderContext::with_lock))
/// is the caller's responsibility.
///
/// Failures are reported the way immediate-mode drivers report them:
/// creation calls return the `0` sentinel, compile/link report a status
/// plus a diagnostic log, and everything else accumulates into a polled
/// error state ([`GpuApi::poll_error`]).
pub trait GpuApi: Send + Sync {
    // === Shader objects ===

    /// Creates a shader object for `stage`. Returns `0` on failure.
    fn create_shader(&self, stage: ShaderStage) -> ShaderHandle;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    /// Compiles the shader. Returns `false` on rejection; the diagnostic
    /// is then available from [`GpuApi::shader_info_log`].
    fn compile_shader(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    // === Program objects ===

    fn create_program(&self) -> ProgramHandle;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Links the program. Returns `false` on rejection; the diagnostic is
    /// then available from [`GpuApi::program_info_log`].
    fn link_program(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn use_program(&self, program: ProgramHandle);
    fn delete_program(&self, program: ProgramHandle);

    /// Location of a named vertex attribute, `-1` if unused by the program.
    fn attrib_location(&self, program: ProgramHandle, name: &str) -> i32;
    /// Location of a named uniform, `-1` if unused by the program.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> i32;

    // === Uniform upload (no-ops at location -1) ===

    fn uniform_mat4(&self, location: i32, value: &Mat4);
    fn uniform_vec3(&self, location: i32, value: Vec3);
    fn uniform_f32(&self, location: i32, value: f32);
    fn uniform_i32(&self, location: i32, value: i32);

    // === Buffer objects ===

    fn gen_buffer(&self) -> BufferHandle;
    fn bind_buffer(&self, kind: BufferKind, buffer: BufferHandle);
    /// Uploads `data` to the buffer currently bound at `kind`.
    fn buffer_data(&self, kind: BufferKind, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&self, buffer: BufferHandle);

    // === Vertex attribute setup ===

    fn enable_vertex_attrib(&self, location: i32);
    /// Points `location` at the `Array` buffer currently bound, reading
    /// `components` floats per vertex, tightly packed.
    fn vertex_attrib_pointer(&self, location: i32, components: i32);

    // === Framebuffer & fixed-function state ===

    /// Binds `target`, or the default framebuffer for `None`.
    fn bind_framebuffer(&self, target: Option<FramebufferHandle>);
    fn create_framebuffer(&self) -> FramebufferHandle;
    fn delete_framebuffer(&self, target: FramebufferHandle);
    /// Reads back RGBA8 pixels from the bound framebuffer.
    fn read_pixels(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8>;

    fn set_clear_color(&self, color: Color);
    fn clear(&self, mask: ClearMask);
    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32);
    fn set_scissor(&self, x: i32, y: i32, width: u32, height: u32);
    fn set_scissor_test(&self, enable: bool);
    fn set_depth_test(&self, enable: bool);
    fn set_depth_write(&self, enable: bool);
    fn set_color_write(&self, enable: bool);
    fn set_face_culling(&self, cull: CullFace, front: FrontFace);

    // === Draw submission ===

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32);
    /// Draws `count` indices from the bound `ElementArray` buffer.
    fn draw_elements(&self, mode: DrawMode, count: i32);

    // === Error state ===

    /// Drains one pending driver error, if any. The renderer polls this
    /// after each draw; a reported error skips that draw and the frame
    /// continues.
    fn poll_error(&self) -> Option<String>;
}
