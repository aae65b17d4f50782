//! Shader Program
//!
//! Owns one linked GPU program built from a vertex-root and fragment-root
//! node graph, plus the attribute/uniform location caches for it.
//!
//! A program starts dirty and must be compiled before any draw uses it;
//! editing the graph marks it dirty again. `compile()` is transactional
//! with respect to GPU objects: on any stage or link failure every
//! half-created handle is released and the program handle is left at the
//! unallocated sentinel, so there is never a partially-installed program.

use rustc_hash::FxHashMap;

use crate::errors::{EmberError, Result};
use crate::gpu::{GpuApi, ProgramHandle, ShaderHandle, ShaderStage};
use crate::shader::compiler;
use crate::shader::node::ShaderNodeRef;
use crate::shader::optimizer::ShaderOptimizer;

pub struct ShaderProgram {
    vertex_root: ShaderNodeRef,
    fragment_root: ShaderNodeRef,

    dirty: bool,
    program: ProgramHandle,

    attrib_locations: FxHashMap<String, i32>,
    uniform_locations: FxHashMap<String, i32>,
}

impl ShaderProgram {
    /// Creates a program over the given roots. Starts dirty.
    #[must_use]
    pub fn new(vertex_root: ShaderNodeRef, fragment_root: ShaderNodeRef) -> Self {
        Self {
            vertex_root,
            fragment_root,
            dirty: true,
            program: 0,
            attrib_locations: FxHashMap::default(),
            uniform_locations: FxHashMap::default(),
        }
    }

    /// Whether the graph has changed since the last successful compile.
    /// A dirty program must not be drawn with.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flags the program for recompilation, e.g. after a graph edit.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The linked GPU program handle; `0` until compiled.
    #[must_use]
    pub fn handle(&self) -> ProgramHandle {
        self.program
    }

    #[must_use]
    pub fn vertex_root(&self) -> &ShaderNodeRef {
        &self.vertex_root
    }

    #[must_use]
    pub fn fragment_root(&self) -> &ShaderNodeRef {
        &self.fragment_root
    }

    /// Swaps in new graph roots and marks the program dirty.
    pub fn set_roots(&mut self, vertex_root: ShaderNodeRef, fragment_root: ShaderNodeRef) {
        self.vertex_root = vertex_root;
        self.fragment_root = fragment_root;
        self.dirty = true;
    }

    /// Regenerates source from both graphs, optimizes, compiles and links.
    ///
    /// Optimizer rejections are logged and the unoptimized source is kept.
    /// Stage compilation failure raises [`EmberError::ShaderCompile`] and
    /// link failure raises [`EmberError::ShaderLink`]; in both cases every
    /// GPU handle created by this call is released and the program handle
    /// stays `0`. On success the stage objects are detached and deleted
    /// (the linked program keeps what it needs) and the dirty flag clears.
    pub fn compile(&mut self, gpu: &dyn GpuApi, optimizer: &dyn ShaderOptimizer) -> Result<()> {
        // Old locations belong to the old program.
        self.attrib_locations.clear();
        self.uniform_locations.clear();

        let mut vertex_code = compiler::generate(&self.vertex_root)?;
        log::debug!("Vertex shader:\n{vertex_code}");
        let mut fragment_code = compiler::generate(&self.fragment_root)?;
        log::debug!("Fragment shader:\n{fragment_code}");

        match optimizer.optimize(ShaderStage::Vertex, &vertex_code) {
            Ok(optimized) => {
                log::debug!("Optimized vertex shader:\n{optimized}");
                vertex_code = optimized;
            }
            Err(diag) => log::error!("Failed to optimize vertex shader!\n{diag}"),
        }
        match optimizer.optimize(ShaderStage::Fragment, &fragment_code) {
            Ok(optimized) => {
                log::debug!("Optimized fragment shader:\n{optimized}");
                fragment_code = optimized;
            }
            Err(diag) => log::error!("Failed to optimize fragment shader!\n{diag}"),
        }

        let vertex_shader = compile_stage(gpu, ShaderStage::Vertex, &vertex_code)?;
        let fragment_shader = match compile_stage(gpu, ShaderStage::Fragment, &fragment_code) {
            Ok(shader) => shader,
            Err(e) => {
                gpu.delete_shader(vertex_shader);
                return Err(e);
            }
        };

        // Replace, never overwrite: the previous program is a distinct
        // GPU object and has to be released first.
        if self.program != 0 {
            gpu.delete_program(self.program);
        }
        self.program = gpu.create_program();

        gpu.attach_shader(self.program, vertex_shader);
        gpu.attach_shader(self.program, fragment_shader);

        if !gpu.link_program(self.program) {
            let link_log = gpu.program_info_log(self.program);
            gpu.delete_shader(vertex_shader);
            gpu.delete_shader(fragment_shader);
            gpu.delete_program(self.program);
            self.program = 0;
            log::error!("Failed to link shader program!");
            return Err(EmberError::ShaderLink { log: link_log });
        }

        // The linked program retains the stages it needs; the standalone
        // stage objects can go.
        gpu.detach_shader(self.program, vertex_shader);
        gpu.detach_shader(self.program, fragment_shader);
        gpu.delete_shader(vertex_shader);
        gpu.delete_shader(fragment_shader);

        self.dirty = false;
        Ok(())
    }

    /// Makes this the active program for subsequent draws.
    pub fn bind(&self, gpu: &dyn GpuApi) {
        gpu.use_program(self.program);
    }

    /// Location of a named vertex attribute in the linked program, `-1`
    /// if the program does not use it; callers skip binding in that
    /// case. Cached until the next compile.
    pub fn attrib_location(&mut self, gpu: &dyn GpuApi, name: &str) -> i32 {
        if let Some(&location) = self.attrib_locations.get(name) {
            return location;
        }
        let location = gpu.attrib_location(self.program, name);
        self.attrib_locations.insert(name.to_string(), location);
        location
    }

    /// Location of a named uniform, `-1` if unused. Cached until the next
    /// compile.
    pub fn uniform_location(&mut self, gpu: &dyn GpuApi, name: &str) -> i32 {
        if let Some(&location) = self.uniform_locations.get(name) {
            return location;
        }
        let location = gpu.uniform_location(self.program, name);
        self.uniform_locations.insert(name.to_string(), location);
        location
    }

    /// Releases the GPU program. The program reverts to unallocated and
    /// dirty; compiling again restores it.
    pub fn destroy(&mut self, gpu: &dyn GpuApi) {
        if self.program != 0 {
            gpu.delete_program(self.program);
            self.program = 0;
        }
        self.dirty = true;
        self.attrib_locations.clear();
        self.uniform_locations.clear();
    }
}

fn compile_stage(gpu: &dyn GpuApi, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
    let shader = gpu.create_shader(stage);
    if shader == 0 {
        log::error!("Failed to create a {stage} shader handle!");
        return Err(EmberError::ShaderCompile {
            stage,
            log: "driver refused to allocate a shader object".to_string(),
        });
    }

    gpu.shader_source(shader, source);
    if !gpu.compile_shader(shader) {
        let info_log = gpu.shader_info_log(shader);
        log::error!("The {stage} shader failed to compile!\n{info_log}");
        gpu.delete_shader(shader);
        return Err(EmberError::ShaderCompile {
            stage,
            log: info_log,
        });
    }
    Ok(shader)
}
