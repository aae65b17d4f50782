//! Source-Level Shader Optimization
//!
//! Generated shader source is handed to a [`ShaderOptimizer`] before it
//! reaches the driver. Optimization is strictly best-effort: a rejection
//! is reported back as a diagnostic string, the caller logs it and keeps
//! the unoptimized source, and compilation proceeds. An optimizer failure
//! is therefore never an engine error.

use crate::gpu::ShaderStage;

/// Best-effort source-to-source shader pass.
pub trait ShaderOptimizer: Send + Sync {
    /// Returns the optimized source, or a diagnostic describing why the
    /// input was rejected. Rejection is non-fatal; callers fall back to
    /// the input source.
    fn optimize(&self, stage: ShaderStage, source: &str) -> std::result::Result<String, String>;
}

/// Identity pass. Used where optimization is unwanted (tests, debugging
/// generated output).
pub struct NullOptimizer;

impl ShaderOptimizer for NullOptimizer {
    fn optimize(&self, _stage: ShaderStage, source: &str) -> std::result::Result<String, String> {
        Ok(source.to_string())
    }
}

/// naga-backed pass: parses the generated GLSL, compacts the module
/// (dropping unreachable functions, expressions and types), validates it,
/// and re-emits GLSL ES.
///
/// Anything naga cannot parse or validate is reported as a rejection and
/// the unoptimized source ships instead.
pub struct NagaOptimizer;

impl ShaderOptimizer for NagaOptimizer {
    fn optimize(&self, stage: ShaderStage, source: &str) -> std::result::Result<String, String> {
        let naga_stage = match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        };

        let mut frontend = naga::front::glsl::Frontend::default();
        let mut module = frontend
            .parse(&naga::front::glsl::Options::from(naga_stage), source)
            .map_err(|e| format!("parse: {e:?}"))?;

        naga::compact::compact(&mut module);

        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| format!("validate: {e:?}"))?;

        let options = naga::back::glsl::Options {
            version: naga::back::glsl::Version::Embedded {
                version: 310,
                is_webgl: false,
            },
            ..Default::default()
        };
        let pipeline_options = naga::back::glsl::PipelineOptions {
            shader_stage: naga_stage,
            entry_point: "main".to_string(),
            multiview: None,
        };

        let mut output = String::new();
        let mut writer = naga::back::glsl::Writer::new(
            &mut output,
            &module,
            &info,
            &options,
            &pipeline_options,
            naga::proc::BoundsCheckPolicies::default(),
        )
        .map_err(|e| format!("write: {e}"))?;
        writer.write().map_err(|e| format!("write: {e}"))?;

        Ok(output)
    }
}
