//! Shader Graph & Programs
//!
//! Shader logic is authored as a graph of [`ShaderNode`]s: each node
//! contributes a declaration-level fragment and a statement-level fragment,
//! and may reference other nodes through ordered input slots. The
//! [`compiler`] walks a graph into complete shader source, [`optimizer`]
//! runs that source through a best-effort source-level pass, and
//! [`ShaderProgram`] owns the compiled/linked GPU program with
//! dirty-tracking so graphs only recompile when edited.

pub mod compiler;
pub mod forward;
pub mod node;
pub mod optimizer;
pub mod program;

pub use node::{CodeNode, ShaderNode, ShaderNodeRef, Slot};
pub use optimizer::{NagaOptimizer, NullOptimizer, ShaderOptimizer};
pub use program::ShaderProgram;
