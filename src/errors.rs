//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`EmberError`] covers the hard failure modes:
//! - Shader graph validation failures (cycles)
//! - GPU shader compilation and program link rejections
//! - Window/context creation failures
//!
//! Soft failures (optimizer rejections and per-draw GPU errors) are
//! logged and never surfaced through this type; see the renderer and
//! shader program documentation for how they degrade.
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, EmberError>`.

use thiserror::Error;
use uuid::Uuid;

use crate::gpu::ShaderStage;

/// The main error type for the Ember engine.
#[derive(Error, Debug)]
pub enum EmberError {
    // ========================================================================
    // Shader Graph & Compilation Errors
    // ========================================================================
    /// The shader graph reached a node through one of its own descendants.
    /// Shader graphs must be acyclic; shared sub-expressions are allowed,
    /// cycles are not.
    #[error("Shader graph contains a cycle through node {node}")]
    ShaderGraphCycle {
        /// The node at which the cycle was detected.
        node: Uuid,
    },

    /// The GPU driver rejected a shader stage. Fatal to the `compile()`
    /// call; the program handle is left unallocated.
    #[error("Failed to compile {stage} shader:\n{log}")]
    ShaderCompile {
        /// Which stage failed.
        stage: ShaderStage,
        /// The driver's diagnostic log.
        log: String,
    },

    /// The GPU driver rejected the program at link time. Fatal to the
    /// `compile()` call; the program handle is left unallocated.
    #[error("Failed to link shader program:\n{log}")]
    ShaderLink {
        /// The driver's diagnostic log.
        log: String,
    },

    // ========================================================================
    // Window & Context Errors
    // ========================================================================
    /// The windowing collaborator failed to initialize or to create a
    /// window/context. Raised at construction time.
    #[error("Context initialization failed: {0}")]
    ContextInit(String),
}

/// Alias for `Result<T, EmberError>`.
pub type Result<T> = std::result::Result<T, EmberError>;
