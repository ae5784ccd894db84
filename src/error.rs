// src/error.rs
//! Error type for collision-shape compilation.
//!
//! Construction is a one-shot, deterministic function of its inputs: there are
//! no retries and no partial results. Everything the compiler can reject is
//! rejected up front, before any native shape is created for the failing
//! branch.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors produced while compiling a shape descriptor.
///
/// Capability shortfalls of the target engine (hollow shapes, non-uniform
/// spheroids, dynamic non-convex meshes) are *not* errors; they degrade to the
/// nearest supported approximation and are reported through the
/// [`DiagnosticsSink`](crate::diagnostics::DiagnosticsSink) instead.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CompileError {
    /// The host-reported inertia frame (or a primitive local frame) carries a
    /// zero-length or non-finite rotation, or a non-finite translation.
    #[error("degenerate reference frame: {0}")]
    DegenerateFrame(&'static str),

    /// The uniform scale factor must be finite and strictly positive.
    #[error("invalid scale factor: {0}")]
    InvalidScale(f32),

    /// A mesh descriptor with no vertices (or, for a static triangle tree,
    /// no complete triangle) cannot be compiled; the centroid computation
    /// would divide by zero.
    #[error("mesh has no usable geometry")]
    EmptyMesh,

    /// A mesh index refers past the end of the vertex buffer.
    #[error("triangle index {index} out of bounds (mesh has {vertex_count} vertices)")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    /// The vertex set collapsed to a point/line/plane and the engine could
    /// not build a convex hull from it.
    #[error("convex hull construction failed: degenerate vertex set")]
    DegenerateHull,

    /// A compound descriptor with no children has nothing to assemble.
    #[error("compound descriptor has no children")]
    EmptyCompound,

    /// Heightfields are terrain: they are only valid at the top level of a
    /// descriptor, never inside a compound. Hitting this is a contract
    /// violation by the descriptor producer.
    #[error("heightfield descriptor nested inside a compound")]
    HeightfieldInCompound,

    /// The heightfield sample grid does not match its declared dimensions, or
    /// a grid axis has fewer than two samples.
    #[error("heightfield grid mismatch: {x_count}x{y_count} declared, {len} samples")]
    HeightfieldGridMismatch {
        x_count: u32,
        y_count: u32,
        len: usize,
    },
}
