// src/lib.rs
//! Compiles engine-agnostic collision shape descriptors into native physics
//! engine shapes, expressed in the owning body's inertia frame.
//!
//! The host describes a body's collision geometry once (primitives, triangle
//! meshes, compounds, or a terrain heightfield) and [`ShapeCompiler::compile`]
//! turns that snapshot into a single shape tree for the target engine. The
//! engine is reached only through the [`CollisionBackend`] trait;
//! [`RapierBackend`] is the production implementation.
//!
//! ```no_run
//! use collider_compiler::{
//!     BodyMode, NullSink, PrimitiveDescriptor, PrimitiveKind, RapierBackend,
//!     ReferenceFrame, ShapeCompiler, ShapeDescriptor,
//! };
//! use glam::Vec3;
//!
//! # fn main() -> collider_compiler::Result<()> {
//! let descriptor = ShapeDescriptor::Primitive(PrimitiveDescriptor::new(
//!     PrimitiveKind::Cuboid,
//!     Vec3::new(1.0, 1.0, 2.0),
//! ));
//! let compiler = ShapeCompiler::new(ReferenceFrame::identity());
//! let mut backend = RapierBackend::new();
//! let compiled = compiler.compile(&descriptor, BodyMode::Dynamic, &mut backend, &mut NullSink)?;
//! let collider = compiled.collider_builder().build();
//! # let _ = collider;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod compiler;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod frame;
mod heightfield;
mod mesh;

pub use backend::{CollisionBackend, RapierBackend};
pub use compiler::{CompiledShape, ShapeCompiler};
pub use descriptor::{
    BodyMode, HeightfieldDescriptor, MeshDescriptor, PrimitiveDescriptor, PrimitiveKind,
    ShapeDescriptor,
};
pub use diagnostics::{
    Capability, CollectedDiagnostics, DiagnosticsSink, FnSink, NullSink, SharedDiagnostics,
};
pub use error::{CompileError, Result};
pub use frame::ReferenceFrame;
