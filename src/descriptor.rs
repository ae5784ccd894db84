// src/descriptor.rs
//! Engine-agnostic shape descriptors.
//!
//! These types mirror what the host simulator's geometry API reports for a
//! rigid body: a pure primitive with dimensions and a local frame, a flat
//! indexed triangle soup, a heightfield sample grid, or a heterogeneous
//! compound of the above. The compiler consumes a read-only snapshot; nothing
//! here aliases back into host data structures.

use glam::{Quat, Vec3};

/// Whether the owning rigid body will be static.
///
/// Selects the mesh-construction mode: general (non-convex) triangle meshes
/// are only supported on static bodies; on dynamic bodies they are
/// approximated by their convex hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    Static,
    Dynamic,
}

impl BodyMode {
    #[inline]
    pub fn is_static(self) -> bool {
        matches!(self, BodyMode::Static)
    }
}

/// Pure primitive categories.
///
/// A closed set: dispatch over it is exhaustive at compile time, so an
/// out-of-range type tag cannot reach the builder. Heightfields are a
/// separate top-level descriptor variant because they never occur inside a
/// compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Plane,
    Cuboid,
    Disc,
    Cylinder,
    Spheroid,
    Cone,
}

/// A pure primitive with its dimensions and local placement.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveDescriptor {
    pub kind: PrimitiveKind,
    /// Full extents along x/y/z. Radius-based shapes use `size.x / 2`.
    pub size: Vec3,
    /// Local frame of the primitive within its shape (for pure shapes the
    /// vertex frame doubles as the primitive origin).
    pub local_rotation: Quat,
    pub local_translation: Vec3,
    /// Non-zero requests a hollow variant, which the engine cannot honor;
    /// the shape is built solid and a capability diagnostic is emitted.
    pub hollow_scaling: f32,
}

impl PrimitiveDescriptor {
    pub fn new(kind: PrimitiveKind, size: Vec3) -> Self {
        Self {
            kind,
            size,
            local_rotation: Quat::IDENTITY,
            local_translation: Vec3::ZERO,
            hollow_scaling: 0.0,
        }
    }

    pub fn with_local_frame(mut self, rotation: Quat, translation: Vec3) -> Self {
        self.local_rotation = rotation;
        self.local_translation = translation;
        self
    }

    pub fn with_hollow_scaling(mut self, hollow_scaling: f32) -> Self {
        self.hollow_scaling = hollow_scaling;
        self
    }
}

/// A flat, indexed triangle soup as delivered by the host geometry query.
///
/// `indices` holds triangles only; every three consecutive entries form one
/// face. `convex` is the host's convexity classification of the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDescriptor {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub convex: bool,
}

impl MeshDescriptor {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>, convex: bool) -> Self {
        Self {
            vertices,
            indices,
            convex,
        }
    }
}

/// A regular grid of height samples used as terrain collision.
///
/// `heights` is row-major with x fastest: sample `(i, j)` lives at
/// `heights[i + x_count * j]`. The grid is centered on the descriptor origin
/// with heights along z; extents along x/y are `x_size`/`y_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightfieldDescriptor {
    pub x_count: u32,
    pub y_count: u32,
    pub x_size: f32,
    pub y_size: f32,
    /// Min/max sample heights relative to the grid frame, as reported by the
    /// host. Informational; construction uses the sample array itself.
    pub min_height: f32,
    pub max_height: f32,
    pub heights: Vec<f32>,
}

/// The polymorphic input to the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDescriptor {
    Primitive(PrimitiveDescriptor),
    Mesh(MeshDescriptor),
    /// Heterogeneous nesting of primitives and/or meshes. A compound is never
    /// itself classified convex or non-convex; convexity is evaluated per
    /// child.
    Compound(Vec<ShapeDescriptor>),
    /// Top-level only.
    Heightfield(HeightfieldDescriptor),
}
