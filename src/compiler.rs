// src/compiler.rs
//! The collision shape compiler.
//!
//! One invocation per rigid body: a shape descriptor snapshot plus the body's
//! inertia frame go in, one native collision shape tree comes out, expressed
//! in inertia-frame-local coordinates. The compiler is a pure, synchronous
//! transformation; it holds no engine state and retains no descriptor data
//! after `compile` returns.
//!
//! Dispatch over the descriptor category is exhaustive at compile time.
//! Capability shortfalls degrade (with a diagnostic) instead of failing;
//! degenerate input (frames, empty meshes, malformed grids) fails fast at
//! the boundary.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

use crate::backend::CollisionBackend;
use crate::descriptor::{
    BodyMode, HeightfieldDescriptor, MeshDescriptor, PrimitiveDescriptor, PrimitiveKind,
    ShapeDescriptor,
};
use crate::diagnostics::{degrade, Capability, DiagnosticsSink};
use crate::error::{CompileError, Result};
use crate::frame::{na_isometry, na_point, na_vec, ReferenceFrame};
use crate::heightfield;
use crate::mesh::{self, HULL_TOLERANCE};

/// Minimum box/cylinder thickness along z; flat input would otherwise produce
/// zero-thickness degenerate collision geometry.
pub(crate) const MIN_THICKNESS: f32 = 1.0e-4;

/// Relative axis deviation above which a spheroid is not treated as a sphere.
const SPHEROID_TOLERANCE: f32 = 0.01;

/// The compiler's sole output: one native shape handle plus its placement
/// relative to the body's inertia frame.
///
/// The caller owns the tree exclusively; dropping it releases every native
/// resource the compiler created, exactly once.
#[derive(Debug)]
pub struct CompiledShape<S> {
    pub shape: S,
    pub pose: Isometry3<f32>,
}

/// Compiles shape descriptors into native collision shapes for one body.
#[derive(Debug, Clone)]
pub struct ShapeCompiler {
    frame: ReferenceFrame,
    scale: f32,
}

impl ShapeCompiler {
    /// Compiler with unit scale around an already-validated frame.
    pub fn new(frame: ReferenceFrame) -> Self {
        Self { frame, scale: 1.0 }
    }

    /// Compiler from the host-reported inertia frame and a uniform linear
    /// scale. The scale multiplies every translation and extent the compiler
    /// touches: the frame origin, primitive sizes and local frames, mesh
    /// vertices, and heightfield heights and extents.
    pub fn with_scale(rotation: Quat, translation: Vec3, scale: f32) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CompileError::InvalidScale(scale));
        }
        Ok(Self {
            frame: ReferenceFrame::new(rotation, translation * scale)?,
            scale,
        })
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Compile one descriptor snapshot into a native shape tree.
    ///
    /// `mode` is the host's "will this body be static" flag; it selects the
    /// construction mode for non-convex meshes. Capability degradations are
    /// reported through `diagnostics` and never abort construction.
    pub fn compile<B, D>(
        &self,
        descriptor: &ShapeDescriptor,
        mode: BodyMode,
        backend: &mut B,
        diagnostics: &mut D,
    ) -> Result<CompiledShape<B::Shape>>
    where
        B: CollisionBackend,
        D: DiagnosticsSink + ?Sized,
    {
        match descriptor {
            ShapeDescriptor::Primitive(primitive) => {
                log::debug!("compiling pure primitive {:?}", primitive.kind);
                let (shape, pose) = self.build_primitive(primitive, backend, diagnostics)?;
                Ok(CompiledShape { shape, pose })
            }
            ShapeDescriptor::Mesh(mesh) => {
                log::debug!(
                    "compiling mesh ({} vertices, convex: {})",
                    mesh.vertices.len(),
                    mesh.convex
                );
                let (shape, pose) = self.build_mesh(mesh, mode, backend, diagnostics)?;
                Ok(CompiledShape { shape, pose })
            }
            ShapeDescriptor::Compound(children) => {
                log::debug!("compiling compound of {} children", children.len());
                self.assemble_compound(children, mode, backend, diagnostics)
            }
            ShapeDescriptor::Heightfield(field) => {
                log::debug!(
                    "compiling heightfield {}x{}",
                    field.x_count,
                    field.y_count
                );
                self.build_heightfield(field, backend)
            }
        }
    }

    /// Map one pure primitive to one native shape plus its placement.
    ///
    /// The placement is the body's inverse inertia frame composed with the
    /// primitive's own local frame; cylinders and cones additionally compose
    /// the fixed rotation about local y that carries the height axis onto
    /// the canonical x revolution axis, then the backend's own axis bridge.
    fn build_primitive<B, D>(
        &self,
        primitive: &PrimitiveDescriptor,
        backend: &mut B,
        diagnostics: &mut D,
    ) -> Result<(B::Shape, Isometry3<f32>)>
    where
        B: CollisionBackend,
        D: DiagnosticsSink + ?Sized,
    {
        if primitive.hollow_scaling != 0.0 {
            degrade(diagnostics, Capability::HollowShape);
        }

        let size = na_vec(primitive.size) * self.scale;
        let local = na_isometry(
            primitive.local_rotation,
            primitive.local_translation * self.scale,
        )?;
        let base = self.frame.inverse() * local;

        let built = match primitive.kind {
            PrimitiveKind::Plane | PrimitiveKind::Cuboid => {
                let clamped = Vector3::new(size.x, size.y, size.z.max(MIN_THICKNESS));
                (backend.create_box(clamped), base)
            }
            PrimitiveKind::Disc | PrimitiveKind::Cylinder => {
                let pose = base
                    * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2)
                    * backend.axis_bridge();
                let shape = backend.create_cylinder(size.x * 0.5, size.z.max(MIN_THICKNESS));
                (shape, pose)
            }
            PrimitiveKind::Spheroid => {
                let deviates = |axis: f32| ((size.x - axis) / size.x).abs() > SPHEROID_TOLERANCE;
                if deviates(size.y) || deviates(size.z) {
                    degrade(diagnostics, Capability::NonUniformSpheroid);
                }
                (backend.create_sphere(size.x * 0.5), base)
            }
            PrimitiveKind::Cone => {
                let pose = base
                    * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2)
                    * backend.axis_bridge();
                (backend.create_cone(size.x * 0.5, size.z), pose)
            }
        };
        Ok(built)
    }

    /// Build a mesh as either a static triangle tree or a convex hull,
    /// depending on convexity and body mode.
    fn build_mesh<B, D>(
        &self,
        mesh: &MeshDescriptor,
        mode: BodyMode,
        backend: &mut B,
        diagnostics: &mut D,
    ) -> Result<(B::Shape, Isometry3<f32>)>
    where
        B: CollisionBackend,
        D: DiagnosticsSink + ?Sized,
    {
        if !mesh.convex && mode.is_static() {
            let shape = self.stream_trimesh(mesh, backend)?;
            return Ok((shape, Isometry3::identity()));
        }
        if !mesh.convex {
            // General meshes are only supported on static bodies; a dynamic
            // one is approximated by its hull.
            degrade(diagnostics, Capability::DynamicNonConvexMesh);
        }
        self.build_hull(mesh, backend)
    }

    /// Convex hull with centroid recentring for numerical conditioning: the
    /// hull is built around the local origin and the placement translates it
    /// back to the original centroid.
    fn build_hull<B>(&self, mesh: &MeshDescriptor, backend: &mut B) -> Result<(B::Shape, Isometry3<f32>)>
    where
        B: CollisionBackend,
    {
        let cloud = mesh::recentre(&mesh.vertices, self.scale)?;
        let points = mesh::dedup_points(cloud.points, HULL_TOLERANCE);
        let shape = backend
            .create_convex_hull(&points)
            .ok_or(CompileError::DegenerateHull)?;
        let pose = self.frame.inverse() * Translation3::from(cloud.centroid);
        Ok((shape, pose))
    }

    /// Stream an indexed triangle soup into the engine's tree builder, one
    /// face at a time, with vertices pre-transformed into inverse-frame
    /// space. The resulting tree carries an identity placement.
    fn stream_trimesh<B>(&self, mesh: &MeshDescriptor, backend: &mut B) -> Result<B::Shape>
    where
        B: CollisionBackend,
    {
        if mesh.vertices.is_empty() || mesh.indices.len() < 3 {
            return Err(CompileError::EmptyMesh);
        }
        mesh::check_indices(&mesh.indices, mesh.vertices.len())?;

        let inverse = self.frame.inverse();
        let vertices: Vec<Point3<f32>> = mesh
            .vertices
            .iter()
            .map(|v| inverse * na_point(*v * self.scale))
            .collect();

        let mut edit = backend.begin_trimesh();
        for face in mesh.indices.chunks_exact(3) {
            backend.add_triangle(
                &mut edit,
                [
                    vertices[face[0] as usize],
                    vertices[face[1] as usize],
                    vertices[face[2] as usize],
                ],
            );
        }
        Ok(backend.end_trimesh(edit))
    }

    /// Assemble a compound: one begin/end bracket, each child built
    /// independently against the same body-level inverse frame and consumed
    /// by its attach. Nested compounds flatten into the open bracket.
    fn assemble_compound<B, D>(
        &self,
        children: &[ShapeDescriptor],
        mode: BodyMode,
        backend: &mut B,
        diagnostics: &mut D,
    ) -> Result<CompiledShape<B::Shape>>
    where
        B: CollisionBackend,
        D: DiagnosticsSink + ?Sized,
    {
        if children.is_empty() {
            return Err(CompileError::EmptyCompound);
        }
        let mut edit = backend.begin_compound();
        self.attach_children(children, mode, backend, &mut edit, diagnostics)?;
        let shape = backend.end_compound(edit);
        Ok(CompiledShape {
            shape,
            pose: Isometry3::identity(),
        })
    }

    fn attach_children<B, D>(
        &self,
        children: &[ShapeDescriptor],
        mode: BodyMode,
        backend: &mut B,
        edit: &mut B::CompoundEdit,
        diagnostics: &mut D,
    ) -> Result<()>
    where
        B: CollisionBackend,
        D: DiagnosticsSink + ?Sized,
    {
        for child in children {
            match child {
                ShapeDescriptor::Primitive(primitive) => {
                    log::trace!("attaching primitive child {:?}", primitive.kind);
                    let (shape, pose) = self.build_primitive(primitive, backend, diagnostics)?;
                    backend.attach_child(edit, pose, shape);
                }
                ShapeDescriptor::Mesh(mesh) => {
                    log::trace!("attaching mesh child ({} vertices)", mesh.vertices.len());
                    let (shape, pose) = self.build_mesh(mesh, mode, backend, diagnostics)?;
                    backend.attach_child(edit, pose, shape);
                }
                ShapeDescriptor::Compound(nested) => {
                    self.attach_children(nested, mode, backend, edit, diagnostics)?;
                }
                ShapeDescriptor::Heightfield(_) => {
                    // Contract violation by the descriptor producer:
                    // heightfields are top-level only.
                    return Err(CompileError::HeightfieldInCompound);
                }
            }
        }
        Ok(())
    }

    /// Build a terrain heightfield: reflected sample rows, an all-zero cell
    /// attribute map, and the corner-frame placement shifted by the backend's
    /// native field origin. The body inertia frame does not participate.
    fn build_heightfield<B>(
        &self,
        field: &HeightfieldDescriptor,
        backend: &mut B,
    ) -> Result<CompiledShape<B::Shape>>
    where
        B: CollisionBackend,
    {
        heightfield::check_grid(field)?;
        let flipped = heightfield::flip_rows(field, self.scale);
        let matrix = heightfield::sample_matrix(field, &flipped);
        let extents = heightfield::extent_scale(field, self.scale);
        let origin = backend.heightfield_origin_offset(extents);
        let cell_flags = vec![0u8; field.x_count as usize * field.y_count as usize];
        let shape = backend.create_heightfield(matrix, extents, cell_flags);
        // The corner-frame placement, shifted to wherever the engine puts
        // its native field origin.
        let pose = heightfield::placement(field.x_size * self.scale, field.y_size * self.scale)
            * Translation3::from(origin);
        Ok(CompiledShape { shape, pose })
    }
}
