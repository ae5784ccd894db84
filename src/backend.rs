// src/backend.rs
//! The seam between the compiler and the physics engine's collision
//! subsystem.
//!
//! The compiler only ever talks to [`CollisionBackend`]: primitive creation,
//! a begin/attach/end bracket for compounds, and a begin/add/end bracket for
//! indexed triangle trees. Transient child shapes are consumed by the attach
//! call, so they cannot outlive the bracket that absorbed them; dropping a
//! shape handle releases the native resource.
//!
//! [`RapierBackend`] is the production implementation targeting Rapier's
//! `SharedShape`.

use std::f32::consts::FRAC_PI_2;

use nalgebra::{DMatrix, Isometry3, Point3, UnitQuaternion, Vector3};
use rapier3d::geometry::{ColliderBuilder, SharedShape};

use crate::compiler::CompiledShape;

/// Engine-side shape construction contract.
///
/// Bracket values (`CompoundEdit`, `TrimeshEdit`) are owned by exactly one
/// assembly in progress; they are not reentrant and cannot be shared across
/// shapes or threads.
pub trait CollisionBackend {
    /// Opaque native collision shape handle.
    type Shape;
    /// An open compound-edit bracket.
    type CompoundEdit;
    /// An open triangle-tree build bracket.
    type TrimeshEdit;

    /// Axis-aligned box with the given full extents.
    fn create_box(&mut self, size: Vector3<f32>) -> Self::Shape;
    /// Cylinder revolving about the contract's canonical x axis. Engines
    /// whose native cylinder uses another axis report it via
    /// [`axis_bridge`](Self::axis_bridge).
    fn create_cylinder(&mut self, radius: f32, height: f32) -> Self::Shape;
    fn create_sphere(&mut self, radius: f32) -> Self::Shape;
    /// Cone revolving about the contract's canonical x axis, apex toward +x.
    fn create_cone(&mut self, radius: f32, height: f32) -> Self::Shape;

    /// Rotation carrying the engine's native cylinder/cone axis onto the
    /// contract's canonical x axis. The compiler composes this into every
    /// cylinder and cone pose; identity when the native shapes already
    /// revolve about x.
    fn axis_bridge(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::identity()
    }

    /// Convex hull of a point cloud; `None` when the cloud is degenerate.
    fn create_convex_hull(&mut self, points: &[Point3<f32>]) -> Option<Self::Shape>;
    /// Heightfield from a sample matrix (rows along z, columns along x) and a
    /// world-extent scale. `cell_flags` carries one attribute byte per cell.
    /// The contract's field frame puts grid corner (0, 0) at the origin with
    /// the field extending along +x/+z.
    fn create_heightfield(
        &mut self,
        heights: DMatrix<f32>,
        scale: Vector3<f32>,
        cell_flags: Vec<u8>,
    ) -> Self::Shape;

    /// Where the engine's native heightfield geometry sits within the
    /// contract's corner-origin field frame, as a translation. Zero when the
    /// engine already uses the corner convention; engines that center the
    /// field on its origin return half the extents.
    fn heightfield_origin_offset(&self, extents: Vector3<f32>) -> Vector3<f32> {
        let _ = extents;
        Vector3::zeros()
    }

    fn begin_compound(&mut self) -> Self::CompoundEdit;
    /// Attach one child at a local pose. The compound takes its own internal
    /// reference; the transient child handle is consumed here.
    fn attach_child(
        &mut self,
        edit: &mut Self::CompoundEdit,
        pose: Isometry3<f32>,
        child: Self::Shape,
    );
    fn end_compound(&mut self, edit: Self::CompoundEdit) -> Self::Shape;

    fn begin_trimesh(&mut self) -> Self::TrimeshEdit;
    fn add_triangle(&mut self, edit: &mut Self::TrimeshEdit, triangle: [Point3<f32>; 3]);
    fn end_trimesh(&mut self, edit: Self::TrimeshEdit) -> Self::Shape;
}

/// Rapier implementation of the backend contract.
///
/// Shape handles are `SharedShape` (internally reference counted), so the
/// create/attach/release pairing of the contract maps onto plain ownership:
/// attaching moves the child into the pending compound, and dropping the
/// compiled shape releases the whole tree.
#[derive(Debug, Default)]
pub struct RapierBackend;

impl RapierBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CollisionBackend for RapierBackend {
    type Shape = SharedShape;
    type CompoundEdit = Vec<(Isometry3<f32>, SharedShape)>;
    type TrimeshEdit = (Vec<Point3<f32>>, Vec<[u32; 3]>);

    fn create_box(&mut self, size: Vector3<f32>) -> SharedShape {
        SharedShape::cuboid(size.x * 0.5, size.y * 0.5, size.z * 0.5)
    }

    fn create_cylinder(&mut self, radius: f32, height: f32) -> SharedShape {
        SharedShape::cylinder(height * 0.5, radius)
    }

    fn create_sphere(&mut self, radius: f32) -> SharedShape {
        SharedShape::ball(radius)
    }

    fn create_cone(&mut self, radius: f32, height: f32) -> SharedShape {
        SharedShape::cone(height * 0.5, radius)
    }

    // Rapier cylinders and cones revolve about local y.
    fn axis_bridge(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -FRAC_PI_2)
    }

    fn create_convex_hull(&mut self, points: &[Point3<f32>]) -> Option<SharedShape> {
        SharedShape::convex_hull(points)
    }

    fn create_heightfield(
        &mut self,
        heights: DMatrix<f32>,
        scale: Vector3<f32>,
        cell_flags: Vec<u8>,
    ) -> SharedShape {
        // Rapier has no per-cell surface materials; the attribute map is
        // accepted for contract symmetry and not consumed.
        let _ = cell_flags;
        SharedShape::heightfield(heights, scale)
    }

    // Parry heightfields are centered on their origin.
    fn heightfield_origin_offset(&self, extents: Vector3<f32>) -> Vector3<f32> {
        Vector3::new(extents.x * 0.5, 0.0, extents.z * 0.5)
    }

    fn begin_compound(&mut self) -> Self::CompoundEdit {
        Vec::new()
    }

    fn attach_child(
        &mut self,
        edit: &mut Self::CompoundEdit,
        pose: Isometry3<f32>,
        child: SharedShape,
    ) {
        // Parry compounds reject composite children, so a triangle tree is
        // attached as its individual faces instead.
        if let Some(trimesh) = child.as_trimesh() {
            for triangle in trimesh.triangles() {
                edit.push((pose, SharedShape::new(triangle)));
            }
        } else {
            edit.push((pose, child));
        }
    }

    fn end_compound(&mut self, edit: Self::CompoundEdit) -> SharedShape {
        SharedShape::compound(edit)
    }

    fn begin_trimesh(&mut self) -> Self::TrimeshEdit {
        (Vec::new(), Vec::new())
    }

    fn add_triangle(&mut self, edit: &mut Self::TrimeshEdit, triangle: [Point3<f32>; 3]) {
        let base = edit.0.len() as u32;
        edit.0.extend_from_slice(&triangle);
        edit.1.push([base, base + 1, base + 2]);
    }

    fn end_trimesh(&mut self, edit: Self::TrimeshEdit) -> SharedShape {
        SharedShape::trimesh(edit.0, edit.1)
    }
}

impl CompiledShape<SharedShape> {
    /// Wrap the compiled shape into a collider builder at its placement pose,
    /// ready for `ColliderSet::insert_with_parent`.
    pub fn collider_builder(&self) -> ColliderBuilder {
        ColliderBuilder::new(self.shape.clone()).position(self.pose)
    }
}

/// Ledger-keeping backend used by the test suite.
///
/// Every created handle gets a fresh id; drops are recorded as releases, so
/// tests can assert bracket ordering and exactly-once release across
/// construction and teardown.
#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Detail {
        Box { size: Vector3<f32> },
        Cylinder { radius: f32, height: f32 },
        Sphere { radius: f32 },
        Cone { radius: f32, height: f32 },
        Hull { points: Vec<Point3<f32>> },
        Heightfield { heights: DMatrix<f32>, scale: Vector3<f32>, cell_flags: Vec<u8> },
        Compound { children: Vec<(Isometry3<f32>, u32)> },
        Trimesh { triangles: Vec<[Point3<f32>; 3]> },
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Event {
        Created { id: u32, detail: Detail },
        Released { id: u32 },
        BeginCompound,
        Attached { child: u32, pose: Isometry3<f32> },
        EndCompound,
        BeginTrimesh,
        EndTrimesh,
    }

    #[derive(Debug, Default)]
    struct Ledger {
        next_id: u32,
        events: Vec<Event>,
    }

    type SharedLedger = Arc<Mutex<Ledger>>;

    /// A mock shape handle; dropping it records the release.
    #[derive(Debug)]
    pub struct Handle {
        pub id: u32,
        ledger: SharedLedger,
    }

    impl Drop for Handle {
        fn drop(&mut self) {
            self.ledger
                .lock()
                .events
                .push(Event::Released { id: self.id });
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        ledger: SharedLedger,
    }

    pub struct CompoundEdit {
        children: Vec<(Isometry3<f32>, u32)>,
    }

    pub struct TrimeshEdit {
        triangles: Vec<[Point3<f32>; 3]>,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        fn created(&mut self, detail: Detail) -> Handle {
            let mut ledger = self.ledger.lock();
            let id = ledger.next_id;
            ledger.next_id += 1;
            ledger.events.push(Event::Created { id, detail });
            Handle {
                id,
                ledger: Arc::clone(&self.ledger),
            }
        }

        fn record(&mut self, event: Event) {
            self.ledger.lock().events.push(event);
        }

        pub fn events(&self) -> Vec<Event> {
            self.ledger.lock().events.clone()
        }

        pub fn detail_of(&self, id: u32) -> Option<Detail> {
            self.events().into_iter().find_map(|e| match e {
                Event::Created { id: i, detail } if i == id => Some(detail),
                _ => None,
            })
        }

        /// Created ids minus released ids; empty means no leak.
        pub fn live_ids(&self) -> Vec<u32> {
            let events = self.events();
            let mut live = Vec::new();
            for e in &events {
                match e {
                    Event::Created { id, .. } => live.push(*id),
                    Event::Released { id } => {
                        let pos = live.iter().position(|i| i == id);
                        assert!(pos.is_some(), "double release of handle {id}");
                        live.remove(pos.unwrap());
                    }
                    _ => {}
                }
            }
            live
        }
    }

    impl CollisionBackend for RecordingBackend {
        type Shape = Handle;
        type CompoundEdit = CompoundEdit;
        type TrimeshEdit = TrimeshEdit;

        fn create_box(&mut self, size: Vector3<f32>) -> Handle {
            self.created(Detail::Box { size })
        }

        fn create_cylinder(&mut self, radius: f32, height: f32) -> Handle {
            self.created(Detail::Cylinder { radius, height })
        }

        fn create_sphere(&mut self, radius: f32) -> Handle {
            self.created(Detail::Sphere { radius })
        }

        fn create_cone(&mut self, radius: f32, height: f32) -> Handle {
            self.created(Detail::Cone { radius, height })
        }

        fn create_convex_hull(&mut self, points: &[Point3<f32>]) -> Option<Handle> {
            if points.len() < 4 {
                return None;
            }
            Some(self.created(Detail::Hull {
                points: points.to_vec(),
            }))
        }

        fn create_heightfield(
            &mut self,
            heights: DMatrix<f32>,
            scale: Vector3<f32>,
            cell_flags: Vec<u8>,
        ) -> Handle {
            self.created(Detail::Heightfield {
                heights,
                scale,
                cell_flags,
            })
        }

        fn begin_compound(&mut self) -> CompoundEdit {
            self.record(Event::BeginCompound);
            CompoundEdit {
                children: Vec::new(),
            }
        }

        fn attach_child(&mut self, edit: &mut CompoundEdit, pose: Isometry3<f32>, child: Handle) {
            self.record(Event::Attached {
                child: child.id,
                pose,
            });
            edit.children.push((pose, child.id));
            // `child` drops here: the transient handle is released inside the
            // bracket, the compound keeps its own copy.
        }

        fn end_compound(&mut self, edit: CompoundEdit) -> Handle {
            self.record(Event::EndCompound);
            self.created(Detail::Compound {
                children: edit.children,
            })
        }

        fn begin_trimesh(&mut self) -> TrimeshEdit {
            self.record(Event::BeginTrimesh);
            TrimeshEdit {
                triangles: Vec::new(),
            }
        }

        fn add_triangle(&mut self, edit: &mut TrimeshEdit, triangle: [Point3<f32>; 3]) {
            edit.triangles.push(triangle);
        }

        fn end_trimesh(&mut self, edit: TrimeshEdit) -> Handle {
            self.record(Event::EndTrimesh);
            self.created(Detail::Trimesh {
                triangles: edit.triangles,
            })
        }
    }
}
