// src/frame.rs
//! Body-local inertia frame handling.
//!
//! The host reports each body's inertia frame as a rotation + translation.
//! Every piece of geometry handed to the physics backend must first be
//! re-expressed relative to the *inverse* of that frame, so the engine sees
//! collision shapes whose origin is the center of mass and whose axes are the
//! principal axes. The frame and its inverse are computed together and never
//! recomputed independently.

use glam::{Quat, Vec3};
use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

use crate::error::{CompileError, Result};

/// Convert a host-side vector into the compiler's math type.
#[inline]
pub(crate) fn na_vec(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

/// Convert a host-side vector into a point.
#[inline]
pub(crate) fn na_point(v: Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

/// Convert a host-side quaternion, rejecting degenerate rotations.
///
/// The host is expected to deliver unit quaternions, but a zeroed or NaN
/// rotation would silently produce malformed geometry downstream, so it is
/// rejected at the boundary instead.
pub(crate) fn na_quat(q: Quat) -> Result<UnitQuaternion<f32>> {
    if !q.is_finite() {
        return Err(CompileError::DegenerateFrame("non-finite rotation"));
    }
    if q.length_squared() <= f32::EPSILON {
        return Err(CompileError::DegenerateFrame("zero-length rotation"));
    }
    Ok(UnitQuaternion::from_quaternion(Quaternion::new(
        q.w, q.x, q.y, q.z,
    )))
}

/// Build a rigid transform from host rotation + translation.
pub(crate) fn na_isometry(rotation: Quat, translation: Vec3) -> Result<Isometry3<f32>> {
    if !translation.is_finite() {
        return Err(CompileError::DegenerateFrame("non-finite translation"));
    }
    Ok(Isometry3::from_parts(
        Translation3::from(na_vec(translation)),
        na_quat(rotation)?,
    ))
}

/// A body's local inertia frame together with its exact algebraic inverse.
///
/// Invariant: `frame` and `inverse` always form a consistent pair; both are
/// set in the constructor and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrame {
    frame: Isometry3<f32>,
    inverse: Isometry3<f32>,
}

impl ReferenceFrame {
    /// Build a frame from the host-reported rotation and translation.
    ///
    /// Degenerate input (zero/non-finite rotation, non-finite translation) is
    /// rejected here rather than letting undefined geometry reach the engine.
    pub fn new(rotation: Quat, translation: Vec3) -> Result<Self> {
        let frame = na_isometry(rotation, translation)?;
        Ok(Self {
            inverse: frame.inverse(),
            frame,
        })
    }

    /// The identity frame (center of mass at the descriptor origin).
    pub fn identity() -> Self {
        Self {
            frame: Isometry3::identity(),
            inverse: Isometry3::identity(),
        }
    }

    /// The frame as reported by the host (scaled translation).
    #[inline]
    pub fn frame(&self) -> &Isometry3<f32> {
        &self.frame
    }

    /// The inverse frame that all geometry is pre-multiplied by.
    #[inline]
    pub fn inverse(&self) -> &Isometry3<f32> {
        &self.inverse
    }
}
