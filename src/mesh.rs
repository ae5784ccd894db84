// src/mesh.rs
//! Mesh geometry conditioning for hull and trimesh construction.
//!
//! Convex hulls are numerically sensitive to the magnitude of the
//! offset-from-origin of their input cloud, so hull inputs are recentred on
//! the unweighted vertex centroid first; the centroid is restored through the
//! placement transform. The recentred cloud is deduplicated at the hull
//! simplification tolerance with the same quantized spatial hashing used for
//! vertex dedup in mesh optimization.

use std::collections::HashSet;

use glam::Vec3;
use nalgebra::{Point3, Vector3};

use crate::error::{CompileError, Result};
use crate::frame::na_vec;

/// Fixed hull simplification tolerance, in source units.
pub(crate) const HULL_TOLERANCE: f32 = 1.0e-3;

/// A vertex cloud translated so its centroid is the local origin.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecentredCloud {
    /// The original (scaled) centroid, to be restored via the placement pose.
    pub centroid: Vector3<f32>,
    pub points: Vec<Point3<f32>>,
}

/// Scale the vertices and recentre them on their unweighted centroid.
///
/// An empty vertex set is a construction failure, not a NaN placement.
pub(crate) fn recentre(vertices: &[Vec3], scale: f32) -> Result<RecentredCloud> {
    if vertices.is_empty() {
        return Err(CompileError::EmptyMesh);
    }
    let mut centroid = Vector3::zeros();
    for v in vertices {
        centroid += na_vec(*v) * scale;
    }
    centroid /= vertices.len() as f32;

    let points = vertices
        .iter()
        .map(|v| Point3::from(na_vec(*v) * scale - centroid))
        .collect();
    Ok(RecentredCloud { centroid, points })
}

/// Drop points that coincide within `tolerance`, keeping first occurrences in
/// order. Quantized hashing: two points in the same tolerance-sized cell are
/// considered one.
pub(crate) fn dedup_points(points: Vec<Point3<f32>>, tolerance: f32) -> Vec<Point3<f32>> {
    let quant = |v: f32| (v / tolerance).round() as i64;
    let mut seen = HashSet::with_capacity(points.len());
    points
        .into_iter()
        .filter(|p| seen.insert((quant(p.x), quant(p.y), quant(p.z))))
        .collect()
}

/// Check every triangle index against the vertex count before streaming.
pub(crate) fn check_indices(indices: &[u32], vertex_count: usize) -> Result<()> {
    for chunk in indices.chunks_exact(3) {
        for &index in chunk {
            if index as usize >= vertex_count {
                return Err(CompileError::IndexOutOfBounds {
                    index,
                    vertex_count,
                });
            }
        }
    }
    Ok(())
}
