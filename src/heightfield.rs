// src/heightfield.rs
//! Heightfield sample re-indexing and placement.
//!
//! The host delivers a row-major height grid (x fastest), centered on the
//! descriptor origin with heights along z. The engine expects a
//! corner-origin, axis-aligned field, so the sample rows are reflected along
//! x and the placement transform re-derives the centered convention from the
//! engine's corner convention.

use std::f32::consts::{FRAC_PI_2, PI};

use nalgebra::{DMatrix, Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::descriptor::HeightfieldDescriptor;
use crate::error::{CompileError, Result};

/// Validate grid dimensions against the sample array.
pub(crate) fn check_grid(desc: &HeightfieldDescriptor) -> Result<()> {
    let expected = desc.x_count as usize * desc.y_count as usize;
    if desc.x_count < 2 || desc.y_count < 2 || desc.heights.len() != expected {
        return Err(CompileError::HeightfieldGridMismatch {
            x_count: desc.x_count,
            y_count: desc.y_count,
            len: desc.heights.len(),
        });
    }
    Ok(())
}

/// Reflect the grid along x (`i -> x_count-1-i` within each row) and apply
/// the vertical scale, correcting for the source grid's row convention.
pub(crate) fn flip_rows(desc: &HeightfieldDescriptor, scale: f32) -> Vec<f32> {
    let (x_count, y_count) = (desc.x_count as usize, desc.y_count as usize);
    let mut flipped = vec![0.0; x_count * y_count];
    for i in 0..x_count {
        for j in 0..y_count {
            flipped[(x_count - 1 - i) + x_count * j] = desc.heights[i + x_count * j] * scale;
        }
    }
    flipped
}

/// Pack the reflected samples into the backend's matrix layout: rows along
/// y, columns along x.
pub(crate) fn sample_matrix(desc: &HeightfieldDescriptor, flipped: &[f32]) -> DMatrix<f32> {
    let x_count = desc.x_count as usize;
    DMatrix::from_fn(desc.y_count as usize, x_count, |row, col| {
        flipped[col + x_count * row]
    })
}

/// World-extent scale for the field. Grid spacing uses the x-direction cell
/// size only; non-square cells are not supported by the underlying
/// construction call.
pub(crate) fn extent_scale(desc: &HeightfieldDescriptor, scale: f32) -> Vector3<f32> {
    let x_size = desc.x_size * scale;
    let cell = x_size / (desc.x_count - 1) as f32;
    Vector3::new(x_size, 1.0, cell * (desc.y_count - 1) as f32)
}

/// Placement aligning a corner-origin field frame (grid corner (0, 0) at the
/// origin, extending along +x/+z) with the descriptor's centered, z-up
/// convention: compose -90 deg about x with 180 deg about z, translate by
/// half the extent in x and z, then invert. Engines whose native field is
/// not corner-origin report the difference through their origin offset. The
/// body inertia frame is deliberately not applied; heightfields are terrain
/// anchored to the shape frame itself.
pub(crate) fn placement(x_size: f32, y_size: f32) -> Isometry3<f32> {
    let mut rotation = UnitQuaternion::identity();
    rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI) * rotation;
    rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2) * rotation;
    let forward = Isometry3::from_parts(
        Translation3::new(x_size * 0.5, 0.0, y_size * 0.5),
        rotation,
    );
    forward.inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn grid_2x2() -> HeightfieldDescriptor {
        HeightfieldDescriptor {
            x_count: 2,
            y_count: 2,
            x_size: 2.0,
            y_size: 2.0,
            min_height: 0.0,
            max_height: 4.0,
            heights: vec![1.0, 2.0, 3.0, 4.0],
        }
    }

    #[test]
    fn test_check_grid_rejects_mismatched_sample_count() {
        let mut desc = grid_2x2();
        desc.heights.pop();
        assert!(matches!(
            check_grid(&desc),
            Err(CompileError::HeightfieldGridMismatch { .. })
        ));
    }

    #[test]
    fn test_check_grid_rejects_single_column() {
        let mut desc = grid_2x2();
        desc.x_count = 1;
        desc.heights = vec![1.0, 2.0];
        assert!(check_grid(&desc).is_err());
    }

    #[test]
    fn test_flip_reflects_each_row_along_x() {
        let flipped = flip_rows(&grid_2x2(), 1.0);
        // Row 0 (1, 2) -> (2, 1); row 1 (3, 4) -> (4, 3).
        assert_eq!(flipped, vec![2.0, 1.0, 4.0, 3.0]);
        // Corner sample (0, 0) of the source ends up at column x_count-1.
        assert_eq!(flipped[1], grid_2x2().heights[0]);
    }

    #[test]
    fn test_flip_applies_vertical_scale() {
        let flipped = flip_rows(&grid_2x2(), 0.5);
        assert_eq!(flipped, vec![1.0, 0.5, 2.0, 1.5]);
    }

    #[test]
    fn test_sample_matrix_layout() {
        let desc = grid_2x2();
        let m = sample_matrix(&desc, &flip_rows(&desc, 1.0));
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m[(0, 0)], 2.0);
        assert_eq!(m[(0, 1)], 1.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m[(1, 1)], 3.0);
    }

    #[test]
    fn test_extent_scale_uses_x_cell_size_only() {
        let desc = HeightfieldDescriptor {
            x_count: 5,
            y_count: 3,
            x_size: 8.0,
            y_size: 100.0, // ignored: spacing comes from the x cell size
            min_height: 0.0,
            max_height: 0.0,
            heights: vec![0.0; 15],
        };
        let s = extent_scale(&desc, 1.0);
        assert_eq!(s, Vector3::new(8.0, 1.0, 4.0));
    }

    #[test]
    fn test_placement_restores_centered_convention() {
        // The forward transform (inverse of the placement) must map the
        // descriptor origin to the center of the corner-origin field.
        let pose = placement(2.0, 2.0);
        let forward = pose.inverse();
        let center = forward * Point3::origin();
        assert_relative_eq!(center, Point3::new(1.0, 0.0, 1.0), epsilon = 1e-6);

        // A step along descriptor +z (height axis) maps to engine +y after
        // the -90 deg x / 180 deg z composition.
        let up = forward * Point3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(up, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-6);
    }
}
