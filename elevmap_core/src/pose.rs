//! Pose accessor: a 3D rigid transform used only by the optional
//! `position_3d_in_parent_frame` helper.

use nalgebra::{Isometry3, Point3};

/// Transforms a cell's 3D point (elevation grid frame) into a parent frame.
pub fn position_3d_in_parent_frame(
    grid_to_parent: &Isometry3<f64>,
    x: f32,
    y: f32,
    elevation: f32,
) -> Point3<f64> {
    grid_to_parent * Point3::new(x as f64, y as f64, elevation as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};

    #[test]
    fn identity_transform_is_passthrough() {
        let iso = Isometry3::identity();
        let p = position_3d_in_parent_frame(&iso, 1.0, 2.0, 0.5);
        assert_eq!(p, Point3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn translation_offsets_point() {
        let iso = Isometry3::from_parts(
            Translation3::new(10.0, 0.0, 0.0),
            UnitQuaternion::identity(),
        );
        let p = position_3d_in_parent_frame(&iso, 0.0, 0.0, 0.0);
        assert_eq!(p, Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn rotation_is_applied() {
        let iso = Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
        );
        let p = position_3d_in_parent_frame(&iso, 1.0, 0.0, 0.0);
        assert!((p.x).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }
}
