use nalgebra::{Point3, Rotation3, Unit, Vector3};

pub fn rotation_to_align(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    // `rotation_between` is undefined for anti-parallel vectors; any half turn about an
    // orthogonal axis is a valid answer there.
    Rotation3::rotation_between(from, to).unwrap_or_else(|| {
        let axis = Unit::new_normalize(any_orthogonal(from));
        Rotation3::from_axis_angle(&axis, std::f64::consts::PI)
    })
}

/// Returns some vector orthogonal to `v`.
pub fn any_orthogonal(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&helper)
}

/// Builds the unit vector with polar angle `acos(cos_theta)` and azimuth `phi` measured
/// relative to `axis`.
pub fn direction_about_axis(
    axis: &Unit<Vector3<f64>>,
    cos_theta: f64,
    phi: f64,
) -> Unit<Vector3<f64>> {
    let cos_theta = cos_theta.clamp(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let local = Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    let rotation = rotation_to_align(&Vector3::z(), axis.as_ref());
    Unit::new_normalize(rotation * local)
}

/// Maps a point `(x, y)` given in the plane orthogonal to the z axis into the plane
/// orthogonal to `normal`.
pub fn point_on_plane(normal: &Unit<Vector3<f64>>, x: f64, y: f64) -> Point3<f64> {
    let rotation = rotation_to_align(&Vector3::z(), normal.as_ref());
    Point3::from(rotation * Vector3::new(x, y, 0.0))
}

/// Point of closest approach to the origin on the line through `point` along `direction`.
pub fn closest_approach_to_origin(
    point: &Point3<f64>,
    direction: &Unit<Vector3<f64>>,
) -> Point3<f64> {
    let along = direction.dot(&point.coords);
    point - direction.as_ref() * along
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: &Vector3<f64>, b: &Vector3<f64>) {
        assert!((a - b).norm() < 1e-12, "{:?} != {:?}", a, b);
    }

    #[test]
    fn rotation_to_align_maps_from_onto_to() {
        let from = Vector3::new(1.0, 0.0, 0.0);
        let to = Vector3::new(0.0, 1.0, 0.0);
        let rotation = rotation_to_align(&from, &to);
        assert_vec_close(&(rotation * from), &to);
    }

    #[test]
    fn rotation_to_align_handles_antiparallel_vectors() {
        let from = Vector3::z();
        let to = -Vector3::z();
        let rotation = rotation_to_align(&from, &to);
        assert_vec_close(&(rotation * from), &to);
    }

    #[test]
    fn direction_about_z_axis_matches_spherical_coordinates() {
        let axis = Unit::new_normalize(Vector3::z());
        let dir = direction_about_axis(&axis, 0.0, 0.0);
        assert_vec_close(dir.as_ref(), &Vector3::x());
        let forward = direction_about_axis(&axis, 1.0, 1.234);
        assert_vec_close(forward.as_ref(), &Vector3::z());
    }

    #[test]
    fn direction_about_axis_keeps_the_polar_angle() {
        let axis = Unit::new_normalize(Vector3::new(1.0, 1.0, 0.0));
        let dir = direction_about_axis(&axis, 0.5, 2.0);
        assert!((dir.dot(&axis) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn point_on_plane_is_orthogonal_to_normal() {
        let normal = Unit::new_normalize(Vector3::new(0.0, 1.0, 1.0));
        let point = point_on_plane(&normal, 3.0, -2.0);
        assert!(point.coords.dot(&normal).abs() < 1e-12);
        assert!((point.coords.norm() - 13.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn closest_approach_removes_the_longitudinal_component() {
        let direction = Unit::new_normalize(Vector3::z());
        let pca = closest_approach_to_origin(&Point3::new(1.0, 2.0, 7.5), &direction);
        assert_eq!(pca, Point3::new(1.0, 2.0, 0.0));
    }
}
