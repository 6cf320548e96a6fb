//! Virtual trackball
//!
//! Maps a drag between two normalized viewport positions to a rotation. Points
//! are lifted onto a sphere of radius [`TRACKBALL_RADIUS`] near the center and
//! onto a hyperbolic sheet further out, so rotation stays smooth when the drag
//! leaves the ball.

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector2, Vector3};

pub const TRACKBALL_RADIUS: f32 = 0.8;

/// The identity rotation
pub fn identity() -> Quaternion<f32> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

/// Height of the trackball surface above (x, y)
pub fn project_to_sphere(radius: f32, x: f32, y: f32) -> f32 {
    let d = (x * x + y * y).sqrt();
    if d < radius * std::f32::consts::FRAC_1_SQRT_2 {
        (radius * radius - d * d).sqrt()
    } else {
        let t = radius / std::f32::consts::SQRT_2;
        t * t / d
    }
}

/// Incremental rotation for a drag from `from` to `to`, both in [-1, 1] viewport units.
///
/// Identical points give the identity rotation.
pub fn trackball_rotation(from: Vector2<f32>, to: Vector2<f32>) -> Quaternion<f32> {
    if from == to {
        return identity();
    }

    let p1 = Vector3::new(from.x, from.y, project_to_sphere(TRACKBALL_RADIUS, from.x, from.y));
    let p2 = Vector3::new(to.x, to.y, project_to_sphere(TRACKBALL_RADIUS, to.x, to.y));

    let axis = p1.cross(p2);
    if axis.magnitude2() <= f32::EPSILON * f32::EPSILON {
        return identity();
    }

    let t = ((p1 - p2).magnitude() / (2.0 * TRACKBALL_RADIUS)).clamp(-1.0, 1.0);
    let phi = 2.0 * t.asin();

    Quaternion::from_axis_angle(axis.normalize(), Rad(phi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Rotation;

    #[test]
    fn test_zero_drag_is_identity() {
        let p = Vector2::new(0.3, -0.2);
        assert_eq!(trackball_rotation(p, p), identity());
    }

    #[test]
    fn test_rotation_is_unit_length() {
        let q = trackball_rotation(Vector2::new(-0.9, 0.4), Vector2::new(0.7, -0.95));
        assert!((q.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_drag_right_turns_front_to_the_right() {
        let q = trackball_rotation(Vector2::new(0.0, 0.0), Vector2::new(0.5, 0.0));
        let front = q.rotate_vector(Vector3::unit_z());
        assert!(front.x > 0.0);
        assert!(front.y.abs() < 1e-6);
    }

    #[test]
    fn test_inverse_drag_cancels() {
        let a = Vector2::new(0.1, 0.2);
        let b = Vector2::new(-0.4, 0.6);
        let there = trackball_rotation(a, b);
        let back = trackball_rotation(b, a);
        let q = back * there;
        assert!((q.dot(identity()).abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_projection_is_continuous_at_boundary() {
        let r = TRACKBALL_RADIUS;
        let d = r * std::f32::consts::FRAC_1_SQRT_2;
        let inside = project_to_sphere(r, d - 1e-4, 0.0);
        let outside = project_to_sphere(r, d + 1e-4, 0.0);
        assert!((inside - outside).abs() < 1e-3);
        assert!((project_to_sphere(r, 0.0, 0.0) - r).abs() < 1e-6);
    }
}
