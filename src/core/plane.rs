//! Planar projection helpers. The simulation runs on the world XZ plane at a
//! fixed height; all steering/deflection math happens in this 2D space.
use bevy::prelude::*;

/// Project a world vector onto the simulation plane (drop Y).
#[inline]
pub fn to_planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Lift a planar vector back into world space with the given height.
#[inline]
pub fn from_planar(v: Vec2, y: f32) -> Vec3 {
    Vec3::new(v.x, y, v.y)
}

/// Rotate a planar vector by `angle_deg` degrees about the plane normal (world Y).
/// Positive angles rotate from +X toward +Z, matching a yaw about Y seen from above.
#[inline]
pub fn rotate_planar(v: Vec2, angle_deg: f32) -> Vec2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Reflect `incoming` (travel direction) about a surface normal, staying planar.
#[inline]
pub fn reflect_planar(incoming: Vec2, normal: Vec2) -> Vec2 {
    incoming - 2.0 * incoming.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_planar_components() {
        let v = Vec3::new(1.5, 0.5, -2.0);
        let p = to_planar(v);
        assert_eq!(from_planar(p, 0.5), Vec3::new(1.5, 0.5, -2.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = rotate_planar(Vec2::X, 90.0);
        assert!(r.abs_diff_eq(Vec2::Y, 1e-5));
    }

    #[test]
    fn reflect_head_on_reverses() {
        let r = reflect_planar(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0));
        assert!(r.abs_diff_eq(Vec2::new(0.0, 1.0), 1e-5));
    }
}
