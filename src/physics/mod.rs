//! Rigid-body physics world
//!
//! Wraps rapier with the pieces the sandbox needs on top of it:
//! - Fixed-step accumulator with a substep cap
//! - Stable body identifiers that survive remove/re-add
//! - First-contact events carrying the impact speed along the normal
//! - Named contact materials

pub mod body;
pub mod contact;
pub mod material;
pub mod world;

pub use body::{Body, BodyId, BodyKind, BodyShape, Pose};
pub use contact::{ContactEvent, impact_speed};
pub use material::{ContactMaterial, MaterialTable, SurfaceMaterial};
pub use world::{Broadphase, PhysicsWorld};

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::{Point, Real, Rotation, Vector};

#[inline]
pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_point(p: &Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

#[inline]
pub(crate) fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub(crate) fn from_rotation(r: &Rotation<Real>) -> Quat {
    let c = r.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_conversion_roundtrip() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalize(), 0.8);
        let back = from_rotation(&to_rotation(q));
        assert!(q.dot(back).abs() > 0.9999);
    }
}
