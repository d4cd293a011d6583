//! Contact events
//!
//! Emitted once when two bodies start touching, never again while the
//! contact persists.

use glam::Vec3;

use super::body::BodyId;

/// A body started touching another body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// The body this event is addressed to (always dynamic)
    pub body: BodyId,
    /// The body it hit
    pub other: BodyId,
    /// Relative speed along the contact normal at the moment of impact
    pub impact_speed: f32,
    /// World-space contact normal
    pub normal: Vec3,
}

/// Speed at which two contact points approach along the normal.
///
/// Velocities are those of the material points at the contact, before the
/// solver resolved the contact.
#[inline]
pub fn impact_speed(velocity1: Vec3, velocity2: Vec3, normal: Vec3) -> f32 {
    let normal = normal.normalize_or_zero();
    (velocity1 - velocity2).dot(normal).abs()
}

/// Velocity of a point rigidly attached to a body
#[inline]
pub(crate) fn point_velocity(linvel: Vec3, angvel: Vec3, center_of_mass: Vec3, point: Vec3) -> Vec3 {
    linvel + angvel.cross(point - center_of_mass)
}
