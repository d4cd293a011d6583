//! Body descriptions
//!
//! A `Body` is the world-independent form of a rigid body: what gets added to
//! a world, and what comes back out when it is removed.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::material::SurfaceMaterial;

/// Stable body identifier, kept across remove/re-add
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    /// Infinite plane through the body origin
    Plane { normal: Vec3 },
}

/// Dynamic bodies move under gravity and contacts; static ones never move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    Dynamic { mass: f32 },
    Static,
}

/// Position and orientation of a body or proxy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }
}

/// A rigid body that is not (or no longer) in a world
#[derive(Debug)]
pub struct Body {
    pub(crate) id: Option<BodyId>,
    pub shape: BodyShape,
    pub kind: BodyKind,
    pub pose: Pose,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub material: SurfaceMaterial,
}

impl Body {
    pub fn dynamic(shape: BodyShape, mass: f32) -> Self {
        Self {
            id: None,
            shape,
            kind: BodyKind::Dynamic { mass },
            pose: Pose::default(),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            material: SurfaceMaterial::default(),
        }
    }

    pub fn fixed(shape: BodyShape) -> Self {
        Self {
            kind: BodyKind::Static,
            ..Self::dynamic(shape, 0.0)
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.pose.orientation = orientation;
        self
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    /// Identifier this body had in the world it was removed from
    pub fn id(&self) -> Option<BodyId> {
        self.id
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic { .. })
    }
}
