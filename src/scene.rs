//! Render scene boundary
//!
//! The renderer owns meshes, materials and lights. The sandbox only needs to
//! add/remove visual proxies and write their pose every tick.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::physics::Pose;

/// Handle to a visual proxy in a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProxyId(pub u64);

/// Unit meshes shared by all proxies of a kind; size comes from `scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshKind {
    /// Sphere of radius 1
    Sphere,
    /// Cube with edge 1
    Cube,
    /// Square of edge 1 in the XZ plane
    Plane,
}

/// Everything needed to create a visual proxy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxyDesc {
    pub mesh: MeshKind,
    pub scale: Vec3,
    pub pose: Pose,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Full transform of a proxy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene is full ({limit} proxies)")]
    Full { limit: usize },
}

/// Scene graph the sandbox writes into
pub trait SceneGraph {
    /// Add a proxy and return its handle
    fn add(&mut self, desc: ProxyDesc) -> Result<ProxyId, SceneError>;

    /// Remove a proxy; false if it was not in the scene
    fn remove(&mut self, id: ProxyId) -> bool;

    /// Overwrite position and orientation; false if the proxy is unknown
    fn set_pose(&mut self, id: ProxyId, pose: Pose) -> bool;

    fn transform(&self, id: ProxyId) -> Option<Transform>;

    fn contains(&self, id: ProxyId) -> bool {
        self.transform(id).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A proxy held by `MemoryScene`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNode {
    pub mesh: MeshKind,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// In-memory scene graph, read by a renderer or inspected in tests
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: BTreeMap<ProxyId, SceneNode>,
    next_id: u64,
    limit: Option<usize>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene that refuses proxies beyond `limit`
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn node(&self, id: ProxyId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (ProxyId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }
}

impl SceneGraph for MemoryScene {
    fn add(&mut self, desc: ProxyDesc) -> Result<ProxyId, SceneError> {
        if let Some(limit) = self.limit {
            if self.nodes.len() >= limit {
                return Err(SceneError::Full { limit });
            }
        }

        let id = ProxyId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                mesh: desc.mesh,
                transform: Transform {
                    position: desc.pose.position,
                    orientation: desc.pose.orientation,
                    scale: desc.scale,
                },
                cast_shadow: desc.cast_shadow,
                receive_shadow: desc.receive_shadow,
            },
        );
        Ok(id)
    }

    fn remove(&mut self, id: ProxyId) -> bool {
        self.nodes.remove(&id).is_some()
    }

    fn set_pose(&mut self, id: ProxyId, pose: Pose) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.transform.position = pose.position;
                node.transform.orientation = pose.orientation;
                true
            }
            None => false,
        }
    }

    fn transform(&self, id: ProxyId) -> Option<Transform> {
        self.nodes.get(&id).map(|n| n.transform)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(mesh: MeshKind) -> ProxyDesc {
        ProxyDesc {
            mesh,
            scale: Vec3::ONE,
            pose: Pose::default(),
            cast_shadow: true,
            receive_shadow: false,
        }
    }

    #[test]
    fn test_add_set_pose_remove() {
        let mut scene = MemoryScene::new();
        let id = scene.add(desc(MeshKind::Cube)).unwrap();
        assert!(scene.contains(id));

        let pose = Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            orientation: Quat::from_rotation_y(1.0),
        };
        assert!(scene.set_pose(id, pose));
        let t = scene.transform(id).unwrap();
        assert_eq!(t.position, pose.position);
        assert_eq!(t.orientation, pose.orientation);
        assert_eq!(t.scale, Vec3::ONE);

        assert!(scene.remove(id));
        assert!(!scene.remove(id));
        assert!(!scene.set_pose(id, pose));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_limit_rejects_extra_proxies() {
        let mut scene = MemoryScene::with_limit(1);
        scene.add(desc(MeshKind::Sphere)).unwrap();
        assert_eq!(
            scene.add(desc(MeshKind::Sphere)),
            Err(SceneError::Full { limit: 1 })
        );
        assert_eq!(scene.len(), 1);
    }
}
