//! Entity pool: (body, visual proxy) pairs managed as one lifecycle unit

use crate::listeners::ImpactListeners;
use crate::physics::{BodyId, PhysicsWorld};
use crate::scene::{ProxyId, SceneGraph};

/// A physics body and the proxy that mirrors it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PooledEntity {
    pub proxy: ProxyId,
    pub body: BodyId,
}

/// Active entities, in spawn order
#[derive(Debug, Default, Clone)]
pub struct EntityPool {
    entities: Vec<PooledEntity>,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: PooledEntity) {
        self.entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PooledEntity> {
        self.entities.iter()
    }

    pub fn contains_body(&self, body: BodyId) -> bool {
        self.entities.iter().any(|e| e.body == body)
    }

    /// Evict every entity.
    ///
    /// Per entity: detach its impact listener, remove its body from the world,
    /// remove its proxy from the scene. Returns the number evicted.
    pub fn clear<S: SceneGraph + ?Sized>(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &mut S,
        listeners: &mut ImpactListeners,
    ) -> usize {
        let count = self.entities.len();
        for entity in self.entities.drain(..) {
            listeners.detach(entity.body);
            if world.remove_body(entity.body).is_none() {
                log::warn!("Pooled body {:?} was not in the world", entity.body);
            }
            if !scene.remove(entity.proxy) {
                log::warn!("Pooled proxy {:?} was not in the scene", entity.proxy);
            }
        }
        if count > 0 {
            log::debug!("Evicted {} entities", count);
        }
        count
    }
}
