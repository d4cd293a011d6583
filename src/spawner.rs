//! Spawner: creates a physics body and its matching visual proxy
//!
//! A shape is dispatched once here into a collider and a scaled unit mesh;
//! nothing downstream needs to know which shape an entity has.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SandboxError};
use crate::listeners::ImpactListeners;
use crate::physics::{Body, BodyShape, PhysicsWorld, Pose};
use crate::pool::{EntityPool, PooledEntity};
use crate::scene::{MeshKind, ProxyDesc, SceneGraph};
use crate::settings::SpawnSettings;

/// Primitive to spawn and where
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeSpec {
    Sphere {
        radius: f32,
        position: Vec3,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
        position: Vec3,
    },
}

impl ShapeSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeSpec::Sphere { .. } => "sphere",
            ShapeSpec::Box { .. } => "box",
        }
    }

    pub fn position(&self) -> Vec3 {
        match *self {
            ShapeSpec::Sphere { position, .. } | ShapeSpec::Box { position, .. } => position,
        }
    }

    /// Every dimension must be finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        let dims = match *self {
            ShapeSpec::Sphere { radius, .. } => vec![("radius", radius)],
            ShapeSpec::Box {
                width,
                height,
                depth,
                ..
            } => vec![("width", width), ("height", height), ("depth", depth)],
        };
        for (label, value) in dims {
            if !(value.is_finite() && value > 0.0) {
                return Err(SandboxError::invalid_shape(
                    self.name(),
                    format!("{} must be positive, got {}", label, value),
                ));
            }
        }
        if !self.position().is_finite() {
            return Err(SandboxError::invalid_shape(
                self.name(),
                format!("position {:?} is not finite", self.position()),
            ));
        }
        Ok(())
    }

    /// Collision shape; box half extents are half of width/height/depth
    pub fn body_shape(&self) -> BodyShape {
        match *self {
            ShapeSpec::Sphere { radius, .. } => BodyShape::Sphere { radius },
            ShapeSpec::Box {
                width,
                height,
                depth,
                ..
            } => BodyShape::Cuboid {
                half_extents: Vec3::new(width, height, depth) * 0.5,
            },
        }
    }

    pub fn mesh(&self) -> MeshKind {
        match self {
            ShapeSpec::Sphere { .. } => MeshKind::Sphere,
            ShapeSpec::Box { .. } => MeshKind::Cube,
        }
    }

    /// Scale applied to the unit mesh so it covers the collider exactly
    pub fn proxy_scale(&self) -> Vec3 {
        match *self {
            ShapeSpec::Sphere { radius, .. } => Vec3::splat(radius),
            ShapeSpec::Box {
                width,
                height,
                depth,
                ..
            } => Vec3::new(width, height, depth),
        }
    }
}

/// The parts of a sandbox a spawn writes into
pub struct SpawnContext<'a, S: SceneGraph + ?Sized> {
    pub world: &'a mut PhysicsWorld,
    pub scene: &'a mut S,
    pub pool: &'a mut EntityPool,
    pub listeners: &'a mut ImpactListeners,
}

/// Sphere/box factory with a seeded random policy
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    settings: SpawnSettings,
}

/// Uniform draw from [lo, hi); an empty or unrepresentable range yields its
/// midpoint
fn sample(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if hi > lo && (hi - lo).is_finite() {
        rng.random_range(lo..hi)
    } else if hi > lo {
        lo * 0.5 + hi * 0.5
    } else {
        lo
    }
}

impl Spawner {
    pub fn new(settings: SpawnSettings, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            settings,
        }
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    pub fn spawn_sphere<S: SceneGraph + ?Sized>(
        &self,
        ctx: &mut SpawnContext<'_, S>,
        radius: f32,
        position: Vec3,
    ) -> Result<PooledEntity> {
        self.spawn(ctx, ShapeSpec::Sphere { radius, position })
    }

    pub fn spawn_box<S: SceneGraph + ?Sized>(
        &self,
        ctx: &mut SpawnContext<'_, S>,
        width: f32,
        height: f32,
        depth: f32,
        position: Vec3,
    ) -> Result<PooledEntity> {
        self.spawn(
            ctx,
            ShapeSpec::Box {
                width,
                height,
                depth,
                position,
            },
        )
    }

    /// Register proxy, body and impact listener, then pool the pair.
    ///
    /// The proxy goes in first: if the scene refuses it nothing else is
    /// registered.
    pub fn spawn<S: SceneGraph + ?Sized>(
        &self,
        ctx: &mut SpawnContext<'_, S>,
        spec: ShapeSpec,
    ) -> Result<PooledEntity> {
        spec.validate()?;

        let proxy = ctx.scene.add(ProxyDesc {
            mesh: spec.mesh(),
            scale: spec.proxy_scale(),
            pose: Pose::at(spec.position()),
            cast_shadow: true,
            receive_shadow: false,
        })?;

        let body = ctx.world.add_body(
            Body::dynamic(spec.body_shape(), self.settings.mass).with_position(spec.position()),
        );
        ctx.listeners.attach(body);

        let entity = PooledEntity { proxy, body };
        ctx.pool.insert(entity);
        log::debug!(
            "Spawned {} {:?} at {:?} ({} in pool)",
            spec.name(),
            body,
            spec.position(),
            ctx.pool.len()
        );
        Ok(entity)
    }

    fn random_position(&mut self) -> Vec3 {
        let spread = self.settings.spread;
        Vec3::new(
            sample(&mut self.rng, -spread, spread),
            self.settings.drop_height,
            sample(&mut self.rng, -spread, spread),
        )
    }

    /// Random sphere above the floor
    pub fn random_sphere(&mut self) -> ShapeSpec {
        let radius = sample(&mut self.rng, self.settings.min_radius, self.settings.max_radius);
        let spec = ShapeSpec::Sphere {
            radius,
            position: self.random_position(),
        };
        debug_assert!(spec.validate().is_ok(), "random policy produced {:?}", spec);
        spec
    }

    /// Random box above the floor
    pub fn random_box(&mut self) -> ShapeSpec {
        let (lo, hi) = (self.settings.min_extent, self.settings.max_extent);
        let width = sample(&mut self.rng, lo, hi);
        let height = sample(&mut self.rng, lo, hi);
        let depth = sample(&mut self.rng, lo, hi);
        let spec = ShapeSpec::Box {
            width,
            height,
            depth,
            position: self.random_position(),
        };
        debug_assert!(spec.validate().is_ok(), "random policy produced {:?}", spec);
        spec
    }

    pub fn spawn_random_sphere<S: SceneGraph + ?Sized>(
        &mut self,
        ctx: &mut SpawnContext<'_, S>,
    ) -> Result<PooledEntity> {
        let spec = self.random_sphere();
        self.spawn(ctx, spec)
    }

    pub fn spawn_random_box<S: SceneGraph + ?Sized>(
        &mut self,
        ctx: &mut SpawnContext<'_, S>,
    ) -> Result<PooledEntity> {
        let spec = self.random_box();
        self.spawn(ctx, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::GRAVITY_Y;
    use crate::physics::{Broadphase, ContactMaterial};
    use crate::scene::MemoryScene;

    struct Parts {
        world: PhysicsWorld,
        scene: MemoryScene,
        pool: EntityPool,
        listeners: ImpactListeners,
    }

    impl Parts {
        fn new(scene: MemoryScene) -> Self {
            Self {
                world: PhysicsWorld::new(
                    Vec3::new(0.0, GRAVITY_Y, 0.0),
                    Broadphase::SweepAndPrune,
                    true,
                    ContactMaterial::default(),
                ),
                scene,
                pool: EntityPool::new(),
                listeners: ImpactListeners::new(),
            }
        }

        fn ctx(&mut self) -> SpawnContext<'_, MemoryScene> {
            SpawnContext {
                world: &mut self.world,
                scene: &mut self.scene,
                pool: &mut self.pool,
                listeners: &mut self.listeners,
            }
        }
    }

    #[test]
    fn test_sphere_proxy_matches_collider() {
        let mut parts = Parts::new(MemoryScene::new());
        let spawner = Spawner::new(SpawnSettings::default(), 1);
        let position = Vec3::new(0.0, 3.0, 0.0);

        let e = spawner.spawn_sphere(&mut parts.ctx(), 0.3, position).unwrap();

        assert_eq!(parts.pool.len(), 1);
        let t = parts.scene.transform(e.proxy).unwrap();
        assert_eq!(t.scale, Vec3::splat(0.3));
        assert_eq!(t.position, position);
        assert_eq!(
            parts.world.collider_shape(e.body),
            Some(BodyShape::Sphere { radius: 0.3 })
        );
        assert_eq!(parts.world.body_pose(e.body).unwrap().position, position);
        assert!(parts.listeners.is_attached(e.body));
    }

    #[test]
    fn test_box_proxy_matches_collider() {
        let mut parts = Parts::new(MemoryScene::new());
        let spawner = Spawner::new(SpawnSettings::default(), 1);

        let e = spawner
            .spawn_box(&mut parts.ctx(), 1.0, 0.5, 0.2, Vec3::new(1.0, 3.0, -1.0))
            .unwrap();

        let t = parts.scene.transform(e.proxy).unwrap();
        assert_eq!(t.scale, Vec3::new(1.0, 0.5, 0.2));
        assert_eq!(
            parts.world.collider_shape(e.body),
            Some(BodyShape::Cuboid {
                half_extents: Vec3::new(0.5, 0.25, 0.1)
            })
        );
        assert_eq!(parts.scene.node(e.proxy).unwrap().mesh, MeshKind::Cube);
    }

    #[test]
    fn test_invalid_dimensions_register_nothing() {
        let mut parts = Parts::new(MemoryScene::new());
        let spawner = Spawner::new(SpawnSettings::default(), 1);

        for radius in [0.0, -1.0, f32::NAN] {
            let err = spawner.spawn_sphere(&mut parts.ctx(), radius, Vec3::Y);
            assert!(matches!(err, Err(SandboxError::InvalidShape { shape: "sphere", .. })));
        }
        let err = spawner.spawn_box(&mut parts.ctx(), 1.0, 0.0, 1.0, Vec3::Y);
        assert!(matches!(err, Err(SandboxError::InvalidShape { shape: "box", .. })));

        assert!(parts.pool.is_empty());
        assert!(parts.scene.is_empty());
        assert_eq!(parts.world.body_count(), 0);
    }

    #[test]
    fn test_scene_failure_leaves_no_body() {
        let mut parts = Parts::new(MemoryScene::with_limit(0));
        let spawner = Spawner::new(SpawnSettings::default(), 1);

        let err = spawner.spawn_sphere(&mut parts.ctx(), 0.5, Vec3::Y);
        assert!(matches!(err, Err(SandboxError::Scene(_))));
        assert_eq!(parts.world.body_count(), 0);
        assert!(parts.pool.is_empty());
        assert!(parts.listeners.is_empty());
    }

    #[test]
    fn test_random_specs_stay_in_bounds() {
        let settings = SpawnSettings::default();
        let mut spawner = Spawner::new(settings, 42);
        for _ in 0..200 {
            match spawner.random_sphere() {
                ShapeSpec::Sphere { radius, position } => {
                    assert!(radius >= settings.min_radius && radius < settings.max_radius);
                    assert_eq!(position.y, settings.drop_height);
                    assert!(position.x.abs() <= settings.spread);
                    assert!(position.z.abs() <= settings.spread);
                }
                other => panic!("expected sphere, got {:?}", other),
            }
            match spawner.random_box() {
                ShapeSpec::Box {
                    width,
                    height,
                    depth,
                    ..
                } => {
                    for d in [width, height, depth] {
                        assert!(d >= settings.min_extent && d < settings.max_extent);
                    }
                }
                other => panic!("expected box, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = Spawner::new(SpawnSettings::default(), 9);
        let mut b = Spawner::new(SpawnSettings::default(), 9);
        for _ in 0..10 {
            assert_eq!(a.random_sphere(), b.random_sphere());
            assert_eq!(a.random_box(), b.random_box());
        }
    }

    #[test]
    fn test_random_spawns_are_pooled() {
        let mut parts = Parts::new(MemoryScene::new());
        let mut spawner = Spawner::new(SpawnSettings::default(), 3);
        spawner.spawn_random_sphere(&mut parts.ctx()).unwrap();
        spawner.spawn_random_box(&mut parts.ctx()).unwrap();
        assert_eq!(parts.pool.len(), 2);
        assert_eq!(parts.scene.len(), 2);
        assert_eq!(parts.world.body_count(), 2);
    }

    #[test]
    fn test_unsanitized_huge_spread_does_not_panic() {
        let settings = SpawnSettings {
            spread: 3.0e38,
            ..SpawnSettings::default()
        };
        let mut spawner = Spawner::new(settings, 1);
        let spec = spawner.random_sphere();
        assert!(spec.position().is_finite());
        assert!(spec.validate().is_ok());
    }
}
