//! Sandbox context
//!
//! Owns the physics world, entity pool, listener table, scene and sound.
//! Everything that needs one of them gets the sandbox by `&mut`, so a reset
//! can never run while the pose copy is iterating the pool.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};

use crate::audio::ImpactSound;
use crate::consts::{DROP_HEIGHT, FLOOR_SIZE, INITIAL_SPHERE_RADIUS};
use crate::error::Result;
use crate::gate::ImpactGate;
use crate::listeners::ImpactListeners;
use crate::physics::{BodyId, PhysicsWorld, Pose};
use crate::pool::{EntityPool, PooledEntity};
use crate::scene::{MeshKind, ProxyDesc, ProxyId, SceneGraph};
use crate::settings::Settings;
use crate::spawner::{ShapeSpec, SpawnContext, Spawner};

/// Zero-argument actions exposed to a control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Evict every pooled entity
    Reset,
    /// Drop a random sphere
    CreateSphere,
    /// Drop a random box
    CreateBox,
}

/// The static floor: plane body plus its (finite) visual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Floor {
    pub body: BodyId,
    pub proxy: ProxyId,
}

/// What one physics advance produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Internal fixed steps taken
    pub steps: u32,
    /// Impact sounds triggered
    pub sounds: usize,
}

pub struct Sandbox<S: SceneGraph, A: ImpactSound> {
    world: PhysicsWorld,
    pool: EntityPool,
    listeners: ImpactListeners,
    scene: S,
    sound: A,
    gate: ImpactGate,
    spawner: Spawner,
    floor: Option<Floor>,
    pending: VecDeque<ControlAction>,
}

impl<S: SceneGraph, A: ImpactSound> Sandbox<S, A> {
    /// Empty sandbox: no floor, no entities
    pub fn new(settings: &Settings, scene: S, sound: A) -> Self {
        let world = PhysicsWorld::new(
            settings.gravity,
            settings.broadphase,
            settings.sleep_enabled,
            settings.default_contact_material(),
        );
        Self {
            world,
            pool: EntityPool::new(),
            listeners: ImpactListeners::new(),
            scene,
            sound,
            gate: settings.impact,
            spawner: Spawner::new(settings.spawn, settings.seed),
            floor: None,
            pending: VecDeque::new(),
        }
    }

    /// Sandbox with the floor and starting sphere the settings ask for
    pub fn from_settings(settings: &Settings, scene: S, sound: A) -> Result<Self> {
        let mut sandbox = Self::new(settings, scene, sound);
        if settings.floor {
            sandbox.add_floor()?;
        }
        if settings.initial_sphere {
            sandbox.spawn_sphere(INITIAL_SPHERE_RADIUS, Vec3::new(0.0, DROP_HEIGHT, 0.0))?;
        }
        log::info!(
            "Sandbox ready: {} bodies, {} entities",
            sandbox.world.body_count(),
            sandbox.pool.len()
        );
        Ok(sandbox)
    }

    /// Add the static floor once; later calls return the existing one
    pub fn add_floor(&mut self) -> Result<Floor> {
        if let Some(floor) = self.floor {
            return Ok(floor);
        }
        let size = Vec2::splat(FLOOR_SIZE);
        let proxy = self.scene.add(ProxyDesc {
            mesh: MeshKind::Plane,
            scale: Vec3::new(size.x, 1.0, size.y),
            pose: Pose::default(),
            cast_shadow: false,
            receive_shadow: true,
        })?;
        let body = self.world.add_ground_plane();
        let floor = Floor { body, proxy };
        self.floor = Some(floor);
        Ok(floor)
    }

    fn spawn_context(&mut self) -> (&mut Spawner, SpawnContext<'_, S>) {
        (
            &mut self.spawner,
            SpawnContext {
                world: &mut self.world,
                scene: &mut self.scene,
                pool: &mut self.pool,
                listeners: &mut self.listeners,
            },
        )
    }

    pub fn spawn(&mut self, spec: ShapeSpec) -> Result<PooledEntity> {
        let (spawner, mut ctx) = self.spawn_context();
        spawner.spawn(&mut ctx, spec)
    }

    pub fn spawn_sphere(&mut self, radius: f32, position: Vec3) -> Result<PooledEntity> {
        let (spawner, mut ctx) = self.spawn_context();
        spawner.spawn_sphere(&mut ctx, radius, position)
    }

    pub fn spawn_box(
        &mut self,
        width: f32,
        height: f32,
        depth: f32,
        position: Vec3,
    ) -> Result<PooledEntity> {
        let (spawner, mut ctx) = self.spawn_context();
        spawner.spawn_box(&mut ctx, width, height, depth, position)
    }

    pub fn spawn_random_sphere(&mut self) -> Result<PooledEntity> {
        let (spawner, mut ctx) = self.spawn_context();
        spawner.spawn_random_sphere(&mut ctx)
    }

    pub fn spawn_random_box(&mut self) -> Result<PooledEntity> {
        let (spawner, mut ctx) = self.spawn_context();
        spawner.spawn_random_box(&mut ctx)
    }

    /// Evict every pooled entity; the floor stays
    pub fn reset(&mut self) -> usize {
        let evicted = self
            .pool
            .clear(&mut self.world, &mut self.scene, &mut self.listeners);
        log::info!("Reset: removed {} entities", evicted);
        evicted
    }

    /// Queue an action for the next tick boundary
    pub fn queue(&mut self, action: ControlAction) {
        self.pending.push_back(action);
    }

    pub fn apply(&mut self, action: ControlAction) -> Result<()> {
        match action {
            ControlAction::Reset => {
                self.reset();
            }
            ControlAction::CreateSphere => {
                self.spawn_random_sphere()?;
            }
            ControlAction::CreateBox => {
                self.spawn_random_box()?;
            }
        }
        Ok(())
    }

    /// Apply queued actions in order; failures are logged and skipped
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(action) = self.pending.pop_front() {
            match self.apply(action) {
                Ok(()) => applied += 1,
                Err(e) => log::warn!("{:?} failed: {}", action, e),
            }
        }
        applied
    }

    /// Advance physics and play sounds for audible first contacts
    pub fn step(&mut self, fixed_delta: f32, delta: f32, max_substeps: u32) -> StepOutcome {
        let steps = self.world.step(fixed_delta, delta, max_substeps);
        let events = self.world.drain_contacts();
        let sounds = if events.is_empty() {
            0
        } else {
            self.listeners.dispatch(&events, &self.gate, &mut self.sound)
        };
        StepOutcome { steps, sounds }
    }

    /// Copy every pooled body's position and orientation onto its proxy
    pub fn sync_poses(&mut self) -> usize {
        let mut synced = 0;
        for entity in self.pool.iter() {
            let Some(pose) = self.world.body_pose(entity.body) else {
                continue;
            };
            if self.scene.set_pose(entity.proxy, pose) {
                synced += 1;
            }
        }
        synced
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn listeners(&self) -> &ImpactListeners {
        &self.listeners
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn sound(&self) -> &A {
        &self.sound
    }

    pub fn gate(&self) -> &ImpactGate {
        &self.gate
    }

    pub fn floor(&self) -> Option<Floor> {
        self.floor
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
