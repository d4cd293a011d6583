//! Physics world: rapier sets, fixed-step accumulator and contact tracking

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use rapier3d::na::Unit;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, BodyKind, BodyShape, Pose};
use super::contact::{ContactEvent, impact_speed, point_velocity};
use super::material::{ContactMaterial, MaterialTable, SurfaceMaterial};
use super::{from_point, from_rotation, from_vector, to_rotation, to_vector};
use crate::consts::MAX_FRAME_DELTA;

/// Broad-phase strategy requested for the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Broadphase {
    /// Test every pair
    Naive,
    /// Sort AABBs along axes and only test overlapping intervals
    #[default]
    SweepAndPrune,
}

/// Bookkeeping for a body currently in the world
#[derive(Debug, Clone)]
struct Tracked {
    handle: RigidBodyHandle,
    shape: BodyShape,
    kind: BodyKind,
    material: SurfaceMaterial,
}

/// Pre-step motion of a dynamic body, used to measure impact speeds
#[derive(Debug, Clone, Copy)]
struct Motion {
    linvel: Vec3,
    angvel: Vec3,
    center_of_mass: Vec3,
}

type PairKey = (ColliderHandle, ColliderHandle);

fn pair_key(a: ColliderHandle, b: ColliderHandle) -> PairKey {
    if a.into_raw_parts() <= b.into_raw_parts() {
        (a, b)
    } else {
        (b, a)
    }
}

fn pose_of(rigid_body: &RigidBody) -> Pose {
    Pose {
        position: from_vector(rigid_body.translation()),
        orientation: from_rotation(rigid_body.rotation()),
    }
}

/// Rigid-body world advanced in fixed steps
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    broadphase: Broadphase,
    sleep_enabled: bool,
    materials: MaterialTable,
    /// Interned surface materials; a collider's `user_data` indexes this
    surfaces: Vec<SurfaceMaterial>,

    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    tracked: HashMap<BodyId, Tracked>,
    next_id: u64,
    /// Collider pairs touching after the last internal step
    touching: HashSet<PairKey>,
    /// Contact begin events not yet drained
    pending: Vec<ContactEvent>,

    accumulator: f32,
    steps: u64,
    time: f64,
}

impl PhysicsWorld {
    /// One-time world setup.
    ///
    /// `default_contact_material` applies to every body whose surface material
    /// has no explicit contact material registered.
    pub fn new(
        gravity: Vec3,
        broadphase: Broadphase,
        sleep_enabled: bool,
        default_contact_material: ContactMaterial,
    ) -> Self {
        if broadphase == Broadphase::Naive {
            log::info!("Naive broad-phase requested; rapier's sweep-and-prune broad-phase serves it");
        }
        log::info!(
            "Physics world: gravity {:?}, sleep {}, friction {}, restitution {}",
            gravity,
            sleep_enabled,
            default_contact_material.friction,
            default_contact_material.restitution
        );

        Self {
            gravity: to_vector(gravity),
            broadphase,
            sleep_enabled,
            materials: MaterialTable::new(default_contact_material),
            surfaces: vec![SurfaceMaterial::default()],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            tracked: HashMap::new(),
            next_id: 1,
            touching: HashSet::new(),
            pending: Vec::new(),
            accumulator: 0.0,
            steps: 0,
            time: 0.0,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    pub fn broadphase(&self) -> Broadphase {
        self.broadphase
    }

    pub fn sleep_enabled(&self) -> bool {
        self.sleep_enabled
    }

    pub fn default_contact_material(&self) -> &ContactMaterial {
        self.materials.fallback()
    }

    /// Register a contact material, replacing any existing one for the same pair.
    ///
    /// Applies from the next step on, including to bodies already in the world.
    pub fn add_contact_material(&mut self, material: ContactMaterial) {
        log::debug!(
            "Contact material {}/{}: friction {}, restitution {}",
            material.a.name(),
            material.b.name(),
            material.friction,
            material.restitution
        );
        self.materials.insert(material);
    }

    /// Contact material for a pair of surfaces, falling back to the default
    pub fn contact_material(&self, a: &SurfaceMaterial, b: &SurfaceMaterial) -> &ContactMaterial {
        self.materials.lookup(a, b)
    }

    fn surface_index(&mut self, material: &SurfaceMaterial) -> u128 {
        let index = match self.surfaces.iter().position(|s| s == material) {
            Some(index) => index,
            None => {
                self.surfaces.push(material.clone());
                self.surfaces.len() - 1
            }
        };
        index as u128
    }

    fn allocate_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a body and return its identifier.
    ///
    /// A body previously removed from this world keeps its identifier.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = match body.id {
            Some(id) if !self.tracked.contains_key(&id) => id,
            _ => self.allocate_id(),
        };
        // Identifiers handed back by remove_body must never be reissued
        self.next_id = self.next_id.max(id.0 + 1);

        let surface = self.contact_material(&body.material, &body.material).clone();
        let surface_index = self.surface_index(&body.material);

        let builder = match body.kind {
            BodyKind::Dynamic { .. } => RigidBodyBuilder::dynamic(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let rigid_body = builder
            .position(Isometry::from_parts(
                Translation::from(to_vector(body.pose.position)),
                to_rotation(body.pose.orientation),
            ))
            .linvel(to_vector(body.linear_velocity))
            .angvel(to_vector(body.angular_velocity))
            .can_sleep(self.sleep_enabled)
            .user_data(u128::from(id.0))
            .build();

        let collider = collider_for(&body.shape, body.kind, &surface, surface_index);
        let handle = self.bodies.insert(rigid_body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.tracked.insert(
            id,
            Tracked {
                handle,
                shape: body.shape,
                kind: body.kind,
                material: body.material,
            },
        );
        id
    }

    /// Remove a body, returning it with its current pose and velocities.
    ///
    /// Unknown identifiers are ignored.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let tracked = self.tracked.remove(&id)?;
        let colliders: Vec<ColliderHandle> = self
            .bodies
            .get(tracked.handle)
            .map(|rb| rb.colliders().to_vec())
            .unwrap_or_default();

        let rigid_body = self.bodies.remove(
            tracked.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )?;

        self.touching
            .retain(|(a, b)| !colliders.contains(a) && !colliders.contains(b));
        self.pending.retain(|e| e.body != id && e.other != id);

        Some(Body {
            id: Some(id),
            shape: tracked.shape,
            kind: tracked.kind,
            pose: pose_of(&rigid_body),
            linear_velocity: from_vector(rigid_body.linvel()),
            angular_velocity: from_vector(rigid_body.angvel()),
            material: tracked.material,
        })
    }

    /// Static infinite floor through the origin, facing +Y
    pub fn add_ground_plane(&mut self) -> BodyId {
        self.add_body(Body::fixed(BodyShape::Plane { normal: Vec3::Y }))
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.tracked.contains_key(&id)
    }

    pub fn body_count(&self) -> usize {
        self.tracked.len()
    }

    fn rigid_body(&self, id: BodyId) -> Option<&RigidBody> {
        let tracked = self.tracked.get(&id)?;
        self.bodies.get(tracked.handle)
    }

    pub fn body_pose(&self, id: BodyId) -> Option<Pose> {
        self.rigid_body(id).map(pose_of)
    }

    pub fn body_velocity(&self, id: BodyId) -> Option<Vec3> {
        self.rigid_body(id).map(|rb| from_vector(rb.linvel()))
    }

    pub fn is_sleeping(&self, id: BodyId) -> Option<bool> {
        self.rigid_body(id).map(|rb| rb.is_sleeping())
    }

    /// Shape the body was created with
    pub fn body_shape(&self, id: BodyId) -> Option<BodyShape> {
        self.tracked.get(&id).map(|t| t.shape)
    }

    /// Shape as the collision library sees it
    pub fn collider_shape(&self, id: BodyId) -> Option<BodyShape> {
        let rigid_body = self.rigid_body(id)?;
        let collider = self.colliders.get(*rigid_body.colliders().first()?)?;
        let shape = collider.shape();
        if let Some(ball) = shape.as_ball() {
            Some(BodyShape::Sphere {
                radius: ball.radius,
            })
        } else if let Some(cuboid) = shape.as_cuboid() {
            Some(BodyShape::Cuboid {
                half_extents: from_vector(&cuboid.half_extents),
            })
        } else {
            shape.as_halfspace().map(|plane| BodyShape::Plane {
                normal: from_vector(&plane.normal),
            })
        }
    }

    /// Simulated seconds (internal steps × step size)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Internal steps taken since creation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Real time carried over to the next `step` call
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Contact begin events since the last drain
    pub fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Advance the simulation by the real time elapsed since the last call.
    ///
    /// Runs internal steps of `fixed_delta` while enough real time has
    /// accumulated, at most `max_substeps` of them; any backlog beyond that is
    /// dropped. `actual_delta` is clamped to `MAX_FRAME_DELTA`. Zero, negative
    /// or non-finite deltas step nothing. Returns the number of internal steps.
    pub fn step(&mut self, fixed_delta: f32, actual_delta: f32, max_substeps: u32) -> u32 {
        if !fixed_delta.is_finite() || fixed_delta <= 0.0 || max_substeps == 0 {
            return 0;
        }
        if !actual_delta.is_finite() || actual_delta <= 0.0 {
            return 0;
        }

        self.params.dt = fixed_delta;
        self.accumulator += actual_delta.min(MAX_FRAME_DELTA);

        let mut substeps = 0;
        while self.accumulator >= fixed_delta && substeps < max_substeps {
            self.internal_step();
            self.accumulator -= fixed_delta;
            substeps += 1;
        }
        self.accumulator %= fixed_delta;

        if substeps > 1 {
            log::trace!("Caught up with {} substeps", substeps);
        }
        substeps
    }

    fn internal_step(&mut self) {
        let motions: HashMap<RigidBodyHandle, Motion> = self
            .bodies
            .iter()
            .filter(|(_, rb)| rb.is_dynamic())
            .map(|(handle, rb)| {
                (
                    handle,
                    Motion {
                        linvel: from_vector(rb.linvel()),
                        angvel: from_vector(rb.angvel()),
                        center_of_mass: from_point(rb.center_of_mass()),
                    },
                )
            })
            .collect();

        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &MaterialHooks {
                surfaces: &self.surfaces,
                materials: &self.materials,
            },
            &(),
        );

        self.steps += 1;
        self.time += f64::from(self.params.dt);
        self.collect_contact_begins(&motions);
    }

    /// Diff touching pairs against the previous step and queue an event per
    /// dynamic body of every newly touching pair
    fn collect_contact_begins(&mut self, motions: &HashMap<RigidBodyHandle, Motion>) {
        let mut touching = HashSet::with_capacity(self.touching.len());
        let mut events = Vec::new();

        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let key = pair_key(pair.collider1, pair.collider2);
            touching.insert(key);
            if self.touching.contains(&key) {
                continue;
            }

            let Some(manifold) = pair.manifolds.iter().find(|m| !m.points.is_empty()) else {
                continue;
            };
            let (Some(c1), Some(c2)) = (
                self.colliders.get(pair.collider1),
                self.colliders.get(pair.collider2),
            ) else {
                continue;
            };
            let (Some(h1), Some(h2)) = (c1.parent(), c2.parent()) else {
                continue;
            };
            let (Some(rb1), Some(rb2)) = (self.bodies.get(h1), self.bodies.get(h2)) else {
                continue;
            };
            let id1 = BodyId(rb1.user_data as u64);
            let id2 = BodyId(rb2.user_data as u64);

            let point = from_point(&(c1.position() * manifold.points[0].local_p1));
            let normal = from_vector(&manifold.data.normal);
            let velocity_at = |handle: RigidBodyHandle| {
                motions
                    .get(&handle)
                    .map(|m| point_velocity(m.linvel, m.angvel, m.center_of_mass, point))
                    .unwrap_or(Vec3::ZERO)
            };
            let speed = impact_speed(velocity_at(h1), velocity_at(h2), normal);

            for (body, other, handle) in [(id1, id2, h1), (id2, id1, h2)] {
                if motions.contains_key(&handle) {
                    events.push(ContactEvent {
                        body,
                        other,
                        impact_speed: speed,
                        normal,
                    });
                }
            }
        }

        self.touching = touching;
        self.pending.extend(events);
    }
}

/// Applies the contact material of each colliding surface pair to its
/// solver contacts
struct MaterialHooks<'a> {
    surfaces: &'a [SurfaceMaterial],
    materials: &'a MaterialTable,
}

impl MaterialHooks<'_> {
    fn surface(&self, colliders: &ColliderSet, handle: ColliderHandle) -> Option<&SurfaceMaterial> {
        let index = usize::try_from(colliders.get(handle)?.user_data).ok()?;
        self.surfaces.get(index)
    }
}

impl PhysicsHooks for MaterialHooks<'_> {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let (Some(a), Some(b)) = (
            self.surface(context.colliders, context.collider1),
            self.surface(context.colliders, context.collider2),
        ) else {
            return;
        };
        let material = self.materials.lookup(a, b);
        for contact in context.solver_contacts.iter_mut() {
            contact.friction = material.friction;
            contact.restitution = material.restitution;
        }
    }
}

/// Collider for a body; the self-paired coefficients hold until the solver
/// hook swaps in the pair's material
fn collider_for(
    shape: &BodyShape,
    kind: BodyKind,
    surface: &ContactMaterial,
    surface_index: u128,
) -> Collider {
    let builder = match *shape {
        BodyShape::Sphere { radius } => ColliderBuilder::ball(radius),
        BodyShape::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        BodyShape::Plane { normal } => {
            let normal = normal.try_normalize().unwrap_or(Vec3::Y);
            ColliderBuilder::halfspace(Unit::new_normalize(to_vector(normal)))
        }
    }
    .friction(surface.friction)
    .restitution(surface.restitution)
    .user_data(surface_index)
    .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS);

    match kind {
        BodyKind::Dynamic { mass } => builder.mass(mass).build(),
        BodyKind::Static => builder.build(),
    }
}
