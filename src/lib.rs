//! Physics Playground - rigid bodies dropped onto a floor, mirrored onto a scene
//!
//! Core modules:
//! - `physics`: rapier-backed world with a fixed-step accumulator and contact events
//! - `gate`: impact speed to sound decision
//! - `pool`: paired (body, visual proxy) entities
//! - `spawner`: sphere/box factories
//! - `sync`: per-frame driver (step, copy poses, request next frame)
//! - `sandbox`: context object owning all of the above
//! - `scene` / `audio`: boundaries to the renderer and the sound device

pub mod audio;
pub mod error;
pub mod gate;
pub mod listeners;
pub mod physics;
pub mod pool;
pub mod sandbox;
pub mod scene;
pub mod settings;
pub mod spawner;
pub mod sync;

pub use error::{Result, SandboxError};
pub use gate::{ImpactGate, impact_volume, should_play_impact_sound};
pub use pool::{EntityPool, PooledEntity};
pub use sandbox::{ControlAction, Floor, Sandbox, StepOutcome};
pub use settings::Settings;
pub use spawner::{ShapeSpec, Spawner};
pub use sync::{Clock, LoopControl, LoopState, ManualClock, SyncLoop, TickReport};

/// Simulation configuration constants
pub mod consts {
    /// Canonical physics step (60 Hz)
    pub const FIXED_DT: f32 = 1.0 / 60.0;
    /// Maximum internal steps per frame before the backlog is dropped
    pub const MAX_SUBSTEPS: u32 = 3;
    /// Largest real frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DELTA: f32 = 1.0;

    /// Earth gravity along -Y (m/s²)
    pub const GRAVITY_Y: f32 = -9.82;

    /// Default surface friction
    pub const DEFAULT_FRICTION: f32 = 0.1;
    /// Default surface restitution (bounciness)
    pub const DEFAULT_RESTITUTION: f32 = 0.7;

    /// Impact speed (m/s along the contact normal) above which a hit is audible
    pub const IMPACT_SOUND_THRESHOLD: f32 = 1.5;
    /// Impact speed that maps to full volume
    pub const IMPACT_VOLUME_DIVISOR: f32 = 4.0;

    /// Mass given to every spawned body (kg)
    pub const SPAWN_MASS: f32 = 1.0;
    /// Height random spawns are dropped from
    pub const DROP_HEIGHT: f32 = 3.0;
    /// Random spawns land in [-SPREAD, SPREAD) on X and Z
    pub const SPAWN_SPREAD: f32 = 1.5;
    /// Largest configurable spread
    pub const MAX_SPAWN_SPREAD: f32 = 1000.0;
    /// Radius of the sphere dropped on startup
    pub const INITIAL_SPHERE_RADIUS: f32 = 0.5;

    /// Visible floor size (the physics floor is an infinite plane)
    pub const FLOOR_SIZE: f32 = 10.0;
}
