//! Per-frame sync loop
//!
//! Each tick applies queued control actions, advances physics by the real
//! time since the previous tick, then copies every pooled body's pose onto
//! its proxy. The first tick only records the start time.

use crate::audio::ImpactSound;
use crate::consts::{FIXED_DT, MAX_SUBSTEPS};
use crate::sandbox::Sandbox;
use crate::scene::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No tick has run yet
    #[default]
    Idle,
    Running,
}

/// Whether the host should schedule another tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Monotonic seconds since some fixed origin
pub trait Clock {
    fn elapsed(&self) -> f64;
}

/// Clock advanced by hand; used by headless runs and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds;
    }

    pub fn set(&mut self, seconds: f64) {
        self.now = seconds;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> f64 {
        self.now
    }
}

/// Wall clock backed by `std::time::Instant`
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Real seconds since the previous tick (0 on the first)
    pub delta: f32,
    /// Control actions applied before stepping
    pub actions: usize,
    /// Fixed physics steps taken
    pub steps: u32,
    /// Proxies whose pose was updated
    pub synced: usize,
    /// Impact sounds triggered
    pub sounds: usize,
}

pub struct SyncLoop<C: Clock> {
    clock: C,
    state: LoopState,
    previous: f64,
    fixed_delta: f32,
    max_substeps: u32,
    stopped: bool,
    ticks: u64,
    last_report: TickReport,
}

impl<C: Clock> SyncLoop<C> {
    /// Loop stepping at 60 Hz with at most 3 catch-up steps per tick
    pub fn new(clock: C) -> Self {
        Self::with_step(clock, FIXED_DT, MAX_SUBSTEPS)
    }

    pub fn with_step(clock: C, fixed_delta: f32, max_substeps: u32) -> Self {
        Self {
            clock,
            state: LoopState::Idle,
            previous: 0.0,
            fixed_delta,
            max_substeps,
            stopped: false,
            ticks: 0,
            last_report: TickReport::default(),
        }
    }

    /// Run one frame against the sandbox
    pub fn tick<S: SceneGraph, A: ImpactSound>(
        &mut self,
        sandbox: &mut Sandbox<S, A>,
    ) -> LoopControl {
        if self.stopped {
            return LoopControl::Stop;
        }

        let now = self.clock.elapsed();
        let delta = match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                log::debug!("Sync loop started at {:.3}s", now);
                0.0
            }
            LoopState::Running => (now - self.previous) as f32,
        };
        self.previous = now;

        let actions = sandbox.apply_pending();
        let outcome = sandbox.step(self.fixed_delta, delta, self.max_substeps);
        let synced = sandbox.sync_poses();

        self.ticks += 1;
        self.last_report = TickReport {
            delta,
            actions,
            steps: outcome.steps,
            synced,
            sounds: outcome.sounds,
        };
        log::trace!("Tick {}: {:?}", self.ticks, self.last_report);
        LoopControl::Continue
    }

    /// Halt the loop; later ticks do nothing and return `Stop`
    pub fn stop(&mut self) {
        if !self.stopped {
            log::info!("Sync loop stopped after {} ticks", self.ticks);
        }
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingSound;
    use crate::sandbox::ControlAction;
    use crate::scene::MemoryScene;
    use crate::settings::Settings;
    use glam::{Quat, Vec3};

    fn sandbox() -> Sandbox<MemoryScene, RecordingSound> {
        Sandbox::from_settings(&Settings::default(), MemoryScene::new(), RecordingSound::new())
            .unwrap()
    }

    #[test]
    fn test_first_tick_only_starts_the_clock() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sync.clock_mut().set(12.0);
        assert_eq!(sync.state(), LoopState::Idle);

        assert_eq!(sync.tick(&mut sandbox), LoopControl::Continue);
        assert_eq!(sync.state(), LoopState::Running);
        assert_eq!(sync.last_report().delta, 0.0);
        assert_eq!(sync.last_report().steps, 0);
        assert_eq!(sandbox.world().steps(), 0);
    }

    #[test]
    fn test_ticks_advance_simulated_time() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sync.tick(&mut sandbox);
        for _ in 0..120 {
            sync.clock_mut().advance(1.0 / 60.0);
            sync.tick(&mut sandbox);
        }
        let time = sandbox.world().time();
        assert!((time - 2.0).abs() <= 1.0 / 60.0 + 1e-6, "time {time}");
    }

    #[test]
    fn test_long_pause_is_capped() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sync.tick(&mut sandbox);
        sync.clock_mut().advance(30.0);
        sync.tick(&mut sandbox);
        assert_eq!(sync.last_report().steps, MAX_SUBSTEPS);
    }

    #[test]
    fn test_proxy_follows_body_position() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sync.tick(&mut sandbox);
        for _ in 0..20 {
            sync.clock_mut().advance(1.0 / 60.0);
            sync.tick(&mut sandbox);
        }
        let e = *sandbox.pool().iter().next().unwrap();
        let pose = sandbox.world().body_pose(e.body).unwrap();
        let t = sandbox.scene().transform(e.proxy).unwrap();
        assert_eq!(t.position, pose.position);
        assert!(t.position.y < 3.0);
        assert_eq!(sync.last_report().synced, 1);
    }

    #[test]
    fn test_proxy_follows_body_rotation() {
        let mut sandbox = sandbox();
        let e = sandbox
            .spawn_box(0.4, 0.4, 0.4, Vec3::new(1.0, 2.0, 0.0))
            .unwrap();
        let mut body = sandbox.world_mut().remove_body(e.body).unwrap();
        body.pose.orientation = Quat::from_rotation_z(0.3);
        body.angular_velocity = Vec3::new(0.0, 0.0, 4.0);
        assert_eq!(sandbox.world_mut().add_body(body), e.body);

        let mut sync = SyncLoop::new(ManualClock::new());
        sync.tick(&mut sandbox);
        for _ in 0..10 {
            sync.clock_mut().advance(1.0 / 60.0);
            sync.tick(&mut sandbox);
        }
        let pose = sandbox.world().body_pose(e.body).unwrap();
        let t = sandbox.scene().transform(e.proxy).unwrap();
        assert_eq!(t.orientation, pose.orientation);
        assert!(t.orientation.angle_between(Quat::IDENTITY) > 0.1);
    }

    #[test]
    fn test_queued_actions_run_before_stepping() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sandbox.queue(ControlAction::CreateBox);
        sandbox.queue(ControlAction::CreateSphere);
        sync.tick(&mut sandbox);
        assert_eq!(sync.last_report().actions, 2);
        assert_eq!(sandbox.pool().len(), 3);
        assert_eq!(sync.last_report().synced, 3);

        sandbox.queue(ControlAction::Reset);
        sync.clock_mut().advance(1.0 / 60.0);
        sync.tick(&mut sandbox);
        assert!(sandbox.pool().is_empty());
        assert_eq!(sync.last_report().synced, 0);
    }

    #[test]
    fn test_stop_halts_ticking() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sync.tick(&mut sandbox);
        sync.stop();
        assert!(sync.is_stopped());

        sync.clock_mut().advance(1.0);
        assert_eq!(sync.tick(&mut sandbox), LoopControl::Stop);
        assert_eq!(sandbox.world().steps(), 0);
        assert_eq!(sync.ticks(), 1);
    }

    #[test]
    fn test_first_impact_is_heard_once() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(ManualClock::new());
        sync.tick(&mut sandbox);
        let mut sounds = 0;
        for _ in 0..72 {
            sync.clock_mut().advance(1.0 / 60.0);
            sync.tick(&mut sandbox);
            sounds += sync.last_report().sounds;
        }
        assert_eq!(sounds, 1);
        assert_eq!(sandbox.sound().plays.len(), 1);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_system_clock_drives_the_loop() {
        let mut sandbox = sandbox();
        let mut sync = SyncLoop::new(SystemClock::new());
        sync.tick(&mut sandbox);
        std::thread::sleep(std::time::Duration::from_millis(40));
        sync.tick(&mut sandbox);
        assert!(sync.last_report().delta >= 0.04);
        assert!((2..=MAX_SUBSTEPS).contains(&sync.last_report().steps));
    }
}
