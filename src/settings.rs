//! Sandbox settings
//!
//! JSON on disk for the native runner, LocalStorage in the browser. Missing
//! fields fall back to the defaults, which reproduce the classic "balls and
//! boxes on a floor" scene.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::gate::ImpactGate;
use crate::physics::{Broadphase, ContactMaterial, SurfaceMaterial};

/// Random spawn policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Random sphere radius range [min, max)
    pub min_radius: f32,
    pub max_radius: f32,
    /// Random box edge range [min, max), drawn per axis
    pub min_extent: f32,
    pub max_extent: f32,
    /// Horizontal positions are drawn from [-spread, spread)
    pub spread: f32,
    /// Vertical position of random spawns
    pub drop_height: f32,
    /// Mass of every spawned body
    pub mass: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            min_radius: 0.05,
            max_radius: 0.5,
            min_extent: 0.05,
            max_extent: 1.0,
            spread: SPAWN_SPREAD,
            drop_height: DROP_HEIGHT,
            mass: SPAWN_MASS,
        }
    }
}

/// Sandbox configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    pub gravity: Vec3,
    pub broadphase: Broadphase,
    pub sleep_enabled: bool,
    /// Default contact material (self-paired)
    pub friction: f32,
    pub restitution: f32,

    // === Stepping ===
    pub fixed_delta: f32,
    pub max_substeps: u32,

    // === Audio ===
    pub impact: ImpactGate,
    pub hit_sound_url: String,

    // === Scene ===
    /// Add the static floor (plane body + floor proxy)
    pub floor: bool,
    /// Drop one sphere of radius 0.5 at (0, 3, 0) on startup
    pub initial_sphere: bool,
    pub spawn: SpawnSettings,
    /// RNG seed for random spawns
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, GRAVITY_Y, 0.0),
            broadphase: Broadphase::SweepAndPrune,
            sleep_enabled: true,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,

            fixed_delta: FIXED_DT,
            max_substeps: MAX_SUBSTEPS,

            impact: ImpactGate::default(),
            hit_sound_url: "/sounds/hit.mp3".to_string(),

            floor: true,
            initial_sphere: true,
            spawn: SpawnSettings::default(),
            seed: 0,
        }
    }
}

impl Settings {
    /// Parse JSON settings and sanitize them
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp values the world cannot run with back into range
    pub fn validated(mut self) -> Self {
        if !self.gravity.is_finite() {
            log::warn!("Non-finite gravity {:?}, using default", self.gravity);
            self.gravity = Vec3::new(0.0, GRAVITY_Y, 0.0);
        }
        if !self.friction.is_finite() || self.friction < 0.0 {
            self.friction = 0.0;
        }
        if !self.restitution.is_finite() {
            self.restitution = DEFAULT_RESTITUTION;
        }
        self.restitution = self.restitution.clamp(0.0, 1.0);
        if !self.fixed_delta.is_finite() || self.fixed_delta <= 0.0 {
            log::warn!("Invalid fixed delta {}, using 1/60", self.fixed_delta);
            self.fixed_delta = FIXED_DT;
        }
        self.max_substeps = self.max_substeps.max(1);

        let gate = ImpactGate::default();
        if !(self.impact.threshold.is_finite() && self.impact.threshold >= 0.0) {
            log::warn!("Invalid impact threshold {}, using default", self.impact.threshold);
            self.impact.threshold = gate.threshold;
        }
        if !(self.impact.volume_divisor.is_finite() && self.impact.volume_divisor > 0.0) {
            log::warn!("Invalid volume divisor {}, using default", self.impact.volume_divisor);
            self.impact.volume_divisor = gate.volume_divisor;
        }

        let spawn = &mut self.spawn;
        let defaults = SpawnSettings::default();
        if !(spawn.min_radius > 0.0
            && spawn.max_radius > spawn.min_radius
            && spawn.max_radius.is_finite())
        {
            spawn.min_radius = defaults.min_radius;
            spawn.max_radius = defaults.max_radius;
        }
        if !(spawn.min_extent > 0.0
            && spawn.max_extent > spawn.min_extent
            && spawn.max_extent.is_finite())
        {
            spawn.min_extent = defaults.min_extent;
            spawn.max_extent = defaults.max_extent;
        }
        if !(spawn.spread >= 0.0 && spawn.spread <= MAX_SPAWN_SPREAD) {
            log::warn!("Spawn spread {} out of range, using default", spawn.spread);
            spawn.spread = defaults.spread;
        }
        if !spawn.drop_height.is_finite() {
            spawn.drop_height = defaults.drop_height;
        }
        if !(spawn.mass > 0.0 && spawn.mass.is_finite()) {
            spawn.mass = defaults.mass;
        }
        self
    }

    pub fn default_contact_material(&self) -> ContactMaterial {
        ContactMaterial::self_paired(SurfaceMaterial::default(), self.friction, self.restitution)
    }

    /// Read settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "physics_playground_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scene() {
        let s = Settings::default();
        assert_eq!(s.gravity, Vec3::new(0.0, -9.82, 0.0));
        assert_eq!(s.broadphase, Broadphase::SweepAndPrune);
        assert!(s.sleep_enabled);
        assert_eq!(s.friction, 0.1);
        assert_eq!(s.restitution, 0.7);
        assert_eq!(s.max_substeps, 3);
        assert_eq!(s.impact.threshold, 1.5);
        assert_eq!(s.impact.volume_divisor, 4.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{ "restitution": 0.3, "spawn": { "drop_height": 5.0 } }"#)
            .unwrap();
        assert_eq!(s.restitution, 0.3);
        assert_eq!(s.friction, DEFAULT_FRICTION);
        assert_eq!(s.spawn.drop_height, 5.0);
        assert_eq!(s.spawn.max_radius, 0.5);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let s = Settings::from_json(
            r#"{ "friction": -2.0, "restitution": 3.0, "fixed_delta": 0.0, "max_substeps": 0,
                 "spawn": { "min_radius": 0.5, "max_radius": 0.1, "mass": -1.0 } }"#,
        )
        .unwrap();
        assert_eq!(s.friction, 0.0);
        assert_eq!(s.restitution, 1.0);
        assert_eq!(s.fixed_delta, FIXED_DT);
        assert_eq!(s.max_substeps, 1);
        assert_eq!(s.spawn.min_radius, 0.05);
        assert_eq!(s.spawn.max_radius, 0.5);
        assert_eq!(s.spawn.mass, SPAWN_MASS);
    }

    #[test]
    fn test_broadphase_names() {
        let s = Settings::from_json(r#"{ "broadphase": "Naive" }"#).unwrap();
        assert_eq!(s.broadphase, Broadphase::Naive);
        assert!(Settings::from_json(r#"{ "broadphase": "Grid" }"#).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let s = Settings {
            seed: 7,
            ..Settings::default()
        };
        assert_eq!(Settings::from_json(&s.to_json().unwrap()).unwrap(), s);
    }

    #[test]
    fn test_huge_spread_is_rejected() {
        let s = Settings::from_json(r#"{ "spawn": { "spread": 3e38 } }"#).unwrap();
        assert_eq!(s.spawn.spread, SPAWN_SPREAD);

        let s = Settings::from_json(r#"{ "spawn": { "spread": 20.0 } }"#).unwrap();
        assert_eq!(s.spawn.spread, 20.0);
    }

    #[test]
    fn test_broken_impact_gate_is_restored() {
        let s = Settings {
            impact: ImpactGate::new(f32::NAN, 0.0),
            ..Settings::default()
        }
        .validated();
        assert_eq!(s.impact, ImpactGate::default());

        let s = Settings::from_json(r#"{ "impact": { "threshold": -1.0, "volume_divisor": -4.0 } }"#)
            .unwrap();
        assert_eq!(s.impact, ImpactGate::default());

        let s = Settings::from_json(r#"{ "impact": { "threshold": 0.5 } }"#).unwrap();
        assert_eq!(s.impact.threshold, 0.5);
        assert_eq!(s.impact.volume_divisor, IMPACT_VOLUME_DIVISOR);
    }
}
