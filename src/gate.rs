//! Impact sound gating
//!
//! A resting body keeps producing tiny contacts while it settles. Only hits
//! faster than the threshold are audible, and louder hits play louder.

use serde::{Deserialize, Serialize};

use crate::consts::{IMPACT_SOUND_THRESHOLD, IMPACT_VOLUME_DIVISOR};

/// Returns true iff the impact is strictly faster than the default threshold
#[inline]
pub fn should_play_impact_sound(impact_speed: f32) -> bool {
    ImpactGate::default().should_play(impact_speed)
}

/// Playback volume for an impact, `min(1, speed / 4)` clamped to [0, 1]
#[inline]
pub fn impact_volume(impact_speed: f32) -> f32 {
    ImpactGate::default().volume(impact_speed)
}

/// Tunable threshold and volume mapping for impact sounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactGate {
    /// Minimum impact speed (exclusive) that triggers a sound
    pub threshold: f32,
    /// Impact speed that reaches full volume
    pub volume_divisor: f32,
}

impl Default for ImpactGate {
    fn default() -> Self {
        Self {
            threshold: IMPACT_SOUND_THRESHOLD,
            volume_divisor: IMPACT_VOLUME_DIVISOR,
        }
    }
}

impl ImpactGate {
    pub fn new(threshold: f32, volume_divisor: f32) -> Self {
        Self {
            threshold,
            volume_divisor,
        }
    }

    /// NaN never passes the gate
    #[inline]
    pub fn should_play(&self, impact_speed: f32) -> bool {
        impact_speed > self.threshold
    }

    #[inline]
    pub fn volume(&self, impact_speed: f32) -> f32 {
        if !impact_speed.is_finite() || self.volume_divisor <= 0.0 {
            return if impact_speed > 0.0 { 1.0 } else { 0.0 };
        }
        (impact_speed / self.volume_divisor).clamp(0.0, 1.0)
    }

    /// Volume to play at, or None when the impact is too soft
    pub fn evaluate(&self, impact_speed: f32) -> Option<f32> {
        self.should_play(impact_speed)
            .then(|| self.volume(impact_speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!should_play_impact_sound(1.5));
        assert!(should_play_impact_sound(1.5001));
        assert!(!should_play_impact_sound(0.0));
        assert!(!should_play_impact_sound(f32::NAN));
    }

    #[test]
    fn test_reference_volumes() {
        assert_eq!(impact_volume(2.0), 0.5);
        assert_eq!(impact_volume(4.0), 1.0);
        assert_eq!(impact_volume(8.0), 1.0);
        assert_eq!(impact_volume(0.0), 0.0);
    }

    #[test]
    fn test_evaluate_combines_gate_and_volume() {
        let gate = ImpactGate::default();
        assert_eq!(gate.evaluate(1.0), None);
        assert_eq!(gate.evaluate(3.0), Some(0.75));
        assert_eq!(gate.evaluate(f32::INFINITY), Some(1.0));
    }

    #[test]
    fn test_custom_gate() {
        let gate = ImpactGate::new(0.5, 2.0);
        assert!(gate.should_play(0.6));
        assert_eq!(gate.volume(1.0), 0.5);
    }

    proptest! {
        #[test]
        fn soft_impacts_are_silent(v in 0.0f32..=1.5) {
            prop_assert!(!should_play_impact_sound(v));
        }

        #[test]
        fn hard_impacts_are_audible(v in 1.5001f32..1000.0) {
            prop_assert!(should_play_impact_sound(v));
        }

        #[test]
        fn volume_is_clamped_and_monotonic(a in 0.0f32..100.0, b in 0.0f32..100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (vlo, vhi) = (impact_volume(lo), impact_volume(hi));
            prop_assert!((0.0..=1.0).contains(&vlo));
            prop_assert!((0.0..=1.0).contains(&vhi));
            prop_assert!(vlo <= vhi);
            prop_assert!((vlo - (lo / 4.0).min(1.0)).abs() < 1e-6);
        }
    }
}
