//! Collision listener table
//!
//! Instead of a callback per body, bodies that should make a sound on impact
//! are registered here by identifier. Contact events for unregistered bodies
//! are ignored, so a body removed from the table can never trigger a stale
//! callback.

use std::collections::HashSet;

use crate::audio::ImpactSound;
use crate::gate::ImpactGate;
use crate::physics::{BodyId, ContactEvent};

#[derive(Debug, Default, Clone)]
pub struct ImpactListeners {
    bodies: HashSet<BodyId>,
}

impl ImpactListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body; attaching twice keeps a single registration
    pub fn attach(&mut self, body: BodyId) -> bool {
        self.bodies.insert(body)
    }

    pub fn detach(&mut self, body: BodyId) -> bool {
        self.bodies.remove(&body)
    }

    pub fn is_attached(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Play the sound for every audible event addressed to a registered body.
    ///
    /// Returns how many playbacks were triggered.
    pub fn dispatch(
        &self,
        events: &[ContactEvent],
        gate: &ImpactGate,
        sound: &mut dyn ImpactSound,
    ) -> usize {
        let mut played = 0;
        for event in events {
            if !self.is_attached(event.body) {
                continue;
            }
            if let Some(volume) = gate.evaluate(event.impact_speed) {
                log::debug!(
                    "Impact {:?} -> {:?} at {:.2} m/s (volume {:.2})",
                    event.body,
                    event.other,
                    event.impact_speed,
                    volume
                );
                if sound.trigger(volume) {
                    played += 1;
                }
            }
        }
        played
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingSound;
    use glam::Vec3;

    fn hit(body: u64, speed: f32) -> ContactEvent {
        ContactEvent {
            body: BodyId(body),
            other: BodyId(0),
            impact_speed: speed,
            normal: Vec3::Y,
        }
    }

    #[test]
    fn test_dispatch_filters_by_registration_and_gate() {
        let mut listeners = ImpactListeners::new();
        listeners.attach(BodyId(1));
        let mut sound = RecordingSound::new();

        let events = [hit(1, 2.0), hit(1, 1.0), hit(2, 8.0)];
        let played = listeners.dispatch(&events, &ImpactGate::default(), &mut sound);

        assert_eq!(played, 1);
        assert_eq!(sound.plays, vec![0.5]);
    }

    #[test]
    fn test_double_attach_does_not_double_play() {
        let mut listeners = ImpactListeners::new();
        assert!(listeners.attach(BodyId(1)));
        assert!(!listeners.attach(BodyId(1)));
        let mut sound = RecordingSound::new();
        listeners.dispatch(&[hit(1, 4.0)], &ImpactGate::default(), &mut sound);
        assert_eq!(sound.plays.len(), 1);
    }

    #[test]
    fn test_detached_body_is_silent() {
        let mut listeners = ImpactListeners::new();
        listeners.attach(BodyId(3));
        assert!(listeners.detach(BodyId(3)));
        assert!(!listeners.detach(BodyId(3)));
        let mut sound = RecordingSound::new();
        assert_eq!(
            listeners.dispatch(&[hit(3, 5.0)], &ImpactGate::default(), &mut sound),
            0
        );
    }

    #[test]
    fn test_failed_playback_is_not_counted() {
        let mut listeners = ImpactListeners::new();
        listeners.attach(BodyId(1));
        let mut sound = RecordingSound::failing();
        assert_eq!(
            listeners.dispatch(&[hit(1, 5.0)], &ImpactGate::default(), &mut sound),
            0
        );
    }
}
