//! Impact sound output
//!
//! One shared sound handle: every audible hit sets its volume, rewinds it and
//! plays it again, so the most recent impact wins.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio device unavailable")]
    Unavailable,
    #[error("playback rejected: {0}")]
    Rejected(String),
}

/// A single playable sound
pub trait ImpactSound {
    /// Volume in [0, 1]
    fn set_volume(&mut self, volume: f32);

    /// Seek back to the start
    fn rewind(&mut self);

    /// Start playback without waiting for it to finish
    fn play(&mut self) -> Result<(), AudioError>;

    /// Set volume, rewind and play; failures are logged and dropped
    fn trigger(&mut self, volume: f32) -> bool {
        self.set_volume(volume.clamp(0.0, 1.0));
        self.rewind();
        match self.play() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Impact sound failed: {}", e);
                false
            }
        }
    }
}

impl<T: ImpactSound + ?Sized> ImpactSound for Box<T> {
    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn rewind(&mut self) {
        (**self).rewind();
    }

    fn play(&mut self) -> Result<(), AudioError> {
        (**self).play()
    }
}

/// No audio device: plays nothing, logs at trace level
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSound {
    volume: f32,
}

impl ImpactSound for SilentSound {
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn rewind(&mut self) {}

    fn play(&mut self) -> Result<(), AudioError> {
        log::trace!("hit (volume {:.2})", self.volume);
        Ok(())
    }
}

/// Keeps the volume of every playback; can be told to fail
#[derive(Debug, Default, Clone)]
pub struct RecordingSound {
    /// Volume of each successful playback, in order
    pub plays: Vec<f32>,
    pub rewinds: usize,
    pub fail: bool,
    volume: f32,
}

impl RecordingSound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every playback attempt fails with `AudioError::Unavailable`
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl ImpactSound for RecordingSound {
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn rewind(&mut self) {
        self.rewinds += 1;
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.fail {
            return Err(AudioError::Unavailable);
        }
        self.plays.push(self.volume);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::HtmlHitSound;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlAudioElement;

    use super::{AudioError, ImpactSound};

    /// Hit sound backed by an `<audio>` element
    pub struct HtmlHitSound {
        element: HtmlAudioElement,
    }

    impl HtmlHitSound {
        pub fn new(src: &str) -> Result<Self, AudioError> {
            let element = HtmlAudioElement::new_with_src(src)
                .map_err(|e| AudioError::Rejected(format!("{:?}", e)))?;
            Ok(Self { element })
        }
    }

    impl ImpactSound for HtmlHitSound {
        fn set_volume(&mut self, volume: f32) {
            self.element.set_volume(f64::from(volume));
        }

        fn rewind(&mut self) {
            self.element.set_current_time(0.0);
        }

        fn play(&mut self) -> Result<(), AudioError> {
            let promise = self
                .element
                .play()
                .map_err(|e| AudioError::Rejected(format!("{:?}", e)))?;
            // Autoplay policies reject the promise until the user interacts
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("Hit sound playback rejected: {:?}", e);
                }
            });
            Ok(())
        }
    }
}
