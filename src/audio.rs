//! Audio capability. Headless runs never produce sound.

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait AudioManager: Send + Sync {
    /// Request playback of a sound asset
    fn play(&self, sound: &str, volume: f32);

    fn stop_all(&self);
}

/// Accepts and discards every request, counting them
#[derive(Debug, Default)]
pub struct NullAudioManager {
    requests: AtomicUsize,
}

impl NullAudioManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback requests received so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl AudioManager for NullAudioManager {
    fn play(&self, _sound: &str, _volume: f32) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn stop_all(&self) {}
}
