//! Time sources: the real engine clock and the controllable test clock

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Clock capability every time-aware subsystem reads
pub trait Time: Send + Sync {
    /// Game time in milliseconds (pauses and dilation apply)
    fn game_time_ms(&self) -> u64;

    /// Wall-clock milliseconds since the clock was created
    fn real_time_ms(&self) -> u64;

    /// Length of the last frame, seconds
    fn delta_secs(&self) -> f32;

    fn is_paused(&self) -> bool;

    /// Game-time seconds, for convenience
    fn game_time_secs(&self) -> f32 {
        self.game_time_ms() as f32 / 1000.0
    }
}

/// Real clock backed by `Instant`.
///
/// Game time advances with wall time between `update` calls.
pub struct EngineTime {
    start: Instant,
    state: Mutex<EngineTimeState>,
}

struct EngineTimeState {
    last_real_ms: u64,
    game_time_ms: u64,
    delta_secs: f32,
    paused: bool,
}

impl EngineTime {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Mutex::new(EngineTimeState {
                last_real_ms: 0,
                game_time_ms: 0,
                delta_secs: 0.0,
                paused: false,
            }),
        }
    }

    /// Advance game time by the wall time elapsed since the last update
    pub fn update(&self) {
        let now = self.real_time_ms();
        if let Ok(mut state) = self.state.lock() {
            let elapsed = now.saturating_sub(state.last_real_ms);
            state.last_real_ms = now;
            state.delta_secs = elapsed as f32 / 1000.0;
            if !state.paused {
                state.game_time_ms += elapsed;
            }
        }
    }

    pub fn set_paused(&self, paused: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.paused = paused;
        }
    }
}

impl Default for EngineTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Time for EngineTime {
    fn game_time_ms(&self) -> u64 {
        self.state.lock().map(|s| s.game_time_ms).unwrap_or(0)
    }

    fn real_time_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn delta_secs(&self) -> f32 {
        self.state.lock().map(|s| s.delta_secs).unwrap_or(0.0)
    }

    fn is_paused(&self) -> bool {
        self.state.lock().map(|s| s.paused).unwrap_or(false)
    }
}

/// Test clock. Never moves on its own; tests call [`MockTime::advance`].
#[derive(Default)]
pub struct MockTime {
    game_time_ms: AtomicU64,
    real_time_ms: AtomicU64,
    delta_bits: AtomicU32,
    paused: AtomicBool,
}

impl MockTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `ms`. Real time always advances; game time
    /// only when not paused.
    pub fn advance(&self, ms: u64) {
        self.real_time_ms.fetch_add(ms, Ordering::SeqCst);
        if !self.paused.load(Ordering::SeqCst) {
            self.game_time_ms.fetch_add(ms, Ordering::SeqCst);
        }
        self.delta_bits
            .store((ms as f32 / 1000.0).to_bits(), Ordering::SeqCst);
    }

    /// Jump game time to an absolute value
    pub fn set_game_time_ms(&self, ms: u64) {
        self.game_time_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

impl Time for MockTime {
    fn game_time_ms(&self) -> u64 {
        self.game_time_ms.load(Ordering::SeqCst)
    }

    fn real_time_ms(&self) -> u64 {
        self.real_time_ms.load(Ordering::SeqCst)
    }

    fn delta_secs(&self) -> f32 {
        f32::from_bits(self.delta_bits.load(Ordering::SeqCst))
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_time_starts_at_zero() {
        let time = MockTime::new();
        assert_eq!(time.game_time_ms(), 0);
        assert_eq!(time.real_time_ms(), 0);
        assert_eq!(time.delta_secs(), 0.0);
    }

    #[test]
    fn test_mock_time_advance() {
        let time = MockTime::new();
        time.advance(250);
        time.advance(250);
        assert_eq!(time.game_time_ms(), 500);
        assert_eq!(time.delta_secs(), 0.25);
        assert_eq!(time.game_time_secs(), 0.5);
    }

    #[test]
    fn test_mock_time_pause() {
        let time = MockTime::new();
        time.set_paused(true);
        time.advance(100);
        assert_eq!(time.game_time_ms(), 0);
        assert_eq!(time.real_time_ms(), 100);
        time.set_paused(false);
        time.advance(100);
        assert_eq!(time.game_time_ms(), 100);
    }

    #[test]
    fn test_engine_time_paused_does_not_advance() {
        let time = EngineTime::new();
        time.set_paused(true);
        std::thread::sleep(std::time::Duration::from_millis(5));
        time.update();
        assert_eq!(time.game_time_ms(), 0);
        assert!(time.is_paused());
    }
}
