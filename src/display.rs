//! Display device capability

use bevy::math::UVec2;

pub trait DisplayDevice: Send + Sync {
    fn is_headless(&self) -> bool;

    fn has_focus(&self) -> bool;

    /// Framebuffer size in pixels
    fn resolution(&self) -> UVec2;

    /// Whether a close was requested by the window system
    fn is_close_requested(&self) -> bool;
}

/// Display stand-in with no window behind it
#[derive(Debug, Clone)]
pub struct HeadlessDisplayDevice {
    resolution: UVec2,
}

impl HeadlessDisplayDevice {
    pub fn new() -> Self {
        Self {
            resolution: UVec2::new(1280, 720),
        }
    }
}

impl Default for HeadlessDisplayDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayDevice for HeadlessDisplayDevice {
    fn is_headless(&self) -> bool {
        true
    }

    fn has_focus(&self) -> bool {
        false
    }

    fn resolution(&self) -> UVec2 {
        self.resolution
    }

    fn is_close_requested(&self) -> bool {
        false
    }
}
