//! Log output for test runs
//!
//! Subsystems log through `bevy::log`. Outside a bevy `App` nothing installs
//! a subscriber, so tests call [`init_test_logging`] to see that output.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

use crate::settings::HarnessSettings;

static INIT: Once = Once::new();

/// Install a subscriber writing through the test harness capture.
///
/// Uses `RUST_LOG` when set, else the harness settings' filter. Only the
/// first call has any effect.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(HarnessSettings::load().log_filter));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
