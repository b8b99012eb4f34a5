//! Network run modes

use serde::{Deserialize, Serialize};

/// How the runtime participates in a network session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// Single player: authoritative with a local client
    #[default]
    None,
    /// Hosting with a local player
    ListenServer,
    /// Hosting without a local player
    DedicatedServer,
    /// Connected to a remote authority
    Client,
}

impl NetworkMode {
    /// Whether this side owns the simulation
    pub fn is_authority(self) -> bool {
        !matches!(self, NetworkMode::Client)
    }

    /// Whether a local player (and so rendering/input) exists
    pub fn has_local_client(self) -> bool {
        !matches!(self, NetworkMode::DedicatedServer)
    }

    /// Whether remote clients may connect
    pub fn is_server(self) -> bool {
        matches!(self, NetworkMode::ListenServer | NetworkMode::DedicatedServer)
    }
}
