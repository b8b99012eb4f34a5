//! Networking without sockets

pub mod mode;
pub mod system;

pub use mode::NetworkMode;
pub use system::{
    ClientId, MessageTarget, NetworkError, NetworkMessage, NetworkSystem, NetworkSystemImpl,
};
