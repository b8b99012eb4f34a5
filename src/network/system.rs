//! In-process network coordinator
//!
//! Routes messages between the authority and named virtual clients without
//! opening sockets. Message timestamps come from the injected clock, so with
//! a mock clock routing is fully deterministic.

use bevy::log::{debug, info};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::NetworkMode;
use crate::config::Config;
use crate::context::Context;
use crate::time::Time;

/// Identifier of a connected virtual client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

/// Recipients of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Server,
    Client(ClientId),
    Broadcast,
}

/// A delivered message
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMessage {
    pub channel: String,
    pub payload: Vec<u8>,
    /// Game time when sent
    pub sent_at_ms: u64,
    /// `None` when sent by the authority
    pub from: Option<ClientId>,
}

#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("operation requires authority, mode is {0:?}")]
    NotAuthority(NetworkMode),

    #[error("only a server accepts clients, mode is {0:?}")]
    NotServer(NetworkMode),

    #[error("server is full ({0} clients)")]
    ServerFull(usize),

    #[error("unknown client {0:?}")]
    UnknownClient(ClientId),

    #[error("network system is shut down")]
    Shutdown,
}

/// Network capability
pub trait NetworkSystem: Send + Sync {
    fn mode(&self) -> NetworkMode;

    /// Connect a virtual client; only a listen or dedicated server accepts clients
    fn connect_client(&self, name: &str) -> Result<ClientId, NetworkError>;

    fn disconnect_client(&self, client: ClientId) -> bool;

    /// Connected clients with their names
    fn clients(&self) -> Vec<(ClientId, String)>;

    /// Send from the local side; returns how many inboxes received it
    fn send(&self, target: MessageTarget, channel: &str, payload: &[u8]) -> Result<usize, NetworkError>;

    /// Send from a virtual client to the authority
    fn send_from_client(&self, client: ClientId, channel: &str, payload: &[u8]) -> Result<(), NetworkError>;

    fn drain_server_inbox(&self) -> Vec<NetworkMessage>;

    fn drain_client_inbox(&self, client: ClientId) -> Result<Vec<NetworkMessage>, NetworkError>;

    /// Drop all clients and refuse further traffic
    fn shutdown(&self);
}

struct VirtualClient {
    name: String,
    inbox: Vec<NetworkMessage>,
}

struct NetworkState {
    mode: NetworkMode,
    running: bool,
    next_client: u32,
    clients: BTreeMap<ClientId, VirtualClient>,
    server_inbox: Vec<NetworkMessage>,
}

/// Default network coordinator
pub struct NetworkSystemImpl {
    time: Arc<dyn Time>,
    max_clients: usize,
    state: Mutex<NetworkState>,
}

impl NetworkSystemImpl {
    /// Bind to a clock; limits come from the registered `Config` if present
    pub fn new(time: Arc<dyn Time>, context: &Context) -> Self {
        let max_clients = match context.get::<Config>() {
            Ok(config) => config.network.max_clients,
            Err(_) => {
                debug!("No Config registered, using default network limits");
                Config::default().network.max_clients
            }
        };
        Self {
            time,
            max_clients,
            state: Mutex::new(NetworkState {
                mode: NetworkMode::None,
                running: true,
                next_client: 1,
                clients: BTreeMap::new(),
                server_inbox: Vec::new(),
            }),
        }
    }

    /// Switch run mode; existing clients are kept only while serving
    pub fn set_mode(&self, mode: NetworkMode) {
        let mut state = self.lock();
        if !mode.is_server() {
            state.clients.clear();
        }
        info!("Network mode {:?} -> {:?}", state.mode, mode);
        state.mode = mode;
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        // A poisoned lock only means a test panicked mid-send; the queues
        // are still structurally valid.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn message(&self, channel: &str, payload: &[u8], from: Option<ClientId>) -> NetworkMessage {
        NetworkMessage {
            channel: channel.to_string(),
            payload: payload.to_vec(),
            sent_at_ms: self.time.game_time_ms(),
            from,
        }
    }
}

impl NetworkSystem for NetworkSystemImpl {
    fn mode(&self) -> NetworkMode {
        self.lock().mode
    }

    fn connect_client(&self, name: &str) -> Result<ClientId, NetworkError> {
        let mut state = self.lock();
        if !state.running {
            return Err(NetworkError::Shutdown);
        }
        if !state.mode.is_server() {
            return Err(NetworkError::NotServer(state.mode));
        }
        if state.clients.len() >= self.max_clients {
            return Err(NetworkError::ServerFull(self.max_clients));
        }
        let id = ClientId(state.next_client);
        state.next_client += 1;
        state.clients.insert(
            id,
            VirtualClient {
                name: name.to_string(),
                inbox: Vec::new(),
            },
        );
        debug!("Client {:?} ({}) connected", id, name);
        Ok(id)
    }

    fn disconnect_client(&self, client: ClientId) -> bool {
        self.lock().clients.remove(&client).is_some()
    }

    fn clients(&self) -> Vec<(ClientId, String)> {
        self.lock()
            .clients
            .iter()
            .map(|(id, client)| (*id, client.name.clone()))
            .collect()
    }

    fn send(&self, target: MessageTarget, channel: &str, payload: &[u8]) -> Result<usize, NetworkError> {
        let message = self.message(channel, payload, None);
        let mut state = self.lock();
        if !state.running {
            return Err(NetworkError::Shutdown);
        }
        match target {
            MessageTarget::Server => {
                state.server_inbox.push(message);
                Ok(1)
            }
            _ if !state.mode.is_authority() => Err(NetworkError::NotAuthority(state.mode)),
            MessageTarget::Client(id) => {
                let client = state
                    .clients
                    .get_mut(&id)
                    .ok_or(NetworkError::UnknownClient(id))?;
                client.inbox.push(message);
                Ok(1)
            }
            MessageTarget::Broadcast => {
                for client in state.clients.values_mut() {
                    client.inbox.push(message.clone());
                }
                Ok(state.clients.len())
            }
        }
    }

    fn send_from_client(&self, client: ClientId, channel: &str, payload: &[u8]) -> Result<(), NetworkError> {
        let message = self.message(channel, payload, Some(client));
        let mut state = self.lock();
        if !state.running {
            return Err(NetworkError::Shutdown);
        }
        if !state.clients.contains_key(&client) {
            return Err(NetworkError::UnknownClient(client));
        }
        state.server_inbox.push(message);
        Ok(())
    }

    fn drain_server_inbox(&self) -> Vec<NetworkMessage> {
        std::mem::take(&mut self.lock().server_inbox)
    }

    fn drain_client_inbox(&self, client: ClientId) -> Result<Vec<NetworkMessage>, NetworkError> {
        let mut state = self.lock();
        let entry = state
            .clients
            .get_mut(&client)
            .ok_or(NetworkError::UnknownClient(client))?;
        Ok(std::mem::take(&mut entry.inbox))
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        state.running = false;
        state.clients.clear();
        state.server_inbox.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockTime;

    fn network() -> (Arc<MockTime>, NetworkSystemImpl) {
        let time = Arc::new(MockTime::new());
        let mut context = Context::new();
        let mut config = Config::default();
        config.network.max_clients = 2;
        context.put_value(config);
        let network = NetworkSystemImpl::new(time.clone(), &context);
        (time, network)
    }

    fn server() -> (Arc<MockTime>, NetworkSystemImpl) {
        let (time, network) = network();
        network.set_mode(NetworkMode::ListenServer);
        (time, network)
    }

    #[test]
    fn test_defaults_to_none_mode() {
        let (_, network) = network();
        assert_eq!(network.mode(), NetworkMode::None);
    }

    #[test]
    fn test_broadcast_reaches_every_client() {
        let (time, network) = server();
        let a = network.connect_client("a").unwrap();
        let b = network.connect_client("b").unwrap();
        time.advance(40);

        assert_eq!(network.send(MessageTarget::Broadcast, "chat", b"hi").unwrap(), 2);

        let inbox = network.drain_client_inbox(a).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sent_at_ms, 40);
        assert_eq!(inbox[0].from, None);
        assert_eq!(network.drain_client_inbox(b).unwrap().len(), 1);
        assert!(network.drain_client_inbox(a).unwrap().is_empty());
    }

    #[test]
    fn test_client_to_server() {
        let (_, network) = server();
        let a = network.connect_client("a").unwrap();
        network.send_from_client(a, "input", &[1, 2, 3]).unwrap();

        let inbox = network.drain_server_inbox();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].from, Some(a));
        assert_eq!(inbox[0].payload, vec![1, 2, 3]);
    }

    #[test]
    fn test_max_clients_from_config() {
        let (_, network) = server();
        network.connect_client("a").unwrap();
        network.connect_client("b").unwrap();
        assert_eq!(network.connect_client("c"), Err(NetworkError::ServerFull(2)));
    }

    #[test]
    fn test_client_mode_is_not_authority() {
        let (_, network) = server();
        network.connect_client("a").unwrap();
        network.set_mode(NetworkMode::Client);
        assert!(network.clients().is_empty());
        assert_eq!(
            network.send(MessageTarget::Broadcast, "chat", b""),
            Err(NetworkError::NotAuthority(NetworkMode::Client))
        );
        assert_eq!(network.send(MessageTarget::Server, "chat", b"").unwrap(), 1);
    }

    #[test]
    fn test_single_player_refuses_clients() {
        let (_, network) = network();
        assert_eq!(
            network.connect_client("a"),
            Err(NetworkError::NotServer(NetworkMode::None))
        );

        let (_, network) = server();
        network.connect_client("a").unwrap();
        network.set_mode(NetworkMode::None);
        assert!(network.clients().is_empty());
        assert_eq!(network.send(MessageTarget::Broadcast, "chat", b"").unwrap(), 0);
    }

    #[test]
    fn test_shutdown_refuses_traffic() {
        let (_, network) = network();
        network.shutdown();
        assert_eq!(network.connect_client("a"), Err(NetworkError::Shutdown));
        assert_eq!(
            network.send(MessageTarget::Server, "x", b""),
            Err(NetworkError::Shutdown)
        );
    }
}
