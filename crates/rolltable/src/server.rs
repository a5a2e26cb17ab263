//! `HostServer` builder and accept loop.
//!
//! This ties the layers together: WebSocket transport, the host actor
//! around the room dispatcher, and snapshot persistence.

use std::path::PathBuf;
use std::time::Duration;

use rolltable_dice::RandomRoller;
use rolltable_protocol::{ParticipantId, RoomSettings};
use rolltable_room::{FileStore, HostDispatcher, Room, RoomStore, SnapshotStore};
use rolltable_transport::{Connection, Transport, WebSocketTransport};

use crate::RolltableError;
use crate::config::HostConfig;
use crate::handler::handle_connection;
use crate::host::{HostHandle, spawn_host};

/// Builder for configuring and starting a host.
///
/// # Example
///
/// ```rust,no_run
/// use rolltable::prelude::*;
///
/// # async fn start() -> Result<(), RolltableError> {
/// let server = HostServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_name("table1")
///     .host_nick("DM")
///     .data_dir("rolltable-data")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HostServerBuilder {
    config: HostConfig,
    seed: Option<u64>,
}

impl HostServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn room_name(mut self, name: &str) -> Self {
        self.config.room_name = name.to_string();
        self
    }

    pub fn host_nick(mut self, nick: &str) -> Self {
        self.config.host_nick = nick.to_string();
        self
    }

    pub fn host_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.config.host_avatar = Some(avatar.into());
        self
    }

    /// Persists the room under `dir` and restores it from there on start.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    pub fn settings(mut self, settings: RoomSettings) -> Self {
        self.config.settings = settings;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Seeds the dice instead of drawing from the OS. For reproducible
    /// sessions and tests.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener, restores or creates the room, and starts the
    /// host actor.
    pub async fn build(self) -> Result<HostServer, RolltableError> {
        let config = self.config;
        let transport = WebSocketTransport::bind(&config.bind_addr).await?;

        let backend = config.data_dir.as_ref().map(FileStore::new);
        let store = restore_or_create(&config, backend.as_ref());
        let id_offset = highest_peer_number(store.room());

        let roller = match self.seed {
            Some(seed) => RandomRoller::seeded(seed),
            None => RandomRoller::new(),
        };
        let mut dispatcher = HostDispatcher::new(store, roller);
        if let Some(backend) = backend {
            dispatcher = dispatcher.with_persistence(Box::new(backend));
        }

        let handle =
            spawn_host(dispatcher, config.sweep_interval, config.command_buffer);

        Ok(HostServer {
            transport,
            handle,
            id_offset,
        })
    }
}

/// Loads the room snapshot if there is a usable one, else starts fresh.
fn restore_or_create(config: &HostConfig, backend: Option<&FileStore>) -> RoomStore {
    let room_name = config.room_name.as_str();
    let blob = match backend.map(|b| b.load(room_name)) {
        Some(Ok(blob)) => blob,
        Some(Err(e)) => {
            tracing::warn!(room = %room_name, error = %e, "could not read snapshot");
            None
        }
        None => None,
    };

    if let Some(blob) = blob {
        match RoomStore::deserialize(&blob) {
            Some(store) => {
                tracing::info!(
                    room = %room_name,
                    participants = store.room().participant_count(),
                    history = store.room().history().len(),
                    "room restored from snapshot"
                );
                return store;
            }
            None => {
                tracing::warn!(room = %room_name, "snapshot unusable, starting a fresh room");
            }
        }
    }

    let mut store = RoomStore::create(
        room_name,
        config.host_nick.as_str(),
        config.host_avatar.clone(),
    );
    store.update_settings(config.settings);
    tracing::info!(room = %room_name, "room created");
    store
}

/// Largest `n` among restored `peer-<n>` ids.
///
/// Connection numbering restarts with the process, so new ids are shifted
/// past the restored ones. Otherwise a new player could be stored over a
/// disconnected player's record.
fn highest_peer_number(room: &Room) -> u64 {
    room.participants()
        .filter_map(|(id, _)| id.as_str().strip_prefix("peer-")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// A running host.
pub struct HostServer {
    transport: WebSocketTransport,
    handle: HostHandle,
    id_offset: u64,
}

impl HostServer {
    pub fn builder() -> HostServerBuilder {
        HostServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle for host actions and the event feed.
    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Accepts connections and spawns a handler for each. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), RolltableError> {
        tracing::info!("rolltable host running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let id = ParticipantId::new(format!(
                        "peer-{}",
                        conn.id().into_inner() + self.id_offset
                    ));
                    let host = self.handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, id, host).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_peer_number_ignores_other_ids() {
        let mut store = RoomStore::create("t", "DM", None);
        store.add_participant(ParticipantId::new("peer-3"), "A", None);
        store.add_participant(ParticipantId::new("peer-12"), "B", None);
        store.add_participant(ParticipantId::new("custom"), "C", None);
        assert_eq!(highest_peer_number(store.room()), 12);
    }

    #[test]
    fn test_highest_peer_number_empty_room() {
        let store = RoomStore::create("t", "DM", None);
        assert_eq!(highest_peer_number(store.room()), 0);
    }

    #[test]
    fn test_fresh_room_uses_configured_settings() {
        let config = HostConfig {
            room_name: "crypt".into(),
            settings: RoomSettings {
                force_autoclear: true,
                ..RoomSettings::default()
            },
            ..HostConfig::default()
        };
        let store = restore_or_create(&config, None);
        assert_eq!(store.room().room_name(), "crypt");
        assert!(store.room().settings().force_autoclear);
    }
}
