//! Host actor: the one Tokio task that owns the room.
//!
//! Connection handlers and the host console never touch the dispatcher
//! directly. They send [`HostCommand`]s through a [`HostHandle`]; the actor
//! applies them one at a time, so the room has exactly one writer. Outbound
//! messages are encoded once and fanned out over per-peer unbounded
//! channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rolltable_dice::DiceRoller;
use rolltable_protocol::{
    Codec, DiceRequest, JsonCodec, ParticipantId, RoomSettings, ServerMessage,
    Visibility,
};
use rolltable_room::{
    DispatchError, HostDispatcher, Outbound, Recipient, Room, now_millis,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::RolltableError;

/// What a connection handler receives from the actor.
#[derive(Debug, Clone)]
pub(crate) enum PeerOutbound {
    /// An encoded frame to send as is.
    Frame(Arc<[u8]>),
    /// Close the connection.
    Close,
}

pub(crate) type PeerSender = mpsc::UnboundedSender<PeerOutbound>;

/// Capacity of the host event feed. Slow subscribers miss old events
/// rather than holding up the room.
const EVENT_FEED_CAPACITY: usize = 256;

/// Commands accepted by the host actor.
pub(crate) enum HostCommand {
    Connected {
        id: ParticipantId,
        sender: PeerSender,
    },
    Disconnected {
        id: ParticipantId,
    },
    Frame {
        id: ParticipantId,
        data: Vec<u8>,
    },
    DmRoll {
        dice: Vec<DiceRequest>,
        visibility: Visibility,
        targets: Vec<ParticipantId>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    Kick {
        id: ParticipantId,
    },
    ClearParticipantTable {
        id: ParticipantId,
    },
    ClearAllTables,
    ClearHostTable,
    ClearHistory,
    UpdateHostProfile {
        nick: String,
        avatar: Option<String>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    SetHostAutoclear {
        enabled: bool,
    },
    UpdateSettings {
        settings: RoomSettings,
    },
    GetRoom {
        reply: oneshot::Sender<HostSnapshot>,
    },
    Shutdown,
}

/// The authoritative room plus host-only state, as seen by the host UI.
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    pub room: Room,
    pub host_autoclear: bool,
}

/// Cloneable handle to the running host actor.
#[derive(Clone)]
pub struct HostHandle {
    sender: mpsc::Sender<HostCommand>,
    events: broadcast::Sender<ServerMessage>,
}

impl HostHandle {
    async fn send(&self, cmd: HostCommand) -> Result<(), RolltableError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RolltableError::HostUnavailable)
    }

    pub(crate) async fn connected(
        &self,
        id: ParticipantId,
        sender: PeerSender,
    ) -> Result<(), RolltableError> {
        self.send(HostCommand::Connected { id, sender }).await
    }

    pub(crate) async fn disconnected(
        &self,
        id: ParticipantId,
    ) -> Result<(), RolltableError> {
        self.send(HostCommand::Disconnected { id }).await
    }

    pub(crate) async fn frame(
        &self,
        id: ParticipantId,
        data: Vec<u8>,
    ) -> Result<(), RolltableError> {
        self.send(HostCommand::Frame { id, data }).await
    }

    /// Every message broadcast to the room, plus results of private and
    /// targeted rolls. This is the host's own view of the session.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    /// Rolls on the host table and waits for the result to be routed.
    pub async fn dm_roll(
        &self,
        dice: Vec<DiceRequest>,
        visibility: Visibility,
        targets: Vec<ParticipantId>,
    ) -> Result<(), RolltableError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::DmRoll {
            dice,
            visibility,
            targets,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RolltableError::HostUnavailable)??;
        Ok(())
    }

    pub async fn kick(&self, id: ParticipantId) -> Result<(), RolltableError> {
        self.send(HostCommand::Kick { id }).await
    }

    pub async fn clear_participant_table(
        &self,
        id: ParticipantId,
    ) -> Result<(), RolltableError> {
        self.send(HostCommand::ClearParticipantTable { id }).await
    }

    pub async fn clear_all_tables(&self) -> Result<(), RolltableError> {
        self.send(HostCommand::ClearAllTables).await
    }

    pub async fn clear_host_table(&self) -> Result<(), RolltableError> {
        self.send(HostCommand::ClearHostTable).await
    }

    pub async fn clear_history(&self) -> Result<(), RolltableError> {
        self.send(HostCommand::ClearHistory).await
    }

    /// Fails with [`DispatchError::NicknameTaken`] if a connected player
    /// uses `nick`.
    pub async fn update_host_profile(
        &self,
        nick: String,
        avatar: Option<String>,
    ) -> Result<(), RolltableError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::UpdateHostProfile {
            nick,
            avatar,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RolltableError::HostUnavailable)??;
        Ok(())
    }

    pub async fn set_host_autoclear(
        &self,
        enabled: bool,
    ) -> Result<(), RolltableError> {
        self.send(HostCommand::SetHostAutoclear { enabled }).await
    }

    pub async fn update_settings(
        &self,
        settings: RoomSettings,
    ) -> Result<(), RolltableError> {
        self.send(HostCommand::UpdateSettings { settings }).await
    }

    /// A copy of the authoritative room.
    pub async fn snapshot(&self) -> Result<HostSnapshot, RolltableError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::GetRoom { reply }).await?;
        rx.await.map_err(|_| RolltableError::HostUnavailable)
    }

    /// Stops the actor. Connected peers are closed.
    pub async fn shutdown(&self) -> Result<(), RolltableError> {
        self.send(HostCommand::Shutdown).await
    }
}

/// Actor state. Lives inside the spawned task.
struct HostActor<R: DiceRoller> {
    dispatcher: HostDispatcher<R>,
    codec: JsonCodec,
    /// Every open connection, identified or not.
    peers: HashMap<ParticipantId, PeerSender>,
    events: broadcast::Sender<ServerMessage>,
    receiver: mpsc::Receiver<HostCommand>,
    sweep_interval: Duration,
}

impl<R: DiceRoller> HostActor<R> {
    async fn run(mut self) {
        let room = self.dispatcher.room().room_name().to_string();
        tracing::info!(%room, "host actor started");

        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(HostCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = sweep.tick() => {
                    let out = self.dispatcher.sweep_autoclear(now_millis());
                    self.deliver(out);
                }
            }
        }

        for (_, peer) in self.peers.drain() {
            let _ = peer.send(PeerOutbound::Close);
        }
        tracing::info!(%room, "host actor stopped");
    }

    fn handle(&mut self, cmd: HostCommand) {
        let out = match cmd {
            HostCommand::Connected { id, sender } => {
                self.peers.insert(id.clone(), sender);
                self.dispatcher.on_connected(&id)
            }
            HostCommand::Disconnected { id } => {
                self.peers.remove(&id);
                self.dispatcher.on_disconnected(&id)
            }
            HostCommand::Frame { id, data } => {
                if !self.peers.contains_key(&id) {
                    // Kicked or left; the handler has not noticed yet.
                    return;
                }
                self.dispatcher.handle_frame(&self.codec, &id, &data)
            }
            HostCommand::DmRoll {
                dice,
                visibility,
                targets,
                reply,
            } => match self.dispatcher.dm_roll(&dice, visibility, targets) {
                Ok(out) => {
                    self.deliver(out);
                    let _ = reply.send(Ok(()));
                    return;
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    return;
                }
            },
            HostCommand::Kick { id } => self.dispatcher.kick(&id),
            HostCommand::ClearParticipantTable { id } => {
                self.dispatcher.clear_participant_table(&id)
            }
            HostCommand::ClearAllTables => self.dispatcher.clear_all_tables(),
            HostCommand::ClearHostTable => self.dispatcher.clear_host_table(),
            HostCommand::ClearHistory => self.dispatcher.clear_history(),
            HostCommand::UpdateHostProfile {
                nick,
                avatar,
                reply,
            } => match self.dispatcher.update_host_profile(&nick, avatar) {
                Ok(out) => {
                    self.deliver(out);
                    let _ = reply.send(Ok(()));
                    return;
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                    return;
                }
            },
            HostCommand::SetHostAutoclear { enabled } => {
                self.dispatcher.set_host_autoclear(enabled);
                Vec::new()
            }
            HostCommand::UpdateSettings { settings } => {
                self.dispatcher.update_settings(settings)
            }
            HostCommand::GetRoom { reply } => {
                let _ = reply.send(HostSnapshot {
                    room: self.dispatcher.room().clone(),
                    host_autoclear: self.dispatcher.host_autoclear(),
                });
                Vec::new()
            }
            // Handled by the run loop.
            HostCommand::Shutdown => Vec::new(),
        };
        self.deliver(out);
    }

    /// Sends each outbound item to its recipients. Peers whose channel is
    /// gone are skipped; their disconnect is already on its way.
    fn deliver(&mut self, out: Vec<Outbound>) {
        for item in out {
            match item {
                Outbound::Message { to, msg } => self.route(to, msg),
                Outbound::Disconnect(id) => {
                    if let Some(peer) = self.peers.remove(&id) {
                        let _ = peer.send(PeerOutbound::Close);
                    }
                }
            }
        }
    }

    fn route(&self, to: Recipient, msg: ServerMessage) {
        let frame: Arc<[u8]> = match self.codec.encode(&msg) {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                tracing::error!(kind = msg.kind(), error = %e, "failed to encode message");
                return;
            }
        };

        let to_feed = matches!(
            to,
            Recipient::All | Recipient::AllExcept(_) | Recipient::Host
        );
        match to {
            Recipient::All => {
                for id in self.dispatcher.room().connected_ids() {
                    self.send_to(&id, &frame);
                }
            }
            Recipient::AllExcept(excluded) => {
                for id in self.dispatcher.room().connected_ids() {
                    if id != excluded {
                        self.send_to(&id, &frame);
                    }
                }
            }
            Recipient::Participant(id) => self.send_to(&id, &frame),
            Recipient::Participants(ids) => {
                for id in &ids {
                    self.send_to(id, &frame);
                }
            }
            Recipient::Host => {}
        }
        if to_feed {
            // No subscribers is fine.
            let _ = self.events.send(msg);
        }
    }

    fn send_to(&self, id: &ParticipantId, frame: &Arc<[u8]>) {
        if let Some(peer) = self.peers.get(id) {
            let _ = peer.send(PeerOutbound::Frame(Arc::clone(frame)));
        }
    }
}

/// Spawns the host actor and returns a handle to it.
pub(crate) fn spawn_host<R: DiceRoller>(
    dispatcher: HostDispatcher<R>,
    sweep_interval: Duration,
    channel_size: usize,
) -> HostHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let (events, _) = broadcast::channel(EVENT_FEED_CAPACITY);

    let actor = HostActor {
        dispatcher,
        codec: JsonCodec,
        peers: HashMap::new(),
        events: events.clone(),
        receiver: rx,
        sweep_interval,
    };
    tokio::spawn(actor.run());

    HostHandle { sender: tx, events }
}
