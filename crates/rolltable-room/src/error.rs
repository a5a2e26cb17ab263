//! Error types for the room layer.

use rolltable_protocol::{ParticipantId, ProtocolError};

/// Errors from [`RoomStore`](crate::RoomStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No participant is registered under this id.
    #[error("participant {0} not found")]
    UnknownParticipant(ParticipantId),

    /// The room could not be written as a snapshot.
    #[error("failed to serialize room snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Errors from a [`SnapshotStore`](crate::SnapshotStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The room name has nothing left after sanitising.
    #[error("room name {0:?} cannot be used as a snapshot key")]
    InvalidKey(String),
}

/// Errors returned to the host from its own actions.
///
/// Player-originated problems never surface here: those are either
/// answered with a rejection message or dropped.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The nickname belongs to a connected participant.
    #[error("nickname {0:?} is already in use")]
    NicknameTaken(String),

    #[error(transparent)]
    Invalid(#[from] ProtocolError),
}
