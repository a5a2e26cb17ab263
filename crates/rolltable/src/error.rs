//! Unified error type for the Rolltable host.

use rolltable_protocol::ProtocolError;
use rolltable_room::{DispatchError, PersistError, RoomError};
use rolltable_transport::TransportError;

/// Top-level error wrapping every crate-specific error, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum RolltableError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A host action was refused.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The host actor has stopped.
    #[error("host is not running")]
    HostUnavailable,
}

#[cfg(test)]
mod tests {
    use rolltable_protocol::ParticipantId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: RolltableError = TransportError::Bind {
            addr: "127.0.0.1:80".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, RolltableError::Transport(_)));
        assert!(err.to_string().contains("127.0.0.1:80"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: RolltableError =
            ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, RolltableError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: RolltableError =
            RoomError::UnknownParticipant(ParticipantId::new("peer-4")).into();
        assert!(matches!(err, RolltableError::Room(_)));
        assert!(err.to_string().contains("peer-4"));
    }

    #[test]
    fn test_from_dispatch_error() {
        let err: RolltableError =
            DispatchError::NicknameTaken("Bob".into()).into();
        assert!(matches!(err, RolltableError::Dispatch(_)));
    }
}
