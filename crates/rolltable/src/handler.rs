//! Per-connection handler.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. It registers the peer with the host actor, then
//! pumps frames both ways until either side closes:
//!   - inbound frames go to the actor undecoded (the dispatcher decodes);
//!   - outbound frames arrive already encoded on the peer channel.

use rolltable_protocol::ParticipantId;
use rolltable_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::RolltableError;
use crate::host::{HostHandle, PeerOutbound};

/// Drop guard that reports the disconnect to the host when the handler
/// exits, even on an early `?` return.
///
/// `Drop` is synchronous, so the notification is sent from a spawned task.
struct PeerGuard {
    id: ParticipantId,
    host: HostHandle,
}

impl Drop for PeerGuard {
    fn drop(&mut self) {
        let id = self.id.clone();
        let host = self.host.clone();
        tokio::spawn(async move {
            let _ = host.disconnected(id).await;
        });
    }
}

/// Runs one connection from registration to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    id: ParticipantId,
    host: HostHandle,
) -> Result<(), RolltableError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    host.connected(id.clone(), tx).await?;
    let _guard = PeerGuard {
        id: id.clone(),
        host: host.clone(),
    };
    tracing::debug!(participant = %id, "connection registered");

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => host.frame(id.clone(), data).await?,
                Ok(None) => {
                    tracing::info!(participant = %id, "connection closed by peer");
                    break;
                }
                Err(e) => {
                    tracing::debug!(participant = %id, error = %e, "recv error");
                    break;
                }
            },
            outbound = rx.recv() => match outbound {
                Some(PeerOutbound::Frame(frame)) => conn.send(&frame).await?,
                Some(PeerOutbound::Close) | None => {
                    tracing::debug!(participant = %id, "closing connection");
                    let _ = conn.close().await;
                    break;
                }
            },
        }
    }

    // _guard drops here and the host marks the participant offline.
    Ok(())
}
