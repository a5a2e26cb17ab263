//! Transport layer for Rolltable.
//!
//! The host never talks to sockets directly. It accepts [`Connection`]s from
//! a [`Transport`] and exchanges opaque byte frames with them; the protocol
//! crate gives those bytes meaning.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Transport-assigned connection id.
///
/// Unique for the life of the process. Displays as `peer-<n>`, which is
/// also how players are identified to each other until they reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// ## Trait bounds
///
/// - `Send + Sync + 'static`: the accept loop runs inside a spawned Tokio
///   task for as long as the host is up, so the transport must own all its
///   state and be movable across threads.
/// - `type Connection`: each transport names its own connection type.
///   The host stays generic over where bytes come from; only
///   `WebSocketTransport` exists today.
/// - `type Error`: implementation-specific, but it must be a real
///   `std::error::Error` so it can be logged with `%e` and wrapped by
///   callers.
///
/// `accept` takes `&mut self` because only one task ever accepts.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    ///
    /// An error here concerns that one connection attempt (a failed
    /// handshake, a reset socket). The caller logs it and keeps accepting.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One peer.
///
/// Every method takes `&self`, so one connection can be read and written
/// from different branches of a `tokio::select!` (or different tasks
/// through an `Arc`). Implementations guard each direction separately: a
/// pending [`recv`](Connection::recv) never holds up a
/// [`send`](Connection::send). The host relies on this, since it pushes
/// results to a player while that player's handler is parked waiting for
/// the next request.
///
/// Frames are opaque bytes here. Turning them into messages is the
/// protocol crate's job.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the peer.
    ///
    /// Frames are delivered whole and in order. Failure means the peer is
    /// gone; the caller should stop using the connection.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed. Control
    /// frames (ping, pong) are handled internally and never surface.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts a clean close. The peer sees a close frame, not a reset.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Process-unique id, fixed for the life of the connection.
    fn id(&self) -> ConnectionId;
}
