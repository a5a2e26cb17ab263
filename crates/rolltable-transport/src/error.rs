use std::io;

/// Why a transport operation failed.
///
/// None of these are fatal to the host. A failed accept is logged and the
/// listener keeps going; a failed send or receive ends that one peer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The TCP connection was made but the WebSocket upgrade was not.
    #[cfg(feature = "websocket")]
    #[error("handshake with {peer} failed: {source}")]
    Handshake {
        peer: std::net::SocketAddr,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// Any error on an established WebSocket.
    #[cfg(feature = "websocket")]
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
