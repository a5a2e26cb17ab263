//! # Rolltable
//!
//! Host-authoritative dice table for tabletop sessions.
//!
//! One process is the host: it owns the room, rolls every die, and sends
//! each player a view of the room filtered to what that player may see.
//! Players connect over WebSocket and speak the JSON protocol in
//! [`rolltable_protocol`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rolltable::prelude::*;
//!
//! # async fn start() -> Result<(), RolltableError> {
//! let server = HostServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .room_name("friday")
//!     .build()
//!     .await?;
//! let host = server.handle();
//! tokio::spawn(server.run());
//! host.dm_roll(vec![DiceRequest::new(1, 20)], Visibility::Public, vec![])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod console;
pub mod error;
mod handler;
mod host;
mod server;

pub use config::HostConfig;
pub use error::RolltableError;
pub use host::{HostHandle, HostSnapshot};
pub use server::{HostServer, HostServerBuilder};

pub mod prelude {
    pub use crate::{
        HostConfig, HostHandle, HostServer, HostServerBuilder, HostSnapshot,
        RolltableError,
    };
    pub use rolltable_protocol::{
        DiceRequest, ParticipantId, RoomSettings, ServerMessage, Visibility,
    };
}
