//! Wire protocol for Rolltable.
//!
//! This crate defines what the host and its players say to each other:
//!
//! - **Types** ([`ParticipantId`], [`DiceGroup`], [`RollRecord`], ...):
//!   values shared by every layer.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): the closed set
//!   of message kinds, `type`-tagged JSON.
//! - **Views** ([`RoomView`]): the per-player room snapshot in
//!   `STATE_SYNC`.
//! - **Validation** ([`validate`]): range checks for inbound messages.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, messages out.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room (dispatcher)
//! ```

mod codec;
mod error;
mod message;
mod types;
pub mod validate;
mod view;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, ServerMessage};
pub use types::{
    DiceGroup, DiceRequest, HOST_ID, ParticipantId, RollEntry, RollRecord,
    Visibility, Visible,
};
pub use view::{ParticipantView, PlayerSummary, RoomSettings, RoomView};
