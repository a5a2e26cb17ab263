//! Wire messages.
//!
//! Both directions use internally tagged JSON: the `type` field names the
//! message kind in SCREAMING_SNAKE_CASE and the remaining fields are
//! camelCase, e.g.
//!
//! ```text
//! { "type": "ROLL_REQUEST", "dice": [{ "sides": 20, "count": 1 }],
//!   "visibility": "public", "targets": [] }
//! ```
//!
//! Both enums are closed. Adding a variant forces every `match` in the
//! dispatcher to handle it.

use serde::{Deserialize, Serialize};

use crate::{
    DiceGroup, DiceRequest, ParticipantId, PlayerSummary, RollRecord, RoomView,
    Visibility,
};

/// Player → host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// First message after connecting: "this is who I am".
    PlayerInfo {
        nick: String,
        #[serde(default)]
        avatar_data: Option<String>,
    },

    /// Ask the host to roll on the sender's behalf.
    RollRequest {
        dice: Vec<DiceRequest>,
        /// Required. A request without it is rejected rather than
        /// published to the room.
        visibility: Visibility,
        #[serde(default)]
        targets: Vec<ParticipantId>,
    },

    /// Clear the sender's own table.
    ClearMyTable,

    /// Change nickname and/or avatar.
    UpdateProfile {
        nick: String,
        #[serde(default)]
        avatar_data: Option<String>,
    },

    /// Toggle the sender's autoclear preference.
    SetAutoclear { enabled: bool },

    /// Leave the room for good (as opposed to dropping the connection).
    Leave,
}

impl ClientMessage {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerInfo { .. } => "PLAYER_INFO",
            Self::RollRequest { .. } => "ROLL_REQUEST",
            Self::ClearMyTable => "CLEAR_MY_TABLE",
            Self::UpdateProfile { .. } => "UPDATE_PROFILE",
            Self::SetAutoclear { .. } => "SET_AUTOCLEAR",
            Self::Leave => "LEAVE",
        }
    }
}

/// Host → player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// A resolved roll.
    RollResult {
        player_id: ParticipantId,
        nick: String,
        dice: Vec<DiceGroup>,
        total: u64,
        visibility: Visibility,
        targets: Vec<ParticipantId>,
        timestamp: u64,
    },

    /// Full state, already filtered for the recipient. `player_id` is the
    /// recipient's own id, which changes on every reconnect.
    StateSync {
        player_id: ParticipantId,
        state: RoomView,
    },

    PlayerJoined {
        player_id: ParticipantId,
        nick: String,
        avatar_data: Option<String>,
    },

    PlayerLeft {
        player_id: ParticipantId,
        nick: String,
    },

    PlayerKicked {
        player_id: ParticipantId,
        nick: String,
    },

    /// `None` means every participant table.
    TableCleared { player_id: Option<ParticipantId> },

    HistoryCleared,

    PlayerList { players: Vec<PlayerSummary> },

    AvatarUpdate {
        player_id: ParticipantId,
        nick: String,
        avatar_data: Option<String>,
    },

    /// Reply to a `PLAYER_INFO` whose nickname is in use.
    NickTaken { nick: String, message: String },

    /// Reply to an `UPDATE_PROFILE` whose nickname is in use.
    ProfileUpdateRejected { nick: String, message: String },
}

impl ServerMessage {
    /// Builds the `ROLL_RESULT` announcing `record`.
    pub fn roll_result(record: &RollRecord) -> Self {
        Self::RollResult {
            player_id: record.roller_id.clone(),
            nick: record.roller_nick.clone(),
            dice: record.dice.clone(),
            total: record.total,
            visibility: record.visibility,
            targets: record.targets.clone(),
            timestamp: record.timestamp,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RollResult { .. } => "ROLL_RESULT",
            Self::StateSync { .. } => "STATE_SYNC",
            Self::PlayerJoined { .. } => "PLAYER_JOINED",
            Self::PlayerLeft { .. } => "PLAYER_LEFT",
            Self::PlayerKicked { .. } => "PLAYER_KICKED",
            Self::TableCleared { .. } => "TABLE_CLEARED",
            Self::HistoryCleared => "HISTORY_CLEARED",
            Self::PlayerList { .. } => "PLAYER_LIST",
            Self::AvatarUpdate { .. } => "AVATAR_UPDATE",
            Self::NickTaken { .. } => "NICK_TAKEN",
            Self::ProfileUpdateRejected { .. } => "PROFILE_UPDATE_REJECTED",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
