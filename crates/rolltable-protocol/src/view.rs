//! State views sent to players.
//!
//! A [`RoomView`] is what a player receives in `STATE_SYNC`: the room as
//! that player is allowed to see it. The host builds one per recipient;
//! rolls the recipient may not see have already been removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ParticipantId, RollEntry, RollRecord};

/// Room-wide settings, controlled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSettings {
    /// A die showing at least this value is highlighted as a critical hit.
    pub crit_hit_threshold: u32,
    /// A die showing at most this value is highlighted as a critical failure.
    pub crit_fail_threshold: u32,
    /// Autoclear-enabled tables are cleared after this many idle seconds.
    /// 0 disables the timer.
    pub autoclear_seconds: u32,
    /// Treat every table as autoclear-enabled, ignoring player preference.
    pub force_autoclear: bool,
}

impl RoomSettings {
    /// Largest accepted threshold.
    pub const MAX_THRESHOLD: u32 = 1000;

    /// Clamps out-of-range values so the settings are safe to apply.
    ///
    /// Thresholds are clamped to `1..=MAX_THRESHOLD`. If the failure
    /// threshold would reach the hit threshold, the defaults are restored
    /// for both.
    pub fn normalized(mut self) -> Self {
        self.crit_hit_threshold =
            self.crit_hit_threshold.clamp(1, Self::MAX_THRESHOLD);
        self.crit_fail_threshold =
            self.crit_fail_threshold.clamp(1, Self::MAX_THRESHOLD);
        if self.crit_fail_threshold >= self.crit_hit_threshold {
            let defaults = Self::default();
            self.crit_hit_threshold = defaults.crit_hit_threshold;
            self.crit_fail_threshold = defaults.crit_fail_threshold;
        }
        self
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            crit_hit_threshold: 20,
            crit_fail_threshold: 1,
            autoclear_seconds: 0,
            force_autoclear: false,
        }
    }
}

/// One participant as seen by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub nick: String,
    #[serde(default)]
    pub avatar_data: Option<String>,
    pub connected: bool,
    #[serde(default)]
    pub table: Option<RollEntry>,
    #[serde(default)]
    pub autoclear: bool,
}

/// The whole room as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_name: String,
    pub host_nick: String,
    #[serde(default)]
    pub host_avatar: Option<String>,
    #[serde(default)]
    pub host_table: Option<RollEntry>,
    pub participants: BTreeMap<ParticipantId, ParticipantView>,
    pub history: Vec<RollRecord>,
    pub settings: RoomSettings,
    pub created_at: u64,
}

/// A row in `PLAYER_LIST`. Avatars travel separately in `AVATAR_UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: ParticipantId,
    pub nick: String,
    pub connected: bool,
    #[serde(default)]
    pub autoclear: bool,
}
