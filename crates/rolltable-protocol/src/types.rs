//! Core value types shared by every layer: identities, dice, and rolls.
//!
//! Everything in here crosses the wire at some point, either inside a
//! `ROLL_RESULT`, inside a `STATE_SYNC` view, or inside a persisted room
//! snapshot. Field names are camelCase on the wire to match the browser
//! clients.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of a participant's current connection.
///
/// Transport-assigned ids look like `peer-7`. The id is NOT stable across
/// reconnects: a returning player gets a new id and is matched back to their
/// old record by nickname. The host uses the reserved id [`HOST_ID`].
///
/// `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

/// The host's own participant id, used as `rollerId` for host rolls and as
/// the owner in `TABLE_CLEARED` for the host table.
pub const HOST_ID: &str = "dm";

impl ParticipantId {
    /// Creates an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The host's reserved id.
    pub fn host() -> Self {
        Self(HOST_ID.to_string())
    }

    /// Returns `true` if this is the host's reserved id.
    pub fn is_host(&self) -> bool {
        self.0 == HOST_ID
    }

    /// Borrows the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Who may see a roll. Fixed when the roll is created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Everyone in the room.
    #[default]
    Public,
    /// The roller and the host.
    Private,
    /// The roller, the listed targets, and the host.
    Targeted,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Targeted => write!(f, "targeted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dice
// ---------------------------------------------------------------------------

/// One group of a roll request: `count` dice with `sides` faces each.
///
/// This is the inbound shape. Results are never accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRequest {
    pub sides: u32,
    pub count: u32,
}

impl DiceRequest {
    pub fn new(count: u32, sides: u32) -> Self {
        Self { sides, count }
    }
}

impl fmt::Display for DiceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

/// A rolled group: the request plus one result per die.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGroup {
    pub sides: u32,
    pub count: u32,
    pub results: Vec<u32>,
}

impl DiceGroup {
    /// Sum of this group's results.
    pub fn subtotal(&self) -> u64 {
        self.results.iter().map(|r| u64::from(*r)).sum()
    }
}

// ---------------------------------------------------------------------------
// Rolls
// ---------------------------------------------------------------------------

/// A resolved roll as stored in history. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollRecord {
    pub roller_id: ParticipantId,
    pub roller_nick: String,
    pub dice: Vec<DiceGroup>,
    pub total: u64,
    pub visibility: Visibility,
    #[serde(default)]
    pub targets: Vec<ParticipantId>,
    pub timestamp: u64,
}

/// The single aggregated entry on a table.
///
/// Starts as a copy of one [`RollRecord`] and then accumulates later rolls:
/// dice groups are concatenated, totals summed, the timestamp follows the
/// latest write. Visibility and targets come from the first roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollEntry {
    pub roller_id: ParticipantId,
    pub roller_nick: String,
    pub dice: Vec<DiceGroup>,
    pub total: u64,
    pub visibility: Visibility,
    #[serde(default)]
    pub targets: Vec<ParticipantId>,
    pub timestamp: u64,
}

impl From<&RollRecord> for RollEntry {
    fn from(record: &RollRecord) -> Self {
        Self {
            roller_id: record.roller_id.clone(),
            roller_nick: record.roller_nick.clone(),
            dice: record.dice.clone(),
            total: record.total,
            visibility: record.visibility,
            targets: record.targets.clone(),
            timestamp: record.timestamp,
        }
    }
}

/// Anything carrying a visibility tag that the projector can filter.
pub trait Visible {
    fn roller_id(&self) -> &ParticipantId;
    fn visibility(&self) -> Visibility;
    fn targets(&self) -> &[ParticipantId];
}

impl Visible for RollRecord {
    fn roller_id(&self) -> &ParticipantId {
        &self.roller_id
    }
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn targets(&self) -> &[ParticipantId] {
        &self.targets
    }
}

impl Visible for RollEntry {
    fn roller_id(&self) -> &ParticipantId {
        &self.roller_id
    }
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn targets(&self) -> &[ParticipantId] {
        &self.targets
    }
}
