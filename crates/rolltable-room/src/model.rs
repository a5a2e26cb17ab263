//! The authoritative room data model.
//!
//! These types are read-only to everything outside this crate: the
//! [`RoomStore`](crate::RoomStore) owns the one mutable [`Room`] and hands
//! out shared references. All writes go through the store's named
//! operations.

use std::collections::{HashMap, VecDeque};

use rolltable_protocol::{
    ParticipantId, RollEntry, RollRecord, RoomSettings,
};

/// Most roll records kept in history. Older records are evicted first.
pub const HISTORY_LIMIT: usize = 500;

/// A non-host player known to the room.
///
/// Survives disconnects (`connected = false`) so a returning player can be
/// matched back by nickname. Only a kick or an explicit leave deletes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub nick: String,
    pub avatar: Option<String>,
    pub connected: bool,
    pub table: Option<RollEntry>,
    /// The player's own autoclear preference.
    pub autoclear: bool,
    /// Creation order. Kept across reconnection; breaks ties when several
    /// disconnected records share a nickname.
    pub joined_seq: u64,
}

/// Whose table or profile an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Host,
    Participant(ParticipantId),
}

impl Owner {
    /// The id announced in `TABLE_CLEARED`.
    pub fn wire_id(&self) -> ParticipantId {
        match self {
            Self::Host => ParticipantId::host(),
            Self::Participant(id) => id.clone(),
        }
    }
}

/// The room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub(crate) room_name: String,
    pub(crate) host_nick: String,
    pub(crate) host_avatar: Option<String>,
    pub(crate) host_table: Option<RollEntry>,
    pub(crate) participants: HashMap<ParticipantId, Participant>,
    pub(crate) history: VecDeque<RollRecord>,
    pub(crate) settings: RoomSettings,
    pub(crate) created_at: u64,
}

impl Room {
    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn host_nick(&self) -> &str {
        &self.host_nick
    }

    pub fn host_avatar(&self) -> Option<&str> {
        self.host_avatar.as_deref()
    }

    pub fn host_table(&self) -> Option<&RollEntry> {
        self.host_table.as_ref()
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Every participant, in no particular order.
    pub fn participants(
        &self,
    ) -> impl Iterator<Item = (&ParticipantId, &Participant)> {
        self.participants.iter()
    }

    /// Every participant, oldest first.
    pub fn participants_by_join(&self) -> Vec<(&ParticipantId, &Participant)> {
        let mut all: Vec<_> = self.participants.iter().collect();
        all.sort_by(|(a_id, a), (b_id, b)| {
            a.joined_seq.cmp(&b.joined_seq).then_with(|| a_id.cmp(b_id))
        });
        all
    }

    /// Ids of connected participants, oldest first.
    pub fn connected_ids(&self) -> Vec<ParticipantId> {
        self.participants_by_join()
            .into_iter()
            .filter(|(_, p)| p.connected)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn history(&self) -> &VecDeque<RollRecord> {
        &self.history
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// The current table for `owner`, if the owner exists.
    pub fn table(&self, owner: &Owner) -> Option<&RollEntry> {
        match owner {
            Owner::Host => self.host_table.as_ref(),
            Owner::Participant(id) => {
                self.participants.get(id).and_then(|p| p.table.as_ref())
            }
        }
    }
}
