//! Versioned snapshot schema.
//!
//! A snapshot is the whole room as JSON, written after every mutation and
//! read back when the host restarts. Every field except the room name is
//! optional on read: [`RoomSnapshot::into_room`] is the single place that
//! decides what a missing or out-of-range field becomes, so older or
//! partially written snapshots still load.

use std::collections::{HashMap, VecDeque};

use rolltable_protocol::{ParticipantId, RollEntry, RollRecord, RoomSettings};
use serde::{Deserialize, Serialize};

use crate::model::{HISTORY_LIMIT, Participant, Room};

/// Schema version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Host nickname used when a snapshot has none.
pub const DEFAULT_HOST_NICK: &str = "DM";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RoomSnapshot {
    version: u32,
    room_name: Option<String>,
    host_nick: Option<String>,
    host_avatar: Option<String>,
    host_table: Option<RollEntry>,
    participants: Vec<ParticipantSnapshot>,
    history: Vec<RollRecord>,
    settings: RoomSettings,
    created_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantSnapshot {
    id: ParticipantId,
    nick: String,
    #[serde(default)]
    avatar_data: Option<String>,
    #[serde(default)]
    table: Option<RollEntry>,
    #[serde(default)]
    autoclear: bool,
    #[serde(default)]
    joined_seq: u64,
}

impl RoomSnapshot {
    pub(crate) fn from_room(room: &Room) -> Self {
        let participants = room
            .participants_by_join()
            .into_iter()
            .map(|(id, p)| ParticipantSnapshot {
                id: id.clone(),
                nick: p.nick.clone(),
                avatar_data: p.avatar.clone(),
                table: p.table.clone(),
                autoclear: p.autoclear,
                joined_seq: p.joined_seq,
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            room_name: Some(room.room_name.clone()),
            host_nick: Some(room.host_nick.clone()),
            host_avatar: room.host_avatar.clone(),
            host_table: room.host_table.clone(),
            participants,
            history: room.history.iter().cloned().collect(),
            settings: room.settings,
            created_at: room.created_at,
        }
    }

    /// Rebuilds a room, filling gaps with defaults.
    ///
    /// - no room name, or an empty one: the snapshot is rejected;
    /// - no host nick: [`DEFAULT_HOST_NICK`];
    /// - settings: normalised;
    /// - history: only the newest [`HISTORY_LIMIT`] records;
    /// - participants: all disconnected, join order renumbered from 1
    ///   following the stored order (records without a sequence keep
    ///   their position).
    ///
    /// Returns the room and the next free join sequence.
    pub(crate) fn into_room(self) -> Option<(Room, u64)> {
        let room_name = self.room_name.filter(|n| !n.trim().is_empty())?;
        let host_nick = self
            .host_nick
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST_NICK.to_string());

        let mut stored = self.participants;
        // Stable sort: zero-sequence records from older snapshots keep
        // their relative order.
        stored.sort_by_key(|p| p.joined_seq);

        let mut participants = HashMap::with_capacity(stored.len());
        let mut next_seq = 1;
        for p in stored {
            participants.insert(
                p.id,
                Participant {
                    nick: p.nick,
                    avatar: p.avatar_data,
                    connected: false,
                    table: p.table,
                    autoclear: p.autoclear,
                    joined_seq: next_seq,
                },
            );
            next_seq += 1;
        }

        let skip = self.history.len().saturating_sub(HISTORY_LIMIT);
        let history: VecDeque<_> = self.history.into_iter().skip(skip).collect();

        let room = Room {
            room_name,
            host_nick,
            host_avatar: self.host_avatar,
            host_table: self.host_table,
            participants,
            history,
            settings: self.settings.normalized(),
            created_at: self.created_at,
        };
        Some((room, next_seq))
    }
}
