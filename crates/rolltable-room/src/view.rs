//! Per-viewer projection of the room.
//!
//! Players never see the authoritative room. Before any state leaves the
//! host it goes through [`project_view`], which drops every table entry and
//! history record the viewer is not allowed to see.

use std::collections::BTreeMap;

use rolltable_protocol::{
    ParticipantId, ParticipantView, PlayerSummary, RoomView, Visibility,
    Visible,
};

use crate::model::Room;

/// Whether `viewer` may see `roll`.
///
/// Public rolls are visible to everyone, every roll is visible to its
/// roller, and a targeted roll is visible to its targets. The host reads
/// the authoritative room and is never projected.
pub fn is_visible<V: Visible + ?Sized>(roll: &V, viewer: &ParticipantId) -> bool {
    match roll.visibility() {
        Visibility::Public => true,
        _ if roll.roller_id() == viewer => true,
        Visibility::Targeted => roll.targets().contains(viewer),
        Visibility::Private => false,
    }
}

/// The room as `viewer` is allowed to see it.
pub fn project_view(room: &Room, viewer: &ParticipantId) -> RoomView {
    let participants: BTreeMap<_, _> = room
        .participants
        .iter()
        .map(|(id, p)| {
            let view = ParticipantView {
                nick: p.nick.clone(),
                avatar_data: p.avatar.clone(),
                connected: p.connected,
                table: p.table.as_ref().filter(|t| is_visible(*t, viewer)).cloned(),
                autoclear: p.autoclear,
            };
            (id.clone(), view)
        })
        .collect();

    RoomView {
        room_name: room.room_name.clone(),
        host_nick: room.host_nick.clone(),
        host_avatar: room.host_avatar.clone(),
        host_table: room
            .host_table
            .as_ref()
            .filter(|t| is_visible(*t, viewer))
            .cloned(),
        participants,
        history: room
            .history
            .iter()
            .filter(|r| is_visible(*r, viewer))
            .cloned()
            .collect(),
        settings: room.settings,
        created_at: room.created_at,
    }
}

/// `PLAYER_LIST` rows, oldest participant first.
pub fn player_list(room: &Room) -> Vec<PlayerSummary> {
    room.participants_by_join()
        .into_iter()
        .map(|(id, p)| PlayerSummary {
            player_id: id.clone(),
            nick: p.nick.clone(),
            connected: p.connected,
            autoclear: p.autoclear,
        })
        .collect()
}
