//! Nickname-based identity.
//!
//! Connection ids change on every reconnect, so the nickname is the only
//! thing that ties a returning player to their old record. Two rules make
//! that work: no two connected players (or a player and the host) share a
//! nickname, and a disconnected record is claimed by the first connection
//! that presents its nickname.

use std::collections::HashMap;

use rolltable_protocol::ParticipantId;

use crate::model::{Participant, Room};

/// Picks the disconnected record a returning `nick` should take over.
///
/// Several disconnected records can share a nickname (each was unique while
/// connected). The oldest one wins, then the lowest id, so the choice does
/// not depend on map iteration order.
pub(crate) fn reconnect_candidate<'a>(
    participants: &'a HashMap<ParticipantId, Participant>,
    nick: &str,
) -> Option<&'a ParticipantId> {
    participants
        .iter()
        .filter(|(_, p)| !p.connected && p.nick == nick)
        .min_by(|(a_id, a), (b_id, b)| {
            a.joined_seq.cmp(&b.joined_seq).then_with(|| a_id.cmp(b_id))
        })
        .map(|(id, _)| id)
}

/// Returns `true` if `nick` belongs to the host or to a connected
/// participant other than `exclude`.
///
/// Comparison is case-sensitive on the trimmed nickname. Disconnected
/// records never block a nickname: claiming one is how reconnection works.
pub(crate) fn nickname_taken(
    room: &Room,
    nick: &str,
    exclude: Option<&ParticipantId>,
) -> bool {
    let nick = nick.trim();
    let excluding_host = exclude.is_some_and(ParticipantId::is_host);
    if !excluding_host && room.host_nick == nick {
        return true;
    }
    room.participants
        .iter()
        .any(|(id, p)| p.connected && p.nick == nick && Some(id) != exclude)
}
