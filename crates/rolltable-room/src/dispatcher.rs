//! The host's message dispatcher.
//!
//! [`HostDispatcher`] is the single writer for the room. Player messages,
//! transport events, and host actions each turn into one synchronous call
//! that updates the [`RoomStore`] and returns the messages to deliver as a
//! list of [`Outbound`] items. Delivery is someone else's job: the server
//! crate's host actor owns the connections.

use rolltable_dice::{DiceRoller, RandomRoller};
use rolltable_protocol::validate::{
    normalize_nick, validate_avatar, validate_dice,
};
use rolltable_protocol::{
    ClientMessage, Codec, DiceRequest, ParticipantId, RollRecord, RoomSettings,
    RoomView, ServerMessage, Visibility,
};

use crate::error::DispatchError;
use crate::merge::MergeOutcome;
use crate::model::{Owner, Room};
use crate::persist::SnapshotStore;
use crate::store::{RoomStore, now_millis};
use crate::view::{player_list, project_view};

/// Who an outbound message is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every connected participant. The host's own feed also sees these.
    All,
    /// One participant.
    Participant(ParticipantId),
    /// Several participants, already deduplicated.
    Participants(Vec<ParticipantId>),
    /// Every connected participant except one.
    AllExcept(ParticipantId),
    /// Only the host's own feed.
    Host,
}

/// One thing the dispatcher wants done.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message { to: Recipient, msg: ServerMessage },
    /// Close this participant's connection after earlier messages are sent.
    Disconnect(ParticipantId),
}

impl Outbound {
    fn to(to: Recipient, msg: ServerMessage) -> Self {
        Self::Message { to, msg }
    }
}

/// Routes every message in the room. See the module docs.
pub struct HostDispatcher<R: DiceRoller = RandomRoller> {
    store: RoomStore,
    roller: R,
    persistence: Option<Box<dyn SnapshotStore>>,
    host_autoclear: bool,
}

impl<R: DiceRoller> HostDispatcher<R> {
    pub fn new(store: RoomStore, roller: R) -> Self {
        Self {
            store,
            roller,
            persistence: None,
            host_autoclear: false,
        }
    }

    /// Saves a snapshot to `backend` after every mutation.
    pub fn with_persistence(mut self, backend: Box<dyn SnapshotStore>) -> Self {
        self.persistence = Some(backend);
        self
    }

    /// The authoritative room, unfiltered. For the host's own display.
    pub fn room(&self) -> &Room {
        self.store.room()
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    pub fn host_autoclear(&self) -> bool {
        self.host_autoclear
    }

    /// What `id` would receive in a `STATE_SYNC` right now.
    pub fn participant_view(&self, id: &ParticipantId) -> RoomView {
        project_view(self.store.room(), id)
    }

    // =====================================================================
    // Transport events
    // =====================================================================

    /// A connection opened. Nothing happens until it sends `PLAYER_INFO`.
    pub fn on_connected(&mut self, id: &ParticipantId) -> Vec<Outbound> {
        tracing::debug!(participant = %id, "connection opened");
        Vec::new()
    }

    /// A connection closed. The participant stays in the room, offline,
    /// so they can reconnect under the same nickname.
    pub fn on_disconnected(&mut self, id: &ParticipantId) -> Vec<Outbound> {
        if let Err(e) = self.store.mark_disconnected(id) {
            // Never identified, or already kicked / left.
            tracing::debug!(participant = %id, error = %e, "disconnect ignored");
            return Vec::new();
        }
        tracing::info!(participant = %id, "participant disconnected");
        self.persist();
        vec![self.player_list_to(Recipient::AllExcept(id.clone()))]
    }

    // =====================================================================
    // Player messages
    // =====================================================================

    /// Decodes and handles one raw frame. Undecodable frames are logged and
    /// dropped; a bad message never affects anyone but its sender.
    pub fn handle_frame<C: Codec>(
        &mut self,
        codec: &C,
        sender: &ParticipantId,
        data: &[u8],
    ) -> Vec<Outbound> {
        match codec.decode::<ClientMessage>(data) {
            Ok(msg) => self.handle_message(sender, msg),
            Err(e) => {
                tracing::debug!(participant = %sender, error = %e, "dropping malformed message");
                Vec::new()
            }
        }
    }

    pub fn handle_message(
        &mut self,
        sender: &ParticipantId,
        msg: ClientMessage,
    ) -> Vec<Outbound> {
        tracing::trace!(participant = %sender, kind = msg.kind(), "message received");
        match msg {
            ClientMessage::PlayerInfo { nick, avatar_data } => {
                self.player_info(sender, &nick, avatar_data)
            }
            ClientMessage::RollRequest {
                dice,
                visibility,
                targets,
            } => self.roll_request(sender, &dice, visibility, targets),
            ClientMessage::ClearMyTable => self.clear_my_table(sender),
            ClientMessage::UpdateProfile { nick, avatar_data } => {
                self.update_profile(sender, &nick, avatar_data)
            }
            ClientMessage::SetAutoclear { enabled } => {
                self.set_autoclear(sender, enabled)
            }
            ClientMessage::Leave => self.leave(sender),
        }
    }

    fn player_info(
        &mut self,
        sender: &ParticipantId,
        nick: &str,
        avatar: Option<String>,
    ) -> Vec<Outbound> {
        let nick = match normalize_nick(nick) {
            Ok(nick) => nick,
            Err(e) => {
                tracing::debug!(participant = %sender, error = %e, "rejected PLAYER_INFO");
                return Vec::new();
            }
        };
        if let Err(e) = validate_avatar(avatar.as_deref()) {
            tracing::debug!(participant = %sender, error = %e, "rejected PLAYER_INFO");
            return Vec::new();
        }
        if self.store.is_nickname_taken(&nick, Some(sender)) {
            tracing::info!(participant = %sender, %nick, "nickname taken");
            let message = format!("The nickname \"{nick}\" is already in use.");
            return vec![Outbound::to(
                Recipient::Participant(sender.clone()),
                ServerMessage::NickTaken { nick, message },
            )];
        }

        let already_here = self
            .store
            .room()
            .participant(sender)
            .is_some_and(|p| p.connected);

        let mut out = Vec::new();
        let mut resync_others = false;
        if already_here {
            // A repeated PLAYER_INFO on a live connection is a profile
            // refresh; the table stays.
            if let Err(e) = self.store.update_profile(
                &Owner::Participant(sender.clone()),
                nick.clone(),
                avatar,
            ) {
                tracing::debug!(participant = %sender, error = %e, "profile refresh failed");
            }
        } else if let Some(old_id) =
            self.store
                .resolve_reconnection(sender.clone(), &nick, avatar.clone())
        {
            tracing::info!(participant = %sender, %old_id, %nick, "participant rejoined");
            // Mirrors still file this player's table under the old id.
            resync_others = true;
        } else {
            self.store.add_participant(sender.clone(), nick.clone(), avatar);
            tracing::info!(participant = %sender, %nick, "participant joined");
            let avatar_data = self.avatar_of(sender);
            out.push(Outbound::to(
                Recipient::AllExcept(sender.clone()),
                ServerMessage::PlayerJoined {
                    player_id: sender.clone(),
                    nick: nick.clone(),
                    avatar_data,
                },
            ));
        }

        out.insert(0, self.state_sync_to(sender));
        if resync_others {
            for id in self.store.room().connected_ids() {
                if &id != sender {
                    out.push(self.state_sync_to(&id));
                }
            }
        }
        out.push(self.player_list_to(Recipient::All));

        // Avatars travel separately from the list.
        out.push(self.host_avatar_update(Recipient::Participant(sender.clone())));
        for id in self.store.room().connected_ids() {
            if &id != sender {
                if let Some(update) = self.avatar_update(&id) {
                    out.push(Outbound::to(
                        Recipient::Participant(sender.clone()),
                        update,
                    ));
                }
            }
        }
        if let Some(update) = self.avatar_update(sender) {
            out.push(Outbound::to(Recipient::AllExcept(sender.clone()), update));
        }

        self.persist();
        out
    }

    fn roll_request(
        &mut self,
        sender: &ParticipantId,
        dice: &[DiceRequest],
        visibility: Visibility,
        targets: Vec<ParticipantId>,
    ) -> Vec<Outbound> {
        if let Err(e) = validate_dice(dice) {
            tracing::debug!(participant = %sender, error = %e, "rejected ROLL_REQUEST");
            return Vec::new();
        }
        let Some(nick) = self.store.room().participant(sender).map(|p| p.nick.clone())
        else {
            tracing::debug!(participant = %sender, "roll from unidentified connection");
            return Vec::new();
        };

        let record = self.roll(sender.clone(), nick, dice, visibility, targets);
        let outcome = match self.store.append_roll(sender, record.clone()) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(participant = %sender, error = %e, "roll not recorded");
                return Vec::new();
            }
        };
        tracing::info!(
            participant = %sender,
            total = record.total,
            %visibility,
            "roll resolved"
        );

        let out = self.announce_roll(&Owner::Participant(sender.clone()), outcome, &record);
        self.persist();
        out
    }

    fn clear_my_table(&mut self, sender: &ParticipantId) -> Vec<Outbound> {
        self.clear_participant_table(sender)
    }

    fn update_profile(
        &mut self,
        sender: &ParticipantId,
        nick: &str,
        avatar: Option<String>,
    ) -> Vec<Outbound> {
        if self.store.room().participant(sender).is_none() {
            tracing::debug!(participant = %sender, "profile update from unidentified connection");
            return Vec::new();
        }
        let nick = match normalize_nick(nick) {
            Ok(nick) => nick,
            Err(e) => {
                tracing::debug!(participant = %sender, error = %e, "rejected UPDATE_PROFILE");
                return Vec::new();
            }
        };
        if let Err(e) = validate_avatar(avatar.as_deref()) {
            tracing::debug!(participant = %sender, error = %e, "rejected UPDATE_PROFILE");
            return Vec::new();
        }
        if self.store.is_nickname_taken(&nick, Some(sender)) {
            tracing::info!(participant = %sender, %nick, "profile nickname taken");
            let message = format!("The nickname \"{nick}\" is already in use.");
            return vec![Outbound::to(
                Recipient::Participant(sender.clone()),
                ServerMessage::ProfileUpdateRejected { nick, message },
            )];
        }

        if let Err(e) = self.store.update_profile(
            &Owner::Participant(sender.clone()),
            nick,
            avatar,
        ) {
            tracing::warn!(participant = %sender, error = %e, "profile not updated");
            return Vec::new();
        }

        let mut out = Vec::new();
        if let Some(update) = self.avatar_update(sender) {
            out.push(Outbound::to(Recipient::All, update));
        }
        out.push(self.player_list_to(Recipient::All));
        self.persist();
        out
    }

    fn set_autoclear(
        &mut self,
        sender: &ParticipantId,
        enabled: bool,
    ) -> Vec<Outbound> {
        if let Err(e) = self.store.set_autoclear(sender, enabled) {
            tracing::debug!(participant = %sender, error = %e, "SET_AUTOCLEAR ignored");
            return Vec::new();
        }
        self.persist();
        vec![self.player_list_to(Recipient::All)]
    }

    fn leave(&mut self, sender: &ParticipantId) -> Vec<Outbound> {
        let Some(participant) = self.store.remove_participant(sender) else {
            tracing::debug!(participant = %sender, "LEAVE from unidentified connection");
            return Vec::new();
        };
        tracing::info!(participant = %sender, nick = %participant.nick, "participant left");
        self.persist();
        vec![
            Outbound::to(
                Recipient::AllExcept(sender.clone()),
                ServerMessage::PlayerLeft {
                    player_id: sender.clone(),
                    nick: participant.nick,
                },
            ),
            self.player_list_to(Recipient::AllExcept(sender.clone())),
            Outbound::Disconnect(sender.clone()),
        ]
    }

    // =====================================================================
    // Host actions
    // =====================================================================

    /// Rolls on the host table.
    pub fn dm_roll(
        &mut self,
        dice: &[DiceRequest],
        visibility: Visibility,
        targets: Vec<ParticipantId>,
    ) -> Result<Vec<Outbound>, DispatchError> {
        validate_dice(dice)?;
        let nick = self.store.room().host_nick().to_string();
        let record = self.roll(ParticipantId::host(), nick, dice, visibility, targets);
        let autoclear =
            self.host_autoclear || self.store.room().settings().force_autoclear;
        let outcome = self.store.append_host_roll(record.clone(), autoclear);
        tracing::info!(total = record.total, %visibility, "host roll resolved");

        let out = self.announce_roll(&Owner::Host, outcome, &record);
        self.persist();
        Ok(out)
    }

    /// Removes a participant for good and closes their connection.
    /// Unknown ids are ignored.
    pub fn kick(&mut self, id: &ParticipantId) -> Vec<Outbound> {
        let Some(participant) = self.store.remove_participant(id) else {
            tracing::debug!(participant = %id, "kick ignored: unknown participant");
            return Vec::new();
        };
        tracing::info!(participant = %id, nick = %participant.nick, "participant kicked");
        self.persist();
        vec![
            Outbound::to(
                Recipient::Participant(id.clone()),
                ServerMessage::PlayerKicked {
                    player_id: id.clone(),
                    nick: participant.nick.clone(),
                },
            ),
            Outbound::Disconnect(id.clone()),
            Outbound::to(
                Recipient::All,
                ServerMessage::PlayerLeft {
                    player_id: id.clone(),
                    nick: participant.nick,
                },
            ),
            self.player_list_to(Recipient::All),
        ]
    }

    pub fn clear_participant_table(&mut self, id: &ParticipantId) -> Vec<Outbound> {
        if let Err(e) = self.store.clear_table(Some(id)) {
            tracing::debug!(participant = %id, error = %e, "clear ignored");
            return Vec::new();
        }
        self.persist();
        vec![table_cleared(Some(id.clone()))]
    }

    /// Clears every participant table and the host table.
    pub fn clear_all_tables(&mut self) -> Vec<Outbound> {
        if let Err(e) = self.store.clear_table(None) {
            tracing::debug!(error = %e, "clearing participant tables failed");
        }
        self.store.clear_host_table();
        tracing::info!("all tables cleared");
        self.persist();
        vec![
            table_cleared(None),
            table_cleared(Some(ParticipantId::host())),
        ]
    }

    pub fn clear_host_table(&mut self) -> Vec<Outbound> {
        self.store.clear_host_table();
        self.persist();
        vec![table_cleared(Some(ParticipantId::host()))]
    }

    pub fn clear_history(&mut self) -> Vec<Outbound> {
        self.store.clear_history();
        tracing::info!("history cleared");
        self.persist();
        vec![Outbound::to(Recipient::All, ServerMessage::HistoryCleared)]
    }

    /// Changes the host's nickname and avatar.
    ///
    /// Fails if a connected participant already uses the nickname.
    pub fn update_host_profile(
        &mut self,
        nick: &str,
        avatar: Option<String>,
    ) -> Result<Vec<Outbound>, DispatchError> {
        let nick = normalize_nick(nick)?;
        validate_avatar(avatar.as_deref())?;
        let host = ParticipantId::host();
        if self.store.is_nickname_taken(&nick, Some(&host)) {
            return Err(DispatchError::NicknameTaken(nick));
        }
        // The host record always exists.
        let _ = self.store.update_profile(&Owner::Host, nick, avatar);
        self.persist();
        Ok(vec![self.host_avatar_update(Recipient::All)])
    }

    /// The host's own autoclear preference. Not persisted.
    pub fn set_host_autoclear(&mut self, enabled: bool) {
        self.host_autoclear = enabled;
    }

    /// Applies new room settings and re-syncs every connected participant.
    pub fn update_settings(&mut self, settings: RoomSettings) -> Vec<Outbound> {
        self.store.update_settings(settings);
        tracing::info!(settings = ?self.store.room().settings(), "settings updated");
        self.persist();
        self.store
            .room()
            .connected_ids()
            .iter()
            .map(|id| self.state_sync_to(id))
            .collect()
    }

    /// Clears autoclear tables that have sat idle past the room's
    /// `autoclear_seconds`. Called periodically by the host loop.
    pub fn sweep_autoclear(&mut self, now_ms: u64) -> Vec<Outbound> {
        let stale = self.store.stale_tables(now_ms, self.host_autoclear);
        if stale.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(stale.len());
        for owner in stale {
            match &owner {
                Owner::Host => self.store.clear_host_table(),
                Owner::Participant(id) => {
                    if let Err(e) = self.store.clear_table(Some(id)) {
                        tracing::debug!(participant = %id, error = %e, "autoclear failed");
                        continue;
                    }
                }
            }
            tracing::debug!(owner = %owner.wire_id(), "autoclear expired table");
            out.push(table_cleared(Some(owner.wire_id())));
        }
        self.persist();
        out
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    fn roll(
        &mut self,
        roller_id: ParticipantId,
        roller_nick: String,
        dice: &[DiceRequest],
        visibility: Visibility,
        targets: Vec<ParticipantId>,
    ) -> RollRecord {
        let outcome = self.roller.roll_multiple(dice);
        let targets = match visibility {
            Visibility::Targeted => dedup(targets),
            Visibility::Public | Visibility::Private => Vec::new(),
        };
        RollRecord {
            roller_id,
            roller_nick,
            dice: outcome.dice,
            total: outcome.total,
            visibility,
            targets,
            timestamp: now_millis(),
        }
    }

    /// `TABLE_CLEARED` first when the table was reset, then the result to
    /// everyone allowed to see it. The host always sees every roll.
    fn announce_roll(
        &self,
        owner: &Owner,
        outcome: MergeOutcome,
        record: &RollRecord,
    ) -> Vec<Outbound> {
        let mut out = Vec::with_capacity(3);
        if outcome == MergeOutcome::Reset {
            out.push(table_cleared(Some(owner.wire_id())));
        }

        let msg = ServerMessage::roll_result(record);
        let roller = &record.roller_id;
        let audience = match record.visibility {
            Visibility::Public => None,
            Visibility::Private => Some(vec![roller.clone()]),
            Visibility::Targeted => {
                let mut ids = vec![roller.clone()];
                ids.extend(record.targets.iter().cloned());
                Some(dedup(ids))
            }
        };
        match audience {
            None => out.push(Outbound::to(Recipient::All, msg)),
            Some(ids) => {
                let ids: Vec<_> = ids.into_iter().filter(|id| !id.is_host()).collect();
                if !ids.is_empty() {
                    out.push(Outbound::to(Recipient::Participants(ids), msg.clone()));
                }
                out.push(Outbound::to(Recipient::Host, msg));
            }
        }
        out
    }

    fn state_sync_to(&self, id: &ParticipantId) -> Outbound {
        Outbound::to(
            Recipient::Participant(id.clone()),
            ServerMessage::StateSync {
                player_id: id.clone(),
                state: project_view(self.store.room(), id),
            },
        )
    }

    fn player_list_to(&self, to: Recipient) -> Outbound {
        Outbound::to(
            to,
            ServerMessage::PlayerList {
                players: player_list(self.store.room()),
            },
        )
    }

    fn avatar_of(&self, id: &ParticipantId) -> Option<String> {
        self.store.room().participant(id).and_then(|p| p.avatar.clone())
    }

    fn avatar_update(&self, id: &ParticipantId) -> Option<ServerMessage> {
        let p = self.store.room().participant(id)?;
        Some(ServerMessage::AvatarUpdate {
            player_id: id.clone(),
            nick: p.nick.clone(),
            avatar_data: p.avatar.clone(),
        })
    }

    fn host_avatar_update(&self, to: Recipient) -> Outbound {
        let room = self.store.room();
        Outbound::to(
            to,
            ServerMessage::AvatarUpdate {
                player_id: ParticipantId::host(),
                nick: room.host_nick().to_string(),
                avatar_data: room.host_avatar().map(str::to_string),
            },
        )
    }

    fn persist(&self) {
        let Some(backend) = &self.persistence else {
            return;
        };
        let room_name = self.store.room().room_name();
        let result = self
            .store
            .serialize()
            .map_err(|e| e.to_string())
            .and_then(|blob| backend.save(room_name, &blob).map_err(|e| e.to_string()));
        if let Err(error) = result {
            tracing::warn!(room = %room_name, %error, "failed to persist room");
        }
    }
}

fn table_cleared(player_id: Option<ParticipantId>) -> Outbound {
    Outbound::to(Recipient::All, ServerMessage::TableCleared { player_id })
}

/// Removes duplicates, keeping first occurrences in order.
fn dedup(ids: Vec<ParticipantId>) -> Vec<ParticipantId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let ids = vec![
            ParticipantId::new("b"),
            ParticipantId::new("a"),
            ParticipantId::new("b"),
        ];
        assert_eq!(
            dedup(ids),
            vec![ParticipantId::new("b"), ParticipantId::new("a")]
        );
    }

    #[test]
    fn test_table_cleared_goes_to_everyone() {
        let out = table_cleared(None);
        assert_eq!(
            out,
            Outbound::Message {
                to: Recipient::All,
                msg: ServerMessage::TableCleared { player_id: None },
            }
        );
    }
}
