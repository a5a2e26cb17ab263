//! The room state store.
//!
//! [`RoomStore`] owns the one authoritative [`Room`]. Everything that
//! changes room state is a method here, so invariants (history cap, one
//! entry per table, join ordering) are enforced in a single place. The
//! store is plain synchronous data; the dispatcher above it decides who
//! hears about each change.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use rolltable_protocol::{ParticipantId, RollRecord, RoomSettings};

use crate::error::RoomError;
use crate::identity;
use crate::merge::{MergeOutcome, merge_roll};
use crate::model::{HISTORY_LIMIT, Owner, Participant, Room};
use crate::snapshot::RoomSnapshot;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Owner of the authoritative room.
#[derive(Debug, Clone)]
pub struct RoomStore {
    room: Room,
    next_seq: u64,
}

impl RoomStore {
    /// A fresh room with default settings, no participants, and empty
    /// history.
    pub fn create(
        room_name: impl Into<String>,
        host_nick: impl Into<String>,
        host_avatar: Option<String>,
    ) -> Self {
        let room = Room {
            room_name: room_name.into(),
            host_nick: host_nick.into(),
            host_avatar,
            host_table: None,
            participants: Default::default(),
            history: VecDeque::new(),
            settings: RoomSettings::default(),
            created_at: now_millis(),
        };
        Self { room, next_seq: 1 }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Registers a connected participant with an empty table.
    ///
    /// Replaces any record already stored under `id`.
    pub fn add_participant(
        &mut self,
        id: ParticipantId,
        nick: impl Into<String>,
        avatar: Option<String>,
    ) {
        let participant = Participant {
            nick: nick.into(),
            avatar,
            connected: true,
            table: None,
            autoclear: false,
            joined_seq: self.next_seq,
        };
        self.next_seq += 1;
        self.room.participants.insert(id, participant);
    }

    /// Deletes a participant. Their rolls stay in history.
    pub fn remove_participant(
        &mut self,
        id: &ParticipantId,
    ) -> Option<Participant> {
        self.room.participants.remove(id)
    }

    /// Flags a participant as gone while keeping everything else, so they
    /// can reconnect under the same nickname.
    pub fn mark_disconnected(
        &mut self,
        id: &ParticipantId,
    ) -> Result<(), RoomError> {
        let participant = self.participant_mut(id)?;
        participant.connected = false;
        Ok(())
    }

    /// Moves a disconnected participant whose nickname is `nick` to
    /// `new_id` and marks it connected. Returns the old id.
    ///
    /// The avatar is replaced only when one is given. Table, autoclear
    /// preference, and join order carry over.
    pub fn resolve_reconnection(
        &mut self,
        new_id: ParticipantId,
        nick: &str,
        avatar: Option<String>,
    ) -> Option<ParticipantId> {
        let old_id =
            identity::reconnect_candidate(&self.room.participants, nick)?
                .clone();
        let mut participant = self.room.participants.remove(&old_id)?;
        participant.connected = true;
        if avatar.is_some() {
            participant.avatar = avatar;
        }
        // The table entry follows its owner to the new id; history keeps
        // the id each roll was made under.
        if let Some(entry) = participant.table.as_mut() {
            entry.roller_id = new_id.clone();
        }
        self.room.participants.insert(new_id, participant);
        Some(old_id)
    }

    // -----------------------------------------------------------------
    // Rolls
    // -----------------------------------------------------------------

    /// Records a participant's roll: appended to history, then merged into
    /// their table.
    ///
    /// The table autoclears when the participant asked for it or the room
    /// forces it.
    pub fn append_roll(
        &mut self,
        id: &ParticipantId,
        record: RollRecord,
    ) -> Result<MergeOutcome, RoomError> {
        let force = self.room.settings.force_autoclear;
        let Some(participant) = self.room.participants.get_mut(id) else {
            return Err(RoomError::UnknownParticipant(id.clone()));
        };
        let autoclear = participant.autoclear || force;
        let outcome = merge_roll(&mut participant.table, &record, autoclear);
        push_history(&mut self.room.history, record);
        Ok(outcome)
    }

    /// Records a host roll on the host table.
    pub fn append_host_roll(
        &mut self,
        record: RollRecord,
        autoclear: bool,
    ) -> MergeOutcome {
        let outcome = merge_roll(&mut self.room.host_table, &record, autoclear);
        push_history(&mut self.room.history, record);
        outcome
    }

    /// `None` clears every participant table. The host table is only
    /// cleared by [`clear_host_table`](Self::clear_host_table).
    pub fn clear_table(
        &mut self,
        id: Option<&ParticipantId>,
    ) -> Result<(), RoomError> {
        match id {
            Some(id) => self.participant_mut(id)?.table = None,
            None => {
                for participant in self.room.participants.values_mut() {
                    participant.table = None;
                }
            }
        }
        Ok(())
    }

    pub fn clear_host_table(&mut self) {
        self.room.host_table = None;
    }

    pub fn clear_history(&mut self) {
        self.room.history.clear();
    }

    /// Owners whose table is autoclear-enabled and has been idle for at
    /// least `autoclear_seconds`. Empty when the timer is off.
    pub fn stale_tables(&self, now_ms: u64, host_autoclear: bool) -> Vec<Owner> {
        let settings = &self.room.settings;
        if settings.autoclear_seconds == 0 {
            return Vec::new();
        }
        let max_idle = u64::from(settings.autoclear_seconds) * 1000;
        let is_stale = |timestamp: u64| now_ms.saturating_sub(timestamp) >= max_idle;

        let mut stale = Vec::new();
        let host_table = self.room.host_table.as_ref();
        if (host_autoclear || settings.force_autoclear)
            && host_table.is_some_and(|t| is_stale(t.timestamp))
        {
            stale.push(Owner::Host);
        }
        for (id, p) in self.room.participants_by_join() {
            let autoclear = p.autoclear || settings.force_autoclear;
            if autoclear && p.table.as_ref().is_some_and(|t| is_stale(t.timestamp)) {
                stale.push(Owner::Participant(id.clone()));
            }
        }
        stale
    }

    // -----------------------------------------------------------------
    // Profiles and settings
    // -----------------------------------------------------------------

    /// Overwrites a nickname and, when given, the avatar. Uniqueness is
    /// the caller's job (see [`is_nickname_taken`](Self::is_nickname_taken)).
    pub fn update_profile(
        &mut self,
        target: &Owner,
        nick: impl Into<String>,
        avatar: Option<String>,
    ) -> Result<(), RoomError> {
        let nick = nick.into();
        match target {
            Owner::Host => {
                self.room.host_nick = nick;
                if avatar.is_some() {
                    self.room.host_avatar = avatar;
                }
            }
            Owner::Participant(id) => {
                let participant = self.participant_mut(id)?;
                participant.nick = nick;
                if avatar.is_some() {
                    participant.avatar = avatar;
                }
            }
        }
        Ok(())
    }

    pub fn set_autoclear(
        &mut self,
        id: &ParticipantId,
        enabled: bool,
    ) -> Result<(), RoomError> {
        self.participant_mut(id)?.autoclear = enabled;
        Ok(())
    }

    /// Replaces the room settings with their normalised form.
    pub fn update_settings(&mut self, settings: RoomSettings) {
        self.room.settings = settings.normalized();
    }

    pub fn is_nickname_taken(
        &self,
        nick: &str,
        exclude: Option<&ParticipantId>,
    ) -> bool {
        identity::nickname_taken(&self.room, nick, exclude)
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    /// The room as a versioned JSON snapshot.
    pub fn serialize(&self) -> Result<String, RoomError> {
        Ok(serde_json::to_string(&RoomSnapshot::from_room(&self.room))?)
    }

    /// Restores a store from [`serialize`](Self::serialize) output.
    ///
    /// Returns `None` if the blob is not a snapshot or names no room.
    /// Every restored participant is disconnected.
    pub fn deserialize(blob: &str) -> Option<Self> {
        let snapshot: RoomSnapshot = match serde_json::from_str(blob) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable room snapshot");
                return None;
            }
        };
        let (room, next_seq) = snapshot.into_room()?;
        Some(Self { room, next_seq })
    }

    fn participant_mut(
        &mut self,
        id: &ParticipantId,
    ) -> Result<&mut Participant, RoomError> {
        self.room
            .participants
            .get_mut(id)
            .ok_or_else(|| RoomError::UnknownParticipant(id.clone()))
    }
}

fn push_history(history: &mut VecDeque<RollRecord>, record: RollRecord) {
    history.push_back(record);
    while history.len() > HISTORY_LIMIT {
        history.pop_front();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use rolltable_protocol::{DiceGroup, Visibility};

    use super::*;

    fn store() -> RoomStore {
        RoomStore::create("table1", "DM", None)
    }

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn record(roller: &str, total: u64, timestamp: u64) -> RollRecord {
        RollRecord {
            roller_id: pid(roller),
            roller_nick: roller.into(),
            dice: vec![DiceGroup {
                sides: 20,
                count: 1,
                results: vec![total as u32],
            }],
            total,
            visibility: Visibility::Public,
            targets: vec![],
            timestamp,
        }
    }

    // =====================================================================
    // Membership
    // =====================================================================

    #[test]
    fn test_create_room_defaults() {
        let s = store();
        assert_eq!(s.room().room_name(), "table1");
        assert_eq!(s.room().host_nick(), "DM");
        assert_eq!(s.room().participant_count(), 0);
        assert!(s.room().history().is_empty());
        assert_eq!(*s.room().settings(), RoomSettings::default());
    }

    #[test]
    fn test_add_participant_starts_connected_with_empty_table() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", Some("img".into()));
        let p = s.room().participant(&pid("peer-1")).unwrap();
        assert!(p.connected);
        assert!(p.table.is_none());
        assert!(!p.autoclear);
        assert_eq!(p.avatar.as_deref(), Some("img"));
    }

    #[test]
    fn test_add_participant_overwrites_existing_record() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 5, 1)).unwrap();
        s.add_participant(pid("peer-1"), "Bob", None);
        let p = s.room().participant(&pid("peer-1")).unwrap();
        assert_eq!(p.nick, "Bob");
        assert!(p.table.is_none());
    }

    #[test]
    fn test_remove_participant_keeps_history() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 5, 1)).unwrap();

        let removed = s.remove_participant(&pid("peer-1")).unwrap();
        assert_eq!(removed.nick, "Alice");
        assert!(s.room().participant(&pid("peer-1")).is_none());
        assert_eq!(s.room().history().len(), 1);
    }

    #[test]
    fn test_mark_disconnected_keeps_record() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 5, 1)).unwrap();
        s.mark_disconnected(&pid("peer-1")).unwrap();

        let p = s.room().participant(&pid("peer-1")).unwrap();
        assert!(!p.connected);
        assert_eq!(p.nick, "Alice");
        assert!(p.table.is_some());
    }

    #[test]
    fn test_mark_disconnected_unknown_id_is_error() {
        let mut s = store();
        let before = s.room().clone();
        let result = s.mark_disconnected(&pid("peer-404"));
        assert!(matches!(result, Err(RoomError::UnknownParticipant(_))));
        assert_eq!(*s.room(), before);
    }

    // =====================================================================
    // Reconnection
    // =====================================================================

    #[test]
    fn test_reconnection_moves_record_to_new_id() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Bob", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 12, 1)).unwrap();
        s.set_autoclear(&pid("peer-1"), true).unwrap();
        s.mark_disconnected(&pid("peer-1")).unwrap();

        let old = s.resolve_reconnection(pid("peer-2"), "Bob", None);

        assert_eq!(old, Some(pid("peer-1")));
        assert!(s.room().participant(&pid("peer-1")).is_none());
        let p = s.room().participant(&pid("peer-2")).unwrap();
        assert!(p.connected);
        assert!(p.autoclear);
        assert_eq!(p.table.as_ref().unwrap().total, 12);
        // History keeps the id the roll was made under.
        assert_eq!(s.room().history()[0].roller_id, pid("peer-1"));
    }

    #[test]
    fn test_reconnection_ignores_connected_nick() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Bob", None);
        assert_eq!(s.resolve_reconnection(pid("peer-3"), "Bob", None), None);
        assert!(s.room().participant(&pid("peer-1")).is_some());
    }

    #[test]
    fn test_reconnection_twice_second_returns_none() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Bob", None);
        s.mark_disconnected(&pid("peer-1")).unwrap();
        assert!(s.resolve_reconnection(pid("peer-2"), "Bob", None).is_some());
        assert!(s.resolve_reconnection(pid("peer-3"), "Bob", None).is_none());
    }

    #[test]
    fn test_reconnection_keeps_avatar_unless_given() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Bob", Some("old".into()));
        s.mark_disconnected(&pid("peer-1")).unwrap();
        s.resolve_reconnection(pid("peer-2"), "Bob", None);
        assert_eq!(
            s.room().participant(&pid("peer-2")).unwrap().avatar.as_deref(),
            Some("old")
        );

        s.mark_disconnected(&pid("peer-2")).unwrap();
        s.resolve_reconnection(pid("peer-3"), "Bob", Some("new".into()));
        assert_eq!(
            s.room().participant(&pid("peer-3")).unwrap().avatar.as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_reconnection_preserves_join_order() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.add_participant(pid("peer-2"), "Bob", None);
        s.mark_disconnected(&pid("peer-1")).unwrap();
        s.resolve_reconnection(pid("peer-9"), "Alice", None);

        let order: Vec<_> = s
            .room()
            .participants_by_join()
            .into_iter()
            .map(|(_, p)| p.nick.as_str())
            .collect();
        assert_eq!(order, vec!["Alice", "Bob"]);
    }

    // =====================================================================
    // Rolls and tables
    // =====================================================================

    #[test]
    fn test_append_roll_merges_into_table() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 17, 1)).unwrap();
        let outcome =
            s.append_roll(&pid("peer-1"), record("peer-1", 8, 2)).unwrap();

        assert_eq!(outcome, MergeOutcome::Merged);
        let table = s.room().participant(&pid("peer-1")).unwrap().table.clone();
        let table = table.unwrap();
        assert_eq!(table.total, 25);
        assert_eq!(table.dice.len(), 2);
        assert_eq!(s.room().history().len(), 2);
        assert_eq!(s.room().history()[1].total, 8);
    }

    #[test]
    fn test_append_roll_with_autoclear_replaces_table() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.set_autoclear(&pid("peer-1"), true).unwrap();
        s.append_roll(&pid("peer-1"), record("peer-1", 17, 1)).unwrap();
        let outcome =
            s.append_roll(&pid("peer-1"), record("peer-1", 8, 2)).unwrap();

        assert_eq!(outcome, MergeOutcome::Reset);
        let p = s.room().participant(&pid("peer-1")).unwrap();
        assert_eq!(p.table.as_ref().unwrap().total, 8);
    }

    #[test]
    fn test_force_autoclear_overrides_preference() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.update_settings(RoomSettings {
            force_autoclear: true,
            ..RoomSettings::default()
        });
        s.append_roll(&pid("peer-1"), record("peer-1", 17, 1)).unwrap();
        let outcome =
            s.append_roll(&pid("peer-1"), record("peer-1", 8, 2)).unwrap();
        assert_eq!(outcome, MergeOutcome::Reset);
    }

    #[test]
    fn test_append_roll_unknown_participant_is_noop() {
        let mut s = store();
        let result = s.append_roll(&pid("ghost"), record("ghost", 3, 1));
        assert!(matches!(result, Err(RoomError::UnknownParticipant(_))));
        assert!(s.room().history().is_empty());
    }

    #[test]
    fn test_history_cap_keeps_newest_in_order() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        for ts in 0..(HISTORY_LIMIT as u64 + 1) {
            s.append_roll(&pid("peer-1"), record("peer-1", 1, ts)).unwrap();
        }
        let history = s.room().history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.front().unwrap().timestamp, 1);
        assert_eq!(history.back().unwrap().timestamp, HISTORY_LIMIT as u64);
    }

    #[test]
    fn test_clear_all_tables_leaves_host_table() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.add_participant(pid("peer-2"), "Bob", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 3, 1)).unwrap();
        s.append_roll(&pid("peer-2"), record("peer-2", 4, 1)).unwrap();
        s.append_host_roll(record("dm", 5, 1), false);

        s.clear_table(None).unwrap();

        assert!(s.room().table(&Owner::Participant(pid("peer-1"))).is_none());
        assert!(s.room().table(&Owner::Participant(pid("peer-2"))).is_none());
        assert!(s.room().host_table().is_some());

        s.clear_host_table();
        assert!(s.room().host_table().is_none());
    }

    #[test]
    fn test_clear_history_keeps_tables() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 3, 1)).unwrap();
        s.clear_history();
        assert!(s.room().history().is_empty());
        assert!(s.room().table(&Owner::Participant(pid("peer-1"))).is_some());
    }

    #[test]
    fn test_stale_tables_disabled_when_timer_off() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        s.set_autoclear(&pid("peer-1"), true).unwrap();
        s.append_roll(&pid("peer-1"), record("peer-1", 3, 0)).unwrap();
        assert!(s.stale_tables(u64::MAX, true).is_empty());
    }

    #[test]
    fn test_stale_tables_only_autoclear_owners_past_timeout() {
        let mut s = store();
        s.update_settings(RoomSettings {
            autoclear_seconds: 10,
            ..RoomSettings::default()
        });
        s.add_participant(pid("peer-1"), "Alice", None);
        s.add_participant(pid("peer-2"), "Bob", None);
        s.add_participant(pid("peer-3"), "Carol", None);
        s.set_autoclear(&pid("peer-1"), true).unwrap();
        s.set_autoclear(&pid("peer-3"), true).unwrap();
        s.append_roll(&pid("peer-1"), record("peer-1", 3, 1_000)).unwrap();
        s.append_roll(&pid("peer-2"), record("peer-2", 3, 1_000)).unwrap();
        s.append_roll(&pid("peer-3"), record("peer-3", 3, 8_000)).unwrap();
        s.append_host_roll(record("dm", 5, 1_000), true);

        assert_eq!(
            s.stale_tables(11_000, false),
            vec![Owner::Participant(pid("peer-1"))]
        );
        assert_eq!(
            s.stale_tables(11_000, true),
            vec![Owner::Host, Owner::Participant(pid("peer-1"))]
        );
    }

    // =====================================================================
    // Profiles and nicknames
    // =====================================================================

    #[test]
    fn test_nickname_taken_by_host() {
        let s = store();
        assert!(s.is_nickname_taken("DM", None));
        assert!(s.is_nickname_taken("  DM ", Some(&pid("peer-1"))));
        assert!(!s.is_nickname_taken("DM", Some(&ParticipantId::host())));
    }

    #[test]
    fn test_nickname_taken_by_connected_participant_only() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Bob", None);
        assert!(s.is_nickname_taken("Bob", None));
        assert!(!s.is_nickname_taken("Bob", Some(&pid("peer-1"))));
        assert!(!s.is_nickname_taken("bob", None));

        s.mark_disconnected(&pid("peer-1")).unwrap();
        assert!(!s.is_nickname_taken("Bob", None));
    }

    #[test]
    fn test_update_profile_participant_and_host() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", Some("a".into()));
        s.update_profile(&Owner::Participant(pid("peer-1")), "Alicia", None)
            .unwrap();
        let p = s.room().participant(&pid("peer-1")).unwrap();
        assert_eq!(p.nick, "Alicia");
        assert_eq!(p.avatar.as_deref(), Some("a"));

        s.update_profile(&Owner::Host, "GM", Some("crown".into())).unwrap();
        assert_eq!(s.room().host_nick(), "GM");
        assert_eq!(s.room().host_avatar(), Some("crown"));
    }

    #[test]
    fn test_update_profile_unknown_participant() {
        let mut s = store();
        let result = s.update_profile(&Owner::Participant(pid("x")), "X", None);
        assert!(matches!(result, Err(RoomError::UnknownParticipant(_))));
    }

    #[test]
    fn test_update_settings_normalizes() {
        let mut s = store();
        s.update_settings(RoomSettings {
            crit_hit_threshold: 0,
            crit_fail_threshold: 9999,
            ..RoomSettings::default()
        });
        assert_eq!(s.room().settings().crit_hit_threshold, 20);
        assert_eq!(s.room().settings().crit_fail_threshold, 1);
    }

    // =====================================================================
    // Snapshots
    // =====================================================================

    #[test]
    fn test_snapshot_round_trip() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", Some("img".into()));
        s.add_participant(pid("peer-2"), "Bob", None);
        s.append_roll(&pid("peer-1"), record("peer-1", 17, 1)).unwrap();
        s.append_host_roll(record("dm", 3, 2), false);

        let blob = s.serialize().unwrap();
        let restored = RoomStore::deserialize(&blob).unwrap();
        let room = restored.room();

        assert_eq!(room.room_name(), "table1");
        assert_eq!(room.host_nick(), "DM");
        assert_eq!(room.participant_count(), 2);
        assert_eq!(room.history().len(), 2);
        assert_eq!(room.host_table().unwrap().total, 3);
        assert!(room.participants().all(|(_, p)| !p.connected));
        assert_eq!(
            room.participant(&pid("peer-1")).unwrap().table.as_ref().unwrap().total,
            17
        );
    }

    #[test]
    fn test_restored_participants_reconnect_by_nick() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        let blob = s.serialize().unwrap();

        let mut restored = RoomStore::deserialize(&blob).unwrap();
        assert_eq!(
            restored.resolve_reconnection(pid("peer-7"), "Alice", None),
            Some(pid("peer-1"))
        );
        // New joins continue the sequence after restored ones.
        restored.add_participant(pid("peer-8"), "Zed", None);
        let order: Vec<_> = restored
            .room()
            .participants_by_join()
            .into_iter()
            .map(|(_, p)| p.nick.as_str())
            .collect();
        assert_eq!(order, vec!["Alice", "Zed"]);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(RoomStore::deserialize("not json").is_none());
        assert!(RoomStore::deserialize("[1,2,3]").is_none());
    }

    #[test]
    fn test_deserialize_rejects_missing_or_empty_room_name() {
        assert!(RoomStore::deserialize("{}").is_none());
        assert!(RoomStore::deserialize(r#"{"roomName": "  "}"#).is_none());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let restored =
            RoomStore::deserialize(r#"{"roomName": "crypt"}"#).unwrap();
        let room = restored.room();
        assert_eq!(room.room_name(), "crypt");
        assert_eq!(room.host_nick(), crate::snapshot::DEFAULT_HOST_NICK);
        assert_eq!(*room.settings(), RoomSettings::default());
        assert_eq!(room.participant_count(), 0);
        assert!(room.history().is_empty());
    }

    #[test]
    fn test_deserialize_normalizes_settings_and_caps_history() {
        let mut s = store();
        s.add_participant(pid("peer-1"), "Alice", None);
        for ts in 0..10 {
            s.append_roll(&pid("peer-1"), record("peer-1", 1, ts)).unwrap();
        }
        let mut json: serde_json::Value =
            serde_json::from_str(&s.serialize().unwrap()).unwrap();
        let history = json["history"].as_array().unwrap().clone();
        let mut oversized = Vec::new();
        for _ in 0..60 {
            oversized.extend(history.iter().cloned());
        }
        json["history"] = serde_json::Value::Array(oversized);
        json["settings"]["critHitThreshold"] = serde_json::json!(2);
        json["settings"]["critFailThreshold"] = serde_json::json!(5);

        let restored = RoomStore::deserialize(&json.to_string()).unwrap();
        assert_eq!(restored.room().history().len(), HISTORY_LIMIT);
        assert_eq!(restored.room().settings().crit_hit_threshold, 20);
        assert_eq!(restored.room().settings().crit_fail_threshold, 1);
    }
}
