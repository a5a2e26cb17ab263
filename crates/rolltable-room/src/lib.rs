//! Authoritative room state for Rolltable.
//!
//! The host holds the only writable copy of the room. Players hold
//! mirrors that are kept up to date by the messages this crate decides to
//! send.
//!
//! # Key types
//!
//! - [`RoomStore`]: owns the [`Room`] and every operation that changes it
//! - [`HostDispatcher`]: turns player messages and host actions into store
//!   updates plus [`Outbound`] messages
//! - [`project_view`]: the room as one player is allowed to see it
//! - [`SnapshotStore`]: where snapshots go ([`MemoryStore`], [`FileStore`])

mod dispatcher;
mod error;
mod identity;
mod merge;
mod model;
mod persist;
mod snapshot;
mod store;
mod view;

pub use dispatcher::{HostDispatcher, Outbound, Recipient};
pub use error::{DispatchError, PersistError, RoomError};
pub use merge::{MergeOutcome, merge_roll};
pub use model::{HISTORY_LIMIT, Owner, Participant, Room};
pub use persist::{FileStore, MemoryStore, SnapshotStore};
pub use snapshot::{DEFAULT_HOST_NICK, SNAPSHOT_VERSION};
pub use store::{RoomStore, now_millis};
pub use view::{is_visible, player_list, project_view};
