//! Snapshot persistence backends.
//!
//! The dispatcher hands a serialized room to a [`SnapshotStore`] after
//! every mutation and logs (but otherwise ignores) failures: the in-memory
//! room stays authoritative.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::PersistError;

/// Where room snapshots are kept, keyed by room name.
///
/// Snapshots are opaque strings here; [`RoomStore`](crate::RoomStore)
/// produces and parses them. A store only has to hand back the last string
/// saved under a name.
///
/// ## Trait bounds
///
/// - `Send + Sync`: the dispatcher holds it as `Box<dyn SnapshotStore>`
///   inside the host actor, and tests keep an `Arc` to the same store to
///   inspect what was written.
/// - Methods are synchronous. Saves happen inside the actor after each
///   mutation, and a room snapshot is small enough that a blocking write
///   is acceptable there.
///
/// Errors never reach players. The dispatcher logs them at `warn` and
/// carries on with the in-memory room.
pub trait SnapshotStore: Send + Sync {
    /// Replaces whatever was saved for `room_name`.
    ///
    /// Implementations should make the write atomic: a crash mid-save must
    /// leave either the old snapshot or the new one, never a torn file.
    fn save(&self, room_name: &str, snapshot: &str) -> Result<(), PersistError>;

    /// `Ok(None)` if nothing was ever saved for this room.
    fn load(&self, room_name: &str) -> Result<Option<String>, PersistError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn save(&self, room_name: &str, snapshot: &str) -> Result<(), PersistError> {
        (**self).save(room_name, snapshot)
    }

    fn load(&self, room_name: &str) -> Result<Option<String>, PersistError> {
        (**self).load(room_name)
    }
}

/// Keeps snapshots in process memory. Useful for tests and for hosts that
/// do not want anything written to disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, room_name: &str, snapshot: &str) -> Result<(), PersistError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(room_name.to_string(), snapshot.to_string());
        Ok(())
    }

    fn load(&self, room_name: &str) -> Result<Option<String>, PersistError> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(room_name)
            .cloned())
    }
}

/// One JSON file per room inside a directory.
///
/// Room names are sanitised into file names: anything other than ASCII
/// letters, digits, `-` and `_` becomes `_`. Writes go to a temporary file
/// first and are renamed into place, so a crash mid-write leaves the
/// previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a room's snapshot lives in.
    pub fn path_for(&self, room_name: &str) -> Result<PathBuf, PersistError> {
        let key: String = room_name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if key.is_empty() || key.chars().all(|c| c == '_') {
            return Err(PersistError::InvalidKey(room_name.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SnapshotStore for FileStore {
    fn save(&self, room_name: &str, snapshot: &str) -> Result<(), PersistError> {
        let path = self.path_for(room_name)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, snapshot)?;
        std::fs::rename(&tmp, &path)?;
        tracing::trace!(path = %path.display(), "snapshot written");
        Ok(())
    }

    fn load(&self, room_name: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(room_name)?;
        match std::fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
