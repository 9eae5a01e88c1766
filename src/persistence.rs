// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable storage for the session credential bundle.
//!
//! The bundle is a single JSON record under [`STORAGE_KEY`]. A record that is
//! missing and a record that does not parse are the same thing to callers:
//! there is no session.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::PersistenceError;
use crate::models::StoredSession;

/// Fixed key the session record is stored under.
pub const STORAGE_KEY: &str = "mailcheck.session";

/// Load/save/clear access to the persisted session.
///
/// Access is synchronous and local. Implementations must make `save` and
/// `clear` all-or-nothing.
pub trait SessionPersistence: Send + Sync {
    /// Read the stored session, or `None` if absent or unreadable.
    fn load(&self) -> Option<StoredSession>;

    fn save(&self, session: &StoredSession) -> Result<(), PersistenceError>;

    fn clear(&self) -> Result<(), PersistenceError>;
}

fn decode(raw: &str) -> Option<StoredSession> {
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable persisted session");
            None
        }
    }
}

// ─── File storage ────────────────────────────────────────────

/// Session stored as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        // Unique per call: saves from one process may overlap.
        self.path
            .with_extension(format!("json.tmp-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> Option<StoredSession> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to read session file");
                None
            }
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(session)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        // Write next to the target and rename so readers never see half a record.
        let tmp = self.temp_path();
        let written = write_private(&tmp, &json).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

// ─── In-memory storage ───────────────────────────────────────

/// Key/value storage held in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw record under [`STORAGE_KEY`], exactly as stored.
    pub fn raw(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(STORAGE_KEY)
            .cloned()
    }

    /// Replace the raw record, bypassing serialization.
    pub fn set_raw(&self, raw: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(STORAGE_KEY.to_string(), raw.into());
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load(&self) -> Option<StoredSession> {
        self.raw().as_deref().and_then(decode)
    }

    fn save(&self, session: &StoredSession) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(session)?;
        self.set_raw(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(STORAGE_KEY);
        Ok(())
    }
}

impl<T: SessionPersistence + ?Sized> SessionPersistence for Arc<T> {
    fn load(&self) -> Option<StoredSession> {
        (**self).load()
    }

    fn save(&self, session: &StoredSession) -> Result<(), PersistenceError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use serde_json::json;

    fn stored() -> StoredSession {
        let user: User = serde_json::from_value(json!({
            "id": "u1", "name": "Ada", "email": "ada@example.com", "role": "admin"
        }))
        .unwrap();
        StoredSession {
            user: user.with_token("t1"),
            token: "t1".to_string(),
        }
    }

    #[test]
    fn test_memory_store_save_load_clear() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());

        store.save(&stored()).unwrap();
        assert_eq!(store.load(), Some(stored()));

        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_memory_store_garbage_is_no_session() {
        let store = MemorySessionStore::new();
        store.set_raw("{not json");
        assert!(store.load().is_none());

        store.set_raw(r#"{"user": null, "token": "t1"}"#);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemorySessionStore::new();
        let other = store.clone();
        store.save(&stored()).unwrap();
        assert!(other.load().is_some());
    }

    #[test]
    fn test_file_store_path_uses_storage_key() {
        let store = FileSessionStore::new("/var/lib/portal");
        assert_eq!(
            store.path(),
            Path::new("/var/lib/portal/mailcheck.session.json")
        );
    }
}
