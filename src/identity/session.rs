//! Session lifecycle: a durable principal snapshot behind a swappable store.
//! The store is injected, never a module-level singleton, so tests run
//! in-memory and production picks a file-backed medium.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::tprintln;

use super::principal::Principal;

/// Backing medium for the serialized session snapshot. `load` returns the raw
/// snapshot text when one exists; `save` replaces any prior snapshot
/// wholesale; `clear` is a no-op when nothing is stored.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, raw: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-memory store for tests and embedded callers.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, raw: &str) -> Result<()> {
        *self.slot.lock() = Some(raw.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// File-backed store: one JSON document under the data root.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(data_root: &str) -> Self {
        Self { path: Path::new(data_root).join("session.json") }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading session snapshot {}", self.path.display()))?;
        Ok(Some(raw))
    }

    fn save(&self, raw: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).ok();
        }
        std::fs::write(&self.path, raw)
            .with_context(|| format!("writing session snapshot {}", self.path.display()))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("clearing session snapshot {}", self.path.display())),
        }
    }
}

pub struct SessionManager {
    store: Box<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySessionStore::new()))
    }

    pub fn file_backed(data_root: &str) -> Self {
        Self::new(Box::new(FileSessionStore::new(data_root)))
    }

    /// Persist the principal as the current session, replacing any prior one.
    pub fn establish(&self, principal: &Principal) -> Result<()> {
        let raw = serde_json::to_string(principal).context("serializing session snapshot")?;
        self.store.save(&raw)?;
        tprintln!("session.establish user={}", principal.email);
        Ok(())
    }

    /// Restore the persisted session, if any. A malformed or incomplete
    /// snapshot is cleared and reported as "no session" — corruption
    /// self-heals and never surfaces to the caller.
    pub fn restore(&self) -> Option<Principal> {
        let raw = match self.store.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("session restore failed to read store: {e}");
                return None;
            }
        };
        match serde_json::from_str::<Principal>(&raw) {
            Ok(p) if !p.id.is_empty() && !p.email.is_empty() => Some(p),
            Ok(_) => {
                tracing::warn!("session snapshot missing identity fields; clearing");
                let _ = self.store.clear();
                None
            }
            Err(e) => {
                tracing::warn!("corrupt session snapshot; clearing: {e}");
                let _ = self.store.clear();
                None
            }
        }
    }

    /// Tear the session down. Safe to call when no session exists.
    pub fn end(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("session clear failed: {e}");
        }
        tprintln!("session.end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::role::{resolve_permissions, Role};
    use chrono::Utc;

    fn principal() -> Principal {
        Principal {
            id: "u-3".into(),
            email: "kim@example.com".into(),
            name: "Kim".into(),
            role: Role::TeamLead,
            department: "Support".into(),
            permissions: resolve_permissions(Role::TeamLead),
            is_active: true,
            created_at: Utc::now(),
            last_login: Some(Utc::now()),
        }
    }

    #[test]
    fn establish_then_restore_round_trips() {
        let sm = SessionManager::in_memory();
        let p = principal();
        sm.establish(&p).unwrap();
        let restored = sm.restore().expect("snapshot should restore");
        assert_eq!(restored, p, "all fields including timestamps must survive the round trip");
    }

    #[test]
    fn restore_without_session_is_none() {
        let sm = SessionManager::in_memory();
        assert!(sm.restore().is_none());
    }

    #[test]
    fn corrupt_snapshot_clears_and_restores_none() {
        let store = MemorySessionStore::new();
        store.save("{not valid json").unwrap();
        let sm = SessionManager::new(Box::new(store));
        assert!(sm.restore().is_none());
        // Second restore sees an empty store: the corrupt snapshot was cleared.
        assert!(sm.restore().is_none());
    }

    #[test]
    fn snapshot_missing_identity_fields_is_corruption() {
        let store = MemorySessionStore::new();
        store
            .save(r#"{"id":"","email":"","name":"","role":"employee","is_active":true,"created_at":"2026-01-01T00:00:00Z"}"#)
            .unwrap();
        let sm = SessionManager::new(Box::new(store));
        assert!(sm.restore().is_none(), "blank identity fields must not produce a principal");
    }

    #[test]
    fn end_is_a_noop_without_a_session() {
        let sm = SessionManager::in_memory();
        sm.end();
        sm.end();
    }

    #[test]
    fn establish_replaces_prior_snapshot() {
        let sm = SessionManager::in_memory();
        let mut p = principal();
        sm.establish(&p).unwrap();
        p.email = "kim2@example.com".into();
        sm.establish(&p).unwrap();
        assert_eq!(sm.restore().unwrap().email, "kim2@example.com");
    }
}
