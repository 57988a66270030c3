//! User directory: the store authentication runs against. Records carry the
//! role assignment and the Argon2 password hash; emails are the stable
//! identifier and are normalized to lowercase on the way in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Role;
use crate::security;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@skillgrid.local";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Build a fresh record, hashing the password and normalizing the email.
    pub fn new(email: &str, display_name: &str, password: &str, role: Role, department: &str) -> Result<Self> {
        Ok(UserRecord {
            id: Uuid::new_v4().to_string(),
            email: email.to_lowercase(),
            display_name: display_name.to_string(),
            role,
            department: department.to_string(),
            password_hash: security::hash_password(password)?,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        })
    }
}

/// Store of user records. Implementations persist however they like; lookups
/// are case-insensitive on email.
pub trait Directory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    fn upsert(&self, record: UserRecord) -> Result<()>;
    fn remove(&self, email: &str) -> Result<()>;
    fn set_active(&self, email: &str, active: bool) -> Result<bool>;
    fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<()>;
    fn list(&self) -> Result<Vec<UserRecord>>;
}

/// In-memory directory for tests and embedded use.
#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Directory for MemoryDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().get(&email.to_lowercase()).cloned())
    }

    fn upsert(&self, record: UserRecord) -> Result<()> {
        self.users.write().insert(record.email.clone(), record);
        Ok(())
    }

    fn remove(&self, email: &str) -> Result<()> {
        self.users.write().remove(&email.to_lowercase());
        Ok(())
    }

    fn set_active(&self, email: &str, active: bool) -> Result<bool> {
        let mut users = self.users.write();
        match users.get_mut(&email.to_lowercase()) {
            Some(u) => {
                u.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(u) = self.users.write().get_mut(&email.to_lowercase()) {
            u.last_login = Some(at);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<UserRecord>> {
        Ok(self.users.read().values().cloned().collect())
    }
}

fn users_path(data_root: &str) -> PathBuf {
    Path::new(data_root).join("users.json")
}

/// File-backed directory: the whole record set as one JSON document, rewritten
/// on every mutation. The record count here is an organization's user roster,
/// not bulk data.
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(data_root: &str) -> Self {
        Self { path: users_path(data_root) }
    }

    fn read_all(&self) -> Result<BTreeMap<String, UserRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading user directory {}", self.path.display()))?;
        let records: Vec<UserRecord> =
            serde_json::from_str(&raw).with_context(|| format!("parsing user directory {}", self.path.display()))?;
        Ok(records.into_iter().map(|r| (r.email.clone(), r)).collect())
    }

    fn write_all(&self, users: &BTreeMap<String, UserRecord>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).ok();
        }
        let records: Vec<&UserRecord> = users.values().collect();
        let raw = serde_json::to_string_pretty(&records)?;
        // Write-then-rename so a crash mid-write never truncates the roster.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).with_context(|| format!("writing user directory {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing user directory {}", self.path.display()))?;
        Ok(())
    }
}

impl Directory for FileDirectory {
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.read_all()?.get(&email.to_lowercase()).cloned())
    }

    fn upsert(&self, record: UserRecord) -> Result<()> {
        let mut users = self.read_all()?;
        users.insert(record.email.clone(), record);
        self.write_all(&users)
    }

    fn remove(&self, email: &str) -> Result<()> {
        let mut users = self.read_all()?;
        users.remove(&email.to_lowercase());
        self.write_all(&users)
    }

    fn set_active(&self, email: &str, active: bool) -> Result<bool> {
        let mut users = self.read_all()?;
        match users.get_mut(&email.to_lowercase()) {
            Some(u) => {
                u.is_active = active;
                self.write_all(&users)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.read_all()?;
        if let Some(u) = users.get_mut(&email.to_lowercase()) {
            u.last_login = Some(at);
            self.write_all(&users)?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<UserRecord>> {
        Ok(self.read_all()?.into_values().collect())
    }
}

/// First-run bootstrap: seed the default admin account when the directory
/// file does not exist yet. Idempotent across restarts.
pub fn ensure_default_admin(data_root: &str) -> Result<()> {
    let path = users_path(data_root);
    if path.exists() {
        return Ok(());
    }
    let dir = FileDirectory::new(data_root);
    let admin = UserRecord::new(DEFAULT_ADMIN_EMAIL, "Skillgrid Admin", "skillgrid", Role::Admin, "IT")?;
    dir.upsert(admin)?;
    tracing::info!("seeded default admin account {}", DEFAULT_ADMIN_EMAIL);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_directory_lookup_is_case_insensitive() {
        let dir = MemoryDirectory::new();
        let rec = UserRecord::new("Casey@Example.com", "Casey", "pw", Role::Employee, "Ops").unwrap();
        dir.upsert(rec).unwrap();
        assert!(dir.find_by_email("casey@example.com").unwrap().is_some());
        assert!(dir.find_by_email("CASEY@EXAMPLE.COM").unwrap().is_some());
    }

    #[test]
    fn set_active_reports_missing_users() {
        let dir = MemoryDirectory::new();
        assert!(!dir.set_active("nobody@example.com", false).unwrap());
    }
}
