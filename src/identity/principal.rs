//! The authenticated actor whose permissions are being checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::permission::Permission;
use super::role::Role;

/// Principal carries the permission set resolved from the registry at login
/// time. Checks test this snapshot, never the live registry; re-login is the
/// only way to pick up registry changes mid-session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Principal {
    /// Identity match against a target record, by stable email identifier.
    /// Emails are matched case-insensitively; empty strings never match.
    pub fn is_self(&self, target_email: &str) -> bool {
        !self.email.is_empty() && self.email.eq_ignore_ascii_case(target_email)
    }
}
