//! Authentication provider: credentials in, principal out, snapshot stored.

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::directory::Directory;
use crate::security;
use crate::tprintln;

use super::audit;
use super::principal::Principal;
use super::role::resolve_permissions;
use super::session::SessionManager;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> Result<Principal>;
}

/// Provider backed by the user directory. Unknown account, wrong password and
/// inactive account all collapse to the same generic failure so the login
/// surface never confirms which accounts exist; the distinction is logged
/// internally.
pub struct DirectoryAuthProvider {
    pub directory: Arc<dyn Directory>,
    pub sessions: SessionManager,
}

impl DirectoryAuthProvider {
    pub fn new(directory: Arc<dyn Directory>, sessions: SessionManager) -> Self {
        Self { directory, sessions }
    }

    fn invalid_credentials(email: &str, detail: &str) -> anyhow::Error {
        tracing::warn!(email = %email, detail = %detail, "login rejected");
        audit::emit(&audit::AuditEvent::login(email, false, detail));
        anyhow!("invalid_credentials")
    }
}

impl AuthProvider for DirectoryAuthProvider {
    fn login(&self, req: &LoginRequest) -> Result<Principal> {
        let Some(record) = self.directory.find_by_email(&req.email)? else {
            return Err(Self::invalid_credentials(&req.email, "unknown_account"));
        };
        if !record.is_active {
            return Err(Self::invalid_credentials(&req.email, "inactive_account"));
        }
        if !security::verify_password(&record.password_hash, &req.password) {
            return Err(Self::invalid_credentials(&req.email, "bad_password"));
        }

        let now = chrono::Utc::now();
        self.directory.record_login(&record.email, now)?;

        // The permission set is copied from the registry here, once. The
        // principal keeps this snapshot for its whole session.
        let principal = Principal {
            id: record.id.clone(),
            email: record.email.clone(),
            name: record.display_name.clone(),
            role: record.role,
            department: record.department.clone(),
            permissions: resolve_permissions(record.role),
            is_active: record.is_active,
            created_at: record.created_at,
            last_login: Some(now),
        };
        self.sessions.establish(&principal)?;
        audit::emit(&audit::AuditEvent::login(&principal.email, true, "ok"));
        tprintln!("auth.login user={} role={}", principal.email, principal.role);
        Ok(principal)
    }
}
