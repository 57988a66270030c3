//! Identity core: the permission catalog, role registry, principal model,
//! authorization engine, resource guard and session lifecycle.
//! Keep the public surface thin and split implementation across sub-modules.

pub mod audit;
mod authorizer;
mod guard;
mod permission;
mod principal;
mod provider;
mod request_context;
mod role;
mod session;

pub use authorizer::{can_access_resource, has_any_permission, has_permission, required_permissions, AccessDecision};
pub use guard::{evaluate, AccessContext, AccessRequest};
pub use permission::{Permission, UnknownToken, ALL_PERMISSIONS};
pub use principal::Principal;
pub use provider::{AuthProvider, DirectoryAuthProvider, LoginRequest};
pub use request_context::RequestContext;
pub use role::{grant_for, resolve_permissions, verify_registry, Role, RoleGrant, ALL_ROLES};
pub use session::{FileSessionStore, MemorySessionStore, SessionManager, SessionStore};
