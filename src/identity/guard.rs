//! Consumer-facing resource guard. Wraps the engine with the pinned
//! precedence: resource rule first and final, then the self-access override,
//! then the permission list, then open.

use serde::{Deserialize, Serialize};

use super::authorizer::{self, AccessDecision};
use super::permission::Permission;
use super::principal::Principal;

/// What a call site requires before its operation may run. `permissions:
/// Some(vec![])` means a requirement was stated with nothing that could
/// satisfy it (denies); `None` means no permission requirement at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessRequest {
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub allow_self_access: bool,
}

/// Per-evaluation context: the record under access (for the self-access
/// identity match) and the request id threaded into the audit trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessContext {
    #[serde(default)]
    pub target_email: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Evaluate a guard request against the current principal.
///
/// Precedence is pinned and intentional: a resource rule, when present, is
/// evaluated first and its verdict is final — a failing resource check denies
/// even a self-access-eligible caller. The self-access override applies only
/// to the permission-list path, grants read access only, and requires the
/// baseline view-own permission. Absent any criteria the route is open.
pub fn evaluate(
    principal: Option<&Principal>,
    request: &AccessRequest,
    ctx: &AccessContext,
) -> AccessDecision {
    if let Some(resource) = request.resource.as_deref() {
        let action = request.action.as_deref().unwrap_or("view");
        if principal.is_none() {
            return AccessDecision::deny("unauthenticated");
        }
        return if authorizer::can_access_resource(principal, resource, action) {
            AccessDecision::allow("resource_rule")
        } else {
            AccessDecision::deny("resource_rule")
        };
    }

    if request.allow_self_access {
        if let (Some(p), Some(target)) = (principal, ctx.target_email.as_deref()) {
            if p.is_self(target) && authorizer::has_permission(principal, Permission::ViewOwnProfile) {
                return AccessDecision::allow("self_access");
            }
        }
    }

    if let Some(required) = request.permissions.as_deref() {
        if principal.is_none() {
            return AccessDecision::deny("unauthenticated");
        }
        return if authorizer::has_any_permission(principal, required) {
            AccessDecision::allow("permission_match")
        } else {
            AccessDecision::deny("missing_permission")
        };
    }

    // No criteria supplied: open route.
    AccessDecision::allow("open_route")
}
