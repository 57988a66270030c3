//! Stateless authorization engine: permission-set membership checks plus the
//! static resource-rule table. Every check is a total function over the
//! principal and the population data; misconfiguration denies, never throws.

use serde::{Deserialize, Serialize};

use super::permission::Permission;
use super::principal::Principal;

/// Engine output. The reason code feeds deny rendering and the audit trail;
/// it is never persisted as state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessDecision {
    pub allow: bool,
    pub reason: Option<String>,
}

impl AccessDecision {
    pub fn allow(reason: &str) -> Self {
        AccessDecision { allow: true, reason: Some(reason.into()) }
    }

    pub fn deny(reason: &str) -> Self {
        AccessDecision { allow: false, reason: Some(reason.into()) }
    }
}

/// Static resource-rule table: resource name to the permission set where any
/// one grant suffices. Unknown resources resolve to the empty set, which can
/// satisfy nothing — unknown resources are never implicitly allowed.
pub fn required_permissions(resource: &str) -> &'static [Permission] {
    match resource {
        "employees" => &[
            Permission::ViewAllEmployees,
            Permission::ViewTeamProfiles,
            Permission::ViewDepartmentProfiles,
        ],
        "assessments" => &[Permission::ConductAssessments, Permission::ViewOwnAssessments],
        "job-profiles" => &[Permission::ManageJobProfiles],
        "organization" => &[Permission::ViewOrganizationDashboard],
        "settings" => &[Permission::SystemConfiguration],
        "users" => &[Permission::ManageUsers],
        "permissions" => &[Permission::ManagePermissions],
        "audit" => &[Permission::ViewAuditLogs],
        "profile" => &[Permission::ViewOwnProfile],
        _ => &[],
    }
}

/// True iff the principal's resolved set contains the permission. An absent
/// principal holds nothing.
pub fn has_permission(principal: Option<&Principal>, permission: Permission) -> bool {
    match principal {
        Some(p) => p.permissions.contains(&permission),
        None => false,
    }
}

/// True iff the requirement list is non-empty and intersects the principal's
/// set. The empty list satisfies nobody, admin included: there is nothing to
/// satisfy, so callers must state a requirement.
pub fn has_any_permission(principal: Option<&Principal>, required: &[Permission]) -> bool {
    let Some(p) = principal else { return false };
    required.iter().any(|r| p.permissions.contains(r))
}

/// Resource/action gate. The table is keyed by resource alone; `action` is
/// accepted so call sites keep their shape when per-action rules arrive.
pub fn can_access_resource(principal: Option<&Principal>, resource: &str, _action: &str) -> bool {
    if principal.is_none() {
        return false;
    }
    has_any_permission(principal, required_permissions(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::role::{resolve_permissions, Role};
    use chrono::Utc;

    fn principal_with(role: Role) -> Principal {
        Principal {
            id: "u-1".into(),
            email: "p@example.com".into(),
            name: "P".into(),
            role,
            department: "Ops".into(),
            permissions: resolve_permissions(role),
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn membership_is_exact() {
        let p = principal_with(Role::Employee);
        assert!(has_permission(Some(&p), Permission::ViewOwnProfile));
        assert!(!has_permission(Some(&p), Permission::ManageUsers));
    }

    #[test]
    fn absent_principal_holds_nothing() {
        assert!(!has_permission(None, Permission::ViewOwnProfile));
        assert!(!has_any_permission(None, &[Permission::ViewOwnProfile]));
        assert!(!can_access_resource(None, "profile", "view"));
    }

    #[test]
    fn empty_requirement_list_denies_even_admin() {
        let admin = principal_with(Role::Admin);
        assert!(!has_any_permission(Some(&admin), &[]));
    }

    #[test]
    fn unknown_resource_always_denies() {
        let admin = principal_with(Role::Admin);
        assert!(!can_access_resource(Some(&admin), "unknown-resource-xyz", "view"));
    }

    #[test]
    fn resource_rules_use_or_semantics() {
        // Team lead lacks view_all_employees but holds view_team_profiles,
        // which alone satisfies the employees rule.
        let lead = principal_with(Role::TeamLead);
        assert!(can_access_resource(Some(&lead), "employees", "view"));
        let assessor = principal_with(Role::Assessor);
        assert!(!can_access_resource(Some(&assessor), "employees", "view"));
    }

    #[test]
    fn employee_cannot_reach_organization_dashboard() {
        let p = principal_with(Role::Employee);
        assert!(!can_access_resource(Some(&p), "organization", "view"));
        assert!(!has_any_permission(Some(&p), &[Permission::ManageUsers]));
    }
}
