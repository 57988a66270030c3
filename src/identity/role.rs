//! Role enumeration and the static role-permission registry.
//! The registry is population data: one entry per role, read-only at runtime.
//! Privilege ordering across roles is encoded by enumeration, not computed.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::permission::{Permission, UnknownToken, ALL_PERMISSIONS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    HrManager,
    DepartmentManager,
    TeamLead,
    Assessor,
    Employee,
}

pub const ALL_ROLES: &[Role] = &[
    Role::Admin,
    Role::HrManager,
    Role::DepartmentManager,
    Role::TeamLead,
    Role::Assessor,
    Role::Employee,
];

/// One registry entry: the granted permission set plus a human-readable
/// description of the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrant {
    pub permissions: &'static [Permission],
    pub description: &'static str,
}

const HR_MANAGER_GRANTS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::EditOwnSkills,
    Permission::ViewOwnAssessments,
    Permission::ViewAllEmployees,
    Permission::EditEmployeeProfiles,
    Permission::ManageJobProfiles,
    Permission::ViewOrganizationDashboard,
    Permission::ConductAssessments,
];

const DEPARTMENT_MANAGER_GRANTS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::EditOwnSkills,
    Permission::ViewOwnAssessments,
    Permission::ViewDepartmentProfiles,
    Permission::ConductAssessments,
    Permission::ViewOrganizationDashboard,
];

const TEAM_LEAD_GRANTS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::EditOwnSkills,
    Permission::ViewOwnAssessments,
    Permission::ViewTeamProfiles,
    Permission::ConductAssessments,
];

const ASSESSOR_GRANTS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::ViewOwnAssessments,
    Permission::ConductAssessments,
];

const EMPLOYEE_GRANTS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::EditOwnSkills,
    Permission::ViewOwnAssessments,
];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::HrManager => "hr_manager",
            Role::DepartmentManager => "department_manager",
            Role::TeamLead => "team_lead",
            Role::Assessor => "assessor",
            Role::Employee => "employee",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ROLES
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownToken(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry lookup. Total over the closed role set; admin holds the whole
/// catalog by enumeration rather than by wildcard.
pub fn grant_for(role: Role) -> RoleGrant {
    match role {
        Role::Admin => RoleGrant {
            permissions: ALL_PERMISSIONS,
            description: "Full administrative control, including configuration and permission management",
        },
        Role::HrManager => RoleGrant {
            permissions: HR_MANAGER_GRANTS,
            description: "Organization-wide employee and job-profile management",
        },
        Role::DepartmentManager => RoleGrant {
            permissions: DEPARTMENT_MANAGER_GRANTS,
            description: "Department-scoped profiles, assessments and dashboards",
        },
        Role::TeamLead => RoleGrant {
            permissions: TEAM_LEAD_GRANTS,
            description: "Team-scoped profiles and assessment duties",
        },
        Role::Assessor => RoleGrant {
            permissions: ASSESSOR_GRANTS,
            description: "Conducts assessments without profile management rights",
        },
        Role::Employee => RoleGrant {
            permissions: EMPLOYEE_GRANTS,
            description: "Own profile, skills and assessment history",
        },
    }
}

/// Copy a role's granted set out of the registry. Principals hold this copy;
/// later registry edits are picked up only at next login.
pub fn resolve_permissions(role: Role) -> Vec<Permission> {
    grant_for(role).permissions.to_vec()
}

/// Startup sanity check over the registry population data. Fails loudly at
/// boot rather than silently denying at check time.
pub fn verify_registry() -> anyhow::Result<()> {
    for role in ALL_ROLES {
        let grant = grant_for(*role);
        if grant.permissions.is_empty() {
            anyhow::bail!("role '{}' grants no permissions", role);
        }
        if !grant.permissions.contains(&Permission::ViewOwnProfile) {
            anyhow::bail!("role '{}' is missing the baseline view_own_profile grant", role);
        }
        for (i, p) in grant.permissions.iter().enumerate() {
            if grant.permissions[..i].contains(p) {
                anyhow::bail!("role '{}' lists '{}' twice", role, p);
            }
        }
    }
    Ok(())
}
