//! Closed catalog of capability tokens.
//! Permissions are granted only through role membership; there is no runtime
//! mutation and no per-user assignment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOwnProfile,
    EditOwnSkills,
    ViewOwnAssessments,
    ConductAssessments,
    ViewAllEmployees,
    EditEmployeeProfiles,
    ManageJobProfiles,
    ViewOrganizationDashboard,
    ManageUsers,
    ManagePermissions,
    SystemConfiguration,
    ViewAuditLogs,
    ViewTeamProfiles,
    ViewDepartmentProfiles,
}

/// Every token in the catalog, in declaration order.
pub const ALL_PERMISSIONS: &[Permission] = &[
    Permission::ViewOwnProfile,
    Permission::EditOwnSkills,
    Permission::ViewOwnAssessments,
    Permission::ConductAssessments,
    Permission::ViewAllEmployees,
    Permission::EditEmployeeProfiles,
    Permission::ManageJobProfiles,
    Permission::ViewOrganizationDashboard,
    Permission::ManageUsers,
    Permission::ManagePermissions,
    Permission::SystemConfiguration,
    Permission::ViewAuditLogs,
    Permission::ViewTeamProfiles,
    Permission::ViewDepartmentProfiles,
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown token: {0}")]
pub struct UnknownToken(pub String);

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewOwnProfile => "view_own_profile",
            Permission::EditOwnSkills => "edit_own_skills",
            Permission::ViewOwnAssessments => "view_own_assessments",
            Permission::ConductAssessments => "conduct_assessments",
            Permission::ViewAllEmployees => "view_all_employees",
            Permission::EditEmployeeProfiles => "edit_employee_profiles",
            Permission::ManageJobProfiles => "manage_job_profiles",
            Permission::ViewOrganizationDashboard => "view_organization_dashboard",
            Permission::ManageUsers => "manage_users",
            Permission::ManagePermissions => "manage_permissions",
            Permission::SystemConfiguration => "system_configuration",
            Permission::ViewAuditLogs => "view_audit_logs",
            Permission::ViewTeamProfiles => "view_team_profiles",
            Permission::ViewDepartmentProfiles => "view_department_profiles",
        }
    }
}

impl FromStr for Permission {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Strict: an unrecognized token is a configuration error, never coerced.
        ALL_PERMISSIONS
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownToken(s.to_string()))
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
