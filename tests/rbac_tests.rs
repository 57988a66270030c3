//! RBAC integration tests: authentication against the file-backed directory
//! and the authorization engine's role scenarios.
//! These tests exercise positive and negative paths across the catalogs.

use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;

use skillgrid::directory::{ensure_default_admin, Directory, FileDirectory, UserRecord, DEFAULT_ADMIN_EMAIL};
use skillgrid::identity::{
    can_access_resource, has_any_permission, has_permission, AuthProvider, DirectoryAuthProvider,
    LoginRequest, Permission, Role, SessionManager,
};

fn provider_for(root: &std::path::Path) -> DirectoryAuthProvider {
    let dir: Arc<dyn Directory> = Arc::new(FileDirectory::new(root.to_str().unwrap()));
    DirectoryAuthProvider::new(dir, SessionManager::file_backed(root.to_str().unwrap()))
}

#[test]
fn default_admin_logs_in_and_reaches_admin_surfaces() -> Result<()> {
    let tmp = tempdir()?;
    ensure_default_admin(tmp.path().to_str().unwrap())?;
    let provider = provider_for(tmp.path());

    let p = provider.login(&LoginRequest {
        email: DEFAULT_ADMIN_EMAIL.into(),
        password: "skillgrid".into(),
    })?;
    assert_eq!(p.role, Role::Admin);
    assert!(
        has_permission(Some(&p), Permission::SystemConfiguration),
        "admin must hold system_configuration"
    );
    assert!(
        can_access_resource(Some(&p), "employees", "view"),
        "admin must reach the employees resource"
    );
    Ok(())
}

#[test]
fn employee_scenario_holds_only_self_service_permissions() -> Result<()> {
    let tmp = tempdir()?;
    let dir = FileDirectory::new(tmp.path().to_str().unwrap());
    dir.upsert(UserRecord::new("eve@example.com", "Eve", "pw", Role::Employee, "Sales")?)?;
    let provider = provider_for(tmp.path());

    let p = provider.login(&LoginRequest { email: "eve@example.com".into(), password: "pw".into() })?;
    assert_eq!(
        p.permissions,
        vec![Permission::ViewOwnProfile, Permission::EditOwnSkills, Permission::ViewOwnAssessments]
    );
    assert!(!can_access_resource(Some(&p), "organization", "view"));
    assert!(!has_any_permission(Some(&p), &[Permission::ManageUsers]));
    Ok(())
}

#[test]
fn empty_requirement_list_is_false_even_for_admin() -> Result<()> {
    let tmp = tempdir()?;
    ensure_default_admin(tmp.path().to_str().unwrap())?;
    let provider = provider_for(tmp.path());
    let admin = provider.login(&LoginRequest {
        email: DEFAULT_ADMIN_EMAIL.into(),
        password: "skillgrid".into(),
    })?;
    assert!(
        !has_any_permission(Some(&admin), &[]),
        "an empty requirement list has nothing to satisfy"
    );
    Ok(())
}

#[test]
fn unknown_resource_denies_every_role() -> Result<()> {
    let tmp = tempdir()?;
    ensure_default_admin(tmp.path().to_str().unwrap())?;
    let provider = provider_for(tmp.path());
    let admin = provider.login(&LoginRequest {
        email: DEFAULT_ADMIN_EMAIL.into(),
        password: "skillgrid".into(),
    })?;
    assert!(!can_access_resource(Some(&admin), "unknown-resource-xyz", "view"));
    Ok(())
}

#[test]
fn inactive_account_always_fails_with_the_generic_reason() -> Result<()> {
    let tmp = tempdir()?;
    let dir = FileDirectory::new(tmp.path().to_str().unwrap());
    let mut rec = UserRecord::new("ira@example.com", "Ira", "pw", Role::HrManager, "HR")?;
    rec.is_active = false;
    dir.upsert(rec)?;
    let provider = provider_for(tmp.path());

    let err = provider
        .login(&LoginRequest { email: "ira@example.com".into(), password: "pw".into() })
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid_credentials", "inactive must not be distinguishable");
    Ok(())
}

#[test]
fn wrong_password_and_unknown_user_share_one_failure() -> Result<()> {
    let tmp = tempdir()?;
    let dir = FileDirectory::new(tmp.path().to_str().unwrap());
    dir.upsert(UserRecord::new("ann@example.com", "Ann", "right", Role::Assessor, "QA")?)?;
    let provider = provider_for(tmp.path());

    let wrong = provider
        .login(&LoginRequest { email: "ann@example.com".into(), password: "wrong".into() })
        .unwrap_err();
    let ghost = provider
        .login(&LoginRequest { email: "ghost@example.com".into(), password: "right".into() })
        .unwrap_err();
    assert_eq!(wrong.to_string(), ghost.to_string(), "no account enumeration through error text");
    Ok(())
}

#[test]
fn principal_permissions_are_snapshot_not_live() -> Result<()> {
    let tmp = tempdir()?;
    let dir = FileDirectory::new(tmp.path().to_str().unwrap());
    dir.upsert(UserRecord::new("max@example.com", "Max", "pw", Role::Employee, "Eng")?)?;
    let provider = provider_for(tmp.path());

    let before = provider.login(&LoginRequest { email: "max@example.com".into(), password: "pw".into() })?;
    assert_eq!(before.role, Role::Employee);

    // Promote the user after login. The issued principal keeps its snapshot.
    let mut promoted = dir.find_by_email("max@example.com")?.unwrap();
    promoted.role = Role::TeamLead;
    dir.upsert(promoted)?;

    assert_eq!(before.role, Role::Employee);
    assert!(
        !has_permission(Some(&before), Permission::ViewTeamProfiles),
        "already-issued principal must not gain the promoted role's grants"
    );

    // Re-login is the only way to pick the new grants up.
    let after = provider.login(&LoginRequest { email: "max@example.com".into(), password: "pw".into() })?;
    assert_eq!(after.role, Role::TeamLead);
    assert!(has_permission(Some(&after), Permission::ViewTeamProfiles));
    Ok(())
}

#[test]
fn login_stamps_last_login_in_the_directory() -> Result<()> {
    let tmp = tempdir()?;
    let dir = FileDirectory::new(tmp.path().to_str().unwrap());
    dir.upsert(UserRecord::new("tia@example.com", "Tia", "pw", Role::DepartmentManager, "Ops")?)?;
    let provider = provider_for(tmp.path());

    assert!(dir.find_by_email("tia@example.com")?.unwrap().last_login.is_none());
    let p = provider.login(&LoginRequest { email: "tia@example.com".into(), password: "pw".into() })?;
    let stored = dir.find_by_email("tia@example.com")?.unwrap();
    assert_eq!(stored.last_login, p.last_login, "directory and principal must agree on last_login");
    Ok(())
}
