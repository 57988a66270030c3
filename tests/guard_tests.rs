//! Resource guard precedence tests. The ordering is product behavior and is
//! pinned here: resource rule first and final, then self-access, then the
//! permission list, then open.

use chrono::Utc;

use skillgrid::identity::{
    evaluate, resolve_permissions, AccessContext, AccessRequest, Permission, Principal, Role,
};

fn principal(role: Role, email: &str) -> Principal {
    Principal {
        id: "t-1".into(),
        email: email.into(),
        name: "Test".into(),
        role,
        department: "Eng".into(),
        permissions: resolve_permissions(role),
        is_active: true,
        created_at: Utc::now(),
        last_login: None,
    }
}

fn ctx_for(target: &str) -> AccessContext {
    AccessContext { target_email: Some(target.into()), request_id: None }
}

#[test]
fn employee_views_own_assessments_without_conduct_permission() {
    // Self-access grants the read even though the stated requirement
    // (conduct_assessments) is not held.
    let p = principal(Role::Employee, "eve@example.com");
    let req = AccessRequest {
        permissions: Some(vec![Permission::ConductAssessments]),
        allow_self_access: true,
        ..Default::default()
    };
    let d = evaluate(Some(&p), &req, &ctx_for("eve@example.com"));
    assert!(d.allow);
    assert_eq!(d.reason.as_deref(), Some("self_access"));
}

#[test]
fn assessor_reaches_other_records_through_the_permission_list() {
    let p = principal(Role::Assessor, "ava@example.com");
    let req = AccessRequest {
        permissions: Some(vec![Permission::ConductAssessments]),
        allow_self_access: true,
        ..Default::default()
    };
    let d = evaluate(Some(&p), &req, &ctx_for("someone-else@example.com"));
    assert!(d.allow);
    assert_eq!(d.reason.as_deref(), Some("permission_match"));
}

#[test]
fn guard_resource_denial_beats_self_access() {
    // When a resource rule and a self-access-eligible permission list are
    // both supplied, the failing resource rule denies without consulting
    // anything else.
    let p = principal(Role::Employee, "eve@example.com");
    let req = AccessRequest {
        resource: Some("organization".into()),
        action: Some("view".into()),
        permissions: Some(vec![Permission::ViewOwnProfile]),
        allow_self_access: true,
    };
    let d = evaluate(Some(&p), &req, &ctx_for("eve@example.com"));
    assert!(!d.allow, "resource denial must be final");
    assert_eq!(d.reason.as_deref(), Some("resource_rule"));
}

#[test]
fn resource_allow_also_short_circuits() {
    let p = principal(Role::HrManager, "hr@example.com");
    let req = AccessRequest {
        resource: Some("employees".into()),
        action: Some("view".into()),
        // A permission list the caller fails; irrelevant once the resource allows.
        permissions: Some(vec![Permission::SystemConfiguration]),
        allow_self_access: false,
    };
    let d = evaluate(Some(&p), &req, &AccessContext::default());
    assert!(d.allow);
    assert_eq!(d.reason.as_deref(), Some("resource_rule"));
}

#[test]
fn open_route_allows_anyone() {
    let d = evaluate(None, &AccessRequest::default(), &AccessContext::default());
    assert!(d.allow);
    assert_eq!(d.reason.as_deref(), Some("open_route"));
}

#[test]
fn criteria_without_principal_deny_as_unauthenticated() {
    let with_resource = AccessRequest { resource: Some("employees".into()), ..Default::default() };
    let with_perms = AccessRequest { permissions: Some(vec![Permission::ViewOwnProfile]), ..Default::default() };
    assert_eq!(
        evaluate(None, &with_resource, &AccessContext::default()).reason.as_deref(),
        Some("unauthenticated")
    );
    assert_eq!(
        evaluate(None, &with_perms, &AccessContext::default()).reason.as_deref(),
        Some("unauthenticated")
    );
}

#[test]
fn self_access_never_applies_without_a_target() {
    let p = principal(Role::Employee, "eve@example.com");
    let req = AccessRequest {
        permissions: Some(vec![Permission::ConductAssessments]),
        allow_self_access: true,
        ..Default::default()
    };
    let d = evaluate(Some(&p), &req, &AccessContext::default());
    assert!(!d.allow, "no target record means nothing to self-match");
    assert_eq!(d.reason.as_deref(), Some("missing_permission"));
}
