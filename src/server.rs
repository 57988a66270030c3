//!
//! skillgrid HTTP server
//! ---------------------
//! Axum-based HTTP API consuming the identity core.
//!
//! Responsibilities:
//! - Session management with a simple cookie + CSRF token model.
//! - Login/logout endpoints backed by the directory auth provider.
//! - Guarded resource routes mapping engine denials to 401/403.
//! - A /check endpoint exposing guard decisions for admin tooling.
//! - First-run default-admin seeding and startup inventory logs.

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::directory::{ensure_default_admin, Directory, FileDirectory};
use crate::error::AppError;
use crate::identity::{
    self, audit, AccessContext, AccessRequest, AuthProvider, DirectoryAuthProvider, Permission,
    Principal, RequestContext, SessionManager,
};

const SESSION_COOKIE: &str = "skillgrid_session";

/// Shared server state injected into all handlers.
///
/// Holds the user directory, the auth provider (which owns the durable
/// session snapshot store), and the per-connection session and CSRF maps.
/// Principals in the session map are login-time snapshots; registry edits do
/// not touch them until the user logs in again.
#[derive(Clone)]
pub struct AppState {
    pub data_root: String,
    pub directory: Arc<dyn Directory>,
    pub auth: Arc<DirectoryAuthProvider>,
    /// Session id -> principal snapshot
    pub sessions: Arc<RwLock<HashMap<String, Principal>>>,
    /// Session id -> CSRF token mapping
    pub csrf_tokens: Arc<RwLock<HashMap<String, String>>>,
}

fn log_startup_folders(data_root: &str) {
    let cwd = std::env::current_dir().ok();
    let exe = std::env::current_exe().ok();
    let root_env = std::env::var("SKILLGRID_DATA_FOLDER").ok();
    info!(
        target: "startup",
        "skillgrid starting. cwd={:?}, exe={:?}, data_root_param={:?}, SKILLGRID_DATA_FOLDER_env={:?}",
        cwd, exe, data_root, root_env
    );
}

/// Start the skillgrid HTTP server bound to the given port.
///
/// Verifies the role registry up front (configuration errors fail loudly at
/// boot, not at check time), seeds the default admin on first run, wires the
/// audit file sink, and mounts all routes.
pub async fn run_with_port(http_port: u16, data_root: &str) -> anyhow::Result<()> {
    log_startup_folders(data_root);

    std::fs::create_dir_all(data_root)
        .map_err(|e| anyhow::anyhow!("Failed to create or access data root {}: {}", data_root, e))?;
    identity::verify_registry()?;
    ensure_default_admin(data_root)?;
    audit::register_file_sink(&format!("{}/audit.log", data_root));

    let directory: Arc<dyn Directory> = Arc::new(FileDirectory::new(data_root));
    let auth = Arc::new(DirectoryAuthProvider::new(
        directory.clone(),
        SessionManager::file_backed(data_root),
    ));

    let app_state = AppState {
        data_root: data_root.to_string(),
        directory,
        auth,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        csrf_tokens: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = Router::new()
        .route("/", get(|| async { "skillgrid ok" }))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/csrf", get(get_csrf))
        .route("/me", get(me))
        .route("/check", post(check))
        .route("/employees", get(list_employees))
        .route("/employees/{email}/assessments", get(employee_assessments))
        .route("/audit", get(read_audit))
        .with_state(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience entry point using the default port and data root.
pub async fn run() -> anyhow::Result<()> {
    run_with_port(8080, "data").await
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

fn get_sid_from_headers(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, SESSION_COOKIE)
}

/// Resolve the request context: the principal snapshot for the session
/// cookie (if any) plus the request id for audit.
async fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let request_id = headers.get("x-request-id").and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    let principal = match get_sid_from_headers(headers) {
        Some(sid) => state.sessions.read().await.get(&sid).cloned(),
        None => None,
    };
    RequestContext { principal, request_id }
}

async fn validate_csrf(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(sid) = get_sid_from_headers(headers) else { return false };
    let Some(provided) = headers.get("x-csrf-token").and_then(|v| v.to_str().ok()).map(|s| s.to_string()) else {
        return false;
    };
    let cmap = state.csrf_tokens.read().await;
    match cmap.get(&sid) {
        Some(expected) => expected == &provided,
        None => false,
    }
}

fn set_session_cookie(sid: &str) -> HeaderValue {
    // Secure, HttpOnly cookie scoped to path / with SameSite=Strict
    HeaderValue::from_str(&format!("{}={}; HttpOnly; Secure; SameSite=Strict; Path=/", SESSION_COOKIE, sid)).unwrap()
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/",
        SESSION_COOKIE
    ))
    .unwrap()
}

/// Map an AppError onto the wire with its status and serde-tagged body.
fn app_error_response(err: AppError) -> (StatusCode, Json<serde_json::Value>) {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"status":"error","error": err})))
}

fn random_hex(len_bytes: usize) -> String {
    let mut bytes = vec![0u8; len_bytes];
    let _ = getrandom::getrandom(&mut bytes);
    let mut out = String::with_capacity(len_bytes * 2);
    use std::fmt::Write as _;
    for b in &bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Evaluate a guard request for the current context and map a denial onto the
/// wire: 401 when no principal is present, 403 when one is but the check
/// fails.
async fn guard_request(
    ctx: &RequestContext,
    request: &AccessRequest,
    target_email: Option<&str>,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    let access_ctx = AccessContext {
        target_email: target_email.map(|s| s.to_string()),
        request_id: ctx.request_id.clone(),
    };
    let decision = identity::evaluate(ctx.principal.as_ref(), request, &access_ctx);
    let subject = ctx.principal.as_ref().map(|p| p.email.as_str()).unwrap_or("anonymous");
    audit::emit(&audit::AuditEvent::authorize(
        subject,
        request.resource.as_deref(),
        request.action.as_deref(),
        decision.allow,
        decision.reason.as_deref(),
        ctx.request_id.as_deref(),
    ));
    if decision.allow {
        return Ok(());
    }
    tracing::debug!(subject = %subject, reason = ?decision.reason, "access denied");
    if ctx.principal.is_none() {
        Err((StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"}))))
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({"status":"forbidden","reason": decision.reason})),
        ))
    }
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> impl IntoResponse {
    let req = identity::LoginRequest { email: payload.email, password: payload.password };
    match state.auth.login(&req) {
        Ok(principal) => {
            let sid = random_hex(16);
            let csrf = random_hex(32);
            {
                let mut map = state.sessions.write().await;
                map.insert(sid.clone(), principal.clone());
            }
            {
                let mut cmap = state.csrf_tokens.write().await;
                cmap.insert(sid.clone(), csrf);
            }
            let mut headers = HeaderMap::new();
            headers.insert("Set-Cookie", set_session_cookie(&sid));
            (StatusCode::OK, headers, Json(json!({"status":"ok","principal": principal})))
        }
        // One generic response for every failure mode; detail stays in the log.
        Err(e) if e.to_string() == "invalid_credentials" => (
            StatusCode::UNAUTHORIZED,
            HeaderMap::new(),
            Json(json!({"status":"unauthorized","error":"invalid_credentials"})),
        ),
        Err(e) => {
            error!("login error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HeaderMap::new(),
                Json(json!({"status":"error","error": e.to_string()})),
            )
        }
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    // Require CSRF token
    if !validate_csrf(&state, &headers).await {
        return (
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            Json(json!({"status":"forbidden","error":"invalid csrf"})),
        );
    }
    if let Some(sid) = get_sid_from_headers(&headers) {
        let mut map = state.sessions.write().await;
        map.remove(&sid);
        let mut cmap = state.csrf_tokens.write().await;
        cmap.remove(&sid);
    }
    // Durable snapshot teardown is a no-op when no session exists.
    state.auth.sessions.end();
    let mut h = HeaderMap::new();
    h.insert("Set-Cookie", clear_session_cookie());
    (StatusCode::OK, h, Json(json!({"status":"ok"})))
}

async fn get_csrf(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = request_context(&state, &headers).await;
    if ctx.principal.is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"})));
    }
    let Some(sid) = get_sid_from_headers(&headers) else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"})));
    };
    let cmap = state.csrf_tokens.read().await;
    if let Some(token) = cmap.get(&sid) {
        return (StatusCode::OK, Json(json!({"status":"ok","csrf": token})));
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"status":"error","error":"csrf not available"})))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = request_context(&state, &headers).await;
    match ctx.principal {
        Some(p) => (StatusCode::OK, Json(json!({"status":"ok","principal": p}))),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"}))),
    }
}

#[derive(Debug, Deserialize)]
struct CheckPayload {
    #[serde(default)]
    permissions: Option<Vec<Permission>>,
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    allow_self_access: bool,
    #[serde(default)]
    target_email: Option<String>,
}

/// Evaluate a guard request for the calling principal and return the decision
/// with its reason. Admin/debug tooling surface; requires a session.
async fn check(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<CheckPayload>) -> impl IntoResponse {
    let ctx = request_context(&state, &headers).await;
    if ctx.principal.is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status":"unauthorized"})));
    }
    let request = AccessRequest {
        permissions: payload.permissions,
        resource: payload.resource,
        action: payload.action,
        allow_self_access: payload.allow_self_access,
    };
    let access_ctx = AccessContext { target_email: payload.target_email, request_id: ctx.request_id.clone() };
    let decision = identity::evaluate(ctx.principal.as_ref(), &request, &access_ctx);
    (StatusCode::OK, Json(json!({"status":"ok","decision": decision})))
}

async fn list_employees(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = request_context(&state, &headers).await;
    let request = AccessRequest {
        resource: Some("employees".into()),
        action: Some("view".into()),
        ..Default::default()
    };
    if let Err(deny) = guard_request(&ctx, &request, None).await {
        return deny;
    }
    match state.directory.list() {
        Ok(records) => {
            let employees: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    json!({
                        "email": r.email,
                        "name": r.display_name,
                        "role": r.role,
                        "department": r.department,
                        "is_active": r.is_active,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({"status":"ok","employees": employees})))
        }
        Err(e) => {
            error!("directory list failed: {e}");
            app_error_response(AppError::io("directory_unavailable", e.to_string().as_str()))
        }
    }
}

/// Assessment view for one employee. Assessors reach anyone; everyone else
/// reaches their own record through the self-access override (read only).
async fn employee_assessments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> impl IntoResponse {
    let ctx = request_context(&state, &headers).await;
    let request = AccessRequest {
        permissions: Some(vec![Permission::ConductAssessments]),
        allow_self_access: true,
        ..Default::default()
    };
    if let Err(deny) = guard_request(&ctx, &request, Some(&email)).await {
        return deny;
    }
    match state.directory.find_by_email(&email) {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(json!({
                "status":"ok",
                "email": record.email,
                "department": record.department,
                // Assessment content lives in the assessment service; this
                // core exposes the authorization envelope only.
                "assessments": [],
            })),
        ),
        Ok(None) => app_error_response(AppError::not_found("unknown_employee", "no such employee record")),
        Err(e) => {
            error!("directory lookup failed: {e}");
            app_error_response(AppError::io("directory_unavailable", e.to_string().as_str()))
        }
    }
}

async fn read_audit(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = request_context(&state, &headers).await;
    let request = AccessRequest {
        permissions: Some(vec![Permission::ViewAuditLogs]),
        ..Default::default()
    };
    if let Err(deny) = guard_request(&ctx, &request, None).await {
        return deny;
    }
    let path = format!("{}/audit.log", state.data_root);
    let events: Vec<serde_json::Value> = match std::fs::read_to_string(&path) {
        Ok(raw) => raw
            .lines()
            .rev()
            .take(100)
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect(),
        Err(_) => Vec::new(),
    };
    (StatusCode::OK, Json(json!({"status":"ok","events": events})))
}
