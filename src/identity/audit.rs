//! Audit sinks for login outcomes and authorization decisions.
//! Emission is best-effort: a failing sink never affects a decision.

use std::io::Write;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub ts_ms: i64,
    pub kind: &'static str,
    pub subject: String,
    pub allow: bool,
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AuditEvent {
    pub fn login(subject: &str, allow: bool, reason: &str) -> Self {
        AuditEvent {
            ts_ms: chrono::Utc::now().timestamp_millis(),
            kind: "login",
            subject: subject.to_string(),
            allow,
            reason: Some(reason.to_string()),
            resource: None,
            action: None,
            request_id: None,
        }
    }

    pub fn authorize(
        subject: &str,
        resource: Option<&str>,
        action: Option<&str>,
        allow: bool,
        reason: Option<&str>,
        request_id: Option<&str>,
    ) -> Self {
        AuditEvent {
            ts_ms: chrono::Utc::now().timestamp_millis(),
            kind: "authorize",
            subject: subject.to_string(),
            allow,
            reason: reason.map(|s| s.to_string()),
            resource: resource.map(|s| s.to_string()),
            action: action.map(|s| s.to_string()),
            request_id: request_id.map(|s| s.to_string()),
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

// Process-local sink registry (set up once by the host).
static SINKS: Lazy<RwLock<Vec<Box<dyn AuditSink>>>> = Lazy::new(|| RwLock::new(Vec::new()));

pub fn register_sink(sink: Box<dyn AuditSink>) {
    SINKS.write().push(sink);
}

pub fn emit(event: &AuditEvent) {
    for sink in SINKS.read().iter() {
        // Sinks must not panic; implementors handle their own errors.
        sink.record(event);
    }
}

// --- JSON-lines file sink ---

struct FileAuditSink {
    path: String,
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        let Ok(line) = serde_json::to_string(event) else { return };
        if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(&mut f, "{}", line);
        }
    }
}

/// Register a JSON-lines file sink under the data root.
pub fn register_file_sink(path: &str) {
    register_sink(Box::new(FileAuditSink { path: path.to_string() }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct CaptureSink(Arc<RwLock<Vec<AuditEvent>>>);

    impl AuditSink for CaptureSink {
        fn record(&self, event: &AuditEvent) {
            self.0.write().push(event.clone());
        }
    }

    #[test]
    fn emitted_events_reach_registered_sinks() {
        let seen = Arc::new(RwLock::new(Vec::new()));
        register_sink(Box::new(CaptureSink(seen.clone())));
        emit(&AuditEvent::authorize("t@example.com", Some("employees"), Some("view"), false, Some("resource_rule"), None));
        let got = seen.read();
        assert!(got.iter().any(|e| e.kind == "authorize" && e.subject == "t@example.com"));
    }
}
