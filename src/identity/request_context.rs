use super::Principal;

/// Per-request context threaded through handlers: the current principal (if
/// any) and the request id carried into audit events.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub request_id: Option<String>,
}
