//! Success envelope for API responses
//!
//! Every 2xx body is wrapped as `{"success": true, "data": ...}` so clients
//! can branch on one field. The optional `info` line flags outcomes that
//! succeeded without doing anything, such as a transition to the current
//! status. Errors use the envelope in error.rs instead.

use serde::Serialize;
use utoipa::ToSchema;

/// Info line attached to idempotent no-op transitions
pub const ALREADY_IN_STATUS: &str = "already in requested status";

#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl<T> Envelope<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            info: None,
        }
    }

    pub fn with_info(data: T, info: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            info: Some(info.into()),
        }
    }

    /// Envelope for a transition result, flagging no-ops
    pub fn transition(data: T, changed: bool) -> Self {
        if changed {
            Self::ok(data)
        } else {
            Self::with_info(data, ALREADY_IN_STATUS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serialization() {
        let envelope = Envelope::ok(serde_json::json!({"id": 7}));
        let json = serde_json::to_string(&envelope).unwrap();

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"id\":7"));
        assert!(!json.contains("info"));
    }

    #[test]
    fn test_envelope_with_info() {
        let envelope = Envelope::with_info(serde_json::json!({"id": 7}), ALREADY_IN_STATUS);
        let json = serde_json::to_string(&envelope).unwrap();

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("already in requested status"));
    }

    #[test]
    fn test_transition_envelope_flags_noop() {
        let changed = Envelope::transition(1, true);
        assert!(changed.info.is_none());

        let noop = Envelope::transition(1, false);
        assert_eq!(noop.info.as_deref(), Some(ALREADY_IN_STATUS));
    }
}
