//! Call job DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a new reservation call job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCallJob {
    pub user_id: Uuid,
    pub restaurant_name: String,
    pub reservation_time: String,
    /// Clamped to [1, 20]; defaults to 2 when absent.
    pub party_size: Option<u32>,
    #[serde(default)]
    pub special_request: Option<String>,
    /// A group id, or the literal string "creator-only".
    pub notification_target: String,
    pub target_number: String,
}

/// Status webhook payload from the telephony gateway
///
/// The attempt index travels in the callback URL path; the body mirrors the
/// gateway's own call lifecycle fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCallback {
    pub call_status: String,
    #[serde(default)]
    pub call_reference: Option<String>,
}

/// Decision webhook payload carrying the captured IVR digit
///
/// An empty digit means the gather timed out without input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCallback {
    #[serde(default)]
    pub digit: String,
}

/// Acknowledgment body returned to the gateway for every webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackAck {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_callback_digit_defaults_to_empty() {
        let cb: DecisionCallback = serde_json::from_str("{}").unwrap();
        assert_eq!(cb.digit, "");

        let cb: DecisionCallback = serde_json::from_str(r#"{"digit":"1"}"#).unwrap();
        assert_eq!(cb.digit, "1");
    }

    #[test]
    fn test_status_callback_reference_optional() {
        let cb: StatusCallback = serde_json::from_str(r#"{"call_status":"busy"}"#).unwrap();
        assert_eq!(cb.call_status, "busy");
        assert!(cb.call_reference.is_none());
    }
}
