//! Notification fan-out domain types

use serde::{Deserialize, Serialize};

/// Aggregate result of one confirmation fan-out execution
///
/// Recorded on the job so delivery failures are observable without ever
/// failing the decision callback that triggered them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub state: NotificationState,
    pub sent: u32,
    pub failed: u32,
    pub recipients: u32,
    pub errors: Vec<String>,
}

/// Overall fan-out state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationState {
    /// Every resolved recipient received the message.
    Sent,
    /// At least one send failed.
    Partial,
    /// Notifications are globally disabled; nothing was attempted.
    Paused,
}

impl NotificationOutcome {
    /// Outcome for a fan-out that resolved recipients and attempted sends.
    pub fn from_sends(sent: u32, failed: u32, recipients: u32, errors: Vec<String>) -> Self {
        let state = if failed > 0 {
            NotificationState::Partial
        } else {
            NotificationState::Sent
        };
        Self {
            state,
            sent,
            failed,
            recipients,
            errors,
        }
    }

    /// Outcome for a fan-out that never attempted any sends.
    pub fn skipped(state: NotificationState, error: impl Into<String>) -> Self {
        Self {
            state,
            sent: 0,
            failed: 0,
            recipients: 0,
            errors: vec![error.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sends_state() {
        let ok = NotificationOutcome::from_sends(3, 0, 3, vec![]);
        assert_eq!(ok.state, NotificationState::Sent);

        let partial = NotificationOutcome::from_sends(2, 1, 3, vec!["boom".to_string()]);
        assert_eq!(partial.state, NotificationState::Partial);
    }

    #[test]
    fn test_skipped_reports_zero_attempts() {
        let paused = NotificationOutcome::skipped(NotificationState::Paused, "disabled");
        assert_eq!(paused.sent, 0);
        assert_eq!(paused.recipients, 0);
        assert_eq!(paused.errors, vec!["disabled".to_string()]);
    }
}
