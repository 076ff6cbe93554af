//! Call job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gateway call statuses that warrant re-placing the call.
pub const RETRYABLE_CALL_STATUSES: [&str; 4] = ["busy", "failed", "no-answer", "canceled"];

/// Outbound reservation call job
///
/// The unit of work driven by the orchestrator: one requested reservation,
/// one or more placed call attempts, one captured IVR decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_name: String,
    /// Reservation time exactly as the owner typed it; parsed only when a
    /// confirmation artifact is synthesized.
    pub reservation_time: String,
    pub party_size: u32,
    pub special_request: String,
    pub notification_target: NotificationTarget,
    pub target_number: String,
    pub caller_number: String,
    pub status: CallJobStatus,
    pub voice_script: String,
    pub attempts: Vec<CallAttempt>,
    pub retry_used: u32,
    pub max_retries: u32,
    /// Captured IVR digit; empty until the decision callback arrives.
    /// A timeout (no input) is recorded as "2".
    pub decision_digit: String,
    pub reservation_decision: ReservationDecision,
    pub confirmed_reservation_id: Option<Uuid>,
    pub confirmed_plan_id: Option<Uuid>,
    pub notification_outcome: Option<crate::domain::notification::NotificationOutcome>,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// One placed call through the telephony gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAttempt {
    pub attempt_index: u32,
    /// Opaque id assigned by the gateway.
    pub call_reference: String,
    /// Lifecycle value mirrored verbatim from the gateway.
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Call job state machine value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallJobStatus {
    Queued,
    Calling,
    Retrying,
    InProgress,
    ReservationConfirmed,
    ReservationDeclined,
    ReservationTimeout,
    AwaitingFollowup,
    Completed,
    Failed,
}

impl CallJobStatus {
    /// True for states that end the job outright; decision states are
    /// guarded separately through the decision lock.
    pub fn is_terminal(self) -> bool {
        matches!(self, CallJobStatus::Completed | CallJobStatus::Failed)
    }
}

/// Outcome of the IVR decision capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationDecision {
    Pending,
    Confirmed,
    Declined,
    DeclinedTimeout,
    NoResponse,
}

/// Audience selector for confirmation fan-out, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NotificationTarget {
    /// A notification group the job owner controls.
    Group(Uuid),
    /// Only the job owner's own phone.
    CreatorOnly,
}

impl CallJob {
    /// Whether a human decision outcome has been recorded. Once locked, no
    /// status callback may change the decision or revert the job status.
    pub fn decision_locked(&self) -> bool {
        self.reservation_decision != ReservationDecision::Pending
    }

    /// Finds the stored attempt matching a status callback, by attempt index
    /// or by gateway call reference.
    pub fn match_attempt_index(
        &self,
        attempt_index: Option<u32>,
        call_reference: Option<&str>,
    ) -> Option<usize> {
        self.attempts.iter().position(|a| {
            attempt_index == Some(a.attempt_index)
                || call_reference.is_some_and(|r| !r.is_empty() && r == a.call_reference)
        })
    }

    /// Inserts the attempt, replacing any existing entry with the same index.
    /// Indices stay contiguous because attempts are only ever placed at
    /// `attempts.len()`.
    pub fn upsert_attempt(&mut self, attempt: CallAttempt) {
        match self
            .attempts
            .iter_mut()
            .find(|a| a.attempt_index == attempt.attempt_index)
        {
            Some(existing) => *existing = attempt,
            None => self.attempts.push(attempt),
        }
    }

    /// Index of the newest placed attempt, if any.
    pub fn latest_attempt_index(&self) -> Option<u32> {
        self.attempts.iter().map(|a| a.attempt_index).max()
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}

/// Whether a gateway status should trigger a re-placed attempt.
pub fn is_retryable_call_status(status: &str) -> bool {
    RETRYABLE_CALL_STATUSES.contains(&status)
}

/// Maps a non-retryable gateway progress status onto the job state machine.
///
/// Unmapped statuses leave the job status untouched.
pub fn map_progress_status(status: &str) -> Option<CallJobStatus> {
    match status {
        "completed" => Some(CallJobStatus::Completed),
        "answered" => Some(CallJobStatus::InProgress),
        "ringing" | "queued" | "initiated" => Some(CallJobStatus::Calling),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(index: u32, reference: &str) -> CallAttempt {
        let now = chrono::Utc::now();
        CallAttempt {
            attempt_index: index,
            call_reference: reference.to_string(),
            status: "initiated".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn job_with_attempts(attempts: Vec<CallAttempt>) -> CallJob {
        let now = chrono::Utc::now();
        CallJob {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            restaurant_name: "Test Bistro".to_string(),
            reservation_time: "7pm".to_string(),
            party_size: 2,
            special_request: String::new(),
            notification_target: NotificationTarget::CreatorOnly,
            target_number: "+15551230000".to_string(),
            caller_number: "+15559870000".to_string(),
            status: CallJobStatus::Queued,
            voice_script: String::new(),
            attempts,
            retry_used: 0,
            max_retries: 1,
            decision_digit: String::new(),
            reservation_decision: ReservationDecision::Pending,
            confirmed_reservation_id: None,
            confirmed_plan_id: None,
            notification_outcome: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_call_status("busy"));
        assert!(is_retryable_call_status("no-answer"));
        assert!(is_retryable_call_status("canceled"));
        assert!(is_retryable_call_status("failed"));
        assert!(!is_retryable_call_status("completed"));
        assert!(!is_retryable_call_status("ringing"));
    }

    #[test]
    fn test_progress_status_mapping() {
        assert_eq!(map_progress_status("completed"), Some(CallJobStatus::Completed));
        assert_eq!(map_progress_status("answered"), Some(CallJobStatus::InProgress));
        assert_eq!(map_progress_status("ringing"), Some(CallJobStatus::Calling));
        assert_eq!(map_progress_status("queued"), Some(CallJobStatus::Calling));
        assert_eq!(map_progress_status("initiated"), Some(CallJobStatus::Calling));
        assert_eq!(map_progress_status("in-progress"), None);
    }

    #[test]
    fn test_match_attempt_by_index_or_reference() {
        let job = job_with_attempts(vec![attempt(0, "CA001"), attempt(1, "CA002")]);

        assert_eq!(job.match_attempt_index(Some(1), None), Some(1));
        assert_eq!(job.match_attempt_index(None, Some("CA001")), Some(0));
        assert_eq!(job.match_attempt_index(Some(7), Some("CA002")), Some(1));
        assert_eq!(job.match_attempt_index(Some(7), Some("CA999")), None);
        assert_eq!(job.match_attempt_index(None, None), None);
        // Empty references never match anything.
        assert_eq!(job.match_attempt_index(None, Some("")), None);
    }

    #[test]
    fn test_upsert_attempt_replaces_by_index() {
        let mut job = job_with_attempts(vec![attempt(0, "CA001")]);

        let mut replacement = attempt(0, "CA001");
        replacement.status = "busy".to_string();
        job.upsert_attempt(replacement);
        assert_eq!(job.attempts.len(), 1);
        assert_eq!(job.attempts[0].status, "busy");

        job.upsert_attempt(attempt(1, "CA002"));
        assert_eq!(job.attempts.len(), 2);
        assert_eq!(job.latest_attempt_index(), Some(1));
    }

    #[test]
    fn test_decision_lock() {
        let mut job = job_with_attempts(vec![]);
        assert!(!job.decision_locked());

        job.reservation_decision = ReservationDecision::DeclinedTimeout;
        assert!(job.decision_locked());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CallJobStatus::Completed.is_terminal());
        assert!(CallJobStatus::Failed.is_terminal());
        assert!(!CallJobStatus::ReservationConfirmed.is_terminal());
        assert!(!CallJobStatus::Retrying.is_terminal());
    }
}
