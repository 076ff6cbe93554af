//! Call job repository
//!
//! Handles all database operations related to call jobs. The full attempt
//! list and notification outcome ride along in JSONB so every state
//! transition is one atomic row upsert.

use bookline_core::domain::job::{CallJob, CallJobStatus, NotificationTarget, ReservationDecision};
use bookline_core::domain::notification::NotificationOutcome;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::StoreError;

/// Insert or replace a job row keyed by job id
pub async fn upsert(pool: &PgPool, job: &CallJob) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO call_jobs (
            id, user_id, restaurant_name, reservation_time, party_size,
            special_request, notification_target, target_number, caller_number,
            status, voice_script, attempts, retry_used, max_retries,
            decision_digit, reservation_decision, confirmed_reservation_id,
            confirmed_plan_id, notification_outcome, last_error, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            attempts = EXCLUDED.attempts,
            retry_used = EXCLUDED.retry_used,
            decision_digit = EXCLUDED.decision_digit,
            reservation_decision = EXCLUDED.reservation_decision,
            confirmed_reservation_id = EXCLUDED.confirmed_reservation_id,
            confirmed_plan_id = EXCLUDED.confirmed_plan_id,
            notification_outcome = EXCLUDED.notification_outcome,
            last_error = EXCLUDED.last_error,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(job.id)
    .bind(job.user_id)
    .bind(&job.restaurant_name)
    .bind(&job.reservation_time)
    .bind(job.party_size as i32)
    .bind(&job.special_request)
    .bind(target_to_string(job.notification_target))
    .bind(&job.target_number)
    .bind(&job.caller_number)
    .bind(status_to_string(job.status))
    .bind(&job.voice_script)
    .bind(serde_json::to_value(&job.attempts)?)
    .bind(job.retry_used as i32)
    .bind(job.max_retries as i32)
    .bind(&job.decision_digit)
    .bind(decision_to_string(job.reservation_decision))
    .bind(job.confirmed_reservation_id)
    .bind(job.confirmed_plan_id)
    .bind(
        job.notification_outcome
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?,
    )
    .bind(&job.last_error)
    .bind(job.created_at)
    .bind(job.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Find a job by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<CallJob>, StoreError> {
    let row = sqlx::query_as::<_, CallJobRow>(
        r#"
        SELECT id, user_id, restaurant_name, reservation_time, party_size,
               special_request, notification_target, target_number, caller_number,
               status, voice_script, attempts, retry_used, max_retries,
               decision_digit, reservation_decision, confirmed_reservation_id,
               confirmed_plan_id, notification_outcome, last_error, created_at, updated_at
        FROM call_jobs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// List all jobs, newest first
pub async fn list_all(pool: &PgPool) -> Result<Vec<CallJob>, StoreError> {
    let rows = sqlx::query_as::<_, CallJobRow>(
        r#"
        SELECT id, user_id, restaurant_name, reservation_time, party_size,
               special_request, notification_target, target_number, caller_number,
               status, voice_script, attempts, retry_used, max_retries,
               decision_digit, reservation_decision, confirmed_reservation_id,
               confirmed_plan_id, notification_outcome, last_error, created_at, updated_at
        FROM call_jobs
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Append a bulk snapshot row
pub async fn write_snapshot(pool: &PgPool, jobs: &[CallJob]) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO job_snapshots (taken_at, payload) VALUES ($1, $2)")
        .bind(chrono::Utc::now())
        .bind(serde_json::to_value(jobs)?)
        .execute(pool)
        .await?;

    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn status_to_string(status: CallJobStatus) -> &'static str {
    match status {
        CallJobStatus::Queued => "Queued",
        CallJobStatus::Calling => "Calling",
        CallJobStatus::Retrying => "Retrying",
        CallJobStatus::InProgress => "InProgress",
        CallJobStatus::ReservationConfirmed => "ReservationConfirmed",
        CallJobStatus::ReservationDeclined => "ReservationDeclined",
        CallJobStatus::ReservationTimeout => "ReservationTimeout",
        CallJobStatus::AwaitingFollowup => "AwaitingFollowup",
        CallJobStatus::Completed => "Completed",
        CallJobStatus::Failed => "Failed",
    }
}

fn string_to_status(s: &str) -> CallJobStatus {
    match s {
        "Queued" => CallJobStatus::Queued,
        "Calling" => CallJobStatus::Calling,
        "Retrying" => CallJobStatus::Retrying,
        "InProgress" => CallJobStatus::InProgress,
        "ReservationConfirmed" => CallJobStatus::ReservationConfirmed,
        "ReservationDeclined" => CallJobStatus::ReservationDeclined,
        "ReservationTimeout" => CallJobStatus::ReservationTimeout,
        "AwaitingFollowup" => CallJobStatus::AwaitingFollowup,
        "Completed" => CallJobStatus::Completed,
        "Failed" => CallJobStatus::Failed,
        _ => CallJobStatus::Queued,
    }
}

fn decision_to_string(decision: ReservationDecision) -> &'static str {
    match decision {
        ReservationDecision::Pending => "Pending",
        ReservationDecision::Confirmed => "Confirmed",
        ReservationDecision::Declined => "Declined",
        ReservationDecision::DeclinedTimeout => "DeclinedTimeout",
        ReservationDecision::NoResponse => "NoResponse",
    }
}

fn string_to_decision(s: &str) -> ReservationDecision {
    match s {
        "Pending" => ReservationDecision::Pending,
        "Confirmed" => ReservationDecision::Confirmed,
        "Declined" => ReservationDecision::Declined,
        "DeclinedTimeout" => ReservationDecision::DeclinedTimeout,
        "NoResponse" => ReservationDecision::NoResponse,
        _ => ReservationDecision::Pending,
    }
}

fn target_to_string(target: NotificationTarget) -> String {
    match target {
        NotificationTarget::CreatorOnly => "creator-only".to_string(),
        NotificationTarget::Group(id) => id.to_string(),
    }
}

fn string_to_target(s: &str) -> NotificationTarget {
    match Uuid::parse_str(s) {
        Ok(id) => NotificationTarget::Group(id),
        Err(_) => NotificationTarget::CreatorOnly,
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CallJobRow {
    id: Uuid,
    user_id: Uuid,
    restaurant_name: String,
    reservation_time: String,
    party_size: i32,
    special_request: String,
    notification_target: String,
    target_number: String,
    caller_number: String,
    status: String,
    voice_script: String,
    attempts: serde_json::Value,
    retry_used: i32,
    max_retries: i32,
    decision_digit: String,
    reservation_decision: String,
    confirmed_reservation_id: Option<Uuid>,
    confirmed_plan_id: Option<Uuid>,
    notification_outcome: Option<serde_json::Value>,
    last_error: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CallJobRow> for CallJob {
    fn from(row: CallJobRow) -> Self {
        let attempts = serde_json::from_value(row.attempts).unwrap_or_default();
        let notification_outcome: Option<NotificationOutcome> = row
            .notification_outcome
            .and_then(|v| serde_json::from_value(v).ok());

        CallJob {
            id: row.id,
            user_id: row.user_id,
            restaurant_name: row.restaurant_name,
            reservation_time: row.reservation_time,
            party_size: row.party_size.max(0) as u32,
            special_request: row.special_request,
            notification_target: string_to_target(&row.notification_target),
            target_number: row.target_number,
            caller_number: row.caller_number,
            status: string_to_status(&row.status),
            voice_script: row.voice_script,
            attempts,
            retry_used: row.retry_used.max(0) as u32,
            max_retries: row.max_retries.max(0) as u32,
            decision_digit: row.decision_digit,
            reservation_decision: string_to_decision(&row.reservation_decision),
            confirmed_reservation_id: row.confirmed_reservation_id,
            confirmed_plan_id: row.confirmed_plan_id,
            notification_outcome,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            CallJobStatus::Queued,
            CallJobStatus::Calling,
            CallJobStatus::Retrying,
            CallJobStatus::InProgress,
            CallJobStatus::ReservationConfirmed,
            CallJobStatus::ReservationDeclined,
            CallJobStatus::ReservationTimeout,
            CallJobStatus::AwaitingFollowup,
            CallJobStatus::Completed,
            CallJobStatus::Failed,
        ] {
            assert_eq!(string_to_status(status_to_string(status)), status);
        }
    }

    #[test]
    fn test_decision_round_trip() {
        for decision in [
            ReservationDecision::Pending,
            ReservationDecision::Confirmed,
            ReservationDecision::Declined,
            ReservationDecision::DeclinedTimeout,
            ReservationDecision::NoResponse,
        ] {
            assert_eq!(string_to_decision(decision_to_string(decision)), decision);
        }
    }

    #[test]
    fn test_target_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(
            string_to_target(&target_to_string(NotificationTarget::Group(id))),
            NotificationTarget::Group(id)
        );
        assert_eq!(
            string_to_target(&target_to_string(NotificationTarget::CreatorOnly)),
            NotificationTarget::CreatorOnly
        );
    }
}
