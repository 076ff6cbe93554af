//! Call job state machine
//!
//! Business logic for the whole job lifecycle: creation, attempt placement,
//! and the two gateway webhooks. Webhook handlers assume concurrent,
//! duplicated, out-of-order delivery: every read-modify-write runs under the
//! per-job lock, and nothing here ever propagates an error back to the
//! gateway.

use bookline_core::domain::job::{
    CallAttempt, CallJob, CallJobStatus, NotificationTarget, ReservationDecision,
    is_retryable_call_status, map_progress_status,
};
use bookline_core::dto::call::{CreateCallJob, StatusCallback};
use bookline_gateway::PlaceCallRequest;
use uuid::Uuid;

use crate::clients::ScriptContext;
use crate::context::AppState;
use crate::service::{confirmation, notify, script};
use crate::store::StoreError;

/// Wire value selecting the creator-only audience.
pub const CREATOR_ONLY_TARGET: &str = "creator-only";

/// Service error type
#[derive(Debug)]
pub enum JobError {
    Validation(String),
    JobNotFound(Uuid),
    GroupNotFound(Uuid),
    /// Telephony gateway not configured; lists the missing environment keys.
    Configuration(Vec<&'static str>),
    Gateway(String),
    Store(StoreError),
}

impl From<StoreError> for JobError {
    fn from(err: StoreError) -> Self {
        JobError::Store(err)
    }
}

/// Human-readable form recorded in `last_error` and logs.
pub fn describe_error(err: &JobError) -> String {
    match err {
        JobError::Validation(msg) => format!("validation failed: {msg}"),
        JobError::JobNotFound(id) => format!("call job {id} not found"),
        JobError::GroupNotFound(id) => format!("notification group {id} not found"),
        JobError::Configuration(keys) => {
            format!("telephony gateway not configured; missing {}", keys.join(", "))
        }
        JobError::Gateway(msg) => format!("gateway error: {msg}"),
        JobError::Store(err) => format!("storage error: {err}"),
    }
}

// =============================================================================
// Job Creation
// =============================================================================

/// Create a new call job and place attempt 0
///
/// Validation, group resolution, and placement failures surface to the
/// caller; a placement failure also leaves the job persisted as `Failed`
/// rather than silently queued.
pub async fn create_job(state: &AppState, req: CreateCallJob) -> Result<CallJob, JobError> {
    if req.reservation_time.trim().is_empty() {
        return Err(JobError::Validation("reservation_time is required".to_string()));
    }

    // Safety rail for the demo deployment: only the one configured number
    // may ever be dialed.
    if req.target_number != state.config.allowed_target_number {
        return Err(JobError::Validation(format!(
            "target number {} is not the allowed demo number",
            req.target_number
        )));
    }

    let notification_target = resolve_notification_target(state, &req).await?;
    let party_size = req.party_size.unwrap_or(2).clamp(1, 20);
    let special_request = req.special_request.unwrap_or_default();

    let script_ctx = ScriptContext {
        restaurant_name: req.restaurant_name.clone(),
        reservation_time: req.reservation_time.clone(),
        party_size,
        special_request: special_request.clone(),
    };
    let voice_script = script::build_voice_script(state.scripts.as_ref(), &script_ctx).await;

    let now = chrono::Utc::now();
    let mut job = CallJob {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        restaurant_name: req.restaurant_name,
        reservation_time: req.reservation_time,
        party_size,
        special_request,
        notification_target,
        target_number: req.target_number,
        caller_number: state.config.caller_number.clone().unwrap_or_default(),
        status: CallJobStatus::Queued,
        voice_script,
        attempts: Vec::new(),
        retry_used: 0,
        max_retries: state.config.max_retries,
        decision_digit: String::new(),
        reservation_decision: ReservationDecision::Pending,
        confirmed_reservation_id: None,
        confirmed_plan_id: None,
        notification_outcome: None,
        last_error: None,
        created_at: now,
        updated_at: now,
    };

    persist_job(state, &job).await?;

    tracing::info!("Call job created: {} for restaurant: {}", job.id, job.restaurant_name);

    if let Err(e) = place_attempt(state, &mut job, 0).await {
        job.status = CallJobStatus::Failed;
        job.last_error = Some(describe_error(&e));
        job.touch();
        persist_job(state, &job).await?;
        return Err(e);
    }

    Ok(job)
}

async fn resolve_notification_target(
    state: &AppState,
    req: &CreateCallJob,
) -> Result<NotificationTarget, JobError> {
    let raw = req.notification_target.trim();

    if raw == CREATOR_ONLY_TARGET {
        return Ok(NotificationTarget::CreatorOnly);
    }

    let group_id = Uuid::parse_str(raw).map_err(|_| {
        JobError::Validation(format!(
            "notification_target must be a group id or \"{CREATOR_ONLY_TARGET}\""
        ))
    })?;

    let group = state
        .directory
        .group_by_id(group_id)
        .await?
        .ok_or(JobError::GroupNotFound(group_id))?;

    if group.owner_id != req.user_id {
        return Err(JobError::GroupNotFound(group_id));
    }

    Ok(NotificationTarget::Group(group_id))
}

// =============================================================================
// Attempt Placement
// =============================================================================

/// Place one call attempt through the gateway
///
/// On success the attempt row is recorded and the job moves to `Calling`
/// (first attempt) or `Retrying`. On failure the error propagates; the
/// caller decides what it means for the job.
pub async fn place_attempt(
    state: &AppState,
    job: &mut CallJob,
    attempt_index: u32,
) -> Result<(), JobError> {
    let missing = state.config.telephony_missing_keys();
    if !missing.is_empty() {
        return Err(JobError::Configuration(missing));
    }

    let base = state
        .config
        .public_base_url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();

    let placed = state
        .gateway
        .place_call(PlaceCallRequest {
            to: job.target_number.clone(),
            from: job.caller_number.clone(),
            prompt_url: format!("{base}/call/{}/decision", job.id),
            status_callback_url: format!("{base}/call/{}/status/{attempt_index}", job.id),
            ring_timeout_seconds: state.config.ring_timeout.as_secs() as u32,
            max_duration_seconds: state.config.max_call_duration.as_secs() as u32,
        })
        .await
        .map_err(|e| JobError::Gateway(e.to_string()))?;

    let now = chrono::Utc::now();
    job.upsert_attempt(CallAttempt {
        attempt_index,
        call_reference: placed.call_reference,
        status: placed.initial_status,
        created_at: now,
        updated_at: now,
    });
    job.status = if attempt_index == 0 {
        CallJobStatus::Calling
    } else {
        CallJobStatus::Retrying
    };
    job.touch();
    persist_job(state, job).await?;

    tracing::info!("Placed attempt {} for job {}", attempt_index, job.id);

    Ok(())
}

// =============================================================================
// Status Callback
// =============================================================================

/// Webhook entry point for call lifecycle updates
///
/// Never fails: internal errors are recorded on the job so the gateway
/// always receives a success acknowledgment.
pub async fn handle_status_callback(
    state: &AppState,
    job_id: Uuid,
    attempt_index: u32,
    cb: StatusCallback,
) {
    if let Err(e) = apply_status_callback(state, job_id, attempt_index, &cb).await {
        let message = describe_error(&e);
        tracing::error!("Status callback for job {} failed internally: {}", job_id, message);
        record_job_error(state, job_id, message).await;
    }
}

async fn apply_status_callback(
    state: &AppState,
    job_id: Uuid,
    attempt_index: u32,
    cb: &StatusCallback,
) -> Result<(), JobError> {
    let _guard = state.locks.acquire(job_id).await;

    let Some(mut job) = state.jobs.get(job_id).await? else {
        tracing::warn!("Dropping status callback for unknown job {}", job_id);
        return Ok(());
    };

    let Some(matched) =
        job.match_attempt_index(Some(attempt_index), cb.call_reference.as_deref())
    else {
        tracing::debug!("Dropping status callback with no matching attempt for job {}", job_id);
        return Ok(());
    };

    let gateway_status = cb.call_status.as_str();
    let matched_index = job.attempts[matched].attempt_index;
    job.attempts[matched].status = gateway_status.to_string();
    job.attempts[matched].updated_at = chrono::Utc::now();

    // A recorded decision or a terminal state freezes job status; late
    // callbacks only refresh the attempt row.
    if job.decision_locked() || job.status.is_terminal() {
        job.touch();
        return persist_job(state, &job).await;
    }

    if is_retryable_call_status(gateway_status) {
        // Only the newest attempt drives retries; duplicates for a
        // superseded attempt mirror the row only.
        if Some(matched_index) == job.latest_attempt_index() {
            if job.retry_used < job.max_retries {
                job.retry_used += 1;
                job.status = CallJobStatus::Retrying;
                job.touch();
                persist_job(state, &job).await?;

                tracing::info!(
                    "Retrying job {} after gateway status {} (retry {}/{})",
                    job_id,
                    gateway_status,
                    job.retry_used,
                    job.max_retries
                );

                if let Err(e) = place_attempt(state, &mut job, matched_index + 1).await {
                    job.status = CallJobStatus::Failed;
                    job.last_error = Some(describe_error(&e));
                    job.touch();
                    persist_job(state, &job).await?;
                }
                return Ok(());
            }

            job.status = CallJobStatus::Failed;
            job.last_error = Some(format!(
                "call {} after {} attempt(s), retries exhausted",
                gateway_status,
                job.attempts.len()
            ));
        }
    } else if let Some(next) = map_progress_status(gateway_status) {
        job.status = next;
    }

    job.touch();
    persist_job(state, &job).await
}

// =============================================================================
// Decision Callback
// =============================================================================

/// Webhook entry point for the captured IVR digit
///
/// Never fails: artifact or fan-out problems are recorded on the job and the
/// gateway always receives a success acknowledgment.
pub async fn handle_decision_callback(state: &AppState, job_id: Uuid, digit: &str) {
    if let Err(e) = apply_decision_callback(state, job_id, digit).await {
        let message = describe_error(&e);
        tracing::error!("Decision callback for job {} failed internally: {}", job_id, message);
        record_job_error(state, job_id, message).await;
    }
}

async fn apply_decision_callback(
    state: &AppState,
    job_id: Uuid,
    digit: &str,
) -> Result<(), JobError> {
    let digit = digit.trim();

    let confirmed = {
        let _guard = state.locks.acquire(job_id).await;

        let Some(mut job) = state.jobs.get(job_id).await? else {
            tracing::warn!("Dropping decision callback for unknown job {}", job_id);
            return Ok(());
        };

        // A re-delivered decision callback is a no-op beyond updated_at.
        if job.decision_locked() {
            tracing::debug!("Decision already recorded for job {}; ignoring digit", job_id);
            job.touch();
            return persist_job(state, &job).await;
        }

        // A timeout (no input) is recorded as the decline digit but stays
        // distinguishable through the decision value.
        job.decision_digit = if digit.is_empty() {
            "2".to_string()
        } else {
            digit.to_string()
        };

        match digit {
            "1" => {
                job.reservation_decision = ReservationDecision::Confirmed;
                job.status = CallJobStatus::ReservationConfirmed;
            }
            "2" => {
                job.reservation_decision = ReservationDecision::Declined;
                job.status = CallJobStatus::ReservationDeclined;
            }
            "" => {
                job.reservation_decision = ReservationDecision::DeclinedTimeout;
                job.status = CallJobStatus::ReservationTimeout;
            }
            _ => {
                job.reservation_decision = ReservationDecision::NoResponse;
                job.status = CallJobStatus::AwaitingFollowup;
            }
        }
        job.touch();
        persist_job(state, &job).await?;

        tracing::info!(
            "Decision recorded for job {}: {:?} (digit {:?})",
            job_id,
            job.reservation_decision,
            digit
        );

        job.reservation_decision == ReservationDecision::Confirmed
    };

    if !confirmed {
        return Ok(());
    }

    // Slow I/O happens outside the per-job lock; the decision lock keeps a
    // concurrent status callback from reverting the outcome meanwhile.
    let Some(job) = state.jobs.get(job_id).await? else {
        return Ok(());
    };

    let artifacts = confirmation::write_confirmation(state, &job).await;
    let outcome = notify::fan_out(state, &job).await;

    let _guard = state.locks.acquire(job_id).await;
    let Some(mut job) = state.jobs.get(job_id).await? else {
        return Ok(());
    };
    match artifacts {
        Ok((reservation_id, plan_id)) => {
            job.confirmed_reservation_id = Some(reservation_id);
            job.confirmed_plan_id = Some(plan_id);
        }
        Err(e) => {
            tracing::error!("Confirmation artifacts for job {} failed: {}", job_id, e);
            job.last_error = Some(format!("failed to write confirmation artifacts: {e}"));
        }
    }
    job.notification_outcome = Some(outcome);
    job.touch();
    persist_job(state, &job).await
}

// =============================================================================
// Reads & Persistence
// =============================================================================

/// Get a job by ID
pub async fn get_job(state: &AppState, id: Uuid) -> Result<CallJob, JobError> {
    state.jobs.get(id).await?.ok_or(JobError::JobNotFound(id))
}

/// List all jobs
pub async fn list_jobs(state: &AppState) -> Result<Vec<CallJob>, JobError> {
    Ok(state.jobs.list().await?)
}

/// Persists a job, retrying the write once before giving up. A dropped
/// write after a state transition would lose the transition entirely.
async fn persist_job(state: &AppState, job: &CallJob) -> Result<(), JobError> {
    if let Err(first) = state.jobs.upsert(job).await {
        tracing::warn!("Job store write failed for {}, retrying once: {}", job.id, first);
        state.jobs.upsert(job).await.map_err(JobError::Store)?;
    }
    Ok(())
}

/// Best-effort recording of a handler failure on the job itself.
async fn record_job_error(state: &AppState, job_id: Uuid, message: String) {
    let _guard = state.locks.acquire(job_id).await;
    match state.jobs.get(job_id).await {
        Ok(Some(mut job)) => {
            job.last_error = Some(message);
            job.touch();
            if let Err(e) = state.jobs.upsert(&job).await {
                tracing::error!("Failed to record error on job {}: {}", job_id, e);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to load job {} to record error: {}", job_id, e),
    }
}
