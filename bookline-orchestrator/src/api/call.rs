//! Call Job API Handlers
//!
//! HTTP endpoints for the job lifecycle plus the two gateway webhooks. The
//! webhook handlers always acknowledge with success: the gateway does not
//! retry on handler errors, so failures are recorded on the job instead of
//! surfaced on the wire.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use bookline_core::domain::job::CallJob;
use bookline_core::dto::call::{CallbackAck, CreateCallJob, DecisionCallback, StatusCallback};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::context::AppState;
use crate::service::call_service;
use crate::service::call_service::JobError;

// =============================================================================
// Job Lifecycle Endpoints
// =============================================================================

/// POST /call
/// Create a new reservation call job and place the first attempt
pub async fn create_call(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCallJob>,
) -> ApiResult<Json<CallJob>> {
    tracing::info!("Creating call job for restaurant: {}", req.restaurant_name);

    let job = call_service::create_job(&state, req)
        .await
        .map_err(map_job_error)?;

    Ok(Json(job))
}

/// GET /call/{id}
/// Get call job details by ID
pub async fn get_call(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CallJob>> {
    tracing::debug!("Getting call job: {}", id);

    let job = call_service::get_job(&state, id)
        .await
        .map_err(map_job_error)?;

    Ok(Json(job))
}

/// GET /calls
/// List all call jobs
pub async fn list_calls(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<CallJob>>> {
    tracing::debug!("Listing all call jobs");

    let jobs = call_service::list_jobs(&state)
        .await
        .map_err(map_job_error)?;

    Ok(Json(jobs))
}

// =============================================================================
// Gateway Webhooks
// =============================================================================

/// POST /call/{id}/decision
/// Decision-capture webhook; always acknowledges success
pub async fn decision_webhook(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Option<Json<DecisionCallback>>,
) -> Json<CallbackAck> {
    // An unreadable body still gets an ack; an absent digit is a timeout.
    let digit = payload.map(|Json(cb)| cb.digit).unwrap_or_default();

    tracing::info!("Decision callback for job {}: digit {:?}", id, digit);

    call_service::handle_decision_callback(&state, id, &digit).await;

    Json(CallbackAck { ok: true })
}

/// POST /call/{id}/status/{attempt_index}
/// Call status webhook; always acknowledges success
pub async fn status_webhook(
    State(state): State<Arc<AppState>>,
    Path((id, attempt_index)): Path<(Uuid, u32)>,
    payload: Option<Json<StatusCallback>>,
) -> Json<CallbackAck> {
    let Some(Json(cb)) = payload else {
        tracing::warn!("Status callback for job {} had an unreadable body; ignoring", id);
        return Json(CallbackAck { ok: true });
    };

    tracing::info!(
        "Status callback for job {} attempt {}: {}",
        id,
        attempt_index,
        cb.call_status
    );

    call_service::handle_status_callback(&state, id, attempt_index, cb).await;

    Json(CallbackAck { ok: true })
}

// =============================================================================
// Error Mapping
// =============================================================================

fn map_job_error(err: JobError) -> ApiError {
    match err {
        JobError::Validation(msg) => ApiError::BadRequest(msg),
        JobError::JobNotFound(id) => ApiError::NotFound(format!("Call job {} not found", id)),
        JobError::GroupNotFound(id) => {
            ApiError::NotFound(format!("Notification group {} not found", id))
        }
        JobError::Configuration(keys) => ApiError::BadRequest(format!(
            "Telephony gateway not configured; missing {}",
            keys.join(", ")
        )),
        JobError::Gateway(msg) => ApiError::BadGateway(msg),
        JobError::Store(err) => ApiError::DatabaseError(err),
    }
}
