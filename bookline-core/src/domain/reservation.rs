//! Confirmation artifact domain types
//!
//! Created once per job when the callee confirms: a reservation record plus
//! a derived plan record wrapping it for display. Both carry ids derived
//! deterministically from the job id so re-delivery of the decision callback
//! upserts instead of duplicating.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A confirmed reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Job-derived external key; the persistence layer upserts on it.
    pub external_key: String,
    pub restaurant_name: String,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub party_size: u32,
    pub special_requests: Vec<String>,
    /// How the reservation was established (e.g. phone confirmation).
    pub source: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A display-ready plan wrapping a confirmed reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub user_id: Uuid,
    /// The call job this plan was derived from.
    pub job_id: Uuid,
    pub title: String,
    pub events: Vec<PlanEvent>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A single entry on a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEvent {
    pub title: String,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub ends_at: chrono::DateTime<chrono::Utc>,
    pub reservation_id: Uuid,
}

/// Deterministic reservation id for a job.
pub fn reservation_id_for_job(job_id: Uuid) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("bookline:reservation:{job_id}").as_bytes(),
    )
}

/// Deterministic plan id for a job.
pub fn plan_id_for_job(job_id: Uuid) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("bookline:plan:{job_id}").as_bytes(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_ids_are_deterministic_per_job() {
        let job_id = Uuid::new_v4();
        assert_eq!(reservation_id_for_job(job_id), reservation_id_for_job(job_id));
        assert_eq!(plan_id_for_job(job_id), plan_id_for_job(job_id));
        assert_ne!(reservation_id_for_job(job_id), plan_id_for_job(job_id));

        let other = Uuid::new_v4();
        assert_ne!(reservation_id_for_job(job_id), reservation_id_for_job(other));
    }
}
