//! In-memory store
//!
//! Backs tests and credential-less demo runs. All maps live behind async
//! RwLocks; the bulk snapshot is kept as the last serialized copy so the
//! snapshot loop can be exercised without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use bookline_core::domain::group::NotifyGroup;
use bookline_core::domain::job::CallJob;
use bookline_core::domain::reservation::{Plan, Reservation};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConfirmationStore, GroupDirectory, JobStore, StoreError};

/// In-memory implementation of every store trait
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<Uuid, CallJob>>,
    groups: RwLock<HashMap<Uuid, NotifyGroup>>,
    user_phones: RwLock<HashMap<Uuid, String>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    plans: RwLock<HashMap<Uuid, Plan>>,
    snapshot: RwLock<Option<serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a notification group.
    #[allow(dead_code)]
    pub async fn insert_group(&self, group: NotifyGroup) {
        self.groups.write().await.insert(group.id, group);
    }

    /// Seed a user's current phone number.
    #[allow(dead_code)]
    pub async fn set_user_phone(&self, user_id: Uuid, phone: impl Into<String>) {
        self.user_phones.write().await.insert(user_id, phone.into());
    }

    /// Stored reservations, for assertions.
    #[allow(dead_code)]
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.reservations.read().await.values().cloned().collect()
    }

    /// Stored plans, for assertions.
    #[allow(dead_code)]
    pub async fn plans(&self) -> Vec<Plan> {
        self.plans.read().await.values().cloned().collect()
    }

    /// The last written bulk snapshot, for assertions.
    #[allow(dead_code)]
    pub async fn last_snapshot(&self) -> Option<serde_json::Value> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn upsert(&self, job: &CallJob) -> Result<(), StoreError> {
        self.jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CallJob>, StoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<CallJob>, StoreError> {
        let mut jobs: Vec<CallJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn write_snapshot(&self, jobs: &[CallJob]) -> Result<(), StoreError> {
        let payload = serde_json::to_value(jobs)?;
        *self.snapshot.write().await = Some(payload);
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for MemoryStore {
    async fn group_by_id(&self, id: Uuid) -> Result<Option<NotifyGroup>, StoreError> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn user_phone(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.user_phones.read().await.get(&user_id).cloned())
    }
}

#[async_trait]
impl ConfirmationStore for MemoryStore {
    async fn write_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn write_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        self.plans.write().await.insert(plan.id, plan.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookline_core::domain::job::{CallJobStatus, NotificationTarget, ReservationDecision};

    fn sample_job() -> CallJob {
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
            attempts: vec![],
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

    #[tokio::test]
    async fn test_job_upsert_replaces() {
        let store = MemoryStore::new();
        let mut job = sample_job();

        store.upsert(&job).await.unwrap();
        job.status = CallJobStatus::Calling;
        store.upsert(&job).await.unwrap();

        let loaded = store.get(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, CallJobStatus::Calling);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let store = MemoryStore::new();
        let job = sample_job();
        store.upsert(&job).await.unwrap();

        let jobs = store.list().await.unwrap();
        store.write_snapshot(&jobs).await.unwrap();

        let snapshot = store.last_snapshot().await.unwrap();
        assert_eq!(snapshot.as_array().unwrap().len(), 1);
    }
}
