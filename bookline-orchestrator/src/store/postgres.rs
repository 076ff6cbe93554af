//! Postgres store
//!
//! Implements the store traits over the repository layer. One `PgStore`
//! handle serves all three trait roles.

use async_trait::async_trait;
use bookline_core::domain::group::NotifyGroup;
use bookline_core::domain::job::CallJob;
use bookline_core::domain::reservation::{Plan, Reservation};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ConfirmationStore, GroupDirectory, JobStore, StoreError};
use crate::repository::{confirmation_repository, group_repository, job_repository};

/// Postgres-backed implementation of every store trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn upsert(&self, job: &CallJob) -> Result<(), StoreError> {
        job_repository::upsert(&self.pool, job).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<CallJob>, StoreError> {
        job_repository::find_by_id(&self.pool, id).await
    }

    async fn list(&self) -> Result<Vec<CallJob>, StoreError> {
        job_repository::list_all(&self.pool).await
    }

    async fn write_snapshot(&self, jobs: &[CallJob]) -> Result<(), StoreError> {
        job_repository::write_snapshot(&self.pool, jobs).await
    }
}

#[async_trait]
impl GroupDirectory for PgStore {
    async fn group_by_id(&self, id: Uuid) -> Result<Option<NotifyGroup>, StoreError> {
        group_repository::find_by_id(&self.pool, id).await
    }

    async fn user_phone(&self, user_id: Uuid) -> Result<Option<String>, StoreError> {
        group_repository::user_phone(&self.pool, user_id).await
    }
}

#[async_trait]
impl ConfirmationStore for PgStore {
    async fn write_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        confirmation_repository::upsert_reservation(&self.pool, reservation).await
    }

    async fn write_plan(&self, plan: &Plan) -> Result<(), StoreError> {
        confirmation_repository::upsert_plan(&self.pool, plan).await
    }
}
