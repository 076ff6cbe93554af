//! Storage abstraction
//!
//! Traits the state machine persists through. The orchestrator ships two
//! implementations: Postgres-backed (`PgStore`, the durable deployment) and
//! in-memory (`MemoryStore`, used for credential-less demo runs and tests).

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use bookline_core::domain::group::NotifyGroup;
use bookline_core::domain::job::CallJob;
use bookline_core::domain::reservation::{Plan, Reservation};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable keyed storage for call jobs
///
/// The per-job row written by `upsert` is the source of truth for a job's
/// current state; `write_snapshot` is the coarser best-effort bulk copy and
/// may lag behind.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace the job row keyed by job id.
    async fn upsert(&self, job: &CallJob) -> Result<(), StoreError>;

    /// Fetch one job by id.
    async fn get(&self, id: Uuid) -> Result<Option<CallJob>, StoreError>;

    /// List all jobs, newest first.
    async fn list(&self) -> Result<Vec<CallJob>, StoreError>;

    /// Write a bulk snapshot of aggregate job state.
    async fn write_snapshot(&self, jobs: &[CallJob]) -> Result<(), StoreError>;
}

/// Read-side directory for notification audience resolution
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Fetch a notification group with its members.
    async fn group_by_id(&self, id: Uuid) -> Result<Option<NotifyGroup>, StoreError>;

    /// Current phone number of a linked user account.
    async fn user_phone(&self, user_id: Uuid) -> Result<Option<String>, StoreError>;
}

/// Persistence for confirmation artifacts
///
/// Both writes upsert on ids derived from the job id, so re-delivery of a
/// decision callback cannot create duplicates downstream.
#[async_trait]
pub trait ConfirmationStore: Send + Sync {
    async fn write_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn write_plan(&self, plan: &Plan) -> Result<(), StoreError>;
}
