//! Per-job mutual exclusion
//!
//! Gateway webhooks for the same job can arrive concurrently, duplicated,
//! and out of order. Every read-modify-write of a job goes through the lock
//! for that job id; different jobs proceed fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// An async lock per job id, created on demand
#[derive(Default)]
pub struct JobLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a job, waiting if another callback holds it.
    ///
    /// The guard is owned so callers can hold it across awaits without
    /// borrowing from the lock map.
    pub async fn acquire(&self, job_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(job_id).or_insert_with(|| Arc::new(Mutex::new(()))))
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_job_is_serialized() {
        let locks = Arc::new(JobLocks::new());
        let job_id = Uuid::new_v4();
        let counter = Arc::new(Mutex::new(0u32));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(job_id).await;
                // Non-atomic read-modify-write; only safe under the job lock.
                let current = *counter.lock().await;
                tokio::task::yield_now().await;
                *counter.lock().await = current + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*counter.lock().await, 8);
    }

    #[tokio::test]
    async fn test_different_jobs_do_not_block() {
        let locks = JobLocks::new();
        let a = locks.acquire(Uuid::new_v4()).await;
        // Acquiring a different job's lock must not deadlock while `a` is held.
        let b = locks.acquire(Uuid::new_v4()).await;
        drop(a);
        drop(b);
    }
}
