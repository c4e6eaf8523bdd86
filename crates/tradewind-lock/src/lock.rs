//! Blocking-with-timeout lock acquisition over a lease store

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::lease::{LeaseStore, LockToken};
use crate::LockError;

/// Cluster-wide mutual exclusion primitive.
///
/// One `DistributedLock` per instance; the holder identity is fixed at
/// construction so every acquisition by this instance is attributable.
/// Acquisition polls the store at a bounded interval until the lock is
/// free or the caller's timeout elapses; there is no fairness ordering
/// between waiting instances.
pub struct DistributedLock {
    store: Arc<dyn LeaseStore>,
    holder: Uuid,
    lease_ttl: Duration,
    retry_interval: Duration,
}

impl DistributedLock {
    /// Create a lock handle over a coordination store
    pub fn new(store: Arc<dyn LeaseStore>, lease_ttl: Duration, retry_interval: Duration) -> Self {
        DistributedLock {
            store,
            holder: Uuid::new_v4(),
            lease_ttl,
            retry_interval,
        }
    }

    /// This instance's holder identity
    pub fn holder(&self) -> Uuid {
        self.holder
    }

    /// The lease duration granted on acquire and on each renewal
    pub fn lease_ttl(&self) -> Duration {
        self.lease_ttl
    }

    /// Block until the lock is free or `timeout` elapses.
    ///
    /// Timeout is a retryable condition for the caller's *orchestration*
    /// (restart the instance); it is not retried internally.
    pub async fn acquire(
        &self,
        resource: &str,
        timeout: Duration,
    ) -> Result<LockToken, LockError> {
        let started = Instant::now();
        let deadline = started + timeout;

        loop {
            if let Some(token) = self
                .store
                .try_acquire(resource, self.holder, self.lease_ttl)
                .await?
            {
                tracing::info!(
                    resource,
                    holder = %self.holder,
                    fencing = token.fencing,
                    "acquired distributed lock"
                );
                return Ok(token);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(resource, waited = ?timeout, "lock acquisition timed out");
                return Err(LockError::Timeout {
                    resource: resource.to_string(),
                    waited: now.saturating_duration_since(started),
                });
            }

            let remaining = deadline.saturating_duration_since(now);
            tokio::time::sleep(self.retry_interval.min(remaining)).await;
        }
    }

    /// Extend a held lease for a long-running critical section
    pub async fn renew(&self, token: &LockToken) -> Result<LockToken, LockError> {
        let renewed = self.store.renew(token, self.lease_ttl).await?;
        tracing::debug!(
            resource = %renewed.resource,
            remaining = ?renewed.remaining(),
            "renewed lease"
        );
        Ok(renewed)
    }

    /// Release a held lease
    pub async fn release(&self, token: LockToken) -> Result<(), LockError> {
        self.store.release(&token).await?;
        tracing::info!(resource = %token.resource, holder = %self.holder, "released distributed lock");
        Ok(())
    }
}
