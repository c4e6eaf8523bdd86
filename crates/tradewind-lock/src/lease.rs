//! Lease records and the coordination store seam

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::LockError;

/// Proof of a held distributed lock.
///
/// At most one unexpired token exists per resource name, cluster-wide.
/// The fencing number increases every time the resource changes hands, so
/// the store can tell a stale former holder from the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    /// Resource the lease covers
    pub resource: String,
    /// Identity of the holding instance
    pub holder: Uuid,
    /// When the lease was granted
    pub acquired_at: Instant,
    /// When the lease lapses unless renewed
    pub expires_at: Instant,
    /// Monotonic generation issued by the store
    pub fencing: u64,
}

impl LockToken {
    /// Whether the lease has already lapsed
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Time left on the lease, zero if lapsed
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Coordination store backing the distributed lock.
///
/// Implementations must make `try_acquire` atomic with respect to
/// concurrent callers: only one of several simultaneous attempts on a free
/// resource may succeed.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Attempt to take the lease. Returns `None` when another holder owns
    /// an unexpired lease; an expired lease is reclaimable by any caller.
    async fn try_acquire(
        &self,
        resource: &str,
        holder: Uuid,
        ttl: Duration,
    ) -> Result<Option<LockToken>, LockError>;

    /// Extend the lease by `ttl` from now. Owner-only.
    async fn renew(&self, token: &LockToken, ttl: Duration) -> Result<LockToken, LockError>;

    /// Give the lease up. Owner-only, but releasing a lease that already
    /// lapsed (or was never held) is a no-op rather than an error.
    async fn release(&self, token: &LockToken) -> Result<(), LockError>;
}

#[derive(Debug)]
struct LeaseEntry {
    holder: Uuid,
    expires_at: Instant,
    fencing: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    leases: HashMap<String, LeaseEntry>,
    next_fencing: u64,
}

/// In-process lease store.
///
/// Shared via `Arc` it models the external coordination store for a
/// simulated fleet: every "instance" holding a clone contends on the same
/// lease table.
#[derive(Debug, Default)]
pub struct InMemoryLeaseStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryLeaseStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn try_acquire(
        &self,
        resource: &str,
        holder: Uuid,
        ttl: Duration,
    ) -> Result<Option<LockToken>, LockError> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        if let Some(entry) = inner.leases.get(resource) {
            if entry.expires_at > now {
                return Ok(None);
            }
            tracing::debug!(resource, holder = %entry.holder, "reclaiming expired lease");
        }

        inner.next_fencing += 1;
        let fencing = inner.next_fencing;
        inner.leases.insert(
            resource.to_string(),
            LeaseEntry {
                holder,
                expires_at: now + ttl,
                fencing,
            },
        );

        Ok(Some(LockToken {
            resource: resource.to_string(),
            holder,
            acquired_at: now,
            expires_at: now + ttl,
            fencing,
        }))
    }

    async fn renew(&self, token: &LockToken, ttl: Duration) -> Result<LockToken, LockError> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let entry = inner
            .leases
            .get_mut(&token.resource)
            .ok_or_else(|| LockError::Expired {
                resource: token.resource.clone(),
            })?;

        if entry.holder != token.holder || entry.fencing != token.fencing {
            return Err(LockError::NotOwner {
                resource: token.resource.clone(),
            });
        }
        if entry.expires_at <= now {
            return Err(LockError::Expired {
                resource: token.resource.clone(),
            });
        }

        entry.expires_at = now + ttl;
        Ok(LockToken {
            expires_at: entry.expires_at,
            ..token.clone()
        })
    }

    async fn release(&self, token: &LockToken) -> Result<(), LockError> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        match inner.leases.get(&token.resource) {
            None => Ok(()),
            Some(entry) if entry.holder == token.holder && entry.fencing == token.fencing => {
                inner.leases.remove(&token.resource);
                Ok(())
            }
            // The caller's lease lapsed and the resource moved on; treat
            // as already released by expiry.
            Some(_) if token.expires_at <= now => Ok(()),
            Some(_) => Err(LockError::NotOwner {
                resource: token.resource.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const TTL: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn free_resource_is_acquired() {
        let store = InMemoryLeaseStore::new();
        let holder = Uuid::new_v4();
        let token = store.try_acquire("bootstrap", holder, TTL).await.unwrap();
        assert_matches!(token, Some(t) => {
            assert_eq!(t.holder, holder);
            assert!(!t.is_expired());
        });
    }

    #[tokio::test]
    async fn held_resource_is_refused() {
        let store = InMemoryLeaseStore::new();
        store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap();
        let second = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_lease_is_reclaimable() {
        let store = InMemoryLeaseStore::new();
        store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let second_holder = Uuid::new_v4();
        let token = store
            .try_acquire("bootstrap", second_holder, TTL)
            .await
            .unwrap();
        assert_matches!(token, Some(t) => assert_eq!(t.holder, second_holder));
    }

    #[tokio::test(start_paused = true)]
    async fn renew_extends_expiry() {
        let store = InMemoryLeaseStore::new();
        let token = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap()
            .unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        let renewed = store.renew(&token, TTL).await.unwrap();
        assert!(renewed.expires_at > token.expires_at);
        assert_eq!(renewed.fencing, token.fencing);
    }

    #[tokio::test]
    async fn non_owner_renew_is_violation() {
        let store = InMemoryLeaseStore::new();
        let token = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap()
            .unwrap();

        let forged = LockToken {
            holder: Uuid::new_v4(),
            ..token.clone()
        };
        assert_matches!(
            store.renew(&forged, TTL).await,
            Err(LockError::NotOwner { .. })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_fencing_cannot_renew_successor_lease() {
        let store = InMemoryLeaseStore::new();
        let first = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap()
            .unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap()
            .unwrap();

        assert_matches!(
            store.renew(&first, TTL).await,
            Err(LockError::NotOwner { .. })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn renew_after_expiry_fails() {
        let store = InMemoryLeaseStore::new();
        let token = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap()
            .unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert_matches!(
            store.renew(&token, TTL).await,
            Err(LockError::Expired { .. })
        );
    }

    #[tokio::test]
    async fn release_frees_the_resource() {
        let store = InMemoryLeaseStore::new();
        let holder = Uuid::new_v4();
        let token = store
            .try_acquire("bootstrap", holder, TTL)
            .await
            .unwrap()
            .unwrap();

        store.release(&token).await.unwrap();
        // Released lease is gone; releasing again is a no-op.
        store.release(&token).await.unwrap();

        let retaken = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap();
        assert!(retaken.is_some());
    }

    #[tokio::test]
    async fn non_owner_release_is_violation() {
        let store = InMemoryLeaseStore::new();
        let token = store
            .try_acquire("bootstrap", Uuid::new_v4(), TTL)
            .await
            .unwrap()
            .unwrap();

        let forged = LockToken {
            holder: Uuid::new_v4(),
            fencing: token.fencing + 7,
            ..token.clone()
        };
        assert_matches!(
            store.release(&forged).await,
            Err(LockError::NotOwner { .. })
        );
    }
}
