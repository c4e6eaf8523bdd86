//! Tradewind Lock
//!
//! Cluster-wide mutual exclusion for the bootstrap critical section.
//!
//! The lock is a lease, not a pure mutex: a holder that crashes stops
//! renewing and the lease expires after its TTL, so a dead instance can
//! never wedge the fleet. Tokens carry a fencing number issued by the
//! store; a holder that lost its lease cannot renew or release the
//! successor's lease even though the resource name matches.
//!
//! The coordination store itself sits behind the [`LeaseStore`] trait.
//! Production deployments back it with a shared store (relational advisory
//! lock, cache with TTL); [`InMemoryLeaseStore`] serves tests and
//! single-process fleets.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod lease;
pub mod lock;

pub use lease::{InMemoryLeaseStore, LeaseStore, LockToken};
pub use lock::DistributedLock;

use std::time::Duration;

use tradewind_core::PlatformError;

/// Lock subsystem errors
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The acquisition timeout elapsed while another holder kept the
    /// lease. Retryable by restarting the instance.
    #[error("timed out acquiring lock '{resource}' after {waited:?}")]
    Timeout {
        /// Contested resource name
        resource: String,
        /// How long the caller waited
        waited: Duration,
    },

    /// A non-owner attempted renew or release. A bug, not contention.
    #[error("holder is not the owner of lock '{resource}'")]
    NotOwner {
        /// Resource name of the violated lease
        resource: String,
    },

    /// The caller's lease expired before it could be renewed
    #[error("lease on '{resource}' expired before renewal")]
    Expired {
        /// Resource name of the lapsed lease
        resource: String,
    },

    /// The coordination store failed
    #[error("coordination store error: {message}")]
    Store {
        /// Backend failure description
        message: String,
    },
}

impl From<LockError> for PlatformError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Timeout { .. } => PlatformError::LockTimeout {
                message: err.to_string(),
            },
            LockError::NotOwner { .. } | LockError::Expired { .. } => {
                PlatformError::LockOwnership {
                    message: err.to_string(),
                }
            }
            LockError::Store { .. } => PlatformError::Config {
                message: err.to_string(),
            },
        }
    }
}
