//! The bootstrap orchestrator

use std::time::Duration;

use parking_lot::Mutex;

use tradewind_core::{PlatformError, PlatformResult};
use tradewind_lock::{DistributedLock, LockToken};

use crate::step::{BootstrapContext, BootstrapStep};

/// Well-known lock resource for instance bootstrap
pub const BOOTSTRAP_RESOURCE: &str = "platform:bootstrap";

/// Observable orchestrator lifecycle.
///
/// `Idle -> AcquiringLock -> RunningSteps -> LockReleased`, on both the
/// success and the failure path. There is no built-in retry; a failed
/// instance is restarted externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// Not started
    Idle,
    /// Waiting for the distributed lock
    AcquiringLock,
    /// Inside the critical section
    RunningSteps,
    /// Critical section exited and lock released (or never acquired)
    LockReleased,
}

/// Runs the ordered bootstrap sequence inside the lock's critical section.
pub struct Orchestrator {
    lock: DistributedLock,
    acquire_timeout: Duration,
    phase: Mutex<BootstrapPhase>,
}

impl Orchestrator {
    /// Create an orchestrator over an instance's lock handle
    pub fn new(lock: DistributedLock, acquire_timeout: Duration) -> Self {
        Orchestrator {
            lock,
            acquire_timeout,
            phase: Mutex::new(BootstrapPhase::Idle),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> BootstrapPhase {
        *self.phase.lock()
    }

    fn set_phase(&self, phase: BootstrapPhase) {
        *self.phase.lock() = phase;
    }

    /// Acquire the bootstrap lock, run every step strictly in order, and
    /// release the lock regardless of step success or failure.
    ///
    /// The first failing step aborts the remainder; the failure is fatal
    /// to the caller (the instance must not begin serving traffic). A lock
    /// timeout likewise fails the instance's startup: another instance is
    /// legitimately bootstrapping, and this one retries by being
    /// restarted.
    pub async fn run(
        &self,
        ctx: &mut BootstrapContext,
        steps: &[Box<dyn BootstrapStep>],
    ) -> PlatformResult<()> {
        self.set_phase(BootstrapPhase::AcquiringLock);
        let token = match self.lock.acquire(BOOTSTRAP_RESOURCE, self.acquire_timeout).await {
            Ok(token) => token,
            Err(err) => {
                self.set_phase(BootstrapPhase::LockReleased);
                return Err(err.into());
            }
        };

        self.set_phase(BootstrapPhase::RunningSteps);
        let result = self.run_steps(ctx, steps, token.clone()).await;

        // Guaranteed cleanup: the lock is released on both paths. A release
        // failure must not mask a step failure.
        let released = self.lock.release(token).await;
        self.set_phase(BootstrapPhase::LockReleased);

        match (result, released) {
            (Err(step_err), _) => Err(step_err),
            (Ok(()), Err(release_err)) => Err(release_err.into()),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    async fn run_steps(
        &self,
        ctx: &mut BootstrapContext,
        steps: &[Box<dyn BootstrapStep>],
        mut token: LockToken,
    ) -> PlatformResult<()> {
        // Renew at half the lease TTL so a step running longer than one
        // lease never loses the critical section mid-step.
        let renew_interval = self.lock.lease_ttl() / 2;

        for step in steps {
            // Long step sequences outlive a single lease; extend before
            // each step so the critical section never lapses mid-run.
            token = self.lock.renew(&token).await.map_err(PlatformError::from)?;

            tracing::info!(step = step.name(), "running bootstrap step");
            let step_result = {
                let run = step.run(ctx);
                tokio::pin!(run);
                loop {
                    tokio::select! {
                        result = &mut run => break result,
                        () = tokio::time::sleep(renew_interval) => {
                            token = self.lock.renew(&token).await.map_err(PlatformError::from)?;
                        }
                    }
                }
            };
            if let Err(err) = step_result {
                tracing::error!(step = step.name(), error = %err, "bootstrap step failed");
                return Err(match err {
                    // Already carries the step context
                    err @ PlatformError::BootstrapStep { .. } => err,
                    err @ PlatformError::DuplicatePermission { .. } => err,
                    other => PlatformError::BootstrapStep {
                        step: step.name().to_string(),
                        message: other.to_string(),
                    },
                });
            }
        }
        Ok(())
    }
}
