//! Tradewind Bootstrap
//!
//! When several instances of the platform start at once (rolling deploy,
//! autoscaling), exactly one at a time may run the initialization sequence:
//! schema migrations, settings registration, permission registration,
//! module migrations. This crate provides the ordered step abstraction and
//! the orchestrator that runs the sequence inside the distributed lock's
//! critical section.
//!
//! Steps are idempotent or convergent by contract. Waiting instances run
//! the same steps again once the lock frees, so "safe to run many times
//! across the fleet's lifetime" is a requirement, not an optimization.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod orchestrator;
pub mod step;

pub use orchestrator::{BootstrapPhase, Orchestrator, BOOTSTRAP_RESOURCE};
pub use step::{BootstrapContext, BootstrapStep};
