//! Tradewind Host
//!
//! Composition root for the platform. Discovers installed feature
//! modules, runs the coordinated bootstrap sequence inside the
//! distributed lock's critical section, freezes the permission registry,
//! and only then flips the readiness gate — no requests are served before
//! bootstrap completes.
//!
//! The serving-phase entry point is [`PlatformHost::authorize`]: it
//! resolves credentials to a principal, synthesizes the policy for the
//! requested permission, and evaluates it, mapping the result onto
//! HTTP-style statuses (200 / 401 / 403). Unauthorized requests always
//! get an explicit 401, never a login redirect.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod host;
pub mod module;
pub mod steps;

pub use host::{AuthOutcome, HostBuilder, PlatformHost};
pub use module::{PlatformCoreModule, PlatformModule};
pub use steps::{
    JobSchedulerMigrationsStep, JobSchedulerRunner, MigrationRunner, NoopJobSchedulerRunner,
    NoopMigrationRunner, PermissionRegistrationStep, PlatformMigrationsStep, SettingsStep,
};
