//! Platform-owned bootstrap steps
//!
//! The fixed head of the bootstrap sequence, mirroring what must happen
//! before any instance serves traffic: schema migrations, job-scheduler
//! migrations, settings registration, permission registration.
//! Module-owned steps follow.

use std::sync::Arc;

use async_trait::async_trait;

use tradewind_bootstrap::{BootstrapContext, BootstrapStep};
use tradewind_core::{Permission, PlatformResult};

/// Boundary to the schema-migration machinery.
///
/// Applying migrations must be convergent: running against an
/// already-migrated schema is a no-op.
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    /// Bring the schema up to date
    async fn apply(&self) -> PlatformResult<()>;
}

/// Migration runner for installations without a schema to migrate
#[derive(Debug, Default)]
pub struct NoopMigrationRunner;

#[async_trait]
impl MigrationRunner for NoopMigrationRunner {
    async fn apply(&self) -> PlatformResult<()> {
        Ok(())
    }
}

/// Applies platform schema migrations
pub struct PlatformMigrationsStep {
    runner: Arc<dyn MigrationRunner>,
}

impl PlatformMigrationsStep {
    /// Wrap a migration runner as the first bootstrap step
    pub fn new(runner: Arc<dyn MigrationRunner>) -> Self {
        PlatformMigrationsStep { runner }
    }
}

#[async_trait]
impl BootstrapStep for PlatformMigrationsStep {
    fn name(&self) -> &str {
        "apply-platform-migrations"
    }

    async fn run(&self, _ctx: &mut BootstrapContext) -> PlatformResult<()> {
        self.runner.apply().await
    }
}

/// Boundary to the background-job scheduler's own storage migrations.
///
/// The scheduler keeps its queue tables in the shared database, so its
/// schema moves under the same lock as the platform schema. Must be
/// convergent like [`MigrationRunner::apply`].
#[async_trait]
pub trait JobSchedulerRunner: Send + Sync {
    /// Bring the scheduler's storage up to date
    async fn migrate(&self) -> PlatformResult<()>;
}

/// Scheduler runner for installations without background jobs
#[derive(Debug, Default)]
pub struct NoopJobSchedulerRunner;

#[async_trait]
impl JobSchedulerRunner for NoopJobSchedulerRunner {
    async fn migrate(&self) -> PlatformResult<()> {
        Ok(())
    }
}

/// Applies the job scheduler's storage migrations, after the platform
/// schema and before anything that could enqueue work
pub struct JobSchedulerMigrationsStep {
    runner: Arc<dyn JobSchedulerRunner>,
}

impl JobSchedulerMigrationsStep {
    /// Wrap a scheduler runner as a bootstrap step
    pub fn new(runner: Arc<dyn JobSchedulerRunner>) -> Self {
        JobSchedulerMigrationsStep { runner }
    }
}

#[async_trait]
impl BootstrapStep for JobSchedulerMigrationsStep {
    fn name(&self) -> &str {
        "migrate-job-scheduler"
    }

    async fn run(&self, _ctx: &mut BootstrapContext) -> PlatformResult<()> {
        self.runner.migrate().await
    }
}

/// Registers platform setting defaults
pub struct SettingsStep {
    defaults: Vec<(String, String)>,
}

impl SettingsStep {
    /// Register the given setting defaults at boot
    pub fn new(defaults: Vec<(String, String)>) -> Self {
        SettingsStep { defaults }
    }
}

#[async_trait]
impl BootstrapStep for SettingsStep {
    fn name(&self) -> &str {
        "register-platform-settings"
    }

    async fn run(&self, ctx: &mut BootstrapContext) -> PlatformResult<()> {
        for (key, default) in &self.defaults {
            ctx.register_setting(key.clone(), default.clone());
        }
        Ok(())
    }
}

/// Registers every discovered module's permission contribution.
///
/// Duplicate identifiers across modules abort boot: two modules claiming
/// one access-control identity is a configuration error, never silently
/// ignored.
pub struct PermissionRegistrationStep {
    contributions: Vec<(String, Vec<Permission>)>,
}

impl PermissionRegistrationStep {
    /// Capture the module contributions collected during discovery
    pub fn new(contributions: Vec<(String, Vec<Permission>)>) -> Self {
        PermissionRegistrationStep { contributions }
    }
}

#[async_trait]
impl BootstrapStep for PermissionRegistrationStep {
    fn name(&self) -> &str {
        "register-permissions"
    }

    async fn run(&self, ctx: &mut BootstrapContext) -> PlatformResult<()> {
        for (module_id, permissions) in &self.contributions {
            ctx.registry.register(module_id, permissions.iter().cloned())?;
        }
        tracing::info!(count = ctx.registry.len(), "permission vocabulary registered");
        Ok(())
    }
}
