//! The platform host

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::watch;

use tradewind_auth::{
    ApiKeyResolver, BearerTokenValidator, Decision, DenyReason, InMemoryApiKeyResolver,
    InMemoryRoleStore, MultiSchemeAuthenticator, PermissionAuthorizationHandler,
    PermissionPolicyProvider, Principal, RequestCredentials, RoleStore,
};
use tradewind_bootstrap::{BootstrapContext, BootstrapStep, Orchestrator};
use tradewind_core::{
    PermissionRegistry, PermissionScope, PlatformConfig, PlatformError, PlatformResult,
};
use tradewind_lock::{DistributedLock, InMemoryLeaseStore, LeaseStore};

use crate::module::PlatformModule;
use crate::steps::{
    JobSchedulerMigrationsStep, JobSchedulerRunner, MigrationRunner, NoopJobSchedulerRunner,
    NoopMigrationRunner, PermissionRegistrationStep, PlatformMigrationsStep, SettingsStep,
};

/// Request-level result of the authentication + authorization pipeline.
///
/// Maps directly onto HTTP statuses; notably, an unauthenticated request
/// is an explicit 401, never a redirect to a login page.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Authenticated and authorized (200)
    Authorized {
        /// The principal the request runs as
        principal: Principal,
    },

    /// No usable credentials (401)
    Unauthenticated {
        /// Audit-level description of the failure
        reason: String,
    },

    /// Authenticated but denied (403)
    Forbidden {
        /// Whether the restricted-role override or a missing permission
        /// caused the denial
        reason: DenyReason,
    },

    /// Bootstrap has not completed; the instance is not serving (503)
    NotReady,
}

impl AuthOutcome {
    /// The HTTP status this outcome maps to
    pub fn status_code(&self) -> u16 {
        match self {
            AuthOutcome::Authorized { .. } => 200,
            AuthOutcome::Unauthenticated { .. } => 401,
            AuthOutcome::Forbidden { .. } => 403,
            AuthOutcome::NotReady => 503,
        }
    }
}

struct ServingState {
    registry: Arc<PermissionRegistry>,
    settings: BTreeMap<String, String>,
    authenticator: MultiSchemeAuthenticator,
    policies: PermissionPolicyProvider,
    handler: PermissionAuthorizationHandler,
}

/// Builder for [`PlatformHost`].
///
/// Backends default to the in-memory implementations; production wiring
/// swaps in the real coordination store, key store and role store.
pub struct HostBuilder {
    config: PlatformConfig,
    modules: Vec<Arc<dyn PlatformModule>>,
    lease_store: Arc<dyn LeaseStore>,
    api_keys: Arc<dyn ApiKeyResolver>,
    roles: Arc<dyn RoleStore>,
    migrations: Arc<dyn MigrationRunner>,
    scheduler: Arc<dyn JobSchedulerRunner>,
    setting_defaults: Vec<(String, String)>,
}

impl HostBuilder {
    /// Install a feature module
    pub fn with_module(mut self, module: Arc<dyn PlatformModule>) -> Self {
        self.modules.push(module);
        self
    }

    /// Use an external coordination store for the bootstrap lock
    pub fn with_lease_store(mut self, store: Arc<dyn LeaseStore>) -> Self {
        self.lease_store = store;
        self
    }

    /// Use an external API-key backend
    pub fn with_api_keys(mut self, resolver: Arc<dyn ApiKeyResolver>) -> Self {
        self.api_keys = resolver;
        self
    }

    /// Use an external role store
    pub fn with_roles(mut self, roles: Arc<dyn RoleStore>) -> Self {
        self.roles = roles;
        self
    }

    /// Use a real schema-migration runner
    pub fn with_migrations(mut self, runner: Arc<dyn MigrationRunner>) -> Self {
        self.migrations = runner;
        self
    }

    /// Use a real job-scheduler migration runner
    pub fn with_job_scheduler(mut self, runner: Arc<dyn JobSchedulerRunner>) -> Self {
        self.scheduler = runner;
        self
    }

    /// Register a platform setting default
    pub fn with_setting_default(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.setting_defaults.push((key.into(), value.into()));
        self
    }

    /// Validate the configuration and assemble the host
    pub fn build(self) -> PlatformResult<PlatformHost> {
        self.config.validate()?;
        let (ready_tx, ready_rx) = watch::channel(false);
        Ok(PlatformHost {
            config: self.config,
            modules: self.modules,
            lease_store: self.lease_store,
            api_keys: self.api_keys,
            roles: self.roles,
            migrations: self.migrations,
            scheduler: self.scheduler,
            setting_defaults: self.setting_defaults,
            serving: OnceCell::new(),
            ready_tx,
            ready_rx,
        })
    }
}

/// The platform host instance.
///
/// Lifecycle: build, [`bootstrap`](PlatformHost::bootstrap) once, then
/// serve [`authorize`](PlatformHost::authorize) calls concurrently. The
/// serving state is written exactly once, after the critical section, and
/// read-only thereafter.
pub struct PlatformHost {
    config: PlatformConfig,
    modules: Vec<Arc<dyn PlatformModule>>,
    lease_store: Arc<dyn LeaseStore>,
    api_keys: Arc<dyn ApiKeyResolver>,
    roles: Arc<dyn RoleStore>,
    migrations: Arc<dyn MigrationRunner>,
    scheduler: Arc<dyn JobSchedulerRunner>,
    setting_defaults: Vec<(String, String)>,
    serving: OnceCell<ServingState>,
    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
}

impl PlatformHost {
    /// Start building a host over a validated-on-build configuration
    pub fn builder(config: PlatformConfig) -> HostBuilder {
        HostBuilder {
            config,
            modules: Vec::new(),
            lease_store: Arc::new(InMemoryLeaseStore::new()),
            api_keys: Arc::new(InMemoryApiKeyResolver::new()),
            roles: Arc::new(InMemoryRoleStore::new()),
            migrations: Arc::new(NoopMigrationRunner),
            scheduler: Arc::new(NoopJobSchedulerRunner),
            setting_defaults: Vec::new(),
        }
    }

    /// Whether bootstrap has completed and the instance may serve
    pub fn ready(&self) -> bool {
        *self.ready_rx.borrow()
    }

    /// Watch for the readiness flip
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.ready_rx.clone()
    }

    /// Registered settings, available once ready
    pub fn settings(&self) -> Option<&BTreeMap<String, String>> {
        self.serving.get().map(|s| &s.settings)
    }

    /// The frozen permission registry, available once ready
    pub fn registry(&self) -> Option<&Arc<PermissionRegistry>> {
        self.serving.get().map(|s| &s.registry)
    }

    /// Run the coordinated bootstrap sequence and flip readiness.
    ///
    /// Exactly one fleet instance at a time executes the critical section;
    /// the others block on the same lock and then run the same idempotent
    /// steps. Any failure here is fatal: the instance must not serve.
    pub async fn bootstrap(&self) -> PlatformResult<()> {
        if self.serving.get().is_some() {
            return Err(PlatformError::config("bootstrap already completed"));
        }

        let lock = DistributedLock::new(
            self.lease_store.clone(),
            self.config.lock.lease_ttl(),
            self.config.lock.retry_interval(),
        );
        let orchestrator = Orchestrator::new(lock, self.config.lock.acquire_timeout());

        let mut steps: Vec<Box<dyn BootstrapStep>> = vec![
            Box::new(PlatformMigrationsStep::new(self.migrations.clone())),
            Box::new(JobSchedulerMigrationsStep::new(self.scheduler.clone())),
            Box::new(SettingsStep::new(self.setting_defaults.clone())),
            Box::new(PermissionRegistrationStep::new(
                self.modules
                    .iter()
                    .map(|m| (m.id().to_string(), m.permissions()))
                    .collect(),
            )),
        ];
        for module in &self.modules {
            steps.extend(module.bootstrap_steps());
        }

        let mut ctx = BootstrapContext::new();
        orchestrator.run(&mut ctx, &steps).await?;

        let registry = Arc::new(ctx.registry.build());
        let authenticator = MultiSchemeAuthenticator::new(
            BearerTokenValidator::from_options(&self.config.auth)?,
            self.api_keys.clone(),
        );
        let state = ServingState {
            registry: registry.clone(),
            settings: ctx.settings,
            authenticator,
            policies: PermissionPolicyProvider::new(registry),
            handler: PermissionAuthorizationHandler::new(
                self.roles.clone(),
                self.config.security.restricted_roles.clone(),
            ),
        };

        if self.serving.set(state).is_err() {
            return Err(PlatformError::config("bootstrap already completed"));
        }
        let _ = self.ready_tx.send(true);
        tracing::info!(
            modules = self.modules.len(),
            "bootstrap complete, instance is ready"
        );
        Ok(())
    }

    /// Authenticate a request and evaluate a permission-gated policy.
    ///
    /// `policy_name` must be a registered permission identifier; an
    /// unknown name is a configuration error surfaced as `Err`, not a
    /// denial. Denials come back as 401/403 outcomes and are never
    /// logged as errors.
    pub async fn authorize(
        &self,
        credentials: &RequestCredentials,
        policy_name: &str,
        scope: Option<&PermissionScope>,
    ) -> PlatformResult<AuthOutcome> {
        let Some(serving) = self.serving.get() else {
            return Ok(AuthOutcome::NotReady);
        };

        let principal = match serving.authenticator.authenticate(credentials).await {
            Ok(principal) => principal,
            Err(failure) => {
                return Ok(AuthOutcome::Unauthenticated {
                    reason: failure.to_string(),
                });
            }
        };

        let policy = serving.policies.get_policy(policy_name)?;
        if !policy.schemes.contains(&principal.scheme()) {
            return Ok(AuthOutcome::Forbidden {
                reason: DenyReason::MissingPermission,
            });
        }

        match serving
            .handler
            .evaluate(&principal, &policy.permission, scope)
            .await?
        {
            Decision::Allow => Ok(AuthOutcome::Authorized { principal }),
            Decision::Deny(reason) => Ok(AuthOutcome::Forbidden { reason }),
        }
    }
}
