//! Bootstrap steps and the state they build

use std::collections::BTreeMap;

use async_trait::async_trait;

use tradewind_core::{PermissionRegistryBuilder, PlatformResult};

/// Mutable state threaded through the bootstrap sequence.
///
/// Everything a step produces lands here; after the critical section the
/// host freezes the registry and hands the rest to the serving phase.
#[derive(Debug, Default)]
pub struct BootstrapContext {
    /// Permission catalog under construction
    pub registry: PermissionRegistryBuilder,

    /// Platform settings registered during boot (key -> default value)
    pub settings: BTreeMap<String, String>,
}

impl BootstrapContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a setting default, keeping an existing value.
    ///
    /// Insert-if-absent keeps the operation convergent when the step runs
    /// again on the next instance.
    pub fn register_setting(&mut self, key: impl Into<String>, default: impl Into<String>) {
        self.settings.entry(key.into()).or_insert_with(|| default.into());
    }
}

/// An ordered, named, idempotent unit of bootstrap work.
///
/// Re-running a completed step must be a no-op or safely convergent
/// ("create table if not exists" semantics). Steps are mutually exclusive
/// across concurrent instances but not exactly-once across restarts.
#[async_trait]
pub trait BootstrapStep: Send + Sync {
    /// Step name, used in logs and failure reports
    fn name(&self) -> &str;

    /// Execute the step
    async fn run(&self, ctx: &mut BootstrapContext) -> PlatformResult<()>;
}
