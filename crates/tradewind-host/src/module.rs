//! Feature module seam
//!
//! Modules are the unit of installation: each contributes named
//! permissions to the platform vocabulary and, optionally, its own
//! bootstrap steps (data migrations and the like). The permission
//! vocabulary is therefore open-ended and discovered at runtime, not
//! declared statically.

use tradewind_bootstrap::BootstrapStep;
use tradewind_core::Permission;

/// An installed feature module
pub trait PlatformModule: Send + Sync {
    /// Module identifier; also the namespace of its permission ids
    fn id(&self) -> &str;

    /// Permissions this module contributes, `"<module>:<action>"`
    fn permissions(&self) -> Vec<Permission>;

    /// Module-owned bootstrap steps, run inside the critical section
    /// after the platform's own steps, in module installation order
    fn bootstrap_steps(&self) -> Vec<Box<dyn BootstrapStep>> {
        Vec::new()
    }
}

/// The platform's own administrative surface, always installed
#[derive(Debug, Default)]
pub struct PlatformCoreModule;

impl PlatformModule for PlatformCoreModule {
    fn id(&self) -> &str {
        "platform"
    }

    fn permissions(&self) -> Vec<Permission> {
        vec![
            Permission::new("platform:manage-modules").with_group("Platform"),
            Permission::new("platform:update-settings").with_group("Platform"),
            Permission::new("platform:manage-security").with_group("Platform"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_permissions_are_namespaced() {
        let module = PlatformCoreModule;
        for permission in module.permissions() {
            assert_eq!(permission.module(), Some(module.id()));
        }
    }
}
