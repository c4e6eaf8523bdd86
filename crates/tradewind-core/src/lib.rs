//! Tradewind Core
//!
//! Foundation crate for the Tradewind commerce platform host. It carries the
//! pieces every other crate depends on:
//!
//! - the unified [`PlatformError`] taxonomy,
//! - the permission vocabulary ([`Permission`], [`PermissionScope`]) and the
//!   boot-time [`PermissionRegistry`],
//! - the platform configuration surface ([`PlatformConfig`]).
//!
//! The permission catalog is populated exactly once, during the bootstrap
//! critical section, and frozen before the serving phase begins. Everything
//! downstream reads an immutable snapshot.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

/// Unified error handling
pub mod error;

/// Permission vocabulary, scopes and the boot-time registry
pub mod permission;

/// Platform configuration loading and validation
pub mod config;

pub use config::{
    AuthOptions, IssuerValidation, LockOptions, PlatformConfig, SecurityOptions,
};
pub use error::{PlatformError, PlatformResult};
pub use permission::{
    Permission, PermissionRegistry, PermissionRegistryBuilder, PermissionScope,
};
