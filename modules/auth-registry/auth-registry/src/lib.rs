//! Auth Registry Module
//!
//! Keeps the ordered chains of authentication providers and user lookup
//! services, built from named configuration items in a property store, and
//! lets operators reorder, enable or extend them at runtime. Every change is
//! committed as one atomic batch and is followed by a rebuild of the chains.
//!
//! Provides the `AuthRegistryClient` trait from `auth_registry_sdk` through
//! [`domain::AuthRegistryLocalClient`].
//!
//! ## Configuration
//!
//! ```yaml
//! external_users_cache_seconds: 300
//! lookup_timeout_ms: 5000
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;

pub use config::AuthRegistryConfig;
pub use domain::{AuthRegistryLocalClient, Service, ServiceConfig};
