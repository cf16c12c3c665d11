//! Domain layer for the auth registry.

pub mod cache;
pub mod catalog;
pub mod error;
pub mod local_client;
pub mod merge;
pub mod repo;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{Clock, ExternalUserCache, SystemClock};
pub use catalog::{CatalogSnapshot, LookupServiceEntry, ProviderCatalog, ProviderEntry};
pub use error::DomainError;
pub use local_client::AuthRegistryLocalClient;
pub use merge::MergeBatch;
pub use repo::{PropertyStore, TrialValidator, UserCacheRepository};
pub use resolver::ResolutionEngine;
pub use service::{CatalogValidator, Service, ServiceConfig};
