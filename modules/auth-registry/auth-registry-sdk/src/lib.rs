//! Auth Registry SDK
//!
//! This crate provides the public contract of the `auth_registry` module:
//!
//! - [`AuthRegistryClient`] - Public API trait for consumers
//! - [`AuthenticationProvider`] / [`UserLookupService`] - Plugin traits for identity sources
//! - [`IdentitySourceFactory`] - Builds identity sources from configuration items
//! - [`CustomItemMapper`] - Typed view over a single configuration item
//! - [`AuthRegistryError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use auth_registry_sdk::{AuthRegistryClient, Credentials};
//!
//! let auth = client.authenticate(&Credentials::new("alice", "secret")).await?;
//! let user = client.load_user("alice").await?;
//! ```

pub mod api;
pub mod error;
pub mod mapper;
pub mod models;
pub mod plugin_api;

// Re-export main types at crate root
pub use api::AuthRegistryClient;
pub use error::AuthRegistryError;
pub use mapper::{CustomItemMapper, SerdeItemMapper};
pub use models::{
    Authentication, AuthenticationItem, AuthenticationItemUpdate, CachedUser, Credentials,
    ENABLED_KEY, ItemKind, ORDER_KEY, PropertyBag, TYPE_KEY, UserDetails,
};
pub use plugin_api::{
    AuthenticationError, AuthenticationProvider, IdentitySource, IdentitySourceFactory,
    LookupOutcome, UserLookupService,
};
