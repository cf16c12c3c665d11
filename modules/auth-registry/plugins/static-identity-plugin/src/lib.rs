#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Identity Source Plugin
//!
//! An identity source whose users are listed directly in its configuration
//! item. Useful for development, tests and break-glass local accounts.
//!
//! ## Modes
//!
//! - **`both`** (default): verifies credentials and resolves users.
//! - **`provider`**: only verifies credentials.
//! - **`lookup`**: only resolves users.
//!
//! ## Configuration item
//!
//! ```yaml
//! local:
//!   type: static
//!   order: 10
//!   mode: both
//!   users:
//!     - username: admin
//!       password: change-me
//!       roles: ["admin"]
//!     - username: former-employee
//!       password: x
//!       enabled: false
//! ```

pub mod config;
pub mod domain;
pub mod factory;

pub use factory::{STATIC_SOURCE_TYPE, StaticIdentityFactory};
