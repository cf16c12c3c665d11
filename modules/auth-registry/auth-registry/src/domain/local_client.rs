//! Local (in-process) client for the auth registry.

use std::sync::Arc;

use async_trait::async_trait;
use auth_registry_sdk::{
    AuthRegistryClient, AuthRegistryError, Authentication, AuthenticationItem,
    AuthenticationItemUpdate, Credentials, UserDetails,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
pub struct AuthRegistryLocalClient {
    svc: Arc<Service>,
}

impl AuthRegistryLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> AuthRegistryError {
    match &e {
        // Expected outcomes of a sign-in or lookup, not faults.
        DomainError::Authentication(_) | DomainError::UserNotResolvable { .. } => {
            tracing::debug!(operation = op, error = %e, "auth_registry call refused");
        }
        _ => tracing::error!(operation = op, error = ?e, "auth_registry call failed"),
    }
    e.into()
}

#[async_trait]
impl AuthRegistryClient for AuthRegistryLocalClient {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Authentication, AuthRegistryError> {
        self.svc
            .authenticate(credentials)
            .await
            .map_err(|e| log_and_convert("authenticate", e))
    }

    async fn load_user(&self, username: &str) -> Result<UserDetails, AuthRegistryError> {
        self.svc
            .load_user(username)
            .await
            .map_err(|e| log_and_convert("load_user", e))
    }

    async fn list_items(&self) -> Result<Vec<AuthenticationItem>, AuthRegistryError> {
        self.svc
            .list_items()
            .await
            .map_err(|e| log_and_convert("list_items", e))
    }

    async fn reorder(&self, first: &str, second: &str) -> Result<(), AuthRegistryError> {
        self.svc
            .reorder(first, second)
            .await
            .map_err(|e| log_and_convert("reorder", e))
    }

    async fn update_items(
        &self,
        items: Vec<AuthenticationItemUpdate>,
    ) -> Result<(), AuthRegistryError> {
        self.svc
            .update_items(&items)
            .await
            .map_err(|e| log_and_convert("update_items", e))
    }

    async fn reload(&self) -> Result<(), AuthRegistryError> {
        self.svc
            .reload()
            .await
            .map_err(|e| log_and_convert("reload", e))
    }
}
