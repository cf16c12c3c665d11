//! Identity-source trait implementations for the static directory.

use async_trait::async_trait;
use auth_registry_sdk::{
    Authentication, AuthenticationError, AuthenticationProvider, Credentials, LookupOutcome,
    UserLookupService,
};

use super::service::Service;

#[async_trait]
impl AuthenticationProvider for Service {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Authentication>, AuthenticationError> {
        self.verify(credentials).map(Some)
    }
}

#[async_trait]
impl UserLookupService for Service {
    async fn load_user(&self, username: &str) -> LookupOutcome {
        match self.find(username) {
            Some(details) => LookupOutcome::Found(details),
            None => LookupOutcome::NotFound,
        }
    }
}
