//! Username resolution over the external-user cache and the lookup-service chain.

use std::time::Duration;

use auth_registry_sdk::{CachedUser, LookupOutcome};
use tracing::{debug, info, warn};

use super::cache::ExternalUserCache;
use super::catalog::CatalogSnapshot;
use super::error::DomainError;

pub struct ResolutionEngine {
    cache: ExternalUserCache,
    lookup_timeout: Duration,
}

impl ResolutionEngine {
    #[must_use]
    pub fn new(cache: ExternalUserCache, lookup_timeout: Duration) -> Self {
        Self {
            cache,
            lookup_timeout,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &ExternalUserCache {
        &self.cache
    }

    /// Resolve `username`.
    ///
    /// A fresh cached record is returned without touching any source.
    /// Otherwise the enabled lookup services of `catalog` are asked in
    /// priority order and the first hit is cached. A source that fails or
    /// exceeds the lookup timeout is skipped like one that does not know the
    /// user; the chain is walked once, without retries.
    ///
    /// # Errors
    ///
    /// `UserNotResolvable` when no source knows the user. Any cached record
    /// for the user is evicted in that case.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn resolve(
        &self,
        username: &str,
        catalog: &CatalogSnapshot,
    ) -> Result<CachedUser, DomainError> {
        if let Some(record) = self.cache.find_fresh(username) {
            debug!(source_id = %record.source_id, "serving cached user");
            return Ok(record);
        }

        for entry in catalog.lookup_services() {
            let outcome =
                match tokio::time::timeout(self.lookup_timeout, entry.service.load_user(username))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => LookupOutcome::Failed(format!(
                        "timed out after {} ms",
                        self.lookup_timeout.as_millis()
                    )),
                };

            match outcome {
                LookupOutcome::Found(details) => {
                    debug!(source_id = %entry.source_id, "user resolved");
                    return Ok(self.cache.store(&entry.source_id, details));
                }
                LookupOutcome::NotFound => {
                    debug!(source_id = %entry.source_id, "user not known to source");
                }
                LookupOutcome::Failed(reason) => {
                    warn!(source_id = %entry.source_id, %reason, "lookup service failed, skipping");
                }
            }
        }

        if self.cache.evict(username) {
            info!("evicted cached user that no source resolves anymore");
        }
        Err(DomainError::user_not_resolvable(username))
    }
}
