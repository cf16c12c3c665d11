//! External-user cache.
//!
//! Externally sourced identities can change or be revoked upstream, so they
//! are trusted for a bounded time only. Locally managed identities have no
//! source and never expire; they are invalidated by direct mutation.

use std::sync::Arc;
use std::time::Duration;

use auth_registry_sdk::{CachedUser, UserDetails};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use super::repo::UserCacheRepository;

/// Wall-clock source for cache timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `true` if `record` may be served without consulting its source.
///
/// A TTL too large to represent never expires.
#[must_use]
pub fn is_fresh(record: &CachedUser, now: DateTime<Utc>, ttl: Duration) -> bool {
    if !record.is_external() {
        return true;
    }
    let Ok(ttl) = TimeDelta::from_std(ttl) else {
        return true;
    };
    record
        .last_update
        .checked_add_signed(ttl)
        .is_none_or(|expires_at| now < expires_at)
}

pub struct ExternalUserCache {
    repo: Arc<dyn UserCacheRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ExternalUserCache {
    #[must_use]
    pub fn new(repo: Arc<dyn UserCacheRepository>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { repo, clock, ttl }
    }

    #[must_use]
    pub fn find(&self, username: &str) -> Option<CachedUser> {
        self.repo.find(username)
    }

    /// The cached record for `username` if it is still fresh.
    #[must_use]
    pub fn find_fresh(&self, username: &str) -> Option<CachedUser> {
        let record = self.repo.find(username)?;
        if is_fresh(&record, self.clock.now(), self.ttl) {
            Some(record)
        } else {
            debug!(
                username,
                source_id = %record.source_id,
                last_update = %record.last_update,
                "cached user is stale"
            );
            None
        }
    }

    /// Record `details` as produced by `source_id` now.
    pub fn store(&self, source_id: &str, details: UserDetails) -> CachedUser {
        let record = CachedUser {
            username: details.username.clone(),
            source_id: source_id.to_owned(),
            last_update: self.clock.now(),
            details,
        };
        self.repo.upsert(record.clone());
        record
    }

    /// Record a locally managed user. Such records never go stale.
    pub fn store_local(&self, details: UserDetails) -> CachedUser {
        self.store("", details)
    }

    pub fn evict(&self, username: &str) -> bool {
        self.repo.delete(username)
    }
}
