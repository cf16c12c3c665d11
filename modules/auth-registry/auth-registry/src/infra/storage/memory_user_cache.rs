//! In-process storage for the external-user cache.

use auth_registry_sdk::CachedUser;
use dashmap::DashMap;

use crate::domain::repo::UserCacheRepository;

#[derive(Debug, Default)]
pub struct InMemoryUserCache {
    users: DashMap<String, CachedUser>,
}

impl InMemoryUserCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserCacheRepository for InMemoryUserCache {
    fn find(&self, username: &str) -> Option<CachedUser> {
        self.users.get(username).map(|entry| entry.value().clone())
    }

    fn upsert(&self, user: CachedUser) {
        self.users.insert(user.username.clone(), user);
    }

    fn delete(&self, username: &str) -> bool {
        self.users.remove(username).is_some()
    }
}
