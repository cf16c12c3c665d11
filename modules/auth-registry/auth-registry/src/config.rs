//! Configuration for the auth registry.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variables with this prefix override file and default values.
pub const ENV_PREFIX: &str = "AUTH_REGISTRY_";

/// Configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthRegistryConfig {
    /// How long an externally sourced user stays trusted in the cache.
    pub external_users_cache_seconds: u64,

    /// Upper bound for a single lookup-service call.
    pub lookup_timeout_ms: u64,
}

impl Default for AuthRegistryConfig {
    fn default() -> Self {
        Self {
            external_users_cache_seconds: 300,
            lookup_timeout_ms: 5_000,
        }
    }
}

impl AuthRegistryConfig {
    /// Layer defaults, an optional YAML file and `AUTH_REGISTRY_*` variables.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be parsed or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("failed to load auth registry configuration")
    }

    #[must_use]
    pub fn external_users_ttl(&self) -> Duration {
        Duration::from_secs(self.external_users_cache_seconds)
    }

    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AuthRegistryConfig::default();
        assert_eq!(cfg.external_users_ttl(), Duration::from_secs(300));
        assert_eq!(cfg.lookup_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "external_users_cache_seconds: 60").unwrap();

        let cfg = AuthRegistryConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.external_users_cache_seconds, 60);
        assert_eq!(cfg.lookup_timeout_ms, 5_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_seconds: 60").unwrap();

        assert!(AuthRegistryConfig::load(Some(file.path())).is_err());
    }
}
