//! Factory registered with the auth registry for `type: static` items.

use std::sync::Arc;

use auth_registry_sdk::{IdentitySource, IdentitySourceFactory, PropertyBag};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{SourceMode, StaticIdentityPluginConfig};
use crate::domain::Service;

pub const STATIC_SOURCE_TYPE: &str = "static";

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticIdentityFactory;

impl IdentitySourceFactory for StaticIdentityFactory {
    fn kind(&self) -> &str {
        STATIC_SOURCE_TYPE
    }

    fn build(&self, name: &str, properties: &PropertyBag) -> Result<IdentitySource, String> {
        let cfg: StaticIdentityPluginConfig =
            serde_json::from_value(Value::Object(properties.without_reserved().into_map()))
                .map_err(|e| format!("invalid static identity configuration: {e}"))?;

        if cfg.users.is_empty() {
            warn!(item = %name, "static identity source has no users");
        }
        info!(item = %name, mode = ?cfg.mode, user_count = cfg.users.len(), "static identity source built");

        let service = Arc::new(Service::from_config(name, &cfg));
        Ok(match cfg.mode {
            SourceMode::Provider => IdentitySource::Provider(service),
            SourceMode::Lookup => IdentitySource::LookupService(service),
            SourceMode::Both => IdentitySource::Both {
                provider: service.clone(),
                lookup: service,
            },
        })
    }
}
