//! Service implementation for the static identity source.

use std::collections::{BTreeSet, HashMap};

use auth_registry_sdk::{Authentication, AuthenticationError, Credentials, UserDetails};
use secrecy::{ExposeSecret, SecretString};

use crate::config::StaticIdentityPluginConfig;

struct Account {
    password: SecretString,
    roles: BTreeSet<String>,
    enabled: bool,
}

/// Static user directory.
pub struct Service {
    name: String,
    accounts: HashMap<String, Account>,
}

impl Service {
    /// Create a service for item `name` from plugin configuration.
    ///
    /// Later entries win when a username is listed twice.
    #[must_use]
    pub fn from_config(name: &str, cfg: &StaticIdentityPluginConfig) -> Self {
        let accounts = cfg
            .users
            .iter()
            .map(|user| {
                (
                    user.username.clone(),
                    Account {
                        password: SecretString::from(user.password.clone()),
                        roles: user.roles.iter().cloned().collect(),
                        enabled: user.enabled,
                    },
                )
            })
            .collect();

        Self {
            name: name.to_owned(),
            accounts,
        }
    }

    /// Verify a username/password pair.
    ///
    /// # Errors
    ///
    /// - `BadCredentials` for an unknown user or a wrong password
    /// - `AccountStatus` for a disabled user with the right password
    pub fn verify(&self, credentials: &Credentials) -> Result<Authentication, AuthenticationError> {
        let username = &credentials.username;
        let account = self
            .accounts
            .get(username)
            .filter(|account| {
                account.password.expose_secret() == credentials.password.expose_secret()
            })
            .ok_or_else(|| AuthenticationError::BadCredentials(username.clone()))?;

        if !account.enabled {
            return Err(AuthenticationError::AccountStatus(format!(
                "{username} is disabled"
            )));
        }

        Ok(Authentication {
            username: username.clone(),
            provider: self.name.clone(),
            roles: account.roles.clone(),
        })
    }

    #[must_use]
    pub fn find(&self, username: &str) -> Option<UserDetails> {
        let account = self.accounts.get(username)?;
        let details = UserDetails::new(username)
            .with_password(account.password.clone())
            .with_roles(account.roles.iter().cloned());
        Some(if account.enabled {
            details
        } else {
            details.disabled()
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::StaticUser;

    fn service() -> Service {
        let cfg = StaticIdentityPluginConfig {
            users: vec![
                StaticUser {
                    username: "admin".to_owned(),
                    password: "pw".to_owned(),
                    roles: vec!["admin".to_owned()],
                    enabled: true,
                },
                StaticUser {
                    username: "gone".to_owned(),
                    password: "pw".to_owned(),
                    roles: vec![],
                    enabled: false,
                },
            ],
            ..StaticIdentityPluginConfig::default()
        };
        Service::from_config("local", &cfg)
    }

    #[test]
    fn correct_password_authenticates() {
        let auth = service().verify(&Credentials::new("admin", "pw")).unwrap();
        assert_eq!(auth.provider, "local");
        assert!(auth.roles.contains("admin"));
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let svc = service();
        let wrong = svc.verify(&Credentials::new("admin", "nope")).unwrap_err();
        let unknown = svc.verify(&Credentials::new("nobody", "pw")).unwrap_err();

        assert!(matches!(wrong, AuthenticationError::BadCredentials(_)));
        assert!(matches!(unknown, AuthenticationError::BadCredentials(_)));
    }

    #[test]
    fn disabled_user_is_account_status() {
        let err = service().verify(&Credentials::new("gone", "pw")).unwrap_err();
        assert!(matches!(err, AuthenticationError::AccountStatus(_)));
    }

    #[test]
    fn find_reports_enablement() {
        let svc = service();
        assert!(svc.find("admin").unwrap().enabled);
        assert!(!svc.find("gone").unwrap().enabled);
        assert!(svc.find("nobody").is_none());
    }
}
