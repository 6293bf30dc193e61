//! Cache of live authorizers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::auth::{Authorizer, AuthorizerKey, BearerAuthorizer, StaticTokenAuthorizer};
use crate::config::{ClientConfig, Credentials};

/// Holds exactly one [`Authorizer`] per distinct [`AuthorizerKey`].
///
/// Two configurations with equal host, port, TLS policy and credentials
/// resolve to the same instance, so a bearer token obtained by one connection
/// is reused by every other connection sharing those credentials.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use storage_api::auth::AuthorizerRegistry;
/// use storage_api::{ApiToken, ClientConfig, Host};
///
/// let config = || {
///     ClientConfig::builder()
///         .host(Host::new("array01").unwrap())
///         .api_token(ApiToken::new("tok").unwrap())
///         .build()
///         .unwrap()
/// };
///
/// let registry = AuthorizerRegistry::new();
/// let a = registry.resolve(&config());
/// let b = registry.resolve(&config());
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct AuthorizerRegistry {
    authorizers: Mutex<HashMap<AuthorizerKey, Arc<dyn Authorizer>>>,
}

impl AuthorizerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached authorizer for a configuration, creating it on
    /// first use.
    ///
    /// The authorizer kind follows the configured credentials: a static
    /// token yields a [`StaticTokenAuthorizer`], a username/password pair a
    /// [`BearerAuthorizer`].
    pub fn resolve(&self, config: &ClientConfig) -> Arc<dyn Authorizer> {
        let key = AuthorizerKey::from_config(config);
        let mut authorizers = self.authorizers.lock();
        if let Some(existing) = authorizers.get(&key) {
            return Arc::clone(existing);
        }

        tracing::debug!("Creating authorizer for {}:{}", key.host, key.port);
        let authorizer: Arc<dyn Authorizer> = match key.credentials {
            Credentials::Token(_) => Arc::new(StaticTokenAuthorizer::new(key.clone())),
            Credentials::Password { .. } => Arc::new(BearerAuthorizer::new(key.clone())),
        };
        authorizers.insert(key, Arc::clone(&authorizer));
        authorizer
    }

    /// Returns the number of cached authorizers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.authorizers.lock().len()
    }

    /// Returns `true` if no authorizer has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorizers.lock().is_empty()
    }

    /// Drops every cached authorizer.
    ///
    /// Connections already holding an authorizer keep using it.
    pub fn clear(&self) {
        self.authorizers.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiToken, Host, Password, Username};

    fn token_config(host: &str, token: &str) -> ClientConfig {
        ClientConfig::builder()
            .host(Host::new(host).unwrap())
            .api_token(ApiToken::new(token).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_equal_configs_share_one_instance() {
        let registry = AuthorizerRegistry::new();
        let a = registry.resolve(&token_config("array01", "tok"));
        let b = registry.resolve(&token_config("array01", "tok"));

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_credentials_get_distinct_instances() {
        let registry = AuthorizerRegistry::new();
        let a = registry.resolve(&token_config("array01", "tok-a"));
        let b = registry.resolve(&token_config("array01", "tok-b"));
        let c = registry.resolve(&token_config("array02", "tok-a"));

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_tls_policy_is_part_of_identity() {
        let registry = AuthorizerRegistry::new();
        let verified = token_config("array01", "tok");
        let unverified = ClientConfig::builder()
            .host(Host::new("array01").unwrap())
            .api_token(ApiToken::new("tok").unwrap())
            .verify_tls(false)
            .build()
            .unwrap();

        let a = registry.resolve(&verified);
        let b = registry.resolve(&unverified);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_password_credentials_select_bearer_kind() {
        let registry = AuthorizerRegistry::new();
        let config = ClientConfig::builder()
            .host(Host::new("array01").unwrap())
            .username(Username::new("admin").unwrap())
            .password(Password::new("pw").unwrap())
            .build()
            .unwrap();

        let authorizer = registry.resolve(&config);
        assert!(format!("{authorizer:?}").starts_with("BearerAuthorizer"));
        assert!(authorizer.matches(&AuthorizerKey::from_config(&config)));
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = AuthorizerRegistry::new();
        registry.resolve(&token_config("array01", "tok"));
        assert!(!registry.is_empty());

        registry.clear();
        assert!(registry.is_empty());
    }
}
