//! Configuration types for the storage API client.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: The connection settings, credentials and hooks
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`Host`], [`Username`], [`Password`], [`ApiToken`]: Validated newtypes
//! - [`ApiVersion`]: The `/api/{version}` path segment
//! - [`ServerVersion`]: A comparable control plane version
//!
//! # Example
//!
//! ```rust
//! use storage_api::{ClientConfig, Host, Username, Password};
//!
//! let config = ClientConfig::builder()
//!     .host(Host::new("array01.example.com").unwrap())
//!     .username(Username::new("admin").unwrap())
//!     .password(Password::new("secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.port(), 443);
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiToken, ApiVersion, Host, Password, Scheme, Username};
pub use version::{sanitize_version, InvalidVersionError, SanitizedVersion, ServerVersion};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::rest::{Interceptor, RecordFiller};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of idle connections kept per host.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Credentials used to authenticate against the control plane.
///
/// A static token takes precedence over a username/password pair when both
/// are configured.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Credentials {
    /// A long-lived API token sent verbatim on every request.
    Token(ApiToken),
    /// A login pair exchanged for bearer tokens.
    Password {
        /// The login name.
        username: Username,
        /// The login password.
        password: Password,
    },
}

/// Where the control plane reports its core version.
///
/// The dispatcher issues `GET /api/{version}/{path}` and reads `field` from
/// the returned record. If the field holds a nested object, its `core` member
/// is used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionEndpoint {
    /// Path below the API root.
    pub path: String,
    /// Field holding the version string.
    pub field: String,
}

impl Default for VersionEndpoint {
    fn default() -> Self {
        Self {
            path: "system/info".to_string(),
            field: "version".to_string(),
        }
    }
}

/// Configuration for one logical connection to the control plane.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`. The hooks it carries are
/// shared through `Arc`.
#[derive(Clone)]
pub struct ClientConfig {
    host: Host,
    port: u16,
    credentials: Credentials,
    verify_tls: bool,
    timeout: Duration,
    max_connections: usize,
    user_agent: Option<String>,
    api_version: ApiVersion,
    version_endpoint: VersionEndpoint,
    tries: u32,
    interceptor: Option<Arc<dyn Interceptor>>,
    record_filler: Option<Arc<dyn RecordFiller>>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the host.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the selected credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns whether server certificates are verified.
    #[must_use]
    pub const fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the idle connection pool size per host.
    #[must_use]
    pub const fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Returns the user agent override, if configured.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Returns the default API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns where the server version is read from.
    #[must_use]
    pub const fn version_endpoint(&self) -> &VersionEndpoint {
        &self.version_endpoint
    }

    /// Returns how many times a throttled request is attempted.
    #[must_use]
    pub const fn tries(&self) -> u32 {
        self.tries
    }

    /// Returns the global interceptor, if configured.
    #[must_use]
    pub fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.interceptor.as_ref()
    }

    /// Returns the custom record filler, if configured.
    #[must_use]
    pub fn record_filler(&self) -> Option<&Arc<dyn RecordFiller>> {
        self.record_filler.as_ref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("max_connections", &self.max_connections)
            .field("user_agent", &self.user_agent)
            .field("api_version", &self.api_version)
            .field("version_endpoint", &self.version_endpoint)
            .field("tries", &self.tries)
            .field("interceptor", &self.interceptor.is_some())
            .field("record_filler", &self.record_filler.is_some())
            .finish()
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `host` is required, as is one credential set: either `api_token`, or both
/// `username` and `password`.
///
/// # Defaults
///
/// - `port`: 443 for HTTPS hosts, 80 for HTTP hosts
/// - `verify_tls`: `true`
/// - `timeout`: 30 seconds
/// - `max_connections`: 10
/// - `api_version`: `v1`
/// - `tries`: 1 (no retries)
#[derive(Default)]
pub struct ClientConfigBuilder {
    host: Option<Host>,
    port: Option<u16>,
    username: Option<Username>,
    password: Option<Password>,
    api_token: Option<ApiToken>,
    verify_tls: Option<bool>,
    timeout: Option<Duration>,
    max_connections: Option<usize>,
    user_agent: Option<String>,
    api_version: Option<ApiVersion>,
    version_endpoint: Option<VersionEndpoint>,
    tries: Option<u32>,
    interceptor: Option<Arc<dyn Interceptor>>,
    record_filler: Option<Arc<dyn RecordFiller>>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host (required).
    #[must_use]
    pub fn host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the login user name.
    #[must_use]
    pub fn username(mut self, username: Username) -> Self {
        self.username = Some(username);
        self
    }

    /// Sets the login password.
    #[must_use]
    pub fn password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    /// Sets a static API token. Takes precedence over username/password.
    #[must_use]
    pub fn api_token(mut self, token: ApiToken) -> Self {
        self.api_token = Some(token);
        self
    }

    /// Sets whether server certificates are verified.
    #[must_use]
    pub const fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the idle connection pool size per host.
    #[must_use]
    pub const fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Sets the user agent sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the default API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets where the server version is read from.
    #[must_use]
    pub fn version_endpoint(mut self, path: impl Into<String>, field: impl Into<String>) -> Self {
        self.version_endpoint = Some(VersionEndpoint {
            path: path.into(),
            field: field.into(),
        });
        self
    }

    /// Sets how many times a throttled (429/503) request is attempted.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = Some(tries);
        self
    }

    /// Sets the global interceptor invoked around every request.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Sets the custom record-to-struct filler.
    #[must_use]
    pub fn record_filler(mut self, filler: Arc<dyn RecordFiller>) -> Self {
        self.record_filler = Some(filler);
        self
    }

    /// Builds the [`ClientConfig`], validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `host` is not set,
    /// [`ConfigError::MissingCredentials`] if no usable credential set is
    /// configured, and [`ConfigError::InvalidSetting`] for a zero `tries`,
    /// timeout or pool size.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        let credentials = match (self.api_token, self.username, self.password) {
            (Some(token), _, _) => Credentials::Token(token),
            (None, Some(username), Some(password)) => Credentials::Password { username, password },
            _ => return Err(ConfigError::MissingCredentials),
        };

        let tries = self.tries.unwrap_or(1);
        if tries == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "tries",
                reason: "must be at least 1".to_string(),
            });
        }
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                field: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        let max_connections = self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ClientConfig {
            port: self.port.unwrap_or_else(|| host.scheme().default_port()),
            host,
            credentials,
            verify_tls: self.verify_tls.unwrap_or(true),
            timeout,
            max_connections,
            user_agent: self.user_agent,
            api_version: self.api_version.unwrap_or_default(),
            version_endpoint: self.version_endpoint.unwrap_or_default(),
            tries,
            interceptor: self.interceptor,
            record_filler: self.record_filler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Host {
        Host::new("array01").unwrap()
    }

    #[test]
    fn test_builder_requires_host() {
        let result = ClientConfigBuilder::new()
            .api_token(ApiToken::new("tok").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "host" })
        ));
    }

    #[test]
    fn test_builder_requires_credentials() {
        let result = ClientConfig::builder().host(host()).build();
        assert!(matches!(result, Err(ConfigError::MissingCredentials)));

        let result = ClientConfig::builder()
            .host(host())
            .username(Username::new("admin").unwrap())
            .build();
        assert!(matches!(result, Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_static_token_takes_precedence() {
        let config = ClientConfig::builder()
            .host(host())
            .username(Username::new("admin").unwrap())
            .password(Password::new("pw").unwrap())
            .api_token(ApiToken::new("tok").unwrap())
            .build()
            .unwrap();

        assert!(matches!(config.credentials(), Credentials::Token(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder()
            .host(host())
            .api_token(ApiToken::new("tok").unwrap())
            .build()
            .unwrap();

        assert_eq!(config.port(), 443);
        assert!(config.verify_tls());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.api_version().as_ref(), "v1");
        assert_eq!(config.version_endpoint(), &VersionEndpoint::default());
        assert_eq!(config.tries(), 1);
        assert!(config.interceptor().is_none());
    }

    #[test]
    fn test_http_host_defaults_to_port_80() {
        let config = ClientConfig::builder()
            .host(Host::new("http://127.0.0.1").unwrap())
            .api_token(ApiToken::new("tok").unwrap())
            .build()
            .unwrap();

        assert_eq!(config.port(), 80);
    }

    #[test]
    fn test_builder_rejects_zero_tries() {
        let result = ClientConfig::builder()
            .host(host())
            .api_token(ApiToken::new("tok").unwrap())
            .tries(0)
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidSetting { field: "tries", .. })
        ));
    }

    #[test]
    fn test_debug_masks_credentials() {
        let config = ClientConfig::builder()
            .host(host())
            .username(Username::new("admin").unwrap())
            .password(Password::new("very-secret").unwrap())
            .build()
            .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("admin"));
    }
}
