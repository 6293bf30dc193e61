//! Authorizer implementations.
//!
//! An [`Authorizer`] owns the credential material for one
//! (host, port, TLS policy, credentials) tuple and produces the
//! `Authorization` header for every request sent through that connection.
//!
//! Two kinds exist:
//!
//! - [`BearerAuthorizer`]: logs in with a username/password pair on first
//!   use, then refreshes with the stored refresh token on every later use.
//! - [`StaticTokenAuthorizer`]: emits a fixed token header and never touches
//!   the network.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::config::{ClientConfig, Credentials, Scheme};

/// Path of the login endpoint below the API root.
pub const LOGIN_PATH: &str = "auth/login";

/// Path of the refresh endpoint below the API root.
pub const REFRESH_PATH: &str = "auth/refresh";

/// Identity of an authorizer: everything that makes two connections share
/// credentials.
///
/// Equality covers connection coordinates and credential fields, never the
/// live bearer value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AuthorizerKey {
    /// URL scheme.
    pub scheme: Scheme,
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// TLS verification policy.
    pub verify_tls: bool,
    /// Credential set.
    pub credentials: Credentials,
}

impl AuthorizerKey {
    /// Extracts the key from a client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            scheme: config.host().scheme(),
            host: config.host().name().to_string(),
            port: config.port(),
            verify_tls: config.verify_tls(),
            credentials: config.credentials().clone(),
        }
    }
}

/// Capability set shared by all authorizer kinds.
///
/// Implementations must be cheap to call from many tasks at once:
/// [`auth_header`](Self::auth_header) is invoked on every request.
#[async_trait]
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Obtains or refreshes credential material.
    ///
    /// `api_root` is the fully-qualified API root, e.g.
    /// `https://array01:443/api/v1`.
    async fn authorize(&self, http: &reqwest::Client, api_root: &str) -> Result<(), AuthError>;

    /// Returns the header name and value to attach to requests, if any.
    fn auth_header(&self) -> Option<(&'static str, String)>;

    /// Returns the identity of this authorizer.
    fn key(&self) -> &AuthorizerKey;

    /// Returns `true` if this authorizer serves the given identity.
    fn matches(&self, key: &AuthorizerKey) -> bool {
        self.key() == key
    }

    /// Marks the authorizer as having completed its first authorization.
    fn mark_initialized(&self);

    /// Returns `true` once the first authorization has completed.
    fn is_initialized(&self) -> bool;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Clone)]
struct BearerTokens {
    access: String,
    refresh: Option<String>,
    obtained_at: DateTime<Utc>,
}

/// Authorizer that exchanges a username/password pair for bearer tokens.
///
/// The first [`authorize`](Authorizer::authorize) performs a login; every
/// later call performs a refresh with the previously stored refresh token.
/// Concurrent calls are serialized so only one network exchange is in flight.
pub struct BearerAuthorizer {
    key: AuthorizerKey,
    tokens: RwLock<Option<BearerTokens>>,
    initialized: AtomicBool,
    exchange: tokio::sync::Mutex<()>,
}

impl BearerAuthorizer {
    /// Creates a bearer authorizer for the given identity.
    #[must_use]
    pub fn new(key: AuthorizerKey) -> Self {
        Self {
            key,
            tokens: RwLock::new(None),
            initialized: AtomicBool::new(false),
            exchange: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns when the current access token was obtained.
    #[must_use]
    pub fn obtained_at(&self) -> Option<DateTime<Utc>> {
        self.tokens.read().as_ref().map(|t| t.obtained_at)
    }

    async fn login(
        &self,
        http: &reqwest::Client,
        api_root: &str,
    ) -> Result<TokenResponse, AuthError> {
        let Credentials::Password { username, password } = &self.key.credentials else {
            return Err(AuthError::LoginFailed {
                status: 0,
                message: "bearer authorizer requires a username and password".to_string(),
            });
        };
        let url = format!("{api_root}/{LOGIN_PATH}");
        tracing::debug!("Logging in to {} as {}", url, username.as_ref());

        let body = LoginRequest {
            username: username.as_ref(),
            password: password.as_ref(),
        };
        exchange_tokens(http, &url, &body)
            .await
            .map_err(|(status, message)| AuthError::LoginFailed { status, message })
    }

    async fn refresh(
        &self,
        http: &reqwest::Client,
        api_root: &str,
    ) -> Result<TokenResponse, AuthError> {
        let refresh_token = self
            .tokens
            .read()
            .as_ref()
            .and_then(|t| t.refresh.clone())
            .ok_or(AuthError::MissingRefreshToken)?;
        let url = format!("{api_root}/{REFRESH_PATH}");
        tracing::debug!("Refreshing bearer token at {}", url);

        let body = RefreshRequest {
            refresh: &refresh_token,
        };
        let mut response = exchange_tokens(http, &url, &body)
            .await
            .map_err(|(status, message)| AuthError::RefreshFailed { status, message })?;
        // Servers that do not rotate refresh tokens omit the field.
        if response.refresh.is_none() {
            response.refresh = Some(refresh_token);
        }
        Ok(response)
    }
}

async fn exchange_tokens<B: Serialize + Sync>(
    http: &reqwest::Client,
    url: &str,
    body: &B,
) -> Result<TokenResponse, (u16, String)> {
    let response = http
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| (0, format!("Network error: {e}")))?;

    let status = response.status().as_u16();
    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err((status, error_body));
    }

    response
        .json()
        .await
        .map_err(|e| (status, format!("Failed to parse token response: {e}")))
}

#[async_trait]
impl Authorizer for BearerAuthorizer {
    async fn authorize(&self, http: &reqwest::Client, api_root: &str) -> Result<(), AuthError> {
        let _exchange = self.exchange.lock().await;

        let response = if self.is_initialized() {
            self.refresh(http, api_root).await?
        } else {
            self.login(http, api_root).await?
        };

        *self.tokens.write() = Some(BearerTokens {
            access: response.access,
            refresh: response.refresh,
            obtained_at: Utc::now(),
        });
        self.mark_initialized();
        Ok(())
    }

    fn auth_header(&self) -> Option<(&'static str, String)> {
        self.tokens
            .read()
            .as_ref()
            .map(|t| ("Authorization", format!("Bearer {}", t.access)))
    }

    fn key(&self) -> &AuthorizerKey {
        &self.key
    }

    fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl fmt::Debug for BearerAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthorizer")
            .field("key", &self.key)
            .field("has_token", &self.tokens.read().is_some())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Authorizer that sends a fixed API token.
#[derive(Debug)]
pub struct StaticTokenAuthorizer {
    key: AuthorizerKey,
    initialized: AtomicBool,
}

impl StaticTokenAuthorizer {
    /// Creates a static token authorizer for the given identity.
    #[must_use]
    pub const fn new(key: AuthorizerKey) -> Self {
        Self {
            key,
            initialized: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Authorizer for StaticTokenAuthorizer {
    async fn authorize(&self, _http: &reqwest::Client, _api_root: &str) -> Result<(), AuthError> {
        self.mark_initialized();
        Ok(())
    }

    fn auth_header(&self) -> Option<(&'static str, String)> {
        match &self.key.credentials {
            Credentials::Token(token) => {
                Some(("Authorization", format!("Token {}", token.as_ref())))
            }
            Credentials::Password { .. } => None,
        }
    }

    fn key(&self) -> &AuthorizerKey {
        &self.key
    }

    fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}
