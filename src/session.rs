//! Sessions and connected clients.
//!
//! A [`Session`] owns the state shared between connections: the authorizer
//! cache and the per-key locker. Each [`Session::connect`] yields a
//! [`Client`], one logical connection with its own transport and cached
//! server version.
//!
//! # Example
//!
//! ```rust,ignore
//! use storage_api::{ClientConfig, Context, Host, Session, Username, Password};
//!
//! let session = Session::new();
//! let config = ClientConfig::builder()
//!     .host(Host::new("array01.example.com")?)
//!     .username(Username::new("admin")?)
//!     .password(Password::new("secret")?)
//!     .build()?;
//!
//! let ctx = Context::background();
//! let client = session.connect(&ctx, config).await?;
//! println!("connected to {}", client.server_version(&ctx).await?);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::auth::AuthorizerRegistry;
use crate::clients::{HttpClient, HttpError, HttpMethod, HttpRequest, Query};
use crate::config::{ClientConfig, ServerVersion};
use crate::context::{Context, ContextError};
use crate::lock::{KeyLock, KeyedLocker};
use crate::rest::normalize::parse_body;
use crate::rest::{
    fill_record, FromPayload, Payload, Pipeline, Record, Resource, ResourceDescriptor,
    ResourceError, TaskRef,
};

/// Owner of the authorizer cache and the per-key locker.
///
/// Connections made through the same session share both. Separate sessions
/// are fully isolated, which keeps tests independent.
#[derive(Debug, Default)]
pub struct Session {
    authorizers: AuthorizerRegistry,
    locker: Arc<KeyedLocker>,
}

impl Session {
    /// Creates a session with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the authorizer cache.
    #[must_use]
    pub const fn authorizers(&self) -> &AuthorizerRegistry {
        &self.authorizers
    }

    /// Returns the per-key locker.
    #[must_use]
    pub const fn locker(&self) -> &Arc<KeyedLocker> {
        &self.locker
    }

    /// Opens a connection.
    ///
    /// The cached authorizer for the configuration's credentials is
    /// authorized before the client is returned: the first connection logs
    /// in, later ones refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Http`] if the transport cannot be built,
    /// [`ResourceError::Auth`] if authorization fails and
    /// [`ResourceError::Context`] if `ctx` ends first.
    pub async fn connect(
        &self,
        ctx: &Context,
        config: ClientConfig,
    ) -> Result<Client, ResourceError> {
        let authorizer = self.authorizers.resolve(&config);
        let http = HttpClient::new(&config, Arc::clone(&authorizer))?;
        let api_root = http.api_root(config.api_version());

        ctx.run(async {
            authorizer
                .authorize(http.inner(), &api_root)
                .await
                .map_err(ResourceError::from)
        })
        .await?;
        tracing::debug!("Connected to {}", http.base_uri());

        Ok(Client {
            inner: Arc::new(ClientInner {
                config,
                http,
                server_version: OnceCell::new(),
                locker: Arc::clone(&self.locker),
            }),
        })
    }
}

/// One call as seen by the dispatcher.
#[derive(Debug)]
pub(crate) struct Call {
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
    pub(crate) query: Option<Query>,
    pub(crate) body: Option<Value>,
}

struct ClientInner {
    config: ClientConfig,
    http: HttpClient,
    server_version: OnceCell<ServerVersion>,
    locker: Arc<KeyedLocker>,
}

/// A connected client.
///
/// Cheap to clone; clones share the transport and the cached server version.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

// Verify Client is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Client>();
};

impl Client {
    /// Returns a handle for the resource described by `descriptor`.
    #[must_use]
    pub fn resource(&self, descriptor: ResourceDescriptor) -> Resource {
        Resource::new(descriptor, self.clone())
    }

    /// Returns the untagged pseudo-resource for path-only calls.
    #[must_use]
    pub fn raw(&self) -> Resource {
        self.resource(ResourceDescriptor::raw())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the transport.
    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    /// Returns a reference to task `id` on this connection.
    #[must_use]
    pub fn task(&self, id: i64) -> TaskRef {
        TaskRef::new(self.clone(), id)
    }

    /// Serializes callers on the key built from `parts`.
    ///
    /// The key space is shared by every client of the same session.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`] if `ctx` ends while waiting.
    pub async fn lock<S: AsRef<str>>(
        &self,
        ctx: &Context,
        parts: &[S],
    ) -> Result<KeyLock, ContextError> {
        self.inner.locker.acquire(ctx, parts).await
    }

    /// Projects a record onto `T`, consulting the configured
    /// [`RecordFiller`](crate::rest::RecordFiller) first.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Fill`] if the projection fails.
    pub fn fill<T>(&self, record: &Record) -> Result<T, ResourceError>
    where
        T: DeserializeOwned + 'static,
    {
        fill_record(
            self.inner.config.record_filler().map(|filler| &**filler),
            record,
        )
    }

    /// Runs the connection's authorizer again, refreshing a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Auth`] or [`ResourceError::Context`].
    pub async fn reauthorize(&self, ctx: &Context) -> Result<(), ResourceError> {
        let http = &self.inner.http;
        let api_root = http.api_root(self.inner.config.api_version());
        ctx.run(async {
            http.authorizer()
                .authorize(http.inner(), &api_root)
                .await
                .map_err(ResourceError::from)
        })
        .await
    }

    /// Returns the server's core version, detecting it on first use.
    ///
    /// The version is read from the configured
    /// [`VersionEndpoint`](crate::config::VersionEndpoint) and cached for the
    /// lifetime of the connection.
    ///
    /// # Errors
    ///
    /// Returns dispatch errors, [`ResourceError::ShapeMismatch`] if the
    /// endpoint does not answer with a record, or
    /// [`ResourceError::InvalidVersion`] for a missing or unparsable version.
    pub async fn server_version(&self, ctx: &Context) -> Result<ServerVersion, ResourceError> {
        self.inner
            .server_version
            .get_or_try_init(|| self.detect_version(ctx))
            .await
            .cloned()
    }

    async fn detect_version(&self, ctx: &Context) -> Result<ServerVersion, ResourceError> {
        let endpoint = self.inner.config.version_endpoint();
        let call = Call {
            method: HttpMethod::Get,
            path: endpoint.path.clone(),
            query: None,
            body: None,
        };
        let descriptor = ResourceDescriptor::raw();
        let payload = self.send(ctx, &descriptor, call).await?;
        let record = Record::convert(payload, &endpoint.path)?;

        let raw = match record.get(&endpoint.field) {
            Some(Value::String(version)) => Some(version.as_str()),
            Some(Value::Object(nested)) => nested.get("core").and_then(Value::as_str),
            _ => None,
        }
        .unwrap_or_default();

        let version = ServerVersion::parse(raw)?;
        if version.was_truncated() {
            tracing::warn!("Server version {:?} truncated to {}", raw, version);
        }
        tracing::debug!("Detected server version {}", version);
        Ok(version)
    }

    /// Gates on the descriptor's minimum version, then sends the call.
    pub(crate) async fn dispatch(
        &self,
        ctx: &Context,
        descriptor: &ResourceDescriptor,
        call: Call,
    ) -> Result<Payload, ResourceError> {
        if let Some(minimum) = descriptor.min_version() {
            let detected = self.server_version(ctx).await?;
            if detected < *minimum {
                return Err(ResourceError::VersionUnsupported {
                    resource: descriptor.name().to_string(),
                    detected,
                    minimum: minimum.clone(),
                });
            }
        }
        self.send(ctx, descriptor, call).await
    }

    async fn send(
        &self,
        ctx: &Context,
        descriptor: &ResourceDescriptor,
        call: Call,
    ) -> Result<Payload, ResourceError> {
        let config = &self.inner.config;
        let http = &self.inner.http;
        let version = descriptor.api_version().unwrap_or_else(|| config.api_version());

        let mut request = HttpRequest::builder(call.method, http.url(version, &call.path))
            .query(call.query)
            .maybe_body(call.body)
            .tries(config.tries())
            .build()
            .map_err(HttpError::from)?;

        let pipeline = Pipeline::new(
            descriptor.name(),
            descriptor.interceptor(),
            config.interceptor(),
            ctx.interceptor(),
        );
        pipeline.before(ctx, &mut request).await?;

        tracing::debug!("{} {}", request.http_method, request.full_url());
        let response = ctx
            .run(async move { http.request(request).await.map_err(ResourceError::from) })
            .await?;

        let payload = parse_body(&response.body).map_err(ResourceError::Parse)?;
        pipeline.after(ctx, payload).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_uri", &self.inner.http.base_uri())
            .field("api_version", self.inner.config.api_version())
            .field("server_version", &self.inner.server_version.get().map(ToString::to_string))
            .finish_non_exhaustive()
    }
}
