//! # Storage API Rust Client
//!
//! An async client engine for a storage-management control plane REST API,
//! providing type-safe configuration, credential caching, generic resource
//! dispatch and waiting on asynchronous server-side tasks.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for hosts, credentials and API versions
//! - One cached [`Authorizer`](auth::Authorizer) per credential set, with
//!   bearer login on first use and refresh afterwards
//! - Uniform List/Get/Create/Update/Delete/Ensure/Exists operations for any
//!   [`ResourceDescriptor`]
//! - A three-shape response model ([`Record`], [`RecordSet`], empty) with
//!   pagination and async-task envelopes unwrapped
//! - Before/after [`Interceptor`] hooks at resource, client and call level
//! - Server version gating per resource
//! - A [`TaskRef`] waiter for asynchronous operations
//! - A per-key [`KeyedLocker`] for serializing conflicting operations
//! - Explicit cancellation and deadlines through [`Context`]
//!
//! ## Quick Start
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
//!
//! ## Working With Resources
//!
//! ```rust,ignore
//! use serde_json::json;
//! use storage_api::{Context, Session};
//! use storage_api::rest::{Params, ResourceDescriptor, TaskRef, WaitPolicy};
//!
//! let session = Session::new();
//! let ctx = Context::background().with_timeout(std::time::Duration::from_secs(60));
//! let client = session.connect(&ctx, config).await?;
//!
//! let volumes = client.resource(
//!     ResourceDescriptor::new("volumes", "volume").with_min_version("5.2.0".parse()?),
//! );
//!
//! // Serialize concurrent provisioning of the same name
//! let _guard = client.lock(&ctx, &["volume", "db01"]).await?;
//! let volume = volumes.ensure_by_name(&ctx, "db01", json!({"size": 100})).await?;
//!
//! // Mutations that run in the background return a task reference
//! let accepted = volumes.update(&ctx, volume.id().unwrap(), json!({"size": 200})).await?;
//! if let Some(task) = TaskRef::from_record(&client, &accepted) {
//!     task.wait(&ctx, &WaitPolicy::default()).await?;
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No ambient global state**: Caches are owned by a [`Session`]
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **No process termination**: Fatal helpers return [`FatalError`]

pub mod auth;
pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod lock;
pub mod rest;
pub mod session;

// Re-export public types at crate root for convenience
pub use config::{
    ApiToken, ApiVersion, ClientConfig, ClientConfigBuilder, Credentials, Host, Password, Scheme,
    ServerVersion, Username,
};
pub use context::{Context, ContextError};
pub use error::ConfigError;
pub use lock::{KeyLock, KeyedLocker};
pub use session::{Client, Session};

// Re-export HTTP client types
pub use clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};

// Re-export resource types
pub use rest::{
    FatalError, Interceptor, Params, Payload, Record, RecordSet, Resource, ResourceDescriptor,
    ResourceError, ResourceId, TaskRef, WaitPolicy,
};
