//! Credential lifecycle for control plane connections.
//!
//! # Overview
//!
//! - [`Authorizer`]: The capability set every authorizer kind implements
//! - [`BearerAuthorizer`]: Username/password login, then refresh on each reuse
//! - [`StaticTokenAuthorizer`]: A fixed API token, no network exchange
//! - [`AuthorizerKey`]: The (host, port, TLS policy, credentials) identity
//! - [`AuthorizerRegistry`]: One live authorizer per identity
//!
//! # Authorizer Selection
//!
//! The kind is picked from the configured credentials. When both an API token
//! and a username/password pair are configured the token wins; a
//! configuration with neither is rejected by
//! [`ClientConfigBuilder::build`](crate::ClientConfigBuilder::build).

mod authorizer;
mod error;
mod registry;

pub use authorizer::{
    Authorizer, AuthorizerKey, BearerAuthorizer, StaticTokenAuthorizer, LOGIN_PATH, REFRESH_PATH,
};
pub use error::AuthError;
pub use registry::AuthorizerRegistry;
