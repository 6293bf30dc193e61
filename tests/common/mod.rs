//! Shared helpers for integration tests.
//!
//! Every test runs against its own `wiremock` server standing in for the
//! control plane.

#![allow(dead_code)]

use storage_api::{ApiToken, Client, ClientConfig, ClientConfigBuilder, Context, Host, Session};
use wiremock::MockServer;

/// Returns a builder pointing at the mock server, authenticated with a
/// static token.
pub fn config_builder(server: &MockServer) -> ClientConfigBuilder {
    ClientConfig::builder()
        .host(Host::new("http://127.0.0.1").unwrap())
        .port(server.address().port())
        .api_token(ApiToken::new("test-token").unwrap())
}

/// Returns a static-token configuration for the mock server.
pub fn config(server: &MockServer) -> ClientConfig {
    config_builder(server).build().unwrap()
}

/// Connects a fresh session to the mock server.
pub async fn connect(server: &MockServer) -> Client {
    connect_with(config(server)).await
}

/// Connects a fresh session with an explicit configuration.
pub async fn connect_with(config: ClientConfig) -> Client {
    Session::new()
        .connect(&Context::background(), config)
        .await
        .unwrap()
}
