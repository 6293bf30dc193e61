//! HTTP client for control plane communication.
//!
//! This module provides the [`HttpClient`] type: the shared transport every
//! resource handle of a connection dispatches through.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Authorizer;
use crate::clients::errors::{HttpError, HttpResponseError, MaxHttpRetriesExceededError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::HttpResponse;
use crate::config::{ApiVersion, ClientConfig};

/// Fixed retry wait time in seconds when no `Retry-After` header is sent.
pub const RETRY_WAIT_TIME: u64 = 1;

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for making requests to the control plane.
///
/// The client handles:
/// - Base URI construction from host, port and scheme
/// - Default headers including User-Agent
/// - The `Authorization` header produced by the connection's [`Authorizer`]
/// - Request timeout, idle pool size and TLS verification policy
/// - Automatic retry of throttled (429) and unavailable (503) responses
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
#[derive(Debug)]
pub struct HttpClient {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Base URI (e.g., `https://array01.example.com:443`).
    base_uri: String,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
    /// Produces the authorization header for every request.
    authorizer: Arc<dyn Authorizer>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the underlying reqwest client cannot
    /// be created (e.g. TLS backend initialization failure).
    pub fn new(config: &ClientConfig, authorizer: Arc<dyn Authorizer>) -> Result<Self, HttpError> {
        let host = config.host();
        let base_uri = format!(
            "{}://{}:{}",
            host.scheme().as_str(),
            host.name(),
            config.port()
        );

        let user_agent = config
            .user_agent()
            .map_or_else(|| format!("storage-api-rust/{SDK_VERSION}"), ToString::to_string);

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        if !config.verify_tls() {
            tracing::warn!("TLS certificate verification is disabled for {}", base_uri);
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(!config.verify_tls())
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.max_connections())
            .build()?;

        Ok(Self {
            client,
            base_uri,
            default_headers,
            authorizer,
        })
    }

    /// Returns the base URI for this client.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Returns the API root for a version, e.g. `https://host:443/api/v1`.
    #[must_use]
    pub fn api_root(&self, version: &ApiVersion) -> String {
        format!("{}/api/{}", self.base_uri, version)
    }

    /// Returns the fully-qualified URL of a path below the API root.
    ///
    /// Leading and trailing slashes on `path` are ignored.
    #[must_use]
    pub fn url(&self, version: &ApiVersion, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.api_root(version)
        } else {
            format!("{}/{}", self.api_root(version), path)
        }
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the authorizer attached to this connection.
    #[must_use]
    pub const fn authorizer(&self) -> &Arc<dyn Authorizer> {
        &self.authorizer
    }

    /// Returns the underlying reqwest client.
    #[must_use]
    pub const fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Sends an HTTP request to the control plane.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error or timeout occurs (`Network`)
    /// - Non-2xx response received (`Response`)
    /// - Retries for 429/503 are exhausted (`MaxRetries`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let url = request.full_url();

        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some((name, value)) = self.authorizer.auth_header() {
            headers.insert(name.to_string(), value);
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let method = match request.http_method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut tries: u32 = 0;
        loop {
            tries += 1;

            let mut req_builder = self.client.request(method.clone(), &url);
            for (key, value) in &headers {
                req_builder = req_builder.header(key, value);
            }
            if let Some(body) = &request.body {
                req_builder = req_builder.body(body.to_string());
            }

            let res = req_builder.send().await?;

            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let body = res.text().await?;
            let response = HttpResponse::new(code, res_headers, body);

            if response.is_ok() {
                return Ok(response);
            }

            if !response.is_retryable() || tries >= request.tries {
                if response.is_retryable() && request.tries > 1 {
                    return Err(HttpError::MaxRetries(MaxHttpRetriesExceededError {
                        method: request.http_method.to_string(),
                        url,
                        code,
                        tries: request.tries,
                        body: response.body,
                    }));
                }
                return Err(HttpError::Response(HttpResponseError {
                    method: request.http_method.to_string(),
                    url,
                    code,
                    request_id: response.request_id().map(String::from),
                    body: response.body,
                }));
            }

            let delay = Self::calculate_retry_delay(&response);
            tracing::warn!(
                "{} {} returned {}, retrying in {:?} (attempt {} of {})",
                request.http_method,
                url,
                code,
                delay,
                tries,
                request.tries
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Uses `Retry-After` when present and representable, otherwise the
    /// fixed delay.
    fn calculate_retry_delay(response: &HttpResponse) -> Duration {
        response
            .retry_request_after
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or(Duration::from_secs(RETRY_WAIT_TIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizerKey, StaticTokenAuthorizer};
    use crate::config::{ApiToken, Host};

    fn create_test_config(host: &str) -> ClientConfig {
        ClientConfig::builder()
            .host(Host::new(host).unwrap())
            .api_token(ApiToken::new("test-token").unwrap())
            .build()
            .unwrap()
    }

    fn create_test_client(config: &ClientConfig) -> HttpClient {
        let authorizer = Arc::new(StaticTokenAuthorizer::new(AuthorizerKey::from_config(config)));
        HttpClient::new(config, authorizer).unwrap()
    }

    #[test]
    fn test_base_uri_includes_scheme_and_port() {
        let config = create_test_config("array01.example.com");
        let client = create_test_client(&config);

        assert_eq!(client.base_uri(), "https://array01.example.com:443");
    }

    #[test]
    fn test_url_is_rooted_at_api_version() {
        let config = create_test_config("http://127.0.0.1");
        let client = create_test_client(&config);
        let version = ApiVersion::default();

        assert_eq!(client.api_root(&version), "http://127.0.0.1:80/api/v1");
        assert_eq!(
            client.url(&version, "/pools/7/"),
            "http://127.0.0.1:80/api/v1/pools/7"
        );
        assert_eq!(client.url(&version, ""), "http://127.0.0.1:80/api/v1");
    }

    #[test]
    fn test_user_agent_header_defaults_to_crate_name() {
        let config = create_test_config("array01");
        let client = create_test_client(&config);

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("storage-api-rust/"));
    }

    #[test]
    fn test_user_agent_override() {
        let config = ClientConfig::builder()
            .host(Host::new("array01").unwrap())
            .api_token(ApiToken::new("test-token").unwrap())
            .user_agent("provisioner/2.0")
            .build()
            .unwrap();
        let client = create_test_client(&config);

        assert_eq!(
            client.default_headers().get("User-Agent"),
            Some(&"provisioner/2.0".to_string())
        );
    }

    #[test]
    fn test_accept_header_is_json() {
        let config = create_test_config("array01");
        let client = create_test_client(&config);

        assert_eq!(
            client.default_headers().get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_retry_delay_prefers_retry_after() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), vec!["0.25".to_string()]);
        let response = HttpResponse::new(429, headers, String::new());
        assert_eq!(
            HttpClient::calculate_retry_delay(&response),
            Duration::from_millis(250)
        );

        let response = HttpResponse::new(503, HashMap::new(), String::new());
        assert_eq!(
            HttpClient::calculate_retry_delay(&response),
            Duration::from_secs(RETRY_WAIT_TIME)
        );
    }

    #[test]
    fn test_unrepresentable_retry_after_falls_back_to_fixed_delay() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), vec!["1e300".to_string()]);
        let response = HttpResponse::new(429, headers, String::new());

        assert_eq!(
            HttpClient::calculate_retry_delay(&response),
            Duration::from_secs(RETRY_WAIT_TIME)
        );
    }
}
