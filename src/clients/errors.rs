//! HTTP-specific error types for the storage API client.
//!
//! - [`HttpResponseError`]: Non-2xx HTTP responses from the control plane
//! - [`MaxHttpRetriesExceededError`]: When retry attempts are exhausted
//! - [`InvalidHttpRequestError`]: When a request fails validation before sending
//! - [`HttpError`]: Unified error type encompassing all HTTP-related errors
//!
//! # Example
//!
//! ```rust,ignore
//! use storage_api::clients::HttpError;
//!
//! match client.request(request).await {
//!     Ok(response) => println!("Success: {}", response.body),
//!     Err(HttpError::Response(e)) => {
//!         println!("{} {} returned {}: {}", e.method, e.url, e.code, e.body);
//!     }
//!     Err(HttpError::MaxRetries(e)) => println!("Gave up after {} tries", e.tries),
//!     Err(HttpError::InvalidRequest(e)) => println!("Invalid request: {e}"),
//!     Err(HttpError::Network(e)) => println!("Network error: {e}"),
//! }
//! ```

use thiserror::Error;

/// Error returned when the control plane answers with a non-2xx status.
///
/// Carries everything needed to diagnose the failed call: the verb, the
/// fully-qualified URL, the status code and the raw response body.
///
/// # Example
///
/// ```rust
/// use storage_api::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     method: "get".to_string(),
///     url: "https://array01/api/v1/pools/7".to_string(),
///     code: 404,
///     body: r#"{"detail":"Not found."}"#.to_string(),
///     request_id: None,
/// };
///
/// assert!(error.to_string().contains("404"));
/// assert!(error.to_string().contains("/pools/7"));
/// ```
#[derive(Debug, Error)]
#[error("{method} {url} failed with status {code}: {body}")]
pub struct HttpResponseError {
    /// The HTTP verb of the failed request.
    pub method: String,
    /// The fully-qualified URL of the failed request.
    pub url: String,
    /// The HTTP status code of the response.
    pub code: u16,
    /// The raw response body.
    pub body: String,
    /// Reference ID for error reporting (from the `X-Request-Id` header).
    pub request_id: Option<String>,
}

/// Error returned when maximum retry attempts have been exhausted.
///
/// Raised when a request keeps being throttled (429 or 503) after all
/// configured attempts have been made.
#[derive(Debug, Error)]
#[error("Exceeded maximum retry count of {tries} for {method} {url}. Last status: {code}, body: {body}")]
pub struct MaxHttpRetriesExceededError {
    /// The HTTP verb of the request.
    pub method: String,
    /// The fully-qualified URL of the request.
    pub url: String,
    /// The HTTP status code of the last response.
    pub code: u16,
    /// The number of tries that were attempted.
    pub tries: u32,
    /// The raw body of the last response.
    pub body: String,
}

/// Error returned when an HTTP request fails validation.
///
/// # Example
///
/// ```rust
/// use storage_api::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::MissingBody {
///     method: "post".to_string(),
/// };
///
/// assert_eq!(error.to_string(), "Cannot use post without specifying data.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// The request URL is not absolute.
    #[error("Request URL '{url}' must be absolute.")]
    RelativeUrl {
        /// The offending URL.
        url: String,
    },
}

/// Unified error type for all HTTP-related errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Maximum retry attempts exhausted.
    #[error(transparent)]
    MaxRetries(#[from] MaxHttpRetriesExceededError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error, including request timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl HttpError {
    /// Returns the HTTP status code, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            Self::MaxRetries(e) => Some(e.code),
            Self::InvalidRequest(_) | Self::Network(_) => None,
        }
    }
}
