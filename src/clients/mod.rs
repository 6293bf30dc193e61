//! HTTP transport for the control plane.
//!
//! This module provides the transport layer every resource handle shares. It
//! handles request construction, the `Authorization` header, timeouts and
//! retry of throttled responses. Response bodies are returned as raw text and
//! are shaped by [`crate::rest`].
//!
//! # Overview
//!
//! - [`HttpClient`]: The async HTTP client for one connection
//! - [`HttpRequest`]: A request to be sent, mutable by interceptors
//! - [`HttpResponse`]: A response with headers and raw body
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, PATCH, DELETE)
//! - [`Query`]: Flat key/value or pre-encoded query strings
//!
//! # Retry Behavior
//!
//! - **429 (Throttled)** and **503 (Unavailable)**: Retried using the
//!   `Retry-After` header value, or 1 second if not present
//! - **Other non-2xx**: Returned immediately as [`HttpError::Response`]
//!
//! The default `tries` is 1, meaning no automatic retries.

mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use errors::{
    HttpError, HttpResponseError, InvalidHttpRequestError, MaxHttpRetriesExceededError,
};
pub use http_client::{HttpClient, RETRY_WAIT_TIME, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder, Query};
pub use http_response::HttpResponse;
