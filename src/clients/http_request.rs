//! HTTP request types for the storage API client.
//!
//! This module provides the [`HttpRequest`] type and its builder, plus the
//! [`Query`] type that models the two query-string encodings the control
//! plane accepts.

use std::collections::HashMap;
use std::fmt;

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods supported by the control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for replacing resources.
    Put,
    /// HTTP PATCH method for updating resources.
    Patch,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl HttpMethod {
    /// Returns `true` for methods that must carry a body.
    #[must_use]
    pub const fn requires_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Patch => write!(f, "patch"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Query string attached to a request URL.
///
/// The control plane only understands flat key/value queries. `Raw` is the
/// escape hatch for a query string that has already been encoded by the
/// caller; it is appended verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Flat key/value pairs, percent-encoded on the way out.
    Pairs(Vec<(String, String)>),
    /// A pre-encoded query string without the leading `?`.
    Raw(String),
}

impl Query {
    /// Returns `true` if the query would add nothing to the URL.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Pairs(pairs) => pairs.is_empty(),
            Self::Raw(raw) => raw.is_empty(),
        }
    }

    /// Renders the query string without the leading `?`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use storage_api::clients::Query;
    ///
    /// let query = Query::Pairs(vec![
    ///     ("name".to_string(), "pool a".to_string()),
    ///     ("limit".to_string(), "5".to_string()),
    /// ]);
    /// assert_eq!(query.encode(), "name=pool%20a&limit=5");
    ///
    /// let raw = Query::Raw("id__in=1,2".to_string());
    /// assert_eq!(raw.encode(), "id__in=1,2");
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Pairs(pairs) => pairs
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&"),
            Self::Raw(raw) => raw.trim_start_matches('?').to_string(),
        }
    }
}

/// An HTTP request to be sent to the control plane.
///
/// `url` is fully qualified (scheme, host, port and `/api/{version}` root).
/// Interceptors receive the request mutably and may rewrite any field before
/// it is sent.
///
/// # Example
///
/// ```rust
/// use storage_api::clients::{HttpRequest, HttpMethod};
/// use serde_json::json;
///
/// let get_request = HttpRequest::builder(HttpMethod::Get, "https://array01:443/api/v1/pools")
///     .query_param("name", "gold")
///     .build()
///     .unwrap();
///
/// let post_request = HttpRequest::builder(HttpMethod::Post, "https://array01:443/api/v1/pools")
///     .body(json!({"name": "gold"}))
///     .build()
///     .unwrap();
/// # let _ = (get_request, post_request);
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The fully-qualified URL, without query string.
    pub url: String,
    /// The JSON request body, if any.
    pub body: Option<serde_json::Value>,
    /// Query string to append to the URL.
    pub query: Option<Query>,
    /// Additional headers to include in the request.
    pub extra_headers: Option<HashMap<String, String>>,
    /// Number of times to attempt a throttled request (default: 1).
    pub tries: u32,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `http_method` is `Post`, `Put` or `Patch` but `body` is `None`
    /// - `url` has no scheme
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.http_method.requires_body() && self.body.is_none() {
            return Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            });
        }

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(InvalidHttpRequestError::RelativeUrl {
                url: self.url.clone(),
            });
        }

        Ok(())
    }

    /// Returns the URL including the encoded query string.
    #[must_use]
    pub fn full_url(&self) -> String {
        match self.query.as_ref().filter(|q| !q.is_empty()) {
            Some(query) => format!("{}?{}", self.url, query.encode()),
            None => self.url.clone(),
        }
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: String,
    body: Option<serde_json::Value>,
    query: Option<Query>,
    extra_headers: Option<HashMap<String, String>>,
    tries: u32,
}

impl HttpRequestBuilder {
    /// Creates a new builder with the required method and URL.
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            http_method: method,
            url: url.into(),
            body: None,
            query: None,
            extra_headers: None,
            tries: 1,
        }
    }

    /// Sets the JSON request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets or clears the JSON request body.
    #[must_use]
    pub fn maybe_body(mut self, body: Option<serde_json::Value>) -> Self {
        self.body = body;
        self
    }

    /// Sets the whole query.
    #[must_use]
    pub fn query(mut self, query: Option<Query>) -> Self {
        self.query = query;
        self
    }

    /// Adds a single query parameter.
    ///
    /// Replaces a previously set raw query.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let pair = (key.into(), value.into());
        match &mut self.query {
            Some(Query::Pairs(pairs)) => pairs.push(pair),
            _ => self.query = Some(Query::Pairs(vec![pair])),
        }
        self
    }

    /// Adds a single extra header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the number of times to attempt a throttled request.
    #[must_use]
    pub const fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            url: self.url,
            body: self.body,
            query: self.query,
            extra_headers: self.extra_headers,
            tries: self.tries,
        };
        request.verify()?;
        Ok(request)
    }
}
