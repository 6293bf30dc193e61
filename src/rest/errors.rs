//! Error types for resource operations.
//!
//! # Error Handling
//!
//! [`ResourceError::NotFound`] is the one recoverable outcome: `delete`
//! swallows it to stay idempotent and `exists` turns it into `false`. Every
//! other variant propagates unchanged.
//!
//! # Example
//!
//! ```rust
//! use storage_api::rest::{Params, ResourceError};
//!
//! let error = ResourceError::NotFound {
//!     resource: "volume".to_string(),
//!     params: Params::new().with("name", "db01").to_string(),
//! };
//! assert!(error.is_not_found());
//! assert!(error.to_string().contains("volume"));
//! ```

use std::error::Error as StdError;

use thiserror::Error;

use crate::auth::AuthError;
use crate::clients::HttpError;
use crate::config::{InvalidVersionError, ServerVersion};
use crate::context::ContextError;

/// Which side of the transport an interceptor failed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookStage {
    /// Before the request was sent.
    Before,
    /// After the response was received.
    After,
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => f.write_str("before-request"),
            Self::After => f.write_str("after-response"),
        }
    }
}

/// Error type for resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A lookup matched nothing, or matched a single empty record.
    #[error("No {resource} found matching {params}")]
    NotFound {
        /// Resource type name.
        resource: String,
        /// The search parameters, rendered for diagnostics.
        params: String,
    },

    /// A lookup expected to match one record matched several.
    #[error("Expected one {resource} matching {params}, found {count}")]
    TooManyRecords {
        /// Resource type name.
        resource: String,
        /// Number of records matched.
        count: usize,
        /// The search parameters, rendered for diagnostics.
        params: String,
    },

    /// The connected server is older than the resource requires.
    #[error("{resource} requires server version {minimum} or newer, detected {detected}")]
    VersionUnsupported {
        /// Resource type name.
        resource: String,
        /// The server's core version.
        detected: ServerVersion,
        /// The minimum version the resource declares.
        minimum: ServerVersion,
    },

    /// A version string could not be parsed.
    #[error(transparent)]
    InvalidVersion(#[from] InvalidVersionError),

    /// The transport failed or the server answered with a non-2xx status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Obtaining or refreshing credentials failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An interceptor rejected the call.
    #[error("{stage} interceptor failed for {resource}: {source}")]
    Interceptor {
        /// Where the hook ran.
        stage: HookStage,
        /// Resource type name, empty for raw calls.
        resource: String,
        /// The hook's error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The response body was not valid JSON.
    #[error("Failed to parse response body: {0}")]
    Parse(#[source] serde_json::Error),

    /// The response had a different shape than the operation expects.
    #[error("Expected {expected} from {resource}, got {actual}")]
    ShapeMismatch {
        /// Resource type name.
        resource: String,
        /// The shape the caller asked for.
        expected: &'static str,
        /// The shape received.
        actual: &'static str,
    },

    /// A record had no usable `id` field.
    #[error("{resource} record has no id")]
    MissingId {
        /// Resource type name.
        resource: String,
    },

    /// An asynchronous task reached a failure state.
    #[error("Task {id} ({name}) failed: {message}")]
    TaskFailed {
        /// Task identifier.
        id: i64,
        /// Task display name.
        name: String,
        /// Last message reported by the task.
        message: String,
    },

    /// An asynchronous task failed without reporting any message.
    #[error("Task {id} ({name}) failed without messages")]
    TaskNoMessages {
        /// Task identifier.
        id: i64,
        /// Task display name.
        name: String,
    },

    /// An asynchronous task was still running after every poll attempt.
    #[error("Task {id} still running after {attempts} attempts")]
    TaskTimeout {
        /// Task identifier.
        id: i64,
        /// Number of polls made.
        attempts: u32,
    },

    /// The call's context was cancelled or its deadline passed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// A record could not be projected onto a typed struct.
    #[error("Failed to fill {type_name}: {message}")]
    Fill {
        /// Target type name.
        type_name: &'static str,
        /// Why the projection failed.
        message: String,
    },
}

impl ResourceError {
    /// Returns `true` for [`ResourceError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the HTTP status code, if the error came from a server response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// A failure that setup code chose not to handle.
///
/// Returned by [`Resource::must_exists`](crate::rest::Resource::must_exists).
/// Library code never terminates the process; callers that want the old
/// abort-on-failure behaviour call [`FatalError::abort`] explicitly.
#[derive(Debug, Error)]
#[error("Fatal: {source}")]
pub struct FatalError {
    /// The underlying failure.
    #[source]
    pub source: ResourceError,
}

impl FatalError {
    /// Panics with the underlying error.
    ///
    /// # Panics
    ///
    /// Always.
    pub fn abort(self) -> ! {
        panic!("{}", self.source)
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn into_inner(self) -> ResourceError {
        self.source
    }
}
