//! Configuration error types for the storage API client.
//!
//! Every configuration constructor returns `Result<T, ConfigError>` so that a
//! malformed configuration is rejected before any connection is attempted.
//!
//! # Example
//!
//! ```rust
//! use storage_api::{ConfigError, Host};
//!
//! let result = Host::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyHost)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a client configuration.
///
/// These are the validation failures of the engine: they are raised at
/// construction time and never during steady-state request handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Host cannot be empty.
    #[error("Host cannot be empty. Please provide the control plane host name or address.")]
    EmptyHost,

    /// Host is malformed.
    #[error("Invalid host '{host}'. Expected a host name or address, optionally prefixed with 'http://' or 'https://'. Set the port separately.")]
    InvalidHost {
        /// The invalid host that was provided.
        host: String,
    },

    /// Username cannot be empty.
    #[error("Username cannot be empty.")]
    EmptyUsername,

    /// Password cannot be empty.
    #[error("Password cannot be empty.")]
    EmptyPassword,

    /// API token cannot be empty.
    #[error("API token cannot be empty.")]
    EmptyApiToken,

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected a single path segment such as 'v1'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// Neither a static token nor a username/password pair was configured.
    #[error("Missing credentials: configure either an API token or both a username and a password.")]
    MissingCredentials,

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A numeric setting is out of range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidSetting {
        /// The name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
