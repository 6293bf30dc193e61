//! Authentication error types.

use thiserror::Error;

/// Errors raised while obtaining or refreshing credentials.
///
/// A `status` of `0` means no HTTP response was received (network failure or
/// timeout).
///
/// # Example
///
/// ```rust
/// use storage_api::auth::AuthError;
///
/// let error = AuthError::LoginFailed {
///     status: 401,
///     message: "bad credentials".to_string(),
/// };
/// assert!(error.to_string().contains("401"));
/// ```
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login call failed.
    #[error("Login failed with status {status}: {message}")]
    LoginFailed {
        /// HTTP status code, or 0 for network errors.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The refresh call failed.
    #[error("Token refresh failed with status {status}: {message}")]
    RefreshFailed {
        /// HTTP status code, or 0 for network errors.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// A refresh was attempted but no refresh token had been issued.
    #[error("No refresh token available; the authorizer must log in first")]
    MissingRefreshToken,
}

impl AuthError {
    /// Returns the HTTP status code carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::LoginFailed { status, .. } | Self::RefreshFailed { status, .. } => Some(*status),
            Self::MissingRefreshToken => None,
        }
    }
}
