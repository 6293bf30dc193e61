//! Immutable resource metadata.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::config::{ApiVersion, InvalidVersionError, ServerVersion};
use crate::error::ConfigError;
use crate::rest::Interceptor;

/// Binds a resource type to its path and version requirements.
///
/// Descriptors are created once, usually as constants or statics, and shared
/// by every call on that resource.
///
/// # Example
///
/// ```rust
/// use storage_api::rest::ResourceDescriptor;
///
/// let volumes = ResourceDescriptor::new("volumes", "volume")
///     .with_min_version("5.2.0".parse().unwrap());
///
/// assert_eq!(volumes.path(), "volumes");
/// assert_eq!(volumes.name(), "volume");
/// assert_eq!(volumes.min_version().unwrap().to_string(), "5.2.0");
/// ```
#[derive(Clone)]
pub struct ResourceDescriptor {
    path: Cow<'static, str>,
    name: Cow<'static, str>,
    min_version: Option<ServerVersion>,
    api_version: Option<ApiVersion>,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl ResourceDescriptor {
    /// Creates a descriptor with no minimum version and the connection's
    /// default API version.
    #[must_use]
    pub fn new(path: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            min_version: None,
            api_version: None,
            interceptor: None,
        }
    }

    /// The pseudo-resource used for path-only calls.
    ///
    /// Results of raw calls are never tagged.
    #[must_use]
    pub const fn raw() -> Self {
        Self {
            path: Cow::Borrowed(""),
            name: Cow::Borrowed(""),
            min_version: None,
            api_version: None,
            interceptor: None,
        }
    }

    /// Builds a descriptor from the string form used by generated resource
    /// tables: an empty `min_version` means no minimum and an empty
    /// `api_version` means the connection default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiVersion`] or a version parse error
    /// wrapped in [`ConfigError::InvalidSetting`].
    pub fn from_parts(
        path: &str,
        name: &str,
        min_version: &str,
        api_version: &str,
    ) -> Result<Self, ConfigError> {
        let mut descriptor = Self::new(path.to_string(), name.to_string());
        if !min_version.is_empty() {
            let version = min_version
                .parse()
                .map_err(|e: InvalidVersionError| ConfigError::InvalidSetting {
                    field: "min_version",
                    reason: e.to_string(),
                })?;
            descriptor = descriptor.with_min_version(version);
        }
        if !api_version.is_empty() {
            descriptor = descriptor.with_api_version(ApiVersion::new(api_version)?);
        }
        Ok(descriptor)
    }

    /// Sets the minimum server version the resource needs.
    #[must_use]
    pub fn with_min_version(mut self, version: ServerVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Overrides the API version for this resource.
    #[must_use]
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Attaches a per-resource interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Returns the base path below the API root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the resource type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the minimum server version, if declared.
    #[must_use]
    pub const fn min_version(&self) -> Option<&ServerVersion> {
        self.min_version.as_ref()
    }

    /// Returns the API version override, if any.
    #[must_use]
    pub const fn api_version(&self) -> Option<&ApiVersion> {
        self.api_version.as_ref()
    }

    /// Returns the per-resource interceptor, if any.
    #[must_use]
    pub const fn interceptor(&self) -> Option<&Arc<dyn Interceptor>> {
        self.interceptor.as_ref()
    }

    /// Returns `true` for the raw pseudo-resource.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("min_version", &self.min_version.as_ref().map(ToString::to_string))
            .field("api_version", &self.api_version)
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}
