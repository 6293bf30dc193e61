//! Resource identifiers and path construction.
//!
//! Every resource lives under a base path below `/api/{version}`. Single
//! entities are addressed as `{path}/{id}`, and sub-collections of an entity
//! as `{path}/{id}/{segment}/...`.
//!
//! # Example
//!
//! ```rust
//! use storage_api::rest::{build_path, ResourceId};
//!
//! assert_eq!(build_path("volumes", &ResourceId::from(7), &[]), "volumes/7");
//! assert_eq!(
//!     build_path("hosts", &ResourceId::from("web 01"), &["ports"]),
//!     "hosts/web%2001/ports"
//! );
//! ```

use std::fmt;

use serde_json::Value;

/// Identifier of a single entity.
///
/// Integral identifiers render without decoration. Opaque identifiers
/// (names, UUIDs) render verbatim, percent-encoded for use in a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// A numeric primary key.
    Int(i64),
    /// Any other identifier.
    Opaque(String),
}

impl ResourceId {
    /// Extracts an identifier from a JSON value.
    ///
    /// Integers and floats without a fractional part become
    /// [`ResourceId::Int`]; strings become [`ResourceId::Opaque`]. Anything
    /// else yields `None`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int).or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| Self::Int(f as i64))
            }),
            Value::String(s) => Some(Self::Opaque(s.clone())),
            _ => None,
        }
    }

    /// Returns the numeric value for integral identifiers.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(id) => Some(*id),
            Self::Opaque(_) => None,
        }
    }

    /// Renders the identifier as a single path segment.
    #[must_use]
    pub fn to_segment(&self) -> String {
        match self {
            Self::Int(id) => id.to_string(),
            Self::Opaque(id) => urlencoding::encode(id).into_owned(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Opaque(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for ResourceId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<u32> for ResourceId {
    fn from(id: u32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        i64::try_from(id).map_or_else(|_| Self::Opaque(id.to_string()), Self::Int)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::Opaque(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self::Opaque(id)
    }
}

impl From<uuid::Uuid> for ResourceId {
    fn from(id: uuid::Uuid) -> Self {
        Self::Opaque(id.to_string())
    }
}

/// Builds `{base}/{id}` followed by any extra segments.
///
/// Leading and trailing slashes on `base` and on each segment are ignored.
#[must_use]
pub fn build_path(base: &str, id: &ResourceId, segments: &[&str]) -> String {
    let mut path = base.trim_matches('/').to_string();
    if !path.is_empty() {
        path.push('/');
    }
    path.push_str(&id.to_segment());
    for segment in segments {
        let segment = segment.trim_matches('/');
        if !segment.is_empty() {
            path.push('/');
            path.push_str(segment);
        }
    }
    path
}
