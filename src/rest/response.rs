//! The three response shapes and conversion into the shape a caller expects.

use crate::rest::{Record, RecordSet, ResourceError};

/// A normalized response body.
///
/// Every response collapses into exactly one of these shapes. An empty body
/// is [`Payload::Empty`], distinct from an empty [`RecordSet`].
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// A single entity.
    Record(Record),
    /// A list of entities.
    RecordSet(RecordSet),
    /// No body at all (for example, HTTP 204).
    Empty,
}

impl Payload {
    /// Returns a short name of the shape, for diagnostics.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::RecordSet(_) => "record set",
            Self::Empty => "empty result",
        }
    }

    /// Tags every record with `resource_type`, replacing existing tags.
    pub fn tag(&mut self, resource_type: &str) {
        match self {
            Self::Record(record) => record.set_resource_type(resource_type),
            Self::RecordSet(set) => set.set_resource_type(resource_type),
            Self::Empty => {}
        }
    }

    /// Tags every record that carries no tag yet.
    pub fn tag_if_missing(&mut self, resource_type: &str) {
        match self {
            Self::Record(record) => record.tag_if_missing(resource_type),
            Self::RecordSet(set) => set.tag_if_missing(resource_type),
            Self::Empty => {}
        }
    }
}

/// Conversion from a normalized payload into a caller-facing result type.
///
/// Implemented for [`Record`], [`RecordSet`], [`Payload`] and `()`.
pub trait FromPayload: Sized {
    /// Name of the expected shape, used in [`ResourceError::ShapeMismatch`].
    const EXPECTED: &'static str;

    /// Converts the payload, or returns it back when the shape does not fit.
    ///
    /// # Errors
    ///
    /// Returns the original payload when it cannot be converted.
    fn from_payload(payload: Payload) -> Result<Self, Payload>;

    /// Converts the payload, naming `resource` in the mismatch error.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ShapeMismatch`] when the shape does not fit.
    fn convert(payload: Payload, resource: &str) -> Result<Self, ResourceError> {
        Self::from_payload(payload).map_err(|payload| ResourceError::ShapeMismatch {
            resource: resource.to_string(),
            expected: Self::EXPECTED,
            actual: payload.shape(),
        })
    }
}

/// A one-element set unwraps to its record. An empty body is a mismatch.
impl FromPayload for Record {
    const EXPECTED: &'static str = "record";

    fn from_payload(payload: Payload) -> Result<Self, Payload> {
        match payload {
            Payload::Record(record) => Ok(record),
            Payload::RecordSet(set) if set.len() == 1 => {
                Ok(set.into_vec().into_iter().next().unwrap_or_default())
            }
            other @ (Payload::Empty | Payload::RecordSet(_)) => Err(other),
        }
    }
}

impl FromPayload for RecordSet {
    const EXPECTED: &'static str = "record set";

    fn from_payload(payload: Payload) -> Result<Self, Payload> {
        Ok(match payload {
            Payload::RecordSet(set) => set,
            Payload::Record(record) => vec![record].into(),
            Payload::Empty => Self::new(),
        })
    }
}

impl FromPayload for Payload {
    const EXPECTED: &'static str = "any";

    fn from_payload(payload: Payload) -> Result<Self, Payload> {
        Ok(payload)
    }
}

impl FromPayload for () {
    const EXPECTED: &'static str = "empty result";

    fn from_payload(_payload: Payload) -> Result<Self, Payload> {
        Ok(())
    }
}
