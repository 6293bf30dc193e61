//! Typed projection of records.
//!
//! By default a record is projected onto a struct through serde, see
//! [`Record::fill`]. A [`RecordFiller`] configured on the client gets the
//! first chance at every projection, which lets callers keep hand-written
//! mappings for types that do not derive `Deserialize` cleanly.

use std::any::Any;

use serde::de::DeserializeOwned;

use crate::rest::interceptor::HookError;
use crate::rest::{Record, ResourceError};

/// Custom record-to-struct projection.
///
/// `target` is an `Option<T>` slot for the requested type `T`. An
/// implementation that handles `T` downcasts the slot, stores the value and
/// returns `Ok(true)`; for any other type it returns `Ok(false)` and serde
/// takes over.
///
/// # Example
///
/// ```rust
/// use std::any::Any;
/// use storage_api::rest::{HookError, Record, RecordFiller};
///
/// struct Capacity(u64);
///
/// struct CapacityFiller;
///
/// impl RecordFiller for CapacityFiller {
///     fn fill(&self, record: &Record, target: &mut dyn Any) -> Result<bool, HookError> {
///         let Some(slot) = target.downcast_mut::<Option<Capacity>>() else {
///             return Ok(false);
///         };
///         let blocks = record.get("blocks").and_then(|v| v.as_u64()).ok_or("no blocks")?;
///         *slot = Some(Capacity(blocks * 512));
///         Ok(true)
///     }
/// }
/// ```
pub trait RecordFiller: Send + Sync {
    /// Fills `target` from `record`.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be projected.
    fn fill(&self, record: &Record, target: &mut dyn Any) -> Result<bool, HookError>;
}

/// Projects a record, offering it to `filler` before falling back to serde.
///
/// # Errors
///
/// Returns [`ResourceError::Fill`] if the filler fails or serde cannot
/// deserialize the record.
pub fn fill_record<T>(
    filler: Option<&dyn RecordFiller>,
    record: &Record,
) -> Result<T, ResourceError>
where
    T: DeserializeOwned + 'static,
{
    if let Some(filler) = filler {
        let mut slot: Option<T> = None;
        let handled = filler
            .fill(record, &mut slot)
            .map_err(|e| ResourceError::Fill {
                type_name: std::any::type_name::<T>(),
                message: e.to_string(),
            })?;
        if let (true, Some(value)) = (handled, slot) {
            return Ok(value);
        }
    }
    record.fill()
}
