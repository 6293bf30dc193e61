//! Response shape detection and envelope unwrapping.
//!
//! A raw body becomes a [`Payload`]:
//!
//! - empty or whitespace-only body: [`Payload::Empty`]
//! - JSON object: [`Payload::Record`]
//! - JSON array: [`Payload::RecordSet`]
//! - any other JSON value: a [`Record`] with the value under [`SCALAR_FIELD`]
//!
//! Two envelopes are then unwrapped. A record carrying a numeric
//! [`TASK_ID_FIELD`] becomes a reference record tagged [`TASK_RESOURCE`]. A
//! pagination envelope (`results`, `count`, `next` and `previous` all present)
//! is replaced by its inner result list.

use serde_json::{Map, Value};

use crate::rest::{Payload, Record, RecordSet};

/// Resource type name of asynchronous task records.
pub const TASK_RESOURCE: &str = "task";

/// Field signalling that a mutation continues asynchronously.
pub const TASK_ID_FIELD: &str = "task_id";

/// Field a bare scalar body, or a scalar list element, is stored under.
pub const SCALAR_FIELD: &str = "value";

const PAGE_RESULTS: &str = "results";
const PAGE_KEYS: [&str; 4] = [PAGE_RESULTS, "count", "next", "previous"];

/// Parses a raw body into one of the three shapes.
///
/// # Errors
///
/// Returns the JSON error for a malformed, non-empty body.
pub fn parse_body(body: &str) -> Result<Payload, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Payload::Empty);
    }
    let value: Value = serde_json::from_str(body)?;
    Ok(match value {
        Value::Array(items) => Payload::RecordSet(items.into_iter().map(into_record).collect()),
        other => Payload::Record(into_record(other)),
    })
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(fields) => Record::from_map(fields),
        scalar => {
            let mut fields = Map::new();
            fields.insert(SCALAR_FIELD.to_string(), scalar);
            Record::from_map(fields)
        }
    }
}

/// Applies the async-task and pagination rules.
#[must_use]
pub fn unwrap_envelopes(payload: Payload) -> Payload {
    match payload {
        Payload::Record(record) => unwrap_record(record),
        Payload::RecordSet(set) if set.len() == 1 => {
            let results = set.first().and_then(page_results);
            Payload::RecordSet(results.unwrap_or(set))
        }
        other => other,
    }
}

fn unwrap_record(record: Record) -> Payload {
    if let Some(task_id) = record.get(TASK_ID_FIELD).and_then(Value::as_i64) {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(task_id));
        return Payload::Record(Record::from_map(fields).tagged(TASK_RESOURCE));
    }
    match page_results(&record) {
        Some(results) => Payload::RecordSet(results),
        None => Payload::Record(record),
    }
}

/// Returns the inner list of a pagination envelope.
///
/// All four keys must be present and the list must hold only objects.
fn page_results(record: &Record) -> Option<RecordSet> {
    if !PAGE_KEYS.iter().all(|key| record.contains_key(*key)) {
        return None;
    }
    let Value::Array(items) = record.get(PAGE_RESULTS)? else {
        return None;
    };
    items
        .iter()
        .map(|item| Record::from_value(item.clone()))
        .collect::<Option<Vec<_>>>()
        .map(RecordSet::from)
}
