//! Search and query parameters.

use std::fmt;

use serde_json::{Map, Value};

use crate::clients::Query;

/// Parameters for a list/get lookup or a delete query string.
///
/// Values are stringified one by one when turned into a query: strings go
/// out verbatim, `null` as an empty value, everything else as compact JSON.
/// Nested structures are not expanded. [`Params::raw`] passes a pre-encoded
/// query string through untouched.
///
/// # Example
///
/// ```rust
/// use storage_api::rest::Params;
///
/// let params = Params::new().with("name", "db01").with("size", 10);
/// assert_eq!(params.to_query().unwrap().encode(), "name=db01&size=10");
///
/// let raw = Params::raw("id__in=1,2,3");
/// assert_eq!(raw.to_query().unwrap().encode(), "id__in=1,2,3");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    kind: ParamsKind,
}

#[derive(Clone, Debug, PartialEq)]
enum ParamsKind {
    Map(Map<String, Value>),
    Raw(String),
}

impl Default for ParamsKind {
    fn default() -> Self {
        Self::Map(Map::new())
    }
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a pre-encoded query string.
    #[must_use]
    pub fn raw(query: impl Into<String>) -> Self {
        Self {
            kind: ParamsKind::Raw(query.into()),
        }
    }

    /// Adds a key/value pair.
    ///
    /// On a raw parameter set the raw string is replaced by a map holding
    /// just this pair.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a key/value pair in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        match &mut self.kind {
            ParamsKind::Map(map) => {
                map.insert(key.into(), value.into());
            }
            ParamsKind::Raw(_) => {
                let mut map = Map::new();
                map.insert(key.into(), value.into());
                self.kind = ParamsKind::Map(map);
            }
        }
    }

    /// Returns `true` if there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            ParamsKind::Map(map) => map.is_empty(),
            ParamsKind::Raw(raw) => raw.is_empty(),
        }
    }

    /// Returns the value for a key of a map parameter set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.kind {
            ParamsKind::Map(map) => map.get(key),
            ParamsKind::Raw(_) => None,
        }
    }

    /// Converts the parameters into a URL query, or `None` when empty.
    #[must_use]
    pub fn to_query(&self) -> Option<Query> {
        if self.is_empty() {
            return None;
        }
        Some(match &self.kind {
            ParamsKind::Map(map) => Query::Pairs(
                map.iter()
                    .map(|(key, value)| (key.clone(), stringify(value)))
                    .collect(),
            ),
            ParamsKind::Raw(raw) => Query::Raw(raw.clone()),
        })
    }

    /// Converts the parameters into a JSON body, or `None` when empty or raw.
    #[must_use]
    pub fn to_body(&self) -> Option<Value> {
        match &self.kind {
            ParamsKind::Map(map) if !map.is_empty() => Some(Value::Object(map.clone())),
            _ => None,
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParamsKind::Map(map) => write!(f, "{}", Value::Object(map.clone())),
            ParamsKind::Raw(raw) => write!(f, "\"{raw}\""),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            kind: ParamsKind::Map(map),
        }
    }
}
