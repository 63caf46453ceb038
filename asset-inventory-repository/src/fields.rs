//! Typed access to the `fields` section of a search hit.
//!
//! The search backend returns every requested field as an array, even when the
//! mapping holds a single scalar. `HitFields` keeps "field absent" (`None`)
//! apart from "field present with an empty or falsy value" (`Some("")`,
//! `Some(false)`), and makes taking the first element of a multi-valued field
//! an explicit call.

use std::slice;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Projected field values of one hit, keyed by dotted field name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct HitFields(Map<String, Value>);

impl HitFields {
    /// All values of a field, or `None` if the field is absent.
    ///
    /// A bare scalar is tolerated and exposed as a one-element slice.
    pub fn values(&self, name: &str) -> Option<&[Value]> {
        match self.0.get(name)? {
            Value::Array(values) => Some(values.as_slice()),
            Value::Null => None,
            other => Some(slice::from_ref(other)),
        }
    }

    /// The first value of a field.
    pub fn first(&self, name: &str) -> Option<&Value> {
        self.values(name)?.first()
    }

    /// The first value of a field if it is a string.
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.first(name)?.as_str()
    }

    /// The first value of a field rendered as a string.
    ///
    /// Numbers and booleans are stringified; objects, arrays and nulls are
    /// treated as absent.
    pub fn first_string(&self, name: &str) -> Option<String> {
        match self.first(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<Value> for HitFields {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}
