//! Conversion of caller parameters into a render context
//!
//! Any `Serialize` type can act as a parameter set once it opts in through
//! [`QueryParams`]. The conversion is purely structural: field names become
//! keys, sequences keep their order, nested structs become nested maps. Null
//! fields (e.g. `Option::None`) are dropped so templates see them as unset.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};
use crate::renderer::RenderContext;

/// Marker for values that may be bound as query parameters
pub trait QueryParams: Serialize {}

impl QueryParams for Value {}
impl QueryParams for Map<String, Value> {}
impl QueryParams for NoParams {}
impl<V: Serialize> QueryParams for HashMap<String, V> {}
impl<V: Serialize> QueryParams for BTreeMap<String, V> {}
impl<T: QueryParams + ?Sized> QueryParams for &T {}

/// Parameters for templates that take none
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams;

/// Flatten a parameter set into a render context
///
/// A parameter value that serializes to null (a unit struct, `()`) yields an
/// empty context. Anything other than a map or null is rejected.
pub fn bind<P: QueryParams + ?Sized>(params: &P) -> Result<RenderContext> {
    let value = serde_json::to_value(params)
        .map_err(|e| EngineError::serialization(e.to_string()))?;

    match value {
        Value::Null => Ok(RenderContext::new()),
        Value::Object(map) => Ok(RenderContext::from_map(strip_nulls(map))),
        other => Err(EngineError::serialization(format!(
            "expected a map of named parameters, got {}",
            kind_of(&other)
        ))),
    }
}

/// Remove null-valued keys at every nesting level
fn strip_nulls(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k, strip_value(v)))
        .collect()
}

fn strip_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(strip_nulls(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_value).collect()),
        other => other,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a map",
    }
}
