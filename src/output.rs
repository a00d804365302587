//! Projection of evaluated values to JSON, and the response envelope.
//!
//! Projection drops virtual keys (`__name__`), so intermediate nodes that
//! only exist to be referenced never reach the caller. All output is
//! deterministic: object keys are emitted in sorted order.
//!
//! # Examples
//!
//! ```
//! use graphquery::compile;
//! use graphquery::output::to_json;
//!
//! let program = compile("{ __raw__ `template(\"Article\")` title `link(\"__raw__\")` }").unwrap();
//! let response = program.run("");
//! assert_eq!(to_json(&response), r#"{"data":{"title":"Article"},"errors":[]}"#);
//! ```
use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::{
    ast::GraphKind,
    program::is_virtual_key,
    value::{Fields, Value},
};

/// The result of running a program: best-effort data plus every error that
/// was recorded along the way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    pub data: Json,
    pub errors: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("can not {0} null data")]
    NullData(&'static str),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Response {
    /// A response carrying only an error.
    pub fn failed(error: impl ToString) -> Self {
        Response {
            data: Json::Null,
            errors: vec![error.to_string()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serialises `data` alone.
    pub fn marshal_data(&self) -> Result<String, ResponseError> {
        if self.data.is_null() {
            return Err(ResponseError::NullData("marshal"));
        }
        Ok(serde_json::to_string(&self.data)?)
    }

    /// Deserialises `data` into a caller type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ResponseError> {
        if self.data.is_null() {
            return Err(ResponseError::NullData("decode"));
        }
        Ok(T::deserialize(&self.data)?)
    }
}

/// Compact JSON for a response.
pub fn to_json(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_default()
}

/// Two-space indented JSON for a response.
pub fn to_json_pretty(response: &Response) -> String {
    serde_json::to_string_pretty(response).unwrap_or_default()
}

/// Projects the top-level fields of a run.
///
/// Object programs produce the fields as a map. Atom programs produce the
/// bare value of the first non-virtual field, or null if there is none.
pub fn project_graph(kind: GraphKind, fields: &Fields) -> Json {
    match kind {
        GraphKind::Object => project_object(fields),
        GraphKind::Atom => fields
            .iter()
            .find(|(name, _)| !is_virtual_key(name))
            .map(|(_, value)| project(value))
            .unwrap_or(Json::Null),
    }
}

pub fn project(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Number(n) => project_number(*n),
        Value::Object(fields) => project_object(fields),
        Value::Array(items) => Json::Array(items.iter().map(project).collect()),
        Value::ObjectArray(objects) => Json::Array(objects.iter().map(project_object).collect()),
    }
}

fn project_object(fields: &Fields) -> Json {
    let sorted: BTreeMap<&str, Json> = fields
        .iter()
        .filter(|(name, _)| !is_virtual_key(name))
        .map(|(name, value)| (name.as_str(), project(value)))
        .collect();
    let mut map = Map::with_capacity(sorted.len());
    for (name, value) in sorted {
        map.insert(name.to_string(), value);
    }
    Json::Object(map)
}

/// Whole numbers print without a fraction; NaN and infinities become null.
fn project_number(n: f64) -> Json {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < EXACT {
        return Json::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(Json::Number)
        .unwrap_or(Json::Null)
}
