use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::mutation::FieldRequest;
use crate::scene::TargetRef;

/// A request that could not be decoded. `path` points at the offending JSON
/// location when one is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.path.as_deref(), .message))]
pub struct RequestError {
    pub path: Option<String>,
    pub message: String,
}

fn describe(path: Option<&str>, message: &str) -> String {
    match path {
        Some(path) => format!("invalid request at {path}: {message}"),
        None => format!("invalid request: {message}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SetProperties,
    GetProperties,
    ListMembers,
    ListObjects,
    Undo,
    Redo,
    Ping,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPropertiesParams {
    pub target: TargetRef,
    pub target_kind: String,
    pub fields: Map<String, Value>,
}

impl SetPropertiesParams {
    /// Fields in request order. Non-string values are passed on as their
    /// JSON text, so `{"x":1}` and `[1,2,3]` reach the vector parser intact.
    pub fn field_requests(&self) -> Vec<FieldRequest> {
        self.fields
            .iter()
            .map(|(name, value)| FieldRequest::new(name.as_str(), raw_value_text(value)))
            .collect()
    }
}

fn raw_value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesParams {
    pub target: TargetRef,
    pub target_kind: String,
    #[serde(default)]
    pub names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetParams {
    pub target: TargetRef,
    pub target_kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    SetProperties(SetPropertiesParams),
    GetProperties(GetPropertiesParams),
    ListMembers(TargetParams),
    ListObjects,
    Undo,
    Redo,
    Ping,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::SetProperties(_) => OperationKind::SetProperties,
            Operation::GetProperties(_) => OperationKind::GetProperties,
            Operation::ListMembers(_) => OperationKind::ListMembers,
            Operation::ListObjects => OperationKind::ListObjects,
            Operation::Undo => OperationKind::Undo,
            Operation::Redo => OperationKind::Redo,
            Operation::Ping => OperationKind::Ping,
        }
    }
}

#[derive(Deserialize)]
struct Header {
    operation: OperationKind,
}

/// Decodes one request object. The `operation` tag is read first so the
/// parameters can be decoded with exact error paths.
pub fn decode_request(raw: &str) -> Result<Operation, RequestError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let value: Value = decode_tracked(&mut deserializer)?;
    deserializer.end().map_err(|error| RequestError {
        path: None,
        message: error.to_string(),
    })?;
    if !value.is_object() {
        return Err(RequestError {
            path: None,
            message: "expected a JSON object".to_string(),
        });
    }
    let header: Header = decode_tracked(value.clone())?;
    let operation = match header.operation {
        OperationKind::SetProperties => Operation::SetProperties(decode_tracked(value)?),
        OperationKind::GetProperties => Operation::GetProperties(decode_tracked(value)?),
        OperationKind::ListMembers => Operation::ListMembers(decode_tracked(value)?),
        OperationKind::ListObjects => Operation::ListObjects,
        OperationKind::Undo => Operation::Undo,
        OperationKind::Redo => Operation::Redo,
        OperationKind::Ping => Operation::Ping,
    };
    Ok(operation)
}

fn decode_tracked<'de, D, T>(deserializer: D) -> Result<T, RequestError>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize(deserializer).map_err(|error| {
        let path = error.path().to_string();
        let message = error.into_inner().to_string();
        RequestError {
            path: (!path.is_empty() && path != ".").then_some(path),
            message,
        }
    })
}
