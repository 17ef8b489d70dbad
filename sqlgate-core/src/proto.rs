//! Line-delimited JSON-RPC envelope.
//!
//! One logical method, [`METHOD_SELECT`]. Requests and responses are
//! each a single line of JSON on the stream. Requests may carry their
//! parameter object directly or wrapped in a one-element array (the
//! positional form used by JSON-RPC 1.0-era clients).

use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The gateway's only RPC method.
pub const METHOD_SELECT: &str = "JSQL.Select";

/// One remote query: which backend, how to reach it, what to run.
///
/// Serde aliases accept the capitalized field names that legacy
/// clients produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectRequest {
    /// Shared-secret credential; compared byte-for-byte by the server.
    #[serde(default, alias = "Auth")]
    pub auth: String,
    /// Driver identifier, e.g. "postgres", "mysql", "sqlite".
    #[serde(alias = "Driver")]
    pub driver: String,
    /// Backend connection string; opaque to the gateway.
    #[serde(alias = "DataSourceName")]
    pub data_source: String,
    /// SQL text; opaque to the gateway, passed through unparsed.
    #[serde(alias = "Statement")]
    pub statement: String,
    /// Positional bind parameters.
    #[serde(default, alias = "Parameters")]
    pub parameters: Vec<crate::value::Scalar>,
}

/// An incoming JSON-RPC request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    /// Build a `JSQL.Select` request with positional params.
    pub fn select(id: u64, request: &SelectRequest) -> Result<Self, serde_json::Error> {
        Ok(Self {
            jsonrpc: Some("2.0".to_string()),
            method: METHOD_SELECT.to_string(),
            params: Some(Value::Array(vec![serde_json::to_value(request)?])),
            id: Value::from(id),
        })
    }

    /// Extract the parameter object, unwrapping the positional array
    /// form if present. `None` means params were absent or JSON null.
    pub fn param_object(&self) -> Option<&Value> {
        match &self.params {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => items.first(),
            Some(other) => Some(other),
        }
    }
}

/// An outgoing JSON-RPC response frame: exactly one of `result`/`error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: Some("2.0".to_string()),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: Some("2.0".to_string()),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A structured JSON-RPC error: numeric code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("unknown method {method:?}"))
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(Self::INVALID_PARAMS, format!("invalid params: {detail}"))
    }
}

impl From<&Error> for RpcError {
    fn from(err: &Error) -> Self {
        Self::new(err.rpc_code(), err.to_string())
    }
}
