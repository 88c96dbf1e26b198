//! JSON-RPC Protocol definitions
//!
//! Defines the communication protocol between a debugger front-end and
//! dbgeval-server.

use crate::debuggee::{ArraySnapshot, HandleStats};
use serde::{Deserialize, Serialize};

/// Request from the front-end to dbgeval-server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    /// Load array snapshots, replacing any previous ones
    #[serde(rename = "initialize")]
    Initialize { arrays: Vec<ArraySnapshot> },

    /// Element count of an array (`ldlen`)
    #[serde(rename = "length")]
    Length { name: String },

    /// Load one element (`ldelem`)
    #[serde(rename = "element")]
    Element { name: String, index: i64 },

    /// Store one element (`stelem`)
    #[serde(rename = "store")]
    Store {
        name: String,
        index: i64,
        value: serde_json::Value,
    },

    /// Handle accounting of the loaded snapshot
    #[serde(rename = "stats")]
    Stats,

    /// Shutdown the server
    #[serde(rename = "shutdown")]
    Shutdown,
}

/// Response from dbgeval-server to the front-end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Length { found: bool, length: i64 },
    EvalResult { value: String, value_type: String },
    Store { accepted: bool },
    Stats { stats: HandleStats },
    Success { ok: bool },
    Error { error: String },
}

impl Response {
    pub fn success() -> Self {
        Response::Success { ok: true }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Response::Error { error: msg.into() }
    }

    pub fn length(length: Option<i64>) -> Self {
        Response::Length {
            found: length.is_some(),
            length: length.unwrap_or(0),
        }
    }

    pub fn eval_result(value: impl Into<String>, value_type: impl Into<String>) -> Self {
        Response::EvalResult {
            value: value.into(),
            value_type: value_type.into(),
        }
    }
}

/// JSON-RPC message wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage<T> {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(flatten)]
    pub content: T,
}

impl<T> RpcMessage<T> {
    pub fn new(id: u64, content: T) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserialize() {
        let line = r#"{"jsonrpc":"2.0","id":3,"method":"element","params":{"name":"xs","index":-1}}"#;
        let msg: RpcMessage<Request> = serde_json::from_str(line).unwrap();
        assert_eq!(msg.id, Some(3));
        assert!(matches!(msg.content, Request::Element { index: -1, .. }));
    }

    #[test]
    fn test_initialize_defaults() {
        let line = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"arrays":[{"name":"xs","element_type":"int"}]}}"#;
        let msg: RpcMessage<Request> = serde_json::from_str(line).unwrap();
        let Request::Initialize { arrays } = msg.content else {
            panic!("expected initialize");
        };
        assert_eq!(arrays[0].rank, 1);
        assert!(arrays[0].elements.is_empty());
        assert!(arrays[0].by_reference.is_none());
    }

    #[test]
    fn test_response_serialize() {
        let json = serde_json::to_string(&Response::length(None)).unwrap();
        assert_eq!(json, r#"{"found":false,"length":0}"#);

        let json = serde_json::to_string(&Response::eval_result("42", "int")).unwrap();
        assert!(json.contains("\"value_type\":\"int\""));
    }
}
