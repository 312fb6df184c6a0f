// src/strategies/errors.rs
//! Error types for reply decoding and bus transport
//!
//! Per-entry decode anomalies never show up here: they are logged and skipped.
//! Only whole-reply failures and transport failures propagate.

use crate::strategies::command_executor::CommandError;

/// Reply shape or encoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Reply is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("Invalid type signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("Value does not match signature '{signature}': expected {expected}, found {found}")]
    TypeMismatch {
        signature: String,
        expected: String,
        found: String,
    },

    #[error("Signature '{signature}' declares {declared} argument(s) but reply carries {found}")]
    ArgumentCountMismatch {
        signature: String,
        declared: usize,
        found: usize,
    },

    #[error("Unexpected reply shape at {location}: expected {expected}, found '{found}'")]
    UnexpectedShape {
        location: String,
        expected: String,
        found: String,
    },

    #[error("Reply carries no arguments")]
    MissingArgument,

    #[error("Service returned error '{name}': {message}")]
    ErrorReply { name: String, message: String },
}

impl ProtocolError {
    pub fn type_mismatch(signature: &str, expected: &str, found: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            signature: signature.to_string(),
            expected: expected.to_string(),
            found: json_kind(found).to_string(),
        }
    }

    pub fn invalid_signature(signature: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.into(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Transport collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection to the service could not be established
    #[error("Service '{service}' unreachable: {reason}")]
    Unavailable { service: String, reason: String },

    /// Service was reached but the method call failed
    #[error("Call to '{method}' failed: {reason}")]
    CallFailed { method: String, reason: String },

    #[error("Malformed reply: {0}")]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    pub fn unavailable(service: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify a command executor failure: the bus client never produced a reply
    pub fn from_command(service: &str, err: CommandError) -> Self {
        Self::unavailable(service, err.to_string())
    }
}
