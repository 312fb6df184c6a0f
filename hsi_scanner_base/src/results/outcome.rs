//! Per-query outcomes produced by the reconciler

use crate::results::formatter::SecurityAttrResult;
use crate::strategies::TransportError;
use serde::Serialize;
use std::fmt;

/// Result of resolving one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    Found {
        name: String,
        result: SecurityAttrResult,
    },
    NotFound {
        queried_name: String,
        reason: NotFoundReason,
    },
    Unavailable {
        reason: UnavailableReason,
    },
}

impl QueryOutcome {
    /// Printable status label, only for `Found`
    pub fn status_label(&self) -> Option<&'static str> {
        match self {
            QueryOutcome::Found { result, .. } => Some(result.as_str()),
            QueryOutcome::NotFound { .. } | QueryOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, QueryOutcome::Found { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, QueryOutcome::Unavailable { .. })
    }
}

/// Why a lookup produced no usable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotFoundReason {
    /// No cached attribute matches the identifier
    NoMatch,
    /// Matched attribute carried no result code
    NoResult,
    /// Matched attribute's result code has no label
    Unrepresentable { code: u32 },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoMatch => write!(f, "Attribute not found"),
            NotFoundReason::NoResult => write!(f, "Attribute reported no result"),
            NotFoundReason::Unrepresentable { code } => {
                write!(f, "Attribute result code {} is not a known state", code)
            }
        }
    }
}

/// Why collection could not take place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Connection to the service could not be established
    ServiceUnreachable(String),
    /// Service was reached but the call failed
    CallFailed(String),
    /// Service replied with data the probe cannot decode
    Protocol(String),
}

impl From<&TransportError> for UnavailableReason {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Unavailable { .. } => Self::ServiceUnreachable(err.to_string()),
            TransportError::CallFailed { .. } => Self::CallFailed(err.to_string()),
            TransportError::Protocol(protocol) => Self::Protocol(protocol.to_string()),
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::ServiceUnreachable(detail) => {
                write!(f, "Could not reach host security service: {}", detail)
            }
            UnavailableReason::CallFailed(detail) => {
                write!(f, "Host security service returned no data: {}", detail)
            }
            UnavailableReason::Protocol(detail) => {
                write!(f, "Host security service returned unusable data: {}", detail)
            }
        }
    }
}
