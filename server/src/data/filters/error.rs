//! Filter error types

use thiserror::Error;

use super::condition::ValueKind;
use super::op::Op;

/// Errors raised while parsing, validating or compiling filter conditions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("operation not allowed on a {kind}: {op}")]
    InvalidOperator { op: Op, kind: ValueKind },

    #[error("intervals on {kind} must have exactly 2 values, start and end (got {got})")]
    MalformedInterval { kind: ValueKind, got: usize },

    #[error("set operation {op} requires at least one value")]
    EmptySet { op: Op },

    #[error("unknown operation: {0}")]
    UnknownOperator(String),

    #[error("cannot parse '{value}' as {kind}: {reason}")]
    UnparsableValue {
        value: String,
        kind: ValueKind,
        reason: String,
    },

    #[error("malformed vector condition: {0}")]
    MalformedVector(String),

    #[error("invalid condition on {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<FilterError>,
    },
}

impl FilterError {
    /// Attach the name of the filter field the error originated from
    pub fn on_field(self, field: &'static str) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }

    /// The underlying error, with any field context removed
    pub fn root(&self) -> &FilterError {
        match self {
            Self::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable machine-readable code for client-facing messages
    pub fn code(&self) -> &'static str {
        match self.root() {
            Self::InvalidOperator { .. } => "INVALID_OPERATOR",
            Self::MalformedInterval { .. } => "MALFORMED_INTERVAL",
            Self::EmptySet { .. } => "EMPTY_SET",
            Self::UnknownOperator(_) => "UNKNOWN_OPERATOR",
            Self::UnparsableValue { .. } => "UNPARSABLE_VALUE",
            Self::MalformedVector(_) => "MALFORMED_VECTOR",
            Self::Field { .. } => unreachable!("root() strips field context"),
        }
    }
}
