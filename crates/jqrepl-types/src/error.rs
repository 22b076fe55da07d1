//! Errors raised by value handle operations.

use thiserror::Error;

use crate::value::Kind;

/// Result type for value handle operations.
pub type JvResult<T> = Result<T, JvError>;

/// Value handle errors.
///
/// Wrong-kind access is always reported through [`JvError::Type`] rather
/// than a panic, so callers can recover from a bad guess about a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JvError {
    /// Malformed JSON text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Operation applied to a value of the wrong kind.
    #[error("type error: expected {expected}, found {found}")]
    Type { expected: &'static str, found: Kind },

    /// Malformed colour specification.
    #[error("invalid colour spec: {0}")]
    Palette(String),
}

impl JvError {
    pub(crate) fn type_mismatch(expected: &'static str, found: Kind) -> Self {
        JvError::Type { expected, found }
    }
}

impl From<serde_json::Error> for JvError {
    fn from(err: serde_json::Error) -> Self {
        JvError::Parse(err.to_string())
    }
}
