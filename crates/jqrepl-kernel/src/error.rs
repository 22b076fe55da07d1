//! Errors surfaced by program runs and engine sessions.

use jqrepl_types::Jv;
use thiserror::Error;

/// Message used when the engine reports an error without a payload.
pub const INTERNAL_ERROR: &str = "internal error";

/// An error delivered on a run's error channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The program text did not compile. Sent once, then the run ends.
    #[error("compile error: {0}")]
    Compile(String),

    /// The engine produced an error value mid-run.
    #[error("{0}")]
    Evaluation(String),

    /// The session's engine thread is gone.
    #[error("engine session closed")]
    SessionClosed,
}

impl RunError {
    /// Convert an invalid value from the engine into an evaluation error.
    pub fn from_invalid(invalid: &Jv) -> Self {
        RunError::Evaluation(
            invalid
                .invalid_message_string()
                .unwrap_or_else(|| INTERNAL_ERROR.to_string()),
        )
    }
}

/// Errors opening or closing an engine session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start engine thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("engine thread panicked")]
    Panicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_message_becomes_evaluation_error() {
        let invalid = Jv::invalid_with_message(Jv::string("boom"));
        assert_eq!(RunError::from_invalid(&invalid), RunError::Evaluation("boom".into()));
    }

    #[test]
    fn object_message_is_dumped() {
        let invalid = Jv::invalid_with_message(Jv::from_pairs([("code", Jv::number(7.0))]));
        assert_eq!(
            RunError::from_invalid(&invalid).to_string(),
            r#"{"code":7}"#
        );
    }

    #[test]
    fn missing_message_falls_back() {
        assert_eq!(
            RunError::from_invalid(&Jv::invalid()),
            RunError::Evaluation(INTERNAL_ERROR.into())
        );
    }

    #[test]
    fn compile_error_display() {
        let err = RunError::Compile("expected term".into());
        assert_eq!(err.to_string(), "compile error: expected term");
    }
}
