//! # Error Types: Structured Error Hierarchy
//!
//! All errors derive `Display` and `Error` via `thiserror`. Validation
//! errors name the offending field or value. Transition errors live beside
//! the state machine in `nyay_state::StageError`.

use thiserror::Error;

/// A value supplied from outside the process was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Stage string is not one of the six lifecycle stages.
    #[error("unknown case stage {0:?}; expected one of New Lead, Discovery, Filing, Hearing, Judgment, Closed")]
    UnknownStage(String),

    /// A required text field was empty or whitespace.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// An identifier did not parse.
    #[error("invalid {kind} identifier {value:?}")]
    InvalidIdentifier {
        /// Identifier namespace (`case`, `user`).
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// An enumerated option (progress view, timeline status, policy) was unknown.
    #[error("unknown {field} {value:?}")]
    UnknownOption {
        /// Field the value was supplied for.
        field: &'static str,
        /// The rejected input.
        value: String,
    },
}
