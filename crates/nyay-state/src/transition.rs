//! # Transition Rules
//!
//! Advance and retreat are always single steps. Direct writes (`PATCH
//! /stage` with an explicit target) go through a [`MovePolicy`]:
//!
//! - [`MovePolicy::Adjacent`]: the target must be the current stage or one
//!   of its two neighbors.
//! - [`MovePolicy::Any`]: any stage may be written.
//!
//! Out-of-list values never reach this module; they fail to parse into a
//! [`CaseStage`] first.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use nyay_core::ValidationError;

use crate::stage::CaseStage;

/// Errors from stage transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The move is not permitted from the current stage.
    #[error("invalid stage transition {from} -> {to}: {reason}")]
    InvalidTransition {
        /// Stage the case is at.
        from: CaseStage,
        /// Stage that was requested.
        to: CaseStage,
        /// Why it was rejected.
        reason: String,
    },

    /// The caller's version token no longer matches the stored record.
    #[error("stale version: expected {expected}, case is at version {actual}")]
    StaleVersion {
        /// Version the caller last saw.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
}

/// Which explicit stage writes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePolicy {
    /// Same stage or one step either way.
    #[default]
    Adjacent,
    /// Any member of the stage list.
    Any,
}

impl MovePolicy {
    /// Check a direct write from `from` to `to`.
    pub fn check(self, from: CaseStage, to: CaseStage) -> Result<(), StageError> {
        match self {
            Self::Any => Ok(()),
            Self::Adjacent => {
                let steps = from.distance(to);
                if steps <= 1 {
                    Ok(())
                } else {
                    Err(StageError::InvalidTransition {
                        from,
                        to,
                        reason: format!(
                            "stages move one step at a time; this skips {} stages",
                            steps - 1
                        ),
                    })
                }
            }
        }
    }

    /// Configuration string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adjacent => "adjacent",
            Self::Any => "any",
        }
    }
}

impl FromStr for MovePolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adjacent" => Ok(Self::Adjacent),
            "any" => Ok(Self::Any),
            _ => Err(ValidationError::UnknownOption {
                field: "stage policy",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for MovePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_allows_neighbors_and_self() {
        let p = MovePolicy::Adjacent;
        assert!(p.check(CaseStage::Filing, CaseStage::Hearing).is_ok());
        assert!(p.check(CaseStage::Filing, CaseStage::Discovery).is_ok());
        assert!(p.check(CaseStage::Filing, CaseStage::Filing).is_ok());
    }

    #[test]
    fn adjacent_rejects_skips() {
        let err = MovePolicy::Adjacent
            .check(CaseStage::NewLead, CaseStage::Hearing)
            .unwrap_err();
        match err {
            StageError::InvalidTransition { from, to, reason } => {
                assert_eq!(from, CaseStage::NewLead);
                assert_eq!(to, CaseStage::Hearing);
                assert!(reason.contains("skips 2"), "{reason}");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert!(MovePolicy::Adjacent
            .check(CaseStage::Closed, CaseStage::Filing)
            .is_err());
    }

    #[test]
    fn any_allows_everything() {
        for from in CaseStage::ALL {
            for to in CaseStage::ALL {
                assert!(MovePolicy::Any.check(from, to).is_ok());
            }
        }
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("ANY".parse::<MovePolicy>().unwrap(), MovePolicy::Any);
        assert_eq!(" adjacent ".parse::<MovePolicy>().unwrap(), MovePolicy::Adjacent);
        assert!("strict".parse::<MovePolicy>().is_err());
        assert_eq!(MovePolicy::default(), MovePolicy::Adjacent);
    }

    #[test]
    fn stale_version_message() {
        let err = StageError::StaleVersion { expected: 2, actual: 3 };
        assert_eq!(
            err.to_string(),
            "stale version: expected 2, case is at version 3"
        );
    }
}
