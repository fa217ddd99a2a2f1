//! # Case Stages
//!
//! The six lifecycle stages in their fixed order. The order is the contract:
//! it defines position on every progress view and the direction of every
//! move. Index 0 is `New Lead`, index 5 is `Closed`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use nyay_core::ValidationError;

/// A case's position in the six-step lifecycle.
///
/// `Ord` follows declaration order, so `NewLead < Discovery < … < Closed`.
/// Serializes as the display string (`"New Lead"`, `"Discovery"`, …).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum CaseStage {
    /// Unaccepted or freshly accepted matter. Default for new cases.
    #[default]
    #[serde(rename = "New Lead")]
    NewLead,
    /// Gathering evidence and facts.
    Discovery,
    /// Preparing and filing court documents.
    Filing,
    /// Court sessions in progress.
    Hearing,
    /// Awaiting or received judgment.
    Judgment,
    /// Matter closed. Terminal by convention only.
    Closed,
}

/// Direction of a single-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward `Closed`.
    Forward,
    /// Toward `New Lead`.
    Backward,
}

impl CaseStage {
    /// All stages in lifecycle order.
    pub const ALL: [CaseStage; 6] = [
        Self::NewLead,
        Self::Discovery,
        Self::Filing,
        Self::Hearing,
        Self::Judgment,
        Self::Closed,
    ];

    /// Number of stages.
    pub const COUNT: usize = 6;

    /// Zero-based position in the lifecycle.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stage at a zero-based position, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The wire/display string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewLead => "New Lead",
            Self::Discovery => "Discovery",
            Self::Filing => "Filing",
            Self::Hearing => "Hearing",
            Self::Judgment => "Judgment",
            Self::Closed => "Closed",
        }
    }

    /// The following stage, or `None` from `Closed`.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// The preceding stage, or `None` from `New Lead`.
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    /// Neighbor in the given direction.
    pub fn step(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::Forward => self.next(),
            Direction::Backward => self.previous(),
        }
    }

    /// One step forward; `Closed` stays `Closed`.
    pub fn advance(self) -> Self {
        self.next().unwrap_or(self)
    }

    /// One step back; `New Lead` stays `New Lead`.
    pub fn retreat(self) -> Self {
        self.previous().unwrap_or(self)
    }

    /// Whether an advance would change anything.
    pub fn can_advance(self) -> bool {
        self.next().is_some()
    }

    /// Whether a retreat would change anything.
    pub fn can_retreat(self) -> bool {
        self.previous().is_some()
    }

    /// `Closed`. Moving back out of it is still allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Number of single steps between two stages.
    pub fn distance(self, other: Self) -> usize {
        self.index().abs_diff(other.index())
    }

    /// Resolve a possibly-absent stored value. Absence means `New Lead`.
    pub fn from_stored(stored: Option<&str>) -> Result<Self, ValidationError> {
        match stored {
            None => Ok(Self::NewLead),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for CaseStage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStage(s.to_string()))
    }
}

impl std::fmt::Display for CaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Backward => f.write_str("backward"),
        }
    }
}
