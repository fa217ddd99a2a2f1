//! # Case Lifecycle
//!
//! A [`CaseLifecycle`] is the stage of one case together with its optimistic
//! concurrency token and the ordered log of stage transitions. Every stage
//! mutation goes through it:
//!
//! 1. The caller's `expected_version` (if any) is compared with `version`.
//! 2. The target is computed (neighbor) or checked (direct write, via
//!    [`MovePolicy`]).
//! 3. An effective change bumps `version` and appends a
//!    [`StageTransitionRecord`]. A no-op changes neither.
//!
//! Non-stage mutations of the owning record (timeline entries, acceptance)
//! call [`CaseLifecycle::touch`] so the version still advances.

use serde::{Deserialize, Serialize};

use nyay_core::Timestamp;

use crate::stage::{CaseStage, Direction};
use crate::transition::{MovePolicy, StageError};

/// One entry in a case's stage history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransitionRecord {
    /// Stage before the move.
    pub from: CaseStage,
    /// Stage after the move.
    pub to: CaseStage,
    /// Who made the move, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// When the move was applied.
    pub at: Timestamp,
    /// Record version produced by this move.
    pub version: u64,
}

/// Outcome of a stage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    /// Stage before the operation.
    pub from: CaseStage,
    /// Stage after the operation.
    pub to: CaseStage,
    /// `false` when the operation was a no-op.
    pub changed: bool,
    /// Record version after the operation.
    pub version: u64,
}

/// Stage, version token, and stage history of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseLifecycle {
    /// Current stage.
    pub stage: CaseStage,
    /// Monotonic version, starting at [`CaseLifecycle::INITIAL_VERSION`].
    pub version: u64,
    /// Ordered log of effective stage changes.
    pub history: Vec<StageTransitionRecord>,
}

impl Default for CaseLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseLifecycle {
    /// Version of a freshly created case.
    pub const INITIAL_VERSION: u64 = 1;

    /// A new case at `New Lead`.
    pub fn new() -> Self {
        Self::starting_at(CaseStage::NewLead)
    }

    /// A new case created directly at `stage` (imports, seeded data).
    pub fn starting_at(stage: CaseStage) -> Self {
        Self {
            stage,
            version: Self::INITIAL_VERSION,
            history: Vec::new(),
        }
    }

    /// Rebuild from stored parts.
    pub fn from_parts(stage: CaseStage, version: u64, history: Vec<StageTransitionRecord>) -> Self {
        Self {
            stage,
            version,
            history,
        }
    }

    /// Reject the operation if the caller's token is out of date.
    ///
    /// `None` skips the check; the commit still re-validates the version.
    pub fn check_version(&self, expected: Option<u64>) -> Result<(), StageError> {
        match expected {
            Some(expected) if expected != self.version => Err(StageError::StaleVersion {
                expected,
                actual: self.version,
            }),
            _ => Ok(()),
        }
    }

    /// Move one step toward `Closed`. A no-op at `Closed`.
    pub fn advance(
        &mut self,
        expected_version: Option<u64>,
        actor: Option<&str>,
    ) -> Result<StageChange, StageError> {
        self.step(Direction::Forward, expected_version, actor)
    }

    /// Move one step toward `New Lead`. A no-op at `New Lead`.
    pub fn retreat(
        &mut self,
        expected_version: Option<u64>,
        actor: Option<&str>,
    ) -> Result<StageChange, StageError> {
        self.step(Direction::Backward, expected_version, actor)
    }

    /// Move one step in `direction`.
    pub fn step(
        &mut self,
        direction: Direction,
        expected_version: Option<u64>,
        actor: Option<&str>,
    ) -> Result<StageChange, StageError> {
        self.check_version(expected_version)?;
        match self.stage.step(direction) {
            Some(target) => Ok(self.apply(target, actor)),
            None => Ok(self.unchanged()),
        }
    }

    /// Write an explicit target stage, subject to `policy`.
    ///
    /// Writing the current stage is a no-op.
    pub fn move_to(
        &mut self,
        target: CaseStage,
        policy: MovePolicy,
        expected_version: Option<u64>,
        actor: Option<&str>,
    ) -> Result<StageChange, StageError> {
        self.check_version(expected_version)?;
        if target == self.stage {
            return Ok(self.unchanged());
        }
        policy.check(self.stage, target)?;
        Ok(self.apply(target, actor))
    }

    /// Acceptance by a lawyer: a `New Lead` moves to `Discovery`, any other
    /// stage is left alone. Always bumps the version.
    pub fn accept(&mut self, actor: Option<&str>) -> StageChange {
        if self.stage == CaseStage::NewLead {
            self.apply(CaseStage::Discovery, actor)
        } else {
            let from = self.stage;
            let version = self.touch();
            StageChange {
                from,
                to: from,
                changed: false,
                version,
            }
        }
    }

    /// Bump the version for a non-stage mutation. Returns the new version.
    pub fn touch(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    fn apply(&mut self, target: CaseStage, actor: Option<&str>) -> StageChange {
        let from = self.stage;
        let version = self.touch();
        self.history.push(StageTransitionRecord {
            from,
            to: target,
            actor: actor.map(str::to_string),
            at: Timestamp::now(),
            version,
        });
        self.stage = target;
        StageChange {
            from,
            to: target,
            changed: true,
            version,
        }
    }

    fn unchanged(&self) -> StageChange {
        StageChange {
            from: self.stage,
            to: self.stage,
            changed: false,
            version: self.version,
        }
    }
}
