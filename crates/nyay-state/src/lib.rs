//! # nyay-state: Case Stage State Machine
//!
//! Every case sits at one of six ordered stages:
//!
//! ```text
//! New Lead ──▶ Discovery ──▶ Filing ──▶ Hearing ──▶ Judgment ──▶ Closed
//!     ◀──────────  ◀──────────  ◀────────  ◀─────────  ◀──────────
//! ```
//!
//! Moves are one step forward (advance) or one step back (retreat). The
//! stage is a closed enum: there is no string-typed stage anywhere past the
//! parsing boundary, so an out-of-list value is a [`ValidationError`], not a
//! stored value.
//!
//! ## Modules
//!
//! - [`stage`]: the [`CaseStage`] enum, ordering, neighbors, parsing.
//! - [`transition`]: [`MovePolicy`] for direct writes and [`StageError`].
//! - [`lifecycle`]: [`CaseLifecycle`], the stage + version token + history
//!   triple that every mutation goes through.
//! - [`progress`]: the single `completed / current / upcoming`
//!   classification and the three presentation views built on it.
//! - [`board`]: grouping of cases into Kanban columns.
//! - [`timeline`]: free-form timeline entries attached to a case.
//! - [`insights`]: lawyer workload band and per-case health ranking.
//!
//! ## Design Decision
//!
//! Six sequential stages with bidirectional single steps are modeled as an
//! enum with validated transitions rather than typestate. Stage values arrive
//! over HTTP and from storage at runtime, so the checks have to be runtime
//! checks anyway; the enum keeps them in one place.
//!
//! [`ValidationError`]: nyay_core::ValidationError

pub mod board;
pub mod insights;
pub mod lifecycle;
pub mod progress;
pub mod stage;
pub mod timeline;
pub mod transition;

pub use board::{group_by_stage, BoardColumn};
pub use lifecycle::{CaseLifecycle, StageChange, StageTransitionRecord};
pub use insights::{
    case_health, insights, CaseActivity, CaseHealth, HealthIssue, Insights, NextAction, RankedCase,
    Workload, WorkloadStatus,
};
pub use progress::{
    classify, classify_step, progress, ProgressStep, ProgressView, StageProgress, StepStatus,
};
pub use stage::{CaseStage, Direction};
pub use timeline::{TimelineEntry, TimelineStatus};
pub use transition::{MovePolicy, StageError};
