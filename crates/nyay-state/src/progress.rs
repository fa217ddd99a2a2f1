//! # Stage Progress Classification
//!
//! One pure function decides how each step of a progress strip is drawn:
//!
//! | Step index vs. current index | Status      |
//! |------------------------------|-------------|
//! | `<`                          | `completed` |
//! | `==`                         | `current`   |
//! | `>`                          | `upcoming`  |
//!
//! The three views differ only in which steps they show and how they label
//! them; all of them go through [`classify`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use nyay_core::ValidationError;

use crate::stage::CaseStage;

/// Visual status of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Before the current stage.
    Completed,
    /// The current stage.
    Current,
    /// After the current stage.
    Upcoming,
}

impl StepStatus {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Current => "current",
            Self::Upcoming => "upcoming",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single step relative to `current`.
pub fn classify_step(current: CaseStage, step: CaseStage) -> StepStatus {
    match step.index().cmp(&current.index()) {
        std::cmp::Ordering::Less => StepStatus::Completed,
        std::cmp::Ordering::Equal => StepStatus::Current,
        std::cmp::Ordering::Greater => StepStatus::Upcoming,
    }
}

/// Statuses for a visible subset of steps, in the order given.
pub fn classify(visible: &[CaseStage], current: CaseStage) -> Vec<StepStatus> {
    visible
        .iter()
        .map(|step| classify_step(current, *step))
        .collect()
}

/// Which progress strip is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressView {
    /// Lawyer Kanban board: all six stages.
    #[default]
    Board,
    /// Lawyer case timeline: `Discovery` through `Closed`.
    Timeline,
    /// Client trust timeline: `New Lead` through `Judgment`, plain-language labels.
    Trust,
}

const BOARD_STEPS: &[CaseStage] = &CaseStage::ALL;

const TIMELINE_STEPS: &[CaseStage] = &[
    CaseStage::Discovery,
    CaseStage::Filing,
    CaseStage::Hearing,
    CaseStage::Judgment,
    CaseStage::Closed,
];

const TRUST_STEPS: &[CaseStage] = &[
    CaseStage::NewLead,
    CaseStage::Discovery,
    CaseStage::Filing,
    CaseStage::Hearing,
    CaseStage::Judgment,
];

impl ProgressView {
    /// All views.
    pub const ALL: [ProgressView; 3] = [Self::Board, Self::Timeline, Self::Trust];

    /// Visible steps, in display order.
    pub fn steps(self) -> &'static [CaseStage] {
        match self {
            Self::Board => BOARD_STEPS,
            Self::Timeline => TIMELINE_STEPS,
            Self::Trust => TRUST_STEPS,
        }
    }

    /// Label shown for `stage` in this view.
    pub fn label(self, stage: CaseStage) -> &'static str {
        match self {
            Self::Board | Self::Timeline => stage.as_str(),
            Self::Trust => match stage {
                CaseStage::NewLead => "Reviewing",
                CaseStage::Discovery => "Fact Finding",
                CaseStage::Filing => "Paperwork",
                CaseStage::Hearing => "In Court",
                CaseStage::Judgment => "Finalizing",
                CaseStage::Closed => "Closed",
            },
        }
    }

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::Timeline => "timeline",
            Self::Trust => "trust",
        }
    }
}

impl FromStr for ProgressView {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownOption {
                field: "progress view",
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for ProgressView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-facing sentence describing what is happening at `stage`.
pub fn trust_message(stage: CaseStage) -> &'static str {
    match stage {
        CaseStage::NewLead => "Your lawyer is reviewing the initial details.",
        CaseStage::Discovery => "Gathering evidence and facts for the case.",
        CaseStage::Filing => "Preparing official documents for the court.",
        CaseStage::Hearing => "Representing your case in court sessions.",
        CaseStage::Judgment => "Awaiting final judgment or settlement.",
        CaseStage::Closed => "This matter has been closed.",
    }
}

/// One drawn step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStep {
    /// 1-based position in the strip.
    pub position: usize,
    /// Underlying stage.
    pub stage: CaseStage,
    /// View-specific label.
    pub label: String,
    /// Classification relative to the current stage.
    pub status: StepStatus,
}

/// A fully classified progress strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    /// View that was drawn.
    pub view: ProgressView,
    /// The case's stage.
    pub current: CaseStage,
    /// Steps in display order.
    pub steps: Vec<ProgressStep>,
    /// Fill of the connecting bar, 0–100.
    pub percent_complete: u8,
    /// Status sentence; trust view only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Classify every visible step of `view` for a case at `current`.
///
/// The bar fill counts reached steps (completed or current): the first
/// reached step is 0%, the last visible step is 100%. A stage past the end
/// of the view (e.g. `Closed` on the trust view) fills the bar.
pub fn progress(view: ProgressView, current: CaseStage) -> StageProgress {
    let visible = view.steps();
    let statuses = classify(visible, current);
    let steps: Vec<ProgressStep> = visible
        .iter()
        .zip(&statuses)
        .enumerate()
        .map(|(i, (stage, status))| ProgressStep {
            position: i + 1,
            stage: *stage,
            label: view.label(*stage).to_string(),
            status: *status,
        })
        .collect();

    let reached = statuses
        .iter()
        .filter(|s| **s != StepStatus::Upcoming)
        .count();
    let span = visible.len().saturating_sub(1).max(1);
    let percent_complete = (reached.saturating_sub(1).min(span) * 100 / span) as u8;

    let message = match view {
        ProgressView::Trust => Some(trust_message(current).to_string()),
        _ => None,
    };

    StageProgress {
        view,
        current,
        steps,
        percent_complete,
        message,
    }
}
