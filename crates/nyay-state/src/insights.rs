//! Lawyer workload and per-case health, derived from the case records alone.
//!
//! Health starts at 100 and loses points for staleness (no update for more
//! than a week) and for a thin timeline (fewer than two entries). Cases are
//! ranked worst first so the board can surface what needs attention.

use serde::{Deserialize, Serialize};

use nyay_core::Timestamp;

use crate::stage::CaseStage;

/// Score of a case with no issues.
pub const FULL_HEALTH: u8 = 100;
/// A case is stale once this many whole days have passed without an update.
pub const STALE_AFTER_DAYS: i64 = 7;
/// A timeline shorter than this is incomplete.
pub const MIN_TIMELINE_ENTRIES: usize = 2;

const STALE_PENALTY: u8 = 10;
const THIN_TIMELINE_PENALTY: u8 = 5;
const BALANCED_ABOVE: usize = 5;
const OVERLOADED_ABOVE: usize = 15;

/// Workload band by number of active (not `Closed`) cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadStatus {
    /// Up to 5 active cases.
    Light,
    /// 6 to 15.
    Balanced,
    /// More than 15.
    Overloaded,
}

impl WorkloadStatus {
    /// Band for `active` open matters.
    pub fn for_active(active: usize) -> Self {
        if active > OVERLOADED_ABOVE {
            Self::Overloaded
        } else if active > BALANCED_ABOVE {
            Self::Balanced
        } else {
            Self::Light
        }
    }
}

/// Workload summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub status: WorkloadStatus,
    pub active_cases: usize,
}

/// A reason a case lost health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthIssue {
    /// No update for more than [`STALE_AFTER_DAYS`].
    NoRecentActivity,
    /// Fewer than [`MIN_TIMELINE_ENTRIES`] timeline entries.
    TimelineIncomplete,
}

impl std::fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoRecentActivity => "No activity for 7+ days",
            Self::TimelineIncomplete => "Timeline incomplete",
        })
    }
}

/// Suggested next step for the lawyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    MonitorCase,
    FollowUpWithClient,
    UpdateCaseStage,
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MonitorCase => "Monitor case",
            Self::FollowUpWithClient => "Follow up with client",
            Self::UpdateCaseStage => "Update case stage",
        })
    }
}

/// What health is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseActivity {
    pub stage: CaseStage,
    pub updated_at: Timestamp,
    pub timeline_len: usize,
}

/// Health of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseHealth {
    /// 0 to 100.
    pub score: u8,
    pub issues: Vec<HealthIssue>,
    pub next_action: NextAction,
}

/// Score a single case as of `now`.
///
/// A thin timeline outranks staleness when picking the next action.
pub fn case_health(activity: &CaseActivity, now: Timestamp) -> CaseHealth {
    let mut score = FULL_HEALTH;
    let mut issues = Vec::new();
    let mut next_action = NextAction::MonitorCase;

    if now.whole_days_since(&activity.updated_at) > STALE_AFTER_DAYS {
        score = score.saturating_sub(STALE_PENALTY);
        issues.push(HealthIssue::NoRecentActivity);
        next_action = NextAction::FollowUpWithClient;
    }
    if activity.timeline_len < MIN_TIMELINE_ENTRIES {
        score = score.saturating_sub(THIN_TIMELINE_PENALTY);
        issues.push(HealthIssue::TimelineIncomplete);
        next_action = NextAction::UpdateCaseStage;
    }

    CaseHealth {
        score,
        issues,
        next_action,
    }
}

/// One case with its health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCase<T> {
    pub item: T,
    pub health: CaseHealth,
}

/// Workload plus every case ranked by health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights<T> {
    pub workload: Workload,
    /// Lowest score first; ties keep input order.
    pub cases: Vec<RankedCase<T>>,
}

/// Compute workload and rank `items` worst first.
pub fn insights<T, F>(
    items: impl IntoIterator<Item = T>,
    activity_of: F,
    now: Timestamp,
) -> Insights<T>
where
    F: Fn(&T) -> CaseActivity,
{
    let mut active_cases = 0;
    let mut cases: Vec<RankedCase<T>> = items
        .into_iter()
        .map(|item| {
            let activity = activity_of(&item);
            if !activity.stage.is_terminal() {
                active_cases += 1;
            }
            RankedCase {
                health: case_health(&activity, now),
                item,
            }
        })
        .collect();
    cases.sort_by_key(|c| c.health.score);

    Insights {
        workload: Workload {
            status: WorkloadStatus::for_active(active_cases),
            active_cases,
        },
        cases,
    }
}
