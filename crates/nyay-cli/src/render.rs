//! Plain-text rendering of cases, progress strips and the board.
//!
//! Everything here is pure: input in, `String` out. Step markers are
//! `[x]` completed, `[>]` current, `[ ]` upcoming.

use nyay_state::{progress, CaseStage, ProgressView, StageProgress, StepStatus};

use crate::client::{Board, Case};

fn marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "[x]",
        StepStatus::Current => "[>]",
        StepStatus::Upcoming => "[ ]",
    }
}

fn short_id(case: &Case) -> String {
    case.id.to_string().chars().take(8).collect()
}

/// The ordered stage list, one per line.
pub fn stages() -> String {
    CaseStage::ALL
        .iter()
        .enumerate()
        .map(|(i, stage)| format!("{}. {stage}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A progress strip with its bar fill and, for the trust view, the status
/// sentence.
pub fn progress_strip(progress: &StageProgress) -> String {
    let strip = progress
        .steps
        .iter()
        .map(|step| format!("{} {}", marker(step.status), step.label))
        .collect::<Vec<_>>()
        .join(" - ");

    let mut lines = vec![strip, format!("{}% complete", progress.percent_complete)];
    if let Some(message) = &progress.message {
        lines.push(message.clone());
    }
    lines.join("\n")
}

/// Tabular case list.
pub fn case_table(cases: &[Case]) -> String {
    if cases.is_empty() {
        return "no cases".to_string();
    }
    let mut lines = vec![format!(
        "{:<8}  {:<10}  {:>3}  {:<8}  {}",
        "ID", "STAGE", "VER", "STATUS", "TITLE"
    )];
    for case in cases {
        let status = if case.accepted_by.is_some() { "accepted" } else { "open" };
        lines.push(format!(
            "{:<8}  {:<10}  {:>3}  {:<8}  {}",
            short_id(case),
            case.stage.as_str(),
            case.version,
            status,
            case.title
        ));
    }
    lines.join("\n")
}

/// One case in detail, with its client trust timeline and timeline entries.
pub fn case_detail(case: &Case) -> String {
    let mut lines = vec![
        format!("{} ({})", case.title, case.id),
        format!("  stage:     {} (version {})", case.stage, case.version),
        format!("  category:  {}", case.category),
    ];
    if !case.location.is_empty() {
        lines.push(format!("  location:  {}", case.location));
    }
    if !case.posted_by.is_empty() {
        lines.push(format!("  posted by: {}", case.posted_by));
    }
    match &case.accepted_by {
        Some(lawyer) => lines.push(format!("  lawyer:    {lawyer}")),
        None => lines.push("  lawyer:    (open)".to_string()),
    }
    lines.push(format!(
        "  updated:   {}",
        case.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    lines.push(String::new());
    lines.push(progress_strip(&progress(ProgressView::Trust, case.stage)));

    if !case.timeline.is_empty() {
        lines.push(String::new());
        lines.push("Timeline:".to_string());
        for entry in &case.timeline {
            lines.push(format!(
                "  {}  [{}] {}",
                entry.date.date_string(),
                entry.status,
                entry.title
            ));
            if !entry.description.is_empty() {
                lines.push(format!("      {}", entry.description));
            }
        }
    }
    lines.join("\n")
}

/// Kanban board: one section per stage, empty columns included.
pub fn board(board: &Board) -> String {
    let mut lines = vec![format!(
        "{} active / {} total",
        board.active_count, board.total
    )];
    for column in &board.columns {
        lines.push(String::new());
        lines.push(format!("== {} ({}) ==", column.stage, column.count));
        if column.cases.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for case in &column.cases {
            lines.push(format!("  {}  {}", short_id(case), case.title));
        }
    }
    lines.join("\n")
}
