//! Subcommand definitions and their handlers.
//!
//! Handlers return the text to print so that they can be exercised
//! against a mock server.

use anyhow::{bail, Context};
use clap::Subcommand;

use nyay_core::{CaseId, UserId};
use nyay_state::{CaseStage, Direction, ProgressView};

use crate::client::{CaseFilter, NyayClient};
use crate::render;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the ordered stage list.
    Stages,

    /// List cases, newest first.
    List {
        /// Only cases posted by this handle.
        #[arg(long)]
        posted_by: Option<String>,
        /// Only cases no lawyer has accepted yet.
        #[arg(long)]
        open: bool,
        /// Only cases at this stage (e.g. "New Lead").
        #[arg(long)]
        stage: Option<String>,
    },

    /// Show one case with its progress and timeline.
    Show {
        /// Case ID.
        id: String,
    },

    /// Move a case one stage forward.
    Advance {
        /// Case ID.
        id: String,
    },

    /// Move a case one stage back.
    Retreat {
        /// Case ID.
        id: String,
    },

    /// Write an explicit stage.
    SetStage {
        /// Case ID.
        id: String,
        /// Target stage (e.g. "Hearing").
        stage: String,
    },

    /// Show the Kanban board.
    Board {
        /// Only cases worked by this lawyer.
        #[arg(long)]
        lawyer_id: Option<String>,
    },

    /// Show a case's progress strip.
    Progress {
        /// Case ID.
        id: String,
        /// board, timeline, or trust.
        #[arg(long, default_value = "board")]
        view: String,
    },
}

/// Run `command` and return its output.
pub async fn run(client: &NyayClient, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Stages => Ok(render::stages()),
        Command::List {
            posted_by,
            open,
            stage,
        } => {
            let filter = CaseFilter {
                posted_by,
                open: open.then_some(true),
                stage: stage
                    .as_deref()
                    .map(str::parse::<CaseStage>)
                    .transpose()?,
            };
            let cases = client.list_cases(&filter).await?;
            Ok(render::case_table(&cases))
        }
        Command::Show { id } => {
            let case = client.get_case(parse_case_id(&id)?).await?;
            Ok(render::case_detail(&case))
        }
        Command::Advance { id } => step(client, &id, Direction::Forward).await,
        Command::Retreat { id } => step(client, &id, Direction::Backward).await,
        Command::SetStage { id, stage } => {
            let id = parse_case_id(&id)?;
            let target: CaseStage = stage.parse()?;
            let current = client.get_case(id).await?;
            let moved = client.set_stage(id, target, Some(current.version)).await?;
            let case = client.get_case(id).await?;
            Ok(moved_message(moved.changed, current.stage, &case))
        }
        Command::Board { lawyer_id } => {
            let lawyer_id = lawyer_id
                .as_deref()
                .map(str::parse::<UserId>)
                .transpose()?;
            let board = client.board(lawyer_id).await?;
            Ok(render::board(&board))
        }
        Command::Progress { id, view } => {
            let view: ProgressView = view.parse()?;
            let report = client.progress(parse_case_id(&id)?, view).await?;
            Ok(render::progress_strip(&report.progress))
        }
    }
}

fn parse_case_id(raw: &str) -> anyhow::Result<CaseId> {
    raw.parse::<CaseId>()
        .with_context(|| format!("'{raw}' is not a case ID"))
}

/// The stage one step from `stage`, or an error at the ends.
pub fn neighbor(stage: CaseStage, direction: Direction) -> anyhow::Result<CaseStage> {
    match direction {
        Direction::Forward if stage.can_advance() => Ok(stage.advance()),
        Direction::Backward if stage.can_retreat() => Ok(stage.retreat()),
        Direction::Forward => bail!("case is already at {stage}; cannot advance"),
        Direction::Backward => bail!("case is already at {stage}; cannot retreat"),
    }
}

/// Fetch, compute the neighbor locally, write it with the fetched version,
/// and refetch.
async fn step(client: &NyayClient, raw_id: &str, direction: Direction) -> anyhow::Result<String> {
    let id = parse_case_id(raw_id)?;
    let current = client.get_case(id).await?;
    let target = neighbor(current.stage, direction)?;
    tracing::info!(case_id = %id, from = %current.stage, to = %target, "moving case");

    let moved = client.set_stage(id, target, Some(current.version)).await?;
    let case = client.get_case(id).await?;
    Ok(moved_message(moved.changed, current.stage, &case))
}

fn moved_message(changed: bool, from: CaseStage, case: &crate::client::Case) -> String {
    let headline = if changed {
        format!("{}: {from} -> {} (version {})", case.title, case.stage, case.version)
    } else {
        format!("{}: already at {} (version {})", case.title, case.stage, case.version)
    };
    format!(
        "{headline}\n{}",
        render::progress_strip(&nyay_state::progress(ProgressView::Board, case.stage))
    )
}
