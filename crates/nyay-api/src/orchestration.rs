//! # Case Mutation Orchestration
//!
//! Every write to a case record follows the same sequence:
//!
//! 1. **Snapshot**: clone the current record out of the store.
//! 2. **Apply**: run the operation against the snapshot. Authorization,
//!    the caller's `expected_version`, and the stage rules are all checked
//!    here; a failure leaves nothing to undo.
//! 3. **Persist**: if a database is configured, write the new record with
//!    `WHERE version = <snapshot version>`. A miss is a stale version.
//! 4. **Commit**: swap the record into the store under the write lock,
//!    re-checking that the stored version is still the snapshot's.
//!
//! An operation that does not bump the version (a no-op move) skips
//! steps 3 and 4. Two concurrent movers on the same base version cannot
//! both commit: the loser gets `STALE_VERSION`.

use uuid::Uuid;

use nyay_core::CaseId;
use nyay_state::{CaseStage, Direction, StageChange, TimelineEntry};

use crate::auth::{require_case_access, require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::middleware::metrics::record_stage_change;
use crate::state::{AppState, CaseRecord};

/// A requested stage move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMove {
    /// One step in a direction; a no-op at the ends.
    Step(Direction),
    /// Explicit target, checked against the configured move policy.
    To(CaseStage),
}

/// Create a case: persist, then insert.
pub async fn create_case(state: &AppState, record: CaseRecord) -> Result<CaseRecord, AppError> {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::cases::insert(pool, &record).await {
            tracing::error!(case_id = %record.id, error = %e, "failed to persist new case");
            return Err(AppError::Internal("case persist failed".to_string()));
        }
    }
    state.cases.insert(record.key(), record.clone());
    tracing::info!(case_id = %record.id, stage = %record.stage, "case created");
    Ok(record)
}

/// Apply `op` to a snapshot of case `id`, persist, and commit.
///
/// Returns the committed record (or the untouched snapshot for a no-op)
/// together with the operation's result.
pub async fn mutate_case<R>(
    state: &AppState,
    id: CaseId,
    op: impl FnOnce(&mut CaseRecord) -> Result<R, AppError>,
) -> Result<(CaseRecord, R), AppError> {
    let key: Uuid = *id.as_uuid();
    let mut next = state
        .cases
        .get(&key)
        .ok_or_else(|| AppError::NotFound(format!("case {id} not found")))?;
    let base_version = next.version;

    let outcome = op(&mut next)?;
    if next.version == base_version {
        return Ok((next, outcome));
    }

    if let Some(pool) = &state.db_pool {
        let written = crate::db::cases::update(pool, &next, base_version)
            .await
            .map_err(|e| {
                tracing::error!(case_id = %id, error = %e, "failed to persist case update");
                AppError::Internal("case persist failed".to_string())
            })?;
        if !written {
            let actual = crate::db::cases::current_version(pool, key)
                .await
                .map_err(|e| {
                    tracing::error!(case_id = %id, error = %e, "failed to read case version");
                    AppError::Internal("case version lookup failed".to_string())
                })?
                .ok_or_else(|| AppError::NotFound(format!("case {id} not found")))?;
            return Err(AppError::StaleVersion {
                expected: base_version,
                actual,
            });
        }
    }

    state
        .cases
        .try_update(&key, |current| {
            if current.version != base_version {
                return Err(AppError::StaleVersion {
                    expected: base_version,
                    actual: current.version,
                });
            }
            *current = next.clone();
            Ok(())
        })
        .ok_or_else(|| AppError::NotFound(format!("case {id} not found")))??;

    Ok((next, outcome))
}

/// Move a case's stage on behalf of `caller`.
pub async fn move_stage(
    state: &AppState,
    caller: &CallerIdentity,
    id: CaseId,
    requested: StageMove,
    expected_version: Option<u64>,
) -> Result<(CaseRecord, StageChange), AppError> {
    let policy = state.config.stage_policy;
    let actor = caller.actor();

    let (case, change) = mutate_case(state, id, |case| {
        require_case_access(caller, case)?;
        let mut lifecycle = case.lifecycle();
        let change = match requested {
            StageMove::Step(direction) => {
                lifecycle.step(direction, expected_version, Some(&actor))?
            }
            StageMove::To(target) => {
                lifecycle.move_to(target, policy, expected_version, Some(&actor))?
            }
        };
        case.set_lifecycle(lifecycle);
        Ok(change)
    })
    .await?;

    record_stage_change(&change);
    if change.changed {
        tracing::info!(
            case_id = %id,
            from = %change.from,
            to = %change.to,
            version = change.version,
            actor = %actor,
            "case stage changed"
        );
    } else {
        tracing::debug!(case_id = %id, stage = %change.to, "stage move was a no-op");
    }
    Ok((case, change))
}

/// A lawyer accepts an open case. `New Lead` moves to `Discovery`.
pub async fn accept_case(
    state: &AppState,
    caller: &CallerIdentity,
    id: CaseId,
    accepted_by: Option<String>,
    expected_version: Option<u64>,
) -> Result<(CaseRecord, StageChange), AppError> {
    require_role(caller, Role::Lawyer)?;
    let actor = caller.actor();
    let handle = accepted_by
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| actor.clone());

    let (case, change) = mutate_case(state, id, |case| {
        if !case.is_open() {
            return Err(AppError::Conflict(format!("case {id} has already been accepted")));
        }
        let mut lifecycle = case.lifecycle();
        lifecycle.check_version(expected_version)?;
        let change = lifecycle.accept(Some(&actor));
        case.accepted_by = Some(handle);
        case.lawyer_id = caller.user_id;
        case.set_lifecycle(lifecycle);
        Ok(change)
    })
    .await?;

    record_stage_change(&change);
    tracing::info!(case_id = %id, actor = %actor, stage = %case.stage, "case accepted");
    Ok((case, change))
}

/// Append a timeline entry. The stage is not touched; the version is.
pub async fn append_timeline(
    state: &AppState,
    caller: &CallerIdentity,
    id: CaseId,
    entry: TimelineEntry,
) -> Result<CaseRecord, AppError> {
    let (case, ()) = mutate_case(state, id, |case| {
        require_case_access(caller, case)?;
        case.timeline.push(entry);
        let mut lifecycle = case.lifecycle();
        lifecycle.touch();
        case.set_lifecycle(lifecycle);
        Ok(())
    })
    .await?;

    tracing::info!(case_id = %id, entries = case.timeline.len(), "timeline entry added");
    Ok(case)
}
