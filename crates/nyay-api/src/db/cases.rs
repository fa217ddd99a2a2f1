//! Case persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `cases` table. Stage
//! rules are enforced by `nyay-state` before anything reaches SQL; the
//! table's CHECK constraint only guards against out-of-band writes.
//!
//! Updates are conditional on the version the caller read
//! (`WHERE version = $n`), so two writers racing on the same base version
//! cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use nyay_core::{CaseId, UserId};
use nyay_state::{CaseStage, StageTransitionRecord, TimelineEntry};

use crate::state::CaseRecord;

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize case {what}: {e}")))
}

fn to_db_version(version: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(version)
        .map_err(|_| sqlx::Error::Protocol(format!("case version {version} out of range")))
}

/// Insert a new case record.
pub async fn insert(pool: &PgPool, record: &CaseRecord) -> Result<(), sqlx::Error> {
    let history = to_json(&record.stage_history, "stage_history")?;
    let timeline = to_json(&record.timeline, "timeline")?;

    sqlx::query(
        "INSERT INTO cases (id, title, description, category, location, budget, posted_by,
                            accepted_by, client_id, lawyer_id, stage, version, stage_history,
                            timeline, posted_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(record.key())
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.category)
    .bind(&record.location)
    .bind(&record.budget)
    .bind(&record.posted_by)
    .bind(&record.accepted_by)
    .bind(record.client_id.map(|id| *id.as_uuid()))
    .bind(record.lawyer_id.map(|id| *id.as_uuid()))
    .bind(record.stage.as_str())
    .bind(to_db_version(record.version)?)
    .bind(&history)
    .bind(&timeline)
    .bind(record.posted_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the mutable fields of a case, provided the stored version is
/// still `base_version`.
///
/// Returns `false` when no row matched (the case moved on, or is missing).
pub async fn update(
    pool: &PgPool,
    record: &CaseRecord,
    base_version: u64,
) -> Result<bool, sqlx::Error> {
    let history = to_json(&record.stage_history, "stage_history")?;
    let timeline = to_json(&record.timeline, "timeline")?;

    let result = sqlx::query(
        "UPDATE cases
         SET accepted_by = $1, lawyer_id = $2, stage = $3, version = $4,
             stage_history = $5, timeline = $6, updated_at = $7
         WHERE id = $8 AND version = $9",
    )
    .bind(&record.accepted_by)
    .bind(record.lawyer_id.map(|id| *id.as_uuid()))
    .bind(record.stage.as_str())
    .bind(to_db_version(record.version)?)
    .bind(&history)
    .bind(&timeline)
    .bind(record.updated_at)
    .bind(record.key())
    .bind(to_db_version(base_version)?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Current stored version of a case, if it exists.
pub async fn current_version(pool: &PgPool, id: Uuid) -> Result<Option<u64>, sqlx::Error> {
    let version: Option<i64> = sqlx::query_scalar("SELECT version FROM cases WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    version.map(from_db_version).transpose()
}

/// Load all cases on startup, oldest first.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CaseRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CaseRow>(
        "SELECT id, title, description, category, location, budget, posted_by, accepted_by,
                client_id, lawyer_id, stage, version, stage_history, timeline, posted_at, updated_at
         FROM cases ORDER BY posted_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CaseRow::into_record).collect()
}

fn from_db_version(version: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(version)
        .map_err(|_| sqlx::Error::Protocol(format!("negative case version {version} in database")))
}

fn decode_error(id: Uuid, err: serde_json::Error) -> sqlx::Error {
    tracing::error!(case_id = %id, error = %err, "unreadable case JSON in database");
    sqlx::Error::Decode(Box::new(err))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CaseRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    location: String,
    budget: String,
    posted_by: String,
    accepted_by: Option<String>,
    client_id: Option<Uuid>,
    lawyer_id: Option<Uuid>,
    stage: Option<String>,
    version: i64,
    stage_history: serde_json::Value,
    timeline: serde_json::Value,
    posted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    /// Convert to a record. An out-of-enum stage or an unreadable history
    /// or timeline is a decode error, not a silent reset: the next update
    /// writes every column back, so a reset would overwrite the stored data.
    fn into_record(self) -> Result<CaseRecord, sqlx::Error> {
        let stage = CaseStage::from_stored(self.stage.as_deref())
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let stage_history: Vec<StageTransitionRecord> =
            serde_json::from_value(self.stage_history).map_err(|e| decode_error(self.id, e))?;
        let timeline: Vec<TimelineEntry> =
            serde_json::from_value(self.timeline).map_err(|e| decode_error(self.id, e))?;

        Ok(CaseRecord {
            id: CaseId::from(self.id),
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            budget: self.budget,
            posted_by: self.posted_by,
            accepted_by: self.accepted_by,
            client_id: self.client_id.map(UserId::from),
            lawyer_id: self.lawyer_id.map(UserId::from),
            stage,
            version: from_db_version(self.version)?,
            stage_history,
            timeline,
            posted_at: self.posted_at,
            updated_at: self.updated_at,
        })
    }
}
