//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Case records live in an in-memory [`Store`]. When a database pool is
//! configured, every mutation is written to Postgres first and committed
//! to the store only after the write succeeded; on startup the store is
//! hydrated from the database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use nyay_core::{CaseId, UserId};
use nyay_state::{CaseLifecycle, CaseStage, StageTransitionRecord, TimelineEntry};

use crate::config::AppConfig;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock, so no other writer can
    /// interleave between its check and its mutation. Returns `None` if the
    /// record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Case Record --------------------------------------------------------------

fn default_category() -> String {
    "General".to_string()
}

fn initial_version() -> u64 {
    CaseLifecycle::INITIAL_VERSION
}

/// A legal matter posted by a client and worked by a lawyer.
///
/// `stage`, `version` and `stage_history` are the parts of a
/// [`CaseLifecycle`]; all stage mutations go through
/// [`CaseRecord::lifecycle`] and [`CaseRecord::set_lifecycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: CaseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub budget: String,
    /// Poster's handle (phone number in the marketplace).
    #[serde(default)]
    pub posted_by: String,
    /// Accepting lawyer's handle. `None` while the case is open.
    #[serde(default)]
    pub accepted_by: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub client_id: Option<UserId>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub lawyer_id: Option<UserId>,
    /// Lifecycle stage. A missing value reads as `New Lead`.
    #[serde(default)]
    #[schema(value_type = String, example = "Discovery")]
    pub stage: CaseStage,
    /// Optimistic concurrency token. Bumped on every mutation.
    #[serde(default = "initial_version")]
    pub version: u64,
    /// Effective stage moves, oldest first.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub stage_history: Vec<StageTransitionRecord>,
    /// Lawyer-posted updates, oldest first.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub timeline: Vec<TimelineEntry>,
    pub posted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseRecord {
    /// A new open case at `New Lead`, version 1.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        let lifecycle = CaseLifecycle::new();
        Self {
            id: CaseId::new(),
            title: title.into(),
            description: String::new(),
            category: default_category(),
            location: String::new(),
            budget: String::new(),
            posted_by: String::new(),
            accepted_by: None,
            client_id: None,
            lawyer_id: None,
            stage: lifecycle.stage,
            version: lifecycle.version,
            stage_history: lifecycle.history,
            timeline: Vec::new(),
            posted_at: now,
            updated_at: now,
        }
    }

    /// Store key.
    pub fn key(&self) -> Uuid {
        *self.id.as_uuid()
    }

    /// Whether no lawyer has accepted the case yet.
    pub fn is_open(&self) -> bool {
        self.accepted_by.is_none()
    }

    /// The stage, version, and history as a lifecycle value.
    pub fn lifecycle(&self) -> CaseLifecycle {
        CaseLifecycle::from_parts(self.stage, self.version, self.stage_history.clone())
    }

    /// Write a lifecycle back. Bumps `updated_at` if the version moved.
    pub fn set_lifecycle(&mut self, lifecycle: CaseLifecycle) {
        if lifecycle.version != self.version {
            self.updated_at = Utc::now();
        }
        self.stage = lifecycle.stage;
        self.version = lifecycle.version;
        self.stage_history = lifecycle.history;
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Clone)]
pub struct AppState {
    /// Case records by id.
    pub cases: Store<CaseRecord>,

    /// PostgreSQL pool for write-through persistence. `None` means
    /// in-memory only mode.
    pub db_pool: Option<PgPool>,

    /// Prometheus exporter handle. `None` when metrics are disabled; the
    /// `/metrics` route then returns 503.
    pub metrics: Option<PrometheusHandle>,

    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cases", &self.cases.len())
            .field("db_pool", &self.db_pool.is_some())
            .field("metrics", &self.metrics.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State with the given configuration and optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            cases: Store::new(),
            db_pool,
            metrics: None,
            config,
        }
    }

    /// Attach the Prometheus handle rendered by `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Number of cases at each stage, in lifecycle order.
    pub fn stage_counts(&self) -> Vec<(CaseStage, usize)> {
        let mut counts = [0usize; CaseStage::COUNT];
        for case in self.cases.list() {
            counts[case.stage.index()] += 1;
        }
        CaseStage::ALL.into_iter().zip(counts).collect()
    }

    /// Load all persisted cases into the in-memory store.
    ///
    /// Called once on startup. Returns the number of cases loaded.
    pub async fn hydrate_from_db(&self) -> Result<usize, sqlx::Error> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(0),
        };

        let cases = crate::db::cases::load_all(pool).await?;
        let count = cases.len();
        for record in cases {
            self.cases.insert(record.key(), record);
        }
        tracing::info!(cases = count, "hydrated case store from database");
        Ok(count)
    }
}
