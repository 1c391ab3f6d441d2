//! Objective storage.
//!
//! `AppState` carries an `Arc<dyn OkrRepository>`. The Postgres backend keeps one
//! row per objective; tests use the in-memory backend in `okr::memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::okr::OkrRow;
use crate::okr::models::{Objective, Period};

/// A change applied to an objective under its write lock.
/// Returning `Err` discards the change; nothing is written.
pub type ObjectiveMutation = Box<dyn FnOnce(&mut Objective) -> Result<(), AppError> + Send>;

#[async_trait]
pub trait OkrRepository: Send + Sync {
    async fn insert(&self, objective: &Objective) -> Result<(), AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Objective>, AppError>;

    /// Ordered by year, period, then creation time. Archived objectives included.
    async fn list_for_employee(
        &self,
        employee_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<Objective>, AppError>;

    /// Non-archived objectives of one quarter, across all employees.
    async fn list_open_for_period(
        &self,
        year: i32,
        period: Period,
    ) -> Result<Vec<Objective>, AppError>;

    /// Read-modify-write of one objective as a single atomic unit.
    /// Writers to the same objective are serialized; the whole row is written or nothing is.
    async fn modify(&self, id: Uuid, mutation: ObjectiveMutation) -> Result<Objective, AppError>;

    /// Flags the given objectives archived. Returns how many rows changed.
    async fn archive(&self, ids: &[Uuid], archived_at: DateTime<Utc>) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgOkrRepository {
    pool: PgPool,
}

impl PgOkrRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn objectives_from_rows(rows: Vec<OkrRow>) -> Result<Vec<Objective>, AppError> {
    rows.into_iter().map(Objective::try_from).collect()
}

#[async_trait]
impl OkrRepository for PgOkrRepository {
    async fn insert(&self, objective: &Objective) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO okrs
                (id, employee_id, objective, description, period, year, key_results,
                 overall_progress, status, manager_review, ai_insights, insights_stale,
                 archived, archived_at, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(objective.id)
        .bind(objective.employee_id)
        .bind(&objective.objective)
        .bind(&objective.description)
        .bind(objective.period.as_str())
        .bind(objective.year)
        .bind(Json(objective.key_results()))
        .bind(objective.overall_progress())
        .bind(objective.status().as_str())
        .bind(objective.manager_review().map(Json))
        .bind(objective.ai_insights().map(Json))
        .bind(objective.insights_stale())
        .bind(objective.is_archived())
        .bind(objective.archived_at())
        .bind(objective.created_by)
        .bind(objective.created_at)
        .bind(objective.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Objective>, AppError> {
        let row: Option<OkrRow> = sqlx::query_as("SELECT * FROM okrs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Objective::try_from).transpose()
    }

    async fn list_for_employee(
        &self,
        employee_id: Uuid,
        year: Option<i32>,
    ) -> Result<Vec<Objective>, AppError> {
        let rows = sqlx::query_as::<_, OkrRow>(
            r#"
            SELECT * FROM okrs
            WHERE employee_id = $1 AND ($2::int IS NULL OR year = $2)
            ORDER BY year, period, created_at
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        objectives_from_rows(rows)
    }

    async fn list_open_for_period(
        &self,
        year: i32,
        period: Period,
    ) -> Result<Vec<Objective>, AppError> {
        let rows = sqlx::query_as::<_, OkrRow>(
            r#"
            SELECT * FROM okrs
            WHERE year = $1 AND period = $2 AND NOT archived
            ORDER BY employee_id, created_at
            "#,
        )
        .bind(year)
        .bind(period.as_str())
        .fetch_all(&self.pool)
        .await?;

        objectives_from_rows(rows)
    }

    async fn modify(&self, id: Uuid, mutation: ObjectiveMutation) -> Result<Objective, AppError> {
        // Row lock serializes writers to this objective; dropping `tx` on any error rolls back.
        let mut tx = self.pool.begin().await?;

        let row: Option<OkrRow> = sqlx::query_as("SELECT * FROM okrs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let row = row.ok_or_else(|| AppError::NotFound(format!("Objective {id} not found")))?;

        let mut objective = Objective::try_from(row)?;
        mutation(&mut objective)?;

        sqlx::query(
            r#"
            UPDATE okrs SET
                key_results = $2,
                overall_progress = $3,
                status = $4,
                manager_review = $5,
                ai_insights = $6,
                insights_stale = $7,
                archived = $8,
                archived_at = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(objective.key_results()))
        .bind(objective.overall_progress())
        .bind(objective.status().as_str())
        .bind(objective.manager_review().map(Json))
        .bind(objective.ai_insights().map(Json))
        .bind(objective.insights_stale())
        .bind(objective.is_archived())
        .bind(objective.archived_at())
        .bind(objective.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Persisted objective {id}");

        Ok(objective)
    }

    async fn archive(&self, ids: &[Uuid], archived_at: DateTime<Utc>) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE okrs SET archived = TRUE, archived_at = $2, updated_at = $2
            WHERE id = ANY($1) AND NOT archived
            "#,
        )
        .bind(ids)
        .bind(archived_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
