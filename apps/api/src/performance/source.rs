use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::performance::{FeedbackStatsRow, ProjectStatsRow};

/// Project assignment counts for one employee. Assignments carry no period, so no year filter.
pub async fn fetch_project_stats(pool: &PgPool, employee_id: Uuid) -> Result<ProjectStatsRow> {
    Ok(sqlx::query_as::<_, ProjectStatsRow>(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE status = 'completed') AS completed
        FROM project_assignments
        WHERE employee_id = $1
        "#,
    )
    .bind(employee_id)
    .fetch_one(pool)
    .await?)
}

/// Feedback count and mean rating, optionally limited to one calendar year.
pub async fn fetch_feedback_stats(
    pool: &PgPool,
    employee_id: Uuid,
    year: Option<i32>,
) -> Result<FeedbackStatsRow> {
    Ok(sqlx::query_as::<_, FeedbackStatsRow>(
        r#"
        SELECT COUNT(*) AS count,
               AVG(rating)::float8 AS average_rating
        FROM employee_feedback
        WHERE employee_id = $1
          AND ($2::int IS NULL OR EXTRACT(YEAR FROM created_at)::int = $2)
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_one(pool)
    .await?)
}
