use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::okr::models::{AiInsights, KeyResult, ManagerReview};

/// One row of `okrs`. Key results, review and insights are JSONB on the same row
/// so an objective is always written with a single statement.
#[derive(Debug, Clone, FromRow)]
pub struct OkrRow {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub objective: String,
    pub description: Option<String>,
    pub period: String,
    pub year: i32,
    pub key_results: Json<Vec<KeyResult>>,
    pub overall_progress: f64,
    pub status: String,
    pub manager_review: Option<Json<ManagerReview>>,
    pub ai_insights: Option<Json<AiInsights>>,
    pub insights_stale: bool,
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
