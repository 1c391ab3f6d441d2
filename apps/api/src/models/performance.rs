use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ProjectStatsRow {
    pub total: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct FeedbackStatsRow {
    pub count: i64,
    pub average_rating: Option<f64>,
}
