use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::okr::OkrRow;
use crate::okr::progress::compute_overall_progress;
use crate::okr::status::classify_status;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum KeyResultStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    AtRisk,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectiveStatus {
    NotStarted,
    Active,
    AtRisk,
    Completed,
}

impl ObjectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveStatus::NotStarted => "not-started",
            ObjectiveStatus::Active => "active",
            ObjectiveStatus::AtRisk => "at-risk",
            ObjectiveStatus::Completed => "completed",
        }
    }
}

/// Quarter an objective belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Q1 => "Q1",
            Period::Q2 => "Q2",
            Period::Q3 => "Q3",
            Period::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Ok(Period::Q1),
            "Q2" => Ok(Period::Q2),
            "Q3" => Ok(Period::Q3),
            "Q4" => Ok(Period::Q4),
            other => Err(AppError::Validation(format!("Unknown period '{other}'"))),
        }
    }
}

/// One measurable target inside an objective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyResult {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_value: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub status: KeyResultStatus,
}

fn default_weight() -> f64 {
    1.0
}

impl KeyResult {
    /// Rejects key results that would break progress aggregation.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation(
                "Key result title cannot be empty".to_string(),
            ));
        }
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(AppError::Validation(format!(
                "Key result '{}' must have a target value greater than 0",
                self.title
            )));
        }
        validate_current_value(self.current_value)?;
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(AppError::Validation(format!(
                "Key result '{}' must have a weight greater than 0",
                self.title
            )));
        }
        Ok(())
    }
}

pub fn validate_current_value(value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "Current value must be a number >= 0, got {value}"
        )));
    }
    Ok(())
}

pub fn validate_rating(rating: i64) -> Result<u8, AppError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(rating as u8)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerReview {
    pub reviewer_id: Uuid,
    pub reviewer_name: String,
    pub rating: u8,
    pub comments: String,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiInsights {
    pub achievability_score: f64,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub last_analyzed: DateTime<Utc>,
}

/// Fields HR/Admin supply when creating an objective.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDraft {
    pub employee_id: Uuid,
    pub objective: String,
    #[serde(default)]
    pub description: Option<String>,
    pub period: Period,
    pub year: i32,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
    pub created_by: Uuid,
}

/// An objective and its key results.
///
/// `overall_progress` and `status` are functions of `key_results`; they are only
/// written by `recompute`, which every key result mutation goes through.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub objective: String,
    pub description: Option<String>,
    pub period: Period,
    pub year: i32,
    key_results: Vec<KeyResult>,
    overall_progress: f64,
    status: ObjectiveStatus,
    manager_review: Option<ManagerReview>,
    ai_insights: Option<AiInsights>,
    insights_stale: bool,
    archived: bool,
    archived_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Objective {
    pub fn create(draft: ObjectiveDraft, now: DateTime<Utc>) -> Result<Self, AppError> {
        if draft.objective.trim().is_empty() {
            return Err(AppError::Validation(
                "Objective title cannot be empty".to_string(),
            ));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&draft.year) {
            return Err(AppError::Validation(format!(
                "Year must be between {MIN_YEAR} and {MAX_YEAR}, got {}",
                draft.year
            )));
        }
        for key_result in &draft.key_results {
            key_result.validate()?;
        }

        let mut objective = Objective {
            id: Uuid::new_v4(),
            employee_id: draft.employee_id,
            objective: draft.objective.trim().to_string(),
            description: draft.description.filter(|d| !d.trim().is_empty()),
            period: draft.period,
            year: draft.year,
            key_results: draft.key_results,
            overall_progress: 0.0,
            status: ObjectiveStatus::NotStarted,
            manager_review: None,
            ai_insights: None,
            insights_stale: false,
            archived: false,
            archived_at: None,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        };
        objective.recompute();
        Ok(objective)
    }

    pub fn key_results(&self) -> &[KeyResult] {
        &self.key_results
    }

    pub fn overall_progress(&self) -> f64 {
        self.overall_progress
    }

    pub fn status(&self) -> ObjectiveStatus {
        self.status
    }

    pub fn manager_review(&self) -> Option<&ManagerReview> {
        self.manager_review.as_ref()
    }

    pub fn ai_insights(&self) -> Option<&AiInsights> {
        self.ai_insights.as_ref()
    }

    /// True when key results changed after the last insight snapshot.
    pub fn insights_stale(&self) -> bool {
        self.insights_stale
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Sets one key result's current value and re-derives progress and status.
    pub fn update_key_result_value(
        &mut self,
        index: usize,
        current_value: f64,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        validate_current_value(current_value)?;
        self.ensure_open()?;
        self.key_result_mut(index)?.current_value = current_value;
        self.after_key_result_change(now);
        Ok(())
    }

    /// Sets one key result's explicit status and re-derives the objective status.
    pub fn set_key_result_status(
        &mut self,
        index: usize,
        status: KeyResultStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.ensure_open()?;
        self.key_result_mut(index)?.status = status;
        self.after_key_result_change(now);
        Ok(())
    }

    /// Replaces any earlier review. Progress and status are untouched.
    pub fn attach_review(&mut self, review: ManagerReview, now: DateTime<Utc>) {
        self.manager_review = Some(review);
        self.updated_at = now;
    }

    /// Replaces the insight snapshot. `stale` is set when the key results moved
    /// while the analysis was running.
    pub fn attach_insights(&mut self, insights: AiInsights, stale: bool, now: DateTime<Utc>) {
        self.ai_insights = Some(insights);
        self.insights_stale = stale;
        self.updated_at = now;
    }

    // Postgres archives with a bulk UPDATE; the in-memory repository goes through here.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn mark_archived(&mut self, now: DateTime<Utc>) {
        self.archived = true;
        self.archived_at = Some(now);
        self.updated_at = now;
    }

    fn ensure_open(&self) -> Result<(), AppError> {
        if self.archived {
            return Err(AppError::Validation(format!(
                "Objective {} is archived and its key results can no longer change",
                self.id
            )));
        }
        Ok(())
    }

    fn key_result_mut(&mut self, index: usize) -> Result<&mut KeyResult, AppError> {
        let id = self.id;
        self.key_results
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("Key result {index} not found on objective {id}")))
    }

    fn after_key_result_change(&mut self, now: DateTime<Utc>) {
        self.recompute();
        if self.ai_insights.is_some() {
            self.insights_stale = true;
        }
        self.updated_at = now;
    }

    fn recompute(&mut self) {
        self.overall_progress = compute_overall_progress(&self.key_results);
        self.status = classify_status(self.overall_progress, &self.key_results);
    }
}

impl TryFrom<OkrRow> for Objective {
    type Error = AppError;

    /// Derived fields are recomputed from the stored key results rather than trusted.
    fn try_from(row: OkrRow) -> Result<Self, Self::Error> {
        let period = row.period.parse::<Period>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "Objective {} has unknown period '{}'",
                row.id,
                row.period
            ))
        })?;

        let mut objective = Objective {
            id: row.id,
            employee_id: row.employee_id,
            objective: row.objective,
            description: row.description,
            period,
            year: row.year,
            key_results: row.key_results.0,
            overall_progress: 0.0,
            status: ObjectiveStatus::NotStarted,
            manager_review: row.manager_review.map(|r| r.0),
            ai_insights: row.ai_insights.map(|i| i.0),
            insights_stale: row.insights_stale,
            archived: row.archived,
            archived_at: row.archived_at,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        objective.recompute();

        if row.status != objective.status.as_str()
            || (row.overall_progress - objective.overall_progress).abs() > 1e-9
        {
            debug!(
                "Objective {}: stored {} / {:.2}% recomputed as {} / {:.2}%",
                objective.id,
                row.status,
                row.overall_progress,
                objective.status.as_str(),
                objective.overall_progress
            );
        }
        Ok(objective)
    }
}
