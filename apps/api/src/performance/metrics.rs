use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::performance::{FeedbackStatsRow, ProjectStatsRow};
use crate::okr::models::{Objective, ObjectiveStatus};

const MAX_FEEDBACK_RATING: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceWeights {
    pub okr_progress: f64,
    pub project_completion: f64,
    pub feedback: f64,
}

impl Default for PerformanceWeights {
    fn default() -> Self {
        Self {
            okr_progress: 0.5,
            project_completion: 0.3,
            feedback: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OkrRollup {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub at_risk: usize,
    pub not_started: usize,
    /// completed / total, 0–1.
    pub completion_rate: f64,
    /// Mean overall progress, 0–100.
    pub average_progress: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRollup {
    pub total: i64,
    pub completed: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRollup {
    pub count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub employee_id: Uuid,
    pub year: Option<i32>,
    /// Weighted blend of the available components, 0–100.
    pub performance_score: f64,
    pub okrs: OkrRollup,
    pub projects: ProjectRollup,
    pub feedback: FeedbackRollup,
    pub computed_at: DateTime<Utc>,
}

pub fn rollup_objectives(objectives: &[Objective]) -> OkrRollup {
    if objectives.is_empty() {
        return OkrRollup::default();
    }

    let mut rollup = OkrRollup {
        total: objectives.len(),
        ..OkrRollup::default()
    };
    for objective in objectives {
        match objective.status() {
            ObjectiveStatus::Completed => rollup.completed += 1,
            ObjectiveStatus::Active => rollup.active += 1,
            ObjectiveStatus::AtRisk => rollup.at_risk += 1,
            ObjectiveStatus::NotStarted => rollup.not_started += 1,
        }
    }

    let progress_sum: f64 = objectives.iter().map(|o| o.overall_progress()).sum();
    rollup.completion_rate = rollup.completed as f64 / rollup.total as f64;
    rollup.average_progress = (progress_sum / rollup.total as f64).clamp(0.0, 100.0);
    rollup
}

/// Builds the rollup. Components without data are left out of the score and
/// the remaining weights renormalized; with no data at all the score is 0.
pub fn compute_performance_metrics(
    employee_id: Uuid,
    year: Option<i32>,
    objectives: &[Objective],
    projects: &ProjectStatsRow,
    feedback: &FeedbackStatsRow,
    weights: &PerformanceWeights,
) -> PerformanceMetrics {
    let okrs = rollup_objectives(objectives);

    let project_rate = if projects.total > 0 {
        (projects.completed as f64 / projects.total as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let average_rating = if feedback.count > 0 {
        feedback.average_rating
    } else {
        None
    };

    let mut components: Vec<(f64, f64)> = Vec::with_capacity(3);
    if okrs.total > 0 {
        components.push((okrs.average_progress, weights.okr_progress));
    }
    if projects.total > 0 {
        components.push((project_rate * 100.0, weights.project_completion));
    }
    if let Some(rating) = average_rating {
        components.push((
            (rating / MAX_FEEDBACK_RATING * 100.0).clamp(0.0, 100.0),
            weights.feedback,
        ));
    }

    let total_weight: f64 = components.iter().map(|(_, w)| w).sum();
    let performance_score = if total_weight > 0.0 {
        let weighted: f64 = components.iter().map(|(v, w)| v * w).sum();
        (weighted / total_weight).clamp(0.0, 100.0)
    } else {
        0.0
    };

    PerformanceMetrics {
        employee_id,
        year,
        performance_score,
        okrs,
        projects: ProjectRollup {
            total: projects.total,
            completed: projects.completed,
            completion_rate: project_rate,
        },
        feedback: FeedbackRollup {
            count: feedback.count,
            average_rating,
        },
        computed_at: Utc::now(),
    }
}
