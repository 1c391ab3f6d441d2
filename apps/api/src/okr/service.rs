//! Objective operations: creation, key result updates, explicit status flags and
//! manager reviews. Every write goes through `OkrRepository::modify`, so the new
//! key result values and the recomputed progress/status land together or not at all.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::okr::models::{
    validate_current_value, validate_rating, KeyResultStatus, ManagerReview, Objective,
    ObjectiveDraft,
};
use crate::okr::repository::OkrRepository;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub reviewer_id: Uuid,
    pub reviewer_name: String,
    /// Wide integer so out-of-range input reaches validation instead of failing to parse.
    pub rating: i64,
    #[serde(default)]
    pub comments: String,
}

pub async fn create_objective(
    repo: &dyn OkrRepository,
    draft: ObjectiveDraft,
) -> Result<Objective, AppError> {
    let objective = Objective::create(draft, Utc::now())?;
    repo.insert(&objective).await?;

    info!(
        "Created objective {} for employee {} ({} {}, {} key results)",
        objective.id,
        objective.employee_id,
        objective.period,
        objective.year,
        objective.key_results().len()
    );
    Ok(objective)
}

pub async fn get_objective(repo: &dyn OkrRepository, id: Uuid) -> Result<Objective, AppError> {
    repo.find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Objective {id} not found")))
}

pub async fn list_employee_objectives(
    repo: &dyn OkrRepository,
    employee_id: Uuid,
    year: Option<i32>,
) -> Result<Vec<Objective>, AppError> {
    repo.list_for_employee(employee_id, year).await
}

/// Sets a key result's current value, then recomputes and persists the objective.
/// AI insights are left in place but flagged stale.
pub async fn update_key_result(
    repo: &dyn OkrRepository,
    objective_id: Uuid,
    index: usize,
    current_value: f64,
) -> Result<Objective, AppError> {
    validate_current_value(current_value)?;

    let objective = repo
        .modify(
            objective_id,
            Box::new(move |objective| {
                objective.update_key_result_value(index, current_value, Utc::now())
            }),
        )
        .await?;

    info!(
        "Objective {objective_id}: key result {index} -> {current_value}, progress {:.1}%, status {}",
        objective.overall_progress(),
        objective.status().as_str()
    );
    Ok(objective)
}

/// Sets a key result's explicit status. An `at-risk` flag forces the objective
/// to `at-risk` unless it is already complete.
pub async fn set_key_result_status(
    repo: &dyn OkrRepository,
    objective_id: Uuid,
    index: usize,
    status: KeyResultStatus,
) -> Result<Objective, AppError> {
    let objective = repo
        .modify(
            objective_id,
            Box::new(move |objective| objective.set_key_result_status(index, status, Utc::now())),
        )
        .await?;

    info!(
        "Objective {objective_id}: key result {index} flagged {status:?}, status {}",
        objective.status().as_str()
    );
    Ok(objective)
}

/// Attaches a manager review, replacing any earlier one.
pub async fn attach_manager_review(
    repo: &dyn OkrRepository,
    objective_id: Uuid,
    input: ReviewInput,
) -> Result<Objective, AppError> {
    let rating = validate_rating(input.rating)?;
    let reviewer_name = input.reviewer_name.trim().to_string();
    if reviewer_name.is_empty() {
        return Err(AppError::Validation(
            "Reviewer name cannot be empty".to_string(),
        ));
    }

    let reviewer_id = input.reviewer_id;
    let comments = input.comments;
    let objective = repo
        .modify(
            objective_id,
            Box::new(move |objective| {
                let now = Utc::now();
                objective.attach_review(
                    ManagerReview {
                        reviewer_id,
                        reviewer_name,
                        rating,
                        comments,
                        reviewed_at: now,
                    },
                    now,
                );
                Ok(())
            }),
        )
        .await?;

    info!("Objective {objective_id}: review attached by {reviewer_id} (rating {rating})");
    Ok(objective)
}
