use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::okr::handlers::YearQuery;
use crate::okr::service::list_employee_objectives;
use crate::performance::metrics::{
    compute_performance_metrics, PerformanceMetrics, PerformanceWeights,
};
use crate::performance::source::{fetch_feedback_stats, fetch_project_stats};
use crate::state::AppState;

/// GET /api/v1/employees/:employee_id/performance?year=Y
pub async fn handle_employee_performance(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
    Query(params): Query<YearQuery>,
) -> Result<Json<PerformanceMetrics>, AppError> {
    let objectives =
        list_employee_objectives(state.okrs.as_ref(), employee_id, params.year).await?;
    let projects = fetch_project_stats(&state.db, employee_id)
        .await
        .map_err(|e| AppError::Transient(format!("Project stats unavailable: {e}")))?;
    let feedback = fetch_feedback_stats(&state.db, employee_id, params.year)
        .await
        .map_err(|e| AppError::Transient(format!("Feedback stats unavailable: {e}")))?;

    Ok(Json(compute_performance_metrics(
        employee_id,
        params.year,
        &objectives,
        &projects,
        &feedback,
        &PerformanceWeights::default(),
    )))
}
