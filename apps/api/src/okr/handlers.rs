use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::okr::archive::{archive_period, ArchiveRequest, ArchiveSummary};
use crate::okr::insights::generate_insights;
use crate::okr::models::{KeyResultStatus, Objective, ObjectiveDraft};
use crate::okr::service::{
    attach_manager_review, create_objective, get_objective, list_employee_objectives,
    set_key_result_status, update_key_result, ReviewInput,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultValueUpdate {
    pub current_value: f64,
}

#[derive(Debug, Deserialize)]
pub struct KeyResultStatusUpdate {
    pub status: KeyResultStatus,
}

/// Parsed here rather than by `Path` so a bad index gets the JSON error envelope.
fn parse_key_result_index(raw: &str) -> Result<usize, AppError> {
    raw.parse::<usize>().map_err(|_| {
        AppError::Validation(format!(
            "Key result index must be a non-negative integer, got '{raw}'"
        ))
    })
}

/// POST /api/v1/okrs
pub async fn handle_create_okr(
    State(state): State<AppState>,
    Json(draft): Json<ObjectiveDraft>,
) -> Result<(StatusCode, Json<Objective>), AppError> {
    let objective = create_objective(state.okrs.as_ref(), draft).await?;
    Ok((StatusCode::CREATED, Json(objective)))
}

/// GET /api/v1/okrs/employee/:employee_id?year=Y
pub async fn handle_list_employee_okrs(
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
    Query(params): Query<YearQuery>,
) -> Result<Json<Vec<Objective>>, AppError> {
    let objectives =
        list_employee_objectives(state.okrs.as_ref(), employee_id, params.year).await?;
    Ok(Json(objectives))
}

/// GET /api/v1/okrs/:id
pub async fn handle_get_okr(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Objective>, AppError> {
    Ok(Json(get_objective(state.okrs.as_ref(), id).await?))
}

/// PUT /api/v1/okrs/:id/key-results/:index
pub async fn handle_update_key_result(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, String)>,
    Json(req): Json<KeyResultValueUpdate>,
) -> Result<Json<Objective>, AppError> {
    let index = parse_key_result_index(&index)?;
    let objective = update_key_result(state.okrs.as_ref(), id, index, req.current_value).await?;
    Ok(Json(objective))
}

/// PATCH /api/v1/okrs/:id/key-results/:index/status
pub async fn handle_set_key_result_status(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, String)>,
    Json(req): Json<KeyResultStatusUpdate>,
) -> Result<Json<Objective>, AppError> {
    let index = parse_key_result_index(&index)?;
    let objective = set_key_result_status(state.okrs.as_ref(), id, index, req.status).await?;
    Ok(Json(objective))
}

/// POST /api/v1/okrs/:id/ai-insights
pub async fn handle_generate_insights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Objective>, AppError> {
    let objective = generate_insights(state.okrs.as_ref(), state.insights.as_ref(), id).await?;
    Ok(Json(objective))
}

/// PUT /api/v1/okrs/:id/review
pub async fn handle_attach_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewInput>,
) -> Result<Json<Objective>, AppError> {
    Ok(Json(attach_manager_review(state.okrs.as_ref(), id, req).await?))
}

/// POST /api/v1/okr-periods/archive
pub async fn handle_archive_period(
    State(state): State<AppState>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Json<ArchiveSummary>, AppError> {
    let summary = archive_period(
        state.okrs.as_ref(),
        &state.s3,
        &state.config.s3_bucket,
        req,
    )
    .await?;
    Ok(Json(summary))
}
