//! Insight generation: sends an objective's current state to the analysis
//! service and stores the returned snapshot on the objective.
//!
//! The provider call runs without holding the objective's write lock. The
//! snapshot is then attached in its own mutation that only touches
//! `ai_insights` / `insights_stale`, so a key result update that lands in the
//! meantime is kept and the new snapshot is marked stale.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::okr::models::{AiInsights, KeyResult, Objective, ObjectiveStatus, Period};
use crate::okr::prompts::{INSIGHT_PROMPT_TEMPLATE, INSIGHT_SYSTEM};
use crate::okr::repository::OkrRepository;
use crate::okr::service::get_objective;

const MAX_INSIGHT_ITEMS: usize = 5;

/// What the analysis service sees of an objective.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub objective_id: Uuid,
    pub objective: String,
    pub description: Option<String>,
    pub period: Period,
    pub year: i32,
    pub key_results: Vec<KeyResult>,
    pub overall_progress: f64,
    pub status: ObjectiveStatus,
}

impl From<&Objective> for InsightRequest {
    fn from(objective: &Objective) -> Self {
        Self {
            objective_id: objective.id,
            objective: objective.objective.clone(),
            description: objective.description.clone(),
            period: objective.period,
            year: objective.year,
            key_results: objective.key_results().to_vec(),
            overall_progress: objective.overall_progress(),
            status: objective.status(),
        }
    }
}

/// Raw analysis result, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightPayload {
    pub achievability_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Backend for objective analysis. Carried in `AppState` as `Arc<dyn InsightProvider>`.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn analyze(&self, request: &InsightRequest) -> Result<InsightPayload, AppError>;
}

/// Default backend: asks the model for a JSON assessment.
pub struct LlmInsightProvider {
    llm: LlmClient,
}

impl LlmInsightProvider {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl InsightProvider for LlmInsightProvider {
    async fn analyze(&self, request: &InsightRequest) -> Result<InsightPayload, AppError> {
        let objective_json = serde_json::to_string_pretty(request)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode objective: {e}")))?;
        let prompt = INSIGHT_PROMPT_TEMPLATE.replace("{objective_json}", &objective_json);

        self.llm
            .complete_json::<InsightPayload>(&prompt, INSIGHT_SYSTEM)
            .await
            .map_err(|e| AppError::Insight(e.to_string()))
    }
}

/// Requests a fresh analysis and attaches it to the objective.
///
/// On provider failure the stored objective is not touched. Progress and status
/// are never changed here.
pub async fn generate_insights(
    repo: &dyn OkrRepository,
    provider: &dyn InsightProvider,
    objective_id: Uuid,
) -> Result<Objective, AppError> {
    let objective = get_objective(repo, objective_id).await?;
    let request = InsightRequest::from(&objective);

    let payload = provider.analyze(&request).await.map_err(|e| {
        warn!("Insight generation failed for objective {objective_id}: {e}");
        e
    })?;
    let (score, risk_factors, recommendations) = normalize_payload(payload)?;

    let analyzed_key_results = request.key_results;
    let updated = repo
        .modify(
            objective_id,
            Box::new(move |objective| {
                let now = Utc::now();
                let last_analyzed = next_analysis_time(objective.ai_insights(), now);
                let stale = objective.key_results() != analyzed_key_results.as_slice();
                objective.attach_insights(
                    AiInsights {
                        achievability_score: score,
                        risk_factors,
                        recommendations,
                        last_analyzed,
                    },
                    stale,
                    now,
                );
                Ok(())
            }),
        )
        .await?;

    info!("Objective {objective_id}: insights refreshed (achievability {score:.0})");
    Ok(updated)
}

/// Clamps the score into 0–100 and drops blank or excess list items.
fn normalize_payload(
    payload: InsightPayload,
) -> Result<(f64, Vec<String>, Vec<String>), AppError> {
    if !payload.achievability_score.is_finite() {
        return Err(AppError::Insight(
            "Achievability score is not a number".to_string(),
        ));
    }
    let score = payload.achievability_score.clamp(0.0, 100.0);
    Ok((
        score,
        clean_items(payload.risk_factors),
        clean_items(payload.recommendations),
    ))
}

fn clean_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_INSIGHT_ITEMS)
        .collect()
}

/// `now`, nudged forward if needed so each snapshot is strictly newer than the last.
fn next_analysis_time(previous: Option<&AiInsights>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if prev.last_analyzed >= now => prev.last_analyzed + Duration::microseconds(1),
        _ => now,
    }
}
