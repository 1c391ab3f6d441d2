//! Period rollover. Open objectives of a finished quarter are written to a
//! markdown snapshot in S3, then flagged archived. Nothing is deleted.

use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::okr::models::{Objective, Period, MAX_YEAR, MIN_YEAR};
use crate::okr::progress::key_result_fraction;
use crate::okr::repository::OkrRepository;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub year: i32,
    pub period: Period,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSummary {
    pub year: i32,
    pub period: Period,
    pub archived_count: u64,
    pub snapshot_key: Option<String>,
}

pub fn snapshot_key(year: i32, period: Period) -> String {
    format!("okr-archives/{year}/{period}.md")
}

pub async fn archive_period(
    repo: &dyn OkrRepository,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    request: ArchiveRequest,
) -> Result<ArchiveSummary, AppError> {
    let ArchiveRequest { year, period } = request;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::Validation(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
        )));
    }

    let objectives = repo.list_open_for_period(year, period).await?;
    if objectives.is_empty() {
        info!("No open objectives for {period} {year}; nothing to archive");
        return Ok(ArchiveSummary {
            year,
            period,
            archived_count: 0,
            snapshot_key: None,
        });
    }

    // Upload first: if it fails, no objective has been archived yet.
    let key = snapshot_key(year, period);
    let markdown = render_archive_to_md(year, period, &objectives);
    upload_snapshot(s3, s3_bucket, &key, markdown.clone()).await?;
    info!("Uploaded archive snapshot to s3://{s3_bucket}/{key}");

    let ids: Vec<_> = objectives.iter().map(|o| o.id).collect();
    let archived_count = repo.archive(&ids, Utc::now()).await?;
    info!("Archived {archived_count} objectives for {period} {year}");

    // Archived objectives are frozen, so this read is final.
    if let Some(refreshed) = refreshed_snapshot(repo, year, period, &ids, &markdown).await? {
        warn!("Objectives of {period} {year} changed during rollover; re-uploading snapshot");
        upload_snapshot(s3, s3_bucket, &key, refreshed).await?;
    }

    Ok(ArchiveSummary {
        year,
        period,
        archived_count,
        snapshot_key: Some(key),
    })
}

async fn upload_snapshot(
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    key: &str,
    markdown: String,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(s3_bucket)
        .key(key)
        .body(ByteStream::from(markdown.into_bytes()))
        .content_type("text/markdown")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Archive snapshot upload failed: {e}")))?;
    Ok(())
}

/// Re-renders the snapshot from the stored objectives. Returns it only when it
/// differs from what was uploaded, i.e. a write landed between the first read
/// and the archive.
async fn refreshed_snapshot(
    repo: &dyn OkrRepository,
    year: i32,
    period: Period,
    ids: &[Uuid],
    uploaded: &str,
) -> Result<Option<String>, AppError> {
    let mut current = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(objective) = repo.find(*id).await? {
            current.push(objective);
        }
    }
    let markdown = render_archive_to_md(year, period, &current);
    Ok((markdown != uploaded).then_some(markdown))
}

/// Renders the archived objectives as one markdown document, grouped by employee.
pub fn render_archive_to_md(year: i32, period: Period, objectives: &[Objective]) -> String {
    let mut md = format!("# OKR Archive: {period} {year}\n\n");
    md.push_str(&format!("- **Objectives:** {}\n\n", objectives.len()));

    let mut sorted: Vec<&Objective> = objectives.iter().collect();
    sorted.sort_by_key(|o| (o.employee_id, o.created_at));

    let mut current_employee = None;
    for objective in sorted {
        if current_employee != Some(objective.employee_id) {
            current_employee = Some(objective.employee_id);
            md.push_str(&format!("## Employee {}\n\n", objective.employee_id));
        }

        md.push_str(&format!("### {}\n", objective.objective));
        md.push_str(&format!("- **Id:** {}\n", objective.id));
        md.push_str(&format!(
            "- **Progress:** {:.1}%\n",
            objective.overall_progress()
        ));
        md.push_str(&format!("- **Status:** {}\n", objective.status().as_str()));
        if let Some(description) = &objective.description {
            md.push_str(&format!("- **Description:** {description}\n"));
        }

        if !objective.key_results().is_empty() {
            md.push_str("\n| Key result | Current | Target | Unit | Weight | Done | Flag |\n");
            md.push_str("|---|---|---|---|---|---|---|\n");
            for kr in objective.key_results() {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {:.0}% | {:?} |\n",
                    kr.title.replace('|', "/"),
                    kr.current_value,
                    kr.target_value,
                    kr.unit,
                    kr.weight,
                    key_result_fraction(kr) * 100.0,
                    kr.status
                ));
            }
        }

        if let Some(review) = objective.manager_review() {
            md.push_str(&format!(
                "\n**Manager review** ({}, {}/5, {}): {}\n",
                review.reviewer_name,
                review.rating,
                review.reviewed_at.format("%Y-%m-%d"),
                review.comments
            ));
        }

        if let Some(insights) = objective.ai_insights() {
            md.push_str(&format!(
                "\n**Achievability:** {:.0}/100{}\n",
                insights.achievability_score,
                if objective.insights_stale() {
                    " (stale)"
                } else {
                    ""
                }
            ));
            for risk in &insights.risk_factors {
                md.push_str(&format!("- Risk: {risk}\n"));
            }
            for rec in &insights.recommendations {
                md.push_str(&format!("- Recommendation: {rec}\n"));
            }
        }
        md.push('\n');
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okr::models::fixtures::{key_result, objective};
    use crate::okr::memory::MemoryOkrRepository;
    use crate::okr::models::fixtures::draft;
    use crate::okr::models::ManagerReview;
    use crate::okr::service::{create_objective, update_key_result};

    #[test]
    fn test_snapshot_key() {
        assert_eq!(snapshot_key(2026, Period::Q3), "okr-archives/2026/Q3.md");
    }

    #[test]
    fn test_render_includes_key_results_and_review() {
        let mut o = objective(vec![
            key_result("Ship | v2", 3.0, 4.0, 2.0),
            key_result("Docs", 0.0, 1.0, 1.0),
        ]);
        let now = Utc::now();
        o.attach_review(
            ManagerReview {
                reviewer_id: Uuid::new_v4(),
                reviewer_name: "Sam Ruiz".to_string(),
                rating: 4,
                comments: "Good momentum".to_string(),
                reviewed_at: now,
            },
            now,
        );

        let md = render_archive_to_md(2026, Period::Q2, &[o.clone()]);
        assert!(md.starts_with("# OKR Archive: Q2 2026"));
        assert!(md.contains(&format!("## Employee {}", o.employee_id)));
        assert!(md.contains("| Ship / v2 | 3 | 4 | count | 2 | 75% | NotStarted |"));
        assert!(md.contains("**Progress:** 50.0%"));
        assert!(md.contains("Sam Ruiz, 4/5"));
    }

    #[test]
    fn test_render_groups_by_employee() {
        let a = objective(vec![]);
        let b = objective(vec![]);
        let md = render_archive_to_md(2026, Period::Q1, &[a, b]);
        assert_eq!(md.matches("## Employee").count(), 2);
        assert!(md.contains("- **Objectives:** 2"));
    }

    #[test]
    fn test_render_empty() {
        let md = render_archive_to_md(2026, Period::Q4, &[]);
        assert!(md.contains("- **Objectives:** 0"));
        assert!(!md.contains("###"));
    }

    #[tokio::test]
    async fn test_archived_objectives_leave_open_list_and_freeze() {
        use crate::okr::service::{attach_manager_review, ReviewInput};

        let repo = MemoryOkrRepository::new();
        let created = create_objective(&repo, draft(vec![key_result("Hires", 1.0, 4.0, 1.0)]))
            .await
            .unwrap();

        let open = repo.list_open_for_period(2026, Period::Q2).await.unwrap();
        assert_eq!(open.len(), 1);

        let changed = repo.archive(&[created.id], Utc::now()).await.unwrap();
        assert_eq!(changed, 1);
        assert_eq!(repo.archive(&[created.id], Utc::now()).await.unwrap(), 0);
        assert!(repo
            .list_open_for_period(2026, Period::Q2)
            .await
            .unwrap()
            .is_empty());

        let err = update_key_result(&repo, created.id, 0, 2.0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Reviews still land after rollover.
        let reviewed = attach_manager_review(
            &repo,
            created.id,
            ReviewInput {
                reviewer_id: Uuid::new_v4(),
                reviewer_name: "Sam Ruiz".to_string(),
                rating: 4,
                comments: String::new(),
            },
        )
        .await
        .unwrap();
        assert!(reviewed.is_archived());
        assert!(reviewed.manager_review().is_some());
    }

    #[tokio::test]
    async fn test_refreshed_snapshot_catches_late_write() {
        let repo = MemoryOkrRepository::new();
        let created = create_objective(&repo, draft(vec![key_result("Hires", 1.0, 4.0, 1.0)]))
            .await
            .unwrap();

        let open = repo.list_open_for_period(2026, Period::Q2).await.unwrap();
        let uploaded = render_archive_to_md(2026, Period::Q2, &open);
        let ids = vec![created.id];

        assert_eq!(
            refreshed_snapshot(&repo, 2026, Period::Q2, &ids, &uploaded)
                .await
                .unwrap(),
            None
        );

        update_key_result(&repo, created.id, 0, 3.0).await.unwrap();
        repo.archive(&ids, Utc::now()).await.unwrap();

        let refreshed = refreshed_snapshot(&repo, 2026, Period::Q2, &ids, &uploaded)
            .await
            .unwrap()
            .unwrap();
        assert!(refreshed.contains("| Hires | 3 | 4 | count | 1 | 75% | NotStarted |"));
        assert!(refreshed.contains("**Progress:** 75.0%"));
    }
}
