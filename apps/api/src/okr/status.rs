use crate::okr::models::{KeyResult, KeyResultStatus, ObjectiveStatus};

/// Derives the objective status. First match wins:
/// 1. progress >= 100 → completed (terminal, beats any risk flag)
/// 2. any key result flagged at-risk → at-risk
/// 3. progress > 0 → active
/// 4. not-started
pub fn classify_status(overall_progress: f64, key_results: &[KeyResult]) -> ObjectiveStatus {
    if overall_progress >= 100.0 {
        return ObjectiveStatus::Completed;
    }
    if key_results
        .iter()
        .any(|k| k.status == KeyResultStatus::AtRisk)
    {
        return ObjectiveStatus::AtRisk;
    }
    if overall_progress > 0.0 {
        return ObjectiveStatus::Active;
    }
    ObjectiveStatus::NotStarted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okr::models::fixtures::key_result;

    fn flagged(mut kr: KeyResult) -> KeyResult {
        kr.status = KeyResultStatus::AtRisk;
        kr
    }

    #[test]
    fn test_empty_is_not_started() {
        assert_eq!(classify_status(0.0, &[]), ObjectiveStatus::NotStarted);
    }

    #[test]
    fn test_partial_is_active() {
        let krs = [key_result("a", 1.0, 4.0, 1.0)];
        assert_eq!(classify_status(25.0, &krs), ObjectiveStatus::Active);
    }

    #[test]
    fn test_at_risk_overrides_active() {
        let krs = [
            key_result("a", 3.0, 4.0, 1.0),
            flagged(key_result("b", 3.9, 4.0, 1.0)),
        ];
        assert_eq!(classify_status(86.25, &krs), ObjectiveStatus::AtRisk);
    }

    #[test]
    fn test_at_risk_with_zero_progress() {
        let krs = [flagged(key_result("a", 0.0, 4.0, 1.0))];
        assert_eq!(classify_status(0.0, &krs), ObjectiveStatus::AtRisk);
    }

    #[test]
    fn test_completed_beats_at_risk() {
        let krs = [flagged(key_result("a", 4.0, 4.0, 1.0))];
        assert_eq!(classify_status(100.0, &krs), ObjectiveStatus::Completed);
    }

    #[test]
    fn test_key_result_completed_flag_does_not_complete_objective() {
        let mut kr = key_result("a", 1.0, 4.0, 1.0);
        kr.status = KeyResultStatus::Completed;
        assert_eq!(classify_status(25.0, &[kr]), ObjectiveStatus::Active);
    }
}
