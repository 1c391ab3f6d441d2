use crate::okr::models::KeyResult;

/// Share of a key result's target reached, capped at 1.0 for over-achievement.
pub fn key_result_fraction(key_result: &KeyResult) -> f64 {
    if key_result.target_value <= 0.0 {
        // Rejected at creation; stored data should never get here.
        return 0.0;
    }
    (key_result.current_value / key_result.target_value).clamp(0.0, 1.0)
}

/// Weighted progress over all key results, 0–100.
///
/// `100 * Σ(fraction × weight) / Σ weight`. Weights are relative, so any scale works:
/// each weight is divided by the largest before summing, which keeps the sums finite.
/// No key results (or no positive weight) yields 0.
pub fn compute_overall_progress(key_results: &[KeyResult]) -> f64 {
    let max_weight = key_results.iter().map(|k| k.weight).fold(0.0_f64, f64::max);
    if !max_weight.is_finite() || max_weight <= 0.0 {
        return 0.0;
    }

    let (weighted, total_weight) = key_results
        .iter()
        .map(|k| (k, k.weight / max_weight))
        .filter(|(_, w)| *w > 0.0)
        .fold((0.0, 0.0), |(weighted, total), (k, w)| {
            (weighted + key_result_fraction(k) * w, total + w)
        });
    if total_weight <= 0.0 {
        return 0.0;
    }

    // Divide before scaling so fully-met key results land on exactly 100.
    (100.0 * (weighted / total_weight)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okr::models::fixtures::key_result;

    #[test]
    fn test_fraction_caps_over_achievement() {
        assert_eq!(key_result_fraction(&key_result("a", 30.0, 10.0, 1.0)), 1.0);
    }

    #[test]
    fn test_fraction_partial() {
        assert!((key_result_fraction(&key_result("a", 3.0, 12.0, 1.0)) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_no_key_results_is_zero() {
        assert_eq!(compute_overall_progress(&[]), 0.0);
    }

    #[test]
    fn test_single_key_result_at_target_is_100_for_any_weight() {
        for weight in [0.1, 0.7, 1.0, 3.0, 42.5, 1000.0] {
            let progress = compute_overall_progress(&[key_result("a", 8.0, 8.0, weight)]);
            assert_eq!(progress, 100.0, "weight {weight}");
        }
    }

    #[test]
    fn test_weights_one_and_three() {
        let progress = compute_overall_progress(&[
            key_result("a", 10.0, 10.0, 1.0),
            key_result("b", 0.0, 10.0, 3.0),
        ]);
        assert_eq!(progress, 25.0);
    }

    #[test]
    fn test_weight_scale_does_not_matter() {
        let small = compute_overall_progress(&[
            key_result("a", 5.0, 10.0, 1.0),
            key_result("b", 2.0, 4.0, 2.0),
        ]);
        let large = compute_overall_progress(&[
            key_result("a", 5.0, 10.0, 100.0),
            key_result("b", 2.0, 4.0, 200.0),
        ]);
        assert!((small - large).abs() < 1e-9);
        assert!((small - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let at_target = compute_overall_progress(&[
            key_result("a", 10.0, 10.0, 1e308),
            key_result("b", 10.0, 10.0, 1e308),
        ]);
        assert_eq!(at_target, 100.0);

        let mixed = compute_overall_progress(&[
            key_result("a", 10.0, 10.0, f64::MAX),
            key_result("b", 0.0, 10.0, f64::MAX),
        ]);
        assert_eq!(mixed, 50.0);
    }

    #[test]
    fn test_over_achievement_never_exceeds_100() {
        let progress = compute_overall_progress(&[
            key_result("a", 500.0, 10.0, 1.0),
            key_result("b", 99.0, 1.0, 5.0),
        ]);
        assert_eq!(progress, 100.0);
    }

    #[test]
    fn test_progress_bounded_over_many_sets() {
        let values = [0.0, 0.5, 1.0, 7.0, 10.0, 250.0];
        let weights = [0.01, 1.0, 3.0, 99.0];
        for &a in &values {
            for &b in &values {
                for &w in &weights {
                    let progress = compute_overall_progress(&[
                        key_result("a", a, 10.0, w),
                        key_result("b", b, 3.0, 1.0),
                    ]);
                    assert!((0.0..=100.0).contains(&progress), "{a} {b} {w} -> {progress}");
                }
            }
        }
    }
}
