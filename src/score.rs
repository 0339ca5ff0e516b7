use crate::models::{StudentRecord, SubMetric};

/// Unweighted mean of the six sub-ratios, scaled to 0..=100.
///
/// Each ratio is `value / max` clamped to `[0, 1]`, so the result stays in range even
/// when a record bypassed validation. The value is unrounded; use
/// [`round_for_display`] only when presenting it.
pub fn composite_score(record: &StudentRecord) -> f64 {
    let metrics = SubMetric::ordered();
    let total: f64 = metrics
        .iter()
        .map(|metric| sub_ratio(*metric, record.metric(*metric)))
        .sum();

    total / metrics.len() as f64 * 100.0
}

pub fn sub_ratio(metric: SubMetric, value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    (value / metric.max()).clamp(0.0, 1.0)
}

pub fn round_for_display(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictedPerformance;

    fn record(values: [f64; 6]) -> StudentRecord {
        StudentRecord {
            id: "S001".to_string(),
            name: "Ann".to_string(),
            attendance: values[0],
            assignments: values[1],
            tutorials: values[2],
            volunteering: values[3],
            moocs: values[4],
            events_participation: values[5],
            predicted_performance: PredictedPerformance::High,
            personalized_rules: Vec::new(),
        }
    }

    #[test]
    fn perfect_record_scores_one_hundred() {
        let score = composite_score(&record([100.0, 10.0, 5.0, 5.0, 3.0, 5.0]));
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn half_attendance_only_scores_one_twelfth() {
        let score = composite_score(&record([50.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        assert!((score - 8.333_333).abs() < 0.001);
        assert_eq!(round_for_display(score), 8.33);
    }

    #[test]
    fn mixed_record_averages_ratios() {
        // 0.8 + 0.5 + 0.6 + 0.4 + 1/3 + 0.2
        let score = composite_score(&record([80.0, 5.0, 3.0, 2.0, 1.0, 1.0]));
        let expected = (0.8 + 0.5 + 0.6 + 0.4 + 1.0 / 3.0 + 0.2) / 6.0 * 100.0;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn out_of_domain_values_stay_within_bounds() {
        let cases = [
            [1_000.0, 99.0, 50.0, 12.0, 7.0, 40.0],
            [-10.0, -1.0, -5.0, -0.5, -3.0, -9.0],
            [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 2.0, 1.0, 0.0],
        ];

        for values in cases {
            let score = composite_score(&record(values));
            assert!(score.is_finite());
            assert!((0.0..=100.0).contains(&score), "score {score} out of range");
        }
    }
}
