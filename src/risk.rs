use crate::models::{DerivedMetrics, PredictedPerformance, RiskCategory, StudentRecord};
use crate::score;

/// Scores below this are at risk regardless of the predicted label.
pub const AT_RISK_BELOW: f64 = 60.0;
/// Scores at or above this are safe unless the predicted label is `Low`.
pub const SAFE_FROM: f64 = 90.0;

pub fn classify(composite_score: f64, predicted: PredictedPerformance) -> RiskCategory {
    if predicted == PredictedPerformance::Low
        || composite_score.is_nan()
        || composite_score < AT_RISK_BELOW
    {
        RiskCategory::AtRisk
    } else if composite_score >= SAFE_FROM {
        RiskCategory::Safe
    } else {
        RiskCategory::LowRisk
    }
}

/// Score and classify a single record through the one canonical rule.
pub fn derive(record: &StudentRecord) -> DerivedMetrics<'_> {
    let composite_score = score::composite_score(record);
    DerivedMetrics {
        record,
        composite_score,
        risk_category: classify(composite_score, record.predicted_performance),
    }
}

pub fn derive_all(records: &[StudentRecord]) -> Vec<DerivedMetrics<'_>> {
    records.iter().map(derive).collect()
}
