use serde::Serialize;

use crate::models::{PredictedPerformance, RiskCategory, StudentRecord, SubMetric};
use crate::risk;
use crate::score;

pub const NO_INSIGHTS_MESSAGE: &str =
    "No personalized actionable rules available. Performance currently stable.";

#[derive(Debug, Clone, Serialize)]
pub struct SubMetricProgress {
    pub metric: SubMetric,
    pub label: &'static str,
    pub value: f64,
    pub max: f64,
    /// `round(value / max * 100)`
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "rules", rename_all = "snake_case")]
pub enum Insights {
    Actionable(Vec<String>),
    NoActionableInsights,
}

impl Insights {
    pub fn rules(&self) -> &[String] {
        match self {
            Self::Actionable(rules) => rules,
            Self::NoActionableInsights => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDetail {
    pub id: String,
    pub name: String,
    pub composite_score: f64,
    pub display_score: f64,
    pub risk_category: RiskCategory,
    pub predicted_performance: PredictedPerformance,
    pub progress: Vec<SubMetricProgress>,
    pub insights: Insights,
}

pub fn project(record: &StudentRecord) -> StudentDetail {
    let metrics = risk::derive(record);

    let progress = SubMetric::ordered()
        .into_iter()
        .map(|metric| {
            let value = record.metric(metric);
            SubMetricProgress {
                metric,
                label: metric.label(),
                value,
                max: metric.max(),
                percent: (score::sub_ratio(metric, value) * 100.0).round() as u32,
            }
        })
        .collect();

    let insights = if record.personalized_rules.is_empty() {
        Insights::NoActionableInsights
    } else {
        Insights::Actionable(record.personalized_rules.clone())
    };

    StudentDetail {
        id: record.id.clone(),
        name: record.name.clone(),
        composite_score: metrics.composite_score,
        display_score: metrics.display_score(),
        risk_category: metrics.risk_category,
        predicted_performance: record.predicted_performance,
        progress,
        insights,
    }
}
