use std::fmt;

use serde::{Deserialize, Serialize};

/// One row as supplied by the upstream predictions pipeline. Every field may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStudentRecord {
    #[serde(rename = "StudentID", default)]
    pub id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Attendance", default)]
    pub attendance: Option<f64>,
    #[serde(rename = "Assignments", default)]
    pub assignments: Option<f64>,
    #[serde(rename = "Tutorials", default)]
    pub tutorials: Option<f64>,
    #[serde(rename = "Volunteering", default)]
    pub volunteering: Option<f64>,
    #[serde(rename = "MOOCs", default)]
    pub moocs: Option<f64>,
    #[serde(rename = "EventsParticipation", default)]
    pub events_participation: Option<f64>,
    #[serde(rename = "Predicted_Performance", default)]
    pub predicted_performance: Option<String>,
    /// `|`-separated insight strings.
    #[serde(rename = "Personalized_Rules", default)]
    pub personalized_rules: Option<String>,
}

/// Upstream classifier label. Opaque to the engine; never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PredictedPerformance {
    Low,
    Medium,
    High,
}

impl PredictedPerformance {
    pub const fn ordered() -> [Self; 3] {
        [Self::High, Self::Medium, Self::Low]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for PredictedPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Locally computed risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    AtRisk,
    LowRisk,
    Safe,
}

impl RiskCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AtRisk => "AT RISK",
            Self::LowRisk => "LOW RISK",
            Self::Safe => "SAFE",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The six engagement metrics that feed the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubMetric {
    Attendance,
    Assignments,
    Tutorials,
    Volunteering,
    Moocs,
    EventsParticipation,
}

impl SubMetric {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Attendance,
            Self::Assignments,
            Self::Tutorials,
            Self::Volunteering,
            Self::Moocs,
            Self::EventsParticipation,
        ]
    }

    /// Upper bound of the metric's domain; the lower bound is always zero.
    pub const fn max(self) -> f64 {
        match self {
            Self::Attendance => 100.0,
            Self::Assignments => 10.0,
            Self::Tutorials => 5.0,
            Self::Volunteering => 5.0,
            Self::Moocs => 3.0,
            Self::EventsParticipation => 5.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Attendance => "Attendance Rate",
            Self::Assignments => "Assignments Completed",
            Self::Tutorials => "Tutorials Completed",
            Self::Volunteering => "Volunteering Hours",
            Self::Moocs => "MOOCs Status",
            Self::EventsParticipation => "Events Participation",
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, self.max())
    }
}

/// A validated record with every metric clamped to its domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub attendance: f64,
    pub assignments: f64,
    pub tutorials: f64,
    pub volunteering: f64,
    pub moocs: f64,
    pub events_participation: f64,
    pub predicted_performance: PredictedPerformance,
    pub personalized_rules: Vec<String>,
}

impl StudentRecord {
    pub fn metric(&self, metric: SubMetric) -> f64 {
        match metric {
            SubMetric::Attendance => self.attendance,
            SubMetric::Assignments => self.assignments,
            SubMetric::Tutorials => self.tutorials,
            SubMetric::Volunteering => self.volunteering,
            SubMetric::Moocs => self.moocs,
            SubMetric::EventsParticipation => self.events_participation,
        }
    }
}

/// Score and tier for one record. Recomputed on every read, never stored.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DerivedMetrics<'a> {
    #[serde(flatten)]
    pub record: &'a StudentRecord,
    pub composite_score: f64,
    pub risk_category: RiskCategory,
}

impl DerivedMetrics<'_> {
    pub fn display_score(&self) -> f64 {
        crate::score::round_for_display(self.composite_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicted_labels_parse_loosely() {
        assert_eq!(PredictedPerformance::parse(" high "), Some(PredictedPerformance::High));
        assert_eq!(PredictedPerformance::parse("Medium"), Some(PredictedPerformance::Medium));
        assert_eq!(PredictedPerformance::parse("LOW"), Some(PredictedPerformance::Low));
        assert_eq!(PredictedPerformance::parse("excellent"), None);
    }

    #[test]
    fn clamp_pins_values_to_metric_domain() {
        assert_eq!(SubMetric::Attendance.clamp(140.0), 100.0);
        assert_eq!(SubMetric::Moocs.clamp(-2.0), 0.0);
        assert_eq!(SubMetric::Tutorials.clamp(3.5), 3.5);
        assert_eq!(SubMetric::Assignments.clamp(f64::NAN), 0.0);
        assert_eq!(SubMetric::Volunteering.clamp(f64::INFINITY), 5.0);
    }

    #[test]
    fn risk_category_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&RiskCategory::LowRisk).expect("serializes");
        assert_eq!(json, "\"LOW_RISK\"");
    }
}
