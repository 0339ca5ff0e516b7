use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::models::{DerivedMetrics, PredictedPerformance, RiskCategory, StudentRecord};
use crate::risk;
use crate::roster::Roster;

/// Headcount per predicted label, for the distribution chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionSummary {
    pub counts: BTreeMap<PredictedPerformance, usize>,
    pub total: usize,
}

impl DistributionSummary {
    pub fn from_records(records: &[StudentRecord]) -> Self {
        let mut counts: BTreeMap<PredictedPerformance, usize> = PredictedPerformance::ordered()
            .into_iter()
            .map(|label| (label, 0))
            .collect();

        for record in records {
            *counts.entry(record.predicted_performance).or_insert(0) += 1;
        }

        Self {
            counts,
            total: records.len(),
        }
    }

    pub fn count(&self, category: PredictedPerformance) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Whole-number share of the roster; zero when the roster is empty.
    pub fn percentage(&self, category: PredictedPerformance) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.count(category) as f64 / self.total as f64 * 100.0).round() as u32
    }

    pub fn entries(&self) -> Vec<DistributionEntry> {
        PredictedPerformance::ordered()
            .into_iter()
            .map(|category| DistributionEntry {
                category,
                label: category.label(),
                count: self.count(category),
                percentage: self.percentage(category),
            })
            .collect()
    }
}

/// JSON carries the chart entries next to the raw counts.
impl Serialize for DistributionSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            counts: &'a BTreeMap<PredictedPerformance, usize>,
            total: usize,
            entries: Vec<DistributionEntry>,
        }

        Wire {
            counts: &self.counts,
            total: self.total,
            entries: self.entries(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionEntry {
    pub category: PredictedPerformance,
    pub label: &'static str,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationSummary<'a> {
    pub total: usize,
    pub skipped: usize,
    /// `None` means no data.
    pub average_score: Option<f64>,
    pub average_attendance: Option<f64>,
    pub distribution: DistributionSummary,
    pub high_performing: Vec<DerivedMetrics<'a>>,
    pub at_risk: Vec<DerivedMetrics<'a>>,
}

impl PopulationSummary<'_> {
    pub fn high_performer_percentage(&self) -> u32 {
        self.distribution.percentage(PredictedPerformance::High)
    }
}

pub fn summarize(roster: &Roster) -> PopulationSummary<'_> {
    let derived = risk::derive_all(&roster.records);

    let average_score = mean(derived.iter().map(|metrics| metrics.composite_score));
    let average_attendance = mean(roster.records.iter().map(|record| record.attendance));

    let high_performing = derived
        .iter()
        .filter(|metrics| metrics.record.predicted_performance == PredictedPerformance::High)
        .copied()
        .collect();
    let at_risk = derived
        .iter()
        .filter(|metrics| metrics.risk_category == RiskCategory::AtRisk)
        .copied()
        .collect();

    PopulationSummary {
        total: roster.len(),
        skipped: roster.skipped,
        average_score,
        average_attendance,
        distribution: DistributionSummary::from_records(&roster.records),
        high_performing,
        at_risk,
    }
}

fn mean<I>(values: I) -> Option<f64>
where
    I: Iterator<Item = f64>,
{
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
        (sum + value, count + 1)
    });
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, attendance: f64, label: PredictedPerformance) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            name: format!("Student {id}"),
            attendance,
            assignments: 10.0,
            tutorials: 5.0,
            volunteering: 5.0,
            moocs: 3.0,
            events_participation: 5.0,
            predicted_performance: label,
            personalized_rules: Vec::new(),
        }
    }

    fn roster(records: Vec<StudentRecord>) -> Roster {
        Roster {
            records,
            skipped: 0,
        }
    }

    #[test]
    fn empty_roster_has_no_data() {
        let roster = Roster::default();
        let summary = summarize(&roster);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_score, None);
        assert_eq!(summary.average_attendance, None);
        assert!(summary.high_performing.is_empty());
        assert!(summary.at_risk.is_empty());
        let sum: u32 = PredictedPerformance::ordered()
            .into_iter()
            .map(|category| summary.distribution.percentage(category))
            .sum();
        assert_eq!(sum, 0);
    }

    #[test]
    fn averages_cover_all_records() {
        let roster = roster(vec![
            student("S1", 100.0, PredictedPerformance::High),
            student("S2", 40.0, PredictedPerformance::Medium),
        ]);
        let summary = summarize(&roster);
        assert_eq!(summary.average_attendance, Some(70.0));
        let expected = (100.0 + (0.4 + 5.0) / 6.0 * 100.0) / 2.0;
        let actual = summary.average_score.expect("has data");
        assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn cohorts_use_their_own_keys_and_keep_order() {
        let mut weak_high = student("S3", 0.0, PredictedPerformance::High);
        weak_high.assignments = 0.0;
        weak_high.tutorials = 0.0;
        weak_high.volunteering = 0.0;
        let roster = roster(vec![
            student("S1", 100.0, PredictedPerformance::High),
            student("S2", 100.0, PredictedPerformance::Low),
            weak_high,
            student("S4", 95.0, PredictedPerformance::Medium),
        ]);
        let summary = summarize(&roster);

        let high: Vec<&str> = summary
            .high_performing
            .iter()
            .map(|m| m.record.id.as_str())
            .collect();
        assert_eq!(high, vec!["S1", "S3"]);

        let at_risk: Vec<&str> = summary.at_risk.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(at_risk, vec!["S2", "S3"]);
    }

    #[test]
    fn percentages_round_independently() {
        let roster = roster(vec![
            student("S1", 90.0, PredictedPerformance::High),
            student("S2", 90.0, PredictedPerformance::Medium),
            student("S3", 90.0, PredictedPerformance::Low),
        ]);
        let distribution = DistributionSummary::from_records(&roster.records);
        assert_eq!(distribution.percentage(PredictedPerformance::High), 33);
        let sum: u32 = distribution.entries().iter().map(|e| e.percentage).sum();
        assert!((97..=103).contains(&sum));
    }

    #[test]
    fn distribution_lists_all_labels_in_display_order() {
        let distribution =
            DistributionSummary::from_records(&[student("S1", 90.0, PredictedPerformance::Low)]);
        let labels: Vec<&str> = distribution.entries().iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["High", "Medium", "Low"]);
        assert_eq!(distribution.percentage(PredictedPerformance::Low), 100);
        assert_eq!(distribution.count(PredictedPerformance::High), 0);
    }

    #[test]
    fn distribution_json_carries_entries_with_percentages() {
        let distribution = DistributionSummary::from_records(&[
            student("S1", 90.0, PredictedPerformance::High),
            student("S2", 90.0, PredictedPerformance::High),
            student("S3", 90.0, PredictedPerformance::Low),
            student("S4", 90.0, PredictedPerformance::Medium),
        ]);
        let json = serde_json::to_value(&distribution).expect("serializes");

        assert_eq!(json["total"], 4);
        assert_eq!(json["counts"]["High"], 2);
        let entries = json["entries"].as_array().expect("entries array");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["label"], "High");
        assert_eq!(entries[0]["count"], 2);
        assert_eq!(entries[0]["percentage"], 50);
        assert_eq!(entries[2]["label"], "Low");
        assert_eq!(entries[2]["percentage"], 25);
    }
}
