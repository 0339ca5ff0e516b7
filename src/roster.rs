use serde::Serialize;
use tracing::warn;

use crate::error::{LookupError, MalformedRecordError};
use crate::models::{PredictedPerformance, RawStudentRecord, StudentRecord, SubMetric};

pub const RULE_SEPARATOR: &str = "|";

/// Immutable snapshot of the valid records plus how many rows were dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Roster {
    pub records: Vec<StudentRecord>,
    pub skipped: usize,
}

impl Roster {
    pub fn from_raw<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RawStudentRecord>,
    {
        let mut roster = Roster::default();

        for (index, row) in rows.into_iter().enumerate() {
            match normalize(row) {
                Ok(record) => roster.records.push(record),
                Err(err) => {
                    warn!(row = index + 1, error = %err, "skipping malformed student record");
                    roster.skipped += 1;
                }
            }
        }

        roster
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn find(&self, id: &str) -> Result<&StudentRecord, LookupError> {
        self.records
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| LookupError::StudentNotFound(id.to_string()))
    }
}

/// Validate identity, default missing values and clamp every metric to its domain.
pub fn normalize(raw: RawStudentRecord) -> Result<StudentRecord, MalformedRecordError> {
    let id = non_blank(raw.id).ok_or(MalformedRecordError::MissingId)?;
    let name = non_blank(raw.name).ok_or_else(|| MalformedRecordError::MissingName {
        id: id.clone(),
    })?;

    let predicted_performance = match raw.predicted_performance.as_deref() {
        Some(label) => PredictedPerformance::parse(label).unwrap_or_else(|| {
            warn!(student_id = %id, label, "unrecognized predicted label, using Low");
            PredictedPerformance::Low
        }),
        None => PredictedPerformance::Low,
    };

    let personalized_rules = raw
        .personalized_rules
        .map(|rules| split_rules(&rules))
        .unwrap_or_default();

    Ok(StudentRecord {
        id,
        name,
        attendance: metric(SubMetric::Attendance, raw.attendance),
        assignments: metric(SubMetric::Assignments, raw.assignments),
        tutorials: metric(SubMetric::Tutorials, raw.tutorials),
        volunteering: metric(SubMetric::Volunteering, raw.volunteering),
        moocs: metric(SubMetric::Moocs, raw.moocs),
        events_participation: metric(SubMetric::EventsParticipation, raw.events_participation),
        predicted_performance,
        personalized_rules,
    })
}

pub fn split_rules(value: &str) -> Vec<String> {
    value
        .split(RULE_SEPARATOR)
        .map(str::trim)
        .filter(|rule| !rule.is_empty())
        .map(str::to_string)
        .collect()
}

fn metric(metric: SubMetric, value: Option<f64>) -> f64 {
    metric.clamp(value.unwrap_or(0.0))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
