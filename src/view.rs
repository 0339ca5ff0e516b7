use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{DerivedMetrics, StudentRecord};
use crate::risk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    Name,
    Attendance,
    Assignments,
    Tutorials,
    Volunteering,
    Moocs,
    EventsParticipation,
    PredictedPerformance,
    CompositeScore,
    RiskCategory,
}

impl SortKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Attendance => "attendance",
            Self::Assignments => "assignments",
            Self::Tutorials => "tutorials",
            Self::Volunteering => "volunteering",
            Self::Moocs => "moocs",
            Self::EventsParticipation => "events_participation",
            Self::PredictedPerformance => "predicted_performance",
            Self::CompositeScore => "composite_score",
            Self::RiskCategory => "risk_category",
        }
    }

    /// Names read A to Z, everything else biggest first.
    pub const fn default_direction(self) -> SortDirection {
        match self {
            Self::Name => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    fn value<'a>(self, metrics: &DerivedMetrics<'a>) -> SortValue<'a> {
        let record = metrics.record;
        match self {
            Self::Id => SortValue::Text(&record.id),
            Self::Name => SortValue::Text(&record.name),
            Self::Attendance => SortValue::Number(record.attendance),
            Self::Assignments => SortValue::Number(record.assignments),
            Self::Tutorials => SortValue::Number(record.tutorials),
            Self::Volunteering => SortValue::Number(record.volunteering),
            Self::Moocs => SortValue::Number(record.moocs),
            Self::EventsParticipation => SortValue::Number(record.events_participation),
            Self::PredictedPerformance => SortValue::Rank(record.predicted_performance as u8),
            Self::CompositeScore => SortValue::Number(metrics.composite_score),
            Self::RiskCategory => SortValue::Rank(metrics.risk_category as u8),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseViewError {
    kind: &'static str,
    value: String,
}

impl FromStr for SortKey {
    type Err = ParseViewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "id" | "student_id" => Self::Id,
            "name" => Self::Name,
            "attendance" => Self::Attendance,
            "assignments" => Self::Assignments,
            "tutorials" => Self::Tutorials,
            "volunteering" => Self::Volunteering,
            "moocs" => Self::Moocs,
            "events" | "events_participation" => Self::EventsParticipation,
            "predicted" | "predicted_performance" => Self::PredictedPerformance,
            "score" | "composite_score" => Self::CompositeScore,
            "risk" | "risk_category" => Self::RiskCategory,
            _ => {
                return Err(ParseViewError {
                    kind: "sort key",
                    value: value.to_string(),
                })
            }
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ParseViewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(ParseViewError {
                kind: "sort direction",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::for_key(SortKey::Name)
    }
}

impl SortState {
    pub const fn for_key(key: SortKey) -> Self {
        Self {
            key,
            direction: key.default_direction(),
        }
    }

    /// Column-header click: same key flips, a new key starts at its default direction.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self::for_key(key)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub search: String,
    pub sort: SortState,
}

enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
    Rank(u8),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => collate(a, b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Rank(a), Self::Rank(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Accent- and case-insensitive ordering on base letters first, then unaccented before
/// accented, then lowercase before uppercase.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| b.cmp(a))
}

fn folded(value: &str) -> impl Iterator<Item = char> + '_ {
    value.nfd().flat_map(char::to_lowercase)
}

fn base_letters(value: &str) -> impl Iterator<Item = char> + '_ {
    folded(value).filter(|c| !is_combining_mark(*c))
}

pub fn matches_search(record: &StudentRecord, search: &str) -> bool {
    let needle = search.to_lowercase();
    needle.is_empty() || record.name.to_lowercase().contains(&needle)
}

/// Filter by name, then stable-sort. The input slice is never reordered.
pub fn project<'a>(records: &'a [StudentRecord], query: &ViewQuery) -> Vec<DerivedMetrics<'a>> {
    let mut rows: Vec<DerivedMetrics<'a>> = records
        .iter()
        .filter(|record| matches_search(record, &query.search))
        .map(risk::derive)
        .collect();

    sort_rows(&mut rows, query.sort);

    debug!(
        total = records.len(),
        shown = rows.len(),
        sort = %query.sort.key,
        "projected roster view"
    );
    rows
}

pub fn sort_rows(rows: &mut [DerivedMetrics<'_>], sort: SortState) {
    rows.sort_by(|a, b| {
        let ordering = sort.key.value(a).compare(&sort.key.value(b));
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictedPerformance;

    fn student(id: &str, name: &str, attendance: f64) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            name: name.to_string(),
            attendance,
            assignments: 5.0,
            tutorials: 2.0,
            volunteering: 1.0,
            moocs: 1.0,
            events_participation: 2.0,
            predicted_performance: PredictedPerformance::Medium,
            personalized_rules: Vec::new(),
        }
    }

    fn ids(rows: &[DerivedMetrics<'_>]) -> Vec<String> {
        rows.iter().map(|row| row.record.id.clone()).collect()
    }

    fn query(search: &str, key: SortKey, direction: SortDirection) -> ViewQuery {
        ViewQuery {
            search: search.to_string(),
            sort: SortState { key, direction },
        }
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = vec![
            student("1", "Ann", 80.0),
            student("2", "Bo", 70.0),
            student("3", "Dan", 60.0),
        ];
        let rows = project(&records, &query("AN", SortKey::Id, SortDirection::Ascending));
        let names: Vec<&str> = rows.iter().map(|row| row.record.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Dan"]);
    }

    #[test]
    fn empty_search_keeps_everyone() {
        let records = vec![student("1", "Ann", 80.0), student("2", "Bo", 70.0)];
        let rows = project(&records, &ViewQuery::default());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn descending_numeric_sort_is_stable() {
        let records = vec![
            student("a", "First", 50.0),
            student("b", "Second", 90.0),
            student("c", "Third", 90.0),
        ];
        let rows = project(
            &records,
            &query("", SortKey::Attendance, SortDirection::Descending),
        );
        assert_eq!(ids(&rows), vec!["b", "c", "a"]);
    }

    #[test]
    fn ascending_ties_keep_input_order() {
        let records = vec![
            student("a", "Same", 50.0),
            student("b", "Lower", 40.0),
            student("c", "Also", 50.0),
        ];
        let rows = project(
            &records,
            &query("", SortKey::Attendance, SortDirection::Ascending),
        );
        assert_eq!(ids(&rows), vec!["b", "a", "c"]);
    }

    #[test]
    fn names_sort_case_insensitively() {
        let records = vec![
            student("1", "carol", 0.0),
            student("2", "Bob", 0.0),
            student("3", "alice", 0.0),
            student("4", "Alice", 0.0),
        ];
        let rows = project(&records, &ViewQuery::default());
        assert_eq!(ids(&rows), vec!["3", "4", "2", "1"]);
    }

    #[test]
    fn search_keeps_leading_spaces() {
        let records = vec![
            student("1", "ALAN S", 80.0),
            student("2", "SAM", 70.0),
            student("3", "KAVYA S", 60.0),
        ];
        let rows = project(&records, &query(" s", SortKey::Id, SortDirection::Descending));
        assert_eq!(ids(&rows), vec!["3", "1"]);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let records = vec![
            student("1", "Zoe", 0.0),
            student("2", "Émile", 0.0),
            student("3", "Eve", 0.0),
        ];
        let rows = project(&records, &ViewQuery::default());
        let names: Vec<&str> = rows.iter().map(|row| row.record.name.as_str()).collect();
        assert_eq!(names, vec!["Émile", "Eve", "Zoe"]);
    }

    #[test]
    fn unaccented_name_precedes_accented_twin() {
        assert_eq!(collate("Elise", "Élise"), Ordering::Less);
        assert_eq!(collate("élise", "Élise"), Ordering::Less);
        assert_eq!(collate("Émile", "Émile"), Ordering::Equal);
    }

    #[test]
    fn resorting_sorted_rows_is_identity() {
        let records = vec![
            student("a", "Zed", 70.0),
            student("b", "Amy", 90.0),
            student("c", "Kim", 70.0),
            student("d", "Lou", 90.0),
        ];
        let sort = SortState {
            key: SortKey::CompositeScore,
            direction: SortDirection::Descending,
        };
        let mut rows = project(
            &records,
            &ViewQuery {
                search: String::new(),
                sort,
            },
        );
        let first = ids(&rows);
        sort_rows(&mut rows, sort);
        assert_eq!(ids(&rows), first);
    }

    #[test]
    fn input_is_not_reordered() {
        let records = vec![student("a", "Zed", 10.0), student("b", "Amy", 90.0)];
        let _ = project(&records, &ViewQuery::default());
        assert_eq!(records[0].id, "a");
    }

    #[test]
    fn selecting_keys_toggles_or_resets_direction() {
        let state = SortState::default();
        assert_eq!(state.key, SortKey::Name);
        assert_eq!(state.direction, SortDirection::Ascending);

        let flipped = state.select(SortKey::Name);
        assert_eq!(flipped.direction, SortDirection::Descending);

        let score = flipped.select(SortKey::CompositeScore);
        assert_eq!(score.direction, SortDirection::Descending);
        assert_eq!(score.select(SortKey::CompositeScore).direction, SortDirection::Ascending);

        let back = score.select(SortKey::Name);
        assert_eq!(back.direction, SortDirection::Ascending);
    }

    #[test]
    fn sort_keys_parse_from_cli_spellings() {
        assert_eq!("score".parse::<SortKey>(), Ok(SortKey::CompositeScore));
        assert_eq!("events-participation".parse::<SortKey>(), Ok(SortKey::EventsParticipation));
        assert_eq!("desc".parse::<SortDirection>(), Ok(SortDirection::Descending));
        assert!("height".parse::<SortKey>().is_err());
    }
}
