use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{self, PopulationSummary};
use crate::models::DerivedMetrics;
use crate::roster::Roster;
use crate::view::{self, SortDirection, SortKey, SortState, ViewQuery};

const NO_DATA: &str = "N/A";

pub fn format_average(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| NO_DATA.to_string())
}

pub fn build_report(source_label: &str, generated_on: NaiveDate, roster: &Roster) -> String {
    let summary = aggregate::summarize(roster);
    let mut output = String::new();

    let _ = writeln!(output, "# Class Performance Report");
    let _ = writeln!(output, "Generated {} from {}", generated_on, source_label);
    let _ = writeln!(output);

    write_kpis(&mut output, &summary);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance Distribution");

    if summary.distribution.total == 0 {
        let _ = writeln!(output, "No students in this roster.");
    } else {
        for entry in summary.distribution.entries() {
            let _ = writeln!(
                output,
                "- {} Performance: {} students ({}%)",
                entry.label, entry.count, entry.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## High Performing Students");
    write_cohort(&mut output, &summary.high_performing);

    let _ = writeln!(output);
    let _ = writeln!(output, "## At Risk Students");
    // weakest first
    let mut at_risk = summary.at_risk.clone();
    view::sort_rows(
        &mut at_risk,
        SortState {
            key: SortKey::CompositeScore,
            direction: SortDirection::Ascending,
        },
    );
    write_cohort(&mut output, &at_risk);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Roster");

    let rows = view::project(&roster.records, &ViewQuery::default());
    if rows.is_empty() {
        let _ = writeln!(output, "No students in this roster.");
    } else {
        let _ = writeln!(output, "| ID | Name | Score | Classification | Predicted |");
        let _ = writeln!(output, "|----|------|-------|----------------|-----------|");
        for row in rows.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {} | {} |",
                row.record.id,
                row.record.name,
                row.display_score(),
                row.risk_category,
                row.record.predicted_performance
            );
        }
    }

    output
}

fn write_kpis(output: &mut String, summary: &PopulationSummary<'_>) {
    let _ = writeln!(output, "## Key Figures");
    let _ = writeln!(output, "- Total students: {}", summary.total);
    let _ = writeln!(
        output,
        "- Average score: {}",
        format_average(summary.average_score)
    );
    let _ = writeln!(
        output,
        "- Average attendance: {}",
        summary
            .average_attendance
            .map(|value| format!("{value:.2}%"))
            .unwrap_or_else(|| NO_DATA.to_string())
    );
    let _ = writeln!(
        output,
        "- High performers: {}",
        if summary.total == 0 {
            NO_DATA.to_string()
        } else {
            format!("{}%", summary.high_performer_percentage())
        }
    );

    if summary.skipped > 0 {
        let _ = writeln!(
            output,
            "- Skipped records: {} (missing id or name)",
            summary.skipped
        );
    }
}

fn write_cohort(output: &mut String, cohort: &[DerivedMetrics<'_>]) {
    if cohort.is_empty() {
        let _ = writeln!(output, "No students in this cohort.");
        return;
    }

    for (index, metrics) in cohort.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) score {:.2}, {}",
            index + 1,
            metrics.record.name,
            metrics.record.id,
            metrics.display_score(),
            metrics.risk_category
        );
    }
}
