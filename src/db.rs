use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::RawStudentRecord;
use crate::roster::RULE_SEPARATOR;
use crate::source;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub upserted: usize,
    pub skipped: usize,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<ImportOutcome> {
    let rows = vec![
        sample(
            "S001",
            "Abhijith",
            [78.0, 4.0, 2.0, 1.0, 0.0, 1.0],
            "Low",
            "Focus on MOOC completion (80% confidence)|Improve tutorial participation (95% confidence)",
        ),
        sample(
            "S002",
            "Aadhithyan",
            [85.0, 7.0, 3.0, 2.0, 1.0, 2.0],
            "Medium",
            "Submit the final missing assignment to recover core marks.",
        ),
        sample(
            "S003",
            "Aishwaarya",
            [65.0, 3.0, 1.0, 1.0, 0.0, 0.0],
            "Low",
            "Seek tutorial support immediately|Low attendance directly linked to low scores",
        ),
        sample("S004", "Benny K", [100.0, 10.0, 5.0, 4.0, 3.0, 4.0], "High", ""),
        sample("S005", "Chandana T", [96.0, 9.0, 4.0, 3.0, 2.0, 4.0], "High", ""),
        sample("S006", "David R", [99.0, 10.0, 5.0, 5.0, 3.0, 5.0], "High", ""),
        sample(
            "S007",
            "Hari V",
            [88.0, 8.0, 3.0, 3.0, 1.0, 3.0],
            "Medium",
            "Complete the mandatory MOOC to fulfill course requirements.|Dedicate time to the 3 incomplete tutorials.",
        ),
        sample(
            "S008",
            "Jayant K",
            [70.0, 3.0, 2.0, 1.0, 0.0, 1.0],
            "Low",
            "Zero MOOC participation => Low overall score (Conf: 92%)",
        ),
    ];

    upsert_students(pool, rows).await
}

fn sample(
    id: &str,
    name: &str,
    metrics: [f64; 6],
    predicted: &str,
    rules: &str,
) -> RawStudentRecord {
    RawStudentRecord {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        attendance: Some(metrics[0]),
        assignments: Some(metrics[1]),
        tutorials: Some(metrics[2]),
        volunteering: Some(metrics[3]),
        moocs: Some(metrics[4]),
        events_participation: Some(metrics[5]),
        predicted_performance: Some(predicted.to_string()),
        personalized_rules: Some(rules.to_string()),
    }
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportOutcome> {
    let rows = source::read_csv(csv_path)?;
    let outcome = upsert_students(pool, rows).await?;
    info!(
        path = %csv_path.display(),
        upserted = outcome.upserted,
        skipped = outcome.skipped,
        "imported predictions file"
    );
    Ok(outcome)
}

/// Missing metrics are stored as NULL so the zero default is applied at read time.
pub async fn upsert_students(
    pool: &PgPool,
    rows: Vec<RawStudentRecord>,
) -> anyhow::Result<ImportOutcome> {
    let mut outcome = ImportOutcome::default();

    for row in rows {
        let (Some(student_id), Some(full_name)) = (trimmed(&row.id), trimmed(&row.name)) else {
            warn!(student_id = ?row.id, "skipping row without id or name");
            outcome.skipped += 1;
            continue;
        };

        let rules: Vec<String> = row
            .personalized_rules
            .as_deref()
            .map(crate::roster::split_rules)
            .unwrap_or_default();

        let result = sqlx::query(
            r#"
            INSERT INTO student_performance.students
            (id, student_id, full_name, attendance, assignments, tutorials, volunteering,
             moocs, events_participation, predicted_performance, personalized_rules)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (student_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                attendance = EXCLUDED.attendance,
                assignments = EXCLUDED.assignments,
                tutorials = EXCLUDED.tutorials,
                volunteering = EXCLUDED.volunteering,
                moocs = EXCLUDED.moocs,
                events_participation = EXCLUDED.events_participation,
                predicted_performance = EXCLUDED.predicted_performance,
                personalized_rules = EXCLUDED.personalized_rules,
                imported_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(full_name)
        .bind(row.attendance)
        .bind(row.assignments)
        .bind(row.tutorials)
        .bind(row.volunteering)
        .bind(row.moocs)
        .bind(row.events_participation)
        .bind(&row.predicted_performance)
        .bind(&rules)
        .execute(pool)
        .await
        .with_context(|| format!("failed to upsert student {student_id}"))?;

        if result.rows_affected() > 0 {
            outcome.upserted += 1;
        }
    }

    Ok(outcome)
}

pub async fn fetch_students(pool: &PgPool) -> anyhow::Result<Vec<RawStudentRecord>> {
    let rows = sqlx::query(
        "SELECT student_id, full_name, attendance, assignments, tutorials, volunteering, \
         moocs, events_participation, predicted_performance, personalized_rules \
         FROM student_performance.students \
         ORDER BY student_id",
    )
    .fetch_all(pool)
    .await?;

    let mut students = Vec::with_capacity(rows.len());

    for row in rows {
        let rules: Vec<String> = row.get("personalized_rules");
        students.push(RawStudentRecord {
            id: row.get("student_id"),
            name: row.get("full_name"),
            attendance: row.get("attendance"),
            assignments: row.get("assignments"),
            tutorials: row.get("tutorials"),
            volunteering: row.get("volunteering"),
            moocs: row.get("moocs"),
            events_participation: row.get("events_participation"),
            predicted_performance: row.get("predicted_performance"),
            personalized_rules: Some(rules.join(RULE_SEPARATOR)),
        });
    }

    Ok(students)
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
