use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::db;
use crate::models::RawStudentRecord;
use crate::roster::Roster;

/// Supplies the raw roster. The engine only ever sees what a source returns.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Vec<RawStudentRecord>>;

    fn describe(&self) -> String;
}

/// Fetch from any source and build a validated snapshot.
pub async fn load_roster(source: &dyn RosterSource) -> anyhow::Result<Roster> {
    let rows = source.fetch().await?;
    let fetched = rows.len();
    let roster = Roster::from_raw(rows);
    info!(
        source = %source.describe(),
        fetched,
        valid = roster.len(),
        skipped = roster.skipped,
        "roster snapshot loaded"
    );
    Ok(roster)
}

#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    rows: Vec<RawStudentRecord>,
}

impl StaticRoster {
    pub fn new(rows: Vec<RawStudentRecord>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl RosterSource for StaticRoster {
    async fn fetch(&self) -> anyhow::Result<Vec<RawStudentRecord>> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        "in-memory roster".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct CsvRoster {
    path: PathBuf,
}

impl CsvRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterSource for CsvRoster {
    async fn fetch(&self) -> anyhow::Result<Vec<RawStudentRecord>> {
        read_csv(&self.path)
    }

    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }
}

pub struct PgRoster {
    pool: PgPool,
}

impl PgRoster {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterSource for PgRoster {
    async fn fetch(&self) -> anyhow::Result<Vec<RawStudentRecord>> {
        db::fetch_students(&self.pool).await
    }

    fn describe(&self) -> String {
        "postgres student_performance.students".to_string()
    }
}

pub fn read_csv(path: &Path) -> anyhow::Result<Vec<RawStudentRecord>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_csv(reader)
}

pub fn parse_csv<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<RawStudentRecord>> {
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<RawStudentRecord>().enumerate() {
        let row = result.with_context(|| format!("failed to parse csv row {}", index + 1))?;
        rows.push(row);
    }
    Ok(rows)
}
