use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use cohort_performance::config::AppConfig;
use cohort_performance::view::{SortDirection, SortKey, SortState, ViewQuery};
use cohort_performance::{
    aggregate, db, detail, report, rules, source, telemetry, view, CsvRoster, PgRoster, Roster,
    RosterSource,
};

#[derive(Parser)]
#[command(name = "cohort-performance")]
#[command(about = "Student engagement scoring and risk classification", long_about = None)]
struct Cli {
    /// Read the roster from a predictions CSV instead of Postgres
    #[arg(long, global = true)]
    from_csv: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic sample roster
    Seed,
    /// Import a predictions CSV into Postgres
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Class KPIs and performance distribution
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Search and sort the roster
    Roster {
        #[arg(long, default_value = "")]
        search: String,
        /// id, name, attendance, assignments, tutorials, volunteering, moocs, events,
        /// predicted, score or risk
        #[arg(long)]
        sort: Option<SortKey>,
        #[arg(long)]
        direction: Option<SortDirection>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Detail view for one student
    Student {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// List upstream association rules
    Rules {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { from_csv, command } = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            let outcome = db::seed(&pool).await?;
            println!("Seeded {} students.", outcome.upserted);
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let outcome = db::import_csv(&pool, &csv).await?;
            println!(
                "Imported {} students from {} ({} rows skipped).",
                outcome.upserted,
                csv.display(),
                outcome.skipped
            );
        }
        Commands::Summary { json } => {
            let roster = load(from_csv, &config).await?;
            let summary = aggregate::summarize(&roster);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            if roster.is_empty() {
                println!("No students in this roster.");
                return Ok(());
            }

            println!("Total students: {}", summary.total);
            println!(
                "Average score: {}",
                report::format_average(summary.average_score)
            );
            println!(
                "Average attendance: {}%",
                report::format_average(summary.average_attendance)
            );
            println!("High performers: {}%", summary.high_performer_percentage());
            println!("Distribution:");
            for entry in summary.distribution.entries() {
                println!(
                    "- {} Performance: {} ({}%)",
                    entry.label, entry.count, entry.percentage
                );
            }
            println!(
                "High performing: {}, at risk: {}",
                summary.high_performing.len(),
                summary.at_risk.len()
            );
            if summary.skipped > 0 {
                println!("Skipped {} malformed records.", summary.skipped);
            }
        }
        Commands::Roster {
            search,
            sort,
            direction,
            limit,
            json,
        } => {
            let roster = load(from_csv, &config).await?;
            let mut state = sort.map(SortState::for_key).unwrap_or_default();
            if let Some(direction) = direction {
                state.direction = direction;
            }
            let query = ViewQuery {
                search,
                sort: state,
            };
            let rows = view::project(&roster.records, &query);
            let shown = &rows[..limit.unwrap_or(rows.len()).min(rows.len())];

            if json {
                println!("{}", serde_json::to_string_pretty(shown)?);
                return Ok(());
            }

            if shown.is_empty() {
                println!("No students found matching \"{}\".", query.search);
                return Ok(());
            }

            for row in shown {
                println!(
                    "- {} ({}) score {:.2} {} [predicted {}]",
                    row.record.name,
                    row.record.id,
                    row.display_score(),
                    row.risk_category,
                    row.record.predicted_performance
                );
            }
        }
        Commands::Student { id, json } => {
            let roster = load(from_csv, &config).await?;
            let record = roster.find(&id)?;
            let detail = detail::project(record);

            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
                return Ok(());
            }

            println!("{} ({})", detail.name, detail.id);
            println!(
                "Score {:.2} / 100, {} (predicted {})",
                detail.display_score, detail.risk_category, detail.predicted_performance
            );
            for progress in &detail.progress {
                println!(
                    "- {}: {}/{} ({}%)",
                    progress.label, progress.value, progress.max, progress.percent
                );
            }
            match detail.insights.rules() {
                [] => println!("{}", detail::NO_INSIGHTS_MESSAGE),
                insights => {
                    println!("Personalized actionable insights:");
                    for insight in insights {
                        println!("- {insight}");
                    }
                }
            }
        }
        Commands::Rules { csv } => {
            let rules = rules::read_rules(&csv)?;
            if rules.is_empty() {
                println!("No association rules in {}.", csv.display());
            }
            for rule in rules {
                println!("{rule}");
            }
        }
        Commands::Report { out } => {
            let label = from_csv
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "postgres".to_string());
            let roster = load(from_csv, &config).await?;
            let report = report::build_report(&label, Utc::now().date_naive(), &roster);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let database_url = config.database.require_url()?;
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load(from_csv: Option<PathBuf>, config: &AppConfig) -> anyhow::Result<Roster> {
    let source: Box<dyn RosterSource> = match from_csv {
        Some(path) => Box::new(CsvRoster::new(path)),
        None => Box::new(PgRoster::new(connect(config).await?)),
    };
    source::load_roster(source.as_ref()).await
}
