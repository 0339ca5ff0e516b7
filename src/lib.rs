//! Scoring, risk classification and roster views for class performance data.
//!
//! Raw rows come from a [`source::RosterSource`], become a validated
//! [`roster::Roster`], and every view (summary, sorted roster, student detail)
//! is recomputed from that snapshot on demand.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod detail;
pub mod error;
pub mod models;
pub mod report;
pub mod risk;
pub mod roster;
pub mod rules;
pub mod score;
pub mod source;
pub mod telemetry;
pub mod view;

pub use aggregate::{summarize, DistributionSummary, PopulationSummary};
pub use error::{LookupError, MalformedRecordError};
pub use models::{
    DerivedMetrics, PredictedPerformance, RawStudentRecord, RiskCategory, StudentRecord,
};
pub use roster::Roster;
pub use source::{load_roster, CsvRoster, PgRoster, RosterSource, StaticRoster};
pub use view::{SortDirection, SortKey, SortState, ViewQuery};
