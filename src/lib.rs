//! Personal fitness dashboard: syncs workouts from Hevy and Stryd into a
//! Notion workspace, aggregates training and health records into weekly
//! trends, tracks training load (ACWR), and renders the dashboard page and
//! chart-data export.

pub mod aggregate;
pub mod anomaly;
pub mod dashboard;
pub mod export;
pub mod hevy;
pub mod insights;
pub mod load;
pub mod models;
pub mod normalize;
pub mod notion;
pub mod stryd;
pub mod weeks;

#[cfg(test)]
mod test_utils;

pub use aggregate::{weekly_health, weekly_running, weekly_training};
pub use aggregate::{HealthWeek, RunningWeek, TrainingWeek};
pub use dashboard::{build_full_dashboard, build_subpage_report, DashboardData};
pub use export::{build_charts_data, ChartsData};
pub use load::{rolling_acwr, LoadPoint, LoadZone};
pub use models::{HealthRecord, TrainingRecord};
pub use weeks::Lookback;
