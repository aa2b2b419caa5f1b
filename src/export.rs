//! JSON export for the static charts site: a single `ChartsData` document
//! with raw records plus weekly aggregate and load series.
//!
//! The builder is pure; the caller supplies `today` and the generation
//! timestamp. Consumers assume chronological order everywhere and do no
//! sorting of their own.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{week_label, weekly_health, weekly_running, weekly_training};
use crate::aggregate::{HealthWeek, RunningWeek, TrainingWeek};
use crate::load::{rolling_acwr, LoadZone};
use crate::models::{HealthRecord, TrainingRecord};
use crate::weeks::{week_range, week_start, Lookback};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsMeta {
  pub total_training: usize,
  pub total_health: usize,
  pub earliest: Option<NaiveDate>,
  pub latest: Option<NaiveDate>,
}

/// One row per Monday on the full calendar grid. Empty weeks keep their
/// place with null metrics so the load chart shows gaps in training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRow {
  pub week_start: NaiveDate,
  pub label: String,
  pub weekly_rss: Option<f64>,
  pub acute: Option<f64>,
  pub chronic: Option<f64>,
  pub acwr: Option<f64>,
  pub zone: LoadZone,
}

/// Weekly series, each sorted week_start ascending. The aggregate arrays
/// are sparse (non-empty weeks only); `load` spans the full grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySeries {
  pub training: Vec<TrainingWeek>,
  pub health: Vec<HealthWeek>,
  pub running: Vec<RunningWeek>,
  pub load: Vec<LoadRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsData {
  pub generated_at: DateTime<Utc>,
  pub meta: ChartsMeta,
  pub sessions: Vec<TrainingRecord>,
  pub health: Vec<HealthRecord>,
  pub weekly: WeeklySeries,
}

/// Assembles the complete export from canonical records. `lookback` scopes
/// both record sets relative to `today`; everything downstream (meta counts,
/// aggregates, the load grid) sees only in-scope records.
pub fn build_charts_data(
  training: &[TrainingRecord],
  health: &[HealthRecord],
  lookback: Lookback,
  today: NaiveDate,
  generated_at: DateTime<Utc>,
) -> ChartsData {
  let training: Vec<TrainingRecord> =
    lookback.slice(training, today).into_iter().cloned().collect();
  let health: Vec<HealthRecord> =
    lookback.slice(health, today).into_iter().cloned().collect();

  let earliest = training
    .iter()
    .map(|r| r.date)
    .chain(health.iter().map(|r| r.date))
    .min();
  let latest = training
    .iter()
    .map(|r| r.date)
    .chain(health.iter().map(|r| r.date))
    .max();

  let meta = ChartsMeta {
    total_training: training.len(),
    total_health: health.len(),
    earliest,
    latest,
  };

  let mut sessions = training.clone();
  sessions.sort_by_key(|r| r.date);
  let mut health_sorted = health.clone();
  health_sorted.sort_by_key(|r| r.date);

  let weekly_training = weekly_training(&training);
  let weekly_health = weekly_health(&health);
  let weekly_running = weekly_running(&training);

  let load = match earliest {
    Some(first) => build_load_rows(&weekly_running, first, today),
    None => Vec::new(),
  };

  ChartsData {
    generated_at,
    meta,
    sessions,
    health: health_sorted,
    weekly: WeeklySeries {
      training: weekly_training,
      health: weekly_health,
      running: weekly_running,
      load,
    },
  }
}

fn build_load_rows(
  running: &[RunningWeek],
  earliest: NaiveDate,
  today: NaiveDate,
) -> Vec<LoadRow> {
  let mondays = week_range(week_start(earliest), week_start(today));

  let weekly_loads: Vec<(NaiveDate, Option<f64>)> = mondays
    .iter()
    .map(|&monday| {
      let scalar = running
        .iter()
        .find(|rw| rw.week_start == monday)
        .and_then(|rw| rw.load_scalar());
      (monday, scalar)
    })
    .collect();

  rolling_acwr(&weekly_loads)
    .into_iter()
    .zip(&weekly_loads)
    .map(|(point, &(monday, rss))| LoadRow {
      week_start: monday,
      label: week_label(monday),
      weekly_rss: rss,
      acute: point.acute,
      chronic: point.chronic,
      acwr: point.acwr,
      zone: point.zone,
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
