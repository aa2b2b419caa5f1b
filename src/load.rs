//! Rolling acute:chronic workload ratio (ACWR) over weekly load scalars.
//!
//! For each week, acute load is that week's value and chronic load is the
//! mean of the non-null loads among the up-to-`window` weeks strictly before
//! it. The ratio classifies into a training zone via a sorted threshold
//! table. Weeks without enough history classify as `InsufficientData` rather
//! than erroring.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 4;
pub const DEFAULT_MIN_WEEKS: usize = 1;

/// ---------------------------------------------------------------------------
/// Zones
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadZone {
  InsufficientData,
  Detraining,
  Optimal,
  Caution,
  Danger,
}

impl LoadZone {
  pub fn as_str(&self) -> &'static str {
    match self {
      LoadZone::InsufficientData => "Insufficient Data",
      LoadZone::Detraining => "Detraining",
      LoadZone::Optimal => "Optimal",
      LoadZone::Caution => "Caution",
      LoadZone::Danger => "Danger",
    }
  }

  /// Callout color used by the dashboard blocks.
  pub fn color(&self) -> &'static str {
    match self {
      LoadZone::InsufficientData => "gray_background",
      LoadZone::Detraining => "blue_background",
      LoadZone::Optimal => "green_background",
      LoadZone::Caution => "yellow_background",
      LoadZone::Danger => "red_background",
    }
  }

  pub fn is_elevated(&self) -> bool {
    matches!(self, LoadZone::Caution | LoadZone::Danger)
  }
}

/// Sorted `(lower_bound, zone)` table, lowest bound inclusive. A ratio below
/// the first bound falls into the first zone.
#[derive(Debug, Clone)]
pub struct ZoneThresholds {
  table: Vec<(f64, LoadZone)>,
}

impl Default for ZoneThresholds {
  fn default() -> Self {
    Self {
      table: vec![
        (0.0, LoadZone::Detraining),
        (0.8, LoadZone::Optimal),
        (1.3, LoadZone::Caution),
        (1.5, LoadZone::Danger),
      ],
    }
  }
}

impl ZoneThresholds {
  pub fn new(mut table: Vec<(f64, LoadZone)>) -> Self {
    table.sort_by(|a, b| a.0.total_cmp(&b.0));
    Self { table }
  }

  pub fn classify(&self, acwr: f64) -> LoadZone {
    self
      .table
      .iter()
      .rev()
      .find(|(bound, _)| acwr >= *bound)
      .or_else(|| self.table.first())
      .map(|(_, zone)| *zone)
      .unwrap_or(LoadZone::InsufficientData)
  }
}

/// ---------------------------------------------------------------------------
/// Rolling computation
/// ---------------------------------------------------------------------------

/// One week's load state. `acwr` is null whenever acute or chronic is
/// missing, or chronic is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPoint {
  pub week_start: NaiveDate,
  pub acute: Option<f64>,
  pub chronic: Option<f64>,
  pub acwr: Option<f64>,
  pub zone: LoadZone,
}

/// Default window (4 weeks) and minimum history (1 week).
pub fn rolling_acwr(weekly_loads: &[(NaiveDate, Option<f64>)]) -> Vec<LoadPoint> {
  rolling_acwr_with(
    weekly_loads,
    DEFAULT_WINDOW,
    DEFAULT_MIN_WEEKS,
    &ZoneThresholds::default(),
  )
}

/// One `LoadPoint` per input week, same order. Input must be chronological;
/// null loads are weeks present on the calendar grid with no recorded
/// stress.
pub fn rolling_acwr_with(
  weekly_loads: &[(NaiveDate, Option<f64>)],
  window: usize,
  min_weeks: usize,
  thresholds: &ZoneThresholds,
) -> Vec<LoadPoint> {
  weekly_loads
    .iter()
    .enumerate()
    .map(|(i, &(week_start, acute))| {
      let prior: Vec<f64> = weekly_loads[i.saturating_sub(window)..i]
        .iter()
        .filter_map(|(_, load)| *load)
        .collect();

      let chronic = if !prior.is_empty() && prior.len() >= min_weeks {
        Some(prior.iter().sum::<f64>() / prior.len() as f64)
      } else {
        None
      };

      let acwr = match (acute, chronic) {
        (Some(a), Some(c)) if c > 0.0 => Some(a / c),
        _ => None,
      };

      let zone = match acwr {
        Some(ratio) => thresholds.classify(ratio),
        None => LoadZone::InsufficientData,
      };

      LoadPoint {
        week_start,
        acute,
        chronic,
        acwr,
        zone,
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
