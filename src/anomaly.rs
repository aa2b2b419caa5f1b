//! Overreaching detection: elevated training load combined with recovery
//! markers degrading week over week.
//!
//! The detector abstains (`NoData`) when either week's health aggregate is
//! missing, and individual signals are skipped when either week lacks the
//! metric. Absence is not evidence.

use serde::{Deserialize, Serialize};

use crate::aggregate::HealthWeek;
use crate::load::LoadPoint;

/// Absolute week-over-week deltas that count as a recovery signal.
#[derive(Debug, Clone, PartialEq)]
pub struct OverreachingThresholds {
  /// Drop in mean body battery (points).
  pub body_battery_drop: f64,
  /// Drop in mean sleep (hours).
  pub sleep_drop_hours: f64,
  /// Rise in mean resting heart rate (bpm).
  pub resting_hr_rise: f64,
}

impl Default for OverreachingThresholds {
  fn default() -> Self {
    Self {
      body_battery_drop: 10.0,
      sleep_drop_hours: 0.75,
      resting_hr_rise: 3.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverreachingSignal {
  BodyBatteryDrop { points: f64 },
  SleepDrop { hours: f64 },
  RestingHrRise { bpm: f64 },
}

impl OverreachingSignal {
  pub fn describe(&self) -> String {
    match self {
      OverreachingSignal::BodyBatteryDrop { points } => {
        format!("body battery down {points:.0} points vs last week")
      }
      OverreachingSignal::SleepDrop { hours } => {
        format!("sleep down {hours:.1}h vs last week")
      }
      OverreachingSignal::RestingHrRise { bpm } => {
        format!("resting HR up {bpm:.0} bpm vs last week")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Overreaching {
  Flagged(Vec<OverreachingSignal>),
  NotFlagged,
  NoData,
}

impl Overreaching {
  pub fn is_flagged(&self) -> bool {
    matches!(self, Overreaching::Flagged(_))
  }
}

/// Flags only when the load zone is Caution or Danger and at least one
/// recovery signal crosses its threshold.
pub fn detect_overreaching(
  load_point: &LoadPoint,
  current_health: Option<&HealthWeek>,
  previous_health: Option<&HealthWeek>,
  thresholds: &OverreachingThresholds,
) -> Overreaching {
  let (current, previous) = match (current_health, previous_health) {
    (Some(c), Some(p)) => (c, p),
    _ => return Overreaching::NoData,
  };

  if !load_point.zone.is_elevated() {
    return Overreaching::NotFlagged;
  }

  let mut signals = Vec::new();

  if let (Some(cur), Some(prev)) = (current.avg_body_battery, previous.avg_body_battery) {
    let drop = prev - cur;
    if drop >= thresholds.body_battery_drop {
      signals.push(OverreachingSignal::BodyBatteryDrop { points: drop });
    }
  }

  if let (Some(cur), Some(prev)) = (current.avg_sleep_hours, previous.avg_sleep_hours) {
    let drop = prev - cur;
    if drop >= thresholds.sleep_drop_hours {
      signals.push(OverreachingSignal::SleepDrop { hours: drop });
    }
  }

  if let (Some(cur), Some(prev)) = (current.avg_resting_hr, previous.avg_resting_hr) {
    let rise = cur - prev;
    if rise >= thresholds.resting_hr_rise {
      signals.push(OverreachingSignal::RestingHrRise { bpm: rise });
    }
  }

  if signals.is_empty() {
    Overreaching::NotFlagged
  } else {
    Overreaching::Flagged(signals)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use chrono::Days;

  use super::*;
  use crate::aggregate::{weekly_health, weekly_running};
  use crate::load::{rolling_acwr, LoadZone};
  use crate::test_utils::{health_record, health_week, load_point, run_record};

  #[test]
  fn test_missing_health_abstains() {
    let lp = load_point(LoadZone::Danger, Some(2.0));
    let hw = health_week(Some(7.0), Some(55.0), Some(60.0));
    let t = OverreachingThresholds::default();

    assert_eq!(detect_overreaching(&lp, None, Some(&hw), &t), Overreaching::NoData);
    assert_eq!(detect_overreaching(&lp, Some(&hw), None, &t), Overreaching::NoData);
    assert_eq!(detect_overreaching(&lp, None, None, &t), Overreaching::NoData);
  }

  #[test]
  fn test_calm_zone_never_flags() {
    let lp = load_point(LoadZone::Optimal, Some(1.0));
    let prev = health_week(Some(8.0), Some(52.0), Some(80.0));
    let cur = health_week(Some(5.0), Some(65.0), Some(30.0));
    let t = OverreachingThresholds::default();

    assert_eq!(
      detect_overreaching(&lp, Some(&cur), Some(&prev), &t),
      Overreaching::NotFlagged
    );
  }

  #[test]
  fn test_battery_drop_flags_in_danger_zone() {
    let lp = load_point(LoadZone::Danger, Some(1.67));
    let prev = health_week(Some(7.5), Some(55.0), Some(75.0));
    let cur = health_week(Some(7.5), Some(55.0), Some(60.0));
    let t = OverreachingThresholds::default();

    match detect_overreaching(&lp, Some(&cur), Some(&prev), &t) {
      Overreaching::Flagged(signals) => {
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0], OverreachingSignal::BodyBatteryDrop { points: 15.0 });
      }
      other => panic!("expected Flagged, got {other:?}"),
    }
  }

  #[test]
  fn test_multiple_signals() {
    let lp = load_point(LoadZone::Caution, Some(1.4));
    let prev = health_week(Some(8.0), Some(52.0), Some(80.0));
    let cur = health_week(Some(6.5), Some(58.0), Some(60.0));
    let t = OverreachingThresholds::default();

    match detect_overreaching(&lp, Some(&cur), Some(&prev), &t) {
      Overreaching::Flagged(signals) => assert_eq!(signals.len(), 3),
      other => panic!("expected Flagged, got {other:?}"),
    }
  }

  #[test]
  fn test_missing_metric_is_skipped_not_counted() {
    let lp = load_point(LoadZone::Danger, Some(1.8));
    // Previous week never recorded body battery: that signal is skipped
    // even though the current value is low.
    let prev = health_week(Some(7.5), Some(55.0), None);
    let cur = health_week(Some(7.4), Some(55.0), Some(20.0));
    let t = OverreachingThresholds::default();

    assert_eq!(
      detect_overreaching(&lp, Some(&cur), Some(&prev), &t),
      Overreaching::NotFlagged
    );
  }

  #[test]
  fn test_flags_from_raw_records_through_load_pipeline() {
    // Five weeks of runs ramping into a spike, aggregated rather than
    // hand-built: records -> weekly_running -> rolling_acwr -> detector.
    let runs = vec![
      run_record("2026-02-02", 8.0, Some(50.0)),
      run_record("2026-02-09", 9.0, Some(55.0)),
      run_record("2026-02-16", 8.5, Some(52.0)),
      run_record("2026-02-23", 9.5, Some(58.0)),
      run_record("2026-03-02", 15.0, Some(90.0)),
    ];
    let running = weekly_running(&runs);
    let loads: Vec<_> = running
      .iter()
      .map(|w| (w.week_start, w.load_scalar()))
      .collect();
    let points = rolling_acwr(&loads);
    let last = points.last().unwrap();
    let acwr = last.acwr.unwrap();
    assert!((acwr - 1.674).abs() < 0.01, "acwr was {acwr}");
    assert_eq!(last.zone, LoadZone::Danger);

    let health = vec![
      health_record("2026-02-25", Some(7.5), Some(55.0), Some(75.0)),
      health_record("2026-03-04", Some(7.5), Some(55.0), Some(60.0)),
    ];
    let health_weeks = weekly_health(&health);
    let cur = health_weeks.iter().find(|w| w.week_start == last.week_start);
    let prev = health_weeks
      .iter()
      .find(|w| w.week_start == last.week_start - Days::new(7));

    match detect_overreaching(last, cur, prev, &OverreachingThresholds::default()) {
      Overreaching::Flagged(signals) => {
        assert_eq!(signals, vec![OverreachingSignal::BodyBatteryDrop { points: 15.0 }]);
      }
      other => panic!("expected Flagged, got {other:?}"),
    }
  }

  #[test]
  fn test_sub_threshold_changes_do_not_flag() {
    let lp = load_point(LoadZone::Caution, Some(1.35));
    let prev = health_week(Some(7.5), Some(55.0), Some(70.0));
    let cur = health_week(Some(7.2), Some(56.0), Some(65.0));
    let t = OverreachingThresholds::default();

    assert_eq!(
      detect_overreaching(&lp, Some(&cur), Some(&prev), &t),
      Overreaching::NotFlagged
    );
  }
}
