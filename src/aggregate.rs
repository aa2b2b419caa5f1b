//! Weekly aggregation: pure reductions from one week's records to summary
//! statistics per domain (training, running, health).
//!
//! Additive metrics sum; averaged metrics are means over only the records
//! where the metric is present. A week with zero qualifying records for a
//! metric yields `None` for it, never `0.0`, so downstream consumers render
//! absence distinctly from a computed zero.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{HealthRecord, HealthStatus, TrainingRecord, TrainingType};
use crate::weeks::group_by_week;

/// Mean over the present values, `None` when nothing qualifies.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    None
  } else {
    Some(values.iter().sum::<f64>() / values.len() as f64)
  }
}

fn most_common(values: &[&str]) -> Option<String> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for v in values {
    *counts.entry(v).or_insert(0) += 1;
  }
  counts
    .into_iter()
    .max_by_key(|(_, n)| *n)
    .map(|(v, _)| v.to_string())
}

/// Label shared by week aggregates and week periods ("Feb 02 – Feb 08").
pub fn week_label(monday: NaiveDate) -> String {
  let sunday = monday + Days::new(6);
  format!("{} – {}", monday.format("%b %d"), sunday.format("%b %d"))
}

/// ---------------------------------------------------------------------------
/// Training aggregate
/// ---------------------------------------------------------------------------

/// Aggregated training metrics for one week (all session types).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingWeek {
  pub week_start: NaiveDate,
  pub label: String,
  pub sessions: usize,
  pub active_days: usize,
  pub total_duration_min: f64,
  pub running_count: usize,
  pub running_km: f64,
  pub longest_run_km: Option<f64>,
  pub gym_sessions: usize,
  pub gym_volume_kg: f64,
  pub gym_volume_per_session: Option<f64>,
  pub feeling_avg: Option<f64>,
  pub feeling_good_pct: Option<f64>,
  pub tough_sessions: usize,
}

impl TrainingWeek {
  pub fn compute(records: &[&TrainingRecord], week_start: NaiveDate, label: &str) -> Self {
    let mut active_dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    active_dates.sort_unstable();
    active_dates.dedup();

    let mut total_duration_min = 0.0;
    let mut running_count = 0;
    let mut running_km = 0.0;
    let mut longest_run_km: Option<f64> = None;
    let mut gym_sessions = 0;
    let mut gym_volume_kg = 0.0;
    let mut feeling_scores: Vec<f64> = Vec::new();
    let mut tough_sessions = 0;

    for r in records {
      total_duration_min += r.duration_min.unwrap_or(0.0);

      if r.training_type == TrainingType::Running {
        running_count += 1;
        if let Some(km) = r.distance_km {
          running_km += km;
          longest_run_km = Some(longest_run_km.map_or(km, |cur: f64| cur.max(km)));
        }
      }

      if r.training_type.is_gym() {
        gym_sessions += 1;
        gym_volume_kg += r.volume_kg.unwrap_or(0.0);
      }

      if let Some(feeling) = r.feeling {
        feeling_scores.push(feeling.score() as f64);
        if feeling.is_tough() {
          tough_sessions += 1;
        }
      }
    }

    let feeling_good_pct = if feeling_scores.is_empty() {
      None
    } else {
      let good = feeling_scores.iter().filter(|&&s| s >= 4.0).count();
      Some(good as f64 / feeling_scores.len() as f64 * 100.0)
    };

    Self {
      week_start,
      label: label.to_string(),
      sessions: records.len(),
      active_days: active_dates.len(),
      total_duration_min,
      running_count,
      running_km,
      longest_run_km,
      gym_sessions,
      gym_volume_kg,
      gym_volume_per_session: if gym_sessions > 0 {
        Some(gym_volume_kg / gym_sessions as f64)
      } else {
        None
      },
      feeling_avg: mean(&feeling_scores),
      feeling_good_pct,
      tough_sessions,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Running aggregate
/// ---------------------------------------------------------------------------

/// Aggregated running performance metrics for one week (or longer period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningWeek {
  pub week_start: NaiveDate,
  pub label: String,
  pub run_count: usize,
  pub total_km: f64,
  pub total_duration_min: f64,
  pub total_rss: f64,
  pub avg_rss_per_run: Option<f64>,
  pub avg_power_w: Option<f64>,
  pub avg_critical_power_w: Option<f64>,
  pub avg_cadence_spm: Option<f64>,
  pub avg_stride_length_m: Option<f64>,
  pub avg_ground_contact_ms: Option<f64>,
  pub avg_vertical_oscillation_cm: Option<f64>,
  pub avg_leg_spring_stiffness: Option<f64>,
  pub avg_rpe: Option<f64>,
  pub avg_hr: Option<f64>,
  pub power_to_hr_ratio: Option<f64>,
  pub avg_pace_min_per_km: Option<f64>,
}

impl RunningWeek {
  pub fn compute(records: &[&TrainingRecord], week_start: NaiveDate, label: &str) -> Self {
    let runs: Vec<&&TrainingRecord> = records
      .iter()
      .filter(|r| r.training_type == TrainingType::Running)
      .collect();

    let mut total_km = 0.0;
    let mut total_duration_min = 0.0;
    let mut rss_vals: Vec<f64> = Vec::new();

    let collect = |pick: fn(&TrainingRecord) -> Option<f64>| -> Vec<f64> {
      runs.iter().filter_map(|r| pick(r)).collect()
    };

    for r in &runs {
      total_km += r.distance_km.unwrap_or(0.0);
      total_duration_min += r.duration_min.unwrap_or(0.0);
      if let Some(rss) = r.rss {
        rss_vals.push(rss);
      }
    }
    let total_rss: f64 = rss_vals.iter().sum();

    let avg_power_w = mean(&collect(|r| r.power_w));
    let avg_hr = mean(&collect(|r| r.avg_hr));

    let power_to_hr_ratio = match (avg_power_w, avg_hr) {
      (Some(p), Some(hr)) if hr > 0.0 => Some(p / hr),
      _ => None,
    };

    Self {
      week_start,
      label: label.to_string(),
      run_count: runs.len(),
      total_km,
      total_duration_min,
      total_rss,
      avg_rss_per_run: if runs.is_empty() || rss_vals.is_empty() {
        None
      } else {
        Some(total_rss / runs.len() as f64)
      },
      avg_power_w,
      avg_critical_power_w: mean(&collect(|r| r.critical_power_w)),
      avg_cadence_spm: mean(&collect(|r| r.cadence_spm)),
      avg_stride_length_m: mean(&collect(|r| r.stride_length_m)),
      avg_ground_contact_ms: mean(&collect(|r| r.ground_contact_ms)),
      avg_vertical_oscillation_cm: mean(&collect(|r| r.vertical_oscillation_cm)),
      avg_leg_spring_stiffness: mean(&collect(|r| r.leg_spring_stiffness)),
      avg_rpe: mean(&collect(|r| r.rpe.map(|v| v as f64))),
      avg_hr,
      power_to_hr_ratio,
      avg_pace_min_per_km: if total_km > 0.0 {
        Some(total_duration_min / total_km)
      } else {
        None
      },
    }
  }

  /// Weekly RSS sum as the load scalar for the rolling load engine. `None`
  /// when no run in the week carried a stress score.
  pub fn load_scalar(&self) -> Option<f64> {
    if self.avg_rss_per_run.is_some() {
      Some(self.total_rss)
    } else {
      None
    }
  }
}

/// ---------------------------------------------------------------------------
/// Health aggregate
/// ---------------------------------------------------------------------------

/// Aggregated health metrics for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthWeek {
  pub week_start: NaiveDate,
  pub label: String,
  pub entries: usize,
  pub avg_sleep_hours: Option<f64>,
  pub sleep_quality_mode: Option<String>,
  pub avg_resting_hr: Option<f64>,
  pub avg_steps: Option<f64>,
  pub avg_body_battery: Option<f64>,
  pub sick_days: usize,
  pub injured_days: usize,
  pub rest_days: usize,
}

impl HealthWeek {
  pub fn compute(records: &[&HealthRecord], week_start: NaiveDate, label: &str) -> Self {
    let collect = |pick: fn(&HealthRecord) -> Option<f64>| -> Vec<f64> {
      records.iter().filter_map(|r| pick(r)).collect()
    };

    let qualities: Vec<&str> = records
      .iter()
      .filter_map(|r| r.sleep_quality.as_deref())
      .collect();

    let count_status = |status: HealthStatus| -> usize {
      records.iter().filter(|r| r.status == Some(status)).count()
    };

    Self {
      week_start,
      label: label.to_string(),
      entries: records.len(),
      avg_sleep_hours: mean(&collect(|r| r.sleep_hours)),
      sleep_quality_mode: most_common(&qualities),
      avg_resting_hr: mean(&collect(|r| r.resting_hr)),
      avg_steps: mean(&collect(|r| r.steps)),
      avg_body_battery: mean(&collect(|r| r.body_battery)),
      sick_days: count_status(HealthStatus::Sick),
      injured_days: count_status(HealthStatus::Injured),
      rest_days: count_status(HealthStatus::RestDay),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Sparse weekly sequences
/// ---------------------------------------------------------------------------

/// One aggregate per non-empty week, chronological. Weeks with no records
/// produce no aggregate.
pub fn weekly_training(records: &[TrainingRecord]) -> Vec<TrainingWeek> {
  group_by_week(records)
    .iter()
    .map(|(&ws, recs)| TrainingWeek::compute(recs, ws, &week_label(ws)))
    .collect()
}

pub fn weekly_running(records: &[TrainingRecord]) -> Vec<RunningWeek> {
  group_by_week(records)
    .iter()
    .filter(|(_, recs)| recs.iter().any(|r| r.training_type == TrainingType::Running))
    .map(|(&ws, recs)| RunningWeek::compute(recs, ws, &week_label(ws)))
    .collect()
}

pub fn weekly_health(records: &[HealthRecord]) -> Vec<HealthWeek> {
  group_by_week(records)
    .iter()
    .map(|(&ws, recs)| HealthWeek::compute(recs, ws, &week_label(ws)))
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Feeling;
  use crate::test_utils::{health_record, run_record, strength_record, training_record};

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn test_training_week_sums_and_counts() {
    let run_a = run_record("2026-02-03", 5.0, Some(50.0));
    let run_b = run_record("2026-02-05", 10.0, Some(80.0));
    let gym = strength_record("2026-02-03", 4200.0);
    let records = vec![&run_a, &run_b, &gym];

    let tw = TrainingWeek::compute(&records, d(2026, 2, 2), "wk");

    assert_eq!(tw.sessions, 3);
    assert_eq!(tw.active_days, 2); // two sessions share Feb 3
    assert_eq!(tw.running_count, 2);
    assert!((tw.running_km - 15.0).abs() < f64::EPSILON);
    assert_eq!(tw.longest_run_km, Some(10.0));
    assert_eq!(tw.gym_sessions, 1);
    assert!((tw.gym_volume_kg - 4200.0).abs() < f64::EPSILON);
    assert_eq!(tw.gym_volume_per_session, Some(4200.0));
  }

  #[test]
  fn test_training_week_order_independent() {
    let a = run_record("2026-02-03", 5.0, Some(50.0));
    let b = run_record("2026-02-05", 10.0, Some(80.0));
    let c = strength_record("2026-02-06", 3000.0);

    let forward = TrainingWeek::compute(&[&a, &b, &c], d(2026, 2, 2), "wk");
    let shuffled = TrainingWeek::compute(&[&c, &a, &b], d(2026, 2, 2), "wk");
    assert_eq!(forward, shuffled);
  }

  #[test]
  fn test_feeling_metrics_absent_when_no_feelings() {
    let mut a = run_record("2026-02-03", 5.0, None);
    a.feeling = None;
    let tw = TrainingWeek::compute(&[&a], d(2026, 2, 2), "wk");
    assert_eq!(tw.feeling_avg, None);
    assert_eq!(tw.feeling_good_pct, None);
  }

  #[test]
  fn test_feeling_good_pct() {
    let mut great = run_record("2026-02-03", 5.0, None);
    great.feeling = Some(Feeling::Great);
    let mut tired = run_record("2026-02-04", 5.0, None);
    tired.feeling = Some(Feeling::Tired);

    let tw = TrainingWeek::compute(&[&great, &tired], d(2026, 2, 2), "wk");
    assert_eq!(tw.feeling_good_pct, Some(50.0));
    assert_eq!(tw.tough_sessions, 1);
    assert_eq!(tw.feeling_avg, Some(3.5));
  }

  #[test]
  fn test_running_week_present_only_means() {
    // One run with power, one without: the mean covers only the run that
    // has the metric, it is not dragged down by an implicit zero.
    let mut with_power = run_record("2026-02-03", 5.0, Some(50.0));
    with_power.power_w = Some(260.0);
    let mut without_power = run_record("2026-02-05", 10.0, Some(80.0));
    without_power.power_w = None;

    let rw = RunningWeek::compute(&[&with_power, &without_power], d(2026, 2, 2), "wk");
    assert_eq!(rw.avg_power_w, Some(260.0));
    assert!((rw.total_rss - 130.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_running_week_no_zero_for_missing_metric() {
    let mut run = run_record("2026-02-03", 5.0, Some(50.0));
    run.cadence_spm = None;
    run.avg_hr = None;
    let rw = RunningWeek::compute(&[&run], d(2026, 2, 2), "wk");
    assert_eq!(rw.avg_cadence_spm, None);
    assert_eq!(rw.avg_hr, None);
    assert_eq!(rw.power_to_hr_ratio, None);
  }

  #[test]
  fn test_running_week_ignores_non_runs() {
    let gym = strength_record("2026-02-03", 3000.0);
    let run = run_record("2026-02-04", 8.0, Some(60.0));
    let rw = RunningWeek::compute(&[&gym, &run], d(2026, 2, 2), "wk");
    assert_eq!(rw.run_count, 1);
    assert!((rw.total_km - 8.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_running_week_pace() {
    let mut run = run_record("2026-02-03", 10.0, None);
    run.duration_min = Some(55.0);
    let rw = RunningWeek::compute(&[&run], d(2026, 2, 2), "wk");
    assert_eq!(rw.avg_pace_min_per_km, Some(5.5));
  }

  #[test]
  fn test_health_week_means_and_statuses() {
    let a = health_record("2026-02-03", Some(7.5), Some(55.0), Some(70.0));
    let b = health_record("2026-02-04", Some(6.5), Some(57.0), None);
    let mut sick = health_record("2026-02-05", None, None, None);
    sick.status = Some(HealthStatus::Sick);

    let hw = HealthWeek::compute(&[&a, &b, &sick], d(2026, 2, 2), "wk");
    assert_eq!(hw.entries, 3);
    assert_eq!(hw.avg_sleep_hours, Some(7.0));
    assert_eq!(hw.avg_resting_hr, Some(56.0));
    // Only one record carries body battery: mean over that one record.
    assert_eq!(hw.avg_body_battery, Some(70.0));
    assert_eq!(hw.sick_days, 1);
  }

  #[test]
  fn test_health_week_absent_metrics_stay_absent() {
    let a = health_record("2026-02-03", None, None, None);
    let hw = HealthWeek::compute(&[&a], d(2026, 2, 2), "wk");
    assert_eq!(hw.avg_sleep_hours, None);
    assert_eq!(hw.avg_resting_hr, None);
    assert_eq!(hw.avg_steps, None);
    assert_eq!(hw.avg_body_battery, None);
  }

  #[test]
  fn test_weekly_sequences_are_sparse_and_sorted() {
    let records = vec![
      training_record("2026-02-25"),
      training_record("2026-02-03"),
      training_record("2026-02-05"),
    ];
    let weeks = weekly_training(&records);
    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0].week_start, d(2026, 2, 2));
    assert_eq!(weeks[1].week_start, d(2026, 2, 23));
    assert_eq!(weeks[0].sessions, 2);
  }

  #[test]
  fn test_weekly_running_skips_runless_weeks() {
    let records = vec![
      run_record("2026-02-03", 5.0, Some(50.0)),
      strength_record("2026-02-10", 3000.0),
    ];
    let weeks = weekly_running(&records);
    assert_eq!(weeks.len(), 1);
    assert_eq!(weeks[0].week_start, d(2026, 2, 2));
  }

  #[test]
  fn test_empty_input_empty_output() {
    assert!(weekly_training(&[]).is_empty());
    assert!(weekly_running(&[]).is_empty());
    assert!(weekly_health(&[]).is_empty());
  }
}
