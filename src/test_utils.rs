//! Shared record and aggregate factories for unit tests.

use chrono::NaiveDate;

use crate::aggregate::{HealthWeek, RunningWeek, TrainingWeek};
use crate::load::{LoadPoint, LoadZone};
use crate::models::{HealthRecord, TrainingRecord, TrainingType};

fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn monday() -> NaiveDate {
  NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn base_record(date_str: &str) -> TrainingRecord {
  TrainingRecord {
    date: date(date_str),
    name: "Session".to_string(),
    training_type: TrainingType::Specifics,
    duration_min: Some(45.0),
    distance_km: None,
    volume_kg: None,
    feeling: None,
    avg_hr: None,
    power_w: None,
    rss: None,
    critical_power_w: None,
    cadence_spm: None,
    stride_length_m: None,
    ground_contact_ms: None,
    vertical_oscillation_cm: None,
    leg_spring_stiffness: None,
    rpe: None,
    source: "Manual".to_string(),
    external_id: format!("test-{date_str}"),
  }
}

pub fn training_record(date_str: &str) -> TrainingRecord {
  base_record(date_str)
}

pub fn run_record(date_str: &str, km: f64, rss: Option<f64>) -> TrainingRecord {
  TrainingRecord {
    name: "Run".to_string(),
    training_type: TrainingType::Running,
    duration_min: Some(30.0),
    distance_km: Some(km),
    rss,
    external_id: format!("test-run-{date_str}"),
    ..base_record(date_str)
  }
}

pub fn strength_record(date_str: &str, volume_kg: f64) -> TrainingRecord {
  TrainingRecord {
    name: "Strength".to_string(),
    training_type: TrainingType::GymStrength,
    duration_min: Some(60.0),
    volume_kg: Some(volume_kg),
    external_id: format!("test-gym-{date_str}"),
    ..base_record(date_str)
  }
}

pub fn health_record(
  date_str: &str,
  sleep_hours: Option<f64>,
  resting_hr: Option<f64>,
  body_battery: Option<f64>,
) -> HealthRecord {
  HealthRecord {
    date: date(date_str),
    sleep_hours,
    sleep_quality: None,
    resting_hr,
    steps: None,
    body_battery,
    status: None,
    external_id: format!("test-health-{date_str}"),
  }
}

pub fn training_week(
  sessions: usize,
  total_duration_min: f64,
  running_km: f64,
  gym_volume_kg: f64,
) -> TrainingWeek {
  let gym_sessions = usize::from(gym_volume_kg > 0.0);
  TrainingWeek {
    week_start: monday(),
    label: "Mar 02 – Mar 08".to_string(),
    sessions,
    active_days: sessions.min(7),
    total_duration_min,
    running_count: usize::from(running_km > 0.0) * 2,
    running_km,
    longest_run_km: None,
    gym_sessions,
    gym_volume_kg,
    gym_volume_per_session: (gym_sessions > 0).then(|| gym_volume_kg / gym_sessions as f64),
    feeling_avg: None,
    feeling_good_pct: None,
    tough_sessions: 0,
  }
}

pub fn running_week(run_count: usize, total_km: f64, total_rss: f64) -> RunningWeek {
  RunningWeek {
    week_start: monday(),
    label: "Mar 02 – Mar 08".to_string(),
    run_count,
    total_km,
    total_duration_min: 0.0,
    total_rss,
    avg_rss_per_run: (run_count > 0).then(|| total_rss / run_count as f64),
    avg_power_w: None,
    avg_critical_power_w: None,
    avg_cadence_spm: None,
    avg_stride_length_m: None,
    avg_ground_contact_ms: None,
    avg_vertical_oscillation_cm: None,
    avg_leg_spring_stiffness: None,
    avg_rpe: None,
    avg_hr: None,
    power_to_hr_ratio: None,
    avg_pace_min_per_km: None,
  }
}

pub fn health_week(
  sleep_hours: Option<f64>,
  resting_hr: Option<f64>,
  body_battery: Option<f64>,
) -> HealthWeek {
  HealthWeek {
    week_start: monday(),
    label: "Mar 02 – Mar 08".to_string(),
    entries: 1,
    avg_sleep_hours: sleep_hours,
    sleep_quality_mode: None,
    avg_resting_hr: resting_hr,
    avg_steps: None,
    avg_body_battery: body_battery,
    sick_days: 0,
    injured_days: 0,
    rest_days: 0,
  }
}

pub fn load_point(zone: LoadZone, acwr: Option<f64>) -> LoadPoint {
  LoadPoint {
    week_start: monday(),
    acute: Some(100.0),
    chronic: acwr.map(|a| 100.0 / a),
    acwr,
    zone,
  }
}
