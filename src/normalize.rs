//! Record normalization: one raw source payload in, one canonical record
//! out.
//!
//! Each source has its own quirks (Hevy nests sets, Garmin reports meters
//! and seconds, Stryd uses unix timestamps and zero-means-unset fields,
//! Notion wraps everything in property JSON). Missing optional numerics
//! stay absent rather than becoming zero. Batch normalization skips and
//! reports malformed payloads; it never aborts the batch.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::{Feeling, HealthRecord, HealthStatus, TrainingRecord, TrainingType};

/// A payload that cannot become a canonical record. The `&'static str` is
/// the source tag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedRecord {
  #[error("{0}: missing or unparseable date")]
  Date(&'static str),
  #[error("{0}: missing external id")]
  ExternalId(&'static str),
}

/// Applies `normalize` to every payload, splitting results from failures.
/// Failures are logged and returned; the batch always completes.
pub fn normalize_batch<P, T>(
  payloads: &[P],
  normalize: impl Fn(&P) -> Result<T, MalformedRecord>,
) -> (Vec<T>, Vec<MalformedRecord>) {
  let mut records = Vec::with_capacity(payloads.len());
  let mut failures = Vec::new();
  for payload in payloads {
    match normalize(payload) {
      Ok(record) => records.push(record),
      Err(err) => {
        warn!("skipping record: {err}");
        failures.push(err);
      }
    }
  }
  (records, failures)
}

fn positive(value: Option<f64>) -> Option<f64> {
  value.filter(|v| *v > 0.0)
}

/// ---------------------------------------------------------------------------
/// Hevy
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct HevyWorkout {
  pub id: Option<String>,
  pub title: Option<String>,
  pub start_time: Option<String>,
  pub end_time: Option<String>,
  #[serde(default)]
  pub exercises: Vec<HevyExercise>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HevyExercise {
  pub title: Option<String>,
  pub notes: Option<String>,
  #[serde(default)]
  pub sets: Vec<HevySet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HevySet {
  pub weight_kg: Option<f64>,
  pub reps: Option<f64>,
  pub distance_meters: Option<f64>,
  pub duration_seconds: Option<f64>,
}

/// Total volume over all sets: Σ weight_kg × reps.
pub fn hevy_volume(exercises: &[HevyExercise]) -> f64 {
  exercises
    .iter()
    .flat_map(|ex| &ex.sets)
    .map(|s| s.weight_kg.unwrap_or(0.0) * s.reps.unwrap_or(0.0))
    .sum()
}

/// Hevy workouts are always strength sessions. The date is the first ten
/// characters of `start_time`; the duration is end minus start in minutes.
pub fn normalize_hevy(workout: &HevyWorkout) -> Result<TrainingRecord, MalformedRecord> {
  let date = workout
    .start_time
    .as_deref()
    .and_then(|s| s.get(..10))
    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    .ok_or(MalformedRecord::Date("hevy"))?;

  let id = workout
    .id
    .as_deref()
    .filter(|id| !id.is_empty())
    .ok_or(MalformedRecord::ExternalId("hevy"))?;

  let duration_min = match (workout.start_time.as_deref(), workout.end_time.as_deref()) {
    (Some(start), Some(end)) => {
      match (
        DateTime::parse_from_rfc3339(start),
        DateTime::parse_from_rfc3339(end),
      ) {
        (Ok(s), Ok(e)) => positive(Some((e - s).num_seconds() as f64 / 60.0)),
        _ => None,
      }
    }
    _ => None,
  };

  Ok(TrainingRecord {
    date,
    name: workout
      .title
      .clone()
      .unwrap_or_else(|| "Hevy Workout".to_string()),
    training_type: TrainingType::GymStrength,
    duration_min,
    distance_km: None,
    volume_kg: Some(hevy_volume(&workout.exercises)),
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
    feeling: None,
    source: "Hevy".to_string(),
    external_id: format!("hevy-{id}"),
  })
}

/// ---------------------------------------------------------------------------
/// Garmin
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivity {
  pub activity_id: Option<i64>,
  pub activity_name: Option<String>,
  pub start_time_local: Option<String>,
  /// Seconds.
  pub duration: Option<f64>,
  /// Meters.
  pub distance: Option<f64>,
  #[serde(rename = "averageHR")]
  pub average_hr: Option<f64>,
  pub activity_type: Option<GarminActivityType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivityType {
  pub type_key: Option<String>,
}

pub fn garmin_training_type(type_key: &str) -> TrainingType {
  match type_key.to_lowercase().as_str() {
    "running" | "trail_running" | "treadmill_running" => TrainingType::Running,
    "strength_training" => TrainingType::GymStrength,
    "hiit" => TrainingType::GymCrossfit,
    "walking" => TrainingType::Mobility,
    _ => TrainingType::Specifics,
  }
}

pub fn normalize_garmin_activity(
  activity: &GarminActivity,
) -> Result<TrainingRecord, MalformedRecord> {
  let date = activity
    .start_time_local
    .as_deref()
    .and_then(|s| s.get(..10))
    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    .ok_or(MalformedRecord::Date("garmin"))?;

  let id = activity
    .activity_id
    .ok_or(MalformedRecord::ExternalId("garmin"))?;

  let type_key = activity
    .activity_type
    .as_ref()
    .and_then(|t| t.type_key.as_deref())
    .unwrap_or("other");

  Ok(TrainingRecord {
    date,
    name: activity
      .activity_name
      .clone()
      .unwrap_or_else(|| "Garmin Activity".to_string()),
    training_type: garmin_training_type(type_key),
    duration_min: positive(activity.duration.map(|s| s / 60.0)),
    distance_km: positive(activity.distance.map(|m| m / 1000.0)),
    volume_kg: None,
    avg_hr: positive(activity.average_hr),
    power_w: None,
    rss: None,
    critical_power_w: None,
    cadence_spm: None,
    stride_length_m: None,
    ground_contact_ms: None,
    vertical_oscillation_cm: None,
    leg_spring_stiffness: None,
    rpe: None,
    feeling: None,
    source: "Garmin".to_string(),
    external_id: format!("garmin-{id}"),
  })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminSleep {
  #[serde(rename = "dailySleepDTO")]
  pub daily_sleep_dto: Option<GarminSleepDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminSleepDto {
  pub sleep_time_seconds: Option<f64>,
  pub sleep_quality_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GarminStepsEntry {
  pub steps: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminRestingHr {
  pub resting_heart_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GarminBatteryEntry {
  pub charged: Option<f64>,
}

/// One day of Garmin wellness data, each endpoint optional since they are
/// fetched independently and any of them can fail.
pub fn normalize_garmin_health(
  date: NaiveDate,
  sleep: Option<&GarminSleep>,
  steps: &[GarminStepsEntry],
  resting: Option<&GarminRestingHr>,
  battery: &[GarminBatteryEntry],
) -> HealthRecord {
  let dto = sleep.and_then(|s| s.daily_sleep_dto.as_ref());
  let sleep_hours = positive(
    dto
      .and_then(|d| d.sleep_time_seconds)
      .map(|secs| secs / 3600.0),
  );
  let sleep_quality = dto.and_then(|d| d.sleep_quality_type.clone());

  let step_total: f64 = steps.iter().filter_map(|e| e.steps).sum();
  let body_battery = battery
    .iter()
    .filter_map(|e| e.charged)
    .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |cur| cur.max(v))));

  HealthRecord {
    date,
    sleep_hours,
    sleep_quality,
    resting_hr: positive(resting.and_then(|r| r.resting_heart_rate)),
    steps: if steps.is_empty() { None } else { Some(step_total) },
    body_battery,
    status: None,
    external_id: format!("garmin-health-{date}"),
  }
}

/// ---------------------------------------------------------------------------
/// Stryd
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StrydActivity {
  /// Unix seconds; also the external id.
  pub timestamp: Option<i64>,
  pub name: Option<String>,
  /// Seconds.
  pub moving_time: Option<f64>,
  /// Meters.
  pub distance: Option<f64>,
  pub average_heart_rate: Option<f64>,
  pub average_power: Option<f64>,
  /// Critical power.
  pub ftp: Option<f64>,
  /// Running stress score.
  pub stress: Option<f64>,
  pub average_cadence: Option<f64>,
  pub average_stride_length: Option<f64>,
  pub average_ground_time: Option<f64>,
  pub average_oscillation: Option<f64>,
  pub average_leg_spring: Option<f64>,
  /// 1-10 from the post-run report; 0 means not entered.
  pub rpe: Option<i64>,
  pub feel: Option<String>,
}

fn stryd_feeling(feel: Option<&str>, rpe: Option<i64>) -> Option<Feeling> {
  if let Some(feel) = feel.filter(|f| !f.is_empty()) {
    return match feel.to_lowercase().as_str() {
      "great" => Some(Feeling::Great),
      "good" | "normal" | "ok" => Some(Feeling::Good),
      "bad" => Some(Feeling::Tired),
      "terrible" => Some(Feeling::Exhausted),
      _ => None,
    };
  }
  // No feel entered: derive from perceived exertion.
  match rpe? {
    1..=2 => Some(Feeling::Great),
    3..=4 => Some(Feeling::Good),
    5..=6 => Some(Feeling::Okay),
    7..=8 => Some(Feeling::Tired),
    9..=10 => Some(Feeling::Exhausted),
    _ => None,
  }
}

pub fn normalize_stryd(activity: &StrydActivity) -> Result<TrainingRecord, MalformedRecord> {
  let ts = activity
    .timestamp
    .filter(|ts| *ts > 0)
    .ok_or(MalformedRecord::Date("stryd"))?;
  let date = DateTime::from_timestamp(ts, 0)
    .ok_or(MalformedRecord::Date("stryd"))?
    .date_naive();

  let rpe = activity.rpe.filter(|v| *v > 0);

  Ok(TrainingRecord {
    date,
    name: activity
      .name
      .clone()
      .filter(|n| !n.is_empty())
      .unwrap_or_else(|| "Stryd Run".to_string()),
    training_type: TrainingType::Running,
    duration_min: positive(activity.moving_time.map(|s| s / 60.0)),
    distance_km: positive(activity.distance.map(|m| m / 1000.0)),
    volume_kg: None,
    avg_hr: positive(activity.average_heart_rate),
    power_w: positive(activity.average_power),
    rss: positive(activity.stress),
    critical_power_w: positive(activity.ftp),
    cadence_spm: positive(activity.average_cadence),
    stride_length_m: positive(activity.average_stride_length),
    ground_contact_ms: positive(activity.average_ground_time),
    vertical_oscillation_cm: positive(activity.average_oscillation),
    leg_spring_stiffness: positive(activity.average_leg_spring),
    rpe,
    feeling: stryd_feeling(activity.feel.as_deref(), rpe),
    source: "Stryd".to_string(),
    external_id: format!("stryd-{ts}"),
  })
}

/// ---------------------------------------------------------------------------
/// Notion pages
/// ---------------------------------------------------------------------------

fn prop<'a>(page: &'a Value, name: &str) -> Option<&'a Value> {
  page.get("properties")?.get(name)
}

fn prop_text(page: &Value, name: &str) -> Option<String> {
  let p = prop(page, name)?;
  for key in ["title", "rich_text"] {
    if let Some(first) = p.get(key).and_then(|items| items.get(0)) {
      return first
        .get("plain_text")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    }
  }
  None
}

fn prop_number(page: &Value, name: &str) -> Option<f64> {
  prop(page, name)?.get("number")?.as_f64()
}

fn prop_select(page: &Value, name: &str) -> Option<String> {
  prop(page, name)?
    .get("select")?
    .get("name")?
    .as_str()
    .map(str::to_string)
}

fn prop_date(page: &Value, name: &str) -> Option<NaiveDate> {
  let start = prop(page, name)?.get("date")?.get("start")?.as_str()?;
  NaiveDate::parse_from_str(start.get(..10)?, "%Y-%m-%d").ok()
}

/// Flattens a training session page read back from the store.
pub fn normalize_notion_training(page: &Value) -> Result<TrainingRecord, MalformedRecord> {
  let date = prop_date(page, "Date").ok_or(MalformedRecord::Date("notion"))?;
  let external_id = prop_text(page, "External ID")
    .filter(|id| !id.is_empty())
    .ok_or(MalformedRecord::ExternalId("notion"))?;

  let training_type = prop_select(page, "Training Type")
    .map(|name| TrainingType::from_name(&name))
    .unwrap_or(TrainingType::Unknown);

  Ok(TrainingRecord {
    date,
    name: prop_text(page, "Name").unwrap_or_default(),
    training_type,
    duration_min: prop_number(page, "Duration (min)"),
    distance_km: prop_number(page, "Distance (km)"),
    volume_kg: prop_number(page, "Volume (kg)"),
    avg_hr: prop_number(page, "Avg Heart Rate"),
    power_w: prop_number(page, "Power (W)"),
    rss: prop_number(page, "RSS"),
    critical_power_w: prop_number(page, "Critical Power (W)"),
    cadence_spm: prop_number(page, "Cadence (spm)"),
    stride_length_m: prop_number(page, "Stride Length (m)"),
    ground_contact_ms: prop_number(page, "Ground Contact (ms)"),
    vertical_oscillation_cm: prop_number(page, "Vertical Oscillation (cm)"),
    leg_spring_stiffness: prop_number(page, "Leg Spring Stiffness"),
    rpe: prop_number(page, "RPE").map(|v| v as i64),
    feeling: prop_select(page, "Feeling").and_then(|name| Feeling::from_name(&name)),
    source: prop_select(page, "Source").unwrap_or_default(),
    external_id,
  })
}

/// Flattens a health log page read back from the store.
pub fn normalize_notion_health(page: &Value) -> Result<HealthRecord, MalformedRecord> {
  let date = prop_date(page, "Date").ok_or(MalformedRecord::Date("notion"))?;
  let external_id = prop_text(page, "External ID")
    .filter(|id| !id.is_empty())
    .ok_or(MalformedRecord::ExternalId("notion"))?;

  Ok(HealthRecord {
    date,
    sleep_hours: prop_number(page, "Sleep Duration (h)"),
    sleep_quality: prop_select(page, "Sleep Quality"),
    resting_hr: prop_number(page, "Resting HR"),
    steps: prop_number(page, "Steps"),
    body_battery: prop_number(page, "Body Battery"),
    status: prop_select(page, "Status").and_then(|name| HealthStatus::from_name(&name)),
    external_id,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
