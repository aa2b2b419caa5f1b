//! Trend classification, week-over-week deltas, and deterministic insight
//! strings for the dashboard.
//!
//! All generators take aggregate slices ordered most-recent-first (index 0
//! is the current week/period, the rest are the comparison history) and are
//! pure: same input, same strings.

use serde::{Deserialize, Serialize};

use crate::aggregate::{mean, HealthWeek, RunningWeek, TrainingWeek};
use crate::load::{LoadPoint, LoadZone};

/// ---------------------------------------------------------------------------
/// Trend direction
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
  Up,
  Down,
  Stable,
}

impl Trend {
  pub fn arrow(&self) -> &'static str {
    match self {
      Trend::Up => "↑",
      Trend::Down => "↓",
      Trend::Stable => "→",
    }
  }
}

/// Compares to the previous value with a ±5% stability band. A previous
/// value of zero makes any nonzero current an `Up`.
pub fn trend_direction(current: f64, previous: f64) -> Trend {
  if previous == 0.0 {
    return if current == 0.0 { Trend::Stable } else { Trend::Up };
  }
  let pct_change = (current - previous) / previous.abs();
  if pct_change > 0.05 {
    Trend::Up
  } else if pct_change < -0.05 {
    Trend::Down
  } else {
    Trend::Stable
  }
}

/// Option-aware variant for sparse metrics.
pub fn trend_of(current: Option<f64>, previous: Option<f64>) -> Option<Trend> {
  match (current, previous) {
    (Some(c), Some(p)) => Some(trend_direction(c, p)),
    _ => None,
  }
}

/// ---------------------------------------------------------------------------
/// Deltas
/// ---------------------------------------------------------------------------

fn diff(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
  match (current, previous) {
    (Some(c), Some(p)) => Some(c - p),
    _ => None,
  }
}

/// Signed field-by-field change vs the preceding week. `None` whenever
/// either side lacks the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDelta {
  pub sessions: f64,
  pub total_duration_min: f64,
  pub running_km: f64,
  pub gym_volume_kg: f64,
  pub feeling_avg: Option<f64>,
}

impl TrainingDelta {
  pub fn between(current: &TrainingWeek, previous: &TrainingWeek) -> Self {
    Self {
      sessions: current.sessions as f64 - previous.sessions as f64,
      total_duration_min: current.total_duration_min - previous.total_duration_min,
      running_km: current.running_km - previous.running_km,
      gym_volume_kg: current.gym_volume_kg - previous.gym_volume_kg,
      feeling_avg: diff(current.feeling_avg, previous.feeling_avg),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningDelta {
  pub total_km: f64,
  pub total_rss: f64,
  pub avg_power_w: Option<f64>,
  pub avg_hr: Option<f64>,
  pub avg_cadence_spm: Option<f64>,
  pub avg_pace_min_per_km: Option<f64>,
}

impl RunningDelta {
  pub fn between(current: &RunningWeek, previous: &RunningWeek) -> Self {
    Self {
      total_km: current.total_km - previous.total_km,
      total_rss: current.total_rss - previous.total_rss,
      avg_power_w: diff(current.avg_power_w, previous.avg_power_w),
      avg_hr: diff(current.avg_hr, previous.avg_hr),
      avg_cadence_spm: diff(current.avg_cadence_spm, previous.avg_cadence_spm),
      avg_pace_min_per_km: diff(current.avg_pace_min_per_km, previous.avg_pace_min_per_km),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDelta {
  pub avg_sleep_hours: Option<f64>,
  pub avg_resting_hr: Option<f64>,
  pub avg_steps: Option<f64>,
  pub avg_body_battery: Option<f64>,
}

impl HealthDelta {
  pub fn between(current: &HealthWeek, previous: &HealthWeek) -> Self {
    Self {
      avg_sleep_hours: diff(current.avg_sleep_hours, previous.avg_sleep_hours),
      avg_resting_hr: diff(current.avg_resting_hr, previous.avg_resting_hr),
      avg_steps: diff(current.avg_steps, previous.avg_steps),
      avg_body_battery: diff(current.avg_body_battery, previous.avg_body_battery),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Formatting helpers
/// ---------------------------------------------------------------------------

/// Number with up to `decimals` places, trailing zeros trimmed.
pub(crate) fn fmt_num(value: f64, decimals: usize) -> String {
  let s = format!("{value:.decimals$}");
  if s.contains('.') {
    s.trim_end_matches('0').trim_end_matches('.').to_string()
  } else {
    s
  }
}

fn prior_mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
  let present: Vec<f64> = values.flatten().collect();
  mean(&present)
}

fn arrow_of(current: f64, prior: f64) -> &'static str {
  trend_direction(current, prior).arrow()
}

/// ---------------------------------------------------------------------------
/// Weekly trend insights
/// ---------------------------------------------------------------------------

/// One line per training metric, current week vs the prior weeks' average.
pub fn generate_training_insights(weeks: &[TrainingWeek]) -> Vec<String> {
  let Some((current, prior)) = weeks.split_first() else {
    return Vec::new();
  };

  if prior.is_empty() {
    return vec![
      format!("Sessions: {}", current.sessions),
      format!("Duration: {}min", fmt_num(current.total_duration_min, 1)),
      format!("Gym volume: {}kg", fmt_num(current.gym_volume_kg, 1)),
      format!("Running: {}km", fmt_num(current.running_km, 1)),
    ];
  }

  let avg_sessions = mean(&prior.iter().map(|w| w.sessions as f64).collect::<Vec<_>>())
    .unwrap_or(0.0);
  let avg_duration = mean(&prior.iter().map(|w| w.total_duration_min).collect::<Vec<_>>())
    .unwrap_or(0.0);
  let avg_volume = mean(&prior.iter().map(|w| w.gym_volume_kg).collect::<Vec<_>>())
    .unwrap_or(0.0);
  let avg_running = mean(&prior.iter().map(|w| w.running_km).collect::<Vec<_>>())
    .unwrap_or(0.0);

  vec![
    format!(
      "{} Sessions: {} (avg {})",
      arrow_of(current.sessions as f64, avg_sessions),
      current.sessions,
      fmt_num(avg_sessions, 1)
    ),
    format!(
      "{} Duration: {}min (avg {}min)",
      arrow_of(current.total_duration_min, avg_duration),
      fmt_num(current.total_duration_min, 1),
      fmt_num(avg_duration, 1)
    ),
    format!(
      "{} Gym volume: {}kg (avg {}kg)",
      arrow_of(current.gym_volume_kg, avg_volume),
      fmt_num(current.gym_volume_kg, 1),
      fmt_num(avg_volume, 1)
    ),
    format!(
      "{} Running: {}km (avg {}km)",
      arrow_of(current.running_km, avg_running),
      fmt_num(current.running_km, 1),
      fmt_num(avg_running, 1)
    ),
  ]
}

/// One line per health metric, skipping metrics the current week never
/// recorded.
pub fn generate_health_insights(weeks: &[HealthWeek]) -> Vec<String> {
  let Some((current, prior)) = weeks.split_first() else {
    return Vec::new();
  };

  let mut insights = Vec::new();

  let mut line = |label: &str,
                  unit: &str,
                  decimals: usize,
                  current_val: Option<f64>,
                  prior_avg: Option<f64>| {
    let Some(cur) = current_val else { return };
    match prior_avg {
      Some(avg) => insights.push(format!(
        "{} {label}: {}{unit} (avg {}{unit})",
        arrow_of(cur, avg),
        fmt_num(cur, decimals),
        fmt_num(avg, decimals)
      )),
      None => insights.push(format!("{label}: {}{unit}", fmt_num(cur, decimals))),
    }
  };

  line(
    "Sleep",
    "h",
    1,
    current.avg_sleep_hours,
    prior_mean(prior.iter().map(|w| w.avg_sleep_hours)),
  );
  line(
    "Resting HR",
    "bpm",
    1,
    current.avg_resting_hr,
    prior_mean(prior.iter().map(|w| w.avg_resting_hr)),
  );
  line(
    "Steps",
    "",
    0,
    current.avg_steps,
    prior_mean(prior.iter().map(|w| w.avg_steps)),
  );
  line(
    "Body battery",
    "",
    1,
    current.avg_body_battery,
    prior_mean(prior.iter().map(|w| w.avg_body_battery)),
  );

  insights
}

/// ---------------------------------------------------------------------------
/// Takeaways
/// ---------------------------------------------------------------------------

pub fn generate_training_takeaway(weeks: &[TrainingWeek]) -> String {
  let Some(current) = weeks.first().filter(|w| w.sessions > 0) else {
    return "No training data this week.".to_string();
  };

  let mut parts = vec![format!(
    "{} sessions, {} active days",
    current.sessions, current.active_days
  )];
  if current.gym_volume_kg > 0.0 {
    parts.push(format!("{}kg gym volume", fmt_num(current.gym_volume_kg, 1)));
  }
  if current.running_km > 0.0 {
    parts.push(format!("{}km running", fmt_num(current.running_km, 1)));
  }
  if let Some(feeling) = current.feeling_avg {
    parts.push(format!("avg feeling {}/5", fmt_num(feeling, 1)));
  }

  format!("This week: {}.", parts.join(", "))
}

pub fn generate_health_takeaway(weeks: &[HealthWeek]) -> String {
  let Some(current) = weeks.first().filter(|w| w.entries > 0) else {
    return "No health data this week.".to_string();
  };

  let mut parts = Vec::new();
  if let Some(sleep) = current.avg_sleep_hours {
    parts.push(format!("{}h avg sleep", fmt_num(sleep, 1)));
  }
  if let Some(hr) = current.avg_resting_hr {
    parts.push(format!("{}bpm resting HR", fmt_num(hr, 1)));
  }
  if let Some(steps) = current.avg_steps {
    parts.push(format!("{} avg steps", fmt_num(steps, 0)));
  }
  if current.sick_days > 0 {
    parts.push(format!("{} sick days", current.sick_days));
  }

  if parts.is_empty() {
    return "Health data logged but no specific metrics this week.".to_string();
  }
  format!("This week: {}.", parts.join(", "))
}

pub fn generate_running_takeaway(periods: &[RunningWeek]) -> String {
  let Some(current) = periods.first().filter(|p| p.run_count > 0) else {
    return "No runs this period.".to_string();
  };

  let mut parts = vec![format!(
    "{} runs, {}km",
    current.run_count,
    fmt_num(current.total_km, 1)
  )];
  if let Some(power) = current.avg_power_w {
    parts.push(format!("{}W avg power", fmt_num(power, 1)));
  }
  if let Some(pace) = current.avg_pace_min_per_km {
    let pace_min = pace as u32;
    let pace_sec = ((pace - pace_min as f64) * 60.0) as u32;
    parts.push(format!("{pace_min}:{pace_sec:02}/km avg pace"));
  }
  if let Some(rpe) = current.avg_rpe {
    parts.push(format!("RPE {}", fmt_num(rpe, 1)));
  }

  format!("Running: {}.", parts.join(", "))
}

/// ---------------------------------------------------------------------------
/// Themed insights
/// ---------------------------------------------------------------------------

pub fn generate_running_power_insight(periods: &[RunningWeek]) -> String {
  let Some(current) = periods.first().filter(|p| p.run_count > 0) else {
    return "No running data this period.".to_string();
  };
  let prior = &periods[1..];

  let mut lines = Vec::new();
  if let Some(power) = current.avg_power_w {
    lines.push(format!("Avg Power: {}W", fmt_num(power, 1)));
  }
  let per_run = current
    .avg_rss_per_run
    .map_or_else(|| "-".to_string(), |v| fmt_num(v, 1));
  lines.push(format!(
    "Total RSS: {} ({per_run}/run)",
    fmt_num(current.total_rss, 1)
  ));

  if !prior.is_empty() {
    if let (Some(cur), Some(avg)) = (
      current.avg_power_w,
      prior_mean(prior.iter().map(|p| p.avg_power_w)),
    ) {
      lines.push(format!(
        "{} Power vs prior: {}W avg",
        arrow_of(cur, avg),
        fmt_num(avg, 1)
      ));
    }
    if let Some(avg_rss) = mean(&prior.iter().map(|p| p.total_rss).collect::<Vec<_>>()) {
      lines.push(format!(
        "{} Load vs prior: {} RSS avg",
        arrow_of(current.total_rss, avg_rss),
        fmt_num(avg_rss, 1)
      ));
    }
  }

  if let Some(ratio) = current.power_to_hr_ratio {
    lines.push(format!("Power:HR ratio: {}", fmt_num(ratio, 2)));
  }

  lines.join("\n")
}

pub fn generate_running_biomechanics_insight(periods: &[RunningWeek]) -> String {
  let Some(current) = periods.first().filter(|p| p.run_count > 0) else {
    return "No running biomechanics data.".to_string();
  };
  let prior = &periods[1..];

  let mut lines = Vec::new();
  if let Some(cadence) = current.avg_cadence_spm {
    lines.push(format!("Cadence: {} spm", fmt_num(cadence, 1)));
  }
  if let Some(stride) = current.avg_stride_length_m {
    lines.push(format!("Stride: {}m", fmt_num(stride, 2)));
  }
  if let Some(gct) = current.avg_ground_contact_ms {
    lines.push(format!("Ground Contact: {}ms", fmt_num(gct, 1)));
  }
  if let Some(vo) = current.avg_vertical_oscillation_cm {
    lines.push(format!("Vert Oscillation: {}cm", fmt_num(vo, 1)));
  }
  if let Some(lss) = current.avg_leg_spring_stiffness {
    lines.push(format!("Leg Spring: {}", fmt_num(lss, 1)));
  }

  if !prior.is_empty() {
    if let (Some(cur), Some(avg)) = (
      current.avg_cadence_spm,
      prior_mean(prior.iter().map(|p| p.avg_cadence_spm)),
    ) {
      lines.push(format!(
        "{} Cadence vs prior: {} spm",
        arrow_of(cur, avg),
        fmt_num(avg, 1)
      ));
    }
    if let (Some(cur), Some(avg)) = (
      current.avg_ground_contact_ms,
      prior_mean(prior.iter().map(|p| p.avg_ground_contact_ms)),
    ) {
      lines.push(format!(
        "{} GCT vs prior: {}ms",
        arrow_of(cur, avg),
        fmt_num(avg, 1)
      ));
    }
  }

  if lines.is_empty() {
    "No biomechanics data available.".to_string()
  } else {
    lines.join("\n")
  }
}

pub fn generate_sleep_insight(health_weeks: &[HealthWeek]) -> String {
  let Some(current) = health_weeks.first().filter(|w| w.entries > 0) else {
    return "No sleep data.".to_string();
  };

  let mut lines = Vec::new();
  if let Some(sleep) = current.avg_sleep_hours {
    lines.push(format!("Avg: {}h", fmt_num(sleep, 1)));
  }
  if let Some(quality) = &current.sleep_quality_mode {
    lines.push(format!("Quality: {quality}"));
  }
  if let (Some(cur), Some(avg)) = (
    current.avg_sleep_hours,
    prior_mean(health_weeks[1..].iter().map(|w| w.avg_sleep_hours)),
  ) {
    lines.push(format!(
      "{} vs prior avg {}h",
      arrow_of(cur, avg),
      fmt_num(avg, 1)
    ));
  }

  if lines.is_empty() {
    "No sleep data.".to_string()
  } else {
    lines.join("\n")
  }
}

pub fn generate_hr_insight(health_weeks: &[HealthWeek]) -> String {
  let Some(current) = health_weeks.first().filter(|w| w.entries > 0) else {
    return "No HR data.".to_string();
  };
  let Some(cur_hr) = current.avg_resting_hr else {
    return "No HR data.".to_string();
  };

  let mut lines = vec![format!("Avg: {} bpm", fmt_num(cur_hr, 1))];

  if let Some(avg) = prior_mean(health_weeks[1..].iter().map(|w| w.avg_resting_hr)) {
    let trend = trend_direction(cur_hr, avg);
    // Lower resting HR is the good direction.
    let hint = match trend {
      Trend::Down => "good",
      Trend::Up => "watch",
      Trend::Stable => "stable",
    };
    lines.push(format!(
      "{} vs prior avg {} bpm ({hint})",
      trend.arrow(),
      fmt_num(avg, 1)
    ));
  }

  lines.join("\n")
}

pub fn generate_recovery_health_insight(health_weeks: &[HealthWeek]) -> String {
  let Some(current) = health_weeks.first().filter(|w| w.entries > 0) else {
    return "No recovery data.".to_string();
  };

  let mut lines = Vec::new();
  if let Some(battery) = current.avg_body_battery {
    lines.push(format!("Body Battery: {}", fmt_num(battery, 1)));
  }
  if let Some(steps) = current.avg_steps {
    lines.push(format!("Avg Steps: {}", fmt_num(steps, 0)));
  }
  if current.sick_days > 0 {
    lines.push(format!("Sick days: {}", current.sick_days));
  }
  if current.rest_days > 0 {
    lines.push(format!("Rest days: {}", current.rest_days));
  }

  if let (Some(cur), Some(avg)) = (
    current.avg_body_battery,
    prior_mean(health_weeks[1..].iter().map(|w| w.avg_body_battery)),
  ) {
    lines.push(format!(
      "{} Battery vs prior: {}",
      arrow_of(cur, avg),
      fmt_num(avg, 1)
    ));
  }

  if lines.is_empty() {
    "No recovery data available.".to_string()
  } else {
    lines.join("\n")
  }
}

pub fn generate_running_trend_insight(
  weeks: &[TrainingWeek],
  running: &[RunningWeek],
) -> String {
  let (Some(current_tw), Some(current_rp)) = (weeks.first(), running.first()) else {
    return "No running data.".to_string();
  };
  if current_rp.run_count == 0 {
    return "No running data.".to_string();
  }

  let mut lines = vec![format!(
    "{} runs, {}km",
    current_rp.run_count,
    fmt_num(current_rp.total_km, 1)
  )];
  if let Some(longest) = current_tw.longest_run_km {
    lines.push(format!("Longest: {}km", fmt_num(longest, 1)));
  }
  if let Some(power) = current_rp.avg_power_w {
    lines.push(format!("Avg power: {}W", fmt_num(power, 1)));
  }

  if weeks.len() > 1 {
    let avg_km = mean(&weeks[1..].iter().map(|w| w.running_km).collect::<Vec<_>>())
      .unwrap_or(0.0);
    lines.push(format!(
      "{} Volume vs prior: {}km",
      arrow_of(current_tw.running_km, avg_km),
      fmt_num(avg_km, 1)
    ));
  }

  lines.join("\n")
}

pub fn generate_strength_insight(weeks: &[TrainingWeek]) -> String {
  let Some(current) = weeks.first() else {
    return "No training data.".to_string();
  };
  if current.gym_sessions == 0 {
    return "No gym sessions this period.".to_string();
  }

  let mut lines = vec![format!(
    "{} sessions, {}kg total",
    current.gym_sessions,
    fmt_num(current.gym_volume_kg, 1)
  )];
  if let Some(per_session) = current.gym_volume_per_session {
    lines.push(format!("{}kg/session", fmt_num(per_session, 1)));
  }

  if weeks.len() > 1 {
    let avg_vol = mean(&weeks[1..].iter().map(|w| w.gym_volume_kg).collect::<Vec<_>>())
      .unwrap_or(0.0);
    lines.push(format!(
      "{} Volume vs prior: {}kg",
      arrow_of(current.gym_volume_kg, avg_vol),
      fmt_num(avg_vol, 1)
    ));
  }

  lines.join("\n")
}

pub fn generate_recovery_insight(
  weeks: &[TrainingWeek],
  health_weeks: &[HealthWeek],
) -> String {
  let Some(current_tw) = weeks.first() else {
    return "No data.".to_string();
  };

  let mut lines = Vec::new();
  if let Some(pct) = current_tw.feeling_good_pct {
    lines.push(format!("Feeling good/great: {}%", fmt_num(pct, 1)));
  }
  if current_tw.tough_sessions > 0 {
    lines.push(format!("Tough sessions: {}", current_tw.tough_sessions));
  }

  if let Some(hw) = health_weeks.first().filter(|w| w.entries > 0) {
    if let Some(battery) = hw.avg_body_battery {
      lines.push(format!("Body battery: {}", fmt_num(battery, 1)));
    }
    if let Some(hr) = hw.avg_resting_hr {
      lines.push(format!("Resting HR: {} bpm", fmt_num(hr, 1)));
    }
  }

  if lines.is_empty() {
    "No recovery data.".to_string()
  } else {
    lines.join("\n")
  }
}

/// Load + cross-domain correlation lines. Volume trending up while body
/// battery trends down is the overtraining warning.
pub fn generate_correlation_insight(
  weeks: &[TrainingWeek],
  health_weeks: &[HealthWeek],
  load: Option<&LoadPoint>,
) -> String {
  let mut lines = Vec::new();

  if let Some(point) = load {
    if let Some(acwr) = point.acwr {
      lines.push(format!(
        "Training load: ACWR {} ({})",
        fmt_num(acwr, 2),
        point.zone.as_str()
      ));
      match point.zone {
        LoadZone::Optimal => {
          lines.push("Training load is in the optimal zone (0.8-1.3)".to_string())
        }
        LoadZone::Caution => {
          lines.push("Training load is elevated — monitor recovery closely".to_string())
        }
        LoadZone::Danger => {
          lines.push("Training load spike detected — high injury risk".to_string())
        }
        LoadZone::Detraining => {
          lines.push("Training load is low — consider increasing volume".to_string())
        }
        LoadZone::InsufficientData => {}
      }
    }
  }

  if weeks.len() > 1 && health_weeks.len() > 1 {
    let current_tw = &weeks[0];
    let current_hw = &health_weeks[0];
    let avg_dur = mean(
      &weeks[1..]
        .iter()
        .map(|w| w.total_duration_min)
        .collect::<Vec<_>>(),
    );
    let avg_battery = prior_mean(health_weeks[1..].iter().map(|w| w.avg_body_battery));

    if let (Some(avg_dur), Some(avg_battery), Some(cur_battery)) =
      (avg_dur, avg_battery, current_hw.avg_body_battery)
    {
      let dur_trend = trend_direction(current_tw.total_duration_min, avg_dur);
      let battery_trend = trend_direction(cur_battery, avg_battery);

      if dur_trend == Trend::Up && battery_trend == Trend::Down {
        lines.push(
          "Training volume up while body battery declining — watch for overtraining"
            .to_string(),
        );
      } else if dur_trend == Trend::Up && battery_trend == Trend::Up {
        lines
          .push("Training volume and recovery both improving — good adaptation".to_string());
      }
    }
  }

  if lines.is_empty() {
    "Insufficient data for correlation analysis.".to_string()
  } else {
    lines.join("\n")
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{health_week, load_point, running_week, training_week};

  #[test]
  fn test_trend_band() {
    assert_eq!(trend_direction(105.0, 100.0), Trend::Stable);
    assert_eq!(trend_direction(106.0, 100.0), Trend::Up);
    assert_eq!(trend_direction(95.0, 100.0), Trend::Stable);
    assert_eq!(trend_direction(94.0, 100.0), Trend::Down);
  }

  #[test]
  fn test_trend_zero_previous() {
    assert_eq!(trend_direction(0.0, 0.0), Trend::Stable);
    assert_eq!(trend_direction(5.0, 0.0), Trend::Up);
  }

  #[test]
  fn test_trend_of_missing_side() {
    assert_eq!(trend_of(Some(5.0), None), None);
    assert_eq!(trend_of(None, Some(5.0)), None);
    assert_eq!(trend_of(Some(6.0), Some(5.0)), Some(Trend::Up));
  }

  #[test]
  fn test_fmt_num_trims() {
    assert_eq!(fmt_num(52.0, 1), "52");
    assert_eq!(fmt_num(52.5, 1), "52.5");
    assert_eq!(fmt_num(1.674, 2), "1.67");
    assert_eq!(fmt_num(12000.0, 0), "12000");
  }

  #[test]
  fn test_health_delta_none_propagation() {
    let mut cur = health_week(Some(7.0), Some(55.0), None);
    let prev = health_week(Some(8.0), None, Some(70.0));
    cur.avg_steps = Some(9000.0);

    let delta = HealthDelta::between(&cur, &prev);
    assert_eq!(delta.avg_sleep_hours, Some(-1.0));
    assert_eq!(delta.avg_resting_hr, None);
    assert_eq!(delta.avg_body_battery, None);
    assert_eq!(delta.avg_steps, None);
  }

  #[test]
  fn test_training_insights_single_week() {
    let week = training_week(5, 300.0, 20.0, 4000.0);
    let insights = generate_training_insights(&[week]);
    assert_eq!(insights.len(), 4);
    assert_eq!(insights[0], "Sessions: 5");
    assert_eq!(insights[3], "Running: 20km");
  }

  #[test]
  fn test_training_insights_with_history() {
    let current = training_week(6, 330.0, 22.0, 4000.0);
    let prior = training_week(4, 300.0, 20.0, 4000.0);
    let insights = generate_training_insights(&[current, prior.clone(), prior]);
    assert_eq!(insights[0], "↑ Sessions: 6 (avg 4)");
    assert_eq!(insights[1], "↑ Duration: 330min (avg 300min)");
    assert_eq!(insights[2], "→ Gym volume: 4000kg (avg 4000kg)");
    assert_eq!(insights[3], "↑ Running: 22km (avg 20km)");
  }

  #[test]
  fn test_health_insights_skip_absent_metrics() {
    let current = health_week(Some(7.5), None, Some(70.0));
    let prior = health_week(Some(8.0), None, Some(75.0));
    let insights = generate_health_insights(&[current, prior]);
    assert_eq!(
      insights,
      vec![
        "↓ Sleep: 7.5h (avg 8h)".to_string(),
        "↓ Body battery: 70 (avg 75)".to_string(),
      ]
    );
  }

  #[test]
  fn test_takeaways_on_empty_history() {
    assert_eq!(generate_training_takeaway(&[]), "No training data this week.");
    assert_eq!(generate_health_takeaway(&[]), "No health data this week.");
    assert_eq!(generate_running_takeaway(&[]), "No runs this period.");
  }

  #[test]
  fn test_running_takeaway_pace_format() {
    let mut rw = running_week(3, 30.0, 150.0);
    rw.avg_pace_min_per_km = Some(5.5);
    rw.avg_power_w = Some(260.0);
    let line = generate_running_takeaway(&[rw]);
    assert!(line.contains("5:30/km avg pace"), "was: {line}");
    assert!(line.contains("260W avg power"), "was: {line}");
  }

  #[test]
  fn test_hr_insight_direction_hint() {
    let current = health_week(None, Some(50.0), None);
    let prior = health_week(None, Some(56.0), None);
    let text = generate_hr_insight(&[current, prior]);
    assert!(text.contains("↓"), "was: {text}");
    assert!(text.contains("(good)"), "was: {text}");
  }

  #[test]
  fn test_correlation_overtraining_warning() {
    let lp = load_point(LoadZone::Danger, Some(1.67));
    let cur_tw = training_week(6, 400.0, 30.0, 0.0);
    let prev_tw = training_week(4, 300.0, 20.0, 0.0);
    let cur_hw = health_week(Some(7.0), Some(55.0), Some(55.0));
    let prev_hw = health_week(Some(7.5), Some(54.0), Some(75.0));

    let text = generate_correlation_insight(
      &[cur_tw, prev_tw],
      &[cur_hw, prev_hw],
      Some(&lp),
    );
    assert!(text.contains("ACWR 1.67 (Danger)"), "was: {text}");
    assert!(text.contains("high injury risk"), "was: {text}");
    assert!(text.contains("watch for overtraining"), "was: {text}");
  }

  #[test]
  fn test_correlation_insufficient_data() {
    assert_eq!(
      generate_correlation_insight(&[], &[], None),
      "Insufficient data for correlation analysis."
    );
  }
}
