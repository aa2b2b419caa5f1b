//! Notion block builders for the dashboard page: pure functions from
//! aggregates and insight strings to the block JSON the write path sends.
//!
//! Tables put the current week in the first data row with trend-colored
//! cells; older weeks below give the comparison baseline at a glance.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::aggregate::{HealthWeek, RunningWeek, TrainingWeek};
use crate::anomaly::Overreaching;
use crate::insights::{
  fmt_num, generate_correlation_insight, generate_health_takeaway, generate_hr_insight,
  generate_recovery_health_insight, generate_recovery_insight,
  generate_running_biomechanics_insight, generate_running_power_insight,
  generate_running_takeaway, generate_running_trend_insight, generate_sleep_insight,
  generate_strength_insight, generate_training_takeaway, trend_direction, Trend,
};
use crate::load::LoadPoint;
use crate::models::{HealthRecord, TrainingRecord};
use crate::weeks::{group_by_period, period_boundaries, PeriodType};

/// ---------------------------------------------------------------------------
/// Primitive blocks
/// ---------------------------------------------------------------------------

pub fn build_text(content: &str, bold: bool, color: &str) -> Value {
  let mut rt = json!({"type": "text", "text": {"content": content}});
  let mut annotations = json!({});
  if bold {
    annotations["bold"] = json!(true);
  }
  if color != "default" {
    annotations["color"] = json!(color);
  }
  if annotations.as_object().is_some_and(|a| !a.is_empty()) {
    rt["annotations"] = annotations;
  }
  rt
}

pub fn plain_text(content: &str) -> Value {
  build_text(content, false, "default")
}

pub fn build_heading_2(text: &str) -> Value {
  json!({
    "object": "block",
    "type": "heading_2",
    "heading_2": {"rich_text": [plain_text(text)]},
  })
}

fn icon_emoji(icon: &str) -> &str {
  match icon {
    "info" => "ℹ️",
    "check" => "✅",
    "warning" => "⚠️",
    "chart" => "📊",
    "fire" => "🔥",
    "heart" => "❤️",
    other => other,
  }
}

pub fn build_callout(text: &str, icon: &str, color: &str) -> Value {
  json!({
    "object": "block",
    "type": "callout",
    "callout": {
      "rich_text": [plain_text(text)],
      "icon": {"type": "emoji", "emoji": icon_emoji(icon)},
      "color": color,
    },
  })
}

pub fn build_divider() -> Value {
  json!({"object": "block", "type": "divider", "divider": {}})
}

pub fn build_paragraph(rich_text: Vec<Value>) -> Value {
  json!({
    "object": "block",
    "type": "paragraph",
    "paragraph": {"rich_text": rich_text},
  })
}

pub fn build_toggle(text: &str, children: Vec<Value>) -> Value {
  json!({
    "object": "block",
    "type": "toggle",
    "toggle": {
      "rich_text": [build_text(text, true, "default")],
      "children": children,
    },
  })
}

pub fn build_table_row(cells: Vec<Value>) -> Value {
  json!({
    "object": "block",
    "type": "table_row",
    "table_row": {"cells": cells},
  })
}

fn build_table(width: usize, rows: Vec<Value>) -> Value {
  json!({
    "object": "block",
    "type": "table",
    "table": {
      "table_width": width,
      "has_column_header": true,
      "has_row_header": false,
      "children": rows,
    },
  })
}

pub fn build_column_list(columns: Vec<Value>) -> Value {
  json!({
    "object": "block",
    "type": "column_list",
    "column_list": {"children": columns},
  })
}

pub fn build_column(children: Vec<Value>) -> Value {
  json!({
    "object": "block",
    "type": "column",
    "column": {"children": children},
  })
}

fn database_mention(db_id: &str) -> Value {
  json!({
    "type": "mention",
    "mention": {"type": "database", "database": {"id": db_id}},
  })
}

/// ---------------------------------------------------------------------------
/// Table cells
/// ---------------------------------------------------------------------------

fn color_for_value(value: f64, prior_avg: f64, higher_is_better: bool) -> &'static str {
  match trend_direction(value, prior_avg) {
    Trend::Stable => "default",
    Trend::Up => {
      if higher_is_better {
        "green"
      } else {
        "red"
      }
    }
    Trend::Down => {
      if higher_is_better {
        "red"
      } else {
        "green"
      }
    }
  }
}

/// One table cell. The current row colors against the prior average;
/// absent values render as an em dash.
fn cell(
  value: Option<f64>,
  prior_avg: Option<f64>,
  is_current: bool,
  higher_is_better: bool,
  decimals: usize,
) -> Value {
  let Some(value) = value else {
    return json!([plain_text("—")]);
  };
  let text = fmt_num(value, decimals);
  match prior_avg {
    Some(avg) if is_current => {
      json!([build_text(&text, false, color_for_value(value, avg, higher_is_better))])
    }
    _ => json!([plain_text(&text)]),
  }
}

fn prior_avg<T>(prior: &[T], pick: impl Fn(&T) -> Option<f64>) -> Option<f64> {
  let values: Vec<f64> = prior.iter().filter_map(&pick).collect();
  if values.is_empty() {
    None
  } else {
    Some(values.iter().sum::<f64>() / values.len() as f64)
  }
}

/// ---------------------------------------------------------------------------
/// Trend tables
/// ---------------------------------------------------------------------------

pub fn build_training_table(weeks: &[TrainingWeek]) -> Value {
  let headers = [
    "Period",
    "Sessions",
    "Active Days",
    "Runs",
    "Run km",
    "Longest Run",
    "Gym Sessions",
    "Gym Vol (kg)",
    "Vol/Session",
    "Feeling %",
    "Duration (min)",
  ];
  let mut rows = vec![build_table_row(
    headers.iter().map(|h| json!([build_text(h, true, "default")])).collect(),
  )];

  let prior = if weeks.len() > 1 { &weeks[1..] } else { &[] };

  for (i, w) in weeks.iter().enumerate() {
    let current = i == 0;
    let c = |value: Option<f64>, pick: fn(&TrainingWeek) -> Option<f64>| {
      cell(value, prior_avg(prior, pick), current, true, 1)
    };
    rows.push(build_table_row(vec![
      json!([build_text(&w.label, current, "default")]),
      c(Some(w.sessions as f64), |w| Some(w.sessions as f64)),
      c(Some(w.active_days as f64), |w| Some(w.active_days as f64)),
      c(Some(w.running_count as f64), |w| Some(w.running_count as f64)),
      c(Some(w.running_km), |w| Some(w.running_km)),
      c(w.longest_run_km, |w| w.longest_run_km),
      c(Some(w.gym_sessions as f64), |w| Some(w.gym_sessions as f64)),
      c(Some(w.gym_volume_kg), |w| Some(w.gym_volume_kg)),
      c(w.gym_volume_per_session, |w| w.gym_volume_per_session),
      c(w.feeling_good_pct, |w| w.feeling_good_pct),
      c(Some(w.total_duration_min), |w| Some(w.total_duration_min)),
    ]));
  }

  build_table(headers.len(), rows)
}

pub fn build_health_table(weeks: &[HealthWeek]) -> Value {
  let headers = [
    "Week",
    "Sleep (h)",
    "Sleep Quality",
    "Resting HR",
    "Steps",
    "Body Battery",
    "Sick",
    "Injured",
    "Rest Days",
  ];
  let mut rows = vec![build_table_row(
    headers.iter().map(|h| json!([build_text(h, true, "default")])).collect(),
  )];

  let prior = if weeks.len() > 1 { &weeks[1..] } else { &[] };

  for (i, w) in weeks.iter().enumerate() {
    let current = i == 0;
    let c = |value: Option<f64>, pick: fn(&HealthWeek) -> Option<f64>, higher: bool| {
      cell(value, prior_avg(prior, pick), current, higher, 1)
    };
    rows.push(build_table_row(vec![
      json!([build_text(&w.label, current, "default")]),
      c(w.avg_sleep_hours, |w| w.avg_sleep_hours, true),
      json!([plain_text(w.sleep_quality_mode.as_deref().unwrap_or("—"))]),
      c(w.avg_resting_hr, |w| w.avg_resting_hr, false),
      c(w.avg_steps, |w| w.avg_steps, true),
      c(w.avg_body_battery, |w| w.avg_body_battery, true),
      json!([plain_text(&w.sick_days.to_string())]),
      json!([plain_text(&w.injured_days.to_string())]),
      json!([plain_text(&w.rest_days.to_string())]),
    ]));
  }

  build_table(headers.len(), rows)
}

pub fn build_running_table(periods: &[RunningWeek]) -> Value {
  let headers = [
    "Period",
    "Runs",
    "Distance",
    "Avg Power",
    "Total RSS",
    "RSS/Run",
    "Avg CP",
    "Cadence",
    "Stride",
    "GCT",
    "Vert Osc",
    "Leg Spring",
    "Power:HR",
    "Avg RPE",
  ];
  let mut rows = vec![build_table_row(
    headers.iter().map(|h| json!([build_text(h, true, "default")])).collect(),
  )];

  let prior = if periods.len() > 1 { &periods[1..] } else { &[] };

  for (i, p) in periods.iter().enumerate() {
    let current = i == 0;
    let c = |value: Option<f64>,
             pick: fn(&RunningWeek) -> Option<f64>,
             higher: bool,
             decimals: usize| {
      cell(value, prior_avg(prior, pick), current, higher, decimals)
    };
    rows.push(build_table_row(vec![
      json!([build_text(&p.label, current, "default")]),
      c(Some(p.run_count as f64), |p| Some(p.run_count as f64), true, 1),
      c(Some(p.total_km), |p| Some(p.total_km), true, 1),
      c(p.avg_power_w, |p| p.avg_power_w, true, 1),
      c(Some(p.total_rss), |p| Some(p.total_rss), true, 1),
      c(p.avg_rss_per_run, |p| p.avg_rss_per_run, true, 1),
      c(p.avg_critical_power_w, |p| p.avg_critical_power_w, true, 1),
      c(p.avg_cadence_spm, |p| p.avg_cadence_spm, true, 1),
      c(p.avg_stride_length_m, |p| p.avg_stride_length_m, true, 2),
      c(p.avg_ground_contact_ms, |p| p.avg_ground_contact_ms, false, 1),
      c(p.avg_vertical_oscillation_cm, |p| p.avg_vertical_oscillation_cm, false, 1),
      c(p.avg_leg_spring_stiffness, |p| p.avg_leg_spring_stiffness, true, 1),
      c(p.power_to_hr_ratio, |p| p.power_to_hr_ratio, true, 2),
      c(p.avg_rpe, |p| p.avg_rpe, false, 1),
    ]));
  }

  build_table(headers.len(), rows)
}

/// ---------------------------------------------------------------------------
/// Load & recovery section
/// ---------------------------------------------------------------------------

pub fn build_load_section(
  load: Option<&LoadPoint>,
  overreaching: &Overreaching,
  correlation: &str,
) -> Vec<Value> {
  let mut blocks = Vec::new();

  match load {
    Some(point) if point.acwr.is_some() => {
      let text = format!(
        "ACWR: {} — {}\nAcute (this week): {} RSS\nChronic (4-wk avg): {} RSS",
        fmt_num(point.acwr.unwrap_or_default(), 2),
        point.zone.as_str().to_uppercase(),
        point.acute.map_or_else(|| "—".to_string(), |v| fmt_num(v, 1)),
        point.chronic.map_or_else(|| "—".to_string(), |v| fmt_num(v, 1)),
      );
      blocks.push(build_callout(&text, "chart", point.zone.color()));
    }
    _ => {
      blocks.push(build_callout(
        "Not enough training history for load analysis yet.",
        "chart",
        "gray_background",
      ));
    }
  }

  if let Overreaching::Flagged(signals) = overreaching {
    for signal in signals {
      blocks.push(build_callout(
        &format!("Overreaching risk: {}", signal.describe()),
        "warning",
        "red_background",
      ));
    }
  }

  if !correlation.is_empty() {
    blocks.push(build_callout(correlation, "info", "blue_background"));
  }

  blocks
}

/// ---------------------------------------------------------------------------
/// Full dashboard
/// ---------------------------------------------------------------------------

/// Everything the dashboard page needs, aggregates ordered most-recent-first.
#[derive(Debug, Clone)]
pub struct DashboardData {
  pub updated_at: DateTime<Utc>,
  pub training_weeks: Vec<TrainingWeek>,
  pub running_weeks: Vec<RunningWeek>,
  pub health_weeks: Vec<HealthWeek>,
  pub load: Option<LoadPoint>,
  pub overreaching: Overreaching,
  pub training_db_id: String,
  pub health_db_id: Option<String>,
}

pub fn build_full_dashboard(data: &DashboardData) -> Vec<Value> {
  let now_str = data.updated_at.format("%Y-%m-%d %H:%M UTC");
  let mut blocks = vec![build_callout(
    &format!("Dashboard auto-updated on {now_str}"),
    "check",
    "green_background",
  )];

  // Training trends
  blocks.push(build_heading_2("4-Week Training Trends"));
  blocks.push(build_training_table(&data.training_weeks));
  blocks.push(build_column_list(vec![
    build_column(vec![build_callout(
      &generate_running_trend_insight(&data.training_weeks, &data.running_weeks),
      "chart",
      "green_background",
    )]),
    build_column(vec![build_callout(
      &generate_strength_insight(&data.training_weeks),
      "fire",
      "orange_background",
    )]),
    build_column(vec![build_callout(
      &generate_recovery_insight(&data.training_weeks, &data.health_weeks),
      "heart",
      "pink_background",
    )]),
  ]));
  blocks.push(build_callout(
    &generate_training_takeaway(&data.training_weeks),
    "fire",
    "yellow_background",
  ));
  blocks.push(build_divider());

  // Running performance
  blocks.push(build_heading_2("Running Performance"));
  blocks.push(build_running_table(&data.running_weeks));
  blocks.push(build_column_list(vec![
    build_column(vec![build_callout(
      &generate_running_power_insight(&data.running_weeks),
      "chart",
      "blue_background",
    )]),
    build_column(vec![build_callout(
      &generate_running_biomechanics_insight(&data.running_weeks),
      "chart",
      "purple_background",
    )]),
  ]));
  blocks.push(build_callout(
    &generate_running_takeaway(&data.running_weeks),
    "chart",
    "yellow_background",
  ));
  blocks.push(build_divider());

  // Health trends
  blocks.push(build_heading_2("4-Week Health Trends"));
  blocks.push(build_health_table(&data.health_weeks));
  blocks.push(build_column_list(vec![
    build_column(vec![build_callout(
      &generate_sleep_insight(&data.health_weeks),
      "info",
      "blue_background",
    )]),
    build_column(vec![build_callout(
      &generate_hr_insight(&data.health_weeks),
      "heart",
      "green_background",
    )]),
    build_column(vec![build_callout(
      &generate_recovery_health_insight(&data.health_weeks),
      "chart",
      "purple_background",
    )]),
  ]));
  blocks.push(build_callout(
    &generate_health_takeaway(&data.health_weeks),
    "heart",
    "pink_background",
  ));
  blocks.push(build_divider());

  // Load & recovery
  blocks.push(build_heading_2("Training Load & Recovery"));
  let correlation = generate_correlation_insight(
    &data.training_weeks,
    &data.health_weeks,
    data.load.as_ref(),
  );
  blocks.extend(build_load_section(
    data.load.as_ref(),
    &data.overreaching,
    &correlation,
  ));
  blocks.push(build_divider());

  // Databases
  blocks.push(build_heading_2("Databases"));
  let mut db_cols = vec![build_column(vec![build_paragraph(vec![
    plain_text("Training Sessions: "),
    database_mention(&data.training_db_id),
  ])])];
  if let Some(health_db_id) = &data.health_db_id {
    db_cols.push(build_column(vec![build_paragraph(vec![
      plain_text("Health Status Log: "),
      database_mention(health_db_id),
    ])]));
  }
  blocks.push(build_column_list(db_cols));
  blocks.push(build_divider());

  // Manual entry guide
  blocks.push(build_toggle(
    "Quick Add Guide",
    vec![
      build_paragraph(vec![plain_text(
        "Use the databases above to add entries manually.",
      )]),
      build_paragraph(vec![
        build_text("Training: ", true, "default"),
        plain_text("Name, Date, Training Type, Duration, and optionally Distance/Volume/Feeling."),
      ]),
      build_paragraph(vec![
        build_text("Health: ", true, "default"),
        plain_text("Date, then any combination of Sleep, HR, Steps, Body Battery, Status."),
      ]),
    ],
  ));

  blocks
}

/// ---------------------------------------------------------------------------
/// Subpage reports
/// ---------------------------------------------------------------------------

/// Month/quarter/year report: the same three trend tables over longer
/// periods.
pub fn build_subpage_report(
  training: &[TrainingRecord],
  health: &[HealthRecord],
  today: NaiveDate,
  period_type: PeriodType,
  count: usize,
  title: &str,
  updated_at: DateTime<Utc>,
) -> Vec<Value> {
  let now_str = updated_at.format("%Y-%m-%d %H:%M UTC");
  let mut blocks = vec![build_callout(
    &format!("{title} — auto-updated {now_str}"),
    "chart",
    "blue_background",
  )];

  let periods = period_boundaries(today, period_type, count);
  let training_by_period = group_by_period(training, &periods);
  let health_by_period = group_by_period(health, &periods);

  let training_weeks: Vec<TrainingWeek> = periods
    .iter()
    .zip(&training_by_period)
    .map(|(p, records)| TrainingWeek::compute(records, p.start, &p.label))
    .collect();
  blocks.push(build_heading_2("Training Trends"));
  blocks.push(build_training_table(&training_weeks));
  blocks.push(build_divider());

  let running_weeks: Vec<RunningWeek> = periods
    .iter()
    .zip(&training_by_period)
    .map(|(p, records)| RunningWeek::compute(records, p.start, &p.label))
    .collect();
  blocks.push(build_heading_2("Running Performance"));
  blocks.push(build_running_table(&running_weeks));
  blocks.push(build_divider());

  let health_weeks: Vec<HealthWeek> = periods
    .iter()
    .zip(&health_by_period)
    .map(|(p, records)| HealthWeek::compute(records, p.start, &p.label))
    .collect();
  blocks.push(build_heading_2("Health Trends"));
  blocks.push(build_health_table(&health_weeks));

  blocks
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::anomaly::OverreachingSignal;
  use crate::load::LoadZone;
  use crate::test_utils::{health_week, load_point, run_record, running_week, training_week};

  fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-02T08:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  #[test]
  fn test_callout_shape() {
    let block = build_callout("hello", "warning", "red_background");
    assert_eq!(block["type"], "callout");
    assert_eq!(block["callout"]["icon"]["emoji"], "⚠️");
    assert_eq!(block["callout"]["color"], "red_background");
    assert_eq!(block["callout"]["rich_text"][0]["text"]["content"], "hello");
  }

  #[test]
  fn test_text_annotations_only_when_needed() {
    let plain = plain_text("x");
    assert!(plain.get("annotations").is_none());
    let bold = build_text("x", true, "default");
    assert_eq!(bold["annotations"]["bold"], true);
    assert!(bold["annotations"].get("color").is_none());
  }

  #[test]
  fn test_training_table_dimensions() {
    let weeks = vec![
      training_week(5, 300.0, 20.0, 4000.0),
      training_week(4, 280.0, 18.0, 3500.0),
    ];
    let table = build_training_table(&weeks);
    assert_eq!(table["table"]["table_width"], 11);
    // Header row + two data rows.
    assert_eq!(table["table"]["children"].as_array().unwrap().len(), 3);
  }

  #[test]
  fn test_current_cell_colored_by_trend() {
    let current = training_week(6, 400.0, 30.0, 4000.0);
    let prior = training_week(4, 300.0, 20.0, 4000.0);
    let table = build_training_table(&[current, prior]);
    let rows = table["table"]["children"].as_array().unwrap();
    // Sessions cell of the current row: 6 vs avg 4 is up, higher is better.
    let sessions_cell = &rows[1]["table_row"]["cells"][1][0];
    assert_eq!(sessions_cell["annotations"]["color"], "green");
    // Prior row stays uncolored.
    let prior_cell = &rows[2]["table_row"]["cells"][1][0];
    assert!(prior_cell.get("annotations").is_none());
  }

  #[test]
  fn test_resting_hr_colors_inverted() {
    let mut current = health_week(Some(7.0), Some(60.0), None);
    current.entries = 5;
    let prior = health_week(Some(7.0), Some(52.0), None);
    let table = build_health_table(&[current, prior]);
    let rows = table["table"]["children"].as_array().unwrap();
    // Resting HR up is bad.
    let hr_cell = &rows[1]["table_row"]["cells"][3][0];
    assert_eq!(hr_cell["annotations"]["color"], "red");
  }

  #[test]
  fn test_absent_metric_renders_dash() {
    let week = health_week(None, None, None);
    let table = build_health_table(&[week]);
    let rows = table["table"]["children"].as_array().unwrap();
    assert_eq!(rows[1]["table_row"]["cells"][1][0]["text"]["content"], "—");
  }

  #[test]
  fn test_load_section_zone_color_and_warnings() {
    let lp = load_point(LoadZone::Danger, Some(1.67));
    let overreaching = Overreaching::Flagged(vec![OverreachingSignal::BodyBatteryDrop {
      points: 15.0,
    }]);
    let blocks = build_load_section(Some(&lp), &overreaching, "watch it");

    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0]["callout"]["color"], "red_background");
    let text = blocks[0]["callout"]["rich_text"][0]["text"]["content"]
      .as_str()
      .unwrap();
    assert!(text.contains("ACWR: 1.67 — DANGER"), "was: {text}");
    assert_eq!(blocks[1]["callout"]["color"], "red_background");
    assert_eq!(blocks[2]["callout"]["color"], "blue_background");
  }

  #[test]
  fn test_load_section_without_history() {
    let blocks = build_load_section(None, &Overreaching::NoData, "");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0]["callout"]["color"], "gray_background");
  }

  #[test]
  fn test_full_dashboard_layout() {
    let data = DashboardData {
      updated_at: now(),
      training_weeks: vec![training_week(5, 300.0, 20.0, 4000.0)],
      running_weeks: vec![running_week(3, 20.0, 150.0)],
      health_weeks: vec![health_week(Some(7.5), Some(55.0), Some(70.0))],
      load: Some(load_point(LoadZone::Optimal, Some(1.0))),
      overreaching: Overreaching::NotFlagged,
      training_db_id: "db-training".to_string(),
      health_db_id: Some("db-health".to_string()),
    };
    let blocks = build_full_dashboard(&data);

    assert_eq!(blocks[0]["type"], "callout");
    let headings: Vec<&str> = blocks
      .iter()
      .filter(|b| b["type"] == "heading_2")
      .filter_map(|b| b["heading_2"]["rich_text"][0]["text"]["content"].as_str())
      .collect();
    assert_eq!(
      headings,
      vec![
        "4-Week Training Trends",
        "Running Performance",
        "4-Week Health Trends",
        "Training Load & Recovery",
        "Databases",
      ]
    );
  }

  #[test]
  fn test_subpage_report_covers_requested_periods() {
    let training = vec![run_record("2026-02-03", 10.0, Some(70.0))];
    let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let blocks = build_subpage_report(
      &training,
      &[],
      today,
      PeriodType::Month,
      3,
      "Monthly Report",
      now(),
    );

    let table = blocks
      .iter()
      .find(|b| b["type"] == "table")
      .expect("training table present");
    // Header row + one row per month.
    assert_eq!(table["table"]["children"].as_array().unwrap().len(), 4);
    let first_label = table["table"]["children"][1]["table_row"]["cells"][0][0]["text"]
      ["content"]
      .as_str()
      .unwrap();
    assert_eq!(first_label, "Mar 2026");
  }
}
