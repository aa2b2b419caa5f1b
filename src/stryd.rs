//! Stryd API client and the complement-mode sync.
//!
//! Stryd runs usually already exist in the store as Garmin entries, so the
//! sync first tries to enrich a matching run with power metrics and only
//! creates a standalone entry when nothing matches. Matching is by date,
//! tightened to a 30-minute start-time window when the stored entry carries
//! a time of day.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use tracing::{info, warn};

use crate::models::TrainingRecord;
use crate::normalize::{normalize_stryd, StrydActivity};
use crate::notion::{NotionClient, NotionError};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const STRYD_API_URL: &str = "https://www.stryd.com/b/api/v1";
const MATCH_WINDOW_SECONDS: i64 = 30 * 60;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StrydConfig {
  pub token: String,
}

impl StrydConfig {
  pub fn from_env() -> Result<Self, StrydError> {
    dotenvy::dotenv().ok();
    Ok(Self {
      token: env::var("STRYD_TOKEN")
        .map_err(|_| StrydError::MissingConfig("STRYD_TOKEN".into()))?,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StrydError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(String),

  #[error("API error {status}: {body}")]
  Api { status: u16, body: String },

  #[error("Store error: {0}")]
  Store(#[from] NotionError),
}

impl From<reqwest::Error> for StrydError {
  fn from(e: reqwest::Error) -> Self {
    StrydError::Request(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// API types
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CalendarResponse {
  #[serde(default)]
  activities: Vec<StrydActivity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrydSyncReport {
  pub updated: usize,
  pub created: usize,
  pub skipped: usize,
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

pub struct StrydClient {
  http: Client,
  config: StrydConfig,
  base_url: String,
}

impl StrydClient {
  pub fn new(config: StrydConfig) -> Self {
    Self::with_base_url(config, STRYD_API_URL.to_string())
  }

  pub fn with_base_url(config: StrydConfig, base_url: String) -> Self {
    Self {
      http: Client::new(),
      config,
      base_url,
    }
  }

  /// Activity summaries for a date range from the calendar endpoint.
  pub async fn fetch_calendar(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<StrydActivity>, StrydError> {
    let response = self
      .http
      .get(format!("{}/users/calendar", self.base_url))
      // The calendar endpoint wants this exact header shape.
      .header("Authorization", format!("Bearer: {}", self.config.token))
      .query(&[
        ("srtDate", start.format("%m-%d-%Y").to_string()),
        ("endDate", end.format("%m-%d-%Y").to_string()),
        ("sortBy", "StartDate".to_string()),
      ])
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      let body = response.text().await.unwrap_or_default();
      return Err(StrydError::Api { status, body });
    }
    let data: CalendarResponse = response.json().await?;
    Ok(data.activities)
  }

  /// Complement-mode sync: enrich matching runs, create only when
  /// unmatched. Activities without power data are skipped outright.
  pub async fn sync(
    &self,
    notion: &NotionClient,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<StrydSyncReport, StrydError> {
    let activities = self.fetch_calendar(start, end).await?;
    info!("fetched {} activities from Stryd", activities.len());

    let db_id = notion.training_db_id().to_string();
    let mut report = StrydSyncReport::default();

    for activity in &activities {
      let record = match normalize_stryd(activity) {
        Ok(record) => record,
        Err(err) => {
          info!("skipping activity: {err}");
          report.skipped += 1;
          continue;
        }
      };

      if notion.check_existing(&db_id, &record.external_id).await? {
        report.skipped += 1;
        continue;
      }

      if record.power_w.is_none() {
        info!("skipping activity on {} (no power data)", record.date);
        report.skipped += 1;
        continue;
      }

      let ts = DateTime::from_timestamp(activity.timestamp.unwrap_or_default(), 0)
        .unwrap_or_default();
      match find_run_match(notion, &db_id, ts).await? {
        Some(page_id) => {
          notion.update_page(&page_id, update_properties(&record)).await?;
          info!("updated run on {} with Stryd data", record.date);
          report.updated += 1;
        }
        None => {
          notion.create_page(&db_id, create_properties(&record)).await?;
          info!("created Stryd-only entry for {}", record.date);
          report.created += 1;
        }
      }
    }

    Ok(report)
  }
}

/// ---------------------------------------------------------------------------
/// Matching
/// ---------------------------------------------------------------------------

/// Finds the Garmin running entry this Stryd activity belongs to. When the
/// stored Date carries a time, it must be within the 30-minute window;
/// date-only entries match on the date alone.
async fn find_run_match(
  notion: &NotionClient,
  db_id: &str,
  activity_time: DateTime<Utc>,
) -> Result<Option<String>, NotionError> {
  let target_date = activity_time.date_naive();
  let filter = json!({
    "and": [
      {"property": "Date", "date": {"equals": target_date.to_string()}},
      {"property": "Source", "select": {"equals": "Garmin"}},
      {"property": "Training Type", "select": {"equals": "Running"}},
    ]
  });
  let results = notion.query_database(db_id, Some(filter), None).await?;

  let candidates: Vec<&Value> = results
    .iter()
    .filter(|page| within_window(page, activity_time))
    .collect();

  if candidates.len() > 1 {
    warn!("multiple Garmin running entries on {target_date}, matching first one");
  }
  Ok(
    candidates
      .first()
      .and_then(|page| page.get("id"))
      .and_then(|id| id.as_str())
      .map(str::to_string),
  )
}

fn within_window(page: &Value, activity_time: DateTime<Utc>) -> bool {
  let start = page
    .get("properties")
    .and_then(|p| p.get("Date"))
    .and_then(|p| p.get("date"))
    .and_then(|d| d.get("start"))
    .and_then(|s| s.as_str());
  match start.map(DateTime::parse_from_rfc3339) {
    Some(Ok(stored)) => {
      (stored.with_timezone(&Utc) - activity_time)
        .num_seconds()
        .abs()
        <= MATCH_WINDOW_SECONDS
    }
    // Date-only property: the date filter already matched.
    _ => true,
  }
}

/// ---------------------------------------------------------------------------
/// Property building
/// ---------------------------------------------------------------------------

/// Power and biomechanics properties for enriching an existing run.
pub fn update_properties(record: &TrainingRecord) -> Value {
  let mut properties = json!({});
  let mut set = |name: &str, value: Option<f64>| {
    if let Some(v) = value {
      properties[name] = json!({"number": v});
    }
  };

  set("Power (W)", record.power_w);
  set("RSS", record.rss);
  set("Critical Power (W)", record.critical_power_w);
  set("Cadence (spm)", record.cadence_spm);
  set("Stride Length (m)", record.stride_length_m);
  set("Ground Contact (ms)", record.ground_contact_ms);
  set("Vertical Oscillation (cm)", record.vertical_oscillation_cm);
  set("Leg Spring Stiffness", record.leg_spring_stiffness);

  if let Some(rpe) = record.rpe {
    properties["RPE"] = json!({"number": rpe});
  }
  if let Some(feeling) = record.feeling {
    properties["Feeling"] = json!({"select": {"name": feeling.as_str()}});
  }
  properties
}

/// Full page for a Stryd-only entry.
pub fn create_properties(record: &TrainingRecord) -> Value {
  let mut properties = update_properties(record);
  properties["Name"] = json!({"title": [{"text": {"content": record.name.clone()}}]});
  properties["Date"] = json!({"date": {"start": record.date.to_string()}});
  properties["Training Type"] = json!({"select": {"name": record.training_type.as_str()}});
  properties["Source"] = json!({"select": {"name": "Stryd"}});
  properties["External ID"] =
    json!({"rich_text": [{"text": {"content": record.external_id.clone()}}]});

  if let Some(duration) = record.duration_min {
    properties["Duration (min)"] = json!({"number": duration.round()});
  }
  if let Some(distance) = record.distance_km {
    properties["Distance (km)"] = json!({"number": distance});
  }
  if let Some(hr) = record.avg_hr {
    properties["Avg Heart Rate"] = json!({"number": hr});
  }
  properties
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
