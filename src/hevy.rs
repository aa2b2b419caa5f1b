//! Hevy API client and the workout → store sync loop.
//!
//! Hevy pages its workout list newest-first. Each workout becomes one
//! strength session in the store, keyed by `hevy-{workout_id}` so reruns
//! skip what is already there.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use tracing::info;

use crate::models::TrainingRecord;
use crate::normalize::{normalize_hevy, HevyExercise, HevyWorkout};
use crate::notion::{NotionClient, NotionError};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const HEVY_API_URL: &str = "https://api.hevyapp.com/v1";
const PAGE_SIZE: u32 = 10;
const RICH_TEXT_MAX_LENGTH: usize = 2000;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HevyConfig {
  pub api_key: String,
}

impl HevyConfig {
  pub fn from_env() -> Result<Self, HevyError> {
    dotenvy::dotenv().ok();
    Ok(Self {
      api_key: env::var("HEVY_API_KEY")
        .map_err(|_| HevyError::MissingConfig("HEVY_API_KEY".into()))?,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HevyError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(String),

  #[error("API error {status}: {body}")]
  Api { status: u16, body: String },

  #[error("Store error: {0}")]
  Store(#[from] NotionError),
}

impl From<reqwest::Error> for HevyError {
  fn from(e: reqwest::Error) -> Self {
    HevyError::Request(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// API types
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WorkoutsPage {
  #[serde(default)]
  pub workouts: Vec<HevyWorkout>,
  #[serde(default = "default_page_count")]
  pub page_count: u32,
}

fn default_page_count() -> u32 {
  1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
  pub synced: usize,
  pub skipped: usize,
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

pub struct HevyClient {
  http: Client,
  config: HevyConfig,
  base_url: String,
}

impl HevyClient {
  pub fn new(config: HevyConfig) -> Self {
    Self::with_base_url(config, HEVY_API_URL.to_string())
  }

  pub fn with_base_url(config: HevyConfig, base_url: String) -> Self {
    Self {
      http: Client::new(),
      config,
      base_url,
    }
  }

  pub async fn fetch_workouts(&self, page: u32) -> Result<WorkoutsPage, HevyError> {
    let response = self
      .http
      .get(format!("{}/workouts", self.base_url))
      .header("api-key", &self.config.api_key)
      .query(&[("page", page.to_string()), ("pageSize", PAGE_SIZE.to_string())])
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      let body = response.text().await.unwrap_or_default();
      return Err(HevyError::Api { status, body });
    }
    Ok(response.json().await?)
  }

  /// Syncs workouts into the store. `full` walks every page; otherwise only
  /// the latest page is checked. Walking stops early at the first workout
  /// older than `since`.
  pub async fn sync(
    &self,
    notion: &NotionClient,
    full: bool,
    since: Option<NaiveDate>,
  ) -> Result<SyncReport, HevyError> {
    let mut report = SyncReport::default();
    let mut page = 1;

    loop {
      let data = self.fetch_workouts(page).await?;
      if data.workouts.is_empty() {
        break;
      }

      for workout in &data.workouts {
        let record = match normalize_hevy(workout) {
          Ok(record) => record,
          Err(err) => {
            info!("skipping workout: {err}");
            report.skipped += 1;
            continue;
          }
        };

        if let Some(since) = since {
          if record.date < since {
            info!("reached workouts before {since}, stopping");
            return Ok(report);
          }
        }

        if notion
          .check_existing(notion.training_db_id(), &record.external_id)
          .await?
        {
          info!("skipping {} (already exists)", record.name);
          report.skipped += 1;
          continue;
        }

        info!("syncing: {} ({})", record.name, record.date);
        let properties = workout_properties(&record, &workout.exercises);
        notion.create_page(notion.training_db_id(), properties).await?;
        report.synced += 1;
      }

      if !full || page >= data.page_count {
        break;
      }
      page += 1;
    }

    Ok(report)
  }
}

/// ---------------------------------------------------------------------------
/// Property building
/// ---------------------------------------------------------------------------

fn truncate(text: &str, max: usize) -> String {
  text.chars().take(max).collect()
}

/// Readable per-exercise set summary for the rich text column.
pub fn format_exercise_details(exercises: &[HevyExercise]) -> String {
  let parts: Vec<String> = exercises
    .iter()
    .map(|ex| {
      let sets: Vec<String> = ex
        .sets
        .iter()
        .map(|s| {
          let weight = s.weight_kg.unwrap_or(0.0);
          if let Some(reps) = s.reps {
            format!("{weight}x{reps}")
          } else if let Some(distance) = s.distance_meters {
            format!("{weight}kg x {distance}m")
          } else if let Some(duration) = s.duration_seconds {
            format!("{weight}kg x {duration}s")
          } else {
            format!("{weight}kg")
          }
        })
        .collect();
      format!(
        "{}: {}",
        ex.title.as_deref().unwrap_or("Unknown Exercise"),
        sets.join(", ")
      )
    })
    .collect();
  parts.join(" | ")
}

fn workout_properties(record: &TrainingRecord, exercises: &[HevyExercise]) -> Value {
  let mut properties = json!({
    "Name": {"title": [{"text": {"content": record.name.clone()}}]},
    "Date": {"date": {"start": record.date.to_string()}},
    "Training Type": {"select": {"name": record.training_type.as_str()}},
    "Source": {"select": {"name": "Hevy"}},
    "External ID": {"rich_text": [{"text": {"content": record.external_id.clone()}}]},
    "Exercise Details": {"rich_text": [{"text": {
      "content": truncate(&format_exercise_details(exercises), RICH_TEXT_MAX_LENGTH)
    }}]},
  });

  if let Some(duration) = record.duration_min {
    properties["Duration (min)"] = json!({"number": duration.round()});
  }
  if let Some(volume) = record.volume_kg {
    properties["Volume (kg)"] = json!({"number": volume});
  }

  let notes: Vec<String> = exercises
    .iter()
    .filter_map(|ex| {
      ex.notes.as_deref().filter(|n| !n.is_empty()).map(|n| {
        format!("{}: {n}", ex.title.as_deref().unwrap_or("Unknown Exercise"))
      })
    })
    .collect();
  if !notes.is_empty() {
    properties["Notes"] = json!({"rich_text": [{"text": {
      "content": truncate(&notes.join(" | "), RICH_TEXT_MAX_LENGTH)
    }}]});
  }

  properties
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
