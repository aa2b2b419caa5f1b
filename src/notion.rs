//! Notion REST client: the store both sync loops and the dashboard write
//! into, and the read path for the aggregation pipeline.
//!
//! External IDs make every sync idempotent: each source entry carries a
//! stable id in the "External ID" rich_text property and is skipped when a
//! page with that id already exists.

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use tracing::{debug, info};

use crate::models::{HealthRecord, TrainingRecord};
use crate::normalize::{normalize_batch, normalize_notion_health, normalize_notion_training};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const BLOCK_CHUNK_SIZE: usize = 100;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NotionConfig {
  pub api_key: String,
  pub training_db_id: String,
  pub health_db_id: Option<String>,
}

impl NotionConfig {
  pub fn from_env() -> Result<Self, NotionError> {
    dotenvy::dotenv().ok();
    Ok(Self {
      api_key: env::var("NOTION_API_KEY")
        .map_err(|_| NotionError::MissingConfig("NOTION_API_KEY".into()))?,
      training_db_id: env::var("NOTION_TRAINING_DB_ID")
        .map_err(|_| NotionError::MissingConfig("NOTION_TRAINING_DB_ID".into()))?,
      health_db_id: env::var("NOTION_HEALTH_DB_ID").ok(),
    })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(String),

  #[error("API error {status}: {body}")]
  Api { status: u16, body: String },
}

impl From<reqwest::Error> for NotionError {
  fn from(e: reqwest::Error) -> Self {
    NotionError::Request(e.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

pub struct NotionClient {
  http: Client,
  config: NotionConfig,
  base_url: String,
}

impl NotionClient {
  pub fn new(config: NotionConfig) -> Self {
    Self::with_base_url(config, NOTION_API_URL.to_string())
  }

  /// Points the client at a different API root (test servers).
  pub fn with_base_url(config: NotionConfig, base_url: String) -> Self {
    Self {
      http: Client::new(),
      config,
      base_url,
    }
  }

  pub fn training_db_id(&self) -> &str {
    &self.config.training_db_id
  }

  pub fn health_db_id(&self) -> Option<&str> {
    self.config.health_db_id.as_deref()
  }

  async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, NotionError> {
    if response.status().is_success() {
      return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(NotionError::Api { status, body })
  }

  /// Queries a database with an optional filter, following cursor
  /// pagination until `has_more` is false.
  pub async fn query_database(
    &self,
    db_id: &str,
    filter: Option<Value>,
    sorts: Option<Value>,
  ) -> Result<Vec<Value>, NotionError> {
    let mut payload = json!({});
    if let Some(filter) = filter {
      payload["filter"] = filter;
    }
    if let Some(sorts) = sorts {
      payload["sorts"] = sorts;
    }

    let mut results: Vec<Value> = Vec::new();
    loop {
      let response = self
        .http
        .post(format!("{}/databases/{}/query", self.base_url, db_id))
        .bearer_auth(&self.config.api_key)
        .header("Notion-Version", NOTION_VERSION)
        .json(&payload)
        .send()
        .await?;
      let data: Value = Self::check_status(response).await?.json().await?;

      if let Some(page) = data.get("results").and_then(|r| r.as_array()) {
        results.extend(page.iter().cloned());
      }

      let has_more = data.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false);
      match data.get("next_cursor").and_then(|v| v.as_str()) {
        Some(cursor) if has_more => {
          payload["start_cursor"] = json!(cursor);
        }
        _ => break,
      }
    }
    debug!("query returned {} pages", results.len());
    Ok(results)
  }

  /// Dedup probe: does a page with this External ID already exist?
  pub async fn check_existing(&self, db_id: &str, external_id: &str) -> Result<bool, NotionError> {
    let filter = json!({
      "property": "External ID",
      "rich_text": {"equals": external_id},
    });
    let results = self.query_database(db_id, Some(filter), None).await?;
    Ok(!results.is_empty())
  }

  pub async fn create_page(&self, db_id: &str, properties: Value) -> Result<Value, NotionError> {
    let response = self
      .http
      .post(format!("{}/pages", self.base_url))
      .bearer_auth(&self.config.api_key)
      .header("Notion-Version", NOTION_VERSION)
      .json(&json!({
        "parent": {"database_id": db_id},
        "properties": properties,
      }))
      .send()
      .await?;
    Ok(Self::check_status(response).await?.json().await?)
  }

  pub async fn update_page(&self, page_id: &str, properties: Value) -> Result<(), NotionError> {
    let response = self
      .http
      .patch(format!("{}/pages/{}", self.base_url, page_id))
      .bearer_auth(&self.config.api_key)
      .header("Notion-Version", NOTION_VERSION)
      .json(&json!({"properties": properties}))
      .send()
      .await?;
    Self::check_status(response).await?;
    Ok(())
  }

  pub async fn get_block_children(&self, block_id: &str) -> Result<Vec<Value>, NotionError> {
    let mut results: Vec<Value> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
      let mut request = self
        .http
        .get(format!("{}/blocks/{}/children", self.base_url, block_id))
        .bearer_auth(&self.config.api_key)
        .header("Notion-Version", NOTION_VERSION)
        .query(&[("page_size", "100")]);
      if let Some(cursor) = &cursor {
        request = request.query(&[("start_cursor", cursor.as_str())]);
      }
      let data: Value = Self::check_status(request.send().await?).await?.json().await?;

      if let Some(page) = data.get("results").and_then(|r| r.as_array()) {
        results.extend(page.iter().cloned());
      }
      let has_more = data.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false);
      cursor = data
        .get("next_cursor")
        .and_then(|v| v.as_str())
        .map(str::to_string);
      if !has_more || cursor.is_none() {
        break;
      }
    }
    Ok(results)
  }

  pub async fn delete_block(&self, block_id: &str) -> Result<(), NotionError> {
    let response = self
      .http
      .delete(format!("{}/blocks/{}", self.base_url, block_id))
      .bearer_auth(&self.config.api_key)
      .header("Notion-Version", NOTION_VERSION)
      .send()
      .await?;
    Self::check_status(response).await?;
    Ok(())
  }

  /// Appends children in chunks of 100 (the API limit per call).
  pub async fn append_block_children(
    &self,
    block_id: &str,
    children: &[Value],
  ) -> Result<(), NotionError> {
    for chunk in children.chunks(BLOCK_CHUNK_SIZE) {
      let response = self
        .http
        .patch(format!("{}/blocks/{}/children", self.base_url, block_id))
        .bearer_auth(&self.config.api_key)
        .header("Notion-Version", NOTION_VERSION)
        .json(&json!({"children": chunk}))
        .send()
        .await?;
      Self::check_status(response).await?;
    }
    Ok(())
  }

  /// Deletes every block on a page. Returns the count removed.
  pub async fn clear_page(&self, page_id: &str) -> Result<usize, NotionError> {
    let children = self.get_block_children(page_id).await?;
    for block in &children {
      if let Some(id) = block.get("id").and_then(|v| v.as_str()) {
        self.delete_block(id).await?;
      }
    }
    info!("cleared {} blocks from page", children.len());
    Ok(children.len())
  }

  /// ---------------------------------------------------------------------------
  /// Record fetching
  /// ---------------------------------------------------------------------------

  fn date_filter(since: NaiveDate) -> Value {
    json!({
      "property": "Date",
      "date": {"on_or_after": since.to_string()},
    })
  }

  fn date_sort() -> Value {
    json!([{"property": "Date", "direction": "ascending"}])
  }

  /// Training sessions on or after `since`, date ascending. Malformed pages
  /// are skipped, not fatal.
  pub async fn fetch_training_records(
    &self,
    since: NaiveDate,
  ) -> Result<Vec<TrainingRecord>, NotionError> {
    let pages = self
      .query_database(
        &self.config.training_db_id,
        Some(Self::date_filter(since)),
        Some(Self::date_sort()),
      )
      .await?;
    let (records, failures) = normalize_batch(&pages, normalize_notion_training);
    if !failures.is_empty() {
      info!("skipped {} malformed training pages", failures.len());
    }
    Ok(records)
  }

  /// Health log entries on or after `since`, date ascending.
  pub async fn fetch_health_records(
    &self,
    since: NaiveDate,
  ) -> Result<Vec<HealthRecord>, NotionError> {
    let Some(db_id) = self.config.health_db_id.as_deref() else {
      return Ok(Vec::new());
    };
    let pages = self
      .query_database(db_id, Some(Self::date_filter(since)), Some(Self::date_sort()))
      .await?;
    let (records, failures) = normalize_batch(&pages, normalize_notion_health);
    if !failures.is_empty() {
      info!("skipped {} malformed health pages", failures.len());
    }
    Ok(records)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;

  fn test_client(base_url: String) -> NotionClient {
    NotionClient::with_base_url(
      NotionConfig {
        api_key: "secret".to_string(),
        training_db_id: "db-training".to_string(),
        health_db_id: Some("db-health".to_string()),
      },
      base_url,
    )
  }

  fn training_page(external_id: &str, date: &str) -> Value {
    json!({
      "properties": {
        "Name": {"title": [{"plain_text": "Run"}]},
        "Date": {"date": {"start": date}},
        "Training Type": {"select": {"name": "Running"}},
        "Distance (km)": {"number": 10.0},
        "External ID": {"rich_text": [{"plain_text": external_id}]}
      }
    })
  }

  #[tokio::test]
  async fn test_check_existing_found() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/databases/db-training/query")
      .match_body(Matcher::PartialJson(json!({
        "filter": {
          "property": "External ID",
          "rich_text": {"equals": "hevy-abc"},
        }
      })))
      .with_body(
        json!({"results": [{"id": "page-1"}], "has_more": false, "next_cursor": null})
          .to_string(),
      )
      .create_async()
      .await;

    let client = test_client(server.url());
    let exists = client.check_existing("db-training", "hevy-abc").await.unwrap();
    assert!(exists);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_check_existing_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/databases/db-training/query")
      .with_body(json!({"results": [], "has_more": false}).to_string())
      .create_async()
      .await;

    let client = test_client(server.url());
    let exists = client.check_existing("db-training", "hevy-xyz").await.unwrap();
    assert!(!exists);
  }

  #[tokio::test]
  async fn test_query_follows_pagination() {
    let mut server = mockito::Server::new_async().await;
    let first = server
      .mock("POST", "/databases/db-training/query")
      .match_body(Matcher::Json(json!({})))
      .with_body(
        json!({
          "results": [training_page("a", "2026-02-03")],
          "has_more": true,
          "next_cursor": "cursor-2"
        })
        .to_string(),
      )
      .create_async()
      .await;
    let second = server
      .mock("POST", "/databases/db-training/query")
      .match_body(Matcher::PartialJson(json!({"start_cursor": "cursor-2"})))
      .with_body(
        json!({
          "results": [training_page("b", "2026-02-04")],
          "has_more": false,
          "next_cursor": null
        })
        .to_string(),
      )
      .create_async()
      .await;

    let client = test_client(server.url());
    let results = client.query_database("db-training", None, None).await.unwrap();
    assert_eq!(results.len(), 2);
    first.assert_async().await;
    second.assert_async().await;
  }

  #[tokio::test]
  async fn test_fetch_training_skips_malformed_pages() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/databases/db-training/query")
      .with_body(
        json!({
          "results": [
            training_page("stryd-1", "2026-02-03"),
            {"properties": {"Name": {"title": []}}}
          ],
          "has_more": false
        })
        .to_string(),
      )
      .create_async()
      .await;

    let client = test_client(server.url());
    let records = client
      .fetch_training_records(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
      .await
      .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].external_id, "stryd-1");
  }

  #[tokio::test]
  async fn test_api_error_surfaces_status() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/pages")
      .with_status(400)
      .with_body("validation_error")
      .create_async()
      .await;

    let client = test_client(server.url());
    let err = client
      .create_page("db-training", json!({}))
      .await
      .unwrap_err();
    match err {
      NotionError::Api { status, body } => {
        assert_eq!(status, 400);
        assert_eq!(body, "validation_error");
      }
      other => panic!("expected Api error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_append_chunks_large_block_lists() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("PATCH", "/blocks/page-1/children")
      .expect(3)
      .with_body(json!({"results": []}).to_string())
      .create_async()
      .await;

    let blocks: Vec<Value> = (0..250).map(|i| json!({"index": i})).collect();
    let client = test_client(server.url());
    client.append_block_children("page-1", &blocks).await.unwrap();
    mock.assert_async().await;
  }

  #[test]
  #[serial_test::serial]
  fn test_config_from_env() {
    temp_env::with_vars(
      [
        ("NOTION_API_KEY", Some("secret")),
        ("NOTION_TRAINING_DB_ID", Some("db-t")),
        ("NOTION_HEALTH_DB_ID", None::<&str>),
      ],
      || {
        let config = NotionConfig::from_env().unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.training_db_id, "db-t");
        assert_eq!(config.health_db_id, None);
      },
    );
  }

  #[test]
  #[serial_test::serial]
  fn test_config_missing_key() {
    temp_env::with_vars(
      [
        ("NOTION_API_KEY", None::<&str>),
        ("NOTION_TRAINING_DB_ID", Some("db-t")),
      ],
      || {
        let err = NotionConfig::from_env().unwrap_err();
        assert!(matches!(err, NotionError::MissingConfig(ref key) if key == "NOTION_API_KEY"));
      },
    );
  }
}
