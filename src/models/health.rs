use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day status from the health log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
  Sick,
  Injured,
  #[serde(rename = "Rest Day")]
  RestDay,
}

impl HealthStatus {
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "Sick" => Some(HealthStatus::Sick),
      "Injured" => Some(HealthStatus::Injured),
      "Rest Day" => Some(HealthStatus::RestDay),
      _ => None,
    }
  }
}

/// One day of wearable health data in canonical shape. At most one record
/// per calendar date. `sleep_hours: None` means the watch recorded nothing
/// that night, which is not the same as sleeping zero hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
  pub date: NaiveDate,
  pub sleep_hours: Option<f64>,
  pub sleep_quality: Option<String>,
  pub resting_hr: Option<f64>,
  pub steps: Option<f64>,
  pub body_battery: Option<f64>,
  pub status: Option<HealthStatus>,
  pub external_id: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_parsing() {
    assert_eq!(HealthStatus::from_name("Sick"), Some(HealthStatus::Sick));
    assert_eq!(HealthStatus::from_name("Rest Day"), Some(HealthStatus::RestDay));
    assert_eq!(HealthStatus::from_name("Fine"), None);
  }
}
