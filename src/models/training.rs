use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Training Type
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingType {
  Running,
  #[serde(rename = "Gym-Strength")]
  GymStrength,
  #[serde(rename = "Gym-Crossfit")]
  GymCrossfit,
  Mobility,
  Specifics,
  Unknown,
}

impl TrainingType {
  pub fn as_str(&self) -> &'static str {
    match self {
      TrainingType::Running => "Running",
      TrainingType::GymStrength => "Gym-Strength",
      TrainingType::GymCrossfit => "Gym-Crossfit",
      TrainingType::Mobility => "Mobility",
      TrainingType::Specifics => "Specifics",
      TrainingType::Unknown => "Unknown",
    }
  }

  /// Parse a stored select value. Unrecognized values map to Unknown rather
  /// than failing, so a renamed option in the store cannot break aggregation.
  pub fn from_name(name: &str) -> Self {
    match name {
      "Running" => TrainingType::Running,
      "Gym-Strength" => TrainingType::GymStrength,
      "Gym-Crossfit" => TrainingType::GymCrossfit,
      "Mobility" => TrainingType::Mobility,
      "Specifics" => TrainingType::Specifics,
      _ => TrainingType::Unknown,
    }
  }

  pub fn is_gym(&self) -> bool {
    matches!(self, TrainingType::GymStrength | TrainingType::GymCrossfit)
  }
}

/// ---------------------------------------------------------------------------
/// Session Feeling (1-5 scale behind the select values)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feeling {
  Great,
  Good,
  Okay,
  Tired,
  Exhausted,
}

impl Feeling {
  pub fn score(&self) -> i64 {
    match self {
      Feeling::Great => 5,
      Feeling::Good => 4,
      Feeling::Okay => 3,
      Feeling::Tired => 2,
      Feeling::Exhausted => 1,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Feeling::Great => "Great",
      Feeling::Good => "Good",
      Feeling::Okay => "Okay",
      Feeling::Tired => "Tired",
      Feeling::Exhausted => "Exhausted",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "Great" => Some(Feeling::Great),
      "Good" => Some(Feeling::Good),
      "Okay" => Some(Feeling::Okay),
      "Tired" => Some(Feeling::Tired),
      "Exhausted" => Some(Feeling::Exhausted),
      _ => None,
    }
  }

  /// A session that felt Tired or worse counts as a tough session.
  pub fn is_tough(&self) -> bool {
    matches!(self, Feeling::Tired | Feeling::Exhausted)
  }
}

/// ---------------------------------------------------------------------------
/// Canonical training record
/// ---------------------------------------------------------------------------

/// One training session in canonical shape, regardless of which source it
/// came from. Optional metrics stay `None` when the source omitted them;
/// absence is never coerced to zero (zero is meaningful for some metrics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
  pub date: NaiveDate,
  pub name: String,
  pub training_type: TrainingType,
  pub duration_min: Option<f64>,
  pub distance_km: Option<f64>,
  pub volume_kg: Option<f64>,
  pub feeling: Option<Feeling>,
  pub avg_hr: Option<f64>,
  pub power_w: Option<f64>,
  pub rss: Option<f64>,
  pub critical_power_w: Option<f64>,
  pub cadence_spm: Option<f64>,
  pub stride_length_m: Option<f64>,
  pub ground_contact_ms: Option<f64>,
  pub vertical_oscillation_cm: Option<f64>,
  pub leg_spring_stiffness: Option<f64>,
  pub rpe: Option<i64>,
  pub source: String,
  /// Source-prefixed identifier (e.g. "garmin-12345"). Two records sharing
  /// an external_id are the same physical activity and must collapse to one
  /// stored row.
  pub external_id: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_training_type_round_trip() {
    for t in [
      TrainingType::Running,
      TrainingType::GymStrength,
      TrainingType::GymCrossfit,
      TrainingType::Mobility,
      TrainingType::Specifics,
    ] {
      assert_eq!(TrainingType::from_name(t.as_str()), t);
    }
  }

  #[test]
  fn test_training_type_unknown_fallback() {
    assert_eq!(TrainingType::from_name("Yoga"), TrainingType::Unknown);
    assert_eq!(TrainingType::from_name(""), TrainingType::Unknown);
  }

  #[test]
  fn test_feeling_scores() {
    assert_eq!(Feeling::Great.score(), 5);
    assert_eq!(Feeling::Exhausted.score(), 1);
    assert!(Feeling::Tired.is_tough());
    assert!(!Feeling::Okay.is_tough());
  }
}
