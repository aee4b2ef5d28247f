use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Training intent of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
  Easy,
  Tempo,
  Interval,
  LongRun,
  Race,
  Unknown,
}

/// A normalized running activity, in miles and minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
  pub name: String,
  pub date: DateTime<Utc>,
  pub distance_miles: f64,
  pub moving_time_minutes: f64,
  /// moving_time_minutes / distance_miles
  pub average_pace_min_per_mile: f64,
  pub average_heart_rate: Option<f64>,
  pub elevation_gain_feet: Option<f64>,
  pub workout_type: WorkoutType,
}
