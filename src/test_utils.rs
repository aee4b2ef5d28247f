//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Mock data factories
//! - Fixed reference times
//! - Helper assertions

use crate::analysis::{
  Consistency, ConsistencyScore, FitnessLevel, FitnessProfile, PaceTrend, DEFAULT_WINDOW_DAYS,
};
use crate::models::{ActivityRecord, WorkoutType};
use crate::strava::StravaActivity;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Create a normalized run `days_ago` before `as_of` (negative for future dates)
pub fn mock_run(as_of: DateTime<Utc>, days_ago: i64, miles: f64, pace: f64) -> ActivityRecord {
  ActivityRecord {
    name: format!("Run {} days ago", days_ago),
    date: as_of - Duration::days(days_ago),
    distance_miles: miles,
    moving_time_minutes: miles * pace,
    average_pace_min_per_mile: pace,
    average_heart_rate: None,
    elevation_gain_feet: None,
    workout_type: WorkoutType::Unknown,
  }
}

/// Create a profile with history at a fixed tier, bypassing aggregation
pub fn mock_profile(level: FitnessLevel, weekly_mileage: f64, longest_run: f64, pace: f64) -> FitnessProfile {
  let runs_per_week = 4.0;
  FitnessProfile {
    window_days: DEFAULT_WINDOW_DAYS,
    total_runs: 50,
    total_distance_miles: weekly_mileage * DEFAULT_WINDOW_DAYS as f64 / 7.0,
    weekly_mileage,
    pace_trend: PaceTrend {
      recent_avg: pace,
      historical_avg: pace,
    },
    consistency_score: Consistency {
      score: ConsistencyScore::from_runs_per_week(runs_per_week),
      runs_per_week,
    },
    longest_run_miles: longest_run,
    longest_run_date: Some(reference_time() - Duration::days(6)),
    fitness_level: level,
    workout_distribution: BTreeMap::from([(WorkoutType::Easy, 40), (WorkoutType::Tempo, 10)]),
    heart_rate_available: false,
    average_heart_rate: None,
    recommendations: Vec::new(),
  }
}

/// Create a mock Strava activity for testing
pub fn mock_strava_activity() -> StravaActivity {
  StravaActivity {
    id: 123456,
    name: "Morning Run".to_string(),
    activity_type: "Run".to_string(),
    sport_type: Some("Run".to_string()),
    start_date: Utc::now(),
    moving_time: 3600,
    distance: Some(10000.0),
    total_elevation_gain: Some(100.0),
    average_heartrate: Some(145.0),
    max_heartrate: Some(165.0),
    workout_type: None,
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Fixed "now" so window arithmetic is reproducible
pub fn reference_time() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 9, 30, 12, 0, 0)
    .single()
    .expect("valid reference time")
}

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// Create a DateTime representing now
pub fn datetime_now() -> DateTime<Utc> {
  Utc::now()
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mock_factories_create_valid_data() {
    let activity = mock_strava_activity();
    assert_eq!(activity.activity_type, "Run");
    assert_eq!(activity.distance, Some(10000.0));

    let run = mock_run(reference_time(), 3, 5.0, 9.0);
    assert_eq!(run.date, reference_time() - Duration::days(3));
    assert_approx_eq!(run.moving_time_minutes, 45.0, 1e-9);

    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    assert!(profile.has_history());
    assert_eq!(profile.fitness_level, FitnessLevel::Intermediate);
  }

  #[test]
  fn test_datetime_helpers_produce_correct_dates() {
    let now = datetime_now();
    let past = datetime_days_ago(7);

    let diff = now - past;
    // Allow for slight timing differences (6-8 days is acceptable)
    assert!(
      diff.num_days() >= 6 && diff.num_days() <= 8,
      "Expected ~7 days difference, got {}",
      diff.num_days()
    );
  }
}
