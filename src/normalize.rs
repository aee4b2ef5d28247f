//! Raw Strava activities to normalized run records
//!
//! Distances become miles, times become minutes and every record carries a
//! derived pace. Entries that cannot produce a sane pace are dropped.

use crate::models::{ActivityRecord, WorkoutType};
use crate::strava::StravaActivity;

const METERS_PER_MILE: f64 = 1609.34;
const FEET_PER_METER: f64 = 3.28084;
/// Below this a pace is meaningless (GPS glitches, manual stubs)
const MIN_DISTANCE_MILES: f64 = 0.01;

const RUN_SPORT_TYPES: [&str; 3] = ["run", "trailrun", "virtualrun"];
const INTERVAL_KEYWORDS: [&str; 6] = ["interval", "repeat", "track", "fartlek", "x400", "x800"];
const TEMPO_KEYWORDS: [&str; 2] = ["tempo", "threshold"];
const EASY_KEYWORDS: [&str; 2] = ["easy", "recovery"];

/// Which sports the normalizer accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityFilter {
  #[default]
  RunsOnly,
  Any,
}

/// Convert one raw activity. Returns None when the entry should be skipped.
pub fn normalize_activity(activity: &StravaActivity, filter: ActivityFilter) -> Option<ActivityRecord> {
  if filter == ActivityFilter::RunsOnly && !is_run(activity) {
    return None;
  }

  let distance_meters = activity.distance.unwrap_or(0.0);
  if distance_meters <= 0.0 || activity.moving_time <= 0 {
    return None;
  }

  let distance_miles = distance_meters / METERS_PER_MILE;
  if distance_miles < MIN_DISTANCE_MILES {
    return None;
  }

  let moving_time_minutes = activity.moving_time as f64 / 60.0;

  Some(ActivityRecord {
    name: activity.name.clone(),
    date: activity.start_date,
    distance_miles,
    moving_time_minutes,
    average_pace_min_per_mile: moving_time_minutes / distance_miles,
    average_heart_rate: activity.average_heartrate.filter(|hr| *hr > 0.0),
    elevation_gain_feet: activity.total_elevation_gain.map(|m| m * FEET_PER_METER),
    workout_type: classify_workout(activity.workout_type, &activity.name),
  })
}

/// Normalize a batch, keeping input order
pub fn normalize_activities(activities: &[StravaActivity], filter: ActivityFilter) -> Vec<ActivityRecord> {
  let records: Vec<ActivityRecord> = activities
    .iter()
    .filter_map(|a| normalize_activity(a, filter))
    .collect();

  tracing::debug!(
    fetched = activities.len(),
    kept = records.len(),
    "normalized activities"
  );
  records
}

fn is_run(activity: &StravaActivity) -> bool {
  let is_run_type = |s: &str| RUN_SPORT_TYPES.contains(&s.to_lowercase().as_str());
  is_run_type(activity.activity_type.as_str())
    || activity.sport_type.as_deref().map_or(false, is_run_type)
}

/// Map Strava's run `workout_type` code, refined by the activity name
fn classify_workout(code: Option<i64>, name: &str) -> WorkoutType {
  match code {
    Some(1) => return WorkoutType::Race,
    Some(2) => return WorkoutType::LongRun,
    _ => {}
  }

  let name = name.to_lowercase();
  let has_any = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

  if has_any(&INTERVAL_KEYWORDS) {
    WorkoutType::Interval
  } else if has_any(&TEMPO_KEYWORDS) {
    WorkoutType::Tempo
  } else if code == Some(3) {
    WorkoutType::Tempo
  } else if code == Some(0) || has_any(&EASY_KEYWORDS) {
    WorkoutType::Easy
  } else {
    WorkoutType::Unknown
  }
}
