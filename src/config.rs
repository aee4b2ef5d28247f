//! Environment-driven configuration
//!
//! Everything the pipeline needs is read once here and handed to the coach as
//! an explicit struct. `.env` loading happens in the binary.

use chrono::Weekday;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::analysis::DEFAULT_WINDOW_DAYS;
use crate::plan::{PlanError, PlanOptions, Timeline, WorkoutPreference};
use crate::strava::StravaConfig;

/// Ten years of history is the most the analysis window covers
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Where run history comes from
#[derive(Debug, Clone)]
pub enum ActivitySource {
  /// JSON array of Strava activities on disk
  File(PathBuf),
  Strava(StravaConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub source: ActivitySource,
  pub plan: PlanOptions,
  pub window_days: u32,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, PlanError> {
    let source = match env_value("COACH_ACTIVITIES_FILE") {
      Some(path) => ActivitySource::File(PathBuf::from(path)),
      None => ActivitySource::Strava(StravaConfig::from_env()?),
    };

    let window_days = parse_env::<u32>("COACH_WINDOW_DAYS")?.unwrap_or(DEFAULT_WINDOW_DAYS);
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
      return Err(PlanError::InvalidInput(format!(
        "COACH_WINDOW_DAYS must be between 1 and {}, got {}",
        MAX_WINDOW_DAYS, window_days
      )));
    }

    let config = Self {
      source,
      plan: plan_options_from_env()?,
      window_days,
    };
    tracing::debug!(plan = ?config.plan, window_days, "loaded configuration");
    Ok(config)
  }
}

fn plan_options_from_env() -> Result<PlanOptions, PlanError> {
  let defaults = PlanOptions::default();

  let timeline = match parse_env::<u32>("COACH_TIMELINE_WEEKS")? {
    Some(weeks) => Timeline::try_from(weeks)?,
    None => defaults.timeline,
  };

  let long_run_day = match env_value("COACH_LONG_RUN_DAY") {
    Some(day) => Weekday::from_str(&day).map_err(|_| {
      PlanError::InvalidInput(format!("COACH_LONG_RUN_DAY '{}' is not a weekday", day))
    })?,
    None => defaults.long_run_day,
  };

  let workout_types = match env_value("COACH_WORKOUT_TYPES") {
    Some(list) => list
      .split(',')
      .filter(|s| !s.trim().is_empty())
      .map(WorkoutPreference::from_str)
      .collect::<Result<_, _>>()?,
    None => defaults.workout_types,
  };

  let options = PlanOptions {
    timeline,
    max_weekly_mileage: parse_env::<f64>("COACH_MAX_WEEKLY_MILEAGE")?,
    long_run_day,
    rest_days_per_week: parse_env::<u8>("COACH_REST_DAYS")?.unwrap_or(defaults.rest_days_per_week),
    workout_types,
    goal_marathon_time: env_value("COACH_GOAL_TIME"),
  };
  options.validate()?;
  Ok(options)
}

/// Trimmed, non-empty value of an environment variable
fn env_value(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, PlanError> {
  env_value(key)
    .map(|raw| {
      raw
        .parse::<T>()
        .map_err(|_| PlanError::InvalidInput(format!("{} has invalid value '{}'", key, raw)))
    })
    .transpose()
}
