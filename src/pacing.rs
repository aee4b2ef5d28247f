//! Training pace targets
//!
//! Goal marathon pace comes from the requested finish time, or is estimated
//! from the runner's average pace and tier. Every other pace is an offset from
//! it, and the ordering interval < tempo < goal < easy always holds.

use serde::{Deserialize, Serialize};

use crate::analysis::{round_to, FitnessLevel, FitnessProfile};
use crate::plan::PlanError;

pub const MARATHON_MILES: f64 = 26.2188;

/// Plausible goal paces in min/mile
const FASTEST_GOAL_PACE: f64 = 4.0;
const SLOWEST_GOAL_PACE: f64 = 15.0;

/// Minimum spacing kept between adjacent paces
const MIN_PACE_GAP: f64 = 0.1;
const MIN_EASY_GAP: f64 = 0.3;
/// Easy pace relative to goal when there is no history to read it from
const EASY_FROM_GOAL: f64 = 1.15;
const LONG_RUN_FROM_GOAL: f64 = 1.10;

/// Training paces in min/mile (lower is faster)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceTargets {
  pub easy_pace: f64,
  pub long_run_pace: f64,
  pub goal_marathon_pace: f64,
  pub tempo_pace: f64,
  pub interval_pace: f64,
}

/// Tier-specific pace constants
#[derive(Debug, Clone, Copy)]
struct TierPaceConstants {
  /// Race pace as a fraction of average training pace
  goal_multiplier: f64,
  tempo_offset: f64,
  interval_offset: f64,
}

impl TierPaceConstants {
  fn for_level(level: FitnessLevel) -> Self {
    let (goal_multiplier, tempo_offset, interval_offset) = match level {
      FitnessLevel::Beginner => (0.97, 0.5, 1.0),
      FitnessLevel::BeginnerPlus => (0.965, 0.6, 1.15),
      FitnessLevel::Intermediate => (0.9565, 0.7, 1.3),
      FitnessLevel::IntermediatePlus => (0.93, 0.7, 1.4),
      FitnessLevel::Advanced => (0.90, 0.7, 1.5),
    };
    Self {
      goal_multiplier,
      tempo_offset,
      interval_offset,
    }
  }
}

/// Parse "H:MM:SS" into total minutes
pub fn parse_goal_time(goal_time: &str) -> Result<f64, PlanError> {
  let invalid = || PlanError::InvalidInput(format!("goal time '{}' is not H:MM:SS", goal_time));

  let parts: Vec<&str> = goal_time.trim().split(':').collect();
  let &[hours, minutes, seconds] = parts.as_slice() else {
    return Err(invalid());
  };

  let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
  if !all_digits(hours) || minutes.len() != 2 || seconds.len() != 2 {
    return Err(invalid());
  }
  if !all_digits(minutes) || !all_digits(seconds) {
    return Err(invalid());
  }

  let hours: f64 = hours.parse().map_err(|_| invalid())?;
  let minutes: f64 = minutes.parse().map_err(|_| invalid())?;
  let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
  if minutes >= 60.0 || seconds >= 60.0 {
    return Err(invalid());
  }

  Ok(hours * 60.0 + minutes + seconds / 60.0)
}

/// Goal marathon pace for a "H:MM:SS" finish time, within plausible bounds
pub fn goal_pace_from_time(goal_time: &str) -> Result<f64, PlanError> {
  let pace = parse_goal_time(goal_time)? / MARATHON_MILES;

  if !(FASTEST_GOAL_PACE..=SLOWEST_GOAL_PACE).contains(&pace) {
    return Err(PlanError::InvalidInput(format!(
      "goal time '{}' implies {:.2} min/mile, outside {:.0}-{:.0} min/mile",
      goal_time, pace, FASTEST_GOAL_PACE, SLOWEST_GOAL_PACE
    )));
  }
  Ok(pace)
}

impl PaceTargets {
  pub fn compute(profile: &FitnessProfile, goal_time: Option<&str>) -> Result<Self, PlanError> {
    let constants = TierPaceConstants::for_level(profile.fitness_level);
    let historical = profile.pace_trend.historical_avg;

    let goal = match goal_time {
      Some(time) => goal_pace_from_time(time)?,
      None if historical > 0.0 => historical * constants.goal_multiplier,
      None => {
        return Err(PlanError::InsufficientData(
          "no run history to estimate a goal pace; log some runs or set a goal time".to_string(),
        ))
      }
    };

    let observed_easy = if profile.pace_trend.recent_avg > 0.0 {
      profile.pace_trend.recent_avg
    } else {
      historical
    };
    let easy = if observed_easy > 0.0 {
      observed_easy.max(goal + MIN_EASY_GAP)
    } else {
      goal * EASY_FROM_GOAL
    };

    let tempo = (goal - constants.tempo_offset).min(goal - MIN_PACE_GAP);
    let interval = (goal - constants.interval_offset).min(tempo - MIN_PACE_GAP);
    let long_run = (goal * LONG_RUN_FROM_GOAL).min(easy);

    let targets = Self {
      easy_pace: round_to(easy, 2),
      long_run_pace: round_to(long_run, 2),
      goal_marathon_pace: round_to(goal, 2),
      tempo_pace: round_to(tempo, 2),
      interval_pace: round_to(interval, 2),
    };

    tracing::debug!(
      goal = targets.goal_marathon_pace,
      easy = targets.easy_pace,
      tempo = targets.tempo_pace,
      interval = targets.interval_pace,
      "computed pace targets"
    );
    Ok(targets)
  }

  /// interval < tempo < goal < easy
  pub fn is_ordered(&self) -> bool {
    self.interval_pace < self.tempo_pace
      && self.tempo_pace < self.goal_marathon_pace
      && self.goal_marathon_pace < self.easy_pace
  }
}

/// Render min/mile as "M:SS"
pub fn format_pace(pace: f64) -> String {
  let total_seconds = (pace * 60.0).round() as i64;
  format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
