//! Deterministic analysis layer for run history
//!
//! Aggregates a window of normalized runs into a fitness profile: volume,
//! pace trend, consistency, longest run, tier and recommendations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ActivityRecord, WorkoutType};

pub const DEFAULT_WINDOW_DAYS: u32 = 90;
const RECENT_WINDOW_DAYS: i64 = 14;

/// ---------------------------------------------------------------------------
/// Fitness Tiers
/// ---------------------------------------------------------------------------

/// Ordinal fitness tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FitnessLevel {
  Beginner,
  BeginnerPlus,
  Intermediate,
  IntermediatePlus,
  Advanced,
}

impl FitnessLevel {
  /// Tier implied by weekly volume alone
  pub fn from_weekly_mileage(miles: f64) -> Self {
    match miles {
      m if m >= 50.0 => FitnessLevel::Advanced,
      m if m >= 35.0 => FitnessLevel::IntermediatePlus,
      m if m >= 25.0 => FitnessLevel::Intermediate,
      m if m >= 15.0 => FitnessLevel::BeginnerPlus,
      _ => FitnessLevel::Beginner,
    }
  }

  /// Tier implied by the longest run alone
  pub fn from_longest_run(miles: f64) -> Self {
    match miles {
      m if m >= 20.0 => FitnessLevel::Advanced,
      m if m >= 16.0 => FitnessLevel::IntermediatePlus,
      m if m >= 12.0 => FitnessLevel::Intermediate,
      m if m >= 8.0 => FitnessLevel::BeginnerPlus,
      _ => FitnessLevel::Beginner,
    }
  }

  /// Both axes are classified independently; the lower tier wins
  pub fn classify(weekly_mileage: f64, longest_run_miles: f64) -> Self {
    Self::from_weekly_mileage(weekly_mileage).min(Self::from_longest_run(longest_run_miles))
  }

  /// Long run a runner at this tier is expected to handle
  pub fn expected_long_run_miles(&self) -> f64 {
    match self {
      FitnessLevel::Beginner => 8.0,
      FitnessLevel::BeginnerPlus => 12.0,
      FitnessLevel::Intermediate => 16.0,
      FitnessLevel::IntermediatePlus => 20.0,
      FitnessLevel::Advanced => 22.0,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      FitnessLevel::Beginner => "Beginner",
      FitnessLevel::BeginnerPlus => "Beginner+",
      FitnessLevel::Intermediate => "Intermediate",
      FitnessLevel::IntermediatePlus => "Intermediate+",
      FitnessLevel::Advanced => "Advanced",
    }
  }
}

impl std::fmt::Display for FitnessLevel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// ---------------------------------------------------------------------------
/// Consistency
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConsistencyScore {
  Poor,
  Fair,
  Good,
  VeryGood,
  Excellent,
}

impl ConsistencyScore {
  pub fn from_runs_per_week(runs: f64) -> Self {
    match runs {
      r if r >= 6.0 => ConsistencyScore::Excellent,
      r if r >= 4.0 => ConsistencyScore::VeryGood,
      r if r >= 3.0 => ConsistencyScore::Good,
      r if r >= 2.0 => ConsistencyScore::Fair,
      _ => ConsistencyScore::Poor,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ConsistencyScore::Poor => "Poor (fewer than 2 runs/week)",
      ConsistencyScore::Fair => "Fair (2-3 runs/week)",
      ConsistencyScore::Good => "Good (3-4 runs/week)",
      ConsistencyScore::VeryGood => "Very Good (4-6 runs/week)",
      ConsistencyScore::Excellent => "Excellent (6+ runs/week)",
    }
  }
}

/// Consistency label together with the run frequency behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consistency {
  pub score: ConsistencyScore,
  pub runs_per_week: f64,
}

/// ---------------------------------------------------------------------------
/// Fitness Profile
/// ---------------------------------------------------------------------------

/// Mean paces in min/mile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceTrend {
  /// Last 14 days
  pub recent_avg: f64,
  /// Whole window
  pub historical_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessProfile {
  pub window_days: u32,
  pub total_runs: usize,
  pub total_distance_miles: f64,
  pub weekly_mileage: f64,
  pub pace_trend: PaceTrend,
  pub consistency_score: Consistency,
  pub longest_run_miles: f64,
  pub longest_run_date: Option<DateTime<Utc>>,
  pub fitness_level: FitnessLevel,
  /// Run count per workout type
  pub workout_distribution: BTreeMap<WorkoutType, usize>,
  pub heart_rate_available: bool,
  pub average_heart_rate: Option<f64>,
  pub recommendations: Vec<String>,
}

impl FitnessProfile {
  /// Compute the profile for the `window_days` ending at `as_of`
  pub fn compute(records: &[ActivityRecord], window_days: u32, as_of: DateTime<Utc>) -> Self {
    let window_days = window_days.max(1);
    let window = Duration::days(window_days as i64);
    let recent = Duration::days(RECENT_WINDOW_DAYS);

    let in_window: Vec<&ActivityRecord> = records
      .iter()
      .filter(|r| {
        let age = as_of - r.date;
        age >= Duration::zero() && age < window
      })
      .collect();

    if in_window.is_empty() {
      tracing::debug!(window_days, "no runs in analysis window");
      return Self::empty(window_days);
    }

    let weeks = window_days as f64 / 7.0;
    let total_distance: f64 = in_window.iter().map(|r| r.distance_miles).sum();
    let raw_weekly_mileage = total_distance / weeks;
    let runs_per_week = round_to(in_window.len() as f64 / weeks, 2);

    let longest = in_window
      .iter()
      .max_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    let raw_longest_run = longest.map_or(0.0, |r| r.distance_miles);
    let longest_run_date = longest.map(|r| r.date);

    let historical_avg = mean_pace(&in_window).unwrap_or(0.0);
    let recent_runs: Vec<&ActivityRecord> = in_window
      .iter()
      .copied()
      .filter(|r| as_of - r.date < recent)
      .collect();
    let recent_avg = mean_pace(&recent_runs).unwrap_or(historical_avg);

    let mut workout_distribution = BTreeMap::new();
    for r in &in_window {
      *workout_distribution.entry(r.workout_type).or_insert(0) += 1;
    }

    let heart_rates: Vec<f64> = in_window.iter().filter_map(|r| r.average_heart_rate).collect();
    let heart_rate_available = heart_rates.len() * 2 >= in_window.len();
    let average_heart_rate = if heart_rates.is_empty() {
      None
    } else {
      Some((heart_rates.iter().sum::<f64>() / heart_rates.len() as f64).round())
    };

    // Tiers are decided on unrounded values; rounding is for reporting only
    let fitness_level = FitnessLevel::classify(raw_weekly_mileage, raw_longest_run);
    let consistency_score = Consistency {
      score: ConsistencyScore::from_runs_per_week(runs_per_week),
      runs_per_week,
    };

    let mut profile = Self {
      window_days,
      total_runs: in_window.len(),
      total_distance_miles: round_to(total_distance, 1),
      weekly_mileage: round_to(raw_weekly_mileage, 1),
      pace_trend: PaceTrend {
        recent_avg: round_to(recent_avg, 2),
        historical_avg: round_to(historical_avg, 2),
      },
      consistency_score,
      longest_run_miles: round_to(raw_longest_run, 2),
      longest_run_date,
      fitness_level,
      workout_distribution,
      heart_rate_available,
      average_heart_rate,
      recommendations: Vec::new(),
    };
    profile.recommendations = profile.build_recommendations();

    tracing::debug!(
      runs = profile.total_runs,
      weekly_mileage = profile.weekly_mileage,
      level = %profile.fitness_level,
      consistency = profile.consistency_score.score.label(),
      "computed fitness profile"
    );
    profile
  }

  /// Degraded profile for a window with no runs
  pub fn empty(window_days: u32) -> Self {
    Self {
      window_days,
      total_runs: 0,
      total_distance_miles: 0.0,
      weekly_mileage: 0.0,
      pace_trend: PaceTrend {
        recent_avg: 0.0,
        historical_avg: 0.0,
      },
      consistency_score: Consistency {
        score: ConsistencyScore::Poor,
        runs_per_week: 0.0,
      },
      longest_run_miles: 0.0,
      longest_run_date: None,
      fitness_level: FitnessLevel::Beginner,
      workout_distribution: BTreeMap::new(),
      heart_rate_available: false,
      average_heart_rate: None,
      recommendations: vec!["Start logging runs to build a fitness profile".to_string()],
    }
  }

  pub fn has_history(&self) -> bool {
    self.total_runs > 0
  }

  /// Applicable recommendations, highest priority first
  fn build_recommendations(&self) -> Vec<String> {
    let mut recommendations = Vec::new();

    if self.weekly_mileage < 20.0 {
      recommendations.push("Focus on building base mileage gradually (10% rule)".to_string());
    }

    if self.longest_run_miles < 0.8 * self.fitness_level.expected_long_run_miles() {
      recommendations.push("Gradually increase long run distance".to_string());
    }

    if self.consistency_score.runs_per_week < 4.0 {
      recommendations.push("Improve consistency - aim for at least 4 runs per week".to_string());
    }

    if self.weekly_mileage > 50.0 && self.longest_run_miles < 16.0 {
      recommendations.push("Add more long runs to match your weekly volume".to_string());
    }

    let distinct_types: BTreeSet<WorkoutType> = self
      .workout_distribution
      .keys()
      .copied()
      .filter(|t| *t != WorkoutType::Unknown)
      .collect();
    if distinct_types.len() < 2 {
      recommendations.push("Add more tempo/interval variety".to_string());
    }

    recommendations
  }
}

fn mean_pace(records: &[&ActivityRecord]) -> Option<f64> {
  if records.is_empty() {
    return None;
  }
  let sum: f64 = records.iter().map(|r| r.average_pace_min_per_mile).sum();
  Some(sum / records.len() as f64)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  (value * factor).round() / factor
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
