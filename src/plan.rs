//! Phased marathon plan generation
//!
//! A plan is laid out from a fixed phase table per timeline. Weekly mileage
//! ramps during Base/Build (never more than 10% week over week), holds through
//! Speed/Peak and drops in the Taper. Each week gets one long run, one quality
//! session and easy filler runs.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analysis::{FitnessLevel, FitnessProfile};
use crate::pacing::{format_pace, goal_pace_from_time, PaceTargets};
use crate::strava::StravaError;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

/// Ceiling on weekly mileage relative to current volume, absent an explicit max
const DEFAULT_CEILING_FACTOR: f64 = 1.15;
const LONG_RUN_GROWTH_PER_WEEK: f64 = 0.1;
const LONG_RUN_CAP_MILES: f64 = 22.0;
const LONG_RUN_SHARE_OF_WEEK: f64 = 0.5;
const MIN_LONG_RUN_MILES: f64 = 3.0;
/// Quality session may take at most this share of the non-long-run mileage
const QUALITY_SHARE_OF_REMAINDER: f64 = 0.4;
const SHAKEOUT_MINUTES: f64 = 30.0;
const MAX_REST_DAYS: u8 = 3;

/// Day offsets from the long run day
const QUALITY_OFFSET: u32 = 2;
const REST_OFFSETS: [u32; 3] = [1, 4, 6];

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Insufficient data: {0}")]
  InsufficientData(String),

  #[error(transparent)]
  Upstream(#[from] StravaError),

  #[error("Failed to encode report: {0}")]
  Encode(#[from] serde_json::Error),
}

impl Serialize for PlanError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Plan Structure
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseName {
  Base,
  Build,
  Speed,
  Peak,
  Taper,
}

impl PhaseName {
  pub fn focus(&self) -> &'static str {
    match self {
      PhaseName::Base => "Aerobic development",
      PhaseName::Build => "Strength & lactate threshold",
      PhaseName::Speed => "VO2 max & running economy",
      PhaseName::Peak => "Race pace practice",
      PhaseName::Taper => "Recovery & race prep",
    }
  }

  fn ramps(&self) -> bool {
    matches!(self, PhaseName::Base | PhaseName::Build)
  }
}

/// Inclusive, 1-based week span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
  pub start: u32,
  pub end: u32,
}

impl WeekRange {
  const fn new(start: u32, end: u32) -> Self {
    Self { start, end }
  }

  pub fn weeks(&self) -> u32 {
    self.end + 1 - self.start
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
  Easy,
  Tempo,
  Interval,
  LongRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
  Miles(f64),
  Minutes(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
  pub day: Weekday,
  #[serde(rename = "type")]
  pub session_type: SessionType,
  pub distance_or_duration: Volume,
  /// min/mile
  pub target_pace: f64,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
  pub week_number: u32,
  pub target_mileage: f64,
  pub rest_days: Vec<Weekday>,
  /// Monday first
  pub key_workouts: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
  pub name: PhaseName,
  pub week_range: WeekRange,
  pub focus: String,
  pub weekly_structure: Vec<WeekPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
  pub timeline_weeks: u32,
  pub fitness_level: FitnessLevel,
  pub current_weekly_mileage: f64,
  pub peak_weekly_mileage: f64,
  pub goal_marathon_time: Option<String>,
  pub pace_targets: PaceTargets,
  pub phases: Vec<Phase>,
}

/// ---------------------------------------------------------------------------
/// Plan Options
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeline {
  Sixteen,
  Twelve,
  Eight,
  Four,
}

impl Timeline {
  pub fn weeks(&self) -> u32 {
    match self {
      Timeline::Sixteen => 16,
      Timeline::Twelve => 12,
      Timeline::Eight => 8,
      Timeline::Four => 4,
    }
  }

  pub fn phase_layout(&self) -> &'static [(PhaseName, WeekRange)] {
    match self {
      Timeline::Sixteen => &SIXTEEN_WEEK_PHASES,
      Timeline::Twelve => &TWELVE_WEEK_PHASES,
      Timeline::Eight => &EIGHT_WEEK_PHASES,
      Timeline::Four => &FOUR_WEEK_PHASES,
    }
  }
}

static SIXTEEN_WEEK_PHASES: [(PhaseName, WeekRange); 5] = [
  (PhaseName::Base, WeekRange::new(1, 4)),
  (PhaseName::Build, WeekRange::new(5, 9)),
  (PhaseName::Speed, WeekRange::new(10, 13)),
  (PhaseName::Peak, WeekRange::new(14, 15)),
  (PhaseName::Taper, WeekRange::new(16, 16)),
];

static TWELVE_WEEK_PHASES: [(PhaseName, WeekRange); 5] = [
  (PhaseName::Base, WeekRange::new(1, 3)),
  (PhaseName::Build, WeekRange::new(4, 7)),
  (PhaseName::Speed, WeekRange::new(8, 10)),
  (PhaseName::Peak, WeekRange::new(11, 11)),
  (PhaseName::Taper, WeekRange::new(12, 12)),
];

static EIGHT_WEEK_PHASES: [(PhaseName, WeekRange); 4] = [
  (PhaseName::Build, WeekRange::new(1, 4)),
  (PhaseName::Speed, WeekRange::new(5, 6)),
  (PhaseName::Peak, WeekRange::new(7, 7)),
  (PhaseName::Taper, WeekRange::new(8, 8)),
];

static FOUR_WEEK_PHASES: [(PhaseName, WeekRange); 2] = [
  (PhaseName::Peak, WeekRange::new(1, 2)),
  (PhaseName::Taper, WeekRange::new(3, 4)),
];

impl TryFrom<u32> for Timeline {
  type Error = PlanError;

  fn try_from(weeks: u32) -> Result<Self, Self::Error> {
    match weeks {
      16 => Ok(Timeline::Sixteen),
      12 => Ok(Timeline::Twelve),
      8 => Ok(Timeline::Eight),
      4 => Ok(Timeline::Four),
      other => Err(PlanError::InvalidInput(format!(
        "timeline must be 4, 8, 12 or 16 weeks, got {}",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutPreference {
  Tempo,
  Intervals,
  LongRuns,
}

impl std::str::FromStr for WorkoutPreference {
  type Err = PlanError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "tempo" => Ok(Self::Tempo),
      "interval" | "intervals" => Ok(Self::Intervals),
      "long_run" | "long_runs" => Ok(Self::LongRuns),
      other => Err(PlanError::InvalidInput(format!("unknown workout type: {}", other))),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
  pub timeline: Timeline,
  pub max_weekly_mileage: Option<f64>,
  pub long_run_day: Weekday,
  pub rest_days_per_week: u8,
  pub workout_types: BTreeSet<WorkoutPreference>,
  pub goal_marathon_time: Option<String>,
}

impl Default for PlanOptions {
  fn default() -> Self {
    Self {
      timeline: Timeline::Sixteen,
      max_weekly_mileage: None,
      long_run_day: Weekday::Sun,
      rest_days_per_week: 1,
      workout_types: [
        WorkoutPreference::Tempo,
        WorkoutPreference::Intervals,
        WorkoutPreference::LongRuns,
      ]
      .into_iter()
      .collect(),
      goal_marathon_time: None,
    }
  }
}

impl PlanOptions {
  pub fn validate(&self) -> Result<(), PlanError> {
    if self.rest_days_per_week > MAX_REST_DAYS {
      return Err(PlanError::InvalidInput(format!(
        "rest days per week must be 0-{}, got {}",
        MAX_REST_DAYS, self.rest_days_per_week
      )));
    }
    if let Some(max) = self.max_weekly_mileage {
      if !max.is_finite() || max <= 0.0 {
        return Err(PlanError::InvalidInput(format!(
          "max weekly mileage must be positive, got {}",
          max
        )));
      }
    }
    if let Some(goal) = &self.goal_marathon_time {
      goal_pace_from_time(goal)?;
    }
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Mileage Schedule
/// ---------------------------------------------------------------------------

/// Load for one week, mileage in tenths of a mile
#[derive(Debug, Clone, Copy)]
struct WeekLoad {
  tenths: u32,
  long_run_factor: f64,
}

fn to_tenths(miles: f64) -> u32 {
  (miles * 10.0 + 1e-9).floor().max(0.0) as u32
}

fn from_tenths(tenths: u32) -> f64 {
  tenths as f64 / 10.0
}

fn floor_tenth(miles: f64) -> f64 {
  from_tenths(to_tenths(miles))
}

/// Per-week loads, in layout order
fn mileage_schedule(layout: &[(PhaseName, WeekRange)], start: u32, ceiling: u32) -> Vec<WeekLoad> {
  let ramp_weeks: u32 = layout
    .iter()
    .filter(|(name, _)| name.ramps())
    .map(|(_, range)| range.weeks())
    .sum();
  let step = if ramp_weeks > 1 {
    (ceiling - start).div_ceil(ramp_weeks - 1)
  } else {
    0
  };
  let taper_weeks: u32 = layout
    .iter()
    .filter(|(name, _)| *name == PhaseName::Taper)
    .map(|(_, range)| range.weeks())
    .sum();
  // Fractions of peak, in tenths
  let taper_ratios: &[u32] = if taper_weeks > 1 { &[6, 4] } else { &[5] };

  let mut loads = Vec::new();
  let mut current = start;
  let mut factor = 1.0;
  let mut ramp_index = 0u32;
  let mut taper_index = 0usize;

  for (name, range) in layout {
    for _ in range.start..=range.end {
      let load = match name {
        PhaseName::Base | PhaseName::Build => {
          if ramp_index > 0 {
            // Integer floor keeps the increase at or under 10%
            current = (current + step).min(current * 11 / 10).min(ceiling);
          }
          factor = 1.0 + LONG_RUN_GROWTH_PER_WEEK * ramp_index as f64;
          ramp_index += 1;
          WeekLoad {
            tenths: current,
            long_run_factor: factor,
          }
        }
        PhaseName::Speed | PhaseName::Peak => WeekLoad {
          tenths: current,
          long_run_factor: factor,
        },
        PhaseName::Taper => {
          let ratio = taper_ratios[taper_index.min(taper_ratios.len() - 1)];
          taper_index += 1;
          WeekLoad {
            tenths: current * ratio / 10,
            long_run_factor: factor * ratio as f64 / 10.0,
          }
        }
      };
      loads.push(load);
    }
  }

  loads
}

/// ---------------------------------------------------------------------------
/// Weekly Sessions
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualityKind {
  Strides,
  Tempo,
  MarathonTempo,
  Interval,
  ShakeOut,
}

fn quality_kind(phase: PhaseName, preferences: &BTreeSet<WorkoutPreference>) -> QualityKind {
  let tempo_ok = preferences.contains(&WorkoutPreference::Tempo);
  let intervals_ok = preferences.contains(&WorkoutPreference::Intervals);

  match phase {
    PhaseName::Base => QualityKind::Strides,
    PhaseName::Taper => QualityKind::ShakeOut,
    PhaseName::Build | PhaseName::Peak if tempo_ok => {
      if phase == PhaseName::Peak {
        QualityKind::MarathonTempo
      } else {
        QualityKind::Tempo
      }
    }
    PhaseName::Build | PhaseName::Peak if intervals_ok => QualityKind::Interval,
    PhaseName::Speed if intervals_ok => QualityKind::Interval,
    PhaseName::Speed if tempo_ok => QualityKind::Tempo,
    _ => QualityKind::Strides,
  }
}

fn interval_sets(level: FitnessLevel) -> &'static [&'static str] {
  match level {
    FitnessLevel::Beginner => &["4x400m", "3x800m", "6x400m", "4x800m"],
    FitnessLevel::BeginnerPlus | FitnessLevel::Intermediate => {
      &["4x800m", "6x800m", "3x1600m", "5x1000m", "8x400m"]
    }
    FitnessLevel::IntermediatePlus | FitnessLevel::Advanced => {
      &["6x800m", "4x1200m", "3x1600m", "8x400m", "5x1000m", "2x3200m"]
    }
  }
}

fn day_after(day: Weekday, offset: u32) -> Weekday {
  (0..offset).fold(day, |d, _| d.succ())
}

struct WeekBuilder<'a> {
  options: &'a PlanOptions,
  profile: &'a FitnessProfile,
  paces: &'a PaceTargets,
}

impl WeekBuilder<'_> {
  fn build(&self, week_number: u32, phase: PhaseName, load: WeekLoad) -> WeekPlan {
    let target = from_tenths(load.tenths);
    let paces = self.paces;

    let long_run = floor_tenth(
      (self.profile.longest_run_miles.max(MIN_LONG_RUN_MILES) * load.long_run_factor)
        .min(LONG_RUN_CAP_MILES)
        .min(target * LONG_RUN_SHARE_OF_WEEK),
    );
    let remaining = (target - long_run).max(0.0);
    let quality_cap = remaining * QUALITY_SHARE_OF_REMAINDER;

    let long_day = self.options.long_run_day;
    let mut workouts = vec![Workout {
      day: long_day,
      session_type: SessionType::LongRun,
      distance_or_duration: Volume::Miles(long_run),
      target_pace: paces.long_run_pace,
      description: if phase == PhaseName::Taper {
        format!("Reduced long run: {:.1} mi at {}/mi", long_run, format_pace(paces.long_run_pace))
      } else {
        format!("Long run: {:.1} mi at {}/mi", long_run, format_pace(paces.long_run_pace))
      },
    }];

    let (quality, quality_miles) = self.quality_session(
      week_number,
      quality_kind(phase, &self.options.workout_types),
      day_after(long_day, QUALITY_OFFSET),
      target,
      quality_cap,
    );
    workouts.push(quality);

    let rest_offsets = &REST_OFFSETS[..self.options.rest_days_per_week as usize];
    let filler_offsets: Vec<u32> = (1..7)
      .filter(|o| *o != QUALITY_OFFSET && !rest_offsets.contains(o))
      .collect();
    let filler_miles =
      floor_tenth((remaining - quality_miles).max(0.0) / filler_offsets.len() as f64);

    for offset in &filler_offsets {
      workouts.push(Workout {
        day: day_after(long_day, *offset),
        session_type: SessionType::Easy,
        distance_or_duration: Volume::Miles(filler_miles),
        target_pace: paces.easy_pace,
        description: format!("Easy run: {:.1} mi at {}/mi", filler_miles, format_pace(paces.easy_pace)),
      });
    }
    workouts.sort_by_key(|w| w.day.num_days_from_monday());

    let mut rest_days: Vec<Weekday> = rest_offsets.iter().map(|o| day_after(long_day, *o)).collect();
    rest_days.sort_by_key(|d| d.num_days_from_monday());

    WeekPlan {
      week_number,
      target_mileage: target,
      rest_days,
      key_workouts: workouts,
    }
  }

  /// The week's quality slot and its mileage
  fn quality_session(
    &self,
    week_number: u32,
    kind: QualityKind,
    day: Weekday,
    target: f64,
    cap: f64,
  ) -> (Workout, f64) {
    let paces = self.paces;

    match kind {
      QualityKind::Strides => {
        let miles = floor_tenth((target * 0.12).clamp(2.0, 6.0).min(cap));
        let workout = Workout {
          day,
          session_type: SessionType::Easy,
          distance_or_duration: Volume::Miles(miles),
          target_pace: paces.easy_pace,
          description: format!("Easy run with 6x20s strides: {:.1} mi", miles),
        };
        (workout, miles)
      }
      QualityKind::Tempo | QualityKind::MarathonTempo => {
        let miles = floor_tenth((target * 0.15).clamp(3.0, 8.0).min(cap));
        let label = if kind == QualityKind::MarathonTempo {
          "Marathon-specific tempo"
        } else {
          "Tempo run"
        };
        let workout = Workout {
          day,
          session_type: SessionType::Tempo,
          distance_or_duration: Volume::Miles(miles),
          target_pace: paces.tempo_pace,
          description: format!(
            "{}: {:.1} mi including warm-up, middle miles at {}/mi",
            label,
            miles,
            format_pace(paces.tempo_pace)
          ),
        };
        (workout, miles)
      }
      QualityKind::Interval => {
        let miles = floor_tenth((target * 0.12).clamp(3.0, 7.0).min(cap));
        let sets = interval_sets(self.profile.fitness_level);
        let set = sets[(week_number as usize - 1) % sets.len()];
        let workout = Workout {
          day,
          session_type: SessionType::Interval,
          distance_or_duration: Volume::Miles(miles),
          target_pace: paces.interval_pace,
          description: format!(
            "{} at {}/mi with equal jog recovery, {:.1} mi total",
            set,
            format_pace(paces.interval_pace),
            miles
          ),
        };
        (workout, miles)
      }
      QualityKind::ShakeOut => {
        let minutes = SHAKEOUT_MINUTES.min((cap * paces.easy_pace).floor()).max(0.0);
        let workout = Workout {
          day,
          session_type: SessionType::Easy,
          distance_or_duration: Volume::Minutes(minutes),
          target_pace: paces.easy_pace,
          description: format!("Short shake-out: {:.0} min easy", minutes),
        };
        (workout, minutes / paces.easy_pace)
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Plan Generation
/// ---------------------------------------------------------------------------

impl TrainingPlan {
  pub fn generate(
    options: &PlanOptions,
    profile: &FitnessProfile,
    paces: &PaceTargets,
  ) -> Result<Self, PlanError> {
    options.validate()?;

    if profile.weekly_mileage <= 0.0 {
      return Err(PlanError::InsufficientData(
        "no recent weekly mileage to build from; log a few weeks of running first".to_string(),
      ));
    }

    let ceiling = options
      .max_weekly_mileage
      .unwrap_or(profile.weekly_mileage * DEFAULT_CEILING_FACTOR);
    let ceiling_tenths = to_tenths(ceiling);
    let start_tenths = to_tenths(profile.weekly_mileage.min(ceiling));
    if start_tenths == 0 {
      return Err(PlanError::InsufficientData(format!(
        "weekly mileage of {:.2} is too low to plan from",
        profile.weekly_mileage.min(ceiling)
      )));
    }

    let layout = options.timeline.phase_layout();
    let loads = mileage_schedule(layout, start_tenths, ceiling_tenths);
    let builder = WeekBuilder {
      options,
      profile,
      paces,
    };

    let mut phases = Vec::with_capacity(layout.len());
    let mut peak_tenths = 0;
    for (name, range) in layout {
      let weekly_structure = (range.start..=range.end)
        .map(|week| {
          let load = loads[(week - 1) as usize];
          peak_tenths = peak_tenths.max(load.tenths);
          builder.build(week, *name, load)
        })
        .collect();

      phases.push(Phase {
        name: *name,
        week_range: *range,
        focus: name.focus().to_string(),
        weekly_structure,
      });
    }

    let plan = Self {
      timeline_weeks: options.timeline.weeks(),
      fitness_level: profile.fitness_level,
      current_weekly_mileage: profile.weekly_mileage,
      peak_weekly_mileage: from_tenths(peak_tenths),
      goal_marathon_time: options.goal_marathon_time.clone(),
      pace_targets: paces.clone(),
      phases,
    };

    tracing::info!(
      weeks = plan.timeline_weeks,
      level = %plan.fitness_level,
      peak_mileage = plan.peak_weekly_mileage,
      "generated training plan"
    );
    Ok(plan)
  }

  /// All weeks in calendar order
  pub fn weeks(&self) -> impl Iterator<Item = (PhaseName, &WeekPlan)> {
    self
      .phases
      .iter()
      .flat_map(|p| p.weekly_structure.iter().map(move |w| (p.name, w)))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::test_utils::*;

  const TIMELINES: [Timeline; 4] = [
    Timeline::Sixteen,
    Timeline::Twelve,
    Timeline::Eight,
    Timeline::Four,
  ];

  fn options_for(timeline: Timeline) -> PlanOptions {
    PlanOptions {
      timeline,
      ..PlanOptions::default()
    }
  }

  fn plan_for(timeline: Timeline, profile: &FitnessProfile) -> TrainingPlan {
    let paces = PaceTargets::compute(profile, None).unwrap();
    TrainingPlan::generate(&options_for(timeline), profile, &paces).unwrap()
  }

  #[test]
  fn test_phase_ranges_cover_timeline_exactly() {
    for timeline in TIMELINES {
      let mut expected_start = 1;
      for (_, range) in timeline.phase_layout() {
        assert_eq!(range.start, expected_start, "{:?} has a gap or overlap", timeline);
        assert!(range.end >= range.start);
        expected_start = range.end + 1;
      }
      assert_eq!(expected_start - 1, timeline.weeks());

      let total: u32 = timeline.phase_layout().iter().map(|(_, r)| r.weeks()).sum();
      assert_eq!(total, timeline.weeks());
    }
  }

  #[test]
  fn test_plan_weeks_are_numbered_in_order() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    for timeline in TIMELINES {
      let plan = plan_for(timeline, &profile);
      let numbers: Vec<u32> = plan.weeks().map(|(_, w)| w.week_number).collect();
      let expected: Vec<u32> = (1..=timeline.weeks()).collect();
      assert_eq!(numbers, expected);
      assert_eq!(plan.timeline_weeks, timeline.weeks());
    }
  }

  #[test]
  fn test_sixteen_week_phase_order() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    let plan = plan_for(Timeline::Sixteen, &profile);
    let names: Vec<PhaseName> = plan.phases.iter().map(|p| p.name).collect();
    assert_eq!(
      names,
      vec![
        PhaseName::Base,
        PhaseName::Build,
        PhaseName::Speed,
        PhaseName::Peak,
        PhaseName::Taper
      ]
    );
    assert_eq!(plan.phases[1].week_range, WeekRange::new(5, 9));
  }

  #[test]
  fn test_ramp_never_exceeds_ten_percent() {
    for weekly in [8.0, 12.5, 30.0, 47.3, 70.0] {
      for max in [None, Some(weekly * 2.0), Some(weekly * 0.8)] {
        let profile = mock_profile(FitnessLevel::classify(weekly, 14.0), weekly, 14.0, 9.0);
        let paces = PaceTargets::compute(&profile, None).unwrap();
        for timeline in TIMELINES {
          let options = PlanOptions {
            timeline,
            max_weekly_mileage: max,
            ..PlanOptions::default()
          };
          let plan = TrainingPlan::generate(&options, &profile, &paces).unwrap();

          let ramp: Vec<f64> = plan
            .weeks()
            .filter(|(name, _)| name.ramps())
            .map(|(_, w)| w.target_mileage)
            .collect();
          for pair in ramp.windows(2) {
            assert!(pair[1] >= pair[0], "ramp decreased: {:?}", ramp);
            assert!(pair[1] <= pair[0] * 1.10 + 1e-9, "ramp over 10%: {:?}", ramp);
          }
        }
      }
    }
  }

  #[test]
  fn test_mileage_respects_ceiling() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    let plan = plan_for(Timeline::Sixteen, &profile);
    assert!(plan.weeks().all(|(_, w)| w.target_mileage <= 30.0 * 1.15 + 1e-9));
    // 16 weeks is long enough to reach the ceiling
    assert_approx_eq!(plan.peak_weekly_mileage, 34.5, 1e-9);

    let paces = PaceTargets::compute(&profile, None).unwrap();
    let options = PlanOptions {
      max_weekly_mileage: Some(25.0),
      ..PlanOptions::default()
    };
    let capped = TrainingPlan::generate(&options, &profile, &paces).unwrap();
    assert!(capped.weeks().all(|(_, w)| w.target_mileage <= 25.0));
    assert_approx_eq!(capped.peak_weekly_mileage, 25.0, 1e-9);
  }

  #[test]
  fn test_taper_below_peak() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    for timeline in TIMELINES {
      let plan = plan_for(timeline, &profile);
      let peak = plan
        .phases
        .iter()
        .find(|p| p.name == PhaseName::Peak)
        .unwrap();
      let peak_mileage = peak.weekly_structure[0].target_mileage;

      for (name, week) in plan.weeks() {
        if name == PhaseName::Taper {
          assert!(week.target_mileage < peak_mileage);
          assert!(week.target_mileage >= peak_mileage * 0.4 - 0.1);
        }
      }
    }
  }

  #[test]
  fn test_four_week_taper_steps_down() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    let plan = plan_for(Timeline::Four, &profile);
    let mileage: Vec<f64> = plan.weeks().map(|(_, w)| w.target_mileage).collect();
    assert_eq!(mileage, vec![30.0, 30.0, 18.0, 12.0]);
  }

  #[test]
  fn test_each_week_has_one_long_run_and_one_quality_slot() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    for rest_days in 0..=3u8 {
      let options = PlanOptions {
        rest_days_per_week: rest_days,
        ..PlanOptions::default()
      };
      let paces = PaceTargets::compute(&profile, None).unwrap();
      let plan = TrainingPlan::generate(&options, &profile, &paces).unwrap();

      for (name, week) in plan.weeks() {
        let long_runs = week
          .key_workouts
          .iter()
          .filter(|w| w.session_type == SessionType::LongRun)
          .count();
        assert_eq!(long_runs, 1);
        assert_eq!(week.key_workouts.len(), 7 - rest_days as usize);
        assert_eq!(week.rest_days.len(), rest_days as usize);

        let expected_quality = match name {
          PhaseName::Build | PhaseName::Peak => Some(SessionType::Tempo),
          PhaseName::Speed => Some(SessionType::Interval),
          _ => None,
        };
        if let Some(kind) = expected_quality {
          let count = week.key_workouts.iter().filter(|w| w.session_type == kind).count();
          assert_eq!(count, 1, "week {} in {:?}", week.week_number, name);
        }
      }
    }
  }

  #[test]
  fn test_week_volume_adds_up() {
    let profile = mock_profile(FitnessLevel::IntermediatePlus, 42.0, 17.0, 8.6);
    let plan = plan_for(Timeline::Sixteen, &profile);
    let easy = plan.pace_targets.easy_pace;

    for (_, week) in plan.weeks() {
      let total: f64 = week
        .key_workouts
        .iter()
        .map(|w| match w.distance_or_duration {
          Volume::Miles(m) => m,
          Volume::Minutes(min) => min / easy,
        })
        .sum();
      assert!(total <= week.target_mileage + 1e-6, "week {}", week.week_number);
      assert!(total >= week.target_mileage - 1.0, "week {}", week.week_number);
    }
  }

  #[test]
  fn test_long_run_caps() {
    let profile = mock_profile(FitnessLevel::Advanced, 60.0, 21.0, 7.8);
    let plan = plan_for(Timeline::Sixteen, &profile);

    for (_, week) in plan.weeks() {
      let long = week
        .key_workouts
        .iter()
        .find(|w| w.session_type == SessionType::LongRun)
        .unwrap();
      let Volume::Miles(miles) = long.distance_or_duration else {
        panic!("long run should be in miles");
      };
      assert!(miles <= LONG_RUN_CAP_MILES);
      assert!(miles <= week.target_mileage * LONG_RUN_SHARE_OF_WEEK + 1e-9);
    }
  }

  #[test]
  fn test_long_run_day_and_rest_days() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    let paces = PaceTargets::compute(&profile, None).unwrap();
    let options = PlanOptions {
      long_run_day: Weekday::Sat,
      rest_days_per_week: 2,
      ..PlanOptions::default()
    };
    let plan = TrainingPlan::generate(&options, &profile, &paces).unwrap();
    let week = &plan.phases[1].weekly_structure[0];

    let long = week
      .key_workouts
      .iter()
      .find(|w| w.session_type == SessionType::LongRun)
      .unwrap();
    assert_eq!(long.day, Weekday::Sat);
    // Day after the long run (Sun) and four days after (Wed), Monday first
    assert_eq!(week.rest_days, vec![Weekday::Wed, Weekday::Sun]);
    let tempo = week
      .key_workouts
      .iter()
      .find(|w| w.session_type == SessionType::Tempo)
      .unwrap();
    assert_eq!(tempo.day, Weekday::Mon);

    let days: Vec<u32> = week.key_workouts.iter().map(|w| w.day.num_days_from_monday()).collect();
    let mut sorted = days.clone();
    sorted.sort();
    assert_eq!(days, sorted);
  }

  #[test]
  fn test_preferences_substitute_quality_sessions() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    let paces = PaceTargets::compute(&profile, None).unwrap();

    let tempo_only = PlanOptions {
      workout_types: [WorkoutPreference::Tempo, WorkoutPreference::LongRuns].into_iter().collect(),
      ..PlanOptions::default()
    };
    let plan = TrainingPlan::generate(&tempo_only, &profile, &paces).unwrap();
    assert!(plan
      .weeks()
      .all(|(_, w)| w.key_workouts.iter().all(|s| s.session_type != SessionType::Interval)));

    let easy_only = PlanOptions {
      workout_types: [WorkoutPreference::LongRuns].into_iter().collect(),
      ..PlanOptions::default()
    };
    let plan = TrainingPlan::generate(&easy_only, &profile, &paces).unwrap();
    assert!(plan.weeks().all(|(_, w)| w
      .key_workouts
      .iter()
      .all(|s| matches!(s.session_type, SessionType::Easy | SessionType::LongRun))));
  }

  #[test]
  fn test_interval_sets_follow_tier() {
    let profile = mock_profile(FitnessLevel::Beginner, 12.0, 6.0, 10.5);
    let plan = plan_for(Timeline::Sixteen, &profile);
    let speed = plan.phases.iter().find(|p| p.name == PhaseName::Speed).unwrap();
    let first = speed.weekly_structure[0]
      .key_workouts
      .iter()
      .find(|w| w.session_type == SessionType::Interval)
      .unwrap();
    // Week 10 -> index 9 % 4
    assert!(first.description.starts_with("3x800m"), "{}", first.description);
  }

  #[test]
  fn test_zero_mileage_is_insufficient_data() {
    let profile = FitnessProfile::empty(90);
    let paces = PaceTargets::compute(&profile, Some("4:00:00")).unwrap();
    let result = TrainingPlan::generate(&options_for(Timeline::Sixteen), &profile, &paces);
    assert!(matches!(result, Err(PlanError::InsufficientData(_))));
  }

  #[test]
  fn test_invalid_options_are_rejected() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    let paces = PaceTargets::compute(&profile, None).unwrap();

    let too_many_rest = PlanOptions {
      rest_days_per_week: 4,
      ..PlanOptions::default()
    };
    let no_mileage = PlanOptions {
      max_weekly_mileage: Some(0.0),
      ..PlanOptions::default()
    };
    let bad_goal = PlanOptions {
      goal_marathon_time: Some("fast".to_string()),
      ..PlanOptions::default()
    };
    for options in [too_many_rest, no_mileage, bad_goal] {
      assert!(matches!(
        TrainingPlan::generate(&options, &profile, &paces),
        Err(PlanError::InvalidInput(_))
      ));
    }

    assert!(matches!(Timeline::try_from(10), Err(PlanError::InvalidInput(_))));
    assert_eq!(Timeline::try_from(12).unwrap(), Timeline::Twelve);
  }

  #[test]
  fn test_workout_preference_parsing() {
    assert_eq!("Intervals".parse::<WorkoutPreference>().unwrap(), WorkoutPreference::Intervals);
    assert_eq!(" long_runs ".parse::<WorkoutPreference>().unwrap(), WorkoutPreference::LongRuns);
    assert!("hills".parse::<WorkoutPreference>().is_err());
  }

  #[test]
  fn test_plan_is_deterministic() {
    let profile = mock_profile(FitnessLevel::Intermediate, 30.0, 14.0, 9.2);
    assert_eq!(
      plan_for(Timeline::Twelve, &profile),
      plan_for(Timeline::Twelve, &profile)
    );
  }

  #[test]
  fn test_plan_json_roundtrip() {
    let profile = mock_profile(FitnessLevel::Intermediate, 35.0, 14.0, 9.2);
    let paces = PaceTargets::compute(&profile, Some("3:45:00")).unwrap();
    let options = PlanOptions {
      goal_marathon_time: Some("3:45:00".to_string()),
      ..PlanOptions::default()
    };
    let plan = TrainingPlan::generate(&options, &profile, &paces).unwrap();

    let json = serde_json::to_string_pretty(&plan).unwrap();
    let parsed: TrainingPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, plan);
    assert!(json.contains("\"timeline_weeks\": 16"));
  }

  #[test]
  fn test_error_serializes_as_message() {
    let err = PlanError::InvalidInput("bad goal".into());
    assert_eq!(serde_json::to_string(&err).unwrap(), "\"Invalid input: bad goal\"");
  }

  #[test]
  fn test_encoding_failure_is_its_own_error() {
    let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = PlanError::from(source);

    assert!(matches!(err, PlanError::Encode(_)));
    assert!(err.to_string().starts_with("Failed to encode report: "));
    assert!(serde_json::to_string(&err).unwrap().contains("Failed to encode report"));
  }
}
