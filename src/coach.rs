//! End-to-end coaching pipeline
//!
//! Fetch (or load) activities, normalize, profile, derive paces and build the
//! plan. Too little history is reported as guidance instead of failing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::FitnessProfile;
use crate::config::{ActivitySource, AppConfig};
use crate::normalize::{normalize_activities, ActivityFilter};
use crate::pacing::PaceTargets;
use crate::plan::{PlanError, PlanOptions, TrainingPlan};
use crate::strava::{StravaActivity, StravaAuth, StravaClient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachReport {
  pub generated_at: DateTime<Utc>,
  pub profile: FitnessProfile,
  pub pace_targets: Option<PaceTargets>,
  pub plan: Option<TrainingPlan>,
  /// Why parts of the report are missing
  pub guidance: Vec<String>,
}

/// Build a report from raw activities. Pure: `as_of` anchors the window.
pub fn build_report(
  activities: &[StravaActivity],
  options: &PlanOptions,
  window_days: u32,
  as_of: DateTime<Utc>,
) -> Result<CoachReport, PlanError> {
  options.validate()?;

  let records = normalize_activities(activities, ActivityFilter::RunsOnly);
  let profile = FitnessProfile::compute(&records, window_days, as_of);
  let mut guidance = Vec::new();

  let pace_targets = recover_insufficient(
    PaceTargets::compute(&profile, options.goal_marathon_time.as_deref()),
    &mut guidance,
  )?;

  let plan = match &pace_targets {
    Some(paces) => recover_insufficient(
      TrainingPlan::generate(options, &profile, paces),
      &mut guidance,
    )?,
    None => None,
  };

  Ok(CoachReport {
    generated_at: as_of,
    profile,
    pace_targets,
    plan,
    guidance,
  })
}

/// InsufficientData becomes a guidance line; other errors propagate
fn recover_insufficient<T>(result: Result<T, PlanError>, guidance: &mut Vec<String>) -> Result<Option<T>, PlanError> {
  match result {
    Ok(value) => Ok(Some(value)),
    Err(PlanError::InsufficientData(message)) => {
      tracing::warn!(%message, "skipping plan step");
      guidance.push(message);
      Ok(None)
    }
    Err(e) => Err(e),
  }
}

/// Load activities per the configured source and build the report
pub async fn run(config: AppConfig) -> Result<CoachReport, PlanError> {
  let as_of = Utc::now();

  let activities = match config.source {
    ActivitySource::File(path) => load_activities_file(&path)?,
    ActivitySource::Strava(strava) => {
      let api_base = strava.api_base.clone();
      let mut auth = StravaAuth::new(strava);
      let token = auth.get_access_token().await?;
      let after = as_of
        .checked_sub_signed(Duration::days(config.window_days as i64))
        .ok_or_else(|| PlanError::InvalidInput(format!("window of {} days is out of range", config.window_days)))?;
      StravaClient::new(api_base, token)
        .fetch_activities(after, as_of)
        .await?
    }
  };

  let report = build_report(&activities, &config.plan, config.window_days, as_of)?;
  tracing::info!(
    activities = activities.len(),
    runs = report.profile.total_runs,
    has_plan = report.plan.is_some(),
    "coach report ready"
  );
  Ok(report)
}

/// Read a JSON array of Strava activities
pub fn load_activities_file(path: &Path) -> Result<Vec<StravaActivity>, PlanError> {
  let contents = std::fs::read_to_string(path)
    .map_err(|e| PlanError::InvalidInput(format!("cannot read {}: {}", path.display(), e)))?;

  serde_json::from_str(&contents)
    .map_err(|e| PlanError::InvalidInput(format!("{} is not a Strava activity list: {}", path.display(), e)))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
