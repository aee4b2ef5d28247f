pub mod analysis;
pub mod coach;
pub mod config;
pub mod models;
pub mod normalize;
pub mod pacing;
pub mod plan;
pub mod strava;

#[cfg(test)]
mod test_utils;

use config::AppConfig;
use plan::PlanError;

/// Load configuration, build the report and print it as JSON
pub async fn run() -> Result<(), PlanError> {
  let config = AppConfig::from_env()?;
  let report = coach::run(config).await?;

  let json = serde_json::to_string_pretty(&report)?;
  println!("{}", json);
  Ok(())
}
