use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
  // Load environment variables from .env file, before RUST_LOG is read
  dotenvy::dotenv().ok();

  // Logs go to stderr so stdout stays a clean JSON document
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  tracing::info!("Starting marathon-coach v{}", env!("CARGO_PKG_VERSION"));

  match marathon_coach_lib::run().await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!(error = %e, "marathon-coach failed");
      ExitCode::FAILURE
    }
  }
}
