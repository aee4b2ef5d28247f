use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;
const ACTIVITIES_PER_PAGE: u32 = 200;
const MAX_ACTIVITY_PAGES: u32 = 10;

/// ---------------------------------------------------------------------------
/// OAuth Data Structures
/// ---------------------------------------------------------------------------

/// Credentials and endpoints, passed in explicitly by the caller
#[derive(Debug, Clone)]
pub struct StravaConfig {
  pub client_id: String,
  pub client_secret: String,
  pub refresh_token: String,
  /// Pre-issued access token, used until it expires
  pub access_token: Option<String>,
  pub token_url: String,
  pub api_base: String,
}

impl StravaConfig {
  pub fn from_env() -> Result<Self, StravaError> {
    Ok(Self {
      client_id: env::var("STRAVA_CLIENT_ID")
        .map_err(|_| StravaError::MissingConfig("STRAVA_CLIENT_ID".into()))?,
      client_secret: env::var("STRAVA_CLIENT_SECRET")
        .map_err(|_| StravaError::MissingConfig("STRAVA_CLIENT_SECRET".into()))?,
      refresh_token: env::var("STRAVA_REFRESH_TOKEN")
        .map_err(|_| StravaError::MissingConfig("STRAVA_REFRESH_TOKEN".into()))?,
      access_token: env::var("STRAVA_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
      token_url: env::var("STRAVA_TOKEN_URL").unwrap_or_else(|_| STRAVA_TOKEN_URL.to_string()),
      api_base: env::var("STRAVA_API_BASE").unwrap_or_else(|_| STRAVA_API_BASE.to_string()),
    })
  }
}

/// Response from Strava token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub refresh_token: String,
  pub expires_at: i64,
}

/// Current token state
#[derive(Debug, Clone)]
pub struct StravaTokens {
  pub access_token: String,
  pub refresh_token: String,
  pub expires_at: DateTime<Utc>,
}

impl StravaTokens {
  pub fn from_response(resp: TokenResponse) -> Self {
    Self {
      access_token: resp.access_token,
      refresh_token: resp.refresh_token,
      expires_at: DateTime::from_timestamp(resp.expires_at, 0).unwrap_or_else(Utc::now),
    }
  }

  pub fn needs_refresh(&self) -> bool {
    let buffer = Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
    Utc::now() + buffer >= self.expires_at
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StravaError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Invalid Strava credentials: {0}")]
  InvalidCredentials(String),

  #[error("Token refresh failed: {0}")]
  RefreshFailed(String),

  #[error("Not authorized by Strava (token expired or revoked)")]
  Unauthorized,

  #[error("Strava rate limit exceeded")]
  RateLimited,

  #[error("Network failure: {0}")]
  NetworkFailure(#[from] reqwest::Error),

  #[error("Strava API error ({status}): {message}")]
  Api { status: u16, message: String },

  #[error("Failed to parse Strava response: {0}")]
  Parse(String),
}

impl Serialize for StravaError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Token Provider (Refresh Token -> Access Token)
/// ---------------------------------------------------------------------------

pub struct StravaAuth {
  config: StravaConfig,
  client: Client,
  tokens: Option<StravaTokens>,
}

impl StravaAuth {
  pub fn new(config: StravaConfig) -> Self {
    Self {
      config,
      client: Client::new(),
      tokens: None,
    }
  }

  /// Get a valid access token, refreshing if necessary.
  pub async fn get_access_token(&mut self) -> Result<String, StravaError> {
    if let Some(tokens) = &self.tokens {
      if !tokens.needs_refresh() {
        return Ok(tokens.access_token.clone());
      }
    } else if let Some(token) = self.config.access_token.take() {
      // Expiry unknown for a configured token; the first 401 surfaces as Unauthorized
      tracing::debug!("using configured Strava access token");
      return Ok(token);
    }

    let refresh_token = self
      .tokens
      .as_ref()
      .map(|t| t.refresh_token.clone())
      .unwrap_or_else(|| self.config.refresh_token.clone());

    let tokens = self.refresh_tokens(&refresh_token).await?;
    let access_token = tokens.access_token.clone();
    self.tokens = Some(tokens);
    tracing::info!("Strava tokens refreshed");
    Ok(access_token)
  }

  async fn refresh_tokens(&self, refresh_token: &str) -> Result<StravaTokens, StravaError> {
    let response = self
      .client
      .post(&self.config.token_url)
      .form(&[
        ("client_id", self.config.client_id.as_str()),
        ("client_secret", self.config.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
      ])
      .send()
      .await
      .map_err(|e| StravaError::RefreshFailed(e.to_string()))?;

    let status = response.status();
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StravaError::InvalidCredentials(error_text));
    }

    if !status.is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StravaError::RefreshFailed(format!("{}: {}", status, error_text)));
    }

    let token_response: TokenResponse = response
      .json()
      .await
      .map_err(|e| StravaError::RefreshFailed(e.to_string()))?;
    Ok(StravaTokens::from_response(token_response))
  }
}

/// ---------------------------------------------------------------------------
/// Strava API - Activity Fetching
/// ---------------------------------------------------------------------------

/// Activity summary from Strava API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StravaActivity {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  /// Strava uses "type" for legacy and "sport_type" for newer activities
  #[serde(rename = "type", default)]
  pub activity_type: String,
  #[serde(default)]
  pub sport_type: Option<String>,
  pub start_date: DateTime<Utc>,
  #[serde(default)]
  pub moving_time: i64,
  #[serde(default)]
  pub distance: Option<f64>,
  #[serde(default)]
  pub total_elevation_gain: Option<f64>,
  #[serde(default)]
  pub average_heartrate: Option<f64>,
  #[serde(default)]
  pub max_heartrate: Option<f64>,
  /// Run codes: 0 default, 1 race, 2 long run, 3 workout
  #[serde(default)]
  pub workout_type: Option<i64>,
}

pub struct StravaClient {
  client: Client,
  api_base: String,
  access_token: String,
}

impl StravaClient {
  pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_base: api_base.into(),
      access_token: access_token.into(),
    }
  }

  /// Fetch every activity that started between `after` and `before`
  pub async fn fetch_activities(
    &self,
    after: DateTime<Utc>,
    before: DateTime<Utc>,
  ) -> Result<Vec<StravaActivity>, StravaError> {
    let mut activities = Vec::new();

    for page in 1..=MAX_ACTIVITY_PAGES {
      let batch = self.fetch_page(after, before, page).await?;
      let batch_len = batch.len();
      activities.extend(batch);

      if batch_len < ACTIVITIES_PER_PAGE as usize {
        break;
      }
      if page == MAX_ACTIVITY_PAGES {
        tracing::warn!(pages = page, "stopped paging Strava activities at page limit");
      }
    }

    tracing::info!(count = activities.len(), "fetched Strava activities");
    Ok(activities)
  }

  async fn fetch_page(
    &self,
    after: DateTime<Utc>,
    before: DateTime<Utc>,
    page: u32,
  ) -> Result<Vec<StravaActivity>, StravaError> {
    let url = self.activities_url(after, before, page)?;

    let response = self
      .client
      .get(url)
      .bearer_auth(&self.access_token)
      .send()
      .await?;

    match response.status() {
      StatusCode::UNAUTHORIZED => return Err(StravaError::Unauthorized),
      StatusCode::TOO_MANY_REQUESTS => return Err(StravaError::RateLimited),
      status if !status.is_success() => {
        let error_text = response.text().await.unwrap_or_default();
        return Err(StravaError::Api {
          status: status.as_u16(),
          message: error_text,
        });
      }
      _ => {}
    }

    let response_text = response.text().await?;

    serde_json::from_str(&response_text).map_err(|e| {
      let snippet: String = response_text.chars().take(1000).collect();
      tracing::error!(error = %e, body = %snippet, "failed to parse Strava activities");
      StravaError::Parse(e.to_string())
    })
  }

  fn activities_url(
    &self,
    after: DateTime<Utc>,
    before: DateTime<Utc>,
    page: u32,
  ) -> Result<Url, StravaError> {
    let mut url = Url::parse(&format!("{}/athlete/activities", self.api_base.trim_end_matches('/')))
      .map_err(|e| StravaError::MissingConfig(format!("invalid Strava API base: {}", e)))?;

    url
      .query_pairs_mut()
      .append_pair("after", &after.timestamp().to_string())
      .append_pair("before", &before.timestamp().to_string())
      .append_pair("per_page", &ACTIVITIES_PER_PAGE.to_string())
      .append_pair("page", &page.to_string());

    Ok(url)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
