//! Rate-limited HTTP client and the `FootballApi` seam
//!
//! One logical call = up to `max_attempts` HTTP attempts. Before every
//! attempt the client waits until the process-wide rate-limit clock allows
//! another request; retry attempts wait exponentially longer. A response
//! carrying the vendor's daily-quota message short-circuits everything and
//! is returned as `ApiError::DailyLimitExceeded`; any other exhausted
//! outcome resolves to "no data" so callers continue with their next unit
//! of work.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::envelope::ApiEnvelope;
use crate::error::{ApiError, Result};
use crate::models::{
    CountryEntry, InjuryEntry, LeagueEntry, PlayerEntry, PlayersPage, SidelinedEntry, TeamEntry,
    TransferEntry, TrophyEntry,
};

/// Vendor error phrasings that mean the hard daily quota was hit.
/// These are never retried.
const DAILY_LIMIT_PATTERNS: &[&str] =
    &["request limit for the day", "daily limit", "reached the request limit"];

/// Vendor error phrasings worth retrying after a backoff
const TRANSIENT_PATTERNS: &[&str] =
    &["rate limit", "too many requests", "timeout", "temporarily unavailable", "try again"];

/// Typed surface over the vendor endpoints.
///
/// The pipeline is programmed against this trait so a scripted double can
/// stand in for the real client in tests.
#[async_trait]
pub trait FootballApi: Send + Sync {
    /// `/leagues?id=`
    async fn league_by_id(&self, id: u32) -> Result<Option<LeagueEntry>>;

    /// `/teams?league=&season=`
    async fn teams_in_league(&self, league: u32, season: i32) -> Result<Vec<TeamEntry>>;

    /// `/teams?id=`
    async fn team_by_id(&self, id: u32) -> Result<Option<TeamEntry>>;

    /// `/players?league=&season=&page=`
    async fn players_page(&self, league: u32, season: i32, page: u32) -> Result<PlayersPage>;

    /// `/players?id=&season=`
    async fn player_for_season(&self, player: u32, season: i32) -> Result<Option<PlayerEntry>>;

    /// `/players/seasons?player=`
    async fn player_seasons(&self, player: u32) -> Result<Vec<i32>>;

    /// `/transfers?player=`
    async fn transfers(&self, player: u32) -> Result<Vec<TransferEntry>>;

    /// `/injuries?player=&season=`
    async fn injuries(&self, player: u32, season: i32) -> Result<Vec<InjuryEntry>>;

    /// `/sidelined?player=`
    async fn sidelined(&self, player: u32) -> Result<Vec<SidelinedEntry>>;

    /// `/trophies?player=`
    async fn trophies(&self, player: u32) -> Result<Vec<TrophyEntry>>;

    /// `/countries?name=`
    async fn country_by_name(&self, name: &str) -> Result<Option<CountryEntry>>;
}

/// Rate-limited, retrying client for the API-Football vendor API
pub struct ApiFootballClient {
    config: ApiConfig,
    http: reqwest::Client,
    /// Process-wide rate-limit clock; every outbound request within a run
    /// is spaced against this instant
    last_request: Mutex<Option<Instant>>,
}

impl ApiFootballClient {
    /// Create a new client from configuration
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::fatal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http, last_request: Mutex::new(None) })
    }

    /// Issue one logical GET against the vendor, returning the parsed
    /// envelope or `None` when no data could be obtained.
    pub async fn get_envelope(&self, path_and_query: &str) -> Result<Option<ApiEnvelope>> {
        let url = format!("{}{}", self.config.base_url, path_and_query);

        for attempt in 1..=self.config.max_attempts {
            self.pace(attempt).await;

            let response = match self
                .http
                .get(&url)
                .header("x-rapidapi-key", &self.config.api_key)
                .header("x-rapidapi-host", &self.config.api_host)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, path = path_and_query, "request failed, will retry");
                    continue;
                }
            };

            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(attempt, error = %e, path = path_and_query, "failed to read body, will retry");
                    continue;
                }
            };

            match evaluate_response(status, &body) {
                ResponseVerdict::Success(envelope) => return Ok(Some(envelope)),
                ResponseVerdict::DailyLimit(message) => {
                    warn!(path = path_and_query, %message, "daily request limit reached");
                    return Err(ApiError::DailyLimitExceeded(message));
                }
                ResponseVerdict::Transient(reason) => {
                    warn!(attempt, %reason, path = path_and_query, "transient failure, will retry");
                    continue;
                }
                ResponseVerdict::Failed(reason) => {
                    warn!(%reason, path = path_and_query, "vendor rejected request, treating as no data");
                    return Ok(None);
                }
            }
        }

        debug!(path = path_and_query, "retries exhausted, treating as no data");
        Ok(None)
    }

    /// Wait until the rate-limit clock allows another request, then claim it.
    ///
    /// The first attempt of a call uses the baseline spacing; retries wait
    /// base × 2^(attempt-2).
    async fn pace(&self, attempt: u32) {
        let spacing = retry_delay(self.config.rate_limit_ms, attempt);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < spacing {
                tokio::time::sleep(spacing - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Deserialize each envelope item into `T`, dropping items that do not
    /// match the expected shape
    fn parse_items<T: serde::de::DeserializeOwned>(envelope: &ApiEnvelope, what: &str) -> Vec<T> {
        let mut items = Vec::with_capacity(envelope.response.len());
        for value in &envelope.response {
            match serde_json::from_value(value.clone()) {
                Ok(item) => items.push(item),
                Err(e) => warn!(error = %e, what, "skipping malformed response item"),
            }
        }
        items
    }

    async fn fetch_one<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<Option<T>> {
        let Some(envelope) = self.get_envelope(path).await? else {
            return Ok(None);
        };
        Ok(Self::parse_items(&envelope, what).into_iter().next())
    }

    async fn fetch_many<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<Vec<T>> {
        let Some(envelope) = self.get_envelope(path).await? else {
            return Ok(Vec::new());
        };
        Ok(Self::parse_items(&envelope, what))
    }
}

#[async_trait]
impl FootballApi for ApiFootballClient {
    async fn league_by_id(&self, id: u32) -> Result<Option<LeagueEntry>> {
        self.fetch_one(&format!("/leagues?id={id}"), "league").await
    }

    async fn teams_in_league(&self, league: u32, season: i32) -> Result<Vec<TeamEntry>> {
        self.fetch_many(&format!("/teams?league={league}&season={season}"), "team").await
    }

    async fn team_by_id(&self, id: u32) -> Result<Option<TeamEntry>> {
        self.fetch_one(&format!("/teams?id={id}"), "team").await
    }

    async fn players_page(&self, league: u32, season: i32, page: u32) -> Result<PlayersPage> {
        let path = format!("/players?league={league}&season={season}&page={page}");
        let Some(envelope) = self.get_envelope(&path).await? else {
            return Ok(PlayersPage::default());
        };
        Ok(PlayersPage {
            entries: Self::parse_items(&envelope, "player"),
            current_page: envelope.paging.and_then(|p| p.current).unwrap_or(page),
            total_pages: envelope.total_pages(),
        })
    }

    async fn player_for_season(&self, player: u32, season: i32) -> Result<Option<PlayerEntry>> {
        self.fetch_one(&format!("/players?id={player}&season={season}"), "player").await
    }

    async fn player_seasons(&self, player: u32) -> Result<Vec<i32>> {
        self.fetch_many(&format!("/players/seasons?player={player}"), "season").await
    }

    async fn transfers(&self, player: u32) -> Result<Vec<TransferEntry>> {
        self.fetch_many(&format!("/transfers?player={player}"), "transfer").await
    }

    async fn injuries(&self, player: u32, season: i32) -> Result<Vec<InjuryEntry>> {
        self.fetch_many(&format!("/injuries?player={player}&season={season}"), "injury").await
    }

    async fn sidelined(&self, player: u32) -> Result<Vec<SidelinedEntry>> {
        self.fetch_many(&format!("/sidelined?player={player}"), "sidelined").await
    }

    async fn trophies(&self, player: u32) -> Result<Vec<TrophyEntry>> {
        self.fetch_many(&format!("/trophies?player={player}"), "trophy").await
    }

    async fn country_by_name(&self, name: &str) -> Result<Option<CountryEntry>> {
        self.fetch_one(&format!("/countries?name={name}"), "country").await
    }
}

/// Outcome of evaluating one HTTP attempt
#[derive(Debug)]
enum ResponseVerdict {
    Success(ApiEnvelope),
    DailyLimit(String),
    Transient(String),
    Failed(String),
}

/// Classify one HTTP attempt from its status and raw body.
///
/// The body is inspected before the status: the vendor reports quota
/// exhaustion inside the envelope (sometimes on a 200, sometimes on a 429),
/// and that must win over any status-based retry decision.
fn evaluate_response(status: StatusCode, body: &str) -> ResponseVerdict {
    match serde_json::from_str::<ApiEnvelope>(body) {
        Ok(envelope) => {
            let messages = envelope.error_messages();
            if let Some(message) = messages.iter().find(|m| is_daily_limit_message(m)) {
                return ResponseVerdict::DailyLimit(message.clone());
            }
            if let Some(message) = messages.iter().find(|m| is_transient_message(m)) {
                return ResponseVerdict::Transient(message.clone());
            }
            if !messages.is_empty() {
                return ResponseVerdict::Failed(messages.join("; "));
            }
            if status.is_success() {
                return ResponseVerdict::Success(envelope);
            }
            if is_retryable_status(status) {
                return ResponseVerdict::Transient(format!("HTTP {status}"));
            }
            ResponseVerdict::Failed(format!("HTTP {status}"))
        }
        Err(_) if is_retryable_status(status) => {
            ResponseVerdict::Transient(format!("HTTP {status}"))
        }
        // Unparsable body counts as an I/O-shaped failure and gets retried
        Err(e) => ResponseVerdict::Transient(format!("malformed body: {e}")),
    }
}

/// True for the vendor's daily-quota phrasings
fn is_daily_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    DAILY_LIMIT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// True for retryable vendor error phrasings
fn is_transient_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// HTTP statuses worth another attempt
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// Spacing before attempt `attempt` of a logical call: the baseline for the
/// first two attempts, doubling from the third on
fn retry_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms * 2u64.pow(attempt.saturating_sub(2)))
}
