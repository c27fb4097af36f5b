//! NASCAR cacher API client.
//!
//! Read-only JSON feeds, one GET per feed:
//!
//! - **Race list**: `{base}/{year}/race_list_basic.json`
//! - **Race feeds**: `{base}/{year}/{series}/{race}/{feed}.json` for
//!   `lap-times`, `live-pit-data`, `lap-notes` and `weekend-feed`. A race in
//!   progress is served from `{base}/live/series_{series}/{race}/{feed}.json`.
//! - **Loop stats**: `{loopstats}/{year}/{series}/{race}.json`
//!
//! No authentication and no rate limiting; the feeds are CDN-backed.

pub mod error;
pub mod response;

pub use error::ApiError;
pub use response::{LapNotesFeed, LapTimesFeed, LoopStatsRace, PitStopEntry, RaceListFeed, WeekendFeed};

use std::sync::Arc;
use std::time::{Duration, Instant};

use pitlane_core::{AppConfig, KeyParams};
use reqwest::header;
use serde::de::DeserializeOwned;
use url::Url;

/// Default base URL for the cacher feeds.
const DEFAULT_BASE_URL: &str = "https://cf.nascar.com/cacher";

/// Default base URL for the loop data feed.
const DEFAULT_LOOPSTATS_URL: &str = "https://cf.nascar.com/loopstats/prod";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "pitlane/0.1";

/// Cacher client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL (default: https://cf.nascar.com/cacher).
    pub base_url: String,
    /// Loop data base URL (default: https://cf.nascar.com/loopstats/prod).
    pub loopstats_url: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: pitlane/0.x).
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            loopstats_url: DEFAULT_LOOPSTATS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for ClientConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            loopstats_url: config.loopstats_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Identifies one race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceRef {
    pub year: i32,
    pub series_id: i64,
    pub race_id: i64,
    /// Read from the live feeds instead of the archived ones.
    pub live: bool,
}

impl RaceRef {
    pub fn new(year: i32, series_id: i64, race_id: i64) -> Self {
        Self { year, series_id, race_id, live: false }
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    /// Cache parameters placing this race's tables in its race directory.
    pub fn key_params(&self) -> KeyParams {
        KeyParams::race(self.year, self.series_id, self.race_id)
    }

    /// Path segments of a race feed below the cacher base URL.
    fn feed_segments(&self, feed: &str) -> Vec<String> {
        let file = format!("{feed}.json");
        if self.live {
            vec!["live".into(), format!("series_{}", self.series_id), self.race_id.to_string(), file]
        } else {
            vec![self.year.to_string(), self.series_id.to_string(), self.race_id.to_string(), file]
        }
    }
}

/// Source of raw feed payloads.
///
/// [`CacherClient`] is the network implementation; loaders only see this
/// trait.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Every race of every series in `year`.
    async fn race_list(&self, year: i32) -> Result<RaceListFeed, ApiError>;

    async fn lap_times(&self, race: &RaceRef) -> Result<LapTimesFeed, ApiError>;

    async fn pit_stops(&self, race: &RaceRef) -> Result<Vec<PitStopEntry>, ApiError>;

    async fn lap_notes(&self, race: &RaceRef) -> Result<LapNotesFeed, ApiError>;

    async fn weekend_feed(&self, race: &RaceRef) -> Result<WeekendFeed, ApiError>;

    async fn loop_stats(&self, race: &RaceRef) -> Result<Vec<LoopStatsRace>, ApiError>;
}

/// HTTP client for the cacher and loopstats feeds.
#[derive(Debug, Clone)]
pub struct CacherClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    base: Url,
    loopstats: Url,
}

impl CacherClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base = parse_base(&config.base_url)?;
        let loopstats = parse_base(&config.loopstats_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|e| ApiError::Network(Arc::new(e)))?;

        Ok(Self { http, config: Arc::new(config), base, loopstats })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL of a race feed, archived or live.
    pub fn race_feed_url(&self, race: &RaceRef, feed: &str) -> Result<Url, ApiError> {
        join_segments(&self.base, &race.feed_segments(feed))
    }

    pub fn race_list_url(&self, year: i32) -> Result<Url, ApiError> {
        join_segments(&self.base, &[year.to_string(), "race_list_basic.json".into()])
    }

    /// Loop stats have no live variant.
    pub fn loop_stats_url(&self, race: &RaceRef) -> Result<Url, ApiError> {
        join_segments(
            &self.loopstats,
            &[race.year.to_string(), race.series_id.to_string(), format!("{}.json", race.race_id)],
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let start = Instant::now();
        tracing::debug!("fetching feed: {}", url);

        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::debug!("feed {} returned {}", url, status);
            return Err(ApiError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let parsed = serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(format!("{url}: {e}")))?;

        tracing::debug!("fetched {} ({} bytes) in {:?}", url, bytes.len(), start.elapsed());
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl FeedSource for CacherClient {
    async fn race_list(&self, year: i32) -> Result<RaceListFeed, ApiError> {
        self.get_json(self.race_list_url(year)?).await
    }

    async fn lap_times(&self, race: &RaceRef) -> Result<LapTimesFeed, ApiError> {
        self.get_json(self.race_feed_url(race, "lap-times")?).await
    }

    async fn pit_stops(&self, race: &RaceRef) -> Result<Vec<PitStopEntry>, ApiError> {
        self.get_json(self.race_feed_url(race, "live-pit-data")?).await
    }

    async fn lap_notes(&self, race: &RaceRef) -> Result<LapNotesFeed, ApiError> {
        self.get_json(self.race_feed_url(race, "lap-notes")?).await
    }

    async fn weekend_feed(&self, race: &RaceRef) -> Result<WeekendFeed, ApiError> {
        self.get_json(self.race_feed_url(race, "weekend-feed")?).await
    }

    async fn loop_stats(&self, race: &RaceRef) -> Result<Vec<LoopStatsRace>, ApiError> {
        self.get_json(self.loop_stats_url(race)?).await
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(format!("{raw}: cannot be a base URL")));
    }
    Ok(url)
}

fn join_segments(base: &Url, segments: &[String]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(format!("{base}: cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CacherClient {
        CacherClient::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_race_feed_url() {
        let race = RaceRef::new(2023, 2, 5314);
        let url = client().race_feed_url(&race, "lap-times").unwrap();
        assert_eq!(url.as_str(), "https://cf.nascar.com/cacher/2023/2/5314/lap-times.json");
    }

    #[test]
    fn test_live_feed_url() {
        let race = RaceRef::new(2025, 1, 5546).live(true);
        let url = client().race_feed_url(&race, "weekend-feed").unwrap();
        assert_eq!(url.as_str(), "https://cf.nascar.com/cacher/live/series_1/5546/weekend-feed.json");
    }

    #[test]
    fn test_race_list_url() {
        let url = client().race_list_url(2024).unwrap();
        assert_eq!(url.as_str(), "https://cf.nascar.com/cacher/2024/race_list_basic.json");
    }

    #[test]
    fn test_loop_stats_url_ignores_live() {
        let race = RaceRef::new(2023, 2, 5314).live(true);
        let url = client().loop_stats_url(&race).unwrap();
        assert_eq!(url.as_str(), "https://cf.nascar.com/loopstats/prod/2023/2/5314.json");
    }

    #[test]
    fn test_trailing_slash_base() {
        let config = ClientConfig { base_url: "http://localhost:8080/cacher/".into(), ..Default::default() };
        let client = CacherClient::new(config).unwrap();
        let url = client.race_list_url(2024).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/cacher/2024/race_list_basic.json");
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig { base_url: "not a url".into(), ..Default::default() };
        assert!(matches!(CacherClient::new(config), Err(ApiError::InvalidUrl(_))));

        let config = ClientConfig { loopstats_url: "mailto:pits@example.com".into(), ..Default::default() };
        assert!(matches!(CacherClient::new(config), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig { api_base_url: "http://localhost/cacher".into(), timeout_ms: 1500, ..Default::default() };
        let config = ClientConfig::from(&app);
        assert_eq!(config.base_url, "http://localhost/cacher");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_race_key_params() {
        let params = RaceRef::new(2024, 1, 5314).key_params();
        assert_eq!(params.len(), 3);
        assert!(params.contains("series_id"));
    }
}
