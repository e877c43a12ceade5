//! Odds feed client.
//!
//! Fetches NBA events and per-event player-prop prices from The Odds API,
//! keeping only Over outcomes. With a bookmaker configured only that book is
//! requested and kept; without one every book the feed returns is kept.
//!
//! API: `https://api.the-odds-api.com/v4`
//! Auth: `apiKey` query parameter. Quota is reported on every response via
//! `x-requests-used` / `x-requests-remaining`. A key that runs out of credits
//! answers 401 with `OUT_OF_USAGE_CREDITS` in the body; the client then
//! moves on to the next configured key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::markets;
use crate::config::{AppConfig, OddsConfig};
use crate::types::ParlayError;

const OUT_OF_CREDITS: &str = "OUT_OF_USAGE_CREDITS";
const OVER: &str = "over";

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    /// RFC 3339 tip-off time as reported by the feed.
    pub start_time: String,
}

/// One Over price for a player prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverProp {
    pub player_name: String,
    pub market_key: String,
    pub market_description: String,
    pub bookmaker: String,
    pub outcome: String,
    /// Decimal odds.
    pub price: f64,
    /// The line.
    pub point: f64,
}

/// Grouping key for best-price selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BestOddsKey {
    pub player_name: String,
    pub market_key: String,
    pub outcome: String,
}

impl BestOddsKey {
    pub fn of(prop: &OverProp) -> Self {
        Self {
            player_name: prop.player_name.clone(),
            market_key: prop.market_key.clone(),
            outcome: prop.outcome.clone(),
        }
    }
}

/// Highest price per (player, market, outcome), in first-seen key order.
/// Equal prices keep the earlier prop.
pub fn find_best_odds(props: &[OverProp]) -> Vec<OverProp> {
    let mut slots: HashMap<BestOddsKey, usize> = HashMap::new();
    let mut best: Vec<OverProp> = Vec::new();
    for prop in props {
        match slots.get(&BestOddsKey::of(prop)) {
            Some(&i) => {
                if prop.price > best[i].price {
                    best[i] = prop.clone();
                }
            }
            None => {
                slots.insert(BestOddsKey::of(prop), best.len());
                best.push(prop.clone());
            }
        }
    }
    best
}

/// Per-market counts within a game's props.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketSummary {
    pub total_props: usize,
    pub unique_players: usize,
    pub bookmakers: usize,
}

/// Overview of one game's props: totals, per-market breakdown and the best
/// price per (player, market, outcome).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropsSummary {
    pub total_props: usize,
    pub best_odds_count: usize,
    pub market_summary: BTreeMap<String, MarketSummary>,
    pub best_odds: Vec<OverProp>,
}

pub fn summarize_props(props: &[OverProp]) -> PropsSummary {
    let mut seen: BTreeMap<&str, (usize, HashSet<&str>, HashSet<&str>)> = BTreeMap::new();
    for prop in props {
        let (total, players, books) = seen.entry(prop.market_key.as_str()).or_default();
        *total += 1;
        players.insert(prop.player_name.as_str());
        books.insert(prop.bookmaker.as_str());
    }

    let market_summary = seen
        .into_iter()
        .map(|(market, (total_props, players, books))| {
            let summary = MarketSummary {
                total_props,
                unique_players: players.len(),
                bookmakers: books.len(),
            };
            (market.to_string(), summary)
        })
        .collect();

    let best_odds = find_best_odds(props);
    PropsSummary {
        total_props: props.len(),
        best_odds_count: best_odds.len(),
        market_summary,
        best_odds,
    }
}

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Anything that can list games and their player-prop Over prices.
#[async_trait]
pub trait OddsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn games(&self) -> Result<Vec<GameInfo>>;

    async fn player_props(&self, game_id: &str, markets: &[String]) -> Result<Vec<OverProp>>;
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: String,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    #[serde(default)]
    commence_time: String,
}

#[derive(Debug, Deserialize)]
struct ApiEventOdds {
    #[serde(default)]
    bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
struct ApiBookmaker {
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
struct ApiMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
struct ApiOutcome {
    name: String,
    /// Player name for player props.
    #[serde(default)]
    description: Option<String>,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

fn over_props(odds: ApiEventOdds, bookmaker: Option<&str>) -> Vec<OverProp> {
    let mut props = Vec::new();
    for book in odds
        .bookmakers
        .into_iter()
        .filter(|b| bookmaker.map_or(true, |key| b.key == key))
    {
        for market in book.markets {
            for outcome in market.outcomes {
                if !outcome.name.eq_ignore_ascii_case(OVER) {
                    continue;
                }
                let (Some(player_name), Some(point)) = (outcome.description, outcome.point) else {
                    debug!(market = %market.key, "Over outcome without player or line, skipped");
                    continue;
                };
                props.push(OverProp {
                    player_name,
                    market_key: market.key.clone(),
                    market_description: markets::description(&market.key),
                    bookmaker: book.title.clone(),
                    outcome: outcome.name,
                    price: outcome.price,
                    point,
                });
            }
        }
    }
    props
}

// ---------------------------------------------------------------------------
// Key rotation
// ---------------------------------------------------------------------------

/// Ordered API keys with a cursor.
pub struct KeyRotator {
    keys: Vec<SecretString>,
    index: usize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Result<Self, ParlayError> {
        let keys: Vec<SecretString> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::new)
            .collect();
        if keys.is_empty() {
            return Err(ParlayError::Config("no odds API key configured".to_string()));
        }
        Ok(Self { keys, index: 0 })
    }

    /// Primary key from the configured env var, then the key file's lines.
    pub fn from_config(config: &OddsConfig) -> Result<Self> {
        let mut keys = Vec::new();
        if let Ok(key) = AppConfig::resolve_env(&config.api_key_env) {
            keys.push(key);
        }
        if let Some(path) = &config.key_file {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read key file {path}"))?;
            for line in contents.lines() {
                let line = line.trim().to_string();
                if !line.is_empty() && !keys.contains(&line) {
                    keys.push(line);
                }
            }
        }
        Ok(Self::new(keys)?)
    }

    pub fn current(&self) -> &SecretString {
        &self.keys[self.index]
    }

    pub fn rotate(&mut self) {
        self.index = (self.index + 1) % self.keys.len();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Request quota as last reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Quota {
    pub used: Option<u32>,
    pub remaining: Option<u32>,
}

pub struct OddsApiClient {
    http: Client,
    config: OddsConfig,
    keys: Mutex<KeyRotator>,
    quota: Mutex<Quota>,
}

impl OddsApiClient {
    pub fn new(config: OddsConfig, keys: KeyRotator) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent("parlay-forge/0.1.0")
            .build()
            .context("Failed to build HTTP client for odds API")?;
        Ok(Self {
            http,
            config,
            keys: Mutex::new(keys),
            quota: Mutex::new(Quota::default()),
        })
    }

    pub fn from_config(config: &OddsConfig) -> Result<Self> {
        let keys = KeyRotator::from_config(config)?;
        info!(
            keys = keys.len(),
            bookmaker = config.bookmaker.as_deref().unwrap_or("all"),
            "Odds API client ready"
        );
        Self::new(config.clone(), keys)
    }

    pub fn quota(&self) -> Quota {
        *self.quota.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_quota(&self, headers: &HeaderMap) {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok())
        };
        let mut quota = self.quota.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(used) = read("x-requests-used") {
            quota.used = Some(used);
        }
        if let Some(remaining) = read("x-requests-remaining") {
            quota.remaining = Some(remaining);
        }
    }

    fn current_key(&self) -> (String, usize) {
        let keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        (keys.current().expose_secret().clone(), keys.len())
    }

    fn rotate_key(&self) {
        self.keys.lock().unwrap_or_else(|e| e.into_inner()).rotate();
    }

    /// GET `path` under the base URL, rotating keys on credit exhaustion.
    /// Each key is tried at most once per request.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let (_, attempts) = self.current_key();

        for attempt in 1..=attempts {
            let (key, _) = self.current_key();
            debug!(url = %url, attempt, "Odds API request");

            let resp = self
                .http
                .get(&url)
                .query(params)
                .query(&[("apiKey", key.as_str())])
                .send()
                .await
                .with_context(|| format!("Odds API request failed: {url}"))?;

            self.record_quota(resp.headers());
            let status = resp.status();

            if status.is_success() {
                return resp
                    .json::<T>()
                    .await
                    .with_context(|| format!("Failed to parse odds API response from {url}"));
            }

            let body = resp.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED && body.contains(OUT_OF_CREDITS) {
                warn!(attempt, "Odds API key out of credits, rotating");
                self.rotate_key();
                continue;
            }
            return Err(ParlayError::OddsSource(format!("{status} from {url}: {body}")).into());
        }

        Err(ParlayError::OddsSource(format!("all {attempts} API keys exhausted")).into())
    }
}

#[async_trait]
impl OddsSource for OddsApiClient {
    fn name(&self) -> &str {
        "the-odds-api"
    }

    async fn games(&self) -> Result<Vec<GameInfo>> {
        let path = format!("sports/{}/events", self.config.sport_key);
        let events: Vec<ApiEvent> = self.get_json(&path, &[]).await?;
        let games: Vec<GameInfo> = events
            .into_iter()
            .map(|e| GameInfo {
                game_id: e.id,
                home_team: e.home_team,
                away_team: e.away_team,
                start_time: e.commence_time,
            })
            .collect();
        let quota = self.quota();
        info!(games = games.len(), used = ?quota.used, remaining = ?quota.remaining, "Fetched games");
        Ok(games)
    }

    async fn player_props(&self, game_id: &str, markets: &[String]) -> Result<Vec<OverProp>> {
        let path = format!("sports/{}/events/{}/odds", self.config.sport_key, game_id);
        let market_list = markets.join(",");
        let bookmaker = self.config.bookmaker.as_deref();
        let mut params = vec![
            ("regions", self.config.regions.as_str()),
            ("markets", market_list.as_str()),
        ];
        if let Some(book) = bookmaker {
            params.push(("bookmakers", book));
        }
        let odds: ApiEventOdds = self.get_json(&path, &params).await?;
        let props = over_props(odds, bookmaker);
        debug!(game_id, props = props.len(), "Fetched player props");
        Ok(props)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
