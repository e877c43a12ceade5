//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section falls back to its defaults when omitted. Secrets (API keys) are
//! referenced by env-var name in the config and resolved at runtime via
//! `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::data::markets;
use crate::types::{ParlayError, Strategy};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub odds: OddsConfig,
    pub projections: ProjectionsConfig,
    pub filter: FilterConfig,
    pub generator: GeneratorConfig,
    pub promo: PromoSettings,
    pub report: ReportSettings,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OddsConfig {
    pub base_url: String,
    pub sport_key: String,
    pub regions: String,
    /// Only this bookmaker's prices are requested and kept. `"all"` (or an
    /// empty string) in the file lifts the filter.
    #[serde(deserialize_with = "bookmaker_filter")]
    pub bookmaker: Option<String>,
    /// Env var holding the primary API key.
    pub api_key_env: String,
    /// Optional file with one API key per line, used for rotation.
    pub key_file: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.the-odds-api.com/v4".to_string(),
            sport_key: "basketball_nba".to_string(),
            regions: "us".to_string(),
            bookmaker: Some("fanduel".to_string()),
            api_key_env: "ODDS_API_KEY".to_string(),
            key_file: None,
            timeout_secs: 30,
        }
    }
}

fn bookmaker_filter<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let key = String::deserialize(deserializer)?;
    let key = key.trim();
    if key.is_empty() || key.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        Ok(Some(key.to_lowercase()))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProjectionsConfig {
    pub url: String,
    /// Minimum name similarity (0–100, exclusive) to accept a match.
    pub match_threshold: f64,
}

impl Default for ProjectionsConfig {
    fn default() -> Self {
        Self {
            url: "https://www.sportsline.com/nba/expert-projections/simulation/".to_string(),
            match_threshold: 80.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterConfig {
    /// Market keys allowed into the parlay pool.
    pub allowed_markets: Vec<String>,
    /// Keep only the top-K legs by edge.
    pub top_props: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_markets: markets::DEFAULT_ALLOWED
                .iter()
                .map(|m| m.to_string())
                .collect(),
            top_props: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub strategy: Strategy,
    pub min_legs: usize,
    pub max_legs: usize,
    pub top_n: usize,
    /// Exhaustive search: discard combinations below this probability.
    pub min_probability: f64,
    /// Exhaustive search: candidate pool cap (legs by edge).
    pub search_pool: usize,
    /// Exhaustive search: worker threads (0 = available parallelism).
    pub workers: usize,
    /// Greedy: most negative American odds a leg may carry.
    pub american_odds_cap: f64,
    /// Greedy: payout floor for the guaranteed best pair.
    pub min_pair_payout: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Greedy,
            min_legs: 2,
            max_legs: 5,
            top_n: 30,
            min_probability: 0.05,
            search_pool: 250,
            workers: 0,
            american_odds_cap: -500.0,
            min_pair_payout: 3.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PromoSettings {
    pub stake: f64,
    /// Cash value of a free bet as a fraction of its face value.
    pub free_bet_conversion: f64,
}

impl Default for PromoSettings {
    fn default() -> Self {
        Self {
            stake: 100.0,
            free_bet_conversion: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportSettings {
    pub output_dir: String,
    /// Leg count of the "most probable" section.
    pub top_legs: usize,
    /// Number of parlays listed in the "most probable" section.
    pub top_count: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: "data".to_string(),
            top_legs: 5,
            top_count: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ParlayError> {
        let g = &self.generator;
        if g.min_legs < 2 {
            return Err(ParlayError::Config(format!(
                "min_legs must be at least 2, got {}",
                g.min_legs
            )));
        }
        if g.max_legs < g.min_legs {
            return Err(ParlayError::Config(format!(
                "max_legs ({}) is below min_legs ({})",
                g.max_legs, g.min_legs
            )));
        }
        if g.max_legs > 6 {
            return Err(ParlayError::Config(format!(
                "max_legs must be at most 6, got {}",
                g.max_legs
            )));
        }
        if !(0.0..=1.0).contains(&g.min_probability) {
            return Err(ParlayError::Config(format!(
                "min_probability must lie in [0, 1], got {}",
                g.min_probability
            )));
        }
        if !(0.0..=1.0).contains(&self.promo.free_bet_conversion) {
            return Err(ParlayError::Config(format!(
                "free_bet_conversion must lie in [0, 1], got {}",
                self.promo.free_bet_conversion
            )));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
