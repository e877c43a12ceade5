//! Shared types for the parlay engine.
//!
//! These types form the data model used across all modules. Legs are
//! immutable snapshots of a single Over bet; parlays are transient
//! combinations derived from them during a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal odds at or below this value are unusable (zero, negative or
/// effectively even-money-less lines) and never enter a parlay.
pub const MIN_VALID_ODDS: f64 = 1.01;

/// Suffix carried by alternate-line market keys.
const ALTERNATE_SUFFIX: &str = "_alternate";

// ---------------------------------------------------------------------------
// PropLeg
// ---------------------------------------------------------------------------

/// A single Over bet on one player / market / line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropLeg {
    pub player_name: String,
    /// Raw market identifier, e.g. `player_rebounds_alternate`.
    pub market_key: String,
    /// `market_key` without the `_alternate` suffix.
    pub stat_type: String,
    /// Human-readable market name used in reports.
    pub market_description: String,
    /// The "Over X" threshold.
    pub prop_line: f64,
    /// Payout multiplier for a winning unit stake.
    pub odds_decimal: f64,
    /// Market-implied win probability.
    pub implied_prob: f64,
    /// Projected value minus `prop_line`.
    pub edge: f64,
}

impl PropLeg {
    pub fn new(
        player_name: impl Into<String>,
        market_key: impl Into<String>,
        market_description: impl Into<String>,
        prop_line: f64,
        odds_decimal: f64,
        implied_prob: f64,
        edge: f64,
    ) -> Self {
        let market_key = market_key.into();
        Self {
            player_name: player_name.into(),
            stat_type: stat_type_of(&market_key).to_string(),
            market_key,
            market_description: market_description.into(),
            prop_line,
            odds_decimal,
            implied_prob,
            edge,
        }
    }

    /// Whether the decimal odds are usable for scoring.
    pub fn has_valid_odds(&self) -> bool {
        self.odds_decimal > MIN_VALID_ODDS
    }

    /// Same player and same raw market.
    pub fn same_player_market(&self, other: &PropLeg) -> bool {
        self.player_name == other.player_name && self.market_key == other.market_key
    }
}

impl fmt::Display for PropLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} Over {} @ {:.2} (edge {:+.2}, p={:.1}%)",
            self.player_name,
            self.market_description,
            self.prop_line,
            self.odds_decimal,
            self.edge,
            self.implied_prob * 100.0,
        )
    }
}

/// Strip the alternate suffix so standard and alternate markets for the
/// same statistic share one key.
pub fn stat_type_of(market_key: &str) -> &str {
    market_key.strip_suffix(ALTERNATE_SUFFIX).unwrap_or(market_key)
}

// ---------------------------------------------------------------------------
// Parlay
// ---------------------------------------------------------------------------

/// A combination of legs that must all win. Derived fields are computed
/// once at construction under the independence assumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parlay {
    pub legs: Vec<PropLeg>,
    pub num_legs: usize,
    /// Product of leg `implied_prob`.
    pub probability: f64,
    /// Arithmetic mean of leg `edge`.
    pub avg_edge: f64,
    /// Product of leg `odds_decimal`.
    pub payout: f64,
}

impl Parlay {
    /// Build a parlay from an ordered, non-empty list of legs.
    pub fn from_legs(legs: Vec<PropLeg>) -> Self {
        debug_assert!(!legs.is_empty(), "parlay needs at least one leg");
        let (probability, avg_edge, payout) = aggregate(legs.iter());
        Self {
            num_legs: legs.len(),
            legs,
            probability,
            avg_edge,
            payout,
        }
    }
}

impl fmt::Display for Parlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-leg parlay (p={:.2}% | avg edge {:.2} | payout {:.2}x)",
            self.num_legs,
            self.probability * 100.0,
            self.avg_edge,
            self.payout,
        )
    }
}

/// Aggregate `(probability, avg_edge, payout)` over a set of legs.
pub fn aggregate<'a>(legs: impl IntoIterator<Item = &'a PropLeg>) -> (f64, f64, f64) {
    let mut probability = 1.0;
    let mut edge_sum = 0.0;
    let mut payout = 1.0;
    let mut count = 0usize;
    for leg in legs {
        probability *= leg.implied_prob;
        edge_sum += leg.edge;
        payout *= leg.odds_decimal;
        count += 1;
    }
    let avg_edge = if count == 0 { 0.0 } else { edge_sum / count as f64 };
    (probability, avg_edge, payout)
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Objective used to rank parlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    Probability,
    Edge,
    #[default]
    Balance,
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreMode::Probability => write!(f, "probability"),
            ScoreMode::Edge => write!(f, "edge"),
            ScoreMode::Balance => write!(f, "balance"),
        }
    }
}

impl std::str::FromStr for ScoreMode {
    type Err = ParlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "probability" | "prob" => Ok(ScoreMode::Probability),
            "edge" => Ok(ScoreMode::Edge),
            "balance" | "balanced" => Ok(ScoreMode::Balance),
            _ => Err(ParlayError::UnknownScoreMode(s.to_string())),
        }
    }
}

/// Which co-existence rule a combination must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidityRule {
    /// Each player at most once and each raw market key at most once.
    #[default]
    Standard,
    /// No two legs with the same player and stat type.
    Promotional,
}

/// Search strategy used to build parlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Greedy,
    Exhaustive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Greedy => write!(f, "greedy"),
            Strategy::Exhaustive => write!(f, "exhaustive"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = ParlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(Strategy::Greedy),
            "exhaustive" | "search" => Ok(Strategy::Exhaustive),
            _ => Err(ParlayError::Config(format!("unknown strategy: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds conversion
// ---------------------------------------------------------------------------

/// Convert decimal odds to signed American odds.
///
/// `>= 2.0` maps to `(d - 1) * 100`, below that to `-100 / (d - 1)`.
/// Odds of 1.0 or less have no American equivalent.
pub fn decimal_to_american(decimal_odds: f64) -> Result<f64, ParlayError> {
    if !(decimal_odds > 1.0) {
        return Err(ParlayError::InvalidOdds(decimal_odds));
    }
    if decimal_odds >= 2.0 {
        Ok((decimal_odds - 1.0) * 100.0)
    } else {
        Ok(-100.0 / (decimal_odds - 1.0))
    }
}

/// Render decimal odds as an American odds string (`+150`, `-200`),
/// truncating toward zero.
pub fn format_american(decimal_odds: f64) -> Result<String, ParlayError> {
    let american = decimal_to_american(decimal_odds)?;
    if american >= 0.0 {
        Ok(format!("+{}", american.trunc() as i64))
    } else {
        Ok(format!("-{}", american.abs().trunc() as i64))
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ParlayError {
    #[error("Missing required field `{field}` at row {row}")]
    MissingField { row: usize, field: &'static str },

    #[error("Invalid value for `{field}` at row {row}: {value}")]
    InvalidValue {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Invalid decimal odds: {0}")]
    InvalidOdds(f64),

    #[error("Unknown score mode: {0}")]
    UnknownScoreMode(String),

    #[error("Odds source error: {0}")]
    OddsSource(String),

    #[error("Projection source error: {0}")]
    ProjectionSource(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(player: &str, market: &str, prob: f64, edge: f64, odds: f64) -> PropLeg {
        PropLeg::new(player, market, market, 10.5, odds, prob, edge)
    }

    // -- PropLeg tests --

    #[test]
    fn test_stat_type_strips_alternate() {
        let l = leg("A", "player_rebounds_alternate", 0.5, 1.0, 2.0);
        assert_eq!(l.stat_type, "player_rebounds");
        let l = leg("A", "player_points", 0.5, 1.0, 2.0);
        assert_eq!(l.stat_type, "player_points");
    }

    #[test]
    fn test_stat_type_only_strips_suffix() {
        assert_eq!(
            stat_type_of("player_points_rebounds_alternate"),
            "player_points_rebounds"
        );
        assert_eq!(stat_type_of("alternate_points"), "alternate_points");
    }

    #[test]
    fn test_valid_odds_threshold() {
        assert!(!leg("A", "m", 0.5, 1.0, 1.0).has_valid_odds());
        assert!(!leg("A", "m", 0.5, 1.0, 1.01).has_valid_odds());
        assert!(leg("A", "m", 0.5, 1.0, 1.02).has_valid_odds());
    }

    // -- Parlay tests --

    #[test]
    fn test_parlay_three_leg_scenario() {
        let parlay = Parlay::from_legs(vec![
            leg("A", "player_points", 0.6, 0.3, 1.7),
            leg("B", "player_rebounds", 0.55, 0.2, 1.8),
            leg("C", "player_assists", 0.5, 0.1, 2.0),
        ]);
        assert_eq!(parlay.num_legs, 3);
        assert!((parlay.probability - 0.165).abs() < 1e-12);
        assert!((parlay.avg_edge - 0.2).abs() < 1e-12);
        assert!((parlay.payout - 6.12).abs() < 1e-12);
    }

    #[test]
    fn test_avg_edge_is_exact_mean() {
        let legs = vec![
            leg("A", "m1", 0.6, 1.7, 1.7),
            leg("B", "m2", 0.55, -0.4, 1.8),
            leg("C", "m3", 0.5, 3.25, 2.0),
        ];
        let expected = (1.7 + -0.4 + 3.25) / 3.0;
        let parlay = Parlay::from_legs(legs);
        assert_eq!(parlay.avg_edge, expected);
    }

    #[test]
    fn test_parlay_bounds() {
        let parlay = Parlay::from_legs(vec![
            leg("A", "m1", 0.9, 0.1, 1.1),
            leg("B", "m2", 0.8, 0.1, 1.2),
        ]);
        assert!(parlay.probability >= 0.0 && parlay.probability <= 1.0);
        assert!(parlay.payout >= 1.0);
    }

    // -- ScoreMode tests --

    #[test]
    fn test_score_mode_from_str() {
        assert_eq!("prob".parse::<ScoreMode>().unwrap(), ScoreMode::Probability);
        assert_eq!("EDGE".parse::<ScoreMode>().unwrap(), ScoreMode::Edge);
        assert_eq!("balance".parse::<ScoreMode>().unwrap(), ScoreMode::Balance);
        assert!("nonsense".parse::<ScoreMode>().is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "at least one leg")]
    fn test_empty_parlay_rejected() {
        Parlay::from_legs(Vec::new());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Greedy".parse::<Strategy>().unwrap(), Strategy::Greedy);
        assert_eq!("exhaustive".parse::<Strategy>().unwrap(), Strategy::Exhaustive);
        assert!("random".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Exhaustive.to_string(), "exhaustive");
    }

    #[test]
    fn test_score_mode_default_is_balance() {
        assert_eq!(ScoreMode::default(), ScoreMode::Balance);
    }

    // -- Odds conversion tests --

    #[test]
    fn test_american_odds_positive() {
        assert!((decimal_to_american(2.5).unwrap() - 150.0).abs() < 1e-9);
        assert_eq!(format_american(2.5).unwrap(), "+150");
        assert_eq!(format_american(2.0).unwrap(), "+100");
    }

    #[test]
    fn test_american_odds_negative() {
        assert!((decimal_to_american(1.5).unwrap() + 200.0).abs() < 1e-9);
        assert_eq!(format_american(1.5).unwrap(), "-200");
    }

    #[test]
    fn test_american_odds_rejects_even_and_below() {
        assert!(decimal_to_american(1.0).is_err());
        assert!(decimal_to_american(0.0).is_err());
        assert!(decimal_to_american(f64::NAN).is_err());
        assert!(format_american(-3.0).is_err());
    }

    #[test]
    fn test_error_display() {
        let e = ParlayError::MissingField { row: 3, field: "edge" };
        assert_eq!(e.to_string(), "Missing required field `edge` at row 3");
    }
}
