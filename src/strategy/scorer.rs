//! Parlay scoring.
//!
//! Pure functions mapping a parlay to a scalar under a ranking objective,
//! plus the expected value of a "no-sweat" (risk-free first bet) promo.

use serde::{Deserialize, Serialize};

use crate::types::{Parlay, ScoreMode};

/// Weight of probability in the balanced blend (edge gets the rest).
const BALANCE_WEIGHT: f64 = 0.5;

/// Rescale an average edge into roughly [0, 1].
///
/// Assumes edges lie in about [-1, 1]. Raw projection-minus-line edges are
/// usually far wider, so this saturates quickly; values outside the range
/// are passed through unclamped.
pub fn normalize_edge(avg_edge: f64) -> f64 {
    (avg_edge + 1.0) / 2.0
}

/// Balanced score from raw components.
pub fn balance_score(probability: f64, avg_edge: f64) -> f64 {
    BALANCE_WEIGHT * probability + (1.0 - BALANCE_WEIGHT) * normalize_edge(avg_edge)
}

/// Score a parlay under the given mode.
pub fn score(parlay: &Parlay, mode: ScoreMode) -> f64 {
    match mode {
        ScoreMode::Probability => parlay.probability,
        ScoreMode::Edge => parlay.avg_edge,
        ScoreMode::Balance => balance_score(parlay.probability, parlay.avg_edge),
    }
}

// ---------------------------------------------------------------------------
// Promotional expected value
// ---------------------------------------------------------------------------

/// Parameters of a risk-free first bet promotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromoTerms {
    /// Cash risked.
    pub stake: f64,
    /// Realisable cash per unit of free-bet face value.
    pub free_bet_conversion: f64,
}

impl Default for PromoTerms {
    fn default() -> Self {
        Self {
            stake: 100.0,
            free_bet_conversion: 0.7,
        }
    }
}

/// Expected value of a parlay placed as a no-sweat bet.
///
/// On a win the bettor nets `payout * stake - stake`; on a loss the stake
/// is gone but refunded as a free bet worth `stake * free_bet_conversion`.
pub fn promo_expected_value(parlay: &Parlay, terms: &PromoTerms) -> f64 {
    let win_prob = parlay.probability;
    let lose_prob = 1.0 - win_prob;
    let net_win = parlay.payout * terms.stake - terms.stake;
    let free_bet_value = terms.stake * terms.free_bet_conversion;
    win_prob * net_win + lose_prob * free_bet_value - lose_prob * terms.stake
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
