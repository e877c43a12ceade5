//! Combination validity rules.
//!
//! Decides whether a set of legs may co-exist in one parlay. Both rules
//! are pure predicates over the leg slice.

use std::collections::HashSet;

use crate::types::{PropLeg, ValidityRule};

/// Check a combination under the given rule.
pub fn is_valid_under(legs: &[&PropLeg], rule: ValidityRule) -> bool {
    match rule {
        ValidityRule::Standard => is_valid(legs),
        ValidityRule::Promotional => is_valid_promo(legs),
    }
}

/// Standard rule: each player appears at most once and each raw market
/// key appears at most once across the combination.
pub fn is_valid(legs: &[&PropLeg]) -> bool {
    let mut players: HashSet<&str> = HashSet::with_capacity(legs.len());
    let mut markets: HashSet<&str> = HashSet::with_capacity(legs.len());
    for leg in legs {
        if !players.insert(leg.player_name.as_str()) || !markets.insert(leg.market_key.as_str()) {
            return false;
        }
    }
    true
}

/// Promotional rule: no two legs share player and stat type, so a
/// standard and an alternate market on the same statistic collide.
pub fn is_valid_promo(legs: &[&PropLeg]) -> bool {
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(legs.len());
    legs.iter()
        .all(|leg| seen.insert((leg.player_name.as_str(), leg.stat_type.as_str())))
}

/// Convenience for owned leg lists (e.g. an existing parlay).
pub fn is_valid_owned(legs: &[PropLeg], rule: ValidityRule) -> bool {
    let refs: Vec<&PropLeg> = legs.iter().collect();
    is_valid_under(&refs, rule)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
