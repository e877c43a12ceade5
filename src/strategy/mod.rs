//! Parlay construction: validity rules, scoring, exhaustive search, the
//! greedy builder and ladder variants.

pub mod greedy;
pub mod ladder;
pub mod scorer;
pub mod search;
pub mod validator;

use anyhow::Result;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::types::{Parlay, PropLeg, Strategy};
use greedy::{best_pair_by_edge, GreedyBuilder, GreedyConfig};
use search::{ExhaustiveSearch, SearchConfig};

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs the configured strategy over a filtered leg store.
///
/// Output always contains a 2-leg parlay when the store admits one: if the
/// strategy produced none, the best pair by average edge is appended.
pub struct ParlayGenerator {
    config: GeneratorConfig,
}

impl ParlayGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn greedy_config(&self) -> GreedyConfig {
        GreedyConfig {
            min_legs: self.config.min_legs,
            max_legs: self.config.max_legs,
            top_n: self.config.top_n,
            american_odds_cap: self.config.american_odds_cap,
            min_pair_payout: self.config.min_pair_payout,
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            min_legs: self.config.min_legs,
            max_legs: self.config.max_legs,
            min_probability: self.config.min_probability,
            top_n: self.config.top_n,
            pool_size: self.config.search_pool,
            workers: self.config.workers,
        }
    }

    /// Build parlays from `legs` (already filtered and edge-sorted).
    pub fn generate(&self, legs: &[PropLeg]) -> Result<Vec<Parlay>> {
        self.generate_with_cancel(legs, &AtomicBool::new(false))
    }

    /// As [`generate`](Self::generate); `cancel` only affects exhaustive
    /// search, where a partially scored size is dropped.
    pub fn generate_with_cancel(&self, legs: &[PropLeg], cancel: &AtomicBool) -> Result<Vec<Parlay>> {
        info!(
            strategy = %self.config.strategy,
            legs = legs.len(),
            min_legs = self.config.min_legs,
            max_legs = self.config.max_legs,
            top_n = self.config.top_n,
            "Generating parlays"
        );

        let mut parlays = match self.config.strategy {
            Strategy::Greedy => GreedyBuilder::new(self.greedy_config()).build(legs),
            Strategy::Exhaustive => {
                let outcome = ExhaustiveSearch::new(self.search_config())?.run_with_cancel(legs, cancel);
                if outcome.cancelled {
                    warn!(
                        completed = ?outcome.completed_sizes,
                        "Exhaustive search cancelled, keeping completed sizes"
                    );
                }
                outcome.parlays
            }
        };

        if !parlays.iter().any(|p| p.num_legs == 2) {
            let pool: Vec<&PropLeg> = legs.iter().filter(|l| l.has_valid_odds()).collect();
            match best_pair_by_edge(&pool, None) {
                Some(pair) => {
                    info!(
                        avg_edge = pair.avg_edge,
                        payout = pair.payout,
                        "No 2-leg parlay produced, appending best pair by edge"
                    );
                    parlays.push(pair);
                }
                None => warn!("No valid 2-leg combination in leg store"),
            }
        }

        info!(count = parlays.len(), "Parlay generation complete");
        Ok(parlays)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(player: &str, market: &str, edge: f64, odds: f64) -> PropLeg {
        PropLeg::new(player, market, market, 10.5, odds, 1.0 / odds, edge)
    }

    fn store() -> Vec<PropLeg> {
        vec![
            leg("A", "player_points", 6.0, 1.9),
            leg("B", "player_rebounds", 5.0, 1.8),
            leg("C", "player_assists", 4.0, 2.1),
            leg("D", "player_points_alternate", 3.0, 1.7),
            leg("E", "player_rebounds_alternate", 2.0, 2.4),
            leg("F", "player_assists_alternate", 1.0, 1.6),
        ]
    }

    #[test]
    fn test_greedy_default_includes_pair() {
        let gen = ParlayGenerator::new(GeneratorConfig::default());
        let parlays = gen.generate(&store()).unwrap();
        assert!(parlays.iter().any(|p| p.num_legs == 2));
        // One 5-leg greedy parlay uses five of the six legs; the last leg
        // alone cannot reach min_legs.
        assert!(parlays.iter().any(|p| p.num_legs == 5));
    }

    #[test]
    fn test_fallback_pair_appended_when_missing() {
        let cfg = GeneratorConfig {
            min_legs: 3,
            max_legs: 3,
            min_pair_payout: 1000.0,
            ..GeneratorConfig::default()
        };
        let parlays = ParlayGenerator::new(cfg).generate(&store()).unwrap();
        let pair = parlays.iter().find(|p| p.num_legs == 2).unwrap();
        // Best average edge among valid pairs is A + B.
        assert_eq!(pair.legs[0].player_name, "A");
        assert_eq!(pair.legs[1].player_name, "B");
        assert_eq!(parlays.last().unwrap(), pair);
    }

    #[test]
    fn test_fallback_skips_unusable_odds() {
        let legs = vec![
            leg("A", "player_points", 9.0, 1.0),
            leg("B", "player_rebounds", 5.0, 1.8),
            leg("C", "player_assists", 4.0, 2.1),
        ];
        let cfg = GeneratorConfig {
            min_legs: 3,
            max_legs: 3,
            ..GeneratorConfig::default()
        };
        let parlays = ParlayGenerator::new(cfg).generate(&legs).unwrap();
        for p in &parlays {
            assert!(p.legs.iter().all(|l| l.odds_decimal > 1.01));
        }
    }

    #[test]
    fn test_exhaustive_strategy() {
        let cfg = GeneratorConfig {
            strategy: Strategy::Exhaustive,
            min_legs: 2,
            max_legs: 3,
            top_n: 4,
            min_probability: 0.01,
            workers: 2,
            ..GeneratorConfig::default()
        };
        let parlays = ParlayGenerator::new(cfg).generate(&store()).unwrap();
        assert_eq!(parlays.iter().filter(|p| p.num_legs == 2).count(), 4);
        assert_eq!(parlays.iter().filter(|p| p.num_legs == 3).count(), 4);
    }

    #[test]
    fn test_empty_store() {
        let parlays = ParlayGenerator::new(GeneratorConfig::default()).generate(&[]).unwrap();
        assert!(parlays.is_empty());
    }
}
