//! Greedy parlay builder.
//!
//! Assembles many parlays quickly without enumeration: seed with the best
//! unused leg, extend with the next non-conflicting legs in edge order,
//! never reuse a leg across emitted parlays. A brute-force best pair is
//! always considered first, independent of the used-leg state.

use std::collections::HashSet;
use tracing::{debug, info};

use super::validator::is_valid;
use crate::types::{aggregate, decimal_to_american, Parlay, PropLeg};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Float slack on the American cap; decimal 1.2 converts to -500.00000000000006.
const CAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct GreedyConfig {
    pub min_legs: usize,
    pub max_legs: usize,
    /// Assembly iterations (upper bound on emitted parlays, pair excluded).
    pub top_n: usize,
    /// Legs priced below this American line (e.g. -500) are skipped.
    pub american_odds_cap: f64,
    /// Payout floor for the guaranteed best pair.
    pub min_pair_payout: f64,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            min_legs: 2,
            max_legs: 5,
            top_n: 30,
            american_odds_cap: -500.0,
            min_pair_payout: 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Used-leg state
// ---------------------------------------------------------------------------

/// Pool positions already consumed by earlier iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedLegs(HashSet<usize>);

impl UsedLegs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.0.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn mark(&mut self, idx: usize) {
        self.0.insert(idx);
    }
}

// ---------------------------------------------------------------------------
// Best pair
// ---------------------------------------------------------------------------

/// Brute-force the valid pair with the highest average edge, optionally
/// requiring `payout >= min_payout`. Earlier pairs win ties.
pub fn best_pair_by_edge(pool: &[&PropLeg], min_payout: Option<f64>) -> Option<Parlay> {
    let mut best: Option<(f64, usize, usize)> = None;

    for i in 0..pool.len() {
        for j in (i + 1)..pool.len() {
            if !is_valid(&[pool[i], pool[j]]) {
                continue;
            }
            let (_, avg_edge, payout) = aggregate([pool[i], pool[j]]);
            if min_payout.is_some_and(|floor| payout < floor) {
                continue;
            }
            if best.map_or(true, |(top, _, _)| avg_edge > top) {
                best = Some((avg_edge, i, j));
            }
        }
    }

    best.map(|(_, i, j)| Parlay::from_legs(vec![pool[i].clone(), pool[j].clone()]))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct GreedyBuilder {
    config: GreedyConfig,
}

impl GreedyBuilder {
    pub fn new(config: GreedyConfig) -> Self {
        Self { config }
    }

    /// Access the greedy configuration.
    pub fn config(&self) -> &GreedyConfig {
        &self.config
    }

    /// Legs with usable odds that are not priced beyond the American cap,
    /// in their original (edge-sorted) order.
    pub fn eligible<'a>(&self, legs: &'a [PropLeg]) -> Vec<&'a PropLeg> {
        legs.iter()
            .filter(|l| l.has_valid_odds())
            .filter(|l| {
                decimal_to_american(l.odds_decimal)
                    .is_ok_and(|american| american >= self.config.american_odds_cap - CAP_TOLERANCE)
            })
            .collect()
    }

    /// Build the guaranteed best pair plus up to `top_n` greedy parlays.
    pub fn build(&self, legs: &[PropLeg]) -> Vec<Parlay> {
        let pool = self.eligible(legs);
        let mut parlays = Vec::new();

        if let Some(pair) = best_pair_by_edge(&pool, Some(self.config.min_pair_payout)) {
            debug!(avg_edge = pair.avg_edge, payout = pair.payout, "Guaranteed best pair");
            parlays.push(pair);
        }

        let mut used = UsedLegs::new();
        for _ in 0..self.config.top_n {
            if used.len() >= pool.len() {
                break;
            }
            let (next_used, parlay) = self.assemble_one(&pool, used);
            used = next_used;
            if let Some(p) = parlay {
                parlays.push(p);
            }
        }

        info!(
            eligible = pool.len(),
            excluded = legs.len() - pool.len(),
            built = parlays.len(),
            "Greedy build complete"
        );

        parlays
    }

    /// One assembly step: takes the used-leg state and returns the updated
    /// state plus the parlay, if it reached `min_legs`.
    ///
    /// Legs drawn into a rejected parlay stay consumed.
    pub fn assemble_one(&self, pool: &[&PropLeg], mut used: UsedLegs) -> (UsedLegs, Option<Parlay>) {
        let Some(seed) = (0..pool.len()).find(|&i| !used.contains(i)) else {
            return (used, None);
        };
        used.mark(seed);
        let mut chosen: Vec<usize> = vec![seed];

        while chosen.len() < self.config.max_legs {
            let next = (0..pool.len()).find(|&i| {
                !used.contains(i) && !chosen.iter().any(|&c| pool[c].same_player_market(pool[i]))
            });
            match next {
                Some(i) => {
                    used.mark(i);
                    chosen.push(i);
                }
                None => break,
            }
        }

        if chosen.len() < self.config.min_legs {
            debug!(legs = chosen.len(), "Greedy parlay below minimum, dropped");
            return (used, None);
        }

        let parlay = Parlay::from_legs(chosen.iter().map(|&i| pool[i].clone()).collect());
        (used, Some(parlay))
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

    fn builder(min_legs: usize, max_legs: usize, top_n: usize) -> GreedyBuilder {
        GreedyBuilder::new(GreedyConfig {
            min_legs,
            max_legs,
            top_n,
            ..GreedyConfig::default()
        })
    }

    fn key(l: &PropLeg) -> (String, String, u64) {
        (l.player_name.clone(), l.market_key.clone(), l.prop_line.to_bits())
    }

    #[test]
    fn test_eligible_filters_odds() {
        let legs = vec![
            leg("A", "m", 3.0, 1.0),   // invalid
            leg("B", "m", 2.0, 1.01),  // invalid
            leg("C", "m", 1.5, 1.1),   // -1000, beyond cap
            leg("D", "m", 1.0, 1.25),  // -400
            leg("E", "m", 0.5, 2.5),   // +150
        ];
        let b = GreedyBuilder::new(GreedyConfig::default());
        let names: Vec<&str> = b.eligible(&legs).iter().map(|l| l.player_name.as_str()).collect();
        assert_eq!(names, vec!["D", "E"]);
    }

    #[test]
    fn test_cap_boundary_is_inclusive() {
        // 1.2 decimal is exactly -500 American.
        let legs = vec![leg("A", "m", 1.0, 1.2)];
        let b = GreedyBuilder::new(GreedyConfig::default());
        assert_eq!(b.eligible(&legs).len(), 1);
    }

    #[test]
    fn test_cap_excludes_just_below_boundary() {
        // 1.1999 decimal is about -500.25 American.
        let legs = vec![leg("A", "m", 1.0, 1.1999), leg("B", "m", 1.0, 1.2001)];
        let b = GreedyBuilder::new(GreedyConfig::default());
        let eligible = b.eligible(&legs);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].player_name, "B");
    }

    #[test]
    fn test_best_pair_respects_payout_floor() {
        let a = leg("A", "m1", 5.0, 1.5);
        let b = leg("B", "m2", 4.0, 1.5); // 2.25x with A
        let c = leg("C", "m3", 1.0, 2.5);
        let pool = vec![&a, &b, &c];
        let pair = best_pair_by_edge(&pool, Some(3.0)).unwrap();
        // A+B has the best edge but pays 2.25x; A+C pays 3.75x.
        assert_eq!(pair.legs[0].player_name, "A");
        assert_eq!(pair.legs[1].player_name, "C");
        assert!(pair.payout >= 3.0);

        let unconstrained = best_pair_by_edge(&pool, None).unwrap();
        assert_eq!(unconstrained.legs[1].player_name, "B");
    }

    #[test]
    fn test_best_pair_none_when_floor_unreachable() {
        let a = leg("A", "m1", 5.0, 1.2);
        let b = leg("B", "m2", 4.0, 1.2);
        assert!(best_pair_by_edge(&[&a, &b], Some(3.0)).is_none());
    }

    #[test]
    fn test_best_pair_requires_validity() {
        let a = leg("A", "m1", 5.0, 2.0);
        let b = leg("A", "m2", 4.0, 2.0);
        assert!(best_pair_by_edge(&[&a, &b], None).is_none());
    }

    #[test]
    fn test_no_leg_reused_across_greedy_parlays() {
        let legs: Vec<PropLeg> = (0..20)
            .map(|i| leg(&format!("P{}", i % 7), &format!("m{}", i % 3), 20.0 - i as f64, 1.9))
            .collect();
        let b = builder(2, 4, 10);
        let parlays = b.build(&legs);
        // First entry is the guaranteed pair; the rest are sequential.
        let sequential = &parlays[1..];
        let mut seen = HashSet::new();
        for p in sequential {
            for l in &p.legs {
                assert!(seen.insert(key(l)), "leg reused: {l}");
            }
        }
    }

    #[test]
    fn test_greedy_parlay_has_no_player_market_duplicates() {
        let legs = vec![
            leg("A", "m1", 9.0, 1.9),
            leg("A", "m1", 8.0, 1.9),
            leg("B", "m1", 7.0, 1.9),
            leg("A", "m2", 6.0, 1.9),
        ];
        let b = GreedyBuilder::new(GreedyConfig {
            min_legs: 2,
            max_legs: 4,
            top_n: 1,
            min_pair_payout: 100.0,
            ..GreedyConfig::default()
        });
        let parlays = b.build(&legs);
        assert_eq!(parlays.len(), 1);
        let p = &parlays[0];
        // Second A/m1 line conflicts with the seed; B/m1 and A/m2 do not.
        assert_eq!(p.num_legs, 3);
        for (i, x) in p.legs.iter().enumerate() {
            for y in &p.legs[i + 1..] {
                assert!(!x.same_player_market(y));
            }
        }
    }

    #[test]
    fn test_assemble_one_stops_at_max_legs() {
        let legs: Vec<PropLeg> = (0..10)
            .map(|i| leg(&format!("P{i}"), &format!("m{i}"), 10.0 - i as f64, 1.9))
            .collect();
        let b = builder(2, 5, 1);
        let pool = b.eligible(&legs);
        let (used, parlay) = b.assemble_one(&pool, UsedLegs::new());
        let parlay = parlay.unwrap();
        assert_eq!(parlay.num_legs, 5);
        assert_eq!(used.len(), 5);
        // Seed is the first (highest-edge) leg.
        assert_eq!(parlay.legs[0].player_name, "P0");

        let (used, second) = b.assemble_one(&pool, used);
        assert_eq!(second.unwrap().legs[0].player_name, "P5");
        assert_eq!(used.len(), 10);

        let (_, third) = b.assemble_one(&pool, used);
        assert!(third.is_none());
    }

    #[test]
    fn test_below_min_legs_rejected_but_consumed() {
        let legs = vec![leg("A", "m1", 3.0, 1.9), leg("A", "m1", 2.0, 1.9)];
        let b = builder(2, 3, 5);
        let pool = b.eligible(&legs);
        let (used, parlay) = b.assemble_one(&pool, UsedLegs::new());
        assert!(parlay.is_none());
        assert_eq!(used.len(), 1);
    }

    #[test]
    fn test_build_fields_match_aggregate() {
        let legs = vec![
            leg("A", "m1", 3.0, 2.0),
            leg("B", "m2", 2.0, 1.8),
            leg("C", "m3", 1.0, 1.6),
        ];
        let b = builder(3, 3, 1);
        let parlays = b.build(&legs);
        let greedy = parlays.last().unwrap();
        assert_eq!(greedy.num_legs, 3);
        assert!((greedy.probability - (0.5 / 1.8 / 1.6)).abs() < 1e-12);
        assert!((greedy.avg_edge - 2.0).abs() < 1e-12);
        assert!((greedy.payout - 2.0 * 1.8 * 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_build_empty_pool() {
        let b = GreedyBuilder::new(GreedyConfig::default());
        assert!(b.build(&[]).is_empty());
    }
}
